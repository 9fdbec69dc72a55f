//! `ldap3`-backed session for running Password Modify against a live server.
//!
//! `ldap3` owns message IDs, framing and response routing; this module only
//! binds, submits the extended operation and classifies what comes back.

use std::time::Duration;

use ldap3::exop::Exop;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use tracing::{debug, info, instrument, warn};

use crate::config::LdapSessionConfig;
use crate::error::{ExopError, ExopResult};
use crate::request::PasswordModifyRequest;
use crate::response::{PasswordModifyResult, ResponseValue};
use crate::result::{LdapResult, ResultCode};

impl From<ldap3::result::LdapResult> for LdapResult {
    fn from(result: ldap3::result::LdapResult) -> Self {
        Self {
            code: ResultCode::from_u32(result.rc),
            matched_dn: result.matched,
            diagnostic_message: result.text,
            referrals: result.refs,
        }
    }
}

/// Classify an extended operation outcome as reported by `ldap3`.
fn interpret(exop: Exop, result: LdapResult) -> ExopResult<PasswordModifyResult> {
    if let Some(err) = result.into_error() {
        return Err(err.into());
    }

    Ok(PasswordModifyResult {
        generated_password: ResponseValue::parse(exop.val.as_deref())?.into_generated_password(),
        referral: None,
    })
}

/// An authenticated LDAP session able to run Password Modify.
pub struct PasswordModifySession {
    config: LdapSessionConfig,
    ldap: Ldap,
}

impl std::fmt::Debug for PasswordModifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifySession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PasswordModifySession {
    /// Connect to the configured server and bind if a bind DN is set.
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: LdapSessionConfig) -> ExopResult<Self> {
        config.validate()?;

        let url = config.url();
        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(config.connection_timeout_secs))
            .set_starttls(config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ExopError::network_with_source(
                    format!("Failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if !config.bind_dn.is_empty() {
            let bind_password = config.bind_password.as_deref().unwrap_or("");
            debug!(bind_dn = %config.bind_dn, "Performing LDAP bind");

            let result = ldap
                .with_timeout(Duration::from_secs(config.operation_timeout_secs))
                .simple_bind(&config.bind_dn, bind_password)
                .await
                .map_err(|e| {
                    ExopError::network_with_source(
                        format!("LDAP bind failed for {}", config.bind_dn),
                        e,
                    )
                })?;

            if let Some(err) = LdapResult::from(result).into_error() {
                return Err(err.into());
            }
        }

        info!(host = %config.host, "LDAP session established");

        Ok(Self { config, ldap })
    }

    /// Run a Password Modify request on this session.
    ///
    /// On a referral the error carries the referral URI, see
    /// [`ExopError::partial_result`].
    #[instrument(skip(self, request), fields(host = %self.config.host))]
    pub async fn password_modify(
        &mut self,
        request: &PasswordModifyRequest,
    ) -> ExopResult<PasswordModifyResult> {
        let exop = request.to_exop()?;

        debug!("Sending password modify request");
        let ldap3::result::ExopResult(exop, result) = self
            .ldap
            .with_timeout(Duration::from_secs(self.config.operation_timeout_secs))
            .extended(exop)
            .await
            .map_err(|e| ExopError::network_with_source("Password modify request failed", e))?;

        interpret(exop, result.into())
    }

    /// Unbind and close the session.
    pub async fn unbind(mut self) -> ExopResult<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| ExopError::network_with_source("LDAP unbind failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::encode_message;
    use lber::common::TagClass;
    use lber::structures::{ASNTag, OctetString, Sequence, Tag};

    fn ldap_result(code: ResultCode, refs: &[&str]) -> LdapResult {
        LdapResult {
            code,
            matched_dn: String::new(),
            diagnostic_message: String::new(),
            referrals: refs.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn generated_value(password: &str) -> Vec<u8> {
        let value = Tag::Sequence(Sequence {
            inner: vec![Tag::OctetString(OctetString {
                class: TagClass::Context,
                id: 0,
                inner: password.as_bytes().to_vec(),
            })],
            ..Default::default()
        });
        encode_message(value.into_structure()).unwrap()
    }

    #[test]
    fn test_interpret_generated_password() {
        let exop = Exop {
            name: None,
            val: Some(generated_value("Gener@ted1")),
        };
        let result = interpret(exop, ldap_result(ResultCode::Success, &[])).unwrap();
        assert_eq!(result.generated_password.as_deref(), Some("Gener@ted1"));
        assert!(result.referral.is_none());
    }

    #[test]
    fn test_interpret_success_without_value() {
        let exop = Exop {
            name: None,
            val: None,
        };
        let result = interpret(exop, ldap_result(ResultCode::Success, &[])).unwrap();
        assert_eq!(result, PasswordModifyResult::default());
    }

    #[test]
    fn test_interpret_referral() {
        let exop = Exop {
            name: None,
            val: None,
        };
        let err = interpret(
            exop,
            ldap_result(ResultCode::Referral, &["ldap://master.example.com/"]),
        )
        .unwrap_err();

        assert_eq!(err.referral(), Some("ldap://master.example.com/"));
        assert!(err.partial_result().is_some());
    }

    #[test]
    fn test_interpret_failure() {
        let exop = Exop {
            name: None,
            val: None,
        };
        let err = interpret(exop, ldap_result(ResultCode::ConstraintViolation, &[])).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::ConstraintViolation));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = LdapSessionConfig::new("", "cn=admin,dc=example,dc=com");
        let err = PasswordModifySession::connect(config).await.unwrap_err();
        assert!(matches!(err, ExopError::InvalidConfiguration { .. }));
    }
}
