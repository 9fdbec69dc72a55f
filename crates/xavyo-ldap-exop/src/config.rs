//! Session configuration
//!
//! Connection settings for running extended operations against an LDAP server.

use serde::{Deserialize, Serialize};

use crate::error::{ExopError, ExopResult};

/// Configuration for an LDAP session.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSessionConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Bind DN for authentication. Empty keeps the session anonymous.
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Timeout for establishing the connection.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Timeout applied to each operation on the session.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl std::fmt::Debug for LdapSessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_connection_timeout_secs() -> u64 {
    30
}

fn default_operation_timeout_secs() -> u64 {
    60
}

impl LdapSessionConfig {
    /// Create a new session config with required fields.
    pub fn new(host: impl Into<String>, bind_dn: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            bind_dn: bind_dn.into(),
            bind_password: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }

    /// Set bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set the per-operation timeout.
    #[must_use]
    pub fn with_operation_timeout(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = secs;
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ExopResult<()> {
        if self.host.trim().is_empty() {
            return Err(ExopError::invalid_configuration("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(ExopError::invalid_configuration("port cannot be 0"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(ExopError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }
        if self.connection_timeout_secs == 0 || self.operation_timeout_secs == 0 {
            return Err(ExopError::invalid_configuration(
                "timeouts must be at least 1 second",
            ));
        }
        if self.bind_password.is_some() && self.bind_dn.is_empty() {
            return Err(ExopError::invalid_configuration(
                "bind password given without a bind DN",
            ));
        }
        Ok(())
    }

    /// Copy of the configuration with the bind password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if redacted.bind_password.is_some() {
            redacted.bind_password = Some("***REDACTED***".to_string());
        }
        redacted
    }
}
