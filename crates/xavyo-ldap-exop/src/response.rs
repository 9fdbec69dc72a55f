//! Password Modify response decoding (RFC 3062 §3).
//!
//! ```text
//! ExtendedResponse ::= [APPLICATION 24] SEQUENCE {
//!      COMPONENTS OF LDAPResult,
//!      responseName     [10] LDAPOID OPTIONAL,
//!      responseValue    [11] OCTET STRING OPTIONAL }
//!
//! PasswdModifyResponseValue ::= SEQUENCE {
//!      genPasswd       [0]     OCTET STRING OPTIONAL }
//! ```

use lber::structure::StructureTag;
use serde::{Deserialize, Serialize};

use crate::ber;
use crate::error::{ExopError, ExopResult};
use crate::message::{self, APP_EXTENDED_RESPONSE};
use crate::result::LdapResult;

/// Context tag of `responseValue` in an `ExtendedResponse`.
pub const TAG_RESPONSE_VALUE: u64 = 11;

/// Context tag of `genPasswd` in the response value.
pub const TAG_GENERATED_PASSWORD: u64 = 0;

/// Outcome of a Password Modify request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordModifyResult {
    /// Password generated by the server, if it generated one.
    pub generated_password: Option<String>,

    /// Referral URI, set only on a referral-class failure.
    pub referral: Option<String>,
}

impl std::fmt::Debug for PasswordModifyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifyResult")
            .field(
                "generated_password",
                &self.generated_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("referral", &self.referral)
            .finish()
    }
}

/// What the server put in `responseValue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseValue {
    /// No `responseValue` component.
    Absent,
    /// A value whose shape carries no generated password.
    PresentWithoutPassword,
    /// A value carrying a server-generated password.
    GeneratedPassword(String),
}

impl ResponseValue {
    /// Interpret the raw `responseValue` octets, `None` meaning the component was absent.
    ///
    /// Bytes that are not BER, or a password that is not UTF-8, are errors.
    /// A well-formed value of any shape other than a single `[0]` element
    /// is accepted as carrying no password.
    pub fn parse(raw: Option<&[u8]>) -> ExopResult<Self> {
        let Some(raw) = raw else {
            return Ok(ResponseValue::Absent);
        };

        let value = message::parse_message(raw)?;
        match ber::children(&value) {
            Some([only]) if only.id == TAG_GENERATED_PASSWORD => {
                let password = match ber::primitive(only) {
                    Some(bytes) => ber::utf8(bytes, "genPasswd")?,
                    None => return Ok(ResponseValue::PresentWithoutPassword),
                };
                Ok(ResponseValue::GeneratedPassword(password))
            }
            _ => Ok(ResponseValue::PresentWithoutPassword),
        }
    }

    /// The generated password, if any.
    #[must_use]
    pub fn into_generated_password(self) -> Option<String> {
        match self {
            ResponseValue::GeneratedPassword(password) => Some(password),
            ResponseValue::Absent | ResponseValue::PresentWithoutPassword => None,
        }
    }
}

/// Decode a full LDAPMessage answering a Password Modify request.
///
/// A referral-class failure is returned as an error whose
/// [`ExopError::partial_result`] carries the referral URI.
pub fn decode(envelope: &StructureTag) -> ExopResult<PasswordModifyResult> {
    let op = message::protocol_op(envelope)?;
    if !message::is_application(op, APP_EXTENDED_RESPONSE) {
        return Err(ExopError::UnexpectedResponse { tag: op.id });
    }

    if let Some(err) = LdapResult::from_response_op(op)?.into_error() {
        return Err(err.into());
    }

    // from_response_op has checked that op is constructed.
    let components = ber::children(op).unwrap_or_default();
    let raw_value = match ber::find_context(components, TAG_RESPONSE_VALUE) {
        Some(value) => Some(
            ber::primitive(value)
                .ok_or_else(|| ExopError::malformed("responseValue must be primitive"))?,
        ),
        None => None,
    };

    Ok(PasswordModifyResult {
        generated_password: ResponseValue::parse(raw_value)?.into_generated_password(),
        referral: None,
    })
}
