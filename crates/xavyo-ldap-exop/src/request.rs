//! Password Modify request encoding (RFC 3062 §2).
//!
//! ```text
//! PasswdModifyRequestValue ::= SEQUENCE {
//!      userIdentity    [0]  OCTET STRING OPTIONAL
//!      oldPasswd       [1]  OCTET STRING OPTIONAL
//!      newPasswd       [2]  OCTET STRING OPTIONAL }
//! ```
//!
//! The value is carried in the `requestValue` of an `ExtendedRequest`
//! named by [`PASSWORD_MODIFY_OID`].

use lber::common::TagClass;
use lber::structure::{StructureTag, PL};
use lber::structures::{ASNTag, Sequence, Tag};
use ldap3::exop::Exop;

use crate::ber;
use crate::error::ExopResult;
use crate::message::{self, APP_EXTENDED_REQUEST};

/// Object identifier of the Password Modify extended operation.
pub const PASSWORD_MODIFY_OID: &str = "1.3.6.1.4.1.4203.1.11.1";

/// Context tag of `requestName` in an `ExtendedRequest`.
const TAG_REQUEST_NAME: u64 = 0;

/// Context tag of `requestValue` in an `ExtendedRequest`.
const TAG_REQUEST_VALUE: u64 = 1;

/// Context tag of `userIdentity` in the request value.
pub const TAG_USER_IDENTITY: u64 = 0;
/// Context tag of `oldPasswd` in the request value.
pub const TAG_OLD_PASSWORD: u64 = 1;
/// Context tag of `newPasswd` in the request value.
pub const TAG_NEW_PASSWORD: u64 = 2;

/// A Password Modify request.
///
/// Each field is optional and omitted from the encoding when `None`:
///
/// - `user_identity` — the user whose password changes; `None` targets the
///   user bound to the session. May or may not be a DN.
/// - `old_password` — the current password. Administrators can usually
///   reset a password without it, depending on access rights and the
///   password policy.
/// - `new_password` — the desired password. When `None` the server may
///   generate one and return it in the result.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordModifyRequest {
    pub user_identity: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

impl std::fmt::Debug for PasswordModifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifyRequest")
            .field("user_identity", &self.user_identity)
            .field(
                "old_password",
                &self.old_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field(
                "new_password",
                &self.new_password.as_ref().map(|_| "***REDACTED***"),
            )
            .finish()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl PasswordModifyRequest {
    /// Create a request from plain strings, where an empty string means "not supplied".
    ///
    /// Use the `with_*` builders to send an explicitly empty value.
    #[must_use]
    pub fn new(user_identity: &str, old_password: &str, new_password: &str) -> Self {
        Self {
            user_identity: non_empty(user_identity),
            old_password: non_empty(old_password),
            new_password: non_empty(new_password),
        }
    }

    /// Change the password of the session user.
    pub fn change_own(old_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self::default()
            .with_old_password(old_password)
            .with_new_password(new_password)
    }

    /// Reset another user's password without knowing the current one.
    pub fn reset(user_identity: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self::default()
            .with_user_identity(user_identity)
            .with_new_password(new_password)
    }

    /// Ask the server to generate a new password for a user.
    pub fn generate_for(user_identity: impl Into<String>) -> Self {
        Self::default().with_user_identity(user_identity)
    }

    /// Set the user identity.
    pub fn with_user_identity(mut self, user_identity: impl Into<String>) -> Self {
        self.user_identity = Some(user_identity.into());
        self
    }

    /// Set the current password.
    pub fn with_old_password(mut self, old_password: impl Into<String>) -> Self {
        self.old_password = Some(old_password.into());
        self
    }

    /// Set the desired password.
    pub fn with_new_password(mut self, new_password: impl Into<String>) -> Self {
        self.new_password = Some(new_password.into());
        self
    }

    /// The `PasswdModifyRequestValue` sequence.
    ///
    /// Fields appear in tag order and only when present.
    #[must_use]
    pub fn value_sequence(&self) -> StructureTag {
        let fields = [
            (TAG_USER_IDENTITY, &self.user_identity),
            (TAG_OLD_PASSWORD, &self.old_password),
            (TAG_NEW_PASSWORD, &self.new_password),
        ];

        let inner = fields
            .into_iter()
            .filter_map(|(id, value)| {
                value
                    .as_ref()
                    .map(|v| Tag::StructureTag(ber::context_primitive(id, v.as_bytes())))
            })
            .collect();

        Tag::Sequence(Sequence {
            inner,
            ..Default::default()
        })
        .into_structure()
    }

    /// BER encoding of [`Self::value_sequence`], as carried in `requestValue`.
    pub fn request_value(&self) -> ExopResult<Vec<u8>> {
        message::encode_message(self.value_sequence())
    }

    /// The `[APPLICATION 23]` extended request for this operation.
    ///
    /// Fails only if the BER writer rejects the value sequence.
    pub fn encode(&self) -> ExopResult<StructureTag> {
        Ok(StructureTag {
            class: TagClass::Application,
            id: APP_EXTENDED_REQUEST,
            payload: PL::C(vec![
                ber::context_primitive(TAG_REQUEST_NAME, PASSWORD_MODIFY_OID.as_bytes()),
                ber::context_primitive(TAG_REQUEST_VALUE, self.request_value()?),
            ]),
        })
    }

    /// The request as an `ldap3` extended operation.
    pub fn to_exop(&self) -> ExopResult<Exop> {
        Ok(Exop {
            name: Some(PASSWORD_MODIFY_OID.to_string()),
            val: Some(self.request_value()?),
        })
    }
}
