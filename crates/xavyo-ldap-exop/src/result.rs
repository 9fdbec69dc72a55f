//! LDAP result components and result-code classification.
//!
//! Every LDAP response carries an `LDAPResult` (RFC 4511 §4.1.9):
//!
//! ```text
//! LDAPResult ::= SEQUENCE {
//!      resultCode         ENUMERATED,
//!      matchedDN          LDAPDN,
//!      diagnosticMessage  LDAPString,
//!      referral           [3] Referral OPTIONAL }
//! ```
//!
//! Extended responses append their own components after these.

use lber::common::TagClass;
use lber::structure::StructureTag;
use serde::{Deserialize, Serialize};

use crate::ber;
use crate::error::{DirectoryError, ExopError, ExopResult};

/// Universal tag number of ENUMERATED.
const TAG_ENUMERATED: u64 = 10;

/// Context tag of the referral component.
pub const TAG_REFERRAL: u64 = 3;

/// LDAP result codes (RFC 4511 Appendix A, plus common extensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    TimeLimitExceeded,
    SizeLimitExceeded,
    CompareFalse,
    CompareTrue,
    AuthMethodNotSupported,
    StrongerAuthRequired,
    Referral,
    AdminLimitExceeded,
    UnavailableCriticalExtension,
    ConfidentialityRequired,
    SaslBindInProgress,
    NoSuchAttribute,
    UndefinedAttributeType,
    InappropriateMatching,
    ConstraintViolation,
    AttributeOrValueExists,
    InvalidAttributeSyntax,
    NoSuchObject,
    AliasProblem,
    InvalidDnSyntax,
    AliasDereferencingProblem,
    InappropriateAuthentication,
    InvalidCredentials,
    InsufficientAccessRights,
    Busy,
    Unavailable,
    UnwillingToPerform,
    LoopDetect,
    NamingViolation,
    ObjectClassViolation,
    NotAllowedOnNonLeaf,
    NotAllowedOnRdn,
    EntryAlreadyExists,
    ObjectClassModsProhibited,
    AffectsMultipleDsas,
    Other,
    Canceled,
    NoSuchOperation,
    TooLate,
    CannotCancel,
    AssertionFailed,
    AuthorizationDenied,
    /// A code this client does not know by name.
    Unknown(u32),
}

impl ResultCode {
    /// Map a numeric result code.
    #[must_use]
    pub fn from_u32(code: u32) -> Self {
        match code {
            0 => ResultCode::Success,
            1 => ResultCode::OperationsError,
            2 => ResultCode::ProtocolError,
            3 => ResultCode::TimeLimitExceeded,
            4 => ResultCode::SizeLimitExceeded,
            5 => ResultCode::CompareFalse,
            6 => ResultCode::CompareTrue,
            7 => ResultCode::AuthMethodNotSupported,
            8 => ResultCode::StrongerAuthRequired,
            10 => ResultCode::Referral,
            11 => ResultCode::AdminLimitExceeded,
            12 => ResultCode::UnavailableCriticalExtension,
            13 => ResultCode::ConfidentialityRequired,
            14 => ResultCode::SaslBindInProgress,
            16 => ResultCode::NoSuchAttribute,
            17 => ResultCode::UndefinedAttributeType,
            18 => ResultCode::InappropriateMatching,
            19 => ResultCode::ConstraintViolation,
            20 => ResultCode::AttributeOrValueExists,
            21 => ResultCode::InvalidAttributeSyntax,
            32 => ResultCode::NoSuchObject,
            33 => ResultCode::AliasProblem,
            34 => ResultCode::InvalidDnSyntax,
            36 => ResultCode::AliasDereferencingProblem,
            48 => ResultCode::InappropriateAuthentication,
            49 => ResultCode::InvalidCredentials,
            50 => ResultCode::InsufficientAccessRights,
            51 => ResultCode::Busy,
            52 => ResultCode::Unavailable,
            53 => ResultCode::UnwillingToPerform,
            54 => ResultCode::LoopDetect,
            64 => ResultCode::NamingViolation,
            65 => ResultCode::ObjectClassViolation,
            66 => ResultCode::NotAllowedOnNonLeaf,
            67 => ResultCode::NotAllowedOnRdn,
            68 => ResultCode::EntryAlreadyExists,
            69 => ResultCode::ObjectClassModsProhibited,
            71 => ResultCode::AffectsMultipleDsas,
            80 => ResultCode::Other,
            118 => ResultCode::Canceled,
            119 => ResultCode::NoSuchOperation,
            120 => ResultCode::TooLate,
            121 => ResultCode::CannotCancel,
            122 => ResultCode::AssertionFailed,
            123 => ResultCode::AuthorizationDenied,
            other => ResultCode::Unknown(other),
        }
    }

    /// Numeric value of the code.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::OperationsError => 1,
            ResultCode::ProtocolError => 2,
            ResultCode::TimeLimitExceeded => 3,
            ResultCode::SizeLimitExceeded => 4,
            ResultCode::CompareFalse => 5,
            ResultCode::CompareTrue => 6,
            ResultCode::AuthMethodNotSupported => 7,
            ResultCode::StrongerAuthRequired => 8,
            ResultCode::Referral => 10,
            ResultCode::AdminLimitExceeded => 11,
            ResultCode::UnavailableCriticalExtension => 12,
            ResultCode::ConfidentialityRequired => 13,
            ResultCode::SaslBindInProgress => 14,
            ResultCode::NoSuchAttribute => 16,
            ResultCode::UndefinedAttributeType => 17,
            ResultCode::InappropriateMatching => 18,
            ResultCode::ConstraintViolation => 19,
            ResultCode::AttributeOrValueExists => 20,
            ResultCode::InvalidAttributeSyntax => 21,
            ResultCode::NoSuchObject => 32,
            ResultCode::AliasProblem => 33,
            ResultCode::InvalidDnSyntax => 34,
            ResultCode::AliasDereferencingProblem => 36,
            ResultCode::InappropriateAuthentication => 48,
            ResultCode::InvalidCredentials => 49,
            ResultCode::InsufficientAccessRights => 50,
            ResultCode::Busy => 51,
            ResultCode::Unavailable => 52,
            ResultCode::UnwillingToPerform => 53,
            ResultCode::LoopDetect => 54,
            ResultCode::NamingViolation => 64,
            ResultCode::ObjectClassViolation => 65,
            ResultCode::NotAllowedOnNonLeaf => 66,
            ResultCode::NotAllowedOnRdn => 67,
            ResultCode::EntryAlreadyExists => 68,
            ResultCode::ObjectClassModsProhibited => 69,
            ResultCode::AffectsMultipleDsas => 71,
            ResultCode::Other => 80,
            ResultCode::Canceled => 118,
            ResultCode::NoSuchOperation => 119,
            ResultCode::TooLate => 120,
            ResultCode::CannotCancel => 121,
            ResultCode::AssertionFailed => 122,
            ResultCode::AuthorizationDenied => 123,
            ResultCode::Unknown(code) => code,
        }
    }

    /// Descriptive name as used in RFC 4511.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ResultCode::Success => "success",
            ResultCode::OperationsError => "operationsError",
            ResultCode::ProtocolError => "protocolError",
            ResultCode::TimeLimitExceeded => "timeLimitExceeded",
            ResultCode::SizeLimitExceeded => "sizeLimitExceeded",
            ResultCode::CompareFalse => "compareFalse",
            ResultCode::CompareTrue => "compareTrue",
            ResultCode::AuthMethodNotSupported => "authMethodNotSupported",
            ResultCode::StrongerAuthRequired => "strongerAuthRequired",
            ResultCode::Referral => "referral",
            ResultCode::AdminLimitExceeded => "adminLimitExceeded",
            ResultCode::UnavailableCriticalExtension => "unavailableCriticalExtension",
            ResultCode::ConfidentialityRequired => "confidentialityRequired",
            ResultCode::SaslBindInProgress => "saslBindInProgress",
            ResultCode::NoSuchAttribute => "noSuchAttribute",
            ResultCode::UndefinedAttributeType => "undefinedAttributeType",
            ResultCode::InappropriateMatching => "inappropriateMatching",
            ResultCode::ConstraintViolation => "constraintViolation",
            ResultCode::AttributeOrValueExists => "attributeOrValueExists",
            ResultCode::InvalidAttributeSyntax => "invalidAttributeSyntax",
            ResultCode::NoSuchObject => "noSuchObject",
            ResultCode::AliasProblem => "aliasProblem",
            ResultCode::InvalidDnSyntax => "invalidDNSyntax",
            ResultCode::AliasDereferencingProblem => "aliasDereferencingProblem",
            ResultCode::InappropriateAuthentication => "inappropriateAuthentication",
            ResultCode::InvalidCredentials => "invalidCredentials",
            ResultCode::InsufficientAccessRights => "insufficientAccessRights",
            ResultCode::Busy => "busy",
            ResultCode::Unavailable => "unavailable",
            ResultCode::UnwillingToPerform => "unwillingToPerform",
            ResultCode::LoopDetect => "loopDetect",
            ResultCode::NamingViolation => "namingViolation",
            ResultCode::ObjectClassViolation => "objectClassViolation",
            ResultCode::NotAllowedOnNonLeaf => "notAllowedOnNonLeaf",
            ResultCode::NotAllowedOnRdn => "notAllowedOnRDN",
            ResultCode::EntryAlreadyExists => "entryAlreadyExists",
            ResultCode::ObjectClassModsProhibited => "objectClassModsProhibited",
            ResultCode::AffectsMultipleDsas => "affectsMultipleDSAs",
            ResultCode::Other => "other",
            ResultCode::Canceled => "canceled",
            ResultCode::NoSuchOperation => "noSuchOperation",
            ResultCode::TooLate => "tooLate",
            ResultCode::CannotCancel => "cannotCancel",
            ResultCode::AssertionFailed => "assertionFailed",
            ResultCode::AuthorizationDenied => "authorizationDenied",
            ResultCode::Unknown(_) => "unknown",
        }
    }

    /// Whether the server may accept the same request later.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ResultCode::Busy | ResultCode::Unavailable | ResultCode::TimeLimitExceeded
        )
    }
}

/// The generic result components of an LDAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResult {
    pub code: ResultCode,
    pub matched_dn: String,
    pub diagnostic_message: String,
    /// Referral URIs, in server order. Only meaningful for [`ResultCode::Referral`].
    pub referrals: Vec<String>,
}

impl LdapResult {
    /// Extract the result components from a response protocol op.
    ///
    /// `op` is the constructed application node following the message ID,
    /// e.g. the `[APPLICATION 24]` extended response.
    pub fn from_response_op(op: &StructureTag) -> ExopResult<Self> {
        let children = ber::children(op)
            .ok_or_else(|| ExopError::malformed("response operation must be constructed"))?;
        if children.len() < 3 {
            return Err(ExopError::malformed(format!(
                "response operation has {} components, expected at least 3",
                children.len()
            )));
        }

        if !ber::is(&children[0], TagClass::Universal, TAG_ENUMERATED) {
            return Err(ExopError::malformed("resultCode must be ENUMERATED"));
        }
        let raw_code = ber::uint(&children[0], "resultCode")?;
        let code = u32::try_from(raw_code)
            .map(ResultCode::from_u32)
            .map_err(|_| ExopError::malformed(format!("resultCode {raw_code} out of range")))?;

        // Only the result code decides the outcome; the text components are
        // informational and never fail the decode.
        let matched_dn = ber::text(&children[1]).unwrap_or_default();
        let diagnostic_message = ber::text(&children[2]).unwrap_or_default();

        // A primitive [3] carries no URIs; constructed URI entries are skipped.
        let referrals = ber::find_context(&children[3..], TAG_REFERRAL)
            .and_then(ber::children)
            .unwrap_or_default()
            .iter()
            .filter_map(ber::text)
            .collect();

        Ok(Self {
            code,
            matched_dn,
            diagnostic_message,
            referrals,
        })
    }

    /// Check for success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    /// Classify the result: `None` on success, a structured error otherwise.
    ///
    /// Referral failures keep the first referral URI.
    #[must_use]
    pub fn into_error(self) -> Option<DirectoryError> {
        if self.is_success() {
            return None;
        }

        let referral = if self.code == ResultCode::Referral {
            self.referrals.into_iter().next()
        } else {
            None
        };

        Some(DirectoryError {
            code: self.code,
            matched_dn: self.matched_dn,
            message: self.diagnostic_message,
            referral,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lber::structure::PL;

    fn result_op(code: u8, extra: Vec<StructureTag>) -> StructureTag {
        let mut children = vec![
            StructureTag {
                class: TagClass::Universal,
                id: TAG_ENUMERATED,
                payload: PL::P(vec![code]),
            },
            StructureTag {
                class: TagClass::Universal,
                id: 4,
                payload: PL::P(b"uid=jdoe,ou=people,dc=example,dc=com".to_vec()),
            },
            StructureTag {
                class: TagClass::Universal,
                id: 4,
                payload: PL::P(b"diagnostic".to_vec()),
            },
        ];
        children.extend(extra);
        StructureTag {
            class: TagClass::Application,
            id: 24,
            payload: PL::C(children),
        }
    }

    #[test]
    fn test_result_code_mapping() {
        for code in [0, 10, 19, 49, 50, 53, 80, 123] {
            assert_eq!(ResultCode::from_u32(code).as_u32(), code);
        }
        assert_eq!(ResultCode::from_u32(4711), ResultCode::Unknown(4711));
        assert_eq!(ResultCode::from_u32(10).name(), "referral");
        assert_eq!(ResultCode::from_u32(49).name(), "invalidCredentials");
    }

    #[test]
    fn test_success_has_no_error() {
        let result = LdapResult::from_response_op(&result_op(0, Vec::new())).unwrap();
        assert!(result.is_success());
        assert_eq!(result.matched_dn, "uid=jdoe,ou=people,dc=example,dc=com");
        assert!(result.into_error().is_none());
    }

    #[test]
    fn test_failure_is_classified() {
        let result = LdapResult::from_response_op(&result_op(50, Vec::new())).unwrap();
        let err = result.into_error().unwrap();
        assert_eq!(err.code, ResultCode::InsufficientAccessRights);
        assert_eq!(err.message, "diagnostic");
        assert!(err.referral.is_none());
        assert!(!err.is_referral());
    }

    #[test]
    fn test_referral_keeps_first_uri() {
        let referral = StructureTag {
            class: TagClass::Context,
            id: TAG_REFERRAL,
            payload: PL::C(vec![
                StructureTag {
                    class: TagClass::Universal,
                    id: 4,
                    payload: PL::P(b"ldap://a.example.com".to_vec()),
                },
                StructureTag {
                    class: TagClass::Universal,
                    id: 4,
                    payload: PL::P(b"ldap://b.example.com".to_vec()),
                },
            ]),
        };
        let result = LdapResult::from_response_op(&result_op(10, vec![referral])).unwrap();
        assert_eq!(result.referrals.len(), 2);

        let err = result.into_error().unwrap();
        assert!(err.is_referral());
        assert_eq!(err.referral.as_deref(), Some("ldap://a.example.com"));
    }

    #[test]
    fn test_bad_later_referral_uri_keeps_first() {
        let referral = StructureTag {
            class: TagClass::Context,
            id: TAG_REFERRAL,
            payload: PL::C(vec![
                StructureTag {
                    class: TagClass::Universal,
                    id: 4,
                    payload: PL::P(b"ldap://a.example.com/".to_vec()),
                },
                StructureTag {
                    class: TagClass::Universal,
                    id: 4,
                    payload: PL::P(vec![0xff]),
                },
            ]),
        };
        let result = LdapResult::from_response_op(&result_op(10, vec![referral])).unwrap();

        let err = result.into_error().unwrap();
        assert_eq!(err.code, ResultCode::Referral);
        assert_eq!(err.referral.as_deref(), Some("ldap://a.example.com/"));
    }

    #[test]
    fn test_non_utf8_diagnostic_still_classifies() {
        let mut op = result_op(53, Vec::new());
        if let PL::C(children) = &mut op.payload {
            children[2].payload = PL::P(b"r\xe9f".to_vec());
        }

        let err = LdapResult::from_response_op(&op)
            .unwrap()
            .into_error()
            .unwrap();
        assert_eq!(err.code, ResultCode::UnwillingToPerform);
        assert_eq!(err.message, "r\u{fffd}f");
    }

    #[test]
    fn test_missing_components_is_malformed() {
        let op = StructureTag {
            class: TagClass::Application,
            id: 24,
            payload: PL::C(Vec::new()),
        };
        let err = LdapResult::from_response_op(&op).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    }
}
