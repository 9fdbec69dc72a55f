//! LDAPMessage framing.
//!
//! ```text
//! LDAPMessage ::= SEQUENCE {
//!      messageID       MessageID,
//!      protocolOp      CHOICE { ... },
//!      controls        [0] Controls OPTIONAL }
//! ```
//!
//! Only the parts needed to carry extended operations are handled here.

use bytes::BytesMut;
use lber::common::TagClass;
use lber::structure::StructureTag;
use lber::structures::{ASNTag, Integer, Sequence, Tag};

use crate::ber;
use crate::error::{ExopError, ExopResult};

/// Application tag of `ExtendedRequest`.
pub const APP_EXTENDED_REQUEST: u64 = 23;

/// Application tag of `ExtendedResponse`.
pub const APP_EXTENDED_RESPONSE: u64 = 24;

/// Universal tag number of INTEGER.
const TAG_INTEGER: u64 = 2;

/// Wrap a protocol operation into a full LDAPMessage.
#[must_use]
pub fn wrap_request(message_id: i32, op: StructureTag) -> StructureTag {
    Tag::Sequence(Sequence {
        inner: vec![
            Tag::Integer(Integer {
                inner: i64::from(message_id),
                ..Default::default()
            }),
            Tag::StructureTag(op),
        ],
        ..Default::default()
    })
    .into_structure()
}

/// Serialize a tag tree into BER bytes.
pub fn encode_message(message: StructureTag) -> ExopResult<Vec<u8>> {
    let mut buf = BytesMut::new();
    lber::write::encode_into(&mut buf, message).map_err(|e| ExopError::Encoding {
        message: e.to_string(),
    })?;
    Ok(buf.to_vec())
}

/// Parse exactly one BER element from `bytes`.
pub fn parse_message(bytes: &[u8]) -> ExopResult<StructureTag> {
    match lber::parse::parse_tag(bytes) {
        Ok((rest, tag)) if rest.is_empty() => Ok(tag),
        Ok((rest, _)) => Err(ExopError::malformed(format!(
            "{} trailing bytes after BER element",
            rest.len()
        ))),
        Err(_) => Err(ExopError::malformed("invalid or truncated BER element")),
    }
}

/// Message ID of an LDAPMessage, if it has a well-formed one.
#[must_use]
pub fn message_id(envelope: &StructureTag) -> Option<i32> {
    let first = ber::children(envelope)?.first()?;
    if !ber::is(first, TagClass::Universal, TAG_INTEGER) {
        return None;
    }
    let raw = ber::uint(first, "messageID").ok()?;
    i32::try_from(raw).ok()
}

/// The protocol operation of an LDAPMessage.
pub fn protocol_op(envelope: &StructureTag) -> ExopResult<&StructureTag> {
    let children = ber::children(envelope)
        .ok_or_else(|| ExopError::malformed("LDAPMessage must be constructed"))?;
    if children.len() < 2 {
        return Err(ExopError::malformed(format!(
            "LDAPMessage has {} elements, expected at least 2",
            children.len()
        )));
    }
    Ok(&children[1])
}

/// Whether a node is the given application-class operation.
pub(crate) fn is_application(tag: &StructureTag, id: u64) -> bool {
    ber::is(tag, TagClass::Application, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lber::structure::PL;

    fn extended_request() -> StructureTag {
        StructureTag {
            class: TagClass::Application,
            id: APP_EXTENDED_REQUEST,
            payload: PL::C(vec![ber::context_primitive(0, b"1.2.3".to_vec())]),
        }
    }

    #[test]
    fn test_wrap_request_layout() {
        let message = wrap_request(7, extended_request());

        assert_eq!(message.class, TagClass::Universal);
        assert_eq!(message.id, 16);
        assert_eq!(message_id(&message), Some(7));

        let op = protocol_op(&message).unwrap();
        assert!(is_application(op, APP_EXTENDED_REQUEST));
    }

    #[test]
    fn test_encoded_message_parses_back() {
        let bytes = encode_message(wrap_request(300, extended_request())).unwrap();
        // SEQUENCE, then INTEGER 300 encoded on two octets.
        assert_eq!(bytes[0], 0x30);
        assert_eq!(&bytes[2..6], &[0x02, 0x02, 0x01, 0x2c]);

        let parsed = parse_message(&bytes).unwrap();
        assert_eq!(message_id(&parsed), Some(300));
        let op = protocol_op(&parsed).unwrap();
        assert_eq!(op.class, TagClass::Application);
        assert_eq!(op.id, APP_EXTENDED_REQUEST);
    }

    #[test]
    fn test_parse_message_rejects_truncated_and_trailing() {
        let bytes = encode_message(wrap_request(1, extended_request())).unwrap();
        assert!(parse_message(&bytes[..bytes.len() - 1]).is_err());

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(parse_message(&padded).is_err());
    }

    #[test]
    fn test_protocol_op_requires_two_elements() {
        let short = Tag::Sequence(Sequence {
            inner: vec![Tag::Integer(Integer {
                inner: 1,
                ..Default::default()
            })],
            ..Default::default()
        })
        .into_structure();

        let err = protocol_op(&short).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
        assert_eq!(message_id(&short), Some(1));
    }
}
