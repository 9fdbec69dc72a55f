//! Borrowing accessors over `lber` structure tags.
//!
//! `StructureTag`'s own matchers consume the tag; the decoder only ever reads
//! the response tree, so these helpers work on references instead.

use lber::common::TagClass;
use lber::structure::{StructureTag, PL};

use crate::error::{ExopError, ExopResult};

/// Build a context-class primitive node.
pub(crate) fn context_primitive(id: u64, inner: impl Into<Vec<u8>>) -> StructureTag {
    StructureTag {
        class: TagClass::Context,
        id,
        payload: PL::P(inner.into()),
    }
}

/// Children of a constructed node.
pub(crate) fn children(tag: &StructureTag) -> Option<&[StructureTag]> {
    match &tag.payload {
        PL::C(children) => Some(children),
        PL::P(_) => None,
    }
}

/// Content octets of a primitive node.
pub(crate) fn primitive(tag: &StructureTag) -> Option<&[u8]> {
    match &tag.payload {
        PL::P(bytes) => Some(bytes),
        PL::C(_) => None,
    }
}

pub(crate) fn is(tag: &StructureTag, class: TagClass, id: u64) -> bool {
    tag.class == class && tag.id == id
}

/// First context-class child with the given tag number.
pub(crate) fn find_context(children: &[StructureTag], id: u64) -> Option<&StructureTag> {
    children.iter().find(|child| is(child, TagClass::Context, id))
}

/// Decode octets as UTF-8, naming the field on failure.
pub(crate) fn utf8(bytes: &[u8], field: &str) -> ExopResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ExopError::malformed(format!("{field} is not valid UTF-8")))
}

/// Text of a primitive OCTET STRING node, with invalid UTF-8 replaced.
///
/// For informational components only; values the caller acts on go
/// through [`utf8`].
pub(crate) fn text(tag: &StructureTag) -> Option<String> {
    primitive(tag).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Decode a primitive node holding an unsigned INTEGER or ENUMERATED value.
pub(crate) fn uint(tag: &StructureTag, field: &str) -> ExopResult<u64> {
    let bytes = primitive(tag)
        .ok_or_else(|| ExopError::malformed(format!("{field} must be primitive")))?;
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(ExopError::malformed(format!(
            "{field} has invalid length {}",
            bytes.len()
        )));
    }
    match lber::parse::parse_uint(bytes) {
        Ok((_, value)) => Ok(value),
        Err(_) => Err(ExopError::malformed(format!("{field} is not an integer"))),
    }
}
