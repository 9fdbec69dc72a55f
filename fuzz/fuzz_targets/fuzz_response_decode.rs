//! Fuzz target for Password Modify response decoding.
//!
//! Feeds arbitrary bytes through LDAPMessage parsing, response decoding and
//! response value parsing, none of which may panic.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_response_decode -- -max_total_time=600

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xavyo_ldap_exop::message::parse_message;
use xavyo_ldap_exop::{decode, ResponseValue};

/// Arbitrary input for response decoding
#[derive(Arbitrary, Debug)]
struct ResponseInput {
    envelope: Vec<u8>,
    response_value: Option<Vec<u8>>,
}

fuzz_target!(|input: ResponseInput| {
    // Skip very large inputs to avoid memory issues
    if input.envelope.len() > 64 * 1024 {
        return;
    }

    if let Ok(envelope) = parse_message(&input.envelope) {
        if let Err(err) = decode(&envelope) {
            // Classification must be total
            let _ = err.error_code();
            let _ = err.partial_result();
        }
    }

    let _ = ResponseValue::parse(input.response_value.as_deref());
});
