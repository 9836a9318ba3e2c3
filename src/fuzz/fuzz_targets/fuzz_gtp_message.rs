//! GTPv2-C Message Fuzzer
//!
//! Feeds arbitrary bytes to the GTPv2-C message decoder. Anything that
//! decodes must encode again, and the encoding must decode to the same
//! message.
//!
//! Run with: cargo +nightly fuzz run fuzz_gtp_message

#![no_main]

use bytes::Bytes;
use gtpsim_gtp::v2::Gtp2Message;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);
    let Ok(message) = Gtp2Message::decode(&mut buf) else {
        return;
    };

    // Lossy IE kinds (spare bits, BCD filler) may not reproduce the input
    // bytes, but a second pass must be stable
    let Ok(encoded) = message.encode() else {
        return;
    };
    let mut first = encoded.freeze();
    let decoded = Gtp2Message::decode(&mut first).expect("re-decode of encoded message");
    let again = decoded.encode().expect("re-encode of decoded message");
    assert_eq!(decoded, Gtp2Message::decode(&mut again.freeze()).expect("stable decode"));
});
