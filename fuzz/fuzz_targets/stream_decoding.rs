#![no_main]

extern crate libfuzzer_sys;
extern crate negoex;

use negoex::{DecoderConfig, NegoexDecoder, RecordingSink, RecoveryMode};

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
    let mut sink = RecordingSink::new();
    let summary = negoex::decode_stream(data, &mut sink);
    assert!(sink.is_balanced());
    assert!(summary.end_offset >= summary.messages.last().map_or(0, |message| message.offset));
    assert!(summary.end_offset <= data.len());

    let decoder = NegoexDecoder::new(DecoderConfig::with_recovery(RecoveryMode::Resynchronize));
    let mut sink = RecordingSink::new();
    let _ = decoder.decode(data, &mut sink);
    assert!(sink.is_balanced());
});
