#![no_main]

extern crate libfuzzer_sys;
extern crate negoex;

use negoex::{ber, pku2u};

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
    if let Ok((header, end)) = ber::skip_tlv(data, 0) {
        assert!(header.content <= end);
        assert!(end <= data.len());
    }

    if pku2u::is_pku2u_token(data) {
        if let Ok(layout) = pku2u::locate_ap_request(data, 0) {
            assert!(layout.ap_request_offset <= data.len());
        }
    }
});
