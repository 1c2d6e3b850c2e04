//! Fuzz target: NVS config blob decoding
//!
//! Feeds arbitrary bytes through the same path `NvsAdapter::load` takes
//! and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything that decodes also passes validation and re-encodes to a
//!   blob that decodes to the same config
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use playbuttons::adapters::nvs::{MAX_BLOB_SIZE, NvsAdapter, decode_config, validate_config};
use playbuttons::app::ports::ConfigPort;

fuzz_target!(|data: &[u8]| {
    let decoded = decode_config(data);

    let nvs = NvsAdapter::new().expect("simulation backend");
    nvs.inject_raw(data);
    assert_eq!(nvs.load(), decoded, "adapter and decoder disagree");

    if let Ok(cfg) = decoded {
        assert!(validate_config(&cfg).is_ok());
        let bytes = postcard::to_allocvec(&cfg).expect("re-encode");
        assert!(bytes.len() <= MAX_BLOB_SIZE);
        assert_eq!(decode_config(&bytes), Ok(cfg));
    }
});
