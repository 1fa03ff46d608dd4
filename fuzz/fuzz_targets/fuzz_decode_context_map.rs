#![no_main]
use jxl_context_map::{decode_context_map, verify_context_map, BitReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First 2 bytes: number of contexts (capped to 4096)
    let num_contexts = u16::from_le_bytes([data[0], data[1]]) as usize % 4097;

    let mut context_map = vec![0u8; num_contexts];
    let mut reader = BitReader::new(&data[2..]);
    if let Ok(num_htrees) = decode_context_map(&mut context_map, &mut reader) {
        assert!(verify_context_map(&context_map, num_htrees).is_ok());
    }
});
