#![no_main]
use jxl_context_map::{
    decode_context_map, encode_context_map, BitReader, BitWriter, ContextMapEncoding,
    EncodeOptions,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Byte 0: encoding (0-2)
    let encoding = match data[0] % 3 {
        0 => ContextMapEncoding::Auto,
        1 => ContextMapEncoding::Simple,
        _ => ContextMapEncoding::EntropyCoded,
    };
    let context_map = &data[1..];
    let options = EncodeOptions {
        encoding,
        ..EncodeOptions::default()
    };

    let mut writer = BitWriter::new();
    let Ok(num_htrees) = encode_context_map(context_map, &mut writer, &options) else {
        // Sparse maps and too many clusters for the simple layout
        return;
    };
    let encoded = writer.finish();

    let mut decoded = vec![0u8; context_map.len()];
    let decoded_htrees = decode_context_map(&mut decoded, &mut BitReader::new(&encoded))
        .expect("encoder output must decode");
    assert_eq!(decoded_htrees, num_htrees);
    assert_eq!(decoded, context_map);
});
