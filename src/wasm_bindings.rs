//! WASM bindings for jxl-context-map.
//!
//! Provides browser-compatible decode and encode entry points.

use wasm_bindgen::prelude::*;

use crate::{decode_context_map, encode_context_map, BitReader, BitWriter, EncodeOptions};

/// Decode a context map of `num_contexts` entries from the start of `data`.
///
/// Returns `{ contextMap: Uint8Array, numClusters: number, bitsRead: number }`.
#[wasm_bindgen(js_name = decodeContextMap)]
pub fn decode_context_map_js(data: &[u8], num_contexts: usize) -> Result<JsValue, JsError> {
    let mut reader = BitReader::new(data);
    let mut context_map = vec![0u8; num_contexts];
    let num_clusters = decode_context_map(&mut context_map, &mut reader)
        .map_err(|e| JsError::new(&e.to_string()))?;

    let obj = js_sys::Object::new();
    let array = js_sys::Uint8Array::from(context_map.as_slice());
    let _ = js_sys::Reflect::set(&obj, &"contextMap".into(), &array.into());
    let _ = js_sys::Reflect::set(&obj, &"numClusters".into(), &JsValue::from_f64(num_clusters as f64));
    let _ = js_sys::Reflect::set(&obj, &"bitsRead".into(), &JsValue::from_f64(reader.bit_position() as f64));
    Ok(obj.into())
}

/// Encode a context map with default options.
#[wasm_bindgen(js_name = encodeContextMap)]
pub fn encode_context_map_js(context_map: &[u8]) -> Result<Vec<u8>, JsError> {
    let mut writer = BitWriter::new();
    encode_context_map(context_map, &mut writer, &EncodeOptions::default())
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(writer.finish())
}
