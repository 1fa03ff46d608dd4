//! JPEG XL-style context map codec.
//!
//! Decodes the table that assigns each entropy-coding context to a cluster
//! (a shared histogram), validates it, and reports the number of clusters.
//! Both on-wire encodings are supported: raw fixed-width entries, and an
//! ANS-coded stream of move-to-front indices with zero runs.
//!
//! ## Features
//! - Core library depends only on `thiserror` and `tracing`
//! - `wasm` - Browser WASM bindings
//!
//! ## Example
//!
//! ```rust
//! use jxl_context_map::{decode_context_map, encode_context_map, BitReader, BitWriter, EncodeOptions};
//!
//! let context_map: Vec<u8> = (0..64).map(|i| (i % 5 == 0) as u8 + (i > 40) as u8).collect();
//!
//! let mut writer = BitWriter::new();
//! encode_context_map(&context_map, &mut writer, &EncodeOptions::default())?;
//! let data = writer.finish();
//!
//! let mut decoded = vec![0u8; context_map.len()];
//! let num_htrees = decode_context_map(&mut decoded, &mut BitReader::new(&data))?;
//! assert_eq!(decoded, context_map);
//! assert_eq!(num_htrees, 3);
//! # Ok::<(), jxl_context_map::ContextMapError>(())
//! ```

mod bit_reader;
mod bit_writer;
pub mod context_map;
pub mod entropy;
pub mod error;


#[cfg(feature = "wasm")]
mod wasm_bindings;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
pub use context_map::{
    decode_context_map, encode_context_map, inverse_move_to_front, move_to_front,
    verify_context_map, ContextMapEncoding, EncodeOptions, MAX_CLUSTERS,
};
pub use error::{ContextMapError, Result};

// Re-export the entropy collaborators used by the general path
pub use entropy::{decode_histograms, unpack_signed, AnsCode, AnsSymbolReader};

#[cfg(feature = "wasm")]
pub use wasm_bindings::*;
