//! VP8 lossy codec.

pub mod decoder;
pub mod encoder;
pub mod entropy;
pub mod probability_tables;
pub mod quant;
pub mod types;

pub use decoder::{decode_vp8, DecodedFrame};
pub use encoder::encode_vp8;
