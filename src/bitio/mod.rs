/*---------------------------------------------------------------------------------------------
 *  Bit I/O primitives.
 *
 *  Two independent coders live here:
 *  - `bool_encoder`/`bool_decoder`: the VP8 boolean arithmetic coder pair used for residual
 *    and mode-tree coding in the lossy path.
 *  - `prefix_writer`/`prefix_reader`: the canonical-prefix-code LSB-first bit stream used by
 *    VP8L.
 *--------------------------------------------------------------------------------------------*/

pub mod bool_decoder;
pub mod bool_encoder;
pub mod prefix_reader;
pub mod prefix_writer;

pub use bool_decoder::Vp8BoolDecoder;
pub use bool_encoder::Vp8BoolEncoder;
pub use prefix_reader::BitReaderLsb;
pub use prefix_writer::BitWriterLsb;
