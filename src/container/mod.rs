//! RIFF/WEBP container layer: chunk walking, the VP8X extended-format chunk,
//! and the ALPH alpha sub-chunk. Routes bytes to and from the VP8/VP8L codecs; it owns no
//! pixel-level logic of its own.

pub mod alph;
pub mod riff;
pub mod vp8x;
