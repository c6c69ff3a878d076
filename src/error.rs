/*---------------------------------------------------------------------------------------------
 *  WebP core error taxonomy.
 *--------------------------------------------------------------------------------------------*/

use std::fmt;

/// The single public error sum type returned at every crate boundary (encode, decode,
/// get_features). Internal code uses `anyhow::Result` with `.context(..)` and converts to
/// one of these variants only once it reaches a public entry point: decode errors are
/// recovered at the boundary and no partial frame is ever handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebPError {
    /// An encode option was out of its documented range. Caught before any byte is written.
    InvalidOption(&'static str),
    /// Width or height exceeded `MAX_DIMENSION` (16383) on either axis.
    DimensionExceeded,
    /// RIFF/WEBP signature mismatch, impossible chunk size, or a required chunk is missing.
    MalformedContainer(&'static str),
    /// Reserved VP8X bits set, transform-stack depth > 4, or a palette with > 256 entries.
    UnsupportedFeature(&'static str),
    /// The bit reader ran out of input mid-frame.
    TruncatedStream,
    /// A decoded value violates a bitstream invariant: probability out of range, an
    /// impossible mode, a non-zero bit at a reserved position, coefficient overflow.
    BitstreamViolation(&'static str),
    /// An internal buffer was exhausted. Should not happen for conforming inputs.
    InternalCapacity,
}

impl fmt::Display for WebPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebPError::InvalidOption(field) => write!(f, "invalid option: {field}"),
            WebPError::DimensionExceeded => {
                write!(f, "image dimension exceeds the 16383 pixel limit")
            }
            WebPError::MalformedContainer(why) => write!(f, "malformed RIFF container: {why}"),
            WebPError::UnsupportedFeature(what) => write!(f, "unsupported feature: {what}"),
            WebPError::TruncatedStream => write!(f, "bitstream ended before the frame did"),
            WebPError::BitstreamViolation(what) => write!(f, "bitstream violation: {what}"),
            WebPError::InternalCapacity => write!(f, "internal buffer capacity exceeded"),
        }
    }
}

impl std::error::Error for WebPError {}

/// Converts an internal `anyhow::Error` into the public sum type at a crate boundary.
/// Anything that isn't already a `WebPError` is treated as a truncated/malformed stream,
/// since the only internal failure modes that aren't already typed are short reads.
pub(crate) fn to_public_error(e: anyhow::Error) -> WebPError {
    match e.downcast::<WebPError>() {
        Ok(public) => public,
        Err(e) => {
            if e.downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
            {
                WebPError::TruncatedStream
            } else {
                WebPError::BitstreamViolation("unclassified decode failure")
            }
        }
    }
}

pub(crate) type Result<T> = anyhow::Result<T>;
