/*---------------------------------------------------------------------------------------------
 *  VP8X extended-format chunk: a fixed 10-byte payload announcing which
 *  optional chunks follow and the image's canvas size. Bit layout matches the published WebP
 *  container format exactly (Rsv Rsv ICC Alpha Rsv EXIF XMP Animation, high to low), since
 *  scenario S3 pins the alpha bit's exact position.
 *--------------------------------------------------------------------------------------------*/

use crate::error::WebPError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vp8xFlags {
    pub has_icc: bool,
    pub has_alpha: bool,
    pub has_exif: bool,
    pub has_xmp: bool,
    pub has_animation: bool,
}

const ICC_BIT: u8 = 1 << 5;
const ALPHA_BIT: u8 = 1 << 4;
const EXIF_BIT: u8 = 1 << 2;
const XMP_BIT: u8 = 1 << 1;
const ANIM_BIT: u8 = 1 << 0;
const RESERVED_MASK: u8 = !(ICC_BIT | ALPHA_BIT | EXIF_BIT | XMP_BIT | ANIM_BIT);

impl Vp8xFlags {
    fn to_byte(self) -> u8 {
        let mut b = 0u8;
        if self.has_icc {
            b |= ICC_BIT;
        }
        if self.has_alpha {
            b |= ALPHA_BIT;
        }
        if self.has_exif {
            b |= EXIF_BIT;
        }
        if self.has_xmp {
            b |= XMP_BIT;
        }
        if self.has_animation {
            b |= ANIM_BIT;
        }
        b
    }

    fn from_byte(b: u8) -> Result<Self, WebPError> {
        if b & RESERVED_MASK != 0 {
            return Err(WebPError::UnsupportedFeature("reserved VP8X flag bits set"));
        }
        Ok(Self {
            has_icc: b & ICC_BIT != 0,
            has_alpha: b & ALPHA_BIT != 0,
            has_exif: b & EXIF_BIT != 0,
            has_xmp: b & XMP_BIT != 0,
            has_animation: b & ANIM_BIT != 0,
        })
    }
}

/// Builds the 10-byte VP8X payload: flags byte, 3 reserved zero bytes, 24-bit width-1,
/// 24-bit height-1 (all little-endian).
pub fn build_payload(flags: Vp8xFlags, width: u32, height: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(10);
    payload.push(flags.to_byte());
    payload.extend_from_slice(&[0, 0, 0]);
    payload.extend_from_slice(&(width - 1).to_le_bytes()[0..3]);
    payload.extend_from_slice(&(height - 1).to_le_bytes()[0..3]);
    payload
}

pub struct Vp8xInfo {
    pub flags: Vp8xFlags,
    pub width: u32,
    pub height: u32,
}

pub fn parse_payload(payload: &[u8]) -> anyhow::Result<Vp8xInfo> {
    if payload.len() != 10 {
        anyhow::bail!(WebPError::MalformedContainer("VP8X chunk is not exactly 10 bytes"));
    }
    let flags = Vp8xFlags::from_byte(payload[0])?;
    let width = u32::from_le_bytes([payload[4], payload[5], payload[6], 0]) + 1;
    let height = u32::from_le_bytes([payload[7], payload[8], payload[9], 0]) + 1;
    Ok(Vp8xInfo { flags, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_bit_matches_the_documented_position() {
        let flags = Vp8xFlags {
            has_alpha: true,
            ..Default::default()
        };
        assert_eq!(flags.to_byte(), 0b0001_0000);
    }

    #[test]
    fn round_trips_flags_and_dimensions() {
        let flags = Vp8xFlags {
            has_icc: true,
            has_alpha: true,
            has_exif: false,
            has_xmp: true,
            has_animation: false,
        };
        let payload = build_payload(flags, 200, 100);
        assert_eq!(payload.len(), 10);
        let parsed = parse_payload(&payload).unwrap();
        assert_eq!(parsed.flags, flags);
        assert_eq!(parsed.width, 200);
        assert_eq!(parsed.height, 100);
    }

    #[test]
    fn rejects_reserved_bits() {
        let payload = [0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(parse_payload(&payload).is_err());
    }
}
