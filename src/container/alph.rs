/*---------------------------------------------------------------------------------------------
 *  ALPH sub-chunk: carries a lossy frame's alpha plane.
 *
 *  Only the raw-storage compression method is implemented (see `alpha_encode`'s doc comment for
 *  why); the header byte's compression-method bits are always written as 0 and any other value
 *  is rejected on decode rather than silently misread.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::alpha_dsp::{unfilter_alpha_plane, AlphaFilter};
use crate::error::WebPError;
use crate::vp8::encoder::alpha_encode::encode_alpha_plane;

pub fn build_chunk(plane: &[u8], width: usize, height: usize) -> Vec<u8> {
    let encoded = encode_alpha_plane(plane, width, height);
    let mut out = Vec::with_capacity(1 + encoded.residual.len());
    out.push(filter_bits(encoded.filter));
    out.extend_from_slice(&encoded.residual);
    out
}

fn filter_bits(filter: AlphaFilter) -> u8 {
    match filter {
        AlphaFilter::None => 0 << 2,
        AlphaFilter::Horizontal => 1 << 2,
        AlphaFilter::Vertical => 2 << 2,
        AlphaFilter::Gradient => 3 << 2,
    }
}

pub fn decode_chunk(payload: &[u8], width: usize, height: usize) -> anyhow::Result<Vec<u8>> {
    if payload.is_empty() {
        anyhow::bail!(WebPError::MalformedContainer("empty ALPH chunk"));
    }
    let header = payload[0];
    if header & 0b11 != 0 {
        anyhow::bail!(WebPError::UnsupportedFeature("VP8L-compressed ALPH payload"));
    }
    let filter = AlphaFilter::from_bits((header >> 2) & 0b11)
        .ok_or(WebPError::BitstreamViolation("invalid ALPH filter method"))?;

    let mut plane = payload[1..].to_vec();
    if plane.len() != width * height {
        anyhow::bail!(WebPError::MalformedContainer("ALPH payload size does not match the image dimensions"));
    }
    unfilter_alpha_plane(filter, &mut plane, width, height);
    Ok(plane)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_gradient_plane() {
        let width = 8;
        let height = 8;
        let plane: Vec<u8> = (0..width * height).map(|i| (i * 3 % 256) as u8).collect();
        let chunk = build_chunk(&plane, width, height);
        let decoded = decode_chunk(&chunk, width, height).unwrap();
        assert_eq!(decoded, plane);
    }
}
