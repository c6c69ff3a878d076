/*---------------------------------------------------------------------------------------------
 *  Alpha-plane encoding for the `ALPH` chunk.
 *
 *  Picks whichever of the four alpha filters minimizes the
 *  filtered plane's total absolute residual, then stores the residual plane uncompressed --
 *  matching cwebp's `ALPHA_NO_COMPRESSION` path, the simpler of the two compression methods
 *  the format allows (the other losslessly compresses the residual through the VP8L coder).
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::alpha_dsp::{filter_alpha_plane, AlphaFilter};

pub struct EncodedAlpha {
    pub filter: AlphaFilter,
    pub residual: Vec<u8>,
}

const CANDIDATE_FILTERS: [AlphaFilter; 4] = [
    AlphaFilter::None,
    AlphaFilter::Horizontal,
    AlphaFilter::Vertical,
    AlphaFilter::Gradient,
];

pub fn encode_alpha_plane(plane: &[u8], width: usize, height: usize) -> EncodedAlpha {
    let mut best_filter = AlphaFilter::None;
    let mut best_residual = plane.to_vec();
    let mut best_cost = sum_abs_residual(plane);

    for &filter in &CANDIDATE_FILTERS[1..] {
        let mut candidate = plane.to_vec();
        filter_alpha_plane(filter, &mut candidate, width, height);
        let cost = sum_abs_residual(&candidate);
        if cost < best_cost {
            best_cost = cost;
            best_filter = filter;
            best_residual = candidate;
        }
    }

    EncodedAlpha {
        filter: best_filter,
        residual: best_residual,
    }
}

fn sum_abs_residual(plane: &[u8]) -> u64 {
    // Residuals are stored as wrapped u8 deltas; treat each as signed to approximate
    // "how expensive is this plane to code" the same way distortion.rs scores luma residuals.
    plane.iter().map(|&b| (b as i8).unsigned_abs() as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_plane_prefers_a_filter_over_none() {
        let width = 8;
        let height = 8;
        let plane: Vec<u8> = (0..width * height).map(|i| (i % width) as u8 * 10).collect();
        let encoded = encode_alpha_plane(&plane, width, height);
        assert_ne!(encoded.filter, AlphaFilter::None);
    }
}
