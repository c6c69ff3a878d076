/*---------------------------------------------------------------------------------------------
 *  Intra-mode rate-distortion search.
 *
 *  For each macroblock, tries every whole-block mode (and, for luma, BPred's ten per-subblock
 *  modes) and keeps whichever minimizes `hadamard_cost`, the same distortion proxy
 *  `dsp::distortion` exposes for exactly this purpose.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::distortion::hadamard_cost;
use crate::dsp::predict::{self, Mode4x4};
use crate::vp8::types::{ChromaMode, LumaMode, SubblockMode};

const ALL_4X4_MODES: [Mode4x4; 6] = [
    Mode4x4::Rd,
    Mode4x4::Vr,
    Mode4x4::Ld,
    Mode4x4::Vl,
    Mode4x4::Hd,
    Mode4x4::Hu,
];

/// Builds the four candidate 16x16-style predictions (DC/V/H/TM) for a square block and returns
/// whichever has the lowest Hadamard cost against `source`, alongside that cost.
fn best_whole_block_mode<const SIZE: usize>(
    source: &[u8],
    above: Option<&[u8]>,
    left: Option<&[u8]>,
    corner: u8,
) -> (u8, u32) {
    debug_assert_eq!(source.len(), SIZE * SIZE);
    let stride = SIZE;
    let mut best_mode = 0u8;
    let mut best_cost = u32::MAX;

    let mut dst = vec![0u8; SIZE * SIZE];

    predict::predict_dc::<SIZE>(&mut dst, 0, stride, above, left);
    let cost = block_cost(source, &dst);
    if cost < best_cost {
        best_cost = cost;
        best_mode = 0;
    }

    if let Some(a) = above {
        predict::predict_vertical::<SIZE>(&mut dst, 0, stride, a);
        let cost = block_cost(source, &dst);
        if cost < best_cost {
            best_cost = cost;
            best_mode = 1;
        }
    }

    if let Some(l) = left {
        predict::predict_horizontal::<SIZE>(&mut dst, 0, stride, l);
        let cost = block_cost(source, &dst);
        if cost < best_cost {
            best_cost = cost;
            best_mode = 2;
        }
    }

    if let (Some(a), Some(l)) = (above, left) {
        predict::predict_tm::<SIZE>(&mut dst, 0, stride, a, l, corner);
        let cost = block_cost(source, &dst);
        if cost < best_cost {
            best_cost = cost;
            best_mode = 3;
        }
    }

    (best_mode, best_cost)
}

/// Sums `hadamard_cost` over as many 4x4 tiles as `source`/`predicted` contain (both must be
/// the same square size and a multiple of 4 on a side).
fn block_cost(source: &[u8], predicted: &[u8]) -> u32 {
    let side = (source.len() as f64).sqrt() as usize;
    let mut total = 0u32;
    for ty in (0..side).step_by(4) {
        for tx in (0..side).step_by(4) {
            let mut s = [0u8; 16];
            let mut p = [0u8; 16];
            for r in 0..4 {
                for c in 0..4 {
                    s[r * 4 + c] = source[(ty + r) * side + tx + c];
                    p[r * 4 + c] = predicted[(ty + r) * side + tx + c];
                }
            }
            total += hadamard_cost(&s, &p);
        }
    }
    total
}

fn luma_mode_from_index(idx: u8) -> LumaMode {
    match idx {
        0 => LumaMode::Dc,
        1 => LumaMode::Vertical,
        2 => LumaMode::Horizontal,
        _ => LumaMode::TrueMotion,
    }
}

fn chroma_mode_from_index(idx: u8) -> ChromaMode {
    match idx {
        0 => ChromaMode::Dc,
        1 => ChromaMode::Vertical,
        2 => ChromaMode::Horizontal,
        _ => ChromaMode::TrueMotion,
    }
}

/// Chooses the 16x16 luma mode (never BPred -- the caller compares this against the BPred
/// candidate from `best_bpred_modes` and keeps whichever scores lower).
pub fn best_luma16_mode(source: &[u8], above: Option<&[u8]>, left: Option<&[u8]>, corner: u8) -> (LumaMode, u32) {
    let (idx, cost) = best_whole_block_mode::<16>(source, above, left, corner);
    (luma_mode_from_index(idx), cost)
}

pub fn best_chroma_mode(source: &[u8], above: Option<&[u8]>, left: Option<&[u8]>, corner: u8) -> (ChromaMode, u32) {
    let (idx, cost) = best_whole_block_mode::<8>(source, above, left, corner);
    (chroma_mode_from_index(idx), cost)
}

/// Per-subblock BPred search: for each of the 16 4x4 tiles (raster order), tries DC/V/H/TM plus
/// the six diagonal modes and keeps the cheapest. Subblocks are evaluated independently of one
/// another's mode choice; dependence on already-reconstructed neighbor pixels is the caller's
/// responsibility (it must reconstruct subblock `i` before asking for subblock `i+1`'s modes).
pub fn best_subblock_mode(
    source: &[u8; 16],
    above: &[u8; 8],
    left: &[u8; 5],
) -> (SubblockMode, u32) {
    let mut best_mode = SubblockMode::Dc;
    let mut dst = [0u8; 16];

    let above4 = [above[0], above[1], above[2], above[3]];
    let left4 = [left[1], left[2], left[3], left[4]];

    predict::predict_dc::<4>(&mut dst, 0, 4, Some(&above4), Some(&left4));
    let mut best_cost = hadamard_cost(source, &dst);

    predict::predict_vertical::<4>(&mut dst, 0, 4, &above4);
    let cost = hadamard_cost(source, &dst);
    if cost < best_cost {
        best_cost = cost;
        best_mode = SubblockMode::Vertical;
    }

    predict::predict_horizontal::<4>(&mut dst, 0, 4, &left4);
    let cost = hadamard_cost(source, &dst);
    if cost < best_cost {
        best_cost = cost;
        best_mode = SubblockMode::Horizontal;
    }

    predict::predict_tm::<4>(&mut dst, 0, 4, &above4, &left4, left[0]);
    let cost = hadamard_cost(source, &dst);
    if cost < best_cost {
        best_cost = cost;
        best_mode = SubblockMode::TrueMotion;
    }

    for &mode in &ALL_4X4_MODES {
        predict::predict_4x4(mode, above, left, &mut dst);
        let cost = hadamard_cost(source, &dst);
        if cost < best_cost {
            best_cost = cost;
            best_mode = SubblockMode::Diagonal(mode);
        }
    }

    (best_mode, best_cost)
}

/// Sum of absolute differences from the mean over a 16x16 source block, a cheap proxy for how
/// textured a macroblock is; flatter blocks (skies, backgrounds) get a lower activity score
/// than edges and fine detail.
pub fn block_activity(source: &[u8; 256]) -> u32 {
    let sum: u32 = source.iter().map(|&p| p as u32).sum();
    let mean = sum / 256;
    source.iter().map(|&p| (p as i32 - mean as i32).unsigned_abs()).sum()
}

/// Buckets every macroblock's activity score into `num_segments` quantile bands and returns
/// each macroblock's segment id (0 = most active / least compressible, counting down to the
/// flattest band). `sns_strength` widens the spread between bucket boundaries -- at 0 every
/// macroblock lands in segment 0, at 100 the buckets are evenly spaced across the full
/// activity range -- mirroring how a higher spatial noise shaping strength pushes flatter
/// regions toward a more aggressive quantizer.
pub fn assign_segments(activities: &[u32], num_segments: u8, sns_strength: u8) -> Vec<u8> {
    let num_segments = num_segments.clamp(1, 4);
    if num_segments == 1 || activities.is_empty() {
        return vec![0; activities.len()];
    }

    let max = *activities.iter().max().unwrap();
    let spread = ((sns_strength as u64 * max as u64) / 100) as u32;
    let floor = max.saturating_sub(spread);
    let span = (max - floor) as u64 + 1;

    activities
        .iter()
        .map(|&a| {
            let clamped = (a.clamp(floor, max) - floor) as u64;
            let bucket = ((clamped * num_segments as u64) / span) as u8;
            let bucket = bucket.min(num_segments - 1);
            // Bucket 0 sits just above the activity floor (flattest); segment ids count down
            // from the most active region (0) to the flattest, so invert here.
            num_segments - 1 - bucket
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_macroblock_has_zero_activity() {
        let source = [100u8; 256];
        assert_eq!(block_activity(&source), 0);
    }

    #[test]
    fn assign_segments_puts_the_flattest_block_in_the_last_segment() {
        let activities = [0u32, 10, 50, 200];
        let segments = assign_segments(&activities, 4, 100);
        assert_eq!(segments[0], 3);
        assert_eq!(segments[3], 0);
    }

    #[test]
    fn single_segment_count_collapses_everything_to_zero() {
        let activities = [5u32, 500, 9000];
        assert_eq!(assign_segments(&activities, 1, 80), vec![0, 0, 0]);
    }

    #[test]
    fn flat_block_prefers_dc_mode() {
        let source = [90u8; 256];
        let above = [90u8; 16];
        let left = [90u8; 16];
        let (mode, cost) = best_luma16_mode(&source, Some(&above), Some(&left), 90);
        assert_eq!(mode, LumaMode::Dc);
        assert_eq!(cost, 0);
    }
}
