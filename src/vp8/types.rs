/*---------------------------------------------------------------------------------------------
 *  VP8 frame data model: macroblocks, segments, and the per-block coefficient
 *  storage both the encoder and decoder pipelines operate on.
 *
 *  `MacroblockGrid` is a flat row-major grid addressed by `(mb_x, mb_y)`; each cell owns
 *  16 luma + 4 Cb + 4 Cr 4x4 coefficient blocks plus the per-macroblock side information
 *  (segment id, prediction modes, skip flag).
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::predict::Mode4x4;

/// One 4x4 block of coefficients, stored in zigzag scan order exactly as the entropy coder
/// reads and writes them; conversion to/from the transform's
/// raster order happens at the transform boundary via `consts::ZIGZAG`.
pub type CoeffBlock = [i32; 16];

/// 16x16 luma prediction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumaMode {
    Dc,
    Vertical,
    Horizontal,
    TrueMotion,
    /// Signals that luma uses the ten-way 4x4 sub-block partition instead of one whole-macroblock
    /// mode; the 16 per-subblock modes live in `Macroblock::subblock_modes`.
    BPred,
}

/// 8x8 chroma prediction modes, the same four whole-block options luma's non-BPred path uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaMode {
    Dc,
    Vertical,
    Horizontal,
    TrueMotion,
}

/// One of the ten 4x4 intra modes: the four simple ones plus the six diagonal filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubblockMode {
    #[default]
    Dc,
    Vertical,
    Horizontal,
    TrueMotion,
    Diagonal(Mode4x4),
}

/// Per-segment coding parameters: a quantizer delta and independent
/// loop-filter strength, selected by the macroblock's `segment_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Segment {
    pub quant_delta: i32,
    pub filter_strength: i32,
}

/// One 16x16 luma + 8x8 + 8x8 chroma coding unit.
#[derive(Debug, Clone, Copy)]
pub struct Macroblock {
    pub segment_id: u8,
    pub skip_coeff: bool,
    pub luma_mode: LumaMode,
    pub chroma_mode: ChromaMode,
    /// Valid only when `luma_mode == LumaMode::BPred`; one mode per of the 16 luma subblocks,
    /// raster order.
    pub subblock_modes: [SubblockMode; 16],
    /// 16 luma + 4 Cb + 4 Cr 4x4 coefficient blocks, raster order within each plane.
    pub luma_coeffs: [CoeffBlock; 16],
    pub cb_coeffs: [CoeffBlock; 4],
    pub cr_coeffs: [CoeffBlock; 4],
    /// True once this macroblock's I16 luma DC coefficients have been collected into a WHT
    /// block and zeroed out of `luma_coeffs`.
    pub has_separate_luma_dc: bool,
    pub luma_dc: CoeffBlock,
    /// Per-plane "how many of the 16/4/4 blocks have a nonzero last coefficient" context the
    /// neighbor-aware coefficient-probability selection consults.
    pub nonzero_context: [bool; 25],
}

impl Default for Macroblock {
    fn default() -> Self {
        Self {
            segment_id: 0,
            skip_coeff: false,
            luma_mode: LumaMode::Dc,
            chroma_mode: ChromaMode::Dc,
            subblock_modes: [SubblockMode::Dc; 16],
            luma_coeffs: [[0; 16]; 16],
            cb_coeffs: [[0; 16]; 4],
            cr_coeffs: [[0; 16]; 4],
            has_separate_luma_dc: false,
            luma_dc: [0; 16],
            nonzero_context: [false; 25],
        }
    }
}

/// A VP8 frame's macroblock grid plus the frame-level metadata every macroblock's decode
/// depends on.
#[derive(Debug, Clone)]
pub struct MacroblockGrid {
    pub mb_width: u32,
    pub mb_height: u32,
    pub macroblocks: Vec<Macroblock>,
    pub segments: [Segment; 4],
    pub num_segments: u8,
    pub base_quant: i32,
    pub filter_level: u8,
    pub filter_sharpness: u8,
    pub use_simple_filter: bool,
}

impl MacroblockGrid {
    pub fn new(mb_width: u32, mb_height: u32) -> Self {
        Self {
            mb_width,
            mb_height,
            macroblocks: vec![Macroblock::default(); (mb_width * mb_height) as usize],
            segments: [Segment::default(); 4],
            num_segments: 1,
            base_quant: 0,
            filter_level: 0,
            filter_sharpness: 0,
            use_simple_filter: false,
        }
    }

    #[inline]
    pub fn index(&self, mb_x: u32, mb_y: u32) -> usize {
        (mb_y * self.mb_width + mb_x) as usize
    }

    pub fn get(&self, mb_x: u32, mb_y: u32) -> &Macroblock {
        &self.macroblocks[self.index(mb_x, mb_y)]
    }

    pub fn get_mut(&mut self, mb_x: u32, mb_y: u32) -> &mut Macroblock {
        let idx = self.index(mb_x, mb_y);
        &mut self.macroblocks[idx]
    }

    /// This macroblock's effective loop-filter level: the frame-wide level plus its segment's
    /// delta, clamped to the 0..=63 range the filter header's level field carries.
    pub fn filter_level_for(&self, mb_x: u32, mb_y: u32) -> u8 {
        let mb = self.get(mb_x, mb_y);
        let seg = self.segments[mb.segment_id as usize];
        (self.filter_level as i32 + seg.filter_strength).clamp(0, 63) as u8
    }

    /// One filter level per macroblock, raster order, for the loop filter pass to index by
    /// macroblock-grid position regardless of which plane (luma or chroma) it's filtering.
    pub fn filter_levels(&self) -> Vec<u8> {
        let mut levels = Vec::with_capacity(self.macroblocks.len());
        for mb_y in 0..self.mb_height {
            for mb_x in 0..self.mb_width {
                levels.push(self.filter_level_for(mb_x, mb_y));
            }
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexes_macroblocks_in_raster_order() {
        let grid = MacroblockGrid::new(3, 2);
        assert_eq!(grid.index(0, 0), 0);
        assert_eq!(grid.index(2, 1), 5);
        assert_eq!(grid.macroblocks.len(), 6);
    }

    #[test]
    fn default_macroblock_has_no_coefficients() {
        let mb = Macroblock::default();
        assert!(mb.luma_coeffs.iter().all(|b| b.iter().all(|&v| v == 0)));
    }
}
