/*---------------------------------------------------------------------------------------------
 *  Coefficient-probability neighbor context.
 *
 *  Tracks whether a subblock has a left/above neighbor within the image, and whether that
 *  neighbor's last coefficient was nonzero, to select which of the three coefficient contexts
 *  a subblock's first token uses.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::{DEFAULT_COEFF_PROBS, NUM_COEFF_BANDS, NUM_COEFF_CONTEXTS, NUM_COEFF_PROBS, NUM_PLANE_TYPES};

/// One frame's working coefficient probabilities, seeded from the defaults and optionally
/// overridden by per-frame deltas the bitstream header carries. Indexed by plane type first
/// (see `consts::PlaneType`), since the four coefficient planes (Y-after-Y2, Y2, chroma,
/// Y-with-DC) have statistically distinct coefficient distributions and each needs its own
/// probability grid.
#[derive(Debug, Clone)]
pub struct CoeffProbTable {
    probs: [[[[u8; NUM_COEFF_PROBS]; NUM_COEFF_CONTEXTS]; NUM_COEFF_BANDS]; NUM_PLANE_TYPES],
}

impl Default for CoeffProbTable {
    fn default() -> Self {
        Self {
            probs: DEFAULT_COEFF_PROBS,
        }
    }
}

impl CoeffProbTable {
    pub fn probs_for(&self, plane_type: usize, band: usize, context: usize) -> &[u8; NUM_COEFF_PROBS] {
        &self.probs[plane_type][band][context]
    }

    /// Applies a per-frame probability update at `(plane_type, band, context, node)` carried in
    /// the bitstream header's coefficient-probability delta tree.
    pub fn set(&mut self, plane_type: usize, band: usize, context: usize, node: usize, value: u8) {
        self.probs[plane_type][band][context][node] = value;
    }

    /// Replaces the whole grid at once, the shape `FrameProbAccumulator::finalize` and
    /// `CoeffProbTable`'s own storage share.
    pub fn load(&mut self, grid: [[[[u8; NUM_COEFF_PROBS]; NUM_COEFF_CONTEXTS]; NUM_COEFF_BANDS]; NUM_PLANE_TYPES]) {
        self.probs = grid;
    }

    /// Iterates every `(plane_type, band, context, node)` coordinate in a fixed order, paired
    /// with its current probability value; used to walk the full grid when writing or reading
    /// the header's delta tree.
    pub fn iter_coords() -> impl Iterator<Item = (usize, usize, usize, usize)> {
        (0..NUM_PLANE_TYPES).flat_map(|plane| {
            (0..NUM_COEFF_BANDS).flat_map(move |band| {
                (0..NUM_COEFF_CONTEXTS).flat_map(move |ctx| (0..NUM_COEFF_PROBS).map(move |node| (plane, band, ctx, node)))
            })
        })
    }
}

/// Tracks, per 4x4 subblock position within a macroblock row, whether the subblock immediately
/// to the left and immediately above had a nonzero last coefficient -- the two bits that select
/// a coefficient's starting context (0, 1 or 2) the way RFC 6386 Section 13.3 defines.
pub struct NonzeroContext {
    left_present: bool,
    above_present: bool,
}

impl NonzeroContext {
    pub fn new(left_present: bool, above_present: bool) -> Self {
        Self {
            left_present,
            above_present,
        }
    }

    /// Combines the left/above nonzero flags into the 0..=2 context index the coefficient
    /// tree's first node is read with.
    pub fn starting_context(&self, left_nonzero: bool, above_nonzero: bool) -> usize {
        let left = if self.left_present { left_nonzero as u8 } else { 0 };
        let above = if self.above_present { above_nonzero as u8 } else { 0 };
        (left + above) as usize
    }
}

/// Resolves the starting coefficient-probability context for one block of a macroblock's
/// `nonzero_context` grid: `base` is that plane's offset within the flat 25-entry array (0 for
/// luma, 16 for Cb, 20 for Cr, 24 for Y2), `width` is the plane's square sub-grid width (4 for
/// luma, 2 for chroma, 1 for Y2), and `(row, col)` is the block's position in that sub-grid.
/// Blocks on this macroblock's own left/top edge pull their neighbor flag from the
/// corresponding left/above macroblock's `nonzero_context`, when one exists.
#[allow(clippy::too_many_arguments)]
pub fn block_start_context(
    own: &[bool; 25],
    left: Option<&[bool; 25]>,
    above: Option<&[bool; 25]>,
    base: usize,
    width: usize,
    row: usize,
    col: usize,
) -> usize {
    let left_nonzero = if col > 0 {
        own[base + row * width + col - 1]
    } else {
        left.map(|n| n[base + row * width + width - 1]).unwrap_or(false)
    };
    let above_nonzero = if row > 0 {
        own[base + (row - 1) * width + col]
    } else {
        above.map(|n| n[base + (width - 1) * width + col]).unwrap_or(false)
    };
    let ctx = NonzeroContext::new(col > 0 || left.is_some(), row > 0 || above.is_some());
    ctx.starting_context(left_nonzero, above_nonzero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_neighbors_force_context_zero() {
        let ctx = NonzeroContext::new(false, false);
        assert_eq!(ctx.starting_context(true, true), 0);
    }

    #[test]
    fn both_neighbors_nonzero_gives_context_two() {
        let ctx = NonzeroContext::new(true, true);
        assert_eq!(ctx.starting_context(true, true), 2);
    }

    #[test]
    fn default_table_matches_consts() {
        let table = CoeffProbTable::default();
        assert_eq!(table.probs_for(0, 0, 0), &DEFAULT_COEFF_PROBS[0][0][0]);
    }

    #[test]
    fn block_start_context_pulls_from_the_left_neighbor_edge() {
        let mut left_nz = [false; 25];
        left_nz[3] = true; // row 0, rightmost luma column
        let own = [false; 25];
        let ctx = block_start_context(&own, Some(&left_nz), None, 0, 4, 0, 0);
        assert_eq!(ctx, 1);
    }

    #[test]
    fn block_start_context_is_zero_at_the_frame_corner() {
        let own = [false; 25];
        let ctx = block_start_context(&own, None, None, 0, 4, 0, 0);
        assert_eq!(ctx, 0);
    }
}
