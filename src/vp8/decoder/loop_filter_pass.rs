/*---------------------------------------------------------------------------------------------
 *  Frame-wide deblocking pass: walks every macroblock edge and applies
 *  the normal filter, using the per-segment/per-sharpness limits `dsp::loop_filter` derives.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::loop_filter::{filter_limits, high_edge_variance, macroblock_filter, needs_filter_extended, subblock_filter};

/// Filters every internal vertical and horizontal macroblock/subblock edge of one plane in
/// place. `block_size` is 16 for luma, 8 for chroma (so chroma only has macroblock edges, no
/// interior subblock edges to filter). `mb_levels` carries one filter level per macroblock,
/// raster order over the `mb_width`-wide grid, so a segment's own strength delta applies to
/// every edge that macroblock owns regardless of which plane is being filtered.
pub fn filter_plane(
    plane: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    sharpness: u8,
    block_size: usize,
    mb_width: usize,
    mb_levels: &[u8],
) {
    if mb_levels.iter().all(|&l| l == 0) {
        return;
    }

    // Luma has both macroblock edges (every 16px) and interior subblock edges (every 4px);
    // chroma has only macroblock edges, spaced `block_size` (8px) apart since chroma runs at
    // half resolution.
    let edge_step = if block_size == 16 { 4 } else { block_size };

    // Vertical edges (filtering across a column boundary), left to right.
    for edge_x in (edge_step..width).step_by(edge_step) {
        let is_macroblock_edge = edge_x % block_size == 0;
        let mb_x = edge_x / block_size;
        for y in 0..height {
            let level = mb_levels[(y / block_size) * mb_width + mb_x];
            if level == 0 {
                continue;
            }
            let (edge_limit, interior_limit, hev_thresh) = filter_limits(level, sharpness);
            filter_edge_h(plane, stride, y * stride + edge_x, 1, edge_limit, interior_limit, hev_thresh, is_macroblock_edge);
        }
    }
    // Horizontal edges (filtering across a row boundary), top to bottom.
    for edge_y in (edge_step..height).step_by(edge_step) {
        let is_macroblock_edge = edge_y % block_size == 0;
        let mb_y = edge_y / block_size;
        for x in 0..width {
            let level = mb_levels[mb_y * mb_width + x / block_size];
            if level == 0 {
                continue;
            }
            let (edge_limit, interior_limit, hev_thresh) = filter_limits(level, sharpness);
            filter_edge_h(plane, stride, edge_y * stride + x, stride, edge_limit, interior_limit, hev_thresh, is_macroblock_edge);
        }
    }
}

/// Filters the 8 taps (p3..q3) straddling one edge, where `tap_stride` is 1 for a vertical edge
/// (taps run along a row) and `stride` for a horizontal edge (taps run down a column).
#[allow(clippy::too_many_arguments)]
fn filter_edge_h(
    plane: &mut [u8],
    plane_stride: usize,
    edge_off: usize,
    tap_stride: usize,
    edge_limit: u8,
    interior_limit: u8,
    hev_thresh: u8,
    is_macroblock_edge: bool,
) {
    if edge_off < 4 * tap_stride || edge_off + 3 * tap_stride >= plane.len() {
        return;
    }
    let _ = plane_stride;

    let p3 = plane[edge_off - 4 * tap_stride];
    let p2 = plane[edge_off - 3 * tap_stride];
    let p1 = plane[edge_off - 2 * tap_stride];
    let p0 = plane[edge_off - tap_stride];
    let q0 = plane[edge_off];
    let q1 = plane[edge_off + tap_stride];
    let q2 = plane[edge_off + 2 * tap_stride];
    let q3 = plane[edge_off + 3 * tap_stride];

    if !needs_filter_extended(p3, p2, p1, p0, q0, q1, q2, q3, edge_limit, interior_limit) {
        return;
    }

    let hev = high_edge_variance(p1, p0, q0, q1, hev_thresh);

    let mut p2v = p2;
    let mut p1v = p1;
    let mut p0v = p0;
    let mut q0v = q0;
    let mut q1v = q1;
    let mut q2v = q2;

    if is_macroblock_edge {
        macroblock_filter(hev, p3, &mut p2v, &mut p1v, &mut p0v, &mut q0v, &mut q1v, &mut q2v, q3);
    } else {
        subblock_filter(hev, &mut p2v, &mut p1v, &mut p0v, &mut q0v, &mut q1v, &mut q2v);
    }

    plane[edge_off - 3 * tap_stride] = p2v;
    plane[edge_off - 2 * tap_stride] = p1v;
    plane[edge_off - tap_stride] = p0v;
    plane[edge_off] = q0v;
    plane[edge_off + tap_stride] = q1v;
    plane[edge_off + 2 * tap_stride] = q2v;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtering_a_flat_plane_leaves_it_unchanged() {
        let mut plane = vec![100u8; 32 * 32];
        let original = plane.clone();
        filter_plane(&mut plane, 32, 32, 32, 0, 16, 2, &[40, 40, 40, 40]);
        assert_eq!(plane, original);
    }

    #[test]
    fn zero_level_is_a_no_op() {
        let mut plane = vec![0u8, 255, 0, 255, 0, 255, 0, 255];
        let original = plane.clone();
        filter_plane(&mut plane, 8, 1, 8, 0, 16, 1, &[0]);
        assert_eq!(plane, original);
    }
}
