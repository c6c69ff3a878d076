/*---------------------------------------------------------------------------------------------
 *  Deblocking loop filter: simple and normal variants.
 *
 *  Operates on a flat row-major pixel plane through a non-negative base offset: a vertical-edge
 *  filter reads `p3..p0` to the left of `off` and `q0..q3` to the right, a horizontal-edge
 *  filter reads the same four taps one `stride` apart above and below `off`, and callers are
 *  responsible for never passing an `off` closer than 4 taps to a plane boundary.
 *--------------------------------------------------------------------------------------------*/

use super::clip_tables::{clip_s4, clip_s8, clip_u8};

#[inline]
fn common_adjust(use_outer_taps: bool, p1: u8, p0: u8, q0: u8, q1: u8) -> (i32, u8, u8) {
    let p1 = p1 as i32 - 128;
    let p0 = p0 as i32 - 128;
    let q0 = q0 as i32 - 128;
    let q1 = q1 as i32 - 128;

    let mut a = if use_outer_taps {
        clip_s8(p1 - q1) as i32
    } else {
        0
    };
    a = clip_s8(a + 3 * (q0 - p0)) as i32;

    let f1 = clip_s8((a + 4) >> 3) as i32;
    let f2 = clip_s8((a + 3) >> 3) as i32;

    let new_q0 = clip_u8(q0 - f1 + 128);
    let new_p0 = clip_u8(p0 + f2 + 128);

    (f1, new_p0, new_q0)
}

/// Edge gate shared by every filter variant: `4*|p0-q0| + |p1-q1| <= 2*thresh + 1`.
#[inline]
pub fn needs_filter(p1: u8, p0: u8, q0: u8, q1: u8, thresh: u8) -> bool {
    4 * (p0 as i32 - q0 as i32).abs() + (p1 as i32 - q1 as i32).abs() <= 2 * thresh as i32 + 1
}

/// The normal filter's stronger, edge-extended gate, consulted for luma macroblock edges.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn needs_filter_extended(
    p3: u8,
    p2: u8,
    p1: u8,
    p0: u8,
    q0: u8,
    q1: u8,
    q2: u8,
    q3: u8,
    edge_limit: u8,
    interior_limit: u8,
) -> bool {
    needs_filter(p1, p0, q0, q1, edge_limit)
        && (p3 as i32 - p2 as i32).abs() <= interior_limit as i32
        && (p2 as i32 - p1 as i32).abs() <= interior_limit as i32
        && (p1 as i32 - p0 as i32).abs() <= interior_limit as i32
        && (q3 as i32 - q2 as i32).abs() <= interior_limit as i32
        && (q2 as i32 - q1 as i32).abs() <= interior_limit as i32
        && (q1 as i32 - q0 as i32).abs() <= interior_limit as i32
}

/// Simple two-tap filter applied across one edge (a single call handles either a vertical or
/// horizontal edge; the caller picks the tap stride).
pub fn simple_filter(p1: &mut u8, p0: &mut u8, q0: &mut u8, q1: &mut u8) {
    let (_, new_p0, new_q0) = common_adjust(true, *p1, *p0, *q0, *q1);
    *p0 = new_p0;
    *q0 = new_q0;
}

/// Normal (subblock) filter: four-tap adjustment to p0/q0, gated by high-edge-variance on
/// whether outer taps (p1/q1) are read, and whether p1/q1 themselves get touched up.
pub fn subblock_filter(hev: bool, p2: &mut u8, p1: &mut u8, p0: &mut u8, q0: &mut u8, q1: &mut u8, q2: &mut u8) {
    let _ = (p2, q2);
    let (f1, new_p0, new_q0) = common_adjust(hev, *p1, *p0, *q0, *q1);
    if !hev {
        let a = (f1 + 1) >> 1;
        *q1 = clip_u8(*q1 as i32 - a);
        *p1 = clip_u8(*p1 as i32 + a);
    }
    *p0 = new_p0;
    *q0 = new_q0;
}

/// Normal (macroblock) filter: six-tap adjustment spreading across p2..q2 when the edge has
/// low variance, falling back to the narrower subblock-style adjustment (outer taps, p0/q0
/// only) when high edge variance means the wide filter would blur a real edge.
pub fn macroblock_filter(
    hev: bool,
    p3: u8,
    p2: &mut u8,
    p1: &mut u8,
    p0: &mut u8,
    q0: &mut u8,
    q1: &mut u8,
    q2: &mut u8,
    _q3: u8,
) {
    let _ = p3;
    if hev {
        let (_, new_p0, new_q0) = common_adjust(true, *p1, *p0, *q0, *q1);
        *p0 = new_p0;
        *q0 = new_q0;
        return;
    }

    let p2v = *p2 as i32 - 128;
    let p1v = *p1 as i32 - 128;
    let p0v = *p0 as i32 - 128;
    let q0v = *q0 as i32 - 128;
    let q1v = *q1 as i32 - 128;
    let q2v = *q2 as i32 - 128;

    let w = clip_s8(clip_s8(p1v - q1v) as i32 + 3 * (q0v - p0v)) as i32;

    let a = (27 * w + 63) >> 7;
    *q0 = clip_u8(q0v - a + 128);
    *p0 = clip_u8(p0v + a + 128);

    let a = (18 * w + 63) >> 7;
    *q1 = clip_u8(q1v - a + 128);
    *p1 = clip_u8(p1v + a + 128);

    let a = (9 * w + 63) >> 7;
    *q2 = clip_u8(q2v - a + 128);
    *p2 = clip_u8(p2v + a + 128);
}

/// Scales a macroblock's base filter strength by sharpness into `(edge_limit, interior_limit,
/// hev_thresh)`, the triple the per-edge gates above consume.
pub fn filter_limits(level: u8, sharpness: u8) -> (u8, u8, u8) {
    let mut interior = level;
    if sharpness > 0 {
        interior >>= if sharpness > 4 { 2 } else { 1 };
        let cap = 9 - sharpness;
        if interior > cap {
            interior = cap;
        }
    }
    if interior < 1 {
        interior = 1;
    }
    let edge = 2 * level + interior;
    let hev_thresh = if level >= 40 { 2 } else if level >= 15 { 1 } else { 0 };
    (edge, interior, hev_thresh)
}

#[inline]
pub fn high_edge_variance(p1: u8, p0: u8, q0: u8, q1: u8, thresh: u8) -> bool {
    (p1 as i32 - p0 as i32).abs() > thresh as i32 || (q1 as i32 - q0 as i32).abs() > thresh as i32
}

#[inline]
pub fn clamp_s4_delta(v: i32) -> i8 {
    clip_s4(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_edge_needs_no_visible_change() {
        let (mut p1, mut p0, mut q0, mut q1) = (100u8, 100, 100, 100);
        simple_filter(&mut p1, &mut p0, &mut q0, &mut q1);
        assert_eq!((p1, p0, q0, q1), (100, 100, 100, 100));
    }

    #[test]
    fn filter_limits_respect_sharpness_cap() {
        let (edge, interior, hev_thresh) = filter_limits(40, 7);
        assert!(interior <= 2);
        assert!(edge >= interior);
        assert_eq!(hev_thresh, 2);
    }
}
