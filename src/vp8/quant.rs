/*---------------------------------------------------------------------------------------------
 *  Per-segment quantizer state.
 *
 *  A small struct computed once per segment from a base index, exposing ready-to-use step
 *  values instead of making every caller re-derive them from the raw table + delta each time.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::{quant_index, AC_QUANT, DC_QUANT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantSteps {
    pub y1_dc: i32,
    pub y1_ac: i32,
    pub y2_dc: i32,
    pub y2_ac: i32,
    pub uv_dc: i32,
    pub uv_ac: i32,
}

impl QuantSteps {
    /// Derives one segment's six step values from the frame base quantizer index plus the
    /// segment's own delta and the fixed per-plane DC/AC deltas the header carries.
    pub fn new(base_index: i32, segment_delta: i32, y2_dc_delta: i32, y2_ac_delta: i32, uv_dc_delta: i32, uv_ac_delta: i32) -> Self {
        let y1 = quant_index(base_index, segment_delta);
        Self {
            y1_dc: DC_QUANT[y1],
            y1_ac: AC_QUANT[y1],
            y2_dc: DC_QUANT[quant_index(base_index, segment_delta + y2_dc_delta)] * 2,
            y2_ac: (AC_QUANT[quant_index(base_index, segment_delta + y2_ac_delta)] * 155 / 100).max(8),
            uv_dc: DC_QUANT[quant_index(base_index, segment_delta + uv_dc_delta)].min(132),
            uv_ac: AC_QUANT[quant_index(base_index, segment_delta + uv_ac_delta)],
        }
    }

    #[inline]
    pub fn dequantize(&self, coeffs: &mut [i32; 16], plane_ac: i32, plane_dc: i32) {
        coeffs[0] *= plane_dc;
        for c in &mut coeffs[1..] {
            *c *= plane_ac;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_base_index_never_decreases_steps() {
        let low = QuantSteps::new(10, 0, 0, 0, 0, 0);
        let high = QuantSteps::new(100, 0, 0, 0, 0, 0);
        assert!(high.y1_ac >= low.y1_ac);
        assert!(high.y1_dc >= low.y1_dc);
    }

    #[test]
    fn y2_ac_has_a_floor_of_eight() {
        let q = QuantSteps::new(0, 0, 0, 0, 0, 0);
        assert!(q.y2_ac >= 8);
    }
}
