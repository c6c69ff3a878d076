/*---------------------------------------------------------------------------------------------
 *  Transform + quantize + scan for a single macroblock.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::ZIGZAG;
use crate::dsp::transform::{forward_transform_4x4, forward_wht};
use crate::vp8::quant::QuantSteps;
use crate::vp8::types::CoeffBlock;

/// Forward-transforms, quantizes and zigzag-scans one 4x4 residual block. `dc_quant`/`ac_quant`
/// pick which pair of a segment's six step values apply (luma, chroma, or the WHT's own pair).
pub fn transform_quantize_scan(residual: &[i32; 16], dc_quant: i32, ac_quant: i32) -> CoeffBlock {
    let coeffs = forward_transform_4x4(residual);
    let mut scanned = [0i32; 16];
    for (scan_pos, &raster_pos) in ZIGZAG.iter().enumerate() {
        let q = if raster_pos == 0 { dc_quant } else { ac_quant };
        scanned[scan_pos] = if q == 0 { 0 } else { coeffs[raster_pos] / q };
    }
    scanned
}

/// Collects 16 luma blocks' DC coefficients (position 0 once de-scanned) into one block, WHT
/// transforms it, quantizes with the Y2 step pair, and zigzag-scans the result, 3 step 5's "split DC into a separate WHT block" rule for I16 macroblocks.
pub fn extract_and_transform_luma_dc(luma_residual_dc: &[i32; 16], quant: &QuantSteps) -> CoeffBlock {
    let wht = forward_wht(luma_residual_dc);
    let mut scanned = [0i32; 16];
    for (scan_pos, &raster_pos) in ZIGZAG.iter().enumerate() {
        let q = if raster_pos == 0 { quant.y2_dc } else { quant.y2_ac };
        scanned[scan_pos] = if q == 0 { 0 } else { wht[raster_pos] / q };
    }
    scanned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_residual_quantizes_to_all_zero() {
        let residual = [0i32; 16];
        let out = transform_quantize_scan(&residual, 8, 8);
        assert_eq!(out, [0i32; 16]);
    }
}
