/*---------------------------------------------------------------------------------------------
 *  Pixel reconstruction: inverse transform + intra prediction.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::ZIGZAG;
use crate::dsp::predict::{self, Mode4x4};
use crate::dsp::transform::{inverse_transform_4x4, inverse_wht};
use crate::vp8::quant::QuantSteps;
use crate::vp8::types::{ChromaMode, LumaMode, Macroblock, SubblockMode};

/// De-scans a zigzag-ordered, quantized coefficient block back to raster-order, dequantized
/// coefficients ready for the inverse transform.
fn dequantize_descan(block: &[i32; 16], dc_quant: i32, ac_quant: i32) -> [i32; 16] {
    let mut raster = [0i32; 16];
    for (scan_pos, &raster_pos) in ZIGZAG.iter().enumerate() {
        let q = if raster_pos == 0 { dc_quant } else { ac_quant };
        raster[raster_pos] = block[scan_pos] * q;
    }
    raster
}

/// Reconstructs one macroblock's luma and chroma pixels into `y`/`u`/`v` planes at the given
/// macroblock origin, using already-reconstructed neighbor pixels for prediction (the caller
/// must process macroblocks in raster order so neighbors are available).
#[allow(clippy::too_many_arguments)]
pub fn reconstruct_macroblock(
    mb: &Macroblock,
    quant: &QuantSteps,
    y: &mut [u8],
    y_stride: usize,
    u: &mut [u8],
    v: &mut [u8],
    chroma_stride: usize,
    mb_x: u32,
    mb_y: u32,
) {
    let y_origin = (mb_y * 16) as usize * y_stride + (mb_x * 16) as usize;
    let has_above = mb_y > 0;
    let has_left = mb_x > 0;

    reconstruct_luma(mb, quant, y, y_stride, y_origin, has_above, has_left);

    let c_origin = (mb_y * 8) as usize * chroma_stride + (mb_x * 8) as usize;
    reconstruct_chroma_plane(mb.chroma_mode, &mb.cb_coeffs, quant, u, chroma_stride, c_origin, has_above, has_left);
    reconstruct_chroma_plane(mb.chroma_mode, &mb.cr_coeffs, quant, v, chroma_stride, c_origin, has_above, has_left);
}

fn reconstruct_luma(
    mb: &Macroblock,
    quant: &QuantSteps,
    y: &mut [u8],
    stride: usize,
    origin: usize,
    has_above: bool,
    has_left: bool,
) {
    let mut luma_dc = [0i32; 16];
    if mb.has_separate_luma_dc {
        let raster = dequantize_descan(&mb.luma_dc, quant.y2_dc, quant.y2_ac);
        luma_dc = inverse_wht(&raster);
    }

    let mb_right_edge_column = (origin % stride) + 15;

    if matches!(mb.luma_mode, LumaMode::BPred) {
        for by in 0..4 {
            for bx in 0..4 {
                let block_idx = by * 4 + bx;
                let block_origin = origin + by * 4 * stride + bx * 4;
                let above: [u8; 8] = core::array::from_fn(|i| {
                    if by > 0 || has_above {
                        // Above-right taps that would cross into a macroblock not yet
                        // reconstructed (the frame-above row is the one exception, since every
                        // macroblock in that row is already done) replicate the last available
                        // sample instead, the way RFC 6386's "unavailable above-right" rule does.
                        let row_start = block_origin - stride - (block_origin % stride);
                        let column_cap = if by > 0 { mb_right_edge_column } else { stride - 1 };
                        let column = ((block_origin % stride) + i).min(column_cap).min(stride - 1);
                        y[row_start + column]
                    } else {
                        127
                    }
                });
                let left: [u8; 5] = core::array::from_fn(|i| {
                    if i == 0 {
                        corner_pixel(y, stride, block_origin, bx > 0, by > 0, has_left, has_above)
                    } else if bx > 0 {
                        y[block_origin + (i - 1) * stride - 1]
                    } else if has_left {
                        y[block_origin + (i - 1) * stride - 1]
                    } else {
                        129
                    }
                });

                let mut dst = [0u8; 16];
                predict_subblock(mb.subblock_modes[block_idx], &above, &left, &mut dst);

                let mut block = dequantize_descan(&mb.luma_coeffs[block_idx], quant.y1_dc, quant.y1_ac);
                if mb.has_separate_luma_dc {
                    block[0] = luma_dc[block_idx];
                }
                let residual = inverse_transform_4x4(&block);

                for r in 0..4 {
                    for c in 0..4 {
                        let v = dst[r * 4 + c] as i32 + residual[r * 4 + c];
                        y[block_origin + r * stride + c] = v.clamp(0, 255) as u8;
                    }
                }
            }
        }
    } else {
        let above: Option<[u8; 16]> = has_above.then(|| core::array::from_fn(|i| y[origin - stride + i]));
        let left: Option<[u8; 16]> = has_left.then(|| core::array::from_fn(|r| y[origin + r * stride - 1]));
        let corner = if has_above && has_left { y[origin - stride - 1] } else { 129 };

        let mut dst = vec![0u8; 256];
        predict_whole::<16>(mb.luma_mode_as_whole(), &mut dst, above.as_ref().map(|a| a.as_slice()), left.as_ref().map(|a| a.as_slice()), corner);

        for by in 0..4 {
            for bx in 0..4 {
                let block_idx = by * 4 + bx;
                let mut block = dequantize_descan(&mb.luma_coeffs[block_idx], quant.y1_dc, quant.y1_ac);
                if mb.has_separate_luma_dc {
                    block[0] = luma_dc[block_idx];
                }
                let residual = inverse_transform_4x4(&block);
                for r in 0..4 {
                    for c in 0..4 {
                        let px = (by * 4 + r) * 16 + bx * 4 + c;
                        let v = dst[px] as i32 + residual[r * 4 + c];
                        y[origin + (by * 4 + r) * stride + bx * 4 + c] = v.clamp(0, 255) as u8;
                    }
                }
            }
        }
    }
}

fn corner_pixel(y: &[u8], stride: usize, block_origin: usize, left_in_mb: bool, above_in_mb: bool, has_left: bool, has_above: bool) -> u8 {
    if (left_in_mb || has_left) && (above_in_mb || has_above) {
        y[block_origin - stride - 1]
    } else {
        129
    }
}

fn predict_subblock(mode: SubblockMode, above: &[u8; 8], left: &[u8; 5], dst: &mut [u8; 16]) {
    let above4 = [above[0], above[1], above[2], above[3]];
    let left4 = [left[1], left[2], left[3], left[4]];
    match mode {
        SubblockMode::Dc => predict::predict_dc::<4>(dst, 0, 4, Some(&above4), Some(&left4)),
        SubblockMode::Vertical => predict::predict_vertical::<4>(dst, 0, 4, &above4),
        SubblockMode::Horizontal => predict::predict_horizontal::<4>(dst, 0, 4, &left4),
        SubblockMode::TrueMotion => predict::predict_tm::<4>(dst, 0, 4, &above4, &left4, left[0]),
        SubblockMode::Diagonal(diag) => predict::predict_4x4(diag, above, left, dst),
    }
}

fn predict_whole<const SIZE: usize>(mode: WholeMode, dst: &mut [u8], above: Option<&[u8]>, left: Option<&[u8]>, corner: u8) {
    match mode {
        WholeMode::Dc => predict::predict_dc::<SIZE>(dst, 0, SIZE, above, left),
        WholeMode::Vertical => predict::predict_vertical::<SIZE>(dst, 0, SIZE, above.unwrap_or(&[127; 16])),
        WholeMode::Horizontal => predict::predict_horizontal::<SIZE>(dst, 0, SIZE, left.unwrap_or(&[129; 16])),
        WholeMode::TrueMotion => predict::predict_tm::<SIZE>(dst, 0, SIZE, above.unwrap_or(&[127; 16]), left.unwrap_or(&[129; 16]), corner),
    }
}

#[derive(Clone, Copy)]
enum WholeMode {
    Dc,
    Vertical,
    Horizontal,
    TrueMotion,
}

impl Macroblock {
    fn luma_mode_as_whole(&self) -> WholeMode {
        match self.luma_mode {
            LumaMode::Dc => WholeMode::Dc,
            LumaMode::Vertical => WholeMode::Vertical,
            LumaMode::Horizontal => WholeMode::Horizontal,
            LumaMode::TrueMotion => WholeMode::TrueMotion,
            LumaMode::BPred => WholeMode::Dc,
        }
    }
}

fn chroma_mode_as_whole(mode: ChromaMode) -> WholeMode {
    match mode {
        ChromaMode::Dc => WholeMode::Dc,
        ChromaMode::Vertical => WholeMode::Vertical,
        ChromaMode::Horizontal => WholeMode::Horizontal,
        ChromaMode::TrueMotion => WholeMode::TrueMotion,
    }
}

#[allow(clippy::too_many_arguments)]
fn reconstruct_chroma_plane(
    mode: ChromaMode,
    coeffs: &[[i32; 16]; 4],
    quant: &QuantSteps,
    plane: &mut [u8],
    stride: usize,
    origin: usize,
    has_above: bool,
    has_left: bool,
) {
    let above: Option<[u8; 8]> = has_above.then(|| core::array::from_fn(|i| plane[origin - stride + i]));
    let left: Option<[u8; 8]> = has_left.then(|| core::array::from_fn(|r| plane[origin + r * stride - 1]));
    let corner = if has_above && has_left { plane[origin - stride - 1] } else { 129 };

    let mut dst = vec![0u8; 64];
    predict_whole::<8>(chroma_mode_as_whole(mode), &mut dst, above.as_ref().map(|a| a.as_slice()), left.as_ref().map(|a| a.as_slice()), corner);

    for by in 0..2 {
        for bx in 0..2 {
            let block_idx = by * 2 + bx;
            let raster = dequantize_descan(&coeffs[block_idx], quant.uv_dc, quant.uv_ac);
            let residual = inverse_transform_4x4(&raster);
            for r in 0..4 {
                for c in 0..4 {
                    let px = (by * 4 + r) * 8 + bx * 4 + c;
                    let v = dst[px] as i32 + residual[r * 4 + c];
                    plane[origin + (by * 4 + r) * stride + bx * 4 + c] = v.clamp(0, 255) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vp8::types::MacroblockGrid;

    #[test]
    fn all_zero_macroblock_reconstructs_to_flat_gray() {
        let grid = MacroblockGrid::new(1, 1);
        let quant = QuantSteps::new(40, 0, 0, 0, 0, 0);
        let mut y = vec![0u8; 16 * 16];
        let mut u = vec![0u8; 8 * 8];
        let mut v = vec![0u8; 8 * 8];
        reconstruct_macroblock(&grid.macroblocks[0], &quant, &mut y, 16, &mut u, &mut v, 8, 0, 0);
        // DC prediction with no neighbors falls back to 128, and an all-zero residual leaves it.
        assert!(y.iter().all(|&p| p == 128));
    }
}
