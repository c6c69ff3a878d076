/*---------------------------------------------------------------------------------------------
 *  Per-macroblock mode and coefficient decoding.
 *
 *  Mode info (segment id, prediction modes, skip flag) is a single raster-order pass over
 *  partition 0. Residual tokens are a second pass, one token partition per macroblock row
 *  (`mb_y % num_partitions`), each consulting the real left/above nonzero-coefficient context
 *  `block_start_context` derives instead of always starting at context 0.
 *--------------------------------------------------------------------------------------------*/

use crate::bitio::Vp8BoolDecoder;
use crate::consts::PlaneType;
use crate::vp8::entropy::read_coeff_block;
use crate::vp8::probability_tables::{block_start_context, CoeffProbTable};
use crate::vp8::types::{ChromaMode, LumaMode, Macroblock, MacroblockGrid, SubblockMode};
use std::io::Read;

pub fn decode_mode_info<R: Read>(dec: &mut Vp8BoolDecoder<R>, grid: &mut MacroblockGrid, segmentation_enabled: bool) -> anyhow::Result<()> {
    for mb_y in 0..grid.mb_height {
        for mb_x in 0..grid.mb_width {
            let mb = grid.get_mut(mb_x, mb_y);
            mb.segment_id = if segmentation_enabled { dec.get_literal(2)? as u8 } else { 0 };
            mb.skip_coeff = dec.get_bool(200)?;
            mb.luma_mode = luma_mode_from_index(dec.get_literal(3)?);
            mb.chroma_mode = chroma_mode_from_index(dec.get_literal(2)?);

            if matches!(mb.luma_mode, LumaMode::BPred) {
                for slot in mb.subblock_modes.iter_mut() {
                    *slot = subblock_mode_from_index(dec.get_literal(4)?);
                }
            }
        }
    }
    Ok(())
}

/// Decodes every macroblock's residual coefficients, pulling row `mb_y` from
/// `token_decoders[mb_y % token_decoders.len()]` the way multi-partition VP8 distributes rows
/// round-robin across its token partitions.
pub fn decode_residual_tokens<R: Read>(
    token_decoders: &mut [Vp8BoolDecoder<R>],
    grid: &mut MacroblockGrid,
    probs: &CoeffProbTable,
) -> anyhow::Result<()> {
    let num_partitions = token_decoders.len();
    let mb_width = grid.mb_width;

    for mb_y in 0..grid.mb_height {
        for mb_x in 0..mb_width {
            let left = (mb_x > 0).then(|| grid.get(mb_x - 1, mb_y).nonzero_context);
            let above = (mb_y > 0).then(|| grid.get(mb_x, mb_y - 1).nonzero_context);
            let dec = &mut token_decoders[(mb_y as usize) % num_partitions];
            let mb = grid.get_mut(mb_x, mb_y);
            decode_one_macroblock_residual(dec, probs, mb, left.as_ref(), above.as_ref())?;
        }
    }
    Ok(())
}

fn decode_one_macroblock_residual<R: Read>(
    dec: &mut Vp8BoolDecoder<R>,
    probs: &CoeffProbTable,
    mb: &mut Macroblock,
    left: Option<&[bool; 25]>,
    above: Option<&[bool; 25]>,
) -> anyhow::Result<()> {
    if mb.skip_coeff {
        mb.nonzero_context = [false; 25];
        return Ok(());
    }

    let is_i16 = !matches!(mb.luma_mode, LumaMode::BPred);
    let mut own = mb.nonzero_context;

    if is_i16 {
        let ctx = block_start_context(&own, left, above, 24, 1, 0, 0);
        let nz = read_coeff_block(dec, probs, &mut mb.luma_dc, 0, PlaneType::Y2 as usize, ctx)?;
        own[24] = nz;
        mb.has_separate_luma_dc = true;
    }

    let luma_plane_type = if mb.has_separate_luma_dc { PlaneType::YAfterY2 } else { PlaneType::YWithDc } as usize;
    let first_coeff = if mb.has_separate_luma_dc { 1 } else { 0 };
    for (idx, block) in mb.luma_coeffs.iter_mut().enumerate() {
        let (row, col) = (idx / 4, idx % 4);
        let ctx = block_start_context(&own, left, above, 0, 4, row, col);
        let nz = read_coeff_block(dec, probs, block, first_coeff, luma_plane_type, ctx)?;
        own[row * 4 + col] = nz;
    }

    for (idx, block) in mb.cb_coeffs.iter_mut().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 16, 2, row, col);
        let nz = read_coeff_block(dec, probs, block, 0, PlaneType::Uv as usize, ctx)?;
        own[16 + row * 2 + col] = nz;
    }

    for (idx, block) in mb.cr_coeffs.iter_mut().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 20, 2, row, col);
        let nz = read_coeff_block(dec, probs, block, 0, PlaneType::Uv as usize, ctx)?;
        own[20 + row * 2 + col] = nz;
    }

    mb.nonzero_context = own;
    Ok(())
}

fn luma_mode_from_index(idx: u32) -> LumaMode {
    match idx {
        0 => LumaMode::Dc,
        1 => LumaMode::Vertical,
        2 => LumaMode::Horizontal,
        3 => LumaMode::TrueMotion,
        _ => LumaMode::BPred,
    }
}

fn chroma_mode_from_index(idx: u32) -> ChromaMode {
    match idx {
        0 => ChromaMode::Dc,
        1 => ChromaMode::Vertical,
        2 => ChromaMode::Horizontal,
        _ => ChromaMode::TrueMotion,
    }
}

fn subblock_mode_from_index(idx: u32) -> SubblockMode {
    use crate::dsp::predict::Mode4x4;
    match idx {
        0 => SubblockMode::Dc,
        1 => SubblockMode::Vertical,
        2 => SubblockMode::Horizontal,
        3 => SubblockMode::TrueMotion,
        4 => SubblockMode::Diagonal(Mode4x4::Rd),
        5 => SubblockMode::Diagonal(Mode4x4::Vr),
        6 => SubblockMode::Diagonal(Mode4x4::Ld),
        7 => SubblockMode::Diagonal(Mode4x4::Vl),
        8 => SubblockMode::Diagonal(Mode4x4::Hd),
        _ => SubblockMode::Diagonal(Mode4x4::Hu),
    }
}
