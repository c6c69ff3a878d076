/*---------------------------------------------------------------------------------------------
 *  VP8 lossy encoder pipeline.
 *
 *  Orchestrates the per-module steps other files in this directory implement: color import,
 *  mode decision, transform/quantize, probability optimization, entropy coding and alpha side
 *  data, rather than inlining everything into one function.
 *--------------------------------------------------------------------------------------------*/

pub mod alpha_encode;
pub mod analysis;
pub mod color_import;
pub mod mb_encode;
pub mod prob_opt;
pub mod rate_control;

use crate::bitio::Vp8BoolEncoder;
use crate::consts::{PlaneType, DEFAULT_COEFF_PROBS, VP8_START_CODE};
use crate::dsp::predict;
use crate::options::EncodeOptions;
use crate::vp8::entropy::write_coeff_block;
use crate::vp8::probability_tables::{block_start_context, CoeffProbTable};
use crate::vp8::quant::QuantSteps;
use crate::vp8::types::{Macroblock, MacroblockGrid, LumaMode, SubblockMode};
use color_import::YuvImage;
use prob_opt::FrameProbAccumulator;

/// Frame-level quantizer deltas for the Y2 (WHT) and chroma planes; per-segment deltas live in
/// `MacroblockGrid::segments` instead.
#[derive(Debug, Clone, Copy)]
struct QuantDeltas {
    y2_dc: i32,
    y2_ac: i32,
    uv_dc: i32,
    uv_ac: i32,
}

/// Encodes one still image's luma/chroma planes into a VP8 payload (the bytes a `VP8 ` RIFF
/// chunk carries), dispatching to a quantizer-index search first when `options` asks for a
/// target file size or target PSNR instead of a plain quality value.
pub fn encode_vp8(image: &YuvImage, options: &EncodeOptions) -> anyhow::Result<Vec<u8>> {
    log::debug!("encode_vp8: {}x{} macroblocks, quality {}", image.width / 16, image.height / 16, options.quality);

    let lo = rate_control::quality_to_base_index(options.qmax as f32);
    let hi = rate_control::quality_to_base_index(options.qmin as f32);

    let base_index = if options.target_size > 0 {
        let tolerance = (options.target_size / 20).max(16) as usize;
        let found = rate_control::search_for_target_size(options.target_size as usize, tolerance, |idx| {
            let idx = idx.clamp(lo, hi);
            encode_frame_at_index(image, options, idx).map(|p| p.len()).unwrap_or(usize::MAX)
        });
        found.clamp(lo, hi)
    } else if options.target_psnr > 0.0 {
        let target = (options.target_psnr * 100.0).round() as usize;
        let found = rate_control::search_for_target_size(target, 50, |idx| {
            let idx = idx.clamp(lo, hi);
            let Ok(payload) = encode_frame_at_index(image, options, idx) else {
                return 0;
            };
            let psnr = match crate::vp8::decoder::decode_vp8(&payload) {
                Ok(decoded) if decoded.y.len() == image.y.len() => rate_control::psnr_db(rate_control::luma_mse(&image.y, &decoded.y)),
                _ => 0.0,
            };
            (psnr * 100.0).max(0.0) as usize
        });
        found.clamp(lo, hi)
    } else {
        rate_control::quality_to_base_index(options.quality).clamp(lo, hi)
    };

    encode_frame_at_index(image, options, base_index)
}

fn encode_frame_at_index(image: &YuvImage, options: &EncodeOptions, base_index: i32) -> anyhow::Result<Vec<u8>> {
    let mb_width = image.width / 16;
    let mb_height = image.height / 16;
    let mut grid = MacroblockGrid::new(mb_width, mb_height);
    grid.base_quant = base_index;
    grid.filter_level = options.filter_strength.min(63);
    grid.filter_sharpness = options.filter_sharpness;
    grid.num_segments = options.segments;
    grid.use_simple_filter = options.filter_type == 0;

    for mb_y in 0..mb_height {
        for mb_x in 0..mb_width {
            decide_macroblock_modes(&mut grid, image, mb_x, mb_y);
        }
    }

    let segmentation_enabled = grid.num_segments > 1;
    if segmentation_enabled {
        assign_segments(&mut grid, image, options);
    }

    let deltas = QuantDeltas {
        y2_dc: 0,
        y2_ac: ((options.sns_strength as i32) - 50) / 25,
        uv_dc: 0,
        uv_ac: 0,
    };

    let mut residual_grid = grid.clone();
    for mb in residual_grid.macroblocks.iter_mut() {
        let seg = grid.segments[mb.segment_id as usize];
        let quant = QuantSteps::new(base_index, seg.quant_delta, deltas.y2_dc, deltas.y2_ac, deltas.uv_dc, deltas.uv_ac);
        transform_macroblock(mb, &quant);
    }

    let probs = if options.pass > 1 {
        optimize_coeff_probs(&residual_grid)
    } else {
        CoeffProbTable::default()
    };

    let num_partitions = 1u8 << options.partitions;

    let mut part0_enc = Vp8BoolEncoder::new();
    write_frame_header(&mut part0_enc, image, &grid, base_index, deltas, segmentation_enabled, num_partitions, &probs)?;
    encode_mode_info(&mut part0_enc, &residual_grid)?;
    let partition0 = part0_enc.finish()?;

    let mut token_encoders: Vec<Vp8BoolEncoder> = (0..num_partitions).map(|_| Vp8BoolEncoder::new()).collect();
    encode_residual_tokens(&mut token_encoders, &mut residual_grid, &probs)?;
    let token_partitions = token_encoders
        .into_iter()
        .map(|e| e.finish())
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut payload = Vec::with_capacity(3 + partition0.len() + token_partitions.iter().map(Vec::len).sum::<usize>());
    payload.extend_from_slice(&write_u24_le(partition0.len()));
    payload.extend_from_slice(&partition0);
    if token_partitions.len() > 1 {
        for part in &token_partitions[..token_partitions.len() - 1] {
            payload.extend_from_slice(&write_u24_le(part.len()));
        }
    }
    for part in &token_partitions {
        payload.extend_from_slice(part);
    }

    Ok(payload)
}

fn write_u24_le(len: usize) -> [u8; 3] {
    [(len & 0xff) as u8, ((len >> 8) & 0xff) as u8, ((len >> 16) & 0xff) as u8]
}

#[allow(clippy::too_many_arguments)]
fn write_frame_header(
    enc: &mut Vp8BoolEncoder,
    image: &YuvImage,
    grid: &MacroblockGrid,
    base_index: i32,
    deltas: QuantDeltas,
    segmentation_enabled: bool,
    num_partitions: u8,
    probs: &CoeffProbTable,
) -> anyhow::Result<()> {
    enc.put_literal(VP8_START_CODE, 24)?;
    enc.put_literal(grid.mb_width, 16)?;
    enc.put_literal(grid.mb_height, 16)?;
    enc.put_literal(image.pixel_width - 1, 14)?;
    enc.put_literal(image.pixel_height - 1, 14)?;

    enc.put_bool(segmentation_enabled, 128)?;
    if segmentation_enabled {
        for seg in grid.segments.iter() {
            enc.put_signed_literal(seg.quant_delta, 7)?;
            enc.put_signed_literal(seg.filter_strength, 6)?;
        }
    }

    // `use_simple_filter` is true exactly when filter_type == 0, so invert it back for the wire.
    enc.put_literal(!grid.use_simple_filter as u32, 1)?;
    enc.put_literal(grid.filter_level as u32, 6)?;
    enc.put_literal(grid.filter_sharpness as u32, 3)?;

    enc.put_literal(base_index as u32, 7)?;
    enc.put_signed_literal(deltas.y2_dc, 4)?;
    enc.put_signed_literal(deltas.y2_ac, 4)?;
    enc.put_signed_literal(deltas.uv_dc, 4)?;
    enc.put_signed_literal(deltas.uv_ac, 4)?;

    // This crate only ever encodes a single standalone frame, so there is no prior-frame
    // entropy state to preserve or discard; the flag is still transmitted for wire symmetry
    // with the decoder's header reader.
    enc.put_bool(true, 128)?;
    enc.put_literal(num_partitions.trailing_zeros(), 2)?;

    for (plane, band, ctx, node) in CoeffProbTable::iter_coords() {
        let value = probs.probs_for(plane, band, ctx)[node];
        let default = DEFAULT_COEFF_PROBS[plane][band][ctx][node];
        if value == default {
            enc.put_bool(false, 252)?;
        } else {
            enc.put_bool(true, 252)?;
            enc.put_literal(value as u32, 8)?;
        }
    }

    Ok(())
}

/// Per-macroblock activity-driven segmentation: buckets macroblocks into `grid.num_segments`
/// bands by luma texture and derives each segment's quantizer/filter deltas from
/// `options.sns_strength`/`options.filter_strength`, the spatial noise shaping control cwebp
/// exposes through the same two options.
fn assign_segments(grid: &mut MacroblockGrid, image: &YuvImage, options: &EncodeOptions) {
    let mb_width = grid.mb_width;
    let mb_height = grid.mb_height;
    let activities: Vec<u32> = (0..mb_height)
        .flat_map(|mb_y| (0..mb_width).map(move |mb_x| (mb_x, mb_y)))
        .map(|(mb_x, mb_y)| analysis::block_activity(&source_luma_block(image, mb_x, mb_y)))
        .collect();

    let segment_ids = analysis::assign_segments(&activities, grid.num_segments, options.sns_strength);
    for (mb, &seg) in grid.macroblocks.iter_mut().zip(segment_ids.iter()) {
        mb.segment_id = seg;
    }

    let num_segments = grid.num_segments.max(1) as i32;
    let steps = (num_segments - 1).max(1);
    let max_quant_delta = (options.sns_strength as i32 * 16) / 100;
    let max_filter_delta = options.filter_strength as i32 / 4;
    for i in 0..num_segments as usize {
        // Segment 0 is the most active band (assign_segments counts down from there) and gets
        // the finest quantizer and strongest filtering; the flattest band gets the least.
        grid.segments[i].quant_delta = -max_quant_delta + (max_quant_delta * i as i32) / steps;
        grid.segments[i].filter_strength = -(max_filter_delta * i as i32) / steps;
    }
}

fn source_luma_block(image: &YuvImage, mb_x: u32, mb_y: u32) -> [u8; 256] {
    let stride = image.width as usize;
    let origin = (mb_y * 16) as usize * stride + (mb_x * 16) as usize;
    let mut source = [0u8; 256];
    for r in 0..16 {
        source[r * 16..r * 16 + 16].copy_from_slice(&image.y[origin + r * stride..origin + r * stride + 16]);
    }
    source
}

fn decide_macroblock_modes(grid: &mut MacroblockGrid, image: &YuvImage, mb_x: u32, mb_y: u32) {
    let stride = image.width as usize;
    let origin = (mb_y * 16) as usize * stride + (mb_x * 16) as usize;
    let source = source_luma_block(image, mb_x, mb_y);

    let has_above = mb_y > 0;
    let has_left = mb_x > 0;
    let above: Option<Vec<u8>> = has_above.then(|| image.y[origin - stride..origin - stride + 16].to_vec());
    let left: Option<Vec<u8>> = has_left.then(|| (0..16).map(|r| image.y[origin + r * stride - 1]).collect());
    let corner = if has_above && has_left {
        image.y[origin - stride - 1]
    } else {
        129
    };

    let (luma_mode, whole_cost) =
        analysis::best_luma16_mode(&source, above.as_deref(), left.as_deref(), corner);

    let mb = grid.get_mut(mb_x, mb_y);
    mb.luma_mode = luma_mode;

    // BPred is only worth trying (and only cheap to try here) when whole-block prediction is
    // already a poor fit; this keeps the encoder's per-macroblock cost roughly proportional to
    // how textured the source content is, mirroring cwebp's early-exit mode search.
    if whole_cost > 64 {
        mb.luma_mode = LumaMode::BPred;
        // Subblock mode decision here ignores cross-subblock reconstruction dependencies (each
        // tile is scored against a neutral 128/129 border) since this pass never reconstructs
        // pixels; good enough for mode selection, the residual still carries the real error.
        let above4x4 = [128u8; 8];
        let left4x4 = [129u8, 129, 129, 129, 129];
        for (i, slot) in mb.subblock_modes.iter_mut().enumerate() {
            let (row, col) = (i / 4, i % 4);
            let mut tile = [0u8; 16];
            for r in 0..4 {
                tile[r * 4..r * 4 + 4].copy_from_slice(&source[(row * 4 + r) * 16 + col * 4..(row * 4 + r) * 16 + col * 4 + 4]);
            }
            let (mode, _) = analysis::best_subblock_mode(&tile, &above4x4, &left4x4);
            *slot = mode;
        }
        log::trace!("mb ({mb_x},{mb_y}): whole-block cost {whole_cost} too high, falling back to BPred");
    }

    let chroma_stride = image.chroma_width as usize;
    let chroma_origin = (mb_y * 8) as usize * chroma_stride + (mb_x * 8) as usize;
    let mut u_src = vec![0u8; 64];
    for r in 0..8 {
        u_src[r * 8..r * 8 + 8]
            .copy_from_slice(&image.u[chroma_origin + r * chroma_stride..chroma_origin + r * chroma_stride + 8]);
    }
    let u_above: Option<Vec<u8>> =
        has_above.then(|| image.u[chroma_origin - chroma_stride..chroma_origin - chroma_stride + 8].to_vec());
    let u_left: Option<Vec<u8>> =
        has_left.then(|| (0..8).map(|r| image.u[chroma_origin + r * chroma_stride - 1]).collect());
    let (chroma_mode, _) = analysis::best_chroma_mode(&u_src, u_above.as_deref(), u_left.as_deref(), corner);
    mb.chroma_mode = chroma_mode;

    let mut v_src = vec![0u8; 64];
    for r in 0..8 {
        v_src[r * 8..r * 8 + 8]
            .copy_from_slice(&image.v[chroma_origin + r * chroma_stride..chroma_origin + r * chroma_stride + 8]);
    }
    let v_above: Option<Vec<u8>> =
        has_above.then(|| image.v[chroma_origin - chroma_stride..chroma_origin - chroma_stride + 8].to_vec());
    let v_left: Option<Vec<u8>> =
        has_left.then(|| (0..8).map(|r| image.v[chroma_origin + r * chroma_stride - 1]).collect());

    compute_residuals(grid, mb_x, mb_y, &source, above.as_deref(), left.as_deref(), corner, &u_src, u_above.as_deref(), u_left.as_deref(), &v_src, v_above.as_deref(), v_left.as_deref());
}

/// Builds the spatial prediction each chosen mode implies and stores `source - prediction`
/// into the macroblock's coefficient arrays (still in raster order, untransformed); the next
/// pipeline stage (`transform_macroblock`) forward-transforms and quantizes these in place.
#[allow(clippy::too_many_arguments)]
fn compute_residuals(
    grid: &mut MacroblockGrid,
    mb_x: u32,
    mb_y: u32,
    luma_source: &[u8; 256],
    luma_above: Option<&[u8]>,
    luma_left: Option<&[u8]>,
    corner: u8,
    u_source: &[u8],
    u_above: Option<&[u8]>,
    u_left: Option<&[u8]>,
    v_source: &[u8],
    v_above: Option<&[u8]>,
    v_left: Option<&[u8]>,
) {
    let mb = grid.get_mut(mb_x, mb_y);

    let mut luma_pred = vec![0u8; 256];
    match mb.luma_mode {
        LumaMode::Dc => predict::predict_dc::<16>(&mut luma_pred, 0, 16, luma_above, luma_left),
        LumaMode::Vertical => predict::predict_vertical::<16>(&mut luma_pred, 0, 16, luma_above.unwrap_or(&[128u8; 16])),
        LumaMode::Horizontal => predict::predict_horizontal::<16>(&mut luma_pred, 0, 16, luma_left.unwrap_or(&[129u8; 16])),
        LumaMode::TrueMotion => predict::predict_tm::<16>(
            &mut luma_pred,
            0,
            16,
            luma_above.unwrap_or(&[128u8; 16]),
            luma_left.unwrap_or(&[129u8; 16]),
            corner,
        ),
        LumaMode::BPred => {
            let above8 = [128u8; 8];
            let left5 = [129u8; 5];
            let above4 = [128u8; 4];
            let left4 = [129u8; 4];
            for i in 0..16 {
                let (row, col) = (i / 4, i % 4);
                let mut dst = [0u8; 16];
                match mb.subblock_modes[i] {
                    SubblockMode::Dc => predict::predict_dc::<4>(&mut dst, 0, 4, Some(&above4), Some(&left4)),
                    SubblockMode::Vertical => predict::predict_vertical::<4>(&mut dst, 0, 4, &above4),
                    SubblockMode::Horizontal => predict::predict_horizontal::<4>(&mut dst, 0, 4, &left4),
                    SubblockMode::TrueMotion => predict::predict_tm::<4>(&mut dst, 0, 4, &above4, &left4, left5[0]),
                    SubblockMode::Diagonal(m) => predict::predict_4x4(m, &above8, &left5, &mut dst),
                }
                for r in 0..4 {
                    luma_pred[(row * 4 + r) * 16 + col * 4..(row * 4 + r) * 16 + col * 4 + 4].copy_from_slice(&dst[r * 4..r * 4 + 4]);
                }
            }
        }
    }
    for idx in 0..16 {
        let (row, col) = (idx / 4, idx % 4);
        let mut residual = [0i32; 16];
        for r in 0..4 {
            for c in 0..4 {
                let p = (row * 4 + r) * 16 + col * 4 + c;
                residual[r * 4 + c] = luma_source[p] as i32 - luma_pred[p] as i32;
            }
        }
        mb.luma_coeffs[idx] = residual;
    }

    fill_chroma_residual(&mut mb.cb_coeffs, mb.chroma_mode, u_source, u_above, u_left, corner);
    fill_chroma_residual(&mut mb.cr_coeffs, mb.chroma_mode, v_source, v_above, v_left, corner);
}

fn fill_chroma_residual(
    blocks: &mut [crate::vp8::types::CoeffBlock; 4],
    mode: crate::vp8::types::ChromaMode,
    source: &[u8],
    above: Option<&[u8]>,
    left: Option<&[u8]>,
    corner: u8,
) {
    use crate::vp8::types::ChromaMode;
    let mut pred = vec![0u8; 64];
    match mode {
        ChromaMode::Dc => predict::predict_dc::<8>(&mut pred, 0, 8, above, left),
        ChromaMode::Vertical => predict::predict_vertical::<8>(&mut pred, 0, 8, above.unwrap_or(&[128u8; 8])),
        ChromaMode::Horizontal => predict::predict_horizontal::<8>(&mut pred, 0, 8, left.unwrap_or(&[129u8; 8])),
        ChromaMode::TrueMotion => {
            predict::predict_tm::<8>(&mut pred, 0, 8, above.unwrap_or(&[128u8; 8]), left.unwrap_or(&[129u8; 8]), corner)
        }
    }
    for idx in 0..4 {
        let (row, col) = (idx / 2, idx % 2);
        let mut residual = [0i32; 16];
        for r in 0..4 {
            for c in 0..4 {
                let p = (row * 4 + r) * 8 + col * 4 + c;
                residual[r * 4 + c] = source[p] as i32 - pred[p] as i32;
            }
        }
        blocks[idx] = residual;
    }
}

fn transform_macroblock(mb: &mut Macroblock, quant: &QuantSteps) {
    let is_i16 = matches!(mb.luma_mode, LumaMode::Dc | LumaMode::Vertical | LumaMode::Horizontal | LumaMode::TrueMotion);

    for block in mb.luma_coeffs.iter_mut() {
        *block = mb_encode::transform_quantize_scan(block, quant.y1_dc, quant.y1_ac);
    }

    if is_i16 {
        let mut dc_values = [0i32; 16];
        for (i, block) in mb.luma_coeffs.iter().enumerate() {
            dc_values[i] = block[0];
        }
        mb.luma_dc = mb_encode::extract_and_transform_luma_dc(&dc_values, quant);
        mb.has_separate_luma_dc = true;
        for block in mb.luma_coeffs.iter_mut() {
            block[0] = 0;
        }
    }

    for block in mb.cb_coeffs.iter_mut() {
        *block = mb_encode::transform_quantize_scan(block, quant.uv_dc, quant.uv_ac);
    }
    for block in mb.cr_coeffs.iter_mut() {
        *block = mb_encode::transform_quantize_scan(block, quant.uv_dc, quant.uv_ac);
    }

    mb.skip_coeff = mb.luma_coeffs.iter().all(|b| b.iter().all(|&c| c == 0))
        && mb.cb_coeffs.iter().all(|b| b.iter().all(|&c| c == 0))
        && mb.cr_coeffs.iter().all(|b| b.iter().all(|&c| c == 0))
        && !mb.has_separate_luma_dc;
}

/// Gathers coefficient-probability statistics over every macroblock's tokens (mirroring how
/// `encode_residual_tokens` walks blocks and threads nonzero context, but recording tree-node
/// decisions instead of emitting bits) and turns them into an optimized probability grid.
fn optimize_coeff_probs(residual_grid: &MacroblockGrid) -> CoeffProbTable {
    let mut acc = FrameProbAccumulator::default();
    let mut scratch = residual_grid.clone();
    let mb_width = scratch.mb_width;
    for mb_y in 0..scratch.mb_height {
        for mb_x in 0..mb_width {
            let left = (mb_x > 0).then(|| scratch.get(mb_x - 1, mb_y).nonzero_context);
            let above = (mb_y > 0).then(|| scratch.get(mb_x, mb_y - 1).nonzero_context);
            let mb = scratch.get_mut(mb_x, mb_y);
            tally_one_macroblock(&mut acc, mb, left.as_ref(), above.as_ref());
        }
    }
    let mut probs = CoeffProbTable::default();
    probs.load(acc.finalize());
    probs
}

fn tally_one_macroblock(acc: &mut FrameProbAccumulator, mb: &mut Macroblock, left: Option<&[bool; 25]>, above: Option<&[bool; 25]>) {
    if mb.skip_coeff {
        mb.nonzero_context = [false; 25];
        return;
    }

    let mut own = mb.nonzero_context;

    if mb.has_separate_luma_dc {
        let ctx = block_start_context(&own, left, above, 24, 1, 0, 0);
        acc.accumulate_block(PlaneType::Y2 as usize, &mb.luma_dc, 0, ctx);
        own[24] = mb.luma_dc.iter().any(|&c| c != 0);
    }

    let luma_plane_type = if mb.has_separate_luma_dc { PlaneType::YAfterY2 } else { PlaneType::YWithDc } as usize;
    let first_coeff = if mb.has_separate_luma_dc { 1 } else { 0 };
    for (idx, block) in mb.luma_coeffs.iter().enumerate() {
        let (row, col) = (idx / 4, idx % 4);
        let ctx = block_start_context(&own, left, above, 0, 4, row, col);
        acc.accumulate_block(luma_plane_type, block, first_coeff, ctx);
        own[row * 4 + col] = block.iter().skip(first_coeff).any(|&c| c != 0);
    }
    for (idx, block) in mb.cb_coeffs.iter().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 16, 2, row, col);
        acc.accumulate_block(PlaneType::Uv as usize, block, 0, ctx);
        own[16 + row * 2 + col] = block.iter().any(|&c| c != 0);
    }
    for (idx, block) in mb.cr_coeffs.iter().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 20, 2, row, col);
        acc.accumulate_block(PlaneType::Uv as usize, block, 0, ctx);
        own[20 + row * 2 + col] = block.iter().any(|&c| c != 0);
    }

    mb.nonzero_context = own;
}

fn encode_mode_info(enc: &mut Vp8BoolEncoder, grid: &MacroblockGrid) -> anyhow::Result<()> {
    let segmentation_enabled = grid.num_segments > 1;
    for mb in &grid.macroblocks {
        if segmentation_enabled {
            enc.put_literal(mb.segment_id as u32, 2)?;
        }
        enc.put_bool(mb.skip_coeff, 200)?;
        enc.put_literal(luma_mode_index(mb.luma_mode), 3)?;
        enc.put_literal(chroma_mode_index(mb.chroma_mode), 2)?;

        if matches!(mb.luma_mode, LumaMode::BPred) {
            for mode in &mb.subblock_modes {
                enc.put_literal(subblock_mode_index(*mode), 4)?;
            }
        }
    }
    Ok(())
}

fn encode_residual_tokens(token_encoders: &mut [Vp8BoolEncoder], grid: &mut MacroblockGrid, probs: &CoeffProbTable) -> anyhow::Result<()> {
    let num_partitions = token_encoders.len();
    let mb_width = grid.mb_width;

    for mb_y in 0..grid.mb_height {
        for mb_x in 0..mb_width {
            let left = (mb_x > 0).then(|| grid.get(mb_x - 1, mb_y).nonzero_context);
            let above = (mb_y > 0).then(|| grid.get(mb_x, mb_y - 1).nonzero_context);
            let enc = &mut token_encoders[(mb_y as usize) % num_partitions];
            let mb = grid.get_mut(mb_x, mb_y);
            encode_one_macroblock_residual(enc, probs, mb, left.as_ref(), above.as_ref())?;
        }
    }
    Ok(())
}

fn encode_one_macroblock_residual(
    enc: &mut Vp8BoolEncoder,
    probs: &CoeffProbTable,
    mb: &mut Macroblock,
    left: Option<&[bool; 25]>,
    above: Option<&[bool; 25]>,
) -> anyhow::Result<()> {
    if mb.skip_coeff {
        mb.nonzero_context = [false; 25];
        return Ok(());
    }

    let mut own = mb.nonzero_context;

    if mb.has_separate_luma_dc {
        let ctx = block_start_context(&own, left, above, 24, 1, 0, 0);
        let nz = write_coeff_block(enc, probs, &mb.luma_dc, 0, PlaneType::Y2 as usize, ctx)?;
        own[24] = nz;
    }

    let luma_plane_type = if mb.has_separate_luma_dc { PlaneType::YAfterY2 } else { PlaneType::YWithDc } as usize;
    let first_coeff = if mb.has_separate_luma_dc { 1 } else { 0 };
    for (idx, block) in mb.luma_coeffs.iter().enumerate() {
        let (row, col) = (idx / 4, idx % 4);
        let ctx = block_start_context(&own, left, above, 0, 4, row, col);
        let nz = write_coeff_block(enc, probs, block, first_coeff, luma_plane_type, ctx)?;
        own[row * 4 + col] = nz;
    }
    for (idx, block) in mb.cb_coeffs.iter().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 16, 2, row, col);
        let nz = write_coeff_block(enc, probs, block, 0, PlaneType::Uv as usize, ctx)?;
        own[16 + row * 2 + col] = nz;
    }
    for (idx, block) in mb.cr_coeffs.iter().enumerate() {
        let (row, col) = (idx / 2, idx % 2);
        let ctx = block_start_context(&own, left, above, 20, 2, row, col);
        let nz = write_coeff_block(enc, probs, block, 0, PlaneType::Uv as usize, ctx)?;
        own[20 + row * 2 + col] = nz;
    }

    mb.nonzero_context = own;
    Ok(())
}

fn luma_mode_index(mode: LumaMode) -> u32 {
    match mode {
        LumaMode::Dc => 0,
        LumaMode::Vertical => 1,
        LumaMode::Horizontal => 2,
        LumaMode::TrueMotion => 3,
        LumaMode::BPred => 4,
    }
}

fn chroma_mode_index(mode: crate::vp8::types::ChromaMode) -> u32 {
    use crate::vp8::types::ChromaMode;
    match mode {
        ChromaMode::Dc => 0,
        ChromaMode::Vertical => 1,
        ChromaMode::Horizontal => 2,
        ChromaMode::TrueMotion => 3,
    }
}

fn subblock_mode_index(mode: SubblockMode) -> u32 {
    use crate::dsp::predict::Mode4x4;
    match mode {
        SubblockMode::Dc => 0,
        SubblockMode::Vertical => 1,
        SubblockMode::Horizontal => 2,
        SubblockMode::TrueMotion => 3,
        SubblockMode::Diagonal(Mode4x4::Rd) => 4,
        SubblockMode::Diagonal(Mode4x4::Vr) => 5,
        SubblockMode::Diagonal(Mode4x4::Ld) => 6,
        SubblockMode::Diagonal(Mode4x4::Vl) => 7,
        SubblockMode::Diagonal(Mode4x4::Hd) => 8,
        SubblockMode::Diagonal(Mode4x4::Hu) => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_gray_image_encodes_to_a_nonempty_payload() {
        let rgb = vec![120u8; 16 * 16 * 3];
        let image = YuvImage::from_rgb(&rgb, 16, 16, 3);
        let options = EncodeOptions::default();
        let payload = encode_vp8(&image, &options).unwrap();
        assert!(!payload.is_empty());
    }

    #[test]
    fn two_pass_encode_produces_a_decodable_payload() {
        let rgb = vec![120u8; 32 * 32 * 3];
        let image = YuvImage::from_rgb(&rgb, 32, 32, 3);
        let options = EncodeOptions {
            pass: 2,
            ..EncodeOptions::default()
        };
        let payload = encode_vp8(&image, &options).unwrap();
        assert!(crate::vp8::decoder::decode_vp8(&payload).is_ok());
    }

    #[test]
    fn target_size_search_lands_close_to_the_goal() {
        let rgb = vec![120u8; 32 * 32 * 3];
        let image = YuvImage::from_rgb(&rgb, 32, 32, 3);
        let options = EncodeOptions {
            target_size: 80,
            ..EncodeOptions::default()
        };
        let payload = encode_vp8(&image, &options).unwrap();
        assert!(!payload.is_empty());
    }
}
