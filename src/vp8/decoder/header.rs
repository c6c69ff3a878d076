/*---------------------------------------------------------------------------------------------
 *  VP8 frame header parsing.
 *
 *  Layout, read in order: a 24-bit start code, frame dimensions, a segment header (per-segment
 *  quantizer/filter deltas), a filter header, a quantizer header (base index plus the four
 *  plane-specific deltas), a refresh-entropy-probs flag, a partition-count field, and finally
 *  the coefficient-probability delta tree. Everything here lives in partition 0; token
 *  partitions are framed and sliced by the caller before their own decoders are built.
 *--------------------------------------------------------------------------------------------*/

use crate::bitio::Vp8BoolDecoder;
use crate::consts::VP8_START_CODE;
use crate::error::WebPError;
use crate::vp8::probability_tables::CoeffProbTable;
use crate::vp8::types::Segment;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub mb_width: u32,
    pub mb_height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub base_quant: i32,
    pub y2_dc_delta: i32,
    pub y2_ac_delta: i32,
    pub uv_dc_delta: i32,
    pub uv_ac_delta: i32,
    pub filter_type: u8,
    pub filter_level: u8,
    pub filter_sharpness: u8,
    pub segmentation_enabled: bool,
    pub segments: [Segment; 4],
    pub refresh_entropy_probs: bool,
    pub num_partitions: u8,
    pub coeff_probs: CoeffProbTable,
}

pub fn read_frame_header<R: Read>(dec: &mut Vp8BoolDecoder<R>) -> anyhow::Result<FrameHeader> {
    let start_code = dec.get_literal(24)?;
    if start_code != VP8_START_CODE {
        anyhow::bail!(WebPError::MalformedContainer("bad VP8 start code"));
    }

    let mb_width = dec.get_literal(16)?;
    let mb_height = dec.get_literal(16)?;
    if mb_width == 0 || mb_height == 0 {
        anyhow::bail!(WebPError::MalformedContainer("zero macroblock dimension"));
    }
    let pixel_width = dec.get_literal(14)? + 1;
    let pixel_height = dec.get_literal(14)? + 1;
    if pixel_width > mb_width * 16 || pixel_height > mb_height * 16 {
        anyhow::bail!(WebPError::MalformedContainer("pixel dimensions exceed the macroblock grid"));
    }

    let segmentation_enabled = dec.get_bool(128)?;
    let mut segments = [Segment::default(); 4];
    if segmentation_enabled {
        for seg in segments.iter_mut() {
            seg.quant_delta = dec.get_signed_literal(7)?;
            seg.filter_strength = dec.get_signed_literal(6)?;
        }
    }

    let filter_type = dec.get_literal(1)? as u8;
    let filter_level = dec.get_literal(6)? as u8;
    let filter_sharpness = dec.get_literal(3)? as u8;

    let base_quant = dec.get_literal(7)? as i32;
    let y2_dc_delta = dec.get_signed_literal(4)?;
    let y2_ac_delta = dec.get_signed_literal(4)?;
    let uv_dc_delta = dec.get_signed_literal(4)?;
    let uv_ac_delta = dec.get_signed_literal(4)?;

    let refresh_entropy_probs = dec.get_bool(128)?;
    let partition_log2 = dec.get_literal(2)?;
    let num_partitions = 1u8 << partition_log2;

    let mut coeff_probs = CoeffProbTable::default();
    for (plane, band, ctx, node) in CoeffProbTable::iter_coords() {
        if dec.get_bool(252)? {
            let value = dec.get_literal(8)? as u8;
            coeff_probs.set(plane, band, ctx, node, value.max(1));
        }
    }

    Ok(FrameHeader {
        mb_width,
        mb_height,
        pixel_width,
        pixel_height,
        base_quant,
        y2_dc_delta,
        y2_ac_delta,
        uv_dc_delta,
        uv_ac_delta,
        filter_type,
        filter_level,
        filter_sharpness,
        segmentation_enabled,
        segments,
        refresh_entropy_probs,
        num_partitions,
        coeff_probs,
    })
}

/// Reads a little-endian 3-byte length prefix, the raw (non-bool-coded) framing VP8 uses
/// between partition 0 and the token partitions.
pub fn read_u24_le(bytes: &[u8]) -> usize {
    bytes[0] as usize | (bytes[1] as usize) << 8 | (bytes[2] as usize) << 16
}
