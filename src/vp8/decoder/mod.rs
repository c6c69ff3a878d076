/*---------------------------------------------------------------------------------------------
 *  VP8 lossy decoder pipeline.
 *--------------------------------------------------------------------------------------------*/

pub mod header;
pub mod loop_filter_pass;
pub mod reconstruct;
pub mod residual;

use crate::bitio::Vp8BoolDecoder;
use crate::error::WebPError;
use crate::vp8::quant::QuantSteps;
use crate::vp8::types::MacroblockGrid;

/// A decoded VP8 frame's planar pixels, ready for the container layer or color conversion to
/// RGB.
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub chroma_width: u32,
    pub chroma_height: u32,
}

pub fn decode_vp8(payload: &[u8]) -> anyhow::Result<DecodedFrame> {
    if payload.len() < 3 {
        anyhow::bail!(WebPError::TruncatedStream);
    }
    let part0_len = header::read_u24_le(&payload[0..3]);
    if payload.len() < 3 + part0_len {
        anyhow::bail!(WebPError::TruncatedStream);
    }

    let partition0 = &payload[3..3 + part0_len];
    let mut dec0 = Vp8BoolDecoder::new(partition0)?;
    let frame_header = header::read_frame_header(&mut dec0)?;
    log::debug!("decode_vp8: {}x{} macroblocks, {} partitions", frame_header.mb_width, frame_header.mb_height, frame_header.num_partitions);

    let mut grid = MacroblockGrid::new(frame_header.mb_width, frame_header.mb_height);
    grid.base_quant = frame_header.base_quant;
    grid.filter_level = frame_header.filter_level;
    grid.filter_sharpness = frame_header.filter_sharpness;
    grid.use_simple_filter = frame_header.filter_type == 0;
    grid.segments = frame_header.segments;
    grid.num_segments = if frame_header.segmentation_enabled { 4 } else { 1 };

    residual::decode_mode_info(&mut dec0, &mut grid, frame_header.segmentation_enabled)?;

    let rest = &payload[3 + part0_len..];
    let num_partitions = frame_header.num_partitions as usize;
    let mut sizes = Vec::with_capacity(num_partitions.saturating_sub(1));
    let mut offset = 0usize;
    if num_partitions > 1 {
        let table_len = 3 * (num_partitions - 1);
        if rest.len() < table_len {
            anyhow::bail!(WebPError::TruncatedStream);
        }
        for i in 0..num_partitions - 1 {
            sizes.push(header::read_u24_le(&rest[i * 3..i * 3 + 3]));
        }
        offset = table_len;
    }

    let mut token_decoders = Vec::with_capacity(num_partitions);
    for i in 0..num_partitions {
        let size = if i + 1 < num_partitions { sizes[i] } else { rest.len() - offset };
        if rest.len() < offset + size {
            anyhow::bail!(WebPError::TruncatedStream);
        }
        token_decoders.push(Vp8BoolDecoder::new(&rest[offset..offset + size])?);
        offset += size;
    }

    residual::decode_residual_tokens(&mut token_decoders, &mut grid, &frame_header.coeff_probs)?;

    let width = frame_header.mb_width * 16;
    let height = frame_header.mb_height * 16;
    let chroma_width = frame_header.mb_width * 8;
    let chroma_height = frame_header.mb_height * 8;

    let mut y = vec![0u8; (width * height) as usize];
    let mut u = vec![0u8; (chroma_width * chroma_height) as usize];
    let mut v = vec![0u8; (chroma_width * chroma_height) as usize];

    for mb_y in 0..frame_header.mb_height {
        for mb_x in 0..frame_header.mb_width {
            let mb = grid.get(mb_x, mb_y);
            let seg = grid.segments[mb.segment_id as usize];
            let quant = QuantSteps::new(
                frame_header.base_quant,
                seg.quant_delta,
                frame_header.y2_dc_delta,
                frame_header.y2_ac_delta,
                frame_header.uv_dc_delta,
                frame_header.uv_ac_delta,
            );
            reconstruct::reconstruct_macroblock(
                mb,
                &quant,
                &mut y,
                width as usize,
                &mut u,
                &mut v,
                chroma_width as usize,
                mb_x,
                mb_y,
            );
        }
    }

    let mb_levels = grid.filter_levels();
    let mb_width = grid.mb_width as usize;
    loop_filter_pass::filter_plane(&mut y, width as usize, height as usize, width as usize, grid.filter_sharpness, 16, mb_width, &mb_levels);
    loop_filter_pass::filter_plane(&mut u, chroma_width as usize, chroma_height as usize, chroma_width as usize, grid.filter_sharpness, 8, mb_width, &mb_levels);
    loop_filter_pass::filter_plane(&mut v, chroma_width as usize, chroma_height as usize, chroma_width as usize, grid.filter_sharpness, 8, mb_width, &mb_levels);

    Ok(DecodedFrame {
        width,
        height,
        pixel_width: frame_header.pixel_width,
        pixel_height: frame_header.pixel_height,
        y,
        u,
        v,
        chroma_width,
        chroma_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EncodeOptions;
    use crate::vp8::encoder::color_import::YuvImage;
    use crate::vp8::encoder::encode_vp8;

    #[test]
    fn a_flat_image_round_trips_through_encode_and_decode() {
        let rgb = vec![140u8; 16 * 16 * 3];
        let image = YuvImage::from_rgb(&rgb, 16, 16, 3);
        let options = EncodeOptions::default();
        let payload = encode_vp8(&image, &options).unwrap();

        let decoded = decode_vp8(&payload).unwrap();
        assert_eq!(decoded.width, 16);
        assert_eq!(decoded.height, 16);
        for &p in &decoded.y {
            assert!((p as i32 - 140).abs() <= 4, "luma drifted too far from source: {p}");
        }
    }

    #[test]
    fn a_textured_image_survives_multi_partition_round_trip() {
        let mut rgb = vec![0u8; 32 * 32 * 3];
        for i in 0..rgb.len() {
            rgb[i] = ((i * 37) % 255) as u8;
        }
        let image = YuvImage::from_rgb(&rgb, 32, 32, 3);
        let options = EncodeOptions {
            partitions: 2,
            ..EncodeOptions::default()
        };
        let payload = encode_vp8(&image, &options).unwrap();
        let decoded = decode_vp8(&payload).unwrap();
        assert_eq!(decoded.width, 32);
        assert_eq!(decoded.height, 32);
    }
}
