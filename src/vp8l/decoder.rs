/*---------------------------------------------------------------------------------------------
 *  VP8L lossless decode pipeline: the exact inverse of `encoder::encode_vp8l`.
 *--------------------------------------------------------------------------------------------*/

use crate::bitio::BitReaderLsb;
use crate::dsp::lossless::{add_green, argb};
use crate::error::WebPError;
use crate::vp8l::huffman::{assign_canonical_codes, HuffmanTable};
use crate::vp8l::predictors;
use crate::vp8l::prefix_code;
use crate::vp8l::transforms::{Transform, TransformStack};

const GREEN_ALPHABET: usize = 256 + prefix_code::LENGTH_CODE_COUNT;

pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

pub struct Vp8lHeader {
    pub width: usize,
    pub height: usize,
    pub has_alpha: bool,
}

/// Reads just the fixed-width preamble (signature, dimensions, alpha flag), without touching
/// the transform stack or pixel stream -- the cheap path `get_features` needs.
pub fn probe_header(payload: &[u8]) -> anyhow::Result<Vp8lHeader> {
    let mut reader = BitReaderLsb::new(payload);
    let magic = reader.get_bits(8)?;
    if magic != 0x2F {
        anyhow::bail!(WebPError::MalformedContainer("VP8L payload missing its signature byte"));
    }
    let width = reader.get_bits(14)? as usize + 1;
    let height = reader.get_bits(14)? as usize + 1;
    let has_alpha = reader.get_bits(1)? != 0;
    Ok(Vp8lHeader { width, height, has_alpha })
}

pub fn decode_vp8l(payload: &[u8]) -> anyhow::Result<DecodedImage> {
    let mut reader = BitReaderLsb::new(payload);

    let magic = reader.get_bits(8)?;
    if magic != 0x2F {
        anyhow::bail!(WebPError::MalformedContainer("VP8L payload missing its signature byte"));
    }
    let width = reader.get_bits(14)? as usize + 1;
    let height = reader.get_bits(14)? as usize + 1;
    let _has_alpha = reader.get_bits(1)? != 0;
    let _version = reader.get_bits(3)?;

    let stack = read_transforms(&mut reader, width, height)?;

    let green_table = read_table(&mut reader, GREEN_ALPHABET)?;
    let red_table = read_table(&mut reader, 256)?;
    let blue_table = read_table(&mut reader, 256)?;
    let alpha_table = read_table(&mut reader, 256)?;
    let distance_table = read_table(&mut reader, prefix_code::DISTANCE_CODE_COUNT)?;

    let pixel_count = width * height;
    let mut pixels = Vec::with_capacity(pixel_count);

    while pixels.len() < pixel_count {
        let green_symbol = green_table.read_symbol(&mut reader)?;
        if green_symbol < 256 {
            let r = red_table.read_symbol(&mut reader)? as u8;
            let b = blue_table.read_symbol(&mut reader)? as u8;
            let a = alpha_table.read_symbol(&mut reader)? as u8;
            pixels.push(argb(a, r, green_symbol as u8, b));
        } else {
            let len_code = (green_symbol - 256) as u32;
            let len_extra_bits = prefix_code::extra_bits_for_code(len_code);
            let len_extra_value = if len_extra_bits > 0 { reader.get_bits(len_extra_bits)? } else { 0 };
            let length = prefix_code::decode(len_code, len_extra_value);

            let dist_code = distance_table.read_symbol(&mut reader)? as u32;
            let dist_extra_bits = prefix_code::extra_bits_for_code(dist_code);
            let dist_extra_value = if dist_extra_bits > 0 { reader.get_bits(dist_extra_bits)? } else { 0 };
            let distance = prefix_code::decode(dist_code, dist_extra_value);

            apply_copy(&mut pixels, distance as usize, length as usize)?;
        }
    }
    pixels.truncate(pixel_count);

    invert_transforms(&mut pixels, width, height, &stack)?;

    Ok(DecodedImage { width, height, pixels })
}

fn apply_copy(pixels: &mut Vec<u32>, distance: usize, length: usize) -> anyhow::Result<()> {
    if distance > pixels.len() {
        anyhow::bail!(WebPError::BitstreamViolation("back-reference distance exceeds decoded history"));
    }
    let start = pixels.len() - distance;
    for i in 0..length {
        let p = pixels[start + i];
        pixels.push(p);
    }
    Ok(())
}

fn read_transforms(reader: &mut BitReaderLsb, width: usize, height: usize) -> anyhow::Result<TransformStack> {
    let mut stack = TransformStack::default();
    loop {
        if reader.get_bits(1)? == 0 {
            break;
        }
        let kind = reader.get_bits(2)?;
        let transform = match kind {
            0 => {
                let block_bits = reader.get_bits(3)? as u8;
                let tile = 1usize << block_bits;
                let count = width.div_ceil(tile) * height.div_ceil(tile);
                let mut modes = Vec::with_capacity(count);
                for _ in 0..count {
                    modes.push(reader.get_bits(4)? as u8);
                }
                Transform::Predictor { modes, block_bits }
            }
            1 => {
                let block_bits = reader.get_bits(3)? as u8;
                let tile = 1usize << block_bits;
                let count = width.div_ceil(tile) * height.div_ceil(tile);
                let mut tiles = Vec::with_capacity(count);
                for _ in 0..count {
                    let green_to_red = reader.get_bits(8)? as u8 as i8;
                    let green_to_blue = reader.get_bits(8)? as u8 as i8;
                    let red_to_blue = reader.get_bits(8)? as u8 as i8;
                    tiles.push(crate::dsp::lossless::ColorTransformCoeffs {
                        green_to_red,
                        green_to_blue,
                        red_to_blue,
                    });
                }
                Transform::ColorTransform { tiles, block_bits }
            }
            2 => Transform::SubtractGreen,
            3 => {
                let palette_len = reader.get_bits(9)? as usize + 1;
                let mut palette = Vec::with_capacity(palette_len);
                for _ in 0..palette_len {
                    let a = reader.get_bits(8)? as u8;
                    let r = reader.get_bits(8)? as u8;
                    let g = reader.get_bits(8)? as u8;
                    let b = reader.get_bits(8)? as u8;
                    palette.push(argb(a, r, g, b));
                }
                Transform::ColorIndexing { palette }
            }
            _ => unreachable!("2-bit field"),
        };
        stack
            .push(transform)
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(stack)
}

fn invert_transforms(pixels: &mut Vec<u32>, width: usize, height: usize, stack: &TransformStack) -> anyhow::Result<()> {
    for transform in stack.iter_rev() {
        match transform {
            Transform::Predictor { modes, block_bits } => {
                predictors::apply_inverse(pixels, width, height, modes, *block_bits);
            }
            Transform::ColorTransform { tiles, block_bits } => {
                let tile = 1usize << block_bits;
                let tiles_x = width.div_ceil(tile);
                for y in 0..height {
                    for x in 0..width {
                        let coeffs = tiles[(y / tile) * tiles_x + (x / tile)];
                        let idx = y * width + x;
                        pixels[idx] = coeffs.inverse(pixels[idx]);
                    }
                }
            }
            Transform::SubtractGreen => {
                for p in pixels.iter_mut() {
                    *p = add_green(*p);
                }
            }
            Transform::ColorIndexing { palette } => {
                for p in pixels.iter_mut() {
                    let index = crate::dsp::lossless::green(*p) as usize;
                    if index >= palette.len() {
                        anyhow::bail!(WebPError::BitstreamViolation("color index out of palette range"));
                    }
                    *p = palette[index];
                }
            }
        }
    }
    Ok(())
}

fn read_table(reader: &mut BitReaderLsb, alphabet_size: usize) -> anyhow::Result<HuffmanTable> {
    let mut lengths = vec![0u8; alphabet_size];
    for l in lengths.iter_mut() {
        *l = reader.get_bits(4)? as u8;
    }
    let codes = assign_canonical_codes(&lengths);
    Ok(HuffmanTable { lengths, codes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EncodeOptions;
    use crate::vp8l::encoder::encode_vp8l;

    #[test]
    fn round_trips_a_flat_image() {
        let pixels = vec![argb(255, 12, 200, 64); 16 * 16];
        let payload = encode_vp8l(&pixels, 16, 16, &EncodeOptions::default()).unwrap();
        let decoded = decode_vp8l(&payload).unwrap();
        assert_eq!(decoded.width, 16);
        assert_eq!(decoded.height, 16);
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn round_trips_a_gradient_image_with_many_distinct_colors() {
        let width = 20;
        let height = 20;
        let pixels: Vec<u32> = (0..width * height)
            .map(|i| argb(255, (i % 256) as u8, ((i * 3) % 256) as u8, ((i * 7) % 256) as u8))
            .collect();
        let payload = encode_vp8l(&pixels, width, height, &EncodeOptions::default()).unwrap();
        let decoded = decode_vp8l(&payload).unwrap();
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn round_trips_a_small_palette_image() {
        let colors = [argb(255, 255, 0, 0), argb(255, 0, 255, 0), argb(255, 0, 0, 255)];
        let pixels: Vec<u32> = (0..64).map(|i| colors[i % colors.len()]).collect();
        let payload = encode_vp8l(&pixels, 8, 8, &EncodeOptions::default()).unwrap();
        let decoded = decode_vp8l(&payload).unwrap();
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn rejects_a_payload_with_the_wrong_magic_byte() {
        let bad = [0u8; 8];
        assert!(decode_vp8l(&bad).is_err());
    }
}
