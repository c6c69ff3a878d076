/*---------------------------------------------------------------------------------------------
 *  VP8L lossless encode pipeline: transform selection, LZ77 reduction, prefix
 *  code construction, stream emission.
 *
 *  Meta-Huffman region clustering is scoped down to its degenerate single-region case here: one set of five
 *  tables covers the whole image rather than a 2-D clustering pass. See DESIGN.md.
 *--------------------------------------------------------------------------------------------*/

use crate::bitio::BitWriterLsb;
use crate::dsp::lossless::{alpha, argb, blue, green, red, subtract_green, ColorTransformCoeffs};
use crate::error::WebPError;
use crate::options::EncodeOptions;
use crate::vp8l::huffman::HuffmanTable;
use crate::vp8l::lz77::{self, LzToken};
use crate::vp8l::predictors;
use crate::vp8l::prefix_code;
use crate::vp8l::transforms::{Transform, TransformStack};
use std::collections::HashMap;

const BLOCK_BITS: u8 = 2;
const GREEN_ALPHABET: usize = 256 + prefix_code::LENGTH_CODE_COUNT;

/// Encodes a packed-ARGB pixel buffer as a standalone VP8L bitstream (the payload that sits
/// inside a `VP8L` RIFF chunk). `options.method`/`options.lossless_quality` trade encode time
/// for ratio: they widen the LZ77 match search and the per-tile color transform search the same
/// way cwebp's `-m`/`-q` flags do, without changing which transforms get applied.
pub fn encode_vp8l(pixels: &[u32], width: usize, height: usize, options: &EncodeOptions) -> anyhow::Result<Vec<u8>> {
    if width == 0 || height == 0 || pixels.len() != width * height {
        anyhow::bail!(WebPError::InvalidOption("pixel buffer size does not match width*height"));
    }

    let effort = lossless_effort(options);
    let mut working = pixels.to_vec();
    let mut stack = TransformStack::default();

    // A lower palette ceiling at low effort skips the index-building pass on images that would
    // barely benefit from it; full effort always takes the format's full 256-color allowance.
    let palette_ceiling = if effort.thorough_color_search { 256 } else { 16 };
    let distinct = distinct_pixels(&working);
    log::debug!("encode_vp8l: {width}x{height}, {distinct} distinct colors, method={}", options.method);
    if distinct <= palette_ceiling {
        log::trace!("encode_vp8l: using a {distinct}-entry color-indexing palette");
        let palette = build_palette(&working);
        working = pixels_as_indices(&working, &palette);
        stack.push(Transform::ColorIndexing { palette })?;
    } else {
        for p in working.iter_mut() {
            *p = subtract_green(*p);
        }
        stack.push(Transform::SubtractGreen)?;

        let color_tiles = select_color_transform(&working, width, height, BLOCK_BITS, effort.thorough_color_search);
        apply_color_forward(&mut working, width, height, &color_tiles, BLOCK_BITS);
        stack.push(Transform::ColorTransform {
            tiles: color_tiles,
            block_bits: BLOCK_BITS,
        })?;

        let modes = predictors::select_modes(&working, width, height, BLOCK_BITS);
        predictors::apply_forward(&mut working, width, height, &modes, BLOCK_BITS);
        stack.push(Transform::Predictor {
            modes,
            block_bits: BLOCK_BITS,
        })?;
    }

    let tokens = lz77::compress(&working, effort.lz77_candidates);

    let mut green_freq = vec![0u64; GREEN_ALPHABET];
    let mut red_freq = vec![0u64; 256];
    let mut blue_freq = vec![0u64; 256];
    let mut alpha_freq = vec![0u64; 256];
    let mut distance_freq = vec![0u64; prefix_code::DISTANCE_CODE_COUNT];

    for token in &tokens {
        match *token {
            LzToken::Literal(pixel) => {
                green_freq[green(pixel) as usize] += 1;
                red_freq[red(pixel) as usize] += 1;
                blue_freq[blue(pixel) as usize] += 1;
                alpha_freq[alpha(pixel) as usize] += 1;
            }
            LzToken::Copy { distance, length } => {
                let (len_code, _, _) = prefix_code::encode(length);
                green_freq[256 + len_code as usize] += 1;
                let (dist_code, _, _) = prefix_code::encode(distance);
                distance_freq[dist_code as usize] += 1;
            }
        }
    }

    let green_table = HuffmanTable::from_frequencies(&green_freq);
    let red_table = HuffmanTable::from_frequencies(&red_freq);
    let blue_table = HuffmanTable::from_frequencies(&blue_freq);
    let alpha_table = HuffmanTable::from_frequencies(&alpha_freq);
    let distance_table = HuffmanTable::from_frequencies(&distance_freq);

    let mut writer = BitWriterLsb::new();
    writer.put_bits(0x2F, 8);
    writer.put_bits((width - 1) as u32, 14);
    writer.put_bits((height - 1) as u32, 14);
    let has_alpha = pixels.iter().any(|&p| alpha(p) != 0xFF);
    writer.put_bits(has_alpha as u32, 1);
    writer.put_bits(0, 3); // version

    write_transforms(&mut writer, &stack);

    write_table(&mut writer, &green_table);
    write_table(&mut writer, &red_table);
    write_table(&mut writer, &blue_table);
    write_table(&mut writer, &alpha_table);
    write_table(&mut writer, &distance_table);

    for token in &tokens {
        match *token {
            LzToken::Literal(pixel) => {
                green_table.write_symbol(&mut writer, green(pixel) as usize)?;
                red_table.write_symbol(&mut writer, red(pixel) as usize)?;
                blue_table.write_symbol(&mut writer, blue(pixel) as usize)?;
                alpha_table.write_symbol(&mut writer, alpha(pixel) as usize)?;
            }
            LzToken::Copy { distance, length } => {
                let (len_code, len_extra_bits, len_extra_value) = prefix_code::encode(length);
                green_table.write_symbol(&mut writer, 256 + len_code as usize)?;
                writer.put_bits(len_extra_value, len_extra_bits);

                let (dist_code, dist_extra_bits, dist_extra_value) = prefix_code::encode(distance);
                distance_table.write_symbol(&mut writer, dist_code as usize)?;
                writer.put_bits(dist_extra_value, dist_extra_bits);
            }
        }
    }

    Ok(writer.finish())
}

struct LosslessEffort {
    lz77_candidates: usize,
    thorough_color_search: bool,
}

/// Derives this encode's time/ratio tradeoffs from `method` (the primary effort knob) and
/// `lossless_quality` (nudges the color-transform search independently, mirroring cwebp letting
/// `-q` sharpen a fast `-m` preset's transform choices a bit without paying for a full LZ77
/// search).
fn lossless_effort(options: &EncodeOptions) -> LosslessEffort {
    LosslessEffort {
        lz77_candidates: lz77::effort_to_candidates(options.method),
        thorough_color_search: options.method >= 4 || options.lossless_quality >= 7,
    }
}

fn distinct_pixels(pixels: &[u32]) -> usize {
    let mut seen = std::collections::HashSet::new();
    for &p in pixels {
        seen.insert(p);
        if seen.len() > 256 {
            return seen.len();
        }
    }
    seen.len()
}

fn build_palette(pixels: &[u32]) -> Vec<u32> {
    let mut palette = Vec::new();
    let mut index_of = HashMap::new();
    for &p in pixels {
        index_of.entry(p).or_insert_with(|| {
            palette.push(p);
            palette.len() - 1
        });
    }
    palette
}

fn pixels_as_indices(pixels: &[u32], palette: &[u32]) -> Vec<u32> {
    let mut index_of = HashMap::new();
    for (i, &p) in palette.iter().enumerate() {
        index_of.insert(p, i as u8);
    }
    pixels.iter().map(|&p| argb(0xFF, 0, index_of[&p], 0)).collect()
}

const FULL_TRANSFORM_GRID: [i8; 7] = [-16, -8, -4, 0, 4, 8, 16];
const FAST_TRANSFORM_GRID: [i8; 3] = [-8, 0, 8];

/// Brute-force per-tile search over a grid of integer multipliers, minimizing the summed
/// absolute residual on the red/blue channels. `thorough` selects the full 7-step grid; a fast
/// encode settles for whichever candidate a coarser 3-step grid finds.
fn select_color_transform(pixels: &[u32], width: usize, height: usize, block_bits: u8, thorough: bool) -> Vec<ColorTransformCoeffs> {
    let tile = 1usize << block_bits;
    let tiles_x = width.div_ceil(tile);
    let tiles_y = height.div_ceil(tile);
    let mut tiles = Vec::with_capacity(tiles_x * tiles_y);
    let grid: &[i8] = if thorough { &FULL_TRANSFORM_GRID } else { &FAST_TRANSFORM_GRID };

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut best = ColorTransformCoeffs::default();
            let mut best_cost = u64::MAX;

            for &green_to_red in grid {
                for &green_to_blue in grid {
                    for &red_to_blue in grid {
                        let candidate = ColorTransformCoeffs {
                            green_to_red,
                            green_to_blue,
                            red_to_blue,
                        };
                        let mut cost = 0u64;
                        for dy in 0..tile.min(height - ty * tile) {
                            for dx in 0..tile.min(width - tx * tile) {
                                let x = tx * tile + dx;
                                let y = ty * tile + dy;
                                let transformed = candidate.forward(pixels[y * width + x]);
                                cost += signed_byte_abs(red(transformed)) as u64;
                                cost += signed_byte_abs(blue(transformed)) as u64;
                            }
                        }
                        if cost < best_cost {
                            best_cost = cost;
                            best = candidate;
                        }
                    }
                }
            }
            tiles.push(best);
        }
    }
    tiles
}

fn signed_byte_abs(b: u8) -> u32 {
    let signed = if b > 127 { b as i32 - 256 } else { b as i32 };
    signed.unsigned_abs()
}

fn apply_color_forward(pixels: &mut [u32], width: usize, height: usize, tiles: &[ColorTransformCoeffs], block_bits: u8) {
    let tile = 1usize << block_bits;
    let tiles_x = width.div_ceil(tile);
    for y in 0..height {
        for x in 0..width {
            let coeffs = tiles[(y / tile) * tiles_x + (x / tile)];
            let idx = y * width + x;
            pixels[idx] = coeffs.forward(pixels[idx]);
        }
    }
}

fn write_transforms(writer: &mut BitWriterLsb, stack: &TransformStack) {
    for transform in stack.iter() {
        writer.put_bits(1, 1);
        match transform {
            Transform::Predictor { modes, block_bits } => {
                writer.put_bits(0, 2);
                writer.put_bits(*block_bits as u32, 3);
                for &mode in modes {
                    writer.put_bits(mode as u32, 4);
                }
            }
            Transform::ColorTransform { tiles, block_bits } => {
                writer.put_bits(1, 2);
                writer.put_bits(*block_bits as u32, 3);
                for coeffs in tiles {
                    writer.put_bits(coeffs.green_to_red as u8 as u32, 8);
                    writer.put_bits(coeffs.green_to_blue as u8 as u32, 8);
                    writer.put_bits(coeffs.red_to_blue as u8 as u32, 8);
                }
            }
            Transform::SubtractGreen => {
                writer.put_bits(2, 2);
            }
            Transform::ColorIndexing { palette } => {
                writer.put_bits(3, 2);
                writer.put_bits(palette.len() as u32 - 1, 9);
                for &entry in palette {
                    writer.put_bits(alpha(entry) as u32, 8);
                    writer.put_bits(red(entry) as u32, 8);
                    writer.put_bits(green(entry) as u32, 8);
                    writer.put_bits(blue(entry) as u32, 8);
                }
            }
        }
    }
    writer.put_bits(0, 1);
}

fn write_table(writer: &mut BitWriterLsb, table: &HuffmanTable) {
    for &len in &table.lengths {
        writer.put_bits(len as u32, 4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_flat_image_to_a_nonempty_payload() {
        let pixels = vec![argb(255, 10, 20, 30); 16 * 16];
        let payload = encode_vp8l(&pixels, 16, 16, &EncodeOptions::default()).unwrap();
        assert!(!payload.is_empty());
        assert_eq!(payload[0], 0x2F);
    }

    #[test]
    fn rejects_a_mismatched_pixel_buffer() {
        let pixels = vec![0u32; 10];
        assert!(encode_vp8l(&pixels, 4, 4, &EncodeOptions::default()).is_err());
    }

    #[test]
    fn fast_method_still_produces_a_decodable_looking_payload() {
        let pixels: Vec<u32> = (0..(16 * 16)).map(|i| argb(255, (i * 7) as u8, (i * 3) as u8, i as u8)).collect();
        let options = EncodeOptions { method: 0, ..EncodeOptions::default() };
        let payload = encode_vp8l(&pixels, 16, 16, &options).unwrap();
        assert!(!payload.is_empty());
        assert_eq!(payload[0], 0x2F);
    }

    #[test]
    fn low_effort_palette_ceiling_skips_indexing_a_busy_image() {
        let pixels: Vec<u32> = (0..64u32).map(|i| argb(255, i as u8, (i * 2) as u8, (i * 3) as u8)).collect();
        let options = EncodeOptions { method: 0, lossless_quality: 0, ..EncodeOptions::default() };
        let effort = lossless_effort(&options);
        assert!(!effort.thorough_color_search);
        assert!(64 > 16); // more distinct colors than the fast-path palette ceiling allows
        let payload = encode_vp8l(&pixels, 8, 8, &options).unwrap();
        assert!(!payload.is_empty());
    }
}
