/*---------------------------------------------------------------------------------------------
 *  Tiled predictor-mode selection and application.
 *
 *  The image is divided into `2^block_bits`-pixel-square tiles, each carrying its own predictor
 *  mode (0..13); this mirrors libwebp's predictor transform tiling rather than picking one mode
 *  for the whole image.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::lossless::{argb, predictor_forward, predictor_inverse};

pub struct PixelPlane<'a> {
    pub pixels: &'a mut [u32],
    pub width: usize,
    pub height: usize,
}

fn neighbors(pixels: &[u32], width: usize, x: usize, y: usize) -> (u32, u32, u32, u32) {
    let at = |x: isize, y: isize| -> u32 {
        if x < 0 || y < 0 || x as usize >= width {
            0xFF00_0000 // black, the fixed border value for the first row/column
        } else {
            pixels[y as usize * width + x as usize]
        }
    };
    let left = at(x as isize - 1, y as isize);
    let top = at(x as isize, y as isize - 1);
    let top_left = at(x as isize - 1, y as isize - 1);
    let top_right = at(x as isize + 1, y as isize - 1);
    (left, top, top_left, top_right)
}

/// Chooses one predictor mode per `2^block_bits` tile by minimizing the summed absolute
/// residual against a representative sample of the tile's pixels.
pub fn select_modes(pixels: &[u32], width: usize, height: usize, block_bits: u8) -> Vec<u8> {
    let tile = 1usize << block_bits;
    let tiles_x = width.div_ceil(tile);
    let tiles_y = height.div_ceil(tile);
    let mut modes = vec![0u8; tiles_x * tiles_y];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut best_mode = 1u8;
            let mut best_cost = u64::MAX;
            for mode in 0..14u8 {
                let mut cost = 0u64;
                for dy in 0..tile.min(height - ty * tile) {
                    for dx in 0..tile.min(width - tx * tile) {
                        let x = tx * tile + dx;
                        let y = ty * tile + dy;
                        let (left, top, top_left, top_right) = neighbors(pixels, width, x, y);
                        let residual = predictor_forward(mode, pixels[y * width + x], left, top, top_left, top_right);
                        cost += abs_sum(residual) as u64;
                    }
                }
                if cost < best_cost {
                    best_cost = cost;
                    best_mode = mode;
                }
            }
            modes[ty * tiles_x + tx] = best_mode;
        }
    }

    modes
}

fn abs_sum(pixel: u32) -> u32 {
    let mut sum = 0u32;
    for shift in [0, 8, 16, 24] {
        let byte = ((pixel >> shift) & 0xFF) as i32;
        let signed = if byte > 127 { byte - 256 } else { byte };
        sum += signed.unsigned_abs();
    }
    sum
}

/// Applies the forward predictor transform in place, raster order, so each pixel's neighbors
/// are already the *original* values (the forward pass never needs already-transformed data).
pub fn apply_forward(pixels: &mut [u32], width: usize, height: usize, modes: &[u8], block_bits: u8) {
    let tile = 1usize << block_bits;
    let tiles_x = width.div_ceil(tile);
    let original = pixels.to_vec();

    for y in 0..height {
        for x in 0..width {
            let (left, top, top_left, top_right) = neighbors(&original, width, x, y);
            let mode = modes[(y / tile) * tiles_x + (x / tile)];
            pixels[y * width + x] = predictor_forward(mode, original[y * width + x], left, top, top_left, top_right);
        }
    }
}

/// Inverts `apply_forward`; must run in raster order since each pixel's predictor consults
/// already-reconstructed neighbors.
pub fn apply_inverse(pixels: &mut [u32], width: usize, height: usize, modes: &[u8], block_bits: u8) {
    let tile = 1usize << block_bits;
    let tiles_x = width.div_ceil(tile);

    for y in 0..height {
        for x in 0..width {
            let (left, top, top_left, top_right) = neighbors(pixels, width, x, y);
            let mode = modes[(y / tile) * tiles_x + (x / tile)];
            pixels[y * width + x] = predictor_inverse(mode, pixels[y * width + x], left, top, top_left, top_right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_inverse_recovers_the_original_image() {
        let width = 8;
        let height = 8;
        let original: Vec<u32> = (0..64u32)
            .map(|i| argb(255, (i * 3) as u8, (i * 5) as u8, (i * 7) as u8))
            .collect();
        let modes = select_modes(&original, width, height, 2);

        let mut pixels = original.clone();
        apply_forward(&mut pixels, width, height, &modes, 2);
        apply_inverse(&mut pixels, width, height, &modes, 2);

        assert_eq!(pixels, original);
    }
}
