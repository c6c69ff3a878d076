/*---------------------------------------------------------------------------------------------
 *  RGB -> YUV 4:2:0 plane import.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::yuv::{rgb_to_u, rgb_to_v, rgb_to_y};

/// Planar YUV 4:2:0 image: luma at full resolution, chroma subsampled 2x in both axes.
#[derive(Debug, Clone)]
pub struct YuvImage {
    /// Padded-to-macroblock-multiple plane width/height.
    pub width: u32,
    pub height: u32,
    /// The caller's original, unpadded pixel dimensions; carried through to the frame header
    /// so the decoder can crop the reconstructed planes back to them.
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub chroma_width: u32,
    pub chroma_height: u32,
}

impl YuvImage {
    /// Converts a packed RGB(A) source (`channels` 3 or 4) into a padded-to-macroblock-grid
    /// YUV 4:2:0 image, averaging each 2x2 luma quad's RGB down to one chroma sample per
    /// averaging-downsample rule.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32, channels: usize) -> Self {
        let mb_width = width.div_ceil(16) * 16;
        let mb_height = height.div_ceil(16) * 16;
        let mut y = vec![0u8; (mb_width * mb_height) as usize];

        let sample = |x: u32, y: u32| -> (u8, u8, u8) {
            let x = x.min(width.saturating_sub(1));
            let yy = y.min(height.saturating_sub(1));
            let idx = ((yy * width + x) as usize) * channels;
            (rgb[idx], rgb[idx + 1], rgb[idx + 2])
        };

        for py in 0..mb_height {
            for px in 0..mb_width {
                let (r, g, b) = sample(px, py);
                y[(py * mb_width + px) as usize] = rgb_to_y(r, g, b);
            }
        }

        let chroma_width = mb_width / 2;
        let chroma_height = mb_height / 2;
        let mut u = vec![0u8; (chroma_width * chroma_height) as usize];
        let mut v = vec![0u8; (chroma_width * chroma_height) as usize];

        for cy in 0..chroma_height {
            for cx in 0..chroma_width {
                let mut rsum = 0u32;
                let mut gsum = 0u32;
                let mut bsum = 0u32;
                for dy in 0..2u32 {
                    for dx in 0..2u32 {
                        let (r, g, b) = sample(cx * 2 + dx, cy * 2 + dy);
                        rsum += r as u32;
                        gsum += g as u32;
                        bsum += b as u32;
                    }
                }
                let r = ((rsum + 2) / 4) as u8;
                let g = ((gsum + 2) / 4) as u8;
                let b = ((bsum + 2) / 4) as u8;
                let idx = (cy * chroma_width + cx) as usize;
                u[idx] = rgb_to_u(r, g, b);
                v[idx] = rgb_to_v(r, g, b);
            }
        }

        Self {
            width: mb_width,
            height: mb_height,
            pixel_width: width,
            pixel_height: height,
            y,
            u,
            v,
            chroma_width,
            chroma_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_gray_image_imports_to_flat_planes() {
        let rgb = vec![128u8; 16 * 16 * 3];
        let img = YuvImage::from_rgb(&rgb, 16, 16, 3);
        assert!(img.y.iter().all(|&v| (v as i32 - 128).abs() <= 1));
        assert_eq!(img.chroma_width, 8);
        assert_eq!(img.chroma_height, 8);
    }

    #[test]
    fn padding_rounds_up_to_macroblock_multiple() {
        let rgb = vec![0u8; 10 * 10 * 3];
        let img = YuvImage::from_rgb(&rgb, 10, 10, 3);
        assert_eq!(img.width, 16);
        assert_eq!(img.height, 16);
    }
}
