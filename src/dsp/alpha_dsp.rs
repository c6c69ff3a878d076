/*---------------------------------------------------------------------------------------------
 *  Alpha-plane helpers shared by the container layer's `ALPH` chunk path and the lossy
 *  decoder's post-reconstruction compositing step.
 *--------------------------------------------------------------------------------------------*/

/// Premultiplies RGB by alpha in place over a packed ARGB buffer, the transform `exact = false`
/// output applies so fully-transparent pixels carry color values consistent with their
/// neighbors rather than whatever the encoder happened to leave behind.
pub fn premultiply_argb(pixels: &mut [u32]) {
    for p in pixels.iter_mut() {
        let a = (*p >> 24) as u32;
        let r = (*p >> 16) as u8 as u32;
        let g = (*p >> 8) as u8 as u32;
        let b = *p as u8 as u32;

        let r = (r * a + 127) / 255;
        let g = (g * a + 127) / 255;
        let b = (b * a + 127) / 255;

        *p = (a << 24) | (r << 16) | (g << 8) | b;
    }
}

/// Undoes `premultiply_argb`, dividing RGB back out by alpha (leaving fully-transparent pixels'
/// color channels at zero, since the division is undefined there).
pub fn unmultiply_argb(pixels: &mut [u32]) {
    for p in pixels.iter_mut() {
        let a = (*p >> 24) as u32;
        if a == 0 {
            *p &= 0xFF00_0000;
            continue;
        }
        let r = (*p >> 16) as u8 as u32;
        let g = (*p >> 8) as u8 as u32;
        let b = *p as u8 as u32;

        let r = (r * 255 + a / 2) / a;
        let g = (g * 255 + a / 2) / a;
        let b = (b * 255 + a / 2) / a;

        *p = (a << 24) | (r.min(255) << 16) | (g.min(255) << 8) | b.min(255);
    }
}

/// Alpha plane filter methods the `ALPH` chunk header can select: each predicts
/// a sample from already-decoded neighbors and stores only the residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaFilter {
    None,
    Horizontal,
    Vertical,
    Gradient,
}

impl AlphaFilter {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            1 => Some(Self::Horizontal),
            2 => Some(Self::Vertical),
            3 => Some(Self::Gradient),
            _ => None,
        }
    }
}

/// Applies the forward alpha filter to a single 8-bit plane, row-major, `width` x `height`.
pub fn filter_alpha_plane(filter: AlphaFilter, plane: &mut [u8], width: usize, height: usize) {
    if filter == AlphaFilter::None {
        return;
    }
    // Forward pass must read unfiltered neighbors, so work from a snapshot.
    let original = plane.to_vec();
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let pred = predict_alpha_sample(filter, &original, width, x, y);
            plane[idx] = original[idx].wrapping_sub(pred);
        }
    }
}

/// Inverts `filter_alpha_plane`: residuals in `plane` become reconstructed samples in place,
/// processed in raster order since each sample's predictor depends on already-reconstructed
/// neighbors.
pub fn unfilter_alpha_plane(filter: AlphaFilter, plane: &mut [u8], width: usize, height: usize) {
    if filter == AlphaFilter::None {
        return;
    }
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let pred = predict_alpha_sample(filter, plane, width, x, y);
            plane[idx] = plane[idx].wrapping_add(pred);
        }
    }
}

fn predict_alpha_sample(filter: AlphaFilter, plane: &[u8], width: usize, x: usize, y: usize) -> u8 {
    let left = if x > 0 { plane[y * width + x - 1] } else if y > 0 { plane[(y - 1) * width] } else { 0 };
    let top = if y > 0 { plane[(y - 1) * width + x] } else { left };
    let top_left = if x > 0 && y > 0 { plane[(y - 1) * width + x - 1] } else { top };

    match filter {
        AlphaFilter::None => 0,
        AlphaFilter::Horizontal => left,
        AlphaFilter::Vertical => top,
        AlphaFilter::Gradient => {
            let v = left as i32 + top as i32 - top_left as i32;
            v.clamp(0, 255) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premultiply_round_trips_for_opaque_pixels() {
        let mut pixels = [0xFF_10_20_30u32];
        let original = pixels;
        premultiply_argb(&mut pixels);
        unmultiply_argb(&mut pixels);
        assert_eq!(pixels, original);
    }

    #[test]
    fn zero_alpha_premultiplies_to_zero_color() {
        let mut pixels = [0x00_AA_BB_CCu32];
        premultiply_argb(&mut pixels);
        assert_eq!(pixels[0] & 0x00FF_FFFF, 0);
    }

    #[test]
    fn alpha_filter_round_trips() {
        let width = 4;
        let height = 4;
        let original: Vec<u8> = (0..16u8).map(|v| v.wrapping_mul(17)).collect();

        for filter in [AlphaFilter::Horizontal, AlphaFilter::Vertical, AlphaFilter::Gradient] {
            let mut plane = original.clone();
            filter_alpha_plane(filter, &mut plane, width, height);
            unfilter_alpha_plane(filter, &mut plane, width, height);
            assert_eq!(plane, original, "filter {filter:?} failed to round trip");
        }
    }
}
