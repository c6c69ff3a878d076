/*---------------------------------------------------------------------------------------------
 *  BT.601 fixed-point YUV <-> RGB conversion.
 *
 *  Pure functions over scalars, clip-table-backed saturation, no intermediate floating point.
 *--------------------------------------------------------------------------------------------*/

use super::clip_tables::clip_u8;

const K_Y_SCALE: i32 = 19077;
const K_R_CR: i32 = 26149;
const K_G_CB: i32 = 6419;
const K_G_CR: i32 = 13320;
const K_B_CB: i32 = 33050;

const K_R_BIAS: i32 = 14234;
const K_G_BIAS: i32 = 8708;
const K_B_BIAS: i32 = 17685;

/// `(v * c) >> 8`, the high-byte multiply names `multHi`.
#[inline(always)]
fn mult_hi(v: i32, c: i32) -> i32 {
    (v * c) >> 8
}

/// One fully-resolved YUV triple converted to 8-bit RGB.
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = mult_hi(y as i32, K_Y_SCALE);
    let r = clip_u8((y + mult_hi(v as i32, K_R_CR) - K_R_BIAS) >> 6);
    let g = clip_u8((y - mult_hi(u as i32, K_G_CB) - mult_hi(v as i32, K_G_CR) + K_G_BIAS) >> 6);
    let b = clip_u8((y + mult_hi(u as i32, K_B_CB) - K_B_BIAS) >> 6);
    (r, g, b)
}

/// BT.601 forward conversion from 8-bit RGB to the Y plane value (rounded to nearest).
#[inline]
pub fn rgb_to_y(r: u8, g: u8, b: u8) -> u8 {
    let y = (16839 * r as i32 + 33059 * g as i32 + 6420 * b as i32 + (1 << 15)) >> 16;
    clip_u8(y + 16)
}

/// BT.601 forward conversion to the U (Cb) plane value.
#[inline]
pub fn rgb_to_u(r: u8, g: u8, b: u8) -> u8 {
    let u = (-9719 * r as i32 - 19081 * g as i32 + 28800 * b as i32 + (1 << 15)) >> 16;
    clip_u8(u + 128)
}

/// BT.601 forward conversion to the V (Cr) plane value.
#[inline]
pub fn rgb_to_v(r: u8, g: u8, b: u8) -> u8 {
    let v = (28800 * r as i32 - 24116 * g as i32 - 4684 * b as i32 + (1 << 15)) >> 16;
    clip_u8(v + 128)
}

/// Per-row dithering amplitude used during color import when `preprocessing & 2` is set
///: `1 - 0.5*(q/100)^4`, expressed as an integer amplitude in [0,255]
/// so the caller can add a deterministic ordered-dither pattern scaled by this amount before
/// rounding down to 8-bit chroma.
pub fn dither_amplitude(quality: u32) -> u8 {
    let q = (quality.min(100) as f64) / 100.0;
    let amplitude = 1.0 - 0.5 * q.powi(4);
    (amplitude * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_gray_approximately() {
        for level in [0u8, 16, 128, 200, 235, 255] {
            let (r, g, b) = (level, level, level);
            let y = rgb_to_y(r, g, b);
            let u = rgb_to_u(r, g, b);
            let v = rgb_to_v(r, g, b);
            let (r2, g2, b2) = yuv_to_rgb(y, u, v);
            assert!((r2 as i32 - r as i32).abs() <= 3, "r {r} -> {r2}");
            assert!((g2 as i32 - g as i32).abs() <= 3, "g {g} -> {g2}");
            assert!((b2 as i32 - b as i32).abs() <= 3, "b {b} -> {b2}");
        }
    }

    #[test]
    fn dither_amplitude_monotonic_decreasing() {
        assert!(dither_amplitude(0) >= dither_amplitude(50));
        assert!(dither_amplitude(50) >= dither_amplitude(100));
    }
}
