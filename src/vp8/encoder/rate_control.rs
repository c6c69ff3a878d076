/*---------------------------------------------------------------------------------------------
 *  Quantizer selection.
 *
 *  Two paths: plain quality-to-quantizer mapping (no rate targeting), and an iterative binary
 *  search over the base quantizer index when `target_size` is nonzero, re-encoding at each
 *  trial index the way cwebp's `-size` flag iterates.
 *--------------------------------------------------------------------------------------------*/

/// Maps a 0..100 quality value onto a 0..127 base quantizer index, inverted (higher quality ->
/// lower index -> finer quantization), the same sense cwebp's quality slider uses.
pub fn quality_to_base_index(quality: f32) -> i32 {
    let q = quality.clamp(0.0, 100.0);
    (127.0 - (q / 100.0) * 127.0).round() as i32
}

/// Runs `encode_at` (which must return the encoded byte length) at successive base quantizer
/// indices via binary search until its output is within `tolerance` bytes of `target_size` or
/// the search range collapses, returning the best index tried.
pub fn search_for_target_size<F: FnMut(i32) -> usize>(
    target_size: usize,
    tolerance: usize,
    mut encode_at: F,
) -> i32 {
    let mut lo = 0i32;
    let mut hi = 127i32;
    let mut best_index = 64i32;
    let mut best_diff = usize::MAX;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let size = encode_at(mid);
        let diff = size.abs_diff(target_size);
        if diff < best_diff {
            best_diff = diff;
            best_index = mid;
        }
        if diff <= tolerance {
            break;
        }
        if size > target_size {
            lo = mid + 1; // too big, coarsen (raise index)
        } else {
            hi = mid - 1; // too small, sharpen (lower index)
        }
    }

    best_index
}

/// Mean squared error between two equal-length luma planes, the distortion term PSNR is
/// derived from.
pub fn luma_mse(a: &[u8], b: &[u8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a.iter().zip(b).map(|(&x, &y)| (x as f64 - y as f64).powi(2)).sum();
    sum / a.len() as f64
}

/// Converts a mean squared error into peak signal-to-noise ratio, in dB, against an 8-bit
/// signal; a perfect match (`mse == 0`) is reported as a very high but finite value instead
/// of infinity so callers can keep treating it as an ordinary search target.
pub fn psnr_db(mse: f64) -> f64 {
    if mse <= 0.0 {
        return 99.0;
    }
    10.0 * (255.0 * 255.0 / mse).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_planes_have_zero_mse_and_high_psnr() {
        let plane = vec![50u8; 64];
        assert_eq!(luma_mse(&plane, &plane), 0.0);
        assert!(psnr_db(luma_mse(&plane, &plane)) >= 99.0);
    }

    #[test]
    fn noisier_planes_score_lower_psnr() {
        let a = vec![50u8; 64];
        let mut b = a.clone();
        for (i, p) in b.iter_mut().enumerate() {
            *p = p.wrapping_add(if i % 2 == 0 { 20 } else { 0 });
        }
        assert!(psnr_db(luma_mse(&a, &b)) < 99.0);
    }

    #[test]
    fn higher_quality_gives_lower_index() {
        assert!(quality_to_base_index(100.0) < quality_to_base_index(0.0));
    }

    #[test]
    fn search_converges_on_a_monotonic_size_function() {
        // Larger index -> coarser quantization -> smaller output, a monotonically decreasing
        // stand-in for a real encode pass.
        let best = search_for_target_size(1000, 5, |idx| (20000 - idx as usize * 150).max(100));
        let size_at_best = (20000 - best as usize * 150).max(100);
        assert!(size_at_best.abs_diff(1000) < 2000);
    }
}
