/*---------------------------------------------------------------------------------------------
 *  Distortion metrics used by the intra-mode RD search.
 *--------------------------------------------------------------------------------------------*/

/// Sum of squared errors between two equal-length 8-bit blocks.
pub fn sse(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// 4x4 Hadamard transform of a residual block (source minus prediction), used as a
/// perceptual proxy for coding cost: the sum of absolute transform coefficients correlates
/// with how expensive the residual is to entropy-code better than raw SSE does.
pub fn hadamard_4x4(residual: &[i32; 16]) -> [i32; 16] {
    let mut tmp = [0i32; 16];
    for i in 0..4 {
        let a0 = residual[i] + residual[12 + i];
        let a1 = residual[4 + i] + residual[8 + i];
        let a2 = residual[4 + i] - residual[8 + i];
        let a3 = residual[i] - residual[12 + i];
        tmp[i] = a0 + a1;
        tmp[4 + i] = a3 + a2;
        tmp[8 + i] = a0 - a1;
        tmp[12 + i] = a3 - a2;
    }

    let mut out = [0i32; 16];
    for i in 0..4 {
        let row = i * 4;
        let a0 = tmp[row] + tmp[row + 3];
        let a1 = tmp[row + 1] + tmp[row + 2];
        let a2 = tmp[row + 1] - tmp[row + 2];
        let a3 = tmp[row] - tmp[row + 3];
        out[row] = a0 + a1;
        out[row + 1] = a3 + a2;
        out[row + 2] = a0 - a1;
        out[row + 3] = a3 - a2;
    }

    out
}

/// Perceptual distortion score: sum of absolute Hadamard coefficients, divided down to a
/// scale comparable to SSE (libwebp divides by 2 after summing absolute values).
pub fn hadamard_cost(source: &[u8], predicted: &[u8]) -> u32 {
    debug_assert_eq!(source.len(), 16);
    debug_assert_eq!(predicted.len(), 16);

    let mut residual = [0i32; 16];
    for i in 0..16 {
        residual[i] = source[i] as i32 - predicted[i] as i32;
    }

    let coeffs = hadamard_4x4(&residual);
    let sum: u32 = coeffs.iter().map(|&c| c.unsigned_abs()).sum();
    (sum + 1) >> 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_of_identical_blocks_is_zero() {
        let a = [10u8; 16];
        assert_eq!(sse(&a, &a), 0);
    }

    #[test]
    fn hadamard_cost_of_identical_blocks_is_zero() {
        let a = [42u8; 16];
        assert_eq!(hadamard_cost(&a, &a), 0);
    }

    #[test]
    fn hadamard_cost_increases_with_difference() {
        let a = [0u8; 16];
        let mut b = [0u8; 16];
        b[0] = 10;
        let mut c = [0u8; 16];
        c[0] = 100;
        assert!(hadamard_cost(&a, &c) > hadamard_cost(&a, &b));
    }
}
