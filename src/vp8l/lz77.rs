/*---------------------------------------------------------------------------------------------
 *  LZ77 backward-reference search over the ARGB pixel stream.
 *
 *  A hash-chain match finder, the same family of technique as zlib/libwebp's own matcher:
 *  index every position by a hash of its next few pixels, walk the chain of prior positions
 *  sharing that hash looking for the longest match within the distance cap.
 *--------------------------------------------------------------------------------------------*/

use std::collections::HashMap;

pub const MAX_LENGTH: usize = 4096;
pub const MAX_DISTANCE: usize = 1 << 20;
const MIN_MATCH: usize = 3;

/// Maps `EncodeOptions::method` (0..6) onto a hash-chain search depth for `compress`, the same
/// sense cwebp's `-m` flag trades encode time for ratio: method 0 barely looks past the most
/// recent candidate, method 6 walks the full chain this crate is willing to afford.
pub fn effort_to_candidates(method: u8) -> usize {
    match method.min(6) {
        0 => 1,
        1 => 4,
        2 => 8,
        3 => 16,
        4 => 32,
        5 => 48,
        _ => 64,
    }
}

/// One token in the LZ77-reduced stream: either a single literal pixel or a copy from
/// `distance` pixels back of `length` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzToken {
    Literal(u32),
    Copy { distance: u32, length: u32 },
}

fn hash3(pixels: &[u32], pos: usize) -> u64 {
    let a = pixels[pos] as u64;
    let b = *pixels.get(pos + 1).unwrap_or(&0) as u64;
    let c = *pixels.get(pos + 2).unwrap_or(&0) as u64;
    a.wrapping_mul(0x9E37_79B1)
        ^ b.wrapping_mul(0x8545_3323)
        ^ c.wrapping_mul(0xC2B2_AE35)
}

/// Reduces a pixel stream to a token sequence via hash-chain matching, capped at
/// `MAX_LENGTH`/`MAX_DISTANCE`. `max_candidates` bounds how far back each hash chain is walked
/// per position; higher values trade encode time for better matches (see `effort_to_candidates`).
pub fn compress(pixels: &[u32], max_candidates: usize) -> Vec<LzToken> {
    let mut tokens = Vec::new();
    let mut chains: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut pos = 0usize;

    while pos < pixels.len() {
        let mut best_len = 0usize;
        let mut best_dist = 0usize;

        if pos + MIN_MATCH <= pixels.len() {
            let h = hash3(pixels, pos);
            if let Some(candidates) = chains.get(&h) {
                // Most recent candidates first; cap how far back we search to bound work.
                for &cand in candidates.iter().rev().take(max_candidates) {
                    let distance = pos - cand;
                    if distance == 0 || distance > MAX_DISTANCE {
                        continue;
                    }
                    let max_len = (pixels.len() - pos).min(MAX_LENGTH);
                    let mut len = 0;
                    while len < max_len && pixels[cand + len] == pixels[pos + len] {
                        len += 1;
                    }
                    if len > best_len {
                        best_len = len;
                        best_dist = distance;
                    }
                }
            }
        }

        if best_len >= MIN_MATCH {
            for i in pos..(pos + best_len).min(pixels.len().saturating_sub(MIN_MATCH - 1)) {
                if i + MIN_MATCH <= pixels.len() {
                    chains.entry(hash3(pixels, i)).or_default().push(i);
                }
            }
            tokens.push(LzToken::Copy {
                distance: best_dist as u32,
                length: best_len as u32,
            });
            pos += best_len;
        } else {
            if pos + MIN_MATCH <= pixels.len() {
                chains.entry(hash3(pixels, pos)).or_default().push(pos);
            }
            tokens.push(LzToken::Literal(pixels[pos]));
            pos += 1;
        }
    }

    tokens
}

/// Expands a token sequence back into the original pixel stream.
pub fn decompress(tokens: &[LzToken]) -> Vec<u32> {
    let mut pixels = Vec::new();
    for token in tokens {
        match *token {
            LzToken::Literal(p) => pixels.push(p),
            LzToken::Copy { distance, length } => {
                let start = pixels.len() - distance as usize;
                for i in 0..length as usize {
                    let p = pixels[start + i];
                    pixels.push(p);
                }
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_repetitive_data() {
        let mut pixels = Vec::new();
        for _ in 0..20 {
            pixels.extend_from_slice(&[1, 2, 3, 4, 5]);
        }
        let tokens = compress(&pixels, effort_to_candidates(4));
        assert!(tokens.len() < pixels.len());
        assert_eq!(decompress(&tokens), pixels);
    }

    #[test]
    fn round_trips_random_looking_data() {
        let pixels: Vec<u32> = (0..100).map(|i| i * 2654435761u32).collect();
        let tokens = compress(&pixels, effort_to_candidates(4));
        assert_eq!(decompress(&tokens), pixels);
    }

    #[test]
    fn higher_effort_searches_more_candidates() {
        assert!(effort_to_candidates(6) > effort_to_candidates(0));
        assert_eq!(effort_to_candidates(0), 1);
    }
}
