//! Property-style round-trip coverage: seeded random pixel buffers across a range
//! of sizes, rather than an exhaustive encode/decode grid.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use webp_core::options::EncodeOptions;
use webp_core::{decode, encode, PixelSource};

fn random_rgba(rng: &mut ChaCha8Rng, width: u32, height: u32, with_alpha: bool) -> Vec<u8> {
    let mut data = vec![0u8; width as usize * height as usize * 4];
    for px in data.chunks_exact_mut(4) {
        px[0] = rng.gen();
        px[1] = rng.gen();
        px[2] = rng.gen();
        px[3] = if with_alpha { rng.gen() } else { 255 };
    }
    data
}

#[test]
fn lossless_round_trips_exactly_across_a_range_of_sizes_and_seeds() {
    for (seed, width, height) in [(1u64, 1, 1), (2, 3, 5), (3, 16, 16), (4, 33, 17), (5, 64, 64)] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let data = random_rgba(&mut rng, width, height, true);
        let source = PixelSource::Nrgba8 { data: &data, width, height, stride: width as usize * 4 };
        let options = EncodeOptions {
            lossless: true,
            ..Default::default()
        };

        let encoded = encode(&source, &options).unwrap_or_else(|e| panic!("seed {seed} ({width}x{height}) failed to encode: {e}"));
        let decoded = decode(&encoded).unwrap_or_else(|e| panic!("seed {seed} ({width}x{height}) failed to decode: {e}"));

        assert_eq!((decoded.width, decoded.height), (width, height));
        assert_eq!(decoded.pixels, data, "seed {seed} ({width}x{height}) did not round-trip exactly");
    }
}

#[test]
fn lossless_with_exact_flag_preserves_color_under_zero_alpha() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let width = 8;
    let height = 8;
    let mut data = random_rgba(&mut rng, width, height, false);
    // Force one pixel fully transparent with a distinctive, otherwise-implausible color.
    data[0..4].copy_from_slice(&[7, 8, 9, 0]);

    let source = PixelSource::Nrgba8 { data: &data, width, height, stride: width as usize * 4 };
    let options = EncodeOptions {
        lossless: true,
        exact: true,
        ..Default::default()
    };

    let encoded = encode(&source, &options).unwrap();
    let decoded = decode(&encoded).unwrap();
    assert_eq!(&decoded.pixels[0..4], &[7, 8, 9, 0]);
}

#[test]
fn every_encoded_container_has_an_even_total_length() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for (width, height, lossless) in [(5u32, 7u32, true), (9, 3, false), (15, 15, true)] {
        let data = random_rgba(&mut rng, width, height, false);
        let source = PixelSource::Nrgba8 { data: &data, width, height, stride: width as usize * 4 };
        let options = EncodeOptions {
            lossless,
            ..Default::default()
        };
        let encoded = encode(&source, &options).unwrap();
        assert_eq!(encoded.len() % 2, 0, "{width}x{height} lossless={lossless} produced an odd-length container");
    }
}

#[test]
fn zero_quality_selects_the_lossless_path() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let data = random_rgba(&mut rng, 4, 4, false);
    let source = PixelSource::Nrgba8 { data: &data, width: 4, height: 4, stride: 16 };
    let options = EncodeOptions {
        quality: 0.0,
        ..Default::default()
    };
    let encoded = encode(&source, &options).unwrap();
    assert_eq!(&encoded[12..16], b"VP8L");
}
