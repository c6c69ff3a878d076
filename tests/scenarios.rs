//! End-to-end container scenarios, one rstest case per documented behavior.

use rstest::rstest;
use webp_core::options::EncodeOptions;
use webp_core::{decode, encode, get_features, Format, PixelSource, WebPError};

fn solid_nrgba(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; width as usize * height as usize * 4];
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
    data
}

#[test]
fn s1_small_solid_image_round_trips_losslessly() {
    let data = solid_nrgba(4, 4, [255, 0, 0, 255]);
    let source = PixelSource::Nrgba8 { data: &data, width: 4, height: 4, stride: 16 };
    let options = EncodeOptions {
        lossless: true,
        ..Default::default()
    };

    let encoded = encode(&source, &options).unwrap();
    assert_eq!(&encoded[12..16], b"VP8L");

    let decoded = decode(&encoded).unwrap();
    assert_eq!((decoded.width, decoded.height), (4, 4));
    for px in decoded.pixels.chunks_exact(4) {
        assert_eq!(px, [255, 0, 0, 255]);
    }
}

#[test]
fn s2_opaque_lossy_image_uses_the_simple_vp8_container() {
    let data = solid_nrgba(16, 16, [0, 0, 255, 255]);
    let source = PixelSource::Nrgba8 { data: &data, width: 16, height: 16, stride: 64 };
    let options = EncodeOptions {
        quality: 80.0,
        ..Default::default()
    };

    let encoded = encode(&source, &options).unwrap();
    assert_eq!(&encoded[12..16], b"VP8 ");

    let decoded = decode(&encoded).unwrap();
    let idx = (8 * 16 + 8) * 4;
    assert!(decoded.pixels[idx + 2] >= 200, "blue channel should dominate");
    assert!(decoded.pixels[idx] <= 50, "red channel should stay low");
}

#[test]
fn s3_translucent_lossy_image_uses_the_extended_container_with_the_alpha_bit_set() {
    let data = solid_nrgba(16, 16, [200, 100, 50, 128]);
    let source = PixelSource::Nrgba8 { data: &data, width: 16, height: 16, stride: 64 };
    let options = EncodeOptions {
        quality: 80.0,
        ..Default::default()
    };

    let encoded = encode(&source, &options).unwrap();
    assert_eq!(&encoded[12..16], b"VP8X");
    assert_ne!(encoded[20] & 0b0001_0000, 0, "alpha bit (bit 4) should be set");

    let chunks_after_vp8x = &encoded[20 + 10..];
    assert_eq!(&chunks_after_vp8x[0..4], b"ALPH");

    let features = get_features(&encoded).unwrap();
    assert!(features.has_alpha);
    assert_eq!(features.format, Format::Extended);
}

#[test]
fn s4_one_by_one_lossless_image_round_trips_and_reports_accurate_features() {
    let data = solid_nrgba(1, 1, [42, 84, 126, 255]);
    let source = PixelSource::Nrgba8 { data: &data, width: 1, height: 1, stride: 4 };
    let options = EncodeOptions {
        lossless: true,
        ..Default::default()
    };

    let encoded = encode(&source, &options).unwrap();

    let features = get_features(&encoded).unwrap();
    assert_eq!((features.width, features.height), (1, 1));
    assert_eq!(features.format, Format::Lossless);
    assert!(!features.has_alpha);

    let decoded = decode(&encoded).unwrap();
    assert_eq!(&decoded.pixels[0..4], [42, 84, 126, 255]);
}

#[rstest]
#[case::negative(-1.0)]
#[case::over_max(150.0)]
fn s5_invalid_quality_writes_zero_bytes(#[case] quality: f32) {
    let data = solid_nrgba(4, 4, [0, 0, 0, 255]);
    let source = PixelSource::Nrgba8 { data: &data, width: 4, height: 4, stride: 16 };
    let options = EncodeOptions {
        quality,
        ..Default::default()
    };

    let err = encode(&source, &options).unwrap_err();
    assert_eq!(err, WebPError::InvalidOption("quality"));
}

#[rstest]
#[case::empty(&[])]
#[case::text(b"not a webp file")]
#[case::truncated_riff(b"RIFF")]
fn s6_malformed_input_is_reported_as_a_malformed_container(#[case] input: &[u8]) {
    let err = decode(input).unwrap_err();
    assert!(matches!(err, WebPError::MalformedContainer(_)));
}
