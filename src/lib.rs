//! Pure-Rust encoder/decoder core for the WebP still-image format: a lossy
//! VP8 codec, a lossless VP8L codec, and the RIFF/WEBP container that routes bytes to each.

pub mod bitio;
pub mod consts;
pub mod container;
pub mod dsp;
pub mod error;
pub mod helpers;
pub mod options;
pub mod vp8;
pub mod vp8l;

use container::{alph, riff, vp8x};
use dsp::alpha_dsp::unmultiply_argb;
use dsp::lossless::{alpha, argb, blue, green, red};
use dsp::yuv::yuv_to_rgb;
use error::to_public_error;
use helpers::MAX_DIMENSION;
use vp8::encoder::color_import::YuvImage;

pub use error::WebPError;
pub use options::{EncodeOptions, Preset};

/// One of the three pixel layouts an encode source can be given in.
pub enum PixelSource<'a> {
    /// 8-bit non-premultiplied RGBA, `stride` bytes per row.
    Nrgba8 { data: &'a [u8], width: u32, height: u32, stride: usize },
    /// 8-bit RGBA with color already multiplied by alpha, `stride` bytes per row.
    Rgba8Premultiplied { data: &'a [u8], width: u32, height: u32, stride: usize },
    /// Planar YUV 4:2:0, no alpha channel.
    Yuv420 {
        y: &'a [u8],
        u: &'a [u8],
        v: &'a [u8],
        width: u32,
        height: u32,
        y_stride: usize,
        uv_stride: usize,
    },
}

impl PixelSource<'_> {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelSource::Nrgba8 { width, height, .. } => (*width, *height),
            PixelSource::Rgba8Premultiplied { width, height, .. } => (*width, *height),
            PixelSource::Yuv420 { width, height, .. } => (*width, *height),
        }
    }

    /// Converts any source layout into a flat, non-premultiplied RGBA8 buffer (row-major, no
    /// padding), the common representation every encode path starts from.
    fn to_nrgba8(&self) -> anyhow::Result<Vec<u8>> {
        match *self {
            PixelSource::Nrgba8 { data, width, height, stride } => {
                let mut out = vec![0u8; width as usize * height as usize * 4];
                for row in 0..height as usize {
                    let src = &data[row * stride..row * stride + width as usize * 4];
                    out[row * width as usize * 4..(row + 1) * width as usize * 4].copy_from_slice(src);
                }
                Ok(out)
            }
            PixelSource::Rgba8Premultiplied { data, width, height, stride } => {
                let mut out = vec![0u8; width as usize * height as usize * 4];
                for row in 0..height as usize {
                    let src = &data[row * stride..row * stride + width as usize * 4];
                    out[row * width as usize * 4..(row + 1) * width as usize * 4].copy_from_slice(src);
                }
                let mut pixels: Vec<u32> = out
                    .chunks_exact(4)
                    .map(|c| argb(c[3], c[0], c[1], c[2]))
                    .collect();
                unmultiply_argb(&mut pixels);
                for (chunk, &p) in out.chunks_exact_mut(4).zip(pixels.iter()) {
                    chunk[0] = red(p);
                    chunk[1] = green(p);
                    chunk[2] = blue(p);
                    chunk[3] = alpha(p);
                }
                Ok(out)
            }
            PixelSource::Yuv420 {
                y,
                u,
                v,
                width,
                height,
                y_stride,
                uv_stride,
            } => {
                let mut out = vec![0u8; width as usize * height as usize * 4];
                for row in 0..height as usize {
                    for col in 0..width as usize {
                        let yv = y[row * y_stride + col];
                        let uv = u[(row / 2) * uv_stride + col / 2];
                        let vv = v[(row / 2) * uv_stride + col / 2];
                        let (r, g, b) = yuv_to_rgb(yv, uv, vv);
                        let idx = (row * width as usize + col) * 4;
                        out[idx] = r;
                        out[idx + 1] = g;
                        out[idx + 2] = b;
                        out[idx + 3] = 255;
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Container/codec format a decoded (or probed) image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lossy,
    Lossless,
    Extended,
}

/// The result of a `get_features` probe: container/codec facts without decoding any pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub frame_count: u32,
    pub has_icc: bool,
    pub has_exif: bool,
    pub has_xmp: bool,
}

/// A fully decoded image: straight (non-premultiplied) RGBA8, row-major, no padding.
#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub features: FeatureRecord,
    /// Opaque bytes from the container's `ICCP` chunk, verbatim, if present.
    pub icc: Option<Vec<u8>>,
    /// Opaque bytes from the container's `EXIF` chunk, verbatim, if present.
    pub exif: Option<Vec<u8>>,
    /// Opaque bytes from the container's `XMP ` chunk, verbatim, if present.
    pub xmp: Option<Vec<u8>>,
}

/// Encodes `source` per `options` into a complete RIFF/WEBP byte stream.
pub fn encode(source: &PixelSource, options: &EncodeOptions) -> Result<Vec<u8>, WebPError> {
    options.validate()?;
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(WebPError::DimensionExceeded);
    }
    log::debug!("encode: {width}x{height}, lossless={}", options.uses_lossless());

    let rgba = source.to_nrgba8().map_err(to_public_error)?;
    let has_alpha = rgba.chunks_exact(4).any(|p| p[3] != 255);

    let mut writer = riff::RiffWriter::new();
    let needs_vp8x = has_alpha && !options.uses_lossless() || options.icc.is_some() || options.exif.is_some() || options.xmp.is_some();

    if needs_vp8x {
        let flags = vp8x::Vp8xFlags {
            has_icc: options.icc.is_some(),
            has_alpha: has_alpha && !options.uses_lossless(),
            has_exif: options.exif.is_some(),
            has_xmp: options.xmp.is_some(),
            has_animation: false,
        };
        writer.push_chunk(*b"VP8X", vp8x::build_payload(flags, width, height));
        if let Some(icc) = &options.icc {
            writer.push_chunk(*b"ICCP", icc.clone());
        }
    }

    if options.uses_lossless() {
        let pixels: Vec<u32> = rgba.chunks_exact(4).map(|c| argb(c[3], c[0], c[1], c[2])).collect();
        let payload = vp8l::encode_vp8l(&pixels, width as usize, height as usize, options).map_err(to_public_error)?;
        writer.push_chunk(*b"VP8L", payload);
    } else {
        if has_alpha {
            let alpha_plane: Vec<u8> = rgba.chunks_exact(4).map(|c| c[3]).collect();
            writer.push_chunk(*b"ALPH", alph::build_chunk(&alpha_plane, width as usize, height as usize));
        }
        let image = YuvImage::from_rgb(&rgba, width, height, 4);
        let payload = vp8::encode_vp8(&image, options).map_err(to_public_error)?;
        writer.push_chunk(*b"VP8 ", payload);
    }

    if let Some(exif) = &options.exif {
        writer.push_chunk(*b"EXIF", exif.clone());
    }
    if let Some(xmp) = &options.xmp {
        writer.push_chunk(*b"XMP ", xmp.clone());
    }

    let output = writer.finish();
    log::debug!("encode: produced {} bytes", output.len());
    Ok(output)
}

/// Decodes a complete RIFF/WEBP byte stream into straight RGBA8.
pub fn decode(data: &[u8]) -> Result<DecodedImage, WebPError> {
    decode_impl(data).map_err(to_public_error)
}

/// Raw container-level metadata bytes carried alongside a decode, copied verbatim with no
/// interpretation.
#[derive(Default)]
struct Metadata {
    icc: Option<Vec<u8>>,
    exif: Option<Vec<u8>>,
    xmp: Option<Vec<u8>>,
}

fn decode_impl(data: &[u8]) -> anyhow::Result<DecodedImage> {
    let chunks = riff::parse_chunks(data)?;

    if let Some(vp8x_chunk) = riff::find(&chunks, b"VP8X") {
        let info = vp8x::parse_payload(vp8x_chunk.payload)?;
        let meta = Metadata {
            icc: riff::find(&chunks, b"ICCP").map(|c| c.payload.to_vec()),
            exif: riff::find(&chunks, b"EXIF").map(|c| c.payload.to_vec()),
            xmp: riff::find(&chunks, b"XMP ").map(|c| c.payload.to_vec()),
        };

        if let Some(vp8l_chunk) = riff::find(&chunks, b"VP8L") {
            log::debug!("decode: extended container, VP8L payload");
            let decoded = vp8l::decode_vp8l(vp8l_chunk.payload)?;
            return Ok(finish_lossless(decoded, Format::Extended, meta));
        }

        let vp8_chunk = riff::find(&chunks, b"VP8 ")
            .ok_or(WebPError::MalformedContainer("VP8X container missing a VP8 /VP8L payload"))?;
        log::debug!("decode: extended container, VP8 payload");
        let frame = vp8::decode_vp8(vp8_chunk.payload)?;
        let alpha_plane = match riff::find(&chunks, b"ALPH") {
            Some(chunk) => Some(alph::decode_chunk(chunk.payload, info.width as usize, info.height as usize)?),
            None => None,
        };
        return Ok(finish_lossy(frame, alpha_plane, Format::Extended, meta));
    }

    if let Some(vp8l_chunk) = riff::find(&chunks, b"VP8L") {
        log::debug!("decode: simple VP8L container");
        let decoded = vp8l::decode_vp8l(vp8l_chunk.payload)?;
        return Ok(finish_lossless(decoded, Format::Lossless, Metadata::default()));
    }

    if let Some(vp8_chunk) = riff::find(&chunks, b"VP8 ") {
        log::debug!("decode: simple VP8 container");
        let frame = vp8::decode_vp8(vp8_chunk.payload)?;
        return Ok(finish_lossy(frame, None, Format::Lossy, Metadata::default()));
    }

    anyhow::bail!(WebPError::MalformedContainer("no VP8X, VP8L or VP8 chunk found"))
}

fn finish_lossless(decoded: vp8l::DecodedImage, format: Format, meta: Metadata) -> DecodedImage {
    let has_alpha = decoded.pixels.iter().any(|&p| alpha(p) != 0xFF);
    let mut pixels = Vec::with_capacity(decoded.pixels.len() * 4);
    for &p in &decoded.pixels {
        pixels.push(red(p));
        pixels.push(green(p));
        pixels.push(blue(p));
        pixels.push(alpha(p));
    }
    DecodedImage {
        width: decoded.width as u32,
        height: decoded.height as u32,
        pixels,
        features: FeatureRecord {
            width: decoded.width as u32,
            height: decoded.height as u32,
            format,
            has_alpha,
            has_animation: false,
            frame_count: 1,
            has_icc: meta.icc.is_some(),
            has_exif: meta.exif.is_some(),
            has_xmp: meta.xmp.is_some(),
        },
        icc: meta.icc,
        exif: meta.exif,
        xmp: meta.xmp,
    }
}

fn finish_lossy(frame: vp8::DecodedFrame, alpha_plane: Option<Vec<u8>>, format: Format, meta: Metadata) -> DecodedImage {
    let width = frame.pixel_width as usize;
    let height = frame.pixel_height as usize;
    let stride = frame.width as usize;
    let chroma_stride = frame.chroma_width as usize;

    let mut pixels = vec![0u8; width * height * 4];
    for row in 0..height {
        for col in 0..width {
            let yv = frame.y[row * stride + col];
            let uv = frame.u[(row / 2) * chroma_stride + col / 2];
            let vv = frame.v[(row / 2) * chroma_stride + col / 2];
            let (r, g, b) = yuv_to_rgb(yv, uv, vv);
            let idx = (row * width + col) * 4;
            pixels[idx] = r;
            pixels[idx + 1] = g;
            pixels[idx + 2] = b;
            pixels[idx + 3] = match &alpha_plane {
                Some(plane) => plane[row * width + col],
                None => 255,
            };
        }
    }

    let has_alpha = alpha_plane.is_some();
    DecodedImage {
        width: width as u32,
        height: height as u32,
        pixels,
        features: FeatureRecord {
            width: width as u32,
            height: height as u32,
            format,
            has_alpha,
            has_animation: false,
            frame_count: 1,
            has_icc: meta.icc.is_some(),
            has_exif: meta.exif.is_some(),
            has_xmp: meta.xmp.is_some(),
        },
        icc: meta.icc,
        exif: meta.exif,
        xmp: meta.xmp,
    }
}

/// Parses just the container and VP8X/VP8/VP8L headers, without decoding any pixels
///.
pub fn get_features(data: &[u8]) -> Result<FeatureRecord, WebPError> {
    get_features_impl(data).map_err(to_public_error)
}

fn get_features_impl(data: &[u8]) -> anyhow::Result<FeatureRecord> {
    log::trace!("get_features: probing {} bytes", data.len());
    let chunks = riff::parse_chunks(data)?;

    if let Some(vp8x_chunk) = riff::find(&chunks, b"VP8X") {
        let info = vp8x::parse_payload(vp8x_chunk.payload)?;
        return Ok(FeatureRecord {
            width: info.width,
            height: info.height,
            format: Format::Extended,
            has_alpha: info.flags.has_alpha,
            has_animation: info.flags.has_animation,
            frame_count: 1,
            has_icc: info.flags.has_icc,
            has_exif: info.flags.has_exif,
            has_xmp: info.flags.has_xmp,
        });
    }

    if let Some(vp8l_chunk) = riff::find(&chunks, b"VP8L") {
        let header = vp8l::probe_header(vp8l_chunk.payload)?;
        return Ok(FeatureRecord {
            width: header.width as u32,
            height: header.height as u32,
            format: Format::Lossless,
            has_alpha: header.has_alpha,
            has_animation: false,
            frame_count: 1,
            has_icc: false,
            has_exif: false,
            has_xmp: false,
        });
    }

    if let Some(vp8_chunk) = riff::find(&chunks, b"VP8 ") {
        let mut dec = bitio::Vp8BoolDecoder::new(vp8_chunk.payload)?;
        let header = vp8::decoder::header::read_frame_header(&mut dec)?;
        return Ok(FeatureRecord {
            width: header.pixel_width,
            height: header.pixel_height,
            format: Format::Lossy,
            has_alpha: false,
            has_animation: false,
            frame_count: 1,
            has_icc: false,
            has_exif: false,
            has_xmp: false,
        });
    }

    anyhow::bail!(WebPError::MalformedContainer("no VP8X, VP8L or VP8 chunk found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nrgba8_converts_straight_through() {
        let data = [10u8, 20, 30, 255, 40, 50, 60, 128];
        let source = PixelSource::Nrgba8 { data: &data, width: 2, height: 1, stride: 8 };
        assert_eq!(source.to_nrgba8().unwrap(), data);
    }

    #[test]
    fn premultiplied_source_unmultiplies_on_import() {
        // RGB 200,100,50 at alpha 128 premultiplied is roughly 100,50,25.
        let data = [100u8, 50, 25, 128];
        let source = PixelSource::Rgba8Premultiplied { data: &data, width: 1, height: 1, stride: 4 };
        let straight = source.to_nrgba8().unwrap();
        assert!((straight[0] as i32 - 200).abs() <= 4);
        assert_eq!(straight[3], 128);
    }

    #[test]
    fn yuv420_source_converts_a_flat_gray_block() {
        let y = [126u8; 4];
        let u = [128u8; 1];
        let v = [128u8; 1];
        let source = PixelSource::Yuv420 { y: &y, u: &u, v: &v, width: 2, height: 2, y_stride: 2, uv_stride: 1 };
        let rgba = source.to_nrgba8().unwrap();
        for px in rgba.chunks_exact(4) {
            assert!((px[0] as i32 - 126).abs() <= 3);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn invalid_options_are_rejected_before_any_byte_is_written() {
        let data = [0u8; 64];
        let source = PixelSource::Nrgba8 { data: &data, width: 4, height: 4, stride: 16 };
        let options = EncodeOptions {
            quality: -50.0,
            ..Default::default()
        };
        assert_eq!(encode(&source, &options), Err(WebPError::InvalidOption("quality")));
    }

    #[test]
    fn oversized_dimensions_are_refused() {
        let data = vec![0u8; 4];
        let source = PixelSource::Nrgba8 { data: &data, width: 16384, height: 1, stride: 4 };
        assert_eq!(encode(&source, &EncodeOptions::default()), Err(WebPError::DimensionExceeded));
    }

    #[test]
    fn garbage_input_is_a_malformed_container() {
        assert_eq!(
            decode(b"not a webp file").unwrap_err(),
            WebPError::MalformedContainer("missing RIFF/WEBP signature")
        );
    }
}
