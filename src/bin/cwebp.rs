/*---------------------------------------------------------------------------------------------
 *  Thin demonstration CLI over webp_core::{encode, decode, get_features}.
 *
 *  No animation composition, ICC color management, or batch processing -- those stay external.
 *--------------------------------------------------------------------------------------------*/

use std::fs;
use std::process::ExitCode;

use webp_core::options::EncodeOptions;
use webp_core::{decode, encode, get_features, PixelSource};

const HELP: &str = "\
cwebp -- encode/decode/probe a WebP still image

USAGE:
    cwebp encode -i <input.raw> -o <output.webp> --width <w> --height <h> [-q <0..100>] [--lossless]
    cwebp decode -i <input.webp> -o <output.raw>
    cwebp info -i <input.webp>

encode reads headerless packed RGBA8 (4 bytes/pixel, row-major). decode writes the same layout.";

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new().init().ok();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("{HELP}");
        return Ok(());
    }

    let command = args.subcommand()?.ok_or_else(|| anyhow::anyhow!("missing subcommand: encode, decode, or info"))?;

    match command.as_str() {
        "encode" => run_encode(args),
        "decode" => run_decode(args),
        "info" => run_info(args),
        other => anyhow::bail!("unknown subcommand: {other}"),
    }
}

fn run_encode(mut args: pico_args::Arguments) -> anyhow::Result<()> {
    let input: String = args.value_from_str(["-i", "--input"])?;
    let output: String = args.value_from_str(["-o", "--output"])?;
    let width: u32 = args.value_from_str("--width")?;
    let height: u32 = args.value_from_str("--height")?;
    let quality: f32 = args.opt_value_from_str(["-q", "--quality"])?.unwrap_or(75.0);
    let lossless = args.contains("--lossless");
    let remaining = args.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}");
    }

    let data = fs::read(&input)?;
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        anyhow::bail!("input is {} bytes, expected {expected} for {width}x{height} RGBA8", data.len());
    }

    let source = PixelSource::Nrgba8 {
        data: &data,
        width,
        height,
        stride: width as usize * 4,
    };
    let options = EncodeOptions {
        quality,
        lossless,
        ..Default::default()
    };

    let encoded = encode(&source, &options)?;
    log::info!("encoded {width}x{height} to {} bytes", encoded.len());
    fs::write(&output, encoded)?;
    Ok(())
}

fn run_decode(mut args: pico_args::Arguments) -> anyhow::Result<()> {
    let input: String = args.value_from_str(["-i", "--input"])?;
    let output: String = args.value_from_str(["-o", "--output"])?;
    let remaining = args.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}");
    }

    let data = fs::read(&input)?;
    let decoded = decode(&data)?;
    log::info!("decoded {}x{}", decoded.width, decoded.height);
    fs::write(&output, decoded.pixels)?;
    Ok(())
}

fn run_info(mut args: pico_args::Arguments) -> anyhow::Result<()> {
    let input: String = args.value_from_str(["-i", "--input"])?;
    let remaining = args.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}");
    }

    let data = fs::read(&input)?;
    let features = get_features(&data)?;
    println!("width:      {}", features.width);
    println!("height:     {}", features.height);
    println!("format:     {:?}", features.format);
    println!("has_alpha:  {}", features.has_alpha);
    println!("animation:  {} ({} frame(s))", features.has_animation, features.frame_count);
    println!("icc/exif/xmp: {}/{}/{}", features.has_icc, features.has_exif, features.has_xmp);
    Ok(())
}
