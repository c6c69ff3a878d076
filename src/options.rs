/*---------------------------------------------------------------------------------------------
 *  Encoder configuration surface.
 *--------------------------------------------------------------------------------------------*/

use crate::error::WebPError;

/// Named starting points `EncodeOptions::preset` can seed before per-field overrides apply,
/// mirroring cwebp's `-preset` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    Photo,
    Picture,
    Drawing,
    Icon,
    Text,
}

impl Preset {
    /// Applies this preset's defaults onto `opts`, the way cwebp's `WebPConfigPreset` seeds a
    /// config before flag parsing overrides individual fields.
    pub fn apply_to(self, opts: &mut EncodeOptions) {
        match self {
            Preset::Default => {}
            Preset::Photo => {
                opts.sns_strength = 80;
                opts.filter_sharpness = 3;
                opts.filter_strength = 40;
                opts.preprocessing = 1;
            }
            Preset::Picture => {
                opts.sns_strength = 80;
                opts.filter_strength = 35;
                opts.preprocessing = 1;
            }
            Preset::Drawing => {
                opts.sns_strength = 25;
                opts.filter_sharpness = 6;
                opts.filter_strength = 10;
            }
            Preset::Icon => {
                opts.sns_strength = 0;
                opts.filter_strength = 0;
            }
            Preset::Text => {
                opts.sns_strength = 0;
                opts.filter_strength = 0;
                opts.segments = 2;
            }
        }
    }
}

/// Encoder-wide options, one struct covering both codec paths .
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// 0 selects the lossless (VP8L) path; 1..=100 selects lossy (VP8) at that visual quality.
    pub quality: f32,
    /// Forces the lossless path regardless of `quality`.
    pub lossless: bool,
    /// 0 (fastest) .. 6 (best compression), trading encode time for ratio.
    pub method: u8,
    /// Target file size in bytes; 0 disables rate-targeting (quality-only mode).
    pub target_size: u32,
    /// Spatial noise shaping strength, 0..100.
    pub sns_strength: u8,
    /// Deblocking filter strength, 0 (off) ..100.
    pub filter_strength: u8,
    /// Deblocking filter sharpness, 0 (softest edges) ..7.
    pub filter_sharpness: u8,
    /// Number of segments the encoder may assign macroblocks to, 1..=4.
    pub segments: u8,
    /// Preserves exact RGB values under alpha == 0 instead of allowing color smearing.
    pub exact: bool,
    /// 0 = no preprocessing, 1 = pseudo-random dithering of strong gradients before encode.
    pub preprocessing: u8,
    /// Mirrors cwebp's `-jpeg_like` flag (bias the rate-distortion search toward JPEG-like
    /// block sizing). Accepted and validated for wire compatibility but has no effect on
    /// the output.
    pub emulate_jpeg_size: bool,
    /// Lossless compression effort, 0 (fastest) ..9 (smallest), independent of `method`.
    pub lossless_quality: u8,
    /// 0 selects the two-tap simple loop filter, 1 the six-tap normal filter.
    pub filter_type: u8,
    /// log2 of the number of VP8 token partitions, 0..=3.
    pub partitions: u8,
    /// Entropy + rate-control passes, 1..=10.
    pub pass: u8,
    /// Target PSNR in dB; 0 disables PSNR-targeted rate control.
    pub target_psnr: f32,
    pub qmin: u8,
    pub qmax: u8,
    /// 0 stores the ALPH payload raw, 1 compresses it through VP8L.
    pub alpha_compression: u8,
    /// 0 none, 1 fast heuristic, 2 best-of-trial; selects the ALPH predictive filter.
    pub alpha_filtering: u8,
    pub alpha_quality: u8,
    /// Opaque ICC profile bytes embedded in the container's `ICCP` chunk.
    pub icc: Option<Vec<u8>>,
    /// Opaque EXIF bytes embedded in the container's `EXIF` chunk.
    pub exif: Option<Vec<u8>>,
    /// Opaque XMP bytes embedded in the container's `XMP ` chunk.
    pub xmp: Option<Vec<u8>>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 75.0,
            lossless: false,
            method: 4,
            target_size: 0,
            sns_strength: 50,
            filter_strength: 60,
            filter_sharpness: 0,
            segments: 4,
            exact: false,
            preprocessing: 0,
            emulate_jpeg_size: false,
            lossless_quality: 6,
            filter_type: 1,
            partitions: 0,
            pass: 1,
            target_psnr: 0.0,
            qmin: 0,
            qmax: 100,
            alpha_compression: 1,
            alpha_filtering: 1,
            alpha_quality: 100,
            icc: None,
            exif: None,
            xmp: None,
        }
    }
}

impl EncodeOptions {
    pub fn with_preset(preset: Preset, quality: f32) -> Self {
        let mut opts = Self {
            quality,
            ..Self::default()
        };
        preset.apply_to(&mut opts);
        opts
    }

    /// Validates every field against its documented range, returning the first violation
    /// found. Called before any byte of output is produced.
    pub fn validate(&self) -> Result<(), WebPError> {
        if !(0.0..=100.0).contains(&self.quality) {
            return Err(WebPError::InvalidOption("quality"));
        }
        if self.method > 6 {
            return Err(WebPError::InvalidOption("method"));
        }
        if self.sns_strength > 100 {
            return Err(WebPError::InvalidOption("sns_strength"));
        }
        if self.filter_strength > 100 {
            return Err(WebPError::InvalidOption("filter_strength"));
        }
        if self.filter_sharpness > 7 {
            return Err(WebPError::InvalidOption("filter_sharpness"));
        }
        if self.segments == 0 || self.segments > 4 {
            return Err(WebPError::InvalidOption("segments"));
        }
        if self.preprocessing > 1 {
            return Err(WebPError::InvalidOption("preprocessing"));
        }
        if self.lossless_quality > 9 {
            return Err(WebPError::InvalidOption("lossless_quality"));
        }
        if self.filter_type > 1 {
            return Err(WebPError::InvalidOption("filter_type"));
        }
        if self.partitions > 3 {
            return Err(WebPError::InvalidOption("partitions"));
        }
        if self.pass == 0 || self.pass > 10 {
            return Err(WebPError::InvalidOption("pass"));
        }
        if self.qmin > 100 || self.qmax > 100 || self.qmin > self.qmax {
            return Err(WebPError::InvalidOption("qmin/qmax"));
        }
        if self.alpha_compression > 1 {
            return Err(WebPError::InvalidOption("alpha_compression"));
        }
        if self.alpha_filtering > 2 {
            return Err(WebPError::InvalidOption("alpha_filtering"));
        }
        if self.alpha_quality > 100 {
            return Err(WebPError::InvalidOption("alpha_quality"));
        }
        Ok(())
    }

    /// True when this configuration should take the VP8L path: an explicit request, or
    /// `quality == 0`.
    pub fn uses_lossless(&self) -> bool {
        self.lossless || self.quality == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(EncodeOptions::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let opts = EncodeOptions {
            quality: 101.0,
            ..Default::default()
        };
        assert_eq!(opts.validate(), Err(WebPError::InvalidOption("quality")));
    }

    #[test]
    fn zero_quality_selects_lossless() {
        let opts = EncodeOptions {
            quality: 0.0,
            ..Default::default()
        };
        assert!(opts.uses_lossless());
    }

    #[test]
    fn presets_apply_without_invalidating_options() {
        for preset in [
            Preset::Default,
            Preset::Photo,
            Preset::Picture,
            Preset::Drawing,
            Preset::Icon,
            Preset::Text,
        ] {
            let opts = EncodeOptions::with_preset(preset, 75.0);
            assert!(opts.validate().is_ok(), "{preset:?} produced invalid options");
        }
    }
}
