/*---------------------------------------------------------------------------------------------
 *  VP8L transform stack bookkeeping.
 *
 *  Up to four transforms may be chained, color-indexing (if present) must be the last applied
 *  on encode / first undone on decode; this module only tracks which transforms are active and
 *  in what order, the pixel-level math lives in `dsp::lossless`.
 *--------------------------------------------------------------------------------------------*/

use crate::dsp::lossless::ColorTransformCoeffs;
use crate::error::WebPError;

#[derive(Debug, Clone)]
pub enum Transform {
    Predictor { modes: Vec<u8>, block_bits: u8 },
    ColorTransform { tiles: Vec<ColorTransformCoeffs>, block_bits: u8 },
    SubtractGreen,
    ColorIndexing { palette: Vec<u32> },
}

impl Transform {
    fn kind_id(&self) -> u8 {
        match self {
            Transform::Predictor { .. } => 0,
            Transform::ColorTransform { .. } => 1,
            Transform::SubtractGreen => 2,
            Transform::ColorIndexing { .. } => 3,
        }
    }
}

/// An ordered transform stack; enforces two structural invariants: depth <= 4 and
/// color-indexing, if present, sits last.
#[derive(Debug, Clone, Default)]
pub struct TransformStack {
    transforms: Vec<Transform>,
}

impl TransformStack {
    pub fn push(&mut self, t: Transform) -> Result<(), WebPError> {
        if self.transforms.len() >= 4 {
            return Err(WebPError::UnsupportedFeature("transform stack deeper than 4"));
        }
        if self.transforms.iter().any(|existing| existing.kind_id() == 3) {
            return Err(WebPError::UnsupportedFeature("transform pushed after color indexing"));
        }
        self.transforms.push(t);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter()
    }

    pub fn iter_rev(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_fifth_transform() {
        let mut stack = TransformStack::default();
        for _ in 0..4 {
            stack.push(Transform::SubtractGreen).unwrap();
        }
        assert!(stack.push(Transform::SubtractGreen).is_err());
    }

    #[test]
    fn rejects_transform_after_color_indexing() {
        let mut stack = TransformStack::default();
        stack.push(Transform::ColorIndexing { palette: vec![0] }).unwrap();
        assert!(stack.push(Transform::SubtractGreen).is_err());
    }
}
