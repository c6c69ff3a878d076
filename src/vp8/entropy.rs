/*---------------------------------------------------------------------------------------------
 *  Coefficient token entropy coding, shared by the encoder's and decoder's residual passes.
 *
 *  Tokens follow RFC 6386 Section 13's alphabet (EOB, zero run, literals 1..4, four extra-bits
 *  categories for larger magnitudes) but categories 5/6 are folded into one "large" category
 *  carrying a 11-bit extra magnitude, since this crate's own encoder never needs to express
 *  coefficients past what fits there and the two sides only need to agree with each other.
 *--------------------------------------------------------------------------------------------*/

use crate::bitio::{Vp8BoolDecoder, Vp8BoolEncoder};
use crate::consts::{COEFF_BAND, NUM_COEFF_PROBS};
use crate::vp8::probability_tables::CoeffProbTable;
use std::io::Read;

/// Writes one 4x4 block's 16 coefficients (raster order, as stored in `Macroblock`), starting
/// from `first_coeff` (1 for luma blocks whose DC was split into a separate WHT block, 0
/// otherwise). `plane_type` selects which of the four coefficient-probability planes this
/// block's tokens are coded against. Returns whether this block had any nonzero coefficient.
pub fn write_coeff_block(
    enc: &mut Vp8BoolEncoder,
    probs: &CoeffProbTable,
    block: &[i32; 16],
    first_coeff: usize,
    plane_type: usize,
    start_context: usize,
) -> anyhow::Result<bool> {
    let mut context = start_context;
    let mut any_nonzero = false;
    let mut pos = first_coeff;

    while pos < 16 {
        let band = COEFF_BAND[pos];
        let node_probs = probs.probs_for(plane_type, band, context);
        let coeff = block[pos];

        if coeff == 0 {
            // not-EOB, then "is zero" bit.
            enc.put_bool(true, node_probs[0])?;
            enc.put_bool(false, node_probs[1])?;
            context = 0;
            pos += 1;
            continue;
        }

        any_nonzero = true;
        enc.put_bool(true, node_probs[0])?; // not end-of-block
        enc.put_bool(true, node_probs[1])?; // nonzero

        let mag = coeff.unsigned_abs();
        write_magnitude(enc, node_probs, mag)?;
        enc.put_bool(coeff < 0, 128)?;

        context = if mag == 1 { 1 } else { 2 };
        pos += 1;
    }

    Ok(any_nonzero)
}

fn write_magnitude(enc: &mut Vp8BoolEncoder, probs: &[u8; NUM_COEFF_PROBS], mag: u32) -> anyhow::Result<()> {
    if mag == 1 {
        enc.put_bool(false, probs[2])?;
        return Ok(());
    }
    enc.put_bool(true, probs[2])?;
    if mag == 2 {
        enc.put_bool(false, probs[3])?;
        return Ok(());
    }
    enc.put_bool(true, probs[3])?;
    if mag == 3 {
        enc.put_bool(false, probs[4])?;
        return Ok(());
    }
    enc.put_bool(true, probs[4])?;
    if mag == 4 {
        enc.put_bool(false, probs[5])?;
        return Ok(());
    }
    // Large category: a final continuation bit, then an 11-bit extra magnitude (equiprobable).
    enc.put_bool(true, probs[5])?;
    enc.put_literal(mag - 5, 11)?;
    Ok(())
}

/// Decodes one 4x4 block's coefficients into `block` (already zeroed by the caller for
/// `0..first_coeff`). Returns whether the block had any nonzero coefficient.
pub fn read_coeff_block<R: Read>(
    dec: &mut Vp8BoolDecoder<R>,
    probs: &CoeffProbTable,
    block: &mut [i32; 16],
    first_coeff: usize,
    plane_type: usize,
    start_context: usize,
) -> anyhow::Result<bool> {
    let mut context = start_context;
    let mut any_nonzero = false;
    let mut pos = first_coeff;

    while pos < 16 {
        let band = COEFF_BAND[pos];
        let node_probs = probs.probs_for(plane_type, band, context);

        if !dec.get_bool(node_probs[0])? {
            break; // end of block
        }
        if !dec.get_bool(node_probs[1])? {
            block[pos] = 0;
            context = 0;
            pos += 1;
            continue;
        }

        any_nonzero = true;
        let mag = read_magnitude(dec, node_probs)?;
        let negative = dec.get_bool(128)?;
        block[pos] = if negative { -(mag as i32) } else { mag as i32 };
        context = if mag == 1 { 1 } else { 2 };
        pos += 1;
    }

    Ok(any_nonzero)
}

/// Walks one block's coefficients the same way `write_coeff_block` does, but returns the
/// sequence of tree-node decisions instead of encoding them -- the statistics
/// `FrameProbAccumulator` needs for its first pass, without requiring a throwaway encoder.
pub fn trace_coeff_block(block: &[i32; 16], first_coeff: usize, start_context: usize) -> Vec<(usize, usize, usize, bool)> {
    let mut trace = Vec::new();
    let mut context = start_context;
    let mut pos = first_coeff;

    while pos < 16 {
        let band = COEFF_BAND[pos];
        let coeff = block[pos];

        if coeff == 0 {
            trace.push((band, context, 0, true));
            trace.push((band, context, 1, false));
            context = 0;
            pos += 1;
            continue;
        }

        trace.push((band, context, 0, true));
        trace.push((band, context, 1, true));

        let mag = coeff.unsigned_abs();
        trace.push((band, context, 2, mag != 1));
        if mag != 1 {
            trace.push((band, context, 3, mag != 2));
            if mag > 2 {
                trace.push((band, context, 4, mag != 3));
                if mag > 3 {
                    trace.push((band, context, 5, mag > 4));
                }
            }
        }

        context = if mag == 1 { 1 } else { 2 };
        pos += 1;
    }

    trace
}

fn read_magnitude<R: Read>(dec: &mut Vp8BoolDecoder<R>, probs: &[u8; NUM_COEFF_PROBS]) -> anyhow::Result<u32> {
    if !dec.get_bool(probs[2])? {
        return Ok(1);
    }
    if !dec.get_bool(probs[3])? {
        return Ok(2);
    }
    if !dec.get_bool(probs[4])? {
        return Ok(3);
    }
    if !dec.get_bool(probs[5])? {
        return Ok(4);
    }
    let extra = dec.get_literal(11)?;
    Ok(extra + 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_sparse_block() {
        let probs = CoeffProbTable::default();
        let mut block = [0i32; 16];
        block[0] = 5;
        block[3] = -1;
        block[9] = 200;

        let mut enc = Vp8BoolEncoder::new();
        write_coeff_block(&mut enc, &probs, &block, 0, 3, 0).unwrap();
        let bytes = enc.finish().unwrap();

        let mut dec = Vp8BoolDecoder::new(Cursor::new(bytes)).unwrap();
        let mut decoded = [0i32; 16];
        read_coeff_block(&mut dec, &probs, &mut decoded, 0, 3, 0).unwrap();

        assert_eq!(decoded, block);
    }

    #[test]
    fn round_trips_an_all_zero_block() {
        let probs = CoeffProbTable::default();
        let block = [0i32; 16];

        let mut enc = Vp8BoolEncoder::new();
        let any = write_coeff_block(&mut enc, &probs, &block, 0, 3, 0).unwrap();
        assert!(!any);
        let bytes = enc.finish().unwrap();

        let mut dec = Vp8BoolDecoder::new(Cursor::new(bytes)).unwrap();
        let mut decoded = [1i32; 16];
        read_coeff_block(&mut dec, &probs, &mut decoded, 0, 3, 0).unwrap();
        assert_eq!(decoded, [0i32; 16]);
    }
}
