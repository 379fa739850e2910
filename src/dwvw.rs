//! The DWVW (Delta With Variable Word Width) codec itself: a
//! running-sample, running-width delta coder whose width deltas are
//! unary-coded.

use crate::bits::{BitReader, BitWriter};
use crate::intio;
use crate::prelude::*;

/// Encodes one channel's worth of samples into a DWVW bitstream.
///
/// `input` holds the source sample stream for every channel, interleaved
/// at `stride` samples per frame; this channel's first sample must
/// already be at `input[0]`. Reads `inwordsize`-bit signed samples,
/// converts to `outwordsize` bits (left-shift to widen, arithmetic
/// right-shift to narrow — no dithering), and writes the DWVW bitstream
/// to `output`.
///
/// Returns the number of bytes written (`ceil(bits / 8)`). Fails with
/// [`DwvwError::CodecOverflow`] if `output` was too small to hold every
/// sample.
pub fn encode_channel(
    input: &[u8],
    nsamples: u32,
    inwordsize: u32,
    stride: u32,
    output: &mut [u8],
    outwordsize: u32,
) -> R<usize> {
    let in_bytes = (inwordsize / 8) as usize;
    let half = (outwordsize / 2) as i64;
    let delta_range = (1i64 << (outwordsize - 1)) - 1;

    let mut last_sample: intio::Word = 0;
    let mut last_width: i64 = 0;
    let mut writer = BitWriter::new(output);

    for j in 0..nsamples as usize {
        let offset = j * stride as usize * in_bytes;
        let slice = input.get(offset..offset + in_bytes).ok_or_else(|| {
            DwvwError::malformed(format!("encode_channel: short input at sample {j}"))
        })?;
        let mut sample = intio::read_int(slice, inwordsize)?;
        if inwordsize < outwordsize {
            sample <<= outwordsize - inwordsize;
        } else {
            sample >>= inwordsize - outwordsize;
        }

        let mut delta = sample - last_sample;
        last_sample = sample;
        if delta >= 1i64 << (outwordsize - 1) {
            delta -= 1i64 << outwordsize;
        } else if delta < -(1i64 << (outwordsize - 1)) {
            delta += 1i64 << outwordsize;
        }

        let delta_sign = delta < 0;
        let mag = if delta_sign { -delta } else { delta };
        let mut width = 0i64;
        while (1i64 << width) <= mag {
            width += 1;
        }

        let mut wdm = width - last_width;
        last_width = width;
        if wdm > half {
            wdm -= outwordsize as i64;
        } else if wdm < -half {
            wdm += outwordsize as i64;
        }
        let wdm_sign = wdm < 0;
        let wdm_abs = if wdm_sign { -wdm } else { wdm };

        for _ in 0..wdm_abs {
            writer.put_bit(false);
        }
        if wdm_abs < half {
            writer.put_bit(true);
        }
        if wdm_abs != 0 {
            writer.put_bit(wdm_sign);
        }

        for i in 1..width {
            writer.put_bit((mag & (1i64 << (width - 1 - i))) != 0);
        }
        if width != 0 {
            writer.put_bit(delta_sign);
        }
        // Extra bit: only needed to distinguish -2^(w-1) from the next
        // value up. Present (but possibly 0) whenever sign is negative
        // and magnitude is at or above that boundary.
        if delta_sign && mag >= delta_range {
            writer.put_bit(mag > delta_range);
        }
    }

    if writer.overflowed() {
        return Err(DwvwError::overflow("encode_channel: output buffer full"));
    }
    Ok(writer.byte_count())
}

/// Decodes one channel's DWVW bitstream back into samples.
///
/// `input` is this channel's bitstream (already sliced to its own
/// extent); `output` receives `outwordsize`-bit big-endian samples at
/// `stride`-sample intervals starting at `output[0]`.
///
/// Returns the number of input bytes consumed. Fails with
/// [`DwvwError::CodecOverflow`] if the bitstream runs out before
/// `nsamples` samples are decoded.
pub fn decode_channel(
    input: &[u8],
    nsamples: u32,
    inwordsize: u32,
    stride: u32,
    output: &mut [u8],
    outwordsize: u32,
) -> R<usize> {
    let half = (inwordsize / 2) as i64;
    let out_bytes = (outwordsize / 8) as usize;

    let mut reader = BitReader::new(input);
    let mut sample: intio::Word = 0;
    let mut width: i64 = 0;

    for j in 0..nsamples as usize {
        let mut wdm_abs = 0i64;
        while wdm_abs < half && !reader.next_bit() {
            wdm_abs += 1;
        }
        if wdm_abs != 0 {
            let wdm = if reader.next_bit() { -wdm_abs } else { wdm_abs };
            width += wdm;
            if width >= inwordsize as i64 {
                width -= inwordsize as i64;
            } else if width < 0 {
                width += inwordsize as i64;
            }
        }

        let delta: intio::Word = if width == 0 {
            0
        } else {
            let mut d: i64 = 1;
            for _ in 1..width {
                d = (d << 1) | reader.next_bit() as i64;
            }
            if reader.next_bit() {
                d = -d;
            }
            if d == 1 - (1i64 << (inwordsize - 1)) && reader.next_bit() {
                d -= 1;
            }
            d
        };

        sample += delta;
        if sample >= 1i64 << (inwordsize - 1) {
            sample -= 1i64 << inwordsize;
        } else if sample < -(1i64 << (inwordsize - 1)) {
            sample += 1i64 << inwordsize;
        }

        if reader.overflow() {
            return Err(DwvwError::overflow(format!(
                "decode_channel: read overflow at sample {j}"
            )));
        }

        let scaled = if outwordsize >= inwordsize {
            sample << (outwordsize - inwordsize)
        } else {
            sample >> (inwordsize - outwordsize)
        };
        let out_offset = j * stride as usize * out_bytes;
        let slice = output
            .get_mut(out_offset..out_offset + out_bytes)
            .ok_or_else(|| DwvwError::malformed("decode_channel: output buffer too small"))?;
        intio::put_be(scaled, outwordsize, slice)?;
    }

    Ok(reader.position_bytes())
}
