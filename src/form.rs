//! Builds the output AIFC FORM in memory: copies pass-through chunks,
//! rewrites COMM, and rewrites SSND through the DWVW codec.
//!
//! Walks chunks the way [`crate::chunk`] does — advancing by
//! `size + 8 + (size & 1)` — so the rebuilt FORM's declared size always
//! equals `4 + Σ roundup_even(chunk.size + 8)` over its children, with no
//! chunk left unaligned to an even offset.

use crate::comm::{
    Comm, AIFC_TYPE, COMM_ID, DWVW_COMPRESSION, NONE_COMPRESSION, SSND_ID,
};
use crate::dwvw;
use crate::prelude::*;

const DWVW_COMPRESSION_INFO: &[u8] = b"DWVW\x1fDelta With Variable Word Width\x00";
const NONE_COMPRESSION_INFO: &[u8] = b"NONE\x0enot compressed\x00";
/// Chunk id + size + the 18 bytes of COMM payload shared by AIFF and
/// AIFC (nchannels, nsamples, wordsize, sample-rate blob).
const COMM_HEAD_BYTES: usize = 8 + 18;

fn checked_outmax(base: usize, channels: u64, samples: u64, per_sample_bytes: u64) -> R<usize> {
    let payload = per_sample_bytes
        .checked_mul(channels)
        .and_then(|x| x.checked_mul(samples))
        .ok_or_else(|| DwvwError::out_of_range("output size computation overflowed"))?;
    let total = (base as u64)
        .checked_add(payload)
        .ok_or_else(|| DwvwError::out_of_range("output size computation overflowed"))?;
    if total > i32::MAX as u64 {
        return Err(DwvwError::out_of_range(format!(
            "output size {total} exceeds the 31-bit FORM size limit"
        )));
    }
    Ok(total as usize)
}

fn write_form_header(out: &mut [u8], payload_end: usize) {
    out[0..4].copy_from_slice(b"FORM");
    let size = (payload_end - 8) as i32;
    out[4..8].copy_from_slice(&size.to_be_bytes());
    out[8..12].copy_from_slice(AIFC_TYPE);
}

/// Rewrites `form` (an AIFF or uncompressed-AIFC FORM) into a DWVW-
/// compressed AIFC FORM at `outwordsize` bits per compressed sample.
pub fn rewrite_compress(form: &[u8], comm: &Comm, outwordsize: u32) -> R<Vec<u8>> {
    let inend = form.len();
    let form_type: [u8; 4] = form[8..12].try_into().unwrap();
    if let Some(ct) = comm.compression_type {
        if form_type == *AIFC_TYPE && ct != *NONE_COMPRESSION {
            return Err(DwvwError::UnsupportedCompression {
                found: ct,
                expected: NONE_COMPRESSION,
            });
        }
    }

    let per_sample_bytes = (outwordsize as u64 + outwordsize as u64 / 2 + 1).div_ceil(8);
    let outmax = checked_outmax(
        form.len(),
        comm.nchannels as u64,
        comm.nsamples as u64,
        per_sample_bytes,
    )?;
    let mut out = vec![0u8; outmax];

    let mut p = 12usize;
    let mut q = 12usize;
    while p + 8 <= inend {
        let id: [u8; 4] = form[p..p + 4].try_into().unwrap();
        let size = intio::read_int(&form[p + 4..], 32)? as i64;
        if size < 0 || p as i64 + 8 + size > inend as i64 {
            return Err(DwvwError::malformed(format!(
                "chunk at offset {p}: invalid size {size}"
            )));
        }
        let size = size as usize;

        if &id == COMM_ID {
            out[q..q + COMM_HEAD_BYTES].copy_from_slice(&form[p..p + COMM_HEAD_BYTES]);
            intio::put_be(outwordsize as i64, 16, &mut out[q + 14..])?;
            out[q + COMM_HEAD_BYTES..q + COMM_HEAD_BYTES + DWVW_COMPRESSION_INFO.len()]
                .copy_from_slice(DWVW_COMPRESSION_INFO);
            let new_size = 18 + DWVW_COMPRESSION_INFO.len();
            intio::put_be(new_size as i64, 32, &mut out[q + 4..])?;
            q += COMM_HEAD_BYTES + DWVW_COMPRESSION_INFO.len();
        } else if &id == SSND_ID {
            let ssnd = q;
            q += 16;
            let stride = comm.nchannels as u32;
            for i in 0..comm.nchannels as usize {
                let channel_offset = p + 16 + i * (comm.wordsize as usize / 8);
                let written = dwvw::encode_channel(
                    &form[channel_offset..],
                    comm.nsamples,
                    comm.wordsize as u32,
                    stride,
                    &mut out[q..],
                    outwordsize,
                )?;
                q += written;
                q += (q - ssnd) & 1;
            }
            out[ssnd..ssnd + 4].copy_from_slice(SSND_ID);
            let ssnd_size = (q - ssnd - 8) as i32;
            out[ssnd + 4..ssnd + 8].copy_from_slice(&ssnd_size.to_be_bytes());
            out[ssnd + 8..ssnd + 16].copy_from_slice(&[0u8; 8]);
        } else {
            out[q..q + size + 8].copy_from_slice(&form[p..p + size + 8]);
            q += size + 8;
        }

        p += size + 8 + (size & 1);
    }

    write_form_header(&mut out, q);
    out.truncate(q);
    Ok(out)
}

/// Rewrites a DWVW-compressed AIFC `form` back into an uncompressed AIFC
/// FORM.
pub fn rewrite_decompress(form: &[u8], comm: &Comm) -> R<Vec<u8>> {
    let inend = form.len();
    let form_type: [u8; 4] = form[8..12].try_into().unwrap();
    let ct = comm.compression_type.unwrap_or([0; 4]);
    if form_type != *AIFC_TYPE || ct != *DWVW_COMPRESSION {
        return Err(DwvwError::UnsupportedCompression {
            found: ct,
            expected: DWVW_COMPRESSION,
        });
    }

    let outwordsize: u32 = 8 * (comm.wordsize as u32).div_ceil(8);
    let outmax = checked_outmax(
        form.len(),
        comm.nchannels as u64,
        comm.nsamples as u64,
        (outwordsize / 8) as u64,
    )?;
    let mut out = vec![0u8; outmax];

    let mut p = 12usize;
    let mut q = 12usize;
    while p + 8 <= inend {
        let id: [u8; 4] = form[p..p + 4].try_into().unwrap();
        let size = intio::read_int(&form[p + 4..], 32)? as i64;
        if size < 0 || p as i64 + 8 + size > inend as i64 {
            return Err(DwvwError::malformed(format!(
                "chunk at offset {p}: invalid size {size}"
            )));
        }
        let size = size as usize;

        if &id == COMM_ID {
            out[q..q + COMM_HEAD_BYTES].copy_from_slice(&form[p..p + COMM_HEAD_BYTES]);
            intio::put_be(outwordsize as i64, 16, &mut out[q + 14..])?;
            out[q + COMM_HEAD_BYTES..q + COMM_HEAD_BYTES + NONE_COMPRESSION_INFO.len()]
                .copy_from_slice(NONE_COMPRESSION_INFO);
            let new_size = 18 + NONE_COMPRESSION_INFO.len();
            intio::put_be(new_size as i64, 32, &mut out[q + 4..])?;
            q += COMM_HEAD_BYTES + NONE_COMPRESSION_INFO.len();
        } else if &id == SSND_ID {
            let ssnd = q;
            q += 16;
            let mut pp = p + 16;
            let chunk_end = p + 8 + size;
            let stride = comm.nchannels as u32;
            let out_bytes_per_channel = (outwordsize / 8) as usize;
            for i in 0..comm.nchannels as usize {
                let consumed = dwvw::decode_channel(
                    &form[pp..chunk_end],
                    comm.nsamples,
                    comm.wordsize as u32,
                    stride,
                    &mut out[q + i * out_bytes_per_channel..],
                    outwordsize,
                )?;
                pp += consumed;
                pp += (pp - p) & 1;
            }
            q += comm.nchannels as usize * comm.nsamples as usize * out_bytes_per_channel;
            out[ssnd..ssnd + 4].copy_from_slice(SSND_ID);
            let ssnd_size = (q - ssnd - 8) as i32;
            out[ssnd + 4..ssnd + 8].copy_from_slice(&ssnd_size.to_be_bytes());
            out[ssnd + 8..ssnd + 16].copy_from_slice(&[0u8; 8]);
        } else {
            out[q..q + size + 8].copy_from_slice(&form[p..p + size + 8]);
            q += size + 8;
        }

        p += size + 8 + (size & 1);
    }

    write_form_header(&mut out, q);
    out.truncate(q);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::AIFF_TYPE;

    fn even_chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(id);
        v.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        v.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            v.push(0);
        }
        v
    }

    fn sample_frames(frames: &[[i16; 2]]) -> Vec<u8> {
        let mut v = Vec::new();
        for frame in frames {
            for &s in frame {
                v.extend_from_slice(&s.to_be_bytes());
            }
        }
        v
    }

    fn build_aiff(frames: &[[i16; 2]], extra: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let nchannels = frames[0].len() as i16;
        let nsamples = frames.len() as u32;
        let mut comm_payload = Vec::new();
        comm_payload.extend_from_slice(&nchannels.to_be_bytes());
        comm_payload.extend_from_slice(&nsamples.to_be_bytes());
        comm_payload.extend_from_slice(&16i16.to_be_bytes());
        comm_payload.extend_from_slice(&[0u8; 10]);

        let mut ssnd_payload = Vec::new();
        ssnd_payload.extend_from_slice(&0u32.to_be_bytes());
        ssnd_payload.extend_from_slice(&0u32.to_be_bytes());
        ssnd_payload.extend_from_slice(&sample_frames(frames));

        let mut body = Vec::new();
        body.extend(even_chunk(b"COMM", &comm_payload));
        for (id, data) in extra {
            body.extend(even_chunk(id, data));
        }
        body.extend(even_chunk(b"SSND", &ssnd_payload));

        let mut form = Vec::new();
        form.extend_from_slice(b"FORM");
        form.extend_from_slice(&((4 + body.len()) as i32).to_be_bytes());
        form.extend_from_slice(b"AIFF");
        form.extend(body);
        form
    }

    #[test]
    fn compress_then_decompress_round_trips_samples() {
        let frames: Vec<[i16; 2]> = (0..40)
            .map(|i| [(i * 37 - 500) as i16, (300 - i * 11) as i16])
            .collect();
        let input = build_aiff(&frames, &[]);
        let comm = Comm::parse(&input, input.len(), AIFF_TYPE).unwrap();

        // Equal in/out width: DWVW is lossless here (Invariant 1), so the
        // round trip must reproduce every sample exactly.
        let compressed = rewrite_compress(&input, &comm, 16).unwrap();
        let comm2 = Comm::parse(&compressed, compressed.len(), AIFC_TYPE).unwrap();
        assert_eq!(comm2.compression_type, Some(*DWVW_COMPRESSION));

        let decompressed = rewrite_decompress(&compressed, &comm2).unwrap();
        let comm3 = Comm::parse(&decompressed, decompressed.len(), AIFC_TYPE).unwrap();
        assert_eq!(comm3.compression_type, Some(*NONE_COMPRESSION));
        assert_eq!(comm3.wordsize, 16);

        let ssnd = crate::chunk::find_unique_chunk(SSND_ID, &decompressed, 12, decompressed.len())
            .unwrap()
            .unwrap();
        let data = ssnd.data(&decompressed);
        let samples = &data[8..];
        for (i, frame) in frames.iter().enumerate() {
            for (ch, &expected) in frame.iter().enumerate() {
                let off = (i * 2 + ch) * 2;
                let got = i16::from_be_bytes([samples[off], samples[off + 1]]);
                assert_eq!(got, expected, "frame {i} channel {ch}");
            }
        }
    }

    #[test]
    fn pass_through_chunks_survive_byte_identical() {
        let frames: Vec<[i16; 2]> = vec![[0, 0], [1, -1], [-32768, 32767]];
        let input = build_aiff(&frames, &[(b"NAME", b"hello"), (b"AUTH", b"someone")]);
        let comm = Comm::parse(&input, input.len(), AIFF_TYPE).unwrap();
        let compressed = rewrite_compress(&input, &comm, 12).unwrap();

        let name = crate::chunk::find_unique_chunk(b"NAME", &compressed, 12, compressed.len())
            .unwrap()
            .unwrap();
        assert_eq!(name.data(&compressed), b"hello");
        let auth = crate::chunk::find_unique_chunk(b"AUTH", &compressed, 12, compressed.len())
            .unwrap()
            .unwrap();
        assert_eq!(auth.data(&compressed), b"someone");
    }

    #[test]
    fn rejects_compressed_input_other_than_none() {
        let frames: Vec<[i16; 2]> = vec![[0, 0]];
        let input = build_aiff(&frames, &[]);
        let comm = Comm::parse(&input, input.len(), AIFF_TYPE).unwrap();
        let compressed = rewrite_compress(&input, &comm, 12).unwrap();
        let comm2 = Comm::parse(&compressed, compressed.len(), AIFC_TYPE).unwrap();
        // compressed is DWVW; compressing it again must fail (input must be NONE).
        assert!(rewrite_compress(&compressed, &comm2, 12).is_err());
    }
}
