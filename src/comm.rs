//! COMM (common chunk) parsing: extracts channel count, frame count,
//! sample word size, and (for AIFC) the compression type identifier.

use crate::chunk::{find_unique_chunk, ChunkRef};
use crate::prelude::*;

pub const COMM_ID: &[u8; 4] = b"COMM";
pub const SSND_ID: &[u8; 4] = b"SSND";
pub const FORM_ID: &[u8; 4] = b"FORM";
pub const AIFF_TYPE: &[u8; 4] = b"AIFF";
pub const AIFC_TYPE: &[u8; 4] = b"AIFC";
pub const NONE_COMPRESSION: &[u8; 4] = b"NONE";
pub const DWVW_COMPRESSION: &[u8; 4] = b"DWVW";

/// The semantic fields of a COMM chunk that the codec and FORM rewriter
/// care about.
#[derive(Debug, Clone)]
pub struct Comm {
    pub chunk: ChunkRef,
    pub nchannels: i16,
    pub nsamples: u32,
    pub wordsize: i16,
    pub compression_type: Option<[u8; 4]>,
}

impl Comm {
    /// Locates the unique COMM chunk in `form[12..end]` and parses it.
    /// `form_type` is `AIFF` or `AIFC` as read from the FORM header, and
    /// determines the minimum valid chunk size (18 for AIFF, 22 for
    /// AIFC).
    pub fn parse(form: &[u8], end: usize, form_type: &[u8; 4]) -> R<Comm> {
        let chunk = find_unique_chunk(COMM_ID, form, 12, end)?
            .ok_or_else(|| DwvwError::malformed("cannot find COMM chunk"))?;

        let min_size = if form_type == AIFC_TYPE { 22 } else { 18 };
        if (chunk.size as usize) < min_size {
            return Err(DwvwError::malformed(format!(
                "COMM chunk too small: {}",
                chunk.size
            )));
        }

        let data = chunk.data(form);
        let nchannels = intio::read_int(&data[0..], 16)? as i16;
        if nchannels < 1 {
            return Err(DwvwError::out_of_range(format!(
                "invalid number of channels: {nchannels}"
            )));
        }
        let nsamples = intio::read_uint(&data[2..], 32)? as u32;
        let wordsize = intio::read_int(&data[6..], 16)? as i16;
        if !(1..=32).contains(&wordsize) {
            return Err(DwvwError::out_of_range(format!(
                "invalid wordsize: {wordsize}"
            )));
        }

        let compression_type = if chunk.size as usize >= 22 {
            Some(data[18..22].try_into().unwrap())
        } else {
            None
        };

        Ok(Comm {
            chunk,
            nchannels,
            nsamples,
            wordsize,
            compression_type,
        })
    }
}
