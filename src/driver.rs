//! Top-level compress/decompress driver: loads an input FORM file
//! (memory-mapped read-only), validates its container structure, hands
//! the validated FORM to [`crate::form`], and writes the result back out.

use crate::chunk;
use crate::comm::{Comm, AIFC_TYPE, AIFF_TYPE, FORM_ID};
use crate::form;
use crate::prelude::*;
use memmap2::Mmap;
use std::fs::File;

/// Default DWVW word size used by `compress` when the caller doesn't
/// override it.
pub const COMPRESSED_WORD_SIZE: u32 = 12;
/// Channel count this implementation is validated against; AIFF/AIFC
/// files carrying more channels than this are rejected up front.
pub const MAX_CHANNELS: i16 = 2;

fn validate_form(data: &[u8]) -> R<([u8; 4], Comm)> {
    if data.len() < 12 {
        return Err(DwvwError::malformed("file too small to be a FORM"));
    }
    if &data[0..4] != FORM_ID {
        return Err(DwvwError::malformed("missing FORM"));
    }
    let form_size = intio::read_int(&data[4..], 32)?;
    if form_size < 4 || form_size as usize + 8 != data.len() {
        return Err(DwvwError::malformed(format!(
            "invalid FORM size: {form_size}"
        )));
    }

    let form_type: [u8; 4] = data[8..12].try_into().unwrap();
    if form_type != *AIFF_TYPE && form_type != *AIFC_TYPE {
        return Err(DwvwError::malformed(format!(
            "invalid file type: {}",
            String::from_utf8_lossy(&form_type)
        )));
    }

    // A zero chunk id never matches; walking for it forces a full
    // size-validating pass over every chunk before we trust any of them.
    chunk::validate_all_chunks(data, 12, data.len())?;

    let comm = Comm::parse(data, data.len(), &form_type)?;
    if comm.nchannels > MAX_CHANNELS {
        return Err(DwvwError::out_of_range(format!(
            "too many channels: {} (max {MAX_CHANNELS})",
            comm.nchannels
        )));
    }

    Ok((form_type, comm))
}

fn load_mapped(path: &str) -> R<Mmap> {
    let file = File::open(path)?;
    let mapped = unsafe { Mmap::map(&file)? };
    Ok(mapped)
}

/// Compresses `input_path` (AIFF or uncompressed AIFC) to a DWVW AIFC at
/// `output_path`, using `word_size` bits per compressed sample
/// (`COMPRESSED_WORD_SIZE` if not given).
pub fn run_compress(input_path: &str, output_path: &str, word_size: Option<u32>) -> R<()> {
    let mapped = load_mapped(input_path)?;
    let (_, comm) = validate_form(&mapped)?;
    let outwordsize = word_size.unwrap_or(COMPRESSED_WORD_SIZE);

    log::debug!(
        "compress: {} channel(s), {} sample(s), {} -> {} bits",
        comm.nchannels,
        comm.nsamples,
        comm.wordsize,
        outwordsize
    );

    let out = form::rewrite_compress(&mapped, &comm, outwordsize)?;
    std::fs::write(output_path, out)?;
    log::info!("wrote {output_path}");
    Ok(())
}

/// Decompresses a DWVW AIFC at `input_path` back to an uncompressed AIFC
/// at `output_path`.
pub fn run_decompress(input_path: &str, output_path: &str) -> R<()> {
    let mapped = load_mapped(input_path)?;
    let (_, comm) = validate_form(&mapped)?;

    log::debug!(
        "decompress: {} channel(s), {} sample(s), {} bits",
        comm.nchannels,
        comm.nsamples,
        comm.wordsize
    );

    let out = form::rewrite_decompress(&mapped, &comm)?;
    std::fs::write(output_path, out)?;
    log::info!("wrote {output_path}");
    Ok(())
}
