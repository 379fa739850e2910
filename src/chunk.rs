//! AIFF/AIFC chunk walking: locating chunks by id and validating chunk
//! sizes against the bounds of the enclosing FORM, expressed as
//! slice-bounded scans rather than raw pointer walks.

use crate::prelude::*;

/// One chunk's header plus its payload range within the enclosing FORM.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRef {
    pub id: [u8; 4],
    pub size: i32,
    /// Byte offset of the payload (just past the 8-byte header).
    pub data_start: usize,
}

impl ChunkRef {
    pub fn data<'a>(&self, form: &'a [u8]) -> &'a [u8] {
        &form[self.data_start..self.data_start + self.size as usize]
    }

    /// Offset of the byte one past this chunk's payload, including the
    /// pad byte if `size` is odd.
    pub fn next_offset(&self) -> usize {
        self.data_start + self.size as usize + (self.size as usize & 1)
    }
}

/// Scans `form[start..end]` for the first chunk whose id matches, or
/// `None` if no such chunk exists before `end`. Every chunk between
/// `start` and the match (or `end`) is validated: a negative or
/// out-of-bounds size is fatal.
pub fn find_chunk(id: &[u8; 4], form: &[u8], start: usize, end: usize) -> R<Option<ChunkRef>> {
    let mut p = start;
    while p + 8 <= end {
        let size = intio::read_int(&form[p + 4..], 32)? as i64;
        if size < 0 || p as i64 + 8 + size > end as i64 {
            return Err(DwvwError::malformed(format!(
                "chunk at offset {p}: invalid size {size}"
            )));
        }
        let size = size as i32;
        let chunk_id: [u8; 4] = form[p..p + 4].try_into().unwrap();
        let chunk = ChunkRef {
            id: chunk_id,
            size,
            data_start: p + 8,
        };
        if &chunk_id == id {
            return Ok(Some(chunk));
        }
        p = chunk.next_offset();
    }
    Ok(None)
}

/// Like [`find_chunk`], but fails if more than one chunk with `id` exists
/// in the range.
pub fn find_unique_chunk(id: &[u8; 4], form: &[u8], start: usize, end: usize) -> R<Option<ChunkRef>> {
    let Some(chunk) = find_chunk(id, form, start, end)? else {
        return Ok(None);
    };
    if find_chunk(id, form, chunk.next_offset(), end)?.is_some() {
        return Err(DwvwError::malformed(format!(
            "duplicate {} chunk",
            String::from_utf8_lossy(id)
        )));
    }
    Ok(Some(chunk))
}

/// Walks every chunk in `form[start..end]`, validating sizes, without
/// looking for a specific id. Used at load time to force a full
/// size-walk over the whole FORM before any chunk is trusted.
pub fn validate_all_chunks(form: &[u8], start: usize, end: usize) -> R<()> {
    find_chunk(&[0, 0, 0, 0], form, start, end)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(id);
        v.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        v.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            v.push(0);
        }
        v
    }

    #[test]
    fn finds_chunk_by_id() {
        let mut form = Vec::new();
        form.extend(chunk(b"NAME", b"hi"));
        form.extend(chunk(b"COMM", &[1, 2, 3]));
        let found = find_chunk(b"COMM", &form, 0, form.len()).unwrap().unwrap();
        assert_eq!(found.size, 3);
        assert_eq!(found.data(&form), &[1, 2, 3]);
    }

    #[test]
    fn odd_size_pads_to_even_next_offset() {
        let mut form = Vec::new();
        form.extend(chunk(b"NAME", b"odd")); // size 3, one pad byte
        form.extend(chunk(b"AUTH", b"x"));
        let name = find_chunk(b"NAME", &form, 0, form.len()).unwrap().unwrap();
        assert_eq!(name.next_offset(), 8 + 3 + 1);
        let auth = find_chunk(b"AUTH", &form, 0, form.len()).unwrap().unwrap();
        assert_eq!(auth.size, 1);
    }

    #[test]
    fn detects_duplicate() {
        let mut form = Vec::new();
        form.extend(chunk(b"COMM", &[1]));
        form.extend(chunk(b"COMM", &[2]));
        let err = find_unique_chunk(b"COMM", &form, 0, form.len()).unwrap_err();
        assert!(matches!(err, DwvwError::MalformedContainer(_)));
    }

    #[test]
    fn missing_chunk_is_none() {
        let form = chunk(b"NAME", b"hi");
        assert!(find_chunk(b"COMM", &form, 0, form.len()).unwrap().is_none());
    }

    #[test]
    fn negative_size_is_malformed() {
        let mut form = Vec::new();
        form.extend_from_slice(b"BADC");
        form.extend_from_slice(&(-1i32).to_be_bytes());
        let err = find_chunk(b"COMM", &form, 0, form.len()).unwrap_err();
        assert!(matches!(err, DwvwError::MalformedContainer(_)));
    }

    #[test]
    fn size_past_end_is_malformed() {
        let mut form = Vec::new();
        form.extend_from_slice(b"COMM");
        form.extend_from_slice(&100i32.to_be_bytes());
        let err = find_chunk(b"COMM", &form, 0, form.len()).unwrap_err();
        assert!(matches!(err, DwvwError::MalformedContainer(_)));
    }
}
