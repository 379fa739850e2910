//! Lossless DWVW (Delta With Variable Word Width) audio codec for AIFF
//! and AIFC containers.
//!
//! [`driver`] is the entry point most callers want: it loads a FORM,
//! validates it, and dispatches to [`form::rewrite_compress`] or
//! [`form::rewrite_decompress`]. The lower modules ([`intio`], [`bits`],
//! [`dwvw`], [`chunk`], [`comm`]) are exposed for testing and for
//! embedding the codec in a larger container pipeline.

pub mod bits;
pub mod chunk;
pub mod comm;
pub mod driver;
pub mod dwvw;
pub mod error;
pub mod form;
pub mod intio;
mod prelude;

pub use driver::{run_compress, run_decompress, COMPRESSED_WORD_SIZE, MAX_CHANNELS};
pub use error::{DwvwError, R};
