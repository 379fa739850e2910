pub use crate::*;
pub use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
pub use error::{DwvwError, R};
pub use std::io::Cursor;
