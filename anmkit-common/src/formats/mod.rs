//! ANM on-disk structures.
//!
//! Everything in an archive is little-endian. Each module documents its
//! struct's byte layout; the archive-level chaining of these structures lives
//! in [`crate::archive`].

pub mod header;
pub mod instruction;
pub mod sprite;
pub mod thtx;

pub use header::EntryHeader;
pub use instruction::{RawInstr, ReadInstr};
pub use sprite::Sprite;
pub use thtx::{TextureFormat, ThtxHeader, THTX_MAGIC};
