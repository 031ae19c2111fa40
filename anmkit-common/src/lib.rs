//! ANM archive formats and codecs for the anmkit toolchain.
//!
//! An ANM archive bundles image metadata, a sprite atlas, bytecoded
//! animation scripts and (usually) a texture payload per entry. This crate
//! provides everything between the bytes and the tools:
//!
//! - [`formats`] - on-disk structures (headers, sprites, THTX, instructions)
//! - [`opcodes`] - per-version opcode format tables
//! - [`archive`] - the typed model, decoder, serializer and defaults pass
//! - [`textspec`] - the spec text emitter and parser
//! - [`texture`] - pixel conversion and chain composition
//! - [`anmmap`] - opcode/register name map loading
//!
//! The CLI in `tools/anmkit-cli` is a thin front end over these modules.

pub mod anmmap;
pub mod archive;
pub mod context;
pub mod formats;
pub mod opcodes;
pub mod textspec;
pub mod texture;
pub mod value;
pub mod version;

pub use anmmap::AnmMap;
pub use archive::defaults::DEFAULTVAL;
pub use archive::write::resolve_symbols;
pub use archive::{Archive, Entry, Instr, LabelDef, OpInstr, Param, Script, SymbolTable};
pub use context::Context;
pub use formats::{EntryHeader, RawInstr, Sprite, TextureFormat, ThtxHeader};
pub use value::{ParamKind, Value};
