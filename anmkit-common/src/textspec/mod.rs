//! The textual spec: emitter and parser.
//!
//! The emitter renders an archive as spec text; the parser compiles spec
//! text back into the typed archive model plus its symbol tables. Spec text
//! produced by the emitter round-trips through the parser to a bit-identical
//! archive.

pub mod emit;
pub mod parse;

pub use emit::{dump_archive, make_unique_filename};
pub use parse::{ParseOutput, parse_spec};
