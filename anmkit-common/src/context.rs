//! Toolchain context: option flags plus the loaded name maps.
//!
//! Built once by the front end before any decoding or encoding starts and
//! treated as read-only from then on.

use crate::anmmap::AnmMap;

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub map: AnmMap,
    /// Keep going past recoverable errors (unresolved references).
    pub force: bool,
    /// Prefix each dumped instruction with its file and script offsets.
    pub print_offsets: bool,
    /// Extract every entry to its own file instead of composing chains.
    pub unique_filenames: bool,
    /// Ignore entry x/y offsets when composing or extracting.
    pub no_offset_border: bool,
    pub verbose: u8,
}

impl Context {
    pub fn new(map: AnmMap) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }
}
