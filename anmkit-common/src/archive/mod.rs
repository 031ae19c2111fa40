//! In-memory archive model.
//!
//! An archive is an ordered sequence of entries chained by byte offsets.
//! Entries sharing a name form a *chain*: together they describe one
//! composite image. Scripts carry a typed instruction list in which labels
//! and time markers appear as pseudo-instructions, so the spec text falls
//! out of a plain walk over the list.

pub mod defaults;
pub mod labels;
pub mod read;
pub mod write;

#[cfg(test)]
mod tests;

use hashbrown::HashMap;

use crate::formats::{EntryHeader, Sprite, ThtxHeader};
use crate::formats::instruction;
use crate::value::{ParamKind, Value};

/// A whole ANM archive.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    pub entries: Vec<Entry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some script in the archive has this `real_index`. Script
    /// references only render symbolically when they resolve.
    pub fn is_valid_script_index(&self, index: i32) -> bool {
        self.entries
            .iter()
            .flat_map(|e| &e.scripts)
            .any(|s| s.real_index == index)
    }

    /// Entry indices grouped by shared name, in first-appearance order.
    pub fn name_chains(&self) -> Vec<Vec<usize>> {
        let mut order: Vec<Vec<usize>> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let slot = by_name.get(entry.name.as_str()).copied();
            match slot {
                Some(slot) => order[slot].push(i),
                None => {
                    by_name.insert(entry.name.as_str(), order.len());
                    order.push(vec![i]);
                }
            }
        }
        order
    }

    /// The chain of entry indices sharing `name`, in archive order.
    pub fn chain_for_name(&self, name: &str) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .map(|(i, _)| i)
            .collect()
    }
}

/// One image+scripts bundle within an archive.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub header: EntryHeader,
    /// Entry name; starts with `@` exactly when the entry carries no texture.
    pub name: String,
    /// Secondary name, stored through the header's `y` slot in version 0.
    pub name2: Option<String>,
    /// Image path override used by the compile-side defaults pass.
    pub filename: Option<String>,
    pub sprites: Vec<Sprite>,
    pub scripts: Vec<Script>,
    pub thtx: Option<ThtxHeader>,
    pub data: Option<Vec<u8>>,
    /// Absolute position of this entry in the source file (decode side only;
    /// in-place texture replacement seeks relative to it).
    pub base_offset: u64,
}

impl Entry {
    /// The image file the texture passes should read for this entry.
    pub fn image_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.name)
    }
}

/// One animation script.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Position of this script across the whole archive in decode order;
    /// the number `N`-typed parameters reference.
    pub real_index: i32,
    /// Author-assigned id from the offset record, preserved verbatim.
    pub id: i32,
    /// Byte offset of the instruction stream within the entry.
    pub offset: u32,
    /// Set when the on-disk stream ended at a boundary instead of a sentinel.
    pub no_sentinel: bool,
    pub instrs: Vec<Instr>,
    /// Label definitions collected by the spec parser (compile side).
    pub labels: Vec<LabelDef>,
}

impl Script {
    pub fn find_label(&self, name: &str) -> Option<&LabelDef> {
        self.labels.iter().find(|l| l.name == name)
    }
}

/// A named position within a script's byte stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDef {
    pub name: String,
    pub offset: u32,
    pub time: i32,
}

/// A typed instruction, or one of the two pseudo-instructions that carry
/// control-flow structure in the text form.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Op(OpInstr),
    /// Inserted whenever the decoded time changed.
    TimeMarker { time: i16 },
    /// Inserted at every byte offset some jump parameter targets.
    Label { offset: u32 },
}

impl Instr {
    pub fn as_op(&self) -> Option<&OpInstr> {
        match self {
            Instr::Op(op) => Some(op),
            _ => None,
        }
    }
}

/// A real opcode with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OpInstr {
    pub opcode: u16,
    pub time: i16,
    /// Byte offset within the script's instruction stream.
    pub offset: u32,
    /// Wire size, fixed header included.
    pub size: u32,
    pub param_mask: u32,
    pub params: Vec<Param>,
    /// Absolute position in the source buffer (diagnostic printing only).
    pub address: u64,
}

impl OpInstr {
    /// Wire size of an instruction with these parameter kinds.
    pub fn compute_size(header_version: u32, kinds: &[ParamKind]) -> u32 {
        let params: usize = kinds.iter().map(|k| k.wire_size()).sum();
        (instruction::header_size(header_version) + params) as u32
    }
}

/// One instruction parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    /// From the instruction's `param_mask`: the value names a register
    /// rather than a literal.
    pub is_var: bool,
    pub value: Value,
}

impl Param {
    pub fn new(kind: ParamKind, value: Value) -> Self {
        Self {
            kind,
            is_var: false,
            value,
        }
    }
}

/// Sprite and script name tables built while parsing a spec file and
/// consulted during symbol resolution. Definition order is preserved for the
/// symbol-table dump.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    sprites: Vec<(String, i32)>,
    scripts: Vec<(String, i32)>,
    sprite_ids: HashMap<String, i32>,
    script_ids: HashMap<String, i32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sprite name. Returns false when the name is already taken.
    pub fn define_sprite(&mut self, name: &str, id: i32) -> bool {
        if self.sprite_ids.contains_key(name) {
            return false;
        }
        self.sprite_ids.insert(name.to_owned(), id);
        self.sprites.push((name.to_owned(), id));
        true
    }

    /// Record a script name. Returns false when the name is already taken.
    pub fn define_script(&mut self, name: &str, index: i32) -> bool {
        if self.script_ids.contains_key(name) {
            return false;
        }
        self.script_ids.insert(name.to_owned(), index);
        self.scripts.push((name.to_owned(), index));
        true
    }

    pub fn sprite(&self, name: &str) -> Option<i32> {
        self.sprite_ids.get(name).copied()
    }

    pub fn script(&self, name: &str) -> Option<i32> {
        self.script_ids.get(name).copied()
    }

    pub fn sprites(&self) -> &[(String, i32)] {
        &self.sprites
    }

    pub fn scripts(&self) -> &[(String, i32)] {
        &self.scripts
    }
}
