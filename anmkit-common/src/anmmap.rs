//! Opcode and register name maps.
//!
//! A map file is line-oriented. Directive lines starting with `!` select the
//! table that following entries land in; entry lines are `<id> <identifier>`
//! pairs. `#` starts a comment. Unknown directives switch to an ignored
//! section, and malformed entry lines are logged and skipped so one typo
//! does not take the whole map down.
//!
//! ```text
//! !ins_names
//! 1 delete
//! 5 jmp
//! !gvar_names
//! 10000 i0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    InsNames,
    GvarNames,
    Ignored,
}

/// Loaded mnemonic and variable name tables, with reverse lookups for the
/// spec parser.
#[derive(Debug, Clone, Default)]
pub struct AnmMap {
    pub ins_names: HashMap<i32, String>,
    pub gvar_names: HashMap<i32, String>,
    pub ins_ids: HashMap<String, i32>,
    pub gvar_ids: HashMap<String, i32>,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AnmMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one map file into the tables. Later files win on conflicts.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not open {} for reading", path.display()))?;
        self.load_str(&text, &path.display().to_string());
        Ok(())
    }

    /// Parse map text. `source` only labels diagnostics.
    pub fn load_str(&mut self, text: &str, source: &str) {
        let mut section = Section::Ignored;
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = match raw_line.split_once('#') {
                Some((before, _)) => before.trim(),
                None => raw_line.trim(),
            };
            if line.is_empty() {
                continue;
            }

            if let Some(directive) = line.strip_prefix('!') {
                section = match directive {
                    "ins_names" => Section::InsNames,
                    "gvar_names" => Section::GvarNames,
                    other => {
                        tracing::debug!(source, line = lineno + 1, "ignoring section !{other}");
                        Section::Ignored
                    }
                };
                continue;
            }
            if section == Section::Ignored {
                continue;
            }

            let mut fields = line.split_whitespace();
            let entry = fields
                .next()
                .zip(fields.next())
                .filter(|_| fields.next().is_none());
            let parsed = entry.and_then(|(id, name)| {
                id.parse::<i32>()
                    .ok()
                    .filter(|_| is_identifier(name))
                    .map(|id| (id, name))
            });
            let Some((id, name)) = parsed else {
                tracing::warn!(source, line = lineno + 1, "skipping malformed map line: {line}");
                continue;
            };

            let (names, ids) = match section {
                Section::InsNames => (&mut self.ins_names, &mut self.ins_ids),
                Section::GvarNames => (&mut self.gvar_names, &mut self.gvar_ids),
                Section::Ignored => unreachable!(),
            };
            names.insert(id, name.to_owned());
            ids.insert(name.to_owned(), id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_map() {
        let mut map = AnmMap::new();
        map.load_str(
            "!ins_names\n1 delete\n5 jmp\n!gvar_names\n10000 i0\n10004 f0\n",
            "test",
        );
        assert_eq!(map.ins_names.get(&5).map(String::as_str), Some("jmp"));
        assert_eq!(map.ins_ids.get("delete"), Some(&1));
        assert_eq!(map.gvar_names.get(&10004).map(String::as_str), Some("f0"));
        assert_eq!(map.gvar_ids.get("i0"), Some(&10000));
    }

    #[test]
    fn test_comments_and_blanks() {
        let mut map = AnmMap::new();
        map.load_str("# header\n\n!ins_names\n3 sprite # set sprite\n", "test");
        assert_eq!(map.ins_names.get(&3).map(String::as_str), Some("sprite"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut map = AnmMap::new();
        map.load_str(
            "!ins_names\nnot-a-number jmp\n5\n5 two words here\n7 ok\n",
            "test",
        );
        assert_eq!(map.ins_names.len(), 1);
        assert_eq!(map.ins_names.get(&7).map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_entries_outside_sections_are_ignored() {
        let mut map = AnmMap::new();
        map.load_str("1 stray\n!ins_names\n2 kept\n!ins_signatures\n3 skipped\n", "test");
        assert_eq!(map.ins_names.len(), 1);
        assert!(map.ins_names.contains_key(&2));
    }

    #[test]
    fn test_later_files_win() {
        let mut map = AnmMap::new();
        map.load_str("!ins_names\n1 old\n", "a");
        map.load_str("!ins_names\n1 new\n", "b");
        assert_eq!(map.ins_names.get(&1).map(String::as_str), Some("new"));
    }
}
