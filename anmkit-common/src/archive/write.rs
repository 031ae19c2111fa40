//! Archive serialization: resolve symbols, lay out entries, emit bytes.

use anyhow::{Context as _, Result, bail};

use crate::formats::header::EntryHeader;
use crate::formats::instruction::{self, RawInstr};
use crate::formats::sprite::Sprite;
use crate::value::{ParamKind, Value};
use crate::version::is_th19_or_newer;

use super::{Archive, Instr, OpInstr, Script, SymbolTable};

/// Resolve every symbolic parameter value to its integer form.
///
/// Labels resolve within their own script; sprite and script names resolve
/// through the parser's symbol tables. Each missing symbol is reported and
/// encoded as zero; unless `force` is set the archive is rejected once the
/// walk completes, so nothing partially resolved ever reaches disk.
pub fn resolve_symbols(archive: &mut Archive, symbols: &SymbolTable, force: bool) -> Result<()> {
    let mut unresolved = 0usize;
    for entry in &mut archive.entries {
        for script in &mut entry.scripts {
            let labels = std::mem::take(&mut script.labels);
            for instr in &mut script.instrs {
                let Instr::Op(op) = instr else { continue };
                for param in &mut op.params {
                    let Value::Name(name) = &param.value else {
                        continue;
                    };
                    let resolved = match param.kind {
                        ParamKind::Offset => labels
                            .iter()
                            .find(|l| l.name == *name)
                            .map(|l| l.offset as i32),
                        ParamKind::Time => labels
                            .iter()
                            .find(|l| l.name == *name)
                            .map(|l| l.time),
                        ParamKind::SpriteRef => symbols.sprite(name),
                        ParamKind::ScriptRef => symbols.script(name),
                        _ => None,
                    };
                    match resolved {
                        Some(v) => param.value = Value::Int(v),
                        None => {
                            let what = match param.kind {
                                ParamKind::Offset | ParamKind::Time => "label",
                                ParamKind::SpriteRef => "sprite",
                                ParamKind::ScriptRef => "script",
                                _ => "symbol",
                            };
                            tracing::error!("{what} not found: {name}");
                            param.value = Value::Int(0);
                            unresolved += 1;
                        }
                    }
                }
            }
            script.labels = labels;
        }
    }
    if unresolved > 0 {
        if force {
            tracing::warn!(unresolved, "continuing past unresolved references");
        } else {
            bail!("{unresolved} unresolved reference(s)");
        }
    }
    Ok(())
}

/// Lower a typed instruction to its wire form. The parameter mask is rebuilt
/// from the per-parameter variable flags.
fn lower_instr(op: &OpInstr) -> Result<RawInstr> {
    let mut param_mask: u16 = 0;
    let mut payload = Vec::new();
    for (i, param) in op.params.iter().enumerate() {
        if param.is_var && i < 16 {
            param_mask |= 1 << i;
        }
        param
            .value
            .write(&mut payload)
            .with_context(|| format!("ins_{} parameter {i}", op.opcode))?;
    }
    Ok(RawInstr {
        opcode: op.opcode,
        time: op.time,
        param_mask,
        payload,
    })
}

/// Append a name, NUL-padded to the next 16-byte boundary (always at least
/// one padding byte, so the string stays terminated).
fn write_padded_name(buf: &mut Vec<u8>, name: &str) {
    buf.extend_from_slice(name.as_bytes());
    let pad = 16 - name.len() % 16;
    buf.resize(buf.len() + pad, 0);
}

fn write_script_body(
    buf: &mut Vec<u8>,
    script: &Script,
    header_version: u32,
) -> Result<()> {
    for instr in &script.instrs {
        let Instr::Op(op) = instr else { continue };
        let raw = lower_instr(op)?;
        instruction::write_raw_instr(buf, &raw, header_version);
    }
    if !script.no_sentinel {
        instruction::write_sentinel(buf, header_version);
    }
    Ok(())
}

impl Archive {
    /// Serialize the archive. Offsets in each entry header and script record
    /// are recomputed from the actual layout, which is why this takes the
    /// archive mutably.
    pub fn write_to_bytes(&mut self, game: u32) -> Result<Vec<u8>> {
        let extended_sprites = is_th19_or_newer(game);
        let sprite_stride = Sprite::stride(extended_sprites);
        let entry_count = self.entries.len();
        let mut buf = Vec::new();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let base = buf.len();
            let header_version = entry.header.version;
            let sprite_count = entry.sprites.len();
            let script_count = entry.scripts.len();

            // Header, sprite offset table and script records are patched in
            // after the variable-size tail is laid out.
            let tables =
                EntryHeader::SIZE + sprite_count * 4 + script_count * 8;
            buf.resize(base + tables, 0);

            entry.header.name_offset = (buf.len() - base) as u32;
            write_padded_name(&mut buf, &entry.name);

            if header_version == 0 {
                if let Some(name2) = &entry.name2 {
                    entry.header.y = (buf.len() - base) as u32;
                    write_padded_name(&mut buf, name2);
                }
            }

            let sprite_base = buf.len() - base;
            for sprite in &entry.sprites {
                sprite.write(&mut buf, extended_sprites);
            }

            for script in entry.scripts.iter_mut() {
                script.offset = (buf.len() - base) as u32;
                write_script_body(&mut buf, script, header_version).with_context(|| {
                    format!("entry {index}: script {}", script.real_index)
                })?;
            }

            if entry.header.has_data != 0 {
                entry.header.thtx_offset = (buf.len() - base) as u32;
                let thtx = entry
                    .thtx
                    .as_ref()
                    .with_context(|| format!("entry {index}: has_data without a THTX header"))?;
                let data = entry
                    .data
                    .as_ref()
                    .with_context(|| format!("entry {index}: has_data without a texture payload"))?;
                if data.len() != thtx.size as usize {
                    bail!(
                        "entry {index}: texture payload is {} bytes but THTX claims {}",
                        data.len(),
                        thtx.size
                    );
                }
                buf.extend_from_slice(&thtx.to_bytes());
                buf.extend_from_slice(data);
            }

            entry.header.sprites = sprite_count as u32;
            entry.header.scripts = script_count as u32;
            entry.header.next_offset = if index + 1 == entry_count {
                0
            } else {
                (buf.len() - base) as u32
            };

            let header_bytes = if header_version >= 7 {
                entry.header.to_bytes_reordered()
            } else {
                entry.header.to_bytes()
            };
            buf[base..base + EntryHeader::SIZE].copy_from_slice(&header_bytes);

            let mut patch = base + EntryHeader::SIZE;
            for s in 0..sprite_count {
                let off = (sprite_base + s * sprite_stride) as u32;
                buf[patch..patch + 4].copy_from_slice(&off.to_le_bytes());
                patch += 4;
            }
            for script in &entry.scripts {
                buf[patch..patch + 4].copy_from_slice(&script.id.to_le_bytes());
                buf[patch + 4..patch + 8].copy_from_slice(&script.offset.to_le_bytes());
                patch += 8;
            }
        }

        Ok(buf)
    }
}
