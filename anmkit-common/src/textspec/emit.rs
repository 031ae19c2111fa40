//! Spec text emitter.
//!
//! Renders an archive as the textual spec the parser consumes. The output is
//! deterministic and diff-friendly: fields appear in a fixed order, defaults
//! are elided, and sprite/script ids only show up when they break the
//! implied sequence.

use std::io::{self, Write};

use crate::archive::{Archive, Instr, OpInstr, Param};
use crate::context::Context;
use crate::value::{ParamKind, Value};
use crate::version::is_th19_or_newer;

/// Identifiers can't contain a minus sign; negative numbers embedded in
/// generated names use `M` instead.
fn replace_minus(s: String) -> String {
    s.replace('-', "M")
}

/// Floats print bare when integral (`256`), with their fraction otherwise.
fn coord(v: f32) -> String {
    format!("{v}")
}

fn float_literal(v: f32) -> String {
    format!("{v}f")
}

fn literal(value: &Value) -> String {
    match value {
        Value::Int(v) => format!("{v}"),
        Value::Short(v) => format!("{v}"),
        Value::Float(v) => float_literal(*v),
        Value::Name(name) => name.clone(),
    }
}

fn stringify_param(param: &Param, archive: &Archive, ctx: &Context) -> String {
    let dest = match param.kind {
        ParamKind::Offset => match &param.value {
            Value::Int(v) => replace_minus(format!("offset{v}")),
            other => literal(other),
        },
        ParamKind::SpriteRef => match &param.value {
            // Sprite -1 is sometimes used to mean "no sprite".
            Value::Int(v) if *v < 0 => format!("{v}"),
            Value::Int(v) => format!("sprite{v}"),
            other => literal(other),
        },
        ParamKind::ScriptRef => match &param.value {
            Value::Int(v) if archive.is_valid_script_index(*v) => {
                replace_minus(format!("script{v}"))
            }
            other => literal(other),
        },
        _ => literal(&param.value),
    };

    if param.is_var {
        let named = param
            .value
            .as_reg_id()
            .and_then(|id| ctx.map.gvar_names.get(&id));
        match named {
            Some(name) => {
                let sigil = if matches!(param.value, Value::Float(_)) {
                    '%'
                } else {
                    '$'
                };
                format!("{sigil}{name}")
            }
            None => format!("[{dest}]"),
        }
    } else {
        dest
    }
}

fn write_instr<W: Write>(
    out: &mut W,
    op: &OpInstr,
    archive: &Archive,
    ctx: &Context,
) -> io::Result<()> {
    if ctx.print_offsets {
        write!(out, " /* {:5x} (+{:5x}) */ ", op.address, op.offset)?;
    }
    match ctx.map.ins_names.get(&i32::from(op.opcode)) {
        Some(name) => write!(out, "{name}(")?,
        None => write!(out, "ins_{}(", op.opcode)?,
    }
    for (i, param) in op.params.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}", stringify_param(param, archive, ctx))?;
    }
    writeln!(out, ");")
}

/// Synthesize a per-entry extraction filename: `<stem>@<anm-stem>@<index><ext>`.
pub fn make_unique_filename(name: &str, anm_name: &str, index: usize) -> String {
    let base_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let stem_end = name[base_start..]
        .rfind('.')
        .map_or(name.len(), |i| base_start + i);

    let anm_base_start = anm_name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let anm_base = &anm_name[anm_base_start..];
    let anm_stem = &anm_base[..anm_base.rfind('.').unwrap_or(anm_base.len())];

    format!(
        "{}@{}@{}{}",
        &name[..stem_end],
        anm_stem,
        index,
        &name[stem_end..]
    )
}

/// Render the whole archive as spec text.
///
/// `archive_filename` is only used to synthesize unique extraction filenames.
pub fn dump_archive<W: Write>(
    out: &mut W,
    archive: &Archive,
    game: u32,
    archive_filename: &str,
    ctx: &Context,
) -> io::Result<()> {
    let th19 = is_th19_or_newer(game);
    let mut prev_sprite_id: i64 = -1;
    let mut prev_script_id: i64 = -1;

    for (entry_num, entry) in archive.entries.iter().enumerate() {
        let header = &entry.header;
        writeln!(out, "entry entry{entry_num} {{")?;
        writeln!(out, "    version: {},", header.version)?;
        writeln!(out, "    name: \"{}\",", entry.name)?;
        if ctx.unique_filenames {
            let filename = make_unique_filename(&entry.name, archive_filename, entry_num);
            writeln!(out, "    filename: \"{filename}\",")?;
        }
        if let Some(name2) = &entry.name2 {
            writeln!(out, "    name2: \"{name2}\",")?;
        }
        writeln!(out, "    format: {},", header.format)?;
        writeln!(out, "    width: {},", header.w)?;
        writeln!(out, "    height: {},", header.h)?;
        if header.x != 0 {
            writeln!(out, "    xOffset: {},", header.x)?;
        }
        if entry.name2.is_none() && header.y != 0 {
            writeln!(out, "    yOffset: {},", header.y)?;
        }
        if header.version < 7 {
            writeln!(out, "    colorKey: 0x{:08x},", header.colorkey)?;
        }
        if header.version >= 1 {
            writeln!(out, "    memoryPriority: {},", header.memory_priority)?;
        }
        if header.version >= 8 {
            writeln!(out, "    lowResScale: {},", header.low_res_scale)?;
        }
        if th19 && header.jpeg_quality != 0 {
            writeln!(out, "    jpeg_quality: {},", header.jpeg_quality)?;
        }
        writeln!(out, "    hasData: {},", header.has_data)?;
        if header.has_data != 0 {
            if let Some(thtx) = &entry.thtx {
                if !th19 {
                    writeln!(out, "    THTXSize: {},", thtx.size)?;
                }
                writeln!(out, "    THTXFormat: {},", thtx.format)?;
                writeln!(out, "    THTXWidth: {},", thtx.w)?;
                writeln!(out, "    THTXHeight: {},", thtx.h)?;
                writeln!(out, "    THTXZero: {},", thtx.zero)?;
            }
        }
        if th19 {
            writeln!(out, "    w_max: {},", header.w_max)?;
            writeln!(out, "    h_max: {},", header.h_max)?;
        }

        writeln!(out, "    sprites: {{")?;
        for (i, sprite) in entry.sprites.iter().enumerate() {
            write!(
                out,
                "        sprite{}: {{ x: {}, y: {}, w: {}, h: {}",
                sprite.id,
                coord(sprite.x),
                coord(sprite.y),
                coord(sprite.w),
                coord(sprite.h)
            )?;
            if prev_sprite_id + 1 != i64::from(sprite.id) {
                write!(out, ", id: {}", sprite.id)?;
            }
            if th19 {
                for (slot, (value, default)) in sprite
                    .unk
                    .iter()
                    .zip(crate::formats::Sprite::UNK_DEFAULTS)
                    .enumerate()
                {
                    if *value != default {
                        write!(out, ", th19_unk{slot}: {}", coord(*value))?;
                    }
                }
            }
            write!(out, " }}")?;
            if i + 1 != entry.sprites.len() {
                write!(out, ",")?;
            }
            writeln!(out)?;
            prev_sprite_id = i64::from(sprite.id);
        }
        writeln!(out, "    }}\n}}\n")?;

        for script in &entry.scripts {
            let attrib = if script.no_sentinel {
                " [[no_sentinel]]"
            } else {
                ""
            };
            // The name uses the archive-wide index because that is what
            // script references encode; the record id is preserved
            // separately when it breaks the sequence.
            if i64::from(script.id) - 1 != prev_script_id {
                writeln!(
                    out,
                    "script{attrib} {} script{} {{",
                    script.id, script.real_index
                )?;
            } else {
                writeln!(out, "script{attrib} script{} {{", script.real_index)?;
            }
            prev_script_id = i64::from(script.id);

            let mut time: i32 = 0;
            let mut negative_time = false;
            for instr in &script.instrs {
                match instr {
                    Instr::Op(op) => {
                        write!(out, "    ")?;
                        write_instr(out, op, archive, ctx)?;
                    }
                    Instr::TimeMarker { time: t } => {
                        let t = i32::from(*t);
                        if t < 0 {
                            negative_time = true;
                        }
                        if negative_time {
                            writeln!(out, "{t}:")?;
                        } else {
                            writeln!(out, "+{}: // {}", t - time, t)?;
                        }
                        time = t;
                        // The instruction following a negative marker also
                        // renders in absolute form.
                        if t >= 0 {
                            negative_time = false;
                        }
                    }
                    Instr::Label { offset } => {
                        writeln!(out, "offset{offset}:")?;
                    }
                }
            }

            writeln!(out, "}}\n")?;
        }

        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_filename() {
        assert_eq!(
            make_unique_filename("dir/face.png", "data/stage1.anm", 3),
            "dir/face@stage1@3.png"
        );
        assert_eq!(
            make_unique_filename("noext", "stage1.anm", 0),
            "noext@stage1@0"
        );
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literal(1.0), "1f");
        assert_eq!(float_literal(-0.5), "-0.5f");
        assert_eq!(coord(256.0), "256");
        assert_eq!(coord(0.5), "0.5");
    }

    #[test]
    fn test_minus_replacement() {
        assert_eq!(replace_minus("offset-4".into()), "offsetM4");
    }
}
