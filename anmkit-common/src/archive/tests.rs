//! End-to-end archive tests: decode/encode round trips, the label and time
//! passes, and the spec-text cycle.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::archive::write::resolve_symbols;
use crate::archive::{Archive, Entry, Instr, OpInstr, Param, Script};
use crate::context::Context;
use crate::formats::{EntryHeader, Sprite, ThtxHeader};
use crate::textspec::{dump_archive, parse_spec};
use crate::texture::{extract_chain, replace_chain};
use crate::value::{ParamKind, Value};

fn op(opcode: u16, time: i16, params: Vec<Param>) -> Instr {
    Instr::Op(OpInstr {
        opcode,
        time,
        offset: 0,
        size: 0,
        param_mask: 0,
        params,
        address: 0,
    })
}

fn untextured_entry(version: u32, name: &str) -> Entry {
    Entry {
        header: EntryHeader {
            version,
            ..Default::default()
        },
        name: name.to_owned(),
        ..Default::default()
    }
}

fn textured_entry(version: u32, name: &str, format: u32, w: u32, h: u32) -> Entry {
    let size = w * h * crate::formats::TextureFormat::from_wire(format)
        .unwrap()
        .bytes_per_pixel() as u32;
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    Entry {
        header: EntryHeader {
            version,
            format,
            w: w.next_power_of_two(),
            h: h.next_power_of_two(),
            has_data: 1,
            ..Default::default()
        },
        name: name.to_owned(),
        thtx: Some(ThtxHeader {
            format,
            w,
            h,
            size,
            zero: 0,
        }),
        data: Some(data),
        ..Default::default()
    }
}

fn script(real_index: i32, id: i32, instrs: Vec<Instr>) -> Script {
    Script {
        real_index,
        id,
        offset: 0,
        no_sentinel: false,
        instrs,
        labels: Vec::new(),
    }
}

fn dump_to_string(archive: &Archive, game: u32, ctx: &Context) -> String {
    let mut out = Cursor::new(Vec::new());
    dump_archive(&mut out, archive, game, "test.anm", ctx).unwrap();
    String::from_utf8(out.into_inner()).unwrap()
}

/// Decode, re-encode and compare: the canonical-input round-trip law.
fn assert_bytes_roundtrip(bytes: &[u8], game: u32) -> Archive {
    let mut decoded = Archive::read_from_bytes(bytes, game).unwrap();
    let reencoded = decoded.write_to_bytes(game).unwrap();
    assert_eq!(reencoded, bytes, "encode(decode(bytes)) differs");
    decoded
}

/// Dump to text, parse it back, resolve, re-encode and compare bytes. The
/// texture payloads are carried over by hand since spec text references
/// image files instead of embedding pixels.
fn assert_text_roundtrip(archive: &Archive, bytes: &[u8], game: u32, ctx: &Context) {
    let text = dump_to_string(archive, game, ctx);
    let mut out = parse_spec(&text, game, ctx).unwrap_or_else(|e| panic!("reparse failed: {e:#}\n{text}"));
    resolve_symbols(&mut out.archive, &out.symbols, false).unwrap();
    for (parsed, original) in out.archive.entries.iter_mut().zip(&archive.entries) {
        if original.header.has_data != 0 {
            parsed.data = original.data.clone();
        }
    }
    let reencoded = out.archive.write_to_bytes(game).unwrap();
    assert_eq!(reencoded, bytes, "text round trip differs\n{text}");
}

// S1: version 0 wire, a sprite reference and a jump targeting the second
// instruction's offset.
#[test]
fn test_v0_jump_roundtrip() {
    let ctx = Context::default();
    let mut entry = untextured_entry(0, "@blank");
    entry.sprites.push(Sprite::new(0, 0.0, 0.0, 16.0, 16.0));
    entry.scripts.push(script(
        0,
        0,
        vec![
            op(1, 0, vec![Param::new(ParamKind::SpriteRef, Value::Int(0))]),
            op(5, 0, vec![Param::new(ParamKind::Offset, Value::Int(8))]),
        ],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(6).unwrap();

    let decoded = assert_bytes_roundtrip(&bytes, 6);
    let script = &decoded.entries[0].scripts[0];
    let ops: Vec<&OpInstr> = script.instrs.iter().filter_map(Instr::as_op).collect();
    assert_eq!(ops.len(), 2);
    // Version 0 instructions have a 4-byte header plus one dword here.
    assert_eq!(ops[1].offset, 8);
    assert!(
        script
            .instrs
            .iter()
            .any(|i| matches!(i, Instr::Label { offset: 8 })),
        "jump target got no label"
    );

    let text = dump_to_string(&decoded, 6, &ctx);
    assert!(text.contains("ins_1(sprite0);"), "{text}");
    assert!(text.contains("offset8:"), "{text}");
    assert!(text.contains("ins_5(offset8);"), "{text}");

    assert_text_roundtrip(&decoded, &bytes, 6, &ctx);
}

// S2: from game 19 on, a lone un-offset PNG payload is carried verbatim.
#[test]
fn test_th19_verbatim_png_payload() {
    let ctx = Context::default();
    let dir = tempfile::tempdir().unwrap();

    let img = RgbaImage::from_fn(4, 4, |x, y| image::Rgba([x as u8, y as u8, 0, 0xff]));
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png).unwrap();
    let png = png.into_inner();

    let mut entry = untextured_entry(8, "ability/dummy.png");
    entry.header.has_data = 1;
    entry.thtx = Some(ThtxHeader {
        format: 1,
        w: 4,
        h: 4,
        size: png.len() as u32,
        zero: 0,
    });
    entry.data = Some(png.clone());
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(19).unwrap();
    let mut decoded = assert_bytes_roundtrip(&bytes, 19);

    let out_path = dir.path().join("ability/dummy.png");
    let members: Vec<&Entry> = decoded.entries.iter().collect();
    extract_chain(&members, &out_path, 19, &ctx).unwrap();
    assert_eq!(std::fs::read(&out_path).unwrap(), png, "payload not verbatim");

    // Replacing a non-composable chain is a no-op.
    replace_chain(&mut decoded, &[0], &out_path, None, 19, &ctx).unwrap();
    assert_eq!(decoded.entries[0].data.as_deref(), Some(png.as_slice()));
    let reencoded = decoded.write_to_bytes(19).unwrap();
    assert_eq!(reencoded, bytes);
}

// S3: the 18-line patch table changes opcode 439 to "Sff".
#[test]
fn test_th18_patched_opcode_roundtrip() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@patched");
    entry.scripts.push(script(
        0,
        0,
        vec![op(
            439,
            0,
            vec![
                Param::new(ParamKind::Int, Value::Int(1)),
                Param::new(ParamKind::Float, Value::Float(2.0)),
                Param::new(ParamKind::Float, Value::Float(3.5)),
            ],
        )],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(18).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 18);

    let Instr::Op(op) = &decoded.entries[0].scripts[0].instrs[0] else {
        panic!("expected op");
    };
    assert_eq!(op.params.len(), 3);
    assert_eq!(op.params[0].kind, ParamKind::Int);
    assert_eq!(op.params[1].kind, ParamKind::Float);
    assert_eq!(op.params[2].value, Value::Float(3.5));

    assert_text_roundtrip(&decoded, &bytes, 18, &ctx);
}

// S4: a script flush against the texture decodes as no_sentinel and
// re-encodes without one.
#[test]
fn test_no_sentinel_roundtrip() {
    let mut entry = textured_entry(8, "flush.png", 1, 4, 4);
    let mut s = script(0, 0, vec![op(300, 0, vec![Param::new(ParamKind::SpriteRef, Value::Int(0))])]);
    s.no_sentinel = true;
    entry.scripts.push(s);
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();

    let decoded = assert_bytes_roundtrip(&bytes, 17);
    assert!(decoded.entries[0].scripts[0].no_sentinel);
    assert_eq!(
        decoded.entries[0].scripts[0]
            .instrs
            .iter()
            .filter_map(Instr::as_op)
            .count(),
        1
    );
}

// Boundary: the same layout with a sentinel ending exactly at the texture
// offset decodes cleanly.
#[test]
fn test_sentinel_flush_against_texture() {
    let mut entry = textured_entry(8, "flush.png", 1, 4, 4);
    entry
        .scripts
        .push(script(0, 0, vec![op(300, 0, vec![Param::new(ParamKind::SpriteRef, Value::Int(0))])]));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);
    assert!(!decoded.entries[0].scripts[0].no_sentinel);
}

// Boundary: an instruction header that would cross the limit is dropped and
// flags the script instead.
#[test]
fn test_partial_trailing_instruction() {
    let mut entry = untextured_entry(8, "@tail");
    let mut s = script(0, 0, vec![op(0, 0, vec![])]);
    s.no_sentinel = true;
    entry.scripts.push(s);
    let mut archive = Archive {
        entries: vec![entry],
    };
    let mut bytes = archive.write_to_bytes(17).unwrap();
    // Four stray bytes: too short for another 8-byte instruction header.
    bytes.extend_from_slice(&[0x02, 0x00, 0x0c, 0x00]);

    let decoded = Archive::read_from_bytes(&bytes, 17).unwrap();
    let script = &decoded.entries[0].scripts[0];
    assert!(script.no_sentinel);
    assert_eq!(script.instrs.iter().filter_map(Instr::as_op).count(), 1);
}

// S5: two entries sharing a name compose into one atlas and replace back to
// identical bytes.
#[test]
fn test_atlas_extract_replace_cycle() {
    let ctx = Context::default();
    let dir = tempfile::tempdir().unwrap();

    let left = textured_entry(8, "atlas.png", 1, 256, 256);
    let mut right = textured_entry(8, "atlas.png", 1, 256, 256);
    right.header.x = 256;
    let mut archive = Archive {
        entries: vec![left, right],
    };
    let bytes = archive.write_to_bytes(17).unwrap();

    let archive_path = dir.path().join("atlas.anm");
    std::fs::write(&archive_path, &bytes).unwrap();

    let mut decoded = Archive::read_from_bytes(&bytes, 17).unwrap();
    let png_path = dir.path().join("atlas.png");
    let members: Vec<&Entry> = decoded.entries.iter().collect();
    extract_chain(&members, &png_path, 17, &ctx).unwrap();
    assert_eq!(image::image_dimensions(&png_path).unwrap(), (512, 256));

    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&archive_path)
        .unwrap();
    replace_chain(&mut decoded, &[0, 1], &png_path, Some(&mut file), 17, &ctx).unwrap();
    drop(file);
    assert_eq!(std::fs::read(&archive_path).unwrap(), bytes);
}

// S6: unknown opcodes fall back to int parameters and survive the cycle.
#[test]
fn test_unknown_opcode_fallback() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@unknown");
    entry.scripts.push(script(
        0,
        0,
        vec![op(
            9999,
            0,
            vec![
                Param::new(ParamKind::Int, Value::Int(123)),
                Param::new(ParamKind::Int, Value::Int(-456)),
            ],
        )],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    let Instr::Op(op) = &decoded.entries[0].scripts[0].instrs[0] else {
        panic!("expected op");
    };
    assert_eq!(op.opcode, 9999);
    assert_eq!(op.params.len(), 2);
    assert!(op.params.iter().all(|p| p.kind == ParamKind::Int));

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("ins_9999(123, -456);"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Reordered headers (versions 7/8) convert to canonical form and back.
#[test]
fn test_reordered_header_roundtrip() {
    let mut entry = textured_entry(7, "face.png", 3, 32, 16);
    entry.header.memory_priority = 10;
    entry.sprites.push(Sprite::new(0, 0.0, 0.0, 32.0, 16.0));
    let mut archive = Archive {
        entries: vec![entry, untextured_entry(7, "@tail")],
    };
    let bytes = archive.write_to_bytes(11).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 11);
    assert_eq!(decoded.entries.len(), 2);
    assert_eq!(decoded.entries[0].header.version, 7);
    assert_eq!(decoded.entries[0].header.memory_priority, 10);
    assert_eq!(decoded.entries[1].header.next_offset, 0);
}

// Version 0 secondary names travel through the header's y slot.
#[test]
fn test_v0_secondary_name() {
    let ctx = Context::default();
    let mut entry = untextured_entry(0, "@pair");
    entry.name2 = Some("other".to_owned());
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(6).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 6);
    assert_eq!(decoded.entries[0].name2.as_deref(), Some("other"));

    let text = dump_to_string(&decoded, 6, &ctx);
    assert!(text.contains("name2: \"other\""), "{text}");
    assert!(!text.contains("yOffset"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 6, &ctx);
}

// Property 4: the running time equals the sequence implied by the markers.
#[test]
fn test_time_markers_match_instruction_times() {
    let ctx = Context::default();
    let times: [i16; 5] = [0, 10, 10, -3, 5];
    let mut entry = untextured_entry(8, "@timed");
    entry.scripts.push(script(
        0,
        0,
        times.iter().map(|&t| op(0, t, vec![])).collect(),
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    let mut implied: i16 = 0;
    let mut walked = Vec::new();
    for instr in &decoded.entries[0].scripts[0].instrs {
        match instr {
            Instr::TimeMarker { time } => implied = *time,
            Instr::Op(op) => {
                assert_eq!(op.time, implied, "marker sequence diverged");
                walked.push(op.time);
            }
            Instr::Label { .. } => {}
        }
    }
    assert_eq!(walked, times);

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("+10: // 10"), "{text}");
    assert!(text.contains("\n-3:\n"), "{text}");
    // The marker after a negative time renders absolute.
    assert!(text.contains("\n5:\n"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// A jump one past the final instruction synthesizes a trailing label.
#[test]
fn test_past_end_jump_label() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@pastend");
    entry.scripts.push(script(
        0,
        0,
        vec![
            // ins_200 is "ot": 16 bytes from offset 0; ins_0 runs 16..24.
            op(
                200,
                0,
                vec![
                    Param::new(ParamKind::Offset, Value::Int(24)),
                    Param::new(ParamKind::Time, Value::Int(0)),
                ],
            ),
            op(0, 0, vec![]),
        ],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);
    let instrs = &decoded.entries[0].scripts[0].instrs;
    assert!(
        matches!(instrs.last(), Some(Instr::Label { offset: 24 })),
        "{instrs:?}"
    );
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Sprite id gaps surface as explicit ids exactly at the gap.
#[test]
fn test_sprite_id_gap_dump() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@sprites");
    for id in [0u32, 1, 3, 4] {
        entry.sprites.push(Sprite::new(id, 0.0, 0.0, 8.0, 8.0));
    }
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("sprite3: { x: 0, y: 0, w: 8, h: 8, id: 3 }"), "{text}");
    assert!(text.contains("sprite1: { x: 0, y: 0, w: 8, h: 8 }"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Script record ids are preserved verbatim and dumped only on gaps.
#[test]
fn test_script_id_gap_dump() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@scripts");
    entry.scripts.push(script(0, 0, vec![op(0, 0, vec![])]));
    entry.scripts.push(script(1, 5, vec![op(0, 0, vec![])]));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("script script0 {"), "{text}");
    assert!(text.contains("script 5 script1 {"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Invariant 5: has_data, the THTX offset and the `@` name prefix agree.
#[test]
fn test_textured_at_name_mismatch_is_rejected() {
    let mut entry = textured_entry(8, "@bad.png", 1, 4, 4);
    let mut archive = Archive {
        entries: vec![entry.clone()],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    assert!(Archive::read_from_bytes(&bytes, 17).is_err());

    // The honest spelling decodes fine.
    entry.name = "good.png".to_owned();
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    assert!(Archive::read_from_bytes(&bytes, 17).is_ok());
}

// Variables render through the name map and as bracketed ids without one.
#[test]
fn test_variable_rendering() {
    let mut ctx = Context::default();
    ctx.map.load_str("!gvar_names\n10000 i0\n", "test");

    let mut entry = untextured_entry(8, "@vars");
    entry.scripts.push(script(
        0,
        0,
        vec![op(
            302,
            0,
            vec![Param {
                kind: ParamKind::Int,
                is_var: true,
                value: Value::Int(10000),
            }],
        ), op(
            303,
            0,
            vec![Param {
                kind: ParamKind::Int,
                is_var: true,
                value: Value::Int(10001),
            }],
        )],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    // The variable bit survives the wire.
    let Instr::Op(op0) = &decoded.entries[0].scripts[0].instrs[0] else {
        panic!("expected op");
    };
    assert!(op0.params[0].is_var);

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("ins_302($i0);"), "{text}");
    assert!(text.contains("ins_303([10001]);"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Unresolved references are rejected unless forced.
#[test]
fn test_unresolved_reference_rejection() {
    let ctx = Context::default();
    let src = r#"
entry entry0 { version: 8, name: "@e", hasData: 0 }
script script0 { ins_300(spriteMissing); }
"#;
    let mut out = parse_spec(src, 17, &ctx).unwrap();
    assert!(resolve_symbols(&mut out.archive, &out.symbols, false).is_err());

    let mut out = parse_spec(src, 17, &ctx).unwrap();
    resolve_symbols(&mut out.archive, &out.symbols, true).unwrap();
    let Instr::Op(op) = &out.archive.entries[0].scripts[0].instrs[0] else {
        panic!("expected op");
    };
    // Forced builds encode a placeholder zero.
    assert_eq!(op.params[0].value, Value::Int(0));
}

// The defaults pass fills sentinel geometry from the image header.
#[test]
fn test_defaults_from_png() {
    use crate::archive::defaults::DEFAULTVAL;

    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("face.png");
    RgbaImage::new(48, 20).save(&png_path).unwrap();

    let mut entry = untextured_entry(8, "face.png");
    entry.header.has_data = 1;
    entry.header.w = DEFAULTVAL;
    entry.header.h = DEFAULTVAL;
    entry.header.format = 1;
    entry.filename = Some(png_path.to_string_lossy().into_owned());
    entry.thtx = Some(ThtxHeader {
        format: DEFAULTVAL,
        w: DEFAULTVAL,
        h: DEFAULTVAL,
        size: DEFAULTVAL,
        zero: 0,
    });
    let mut archive = Archive {
        entries: vec![entry],
    };
    archive.apply_defaults(17).unwrap();
    archive.allocate_missing_payloads();

    let entry = &archive.entries[0];
    let thtx = entry.thtx.as_ref().unwrap();
    // Entry dimensions round up to powers of two; texture dimensions stay
    // native and the size follows the pixel math.
    assert_eq!((entry.header.w, entry.header.h), (64, 32));
    assert_eq!((thtx.w, thtx.h), (48, 20));
    assert_eq!(thtx.format, 1);
    assert_eq!(thtx.size, 48 * 20 * 4);
    assert_eq!(entry.data.as_ref().unwrap().len(), thtx.size as usize);
}

#[test]
fn test_defaults_th19_loads_encoded_bytes() {
    use crate::archive::defaults::DEFAULTVAL;

    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("ability.png");
    RgbaImage::new(10, 6).save(&png_path).unwrap();
    let png_bytes = std::fs::read(&png_path).unwrap();

    let mut entry = untextured_entry(8, "ability.png");
    entry.header.has_data = 1;
    entry.header.w = DEFAULTVAL;
    entry.header.h = DEFAULTVAL;
    entry.header.format = 1;
    entry.filename = Some(png_path.to_string_lossy().into_owned());
    entry.thtx = Some(ThtxHeader {
        format: 1,
        w: DEFAULTVAL,
        h: DEFAULTVAL,
        size: DEFAULTVAL,
        zero: 0,
    });
    let mut archive = Archive {
        entries: vec![entry],
    };
    archive.apply_defaults(19).unwrap();

    let entry = &archive.entries[0];
    let thtx = entry.thtx.as_ref().unwrap();
    // The encoded file is the payload from game 19 on.
    assert_eq!(entry.data.as_deref(), Some(png_bytes.as_slice()));
    assert_eq!(thtx.size as usize, png_bytes.len());
    assert_eq!((thtx.w, thtx.h), (10, 6));
    assert_eq!((entry.header.w, entry.header.h), (16, 8));
}

// Mnemonics resolve through the name map in both directions.
#[test]
fn test_mnemonic_roundtrip_through_map() {
    let mut ctx = Context::default();
    ctx.map.load_str("!ins_names\n300 sprite\n", "test");

    let mut entry = untextured_entry(8, "@named");
    entry.scripts.push(script(
        0,
        0,
        vec![op(300, 0, vec![Param::new(ParamKind::SpriteRef, Value::Int(-1))])],
    ));
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(17).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 17);

    let text = dump_to_string(&decoded, 17, &ctx);
    assert!(text.contains("sprite(-1);"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 17, &ctx);
}

// Extended sprites carry their extra floats from game 19 on.
#[test]
fn test_extended_sprite_roundtrip() {
    let ctx = Context::default();
    let mut entry = untextured_entry(8, "@wide");
    let mut sprite = Sprite::new(0, 0.0, 0.0, 64.0, 64.0);
    sprite.unk = [1.0, 0.0, 1.0, 2.0, 0.0];
    entry.sprites.push(sprite);
    let mut archive = Archive {
        entries: vec![entry],
    };
    let bytes = archive.write_to_bytes(19).unwrap();
    let decoded = assert_bytes_roundtrip(&bytes, 19);
    assert_eq!(decoded.entries[0].sprites[0].unk, [1.0, 0.0, 1.0, 2.0, 0.0]);

    let text = dump_to_string(&decoded, 19, &ctx);
    // Only deviations from the defaults (0,0,1,1,0) are spelled out.
    assert!(text.contains("th19_unk0: 1"), "{text}");
    assert!(!text.contains("th19_unk1"), "{text}");
    assert!(!text.contains("th19_unk2"), "{text}");
    assert!(text.contains("th19_unk3: 2"), "{text}");
    assert_text_roundtrip(&decoded, &bytes, 19, &ctx);
}
