//! Archive decoding: walk the entry chain of a loaded file and build the
//! typed model.

use anyhow::{Context as _, Result, bail};

use crate::formats::header::EntryHeader;
use crate::formats::instruction::{self, ReadInstr};
use crate::formats::sprite::Sprite;
use crate::formats::thtx::ThtxHeader;
use crate::opcodes;
use crate::value::{ParamKind, Value};
use crate::version::is_th19_or_newer;

use super::labels::insert_labels;
use super::{Archive, Entry, Instr, OpInstr, Param, Script};

fn u32_at(buf: &[u8], off: usize) -> Result<u32> {
    let raw = buf
        .get(off..off + 4)
        .with_context(|| format!("unexpected end of file at offset {off:#x}"))?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn i32_at(buf: &[u8], off: usize) -> Result<i32> {
    Ok(u32_at(buf, off)? as i32)
}

/// Read a NUL-terminated string out of the buffer.
fn cstr_at(buf: &[u8], off: usize) -> Result<String> {
    let tail = buf
        .get(off..)
        .with_context(|| format!("string offset {off:#x} out of bounds"))?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .with_context(|| format!("unterminated string at offset {off:#x}"))?;
    Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
}

/// Decode an instruction payload into typed parameters.
///
/// With a known format string the payload is typed slot by slot; without one
/// the payload is read as a run of 32-bit ints. A payload longer than its
/// format string is malformed.
fn make_params(opcode: u16, param_mask: u16, payload: &[u8], format: Option<&str>) -> Result<Vec<Param>> {
    let mut params = Vec::new();
    let mut pos = 0usize;
    let mut slot = 0usize;
    while pos < payload.len() {
        let c = match format {
            Some(fmt) => fmt.chars().nth(slot).with_context(|| {
                format!(
                    "ins_{opcode}: payload of {} bytes is longer than format \"{fmt}\"",
                    payload.len()
                )
            })?,
            None => 'S',
        };
        let kind = ParamKind::from_format_char(c)
            .with_context(|| format!("ins_{opcode}: bad format character {c:?}"))?;
        let (value, read) = Value::read(&payload[pos..], kind).with_context(|| {
            format!(
                "ins_{opcode}: payload ended mid-parameter (slot {slot}, offset {pos} of {})",
                payload.len()
            )
        })?;
        params.push(Param {
            kind,
            is_var: slot < 16 && param_mask & (1 << slot) != 0,
            value,
        });
        pos += read;
        slot += 1;
    }
    Ok(params)
}

fn decode_script_instrs(
    buf: &[u8],
    entry_base: usize,
    script_offset: u32,
    limit: usize,
    header_version: u32,
    game: u32,
) -> Result<(Vec<Instr>, bool)> {
    let start = entry_base + script_offset as usize;
    if start > buf.len() {
        bail!("script offset {script_offset:#x} lies outside the file");
    }

    let mut instrs = Vec::new();
    let mut no_sentinel = false;
    let mut time: i16 = 0;
    let mut pos = start;
    loop {
        match instruction::read_raw_instr(buf, pos, limit, header_version) {
            ReadInstr::Truncated => {
                no_sentinel = true;
                break;
            }
            ReadInstr::Sentinel => break,
            ReadInstr::Instr(raw, size) => {
                if raw.time != time {
                    instrs.push(Instr::TimeMarker { time: raw.time });
                    time = raw.time;
                }

                let format = opcodes::find_format(game, header_version, raw.opcode);
                if format.is_none() {
                    tracing::warn!(
                        opcode = raw.opcode,
                        payload_len = raw.payload.len(),
                        "opcode not found in the format table, decoding parameters as ints"
                    );
                }
                let params = make_params(raw.opcode, raw.param_mask, &raw.payload, format)?;
                instrs.push(Instr::Op(OpInstr {
                    opcode: raw.opcode,
                    time: raw.time,
                    offset: (pos - start) as u32,
                    size: size as u32,
                    param_mask: u32::from(raw.param_mask),
                    params,
                    address: pos as u64,
                }));
                pos += size;
            }
        }
    }
    Ok((instrs, no_sentinel))
}

impl Archive {
    /// Decode a whole archive from a loaded file.
    ///
    /// Structural problems (bad header fields, bad THTX magic, offsets
    /// outside the file) are errors. Unknown opcodes and truncated scripts
    /// are diagnostics: the decoder falls back to int parameters or flags
    /// the script `no_sentinel` and keeps going.
    pub fn read_from_bytes(buf: &[u8], game: u32) -> Result<Archive> {
        let th19 = is_th19_or_newer(game);
        let mut archive = Archive::new();
        let mut script_count: i32 = 0;
        let mut base = 0usize;

        loop {
            let entry_index = archive.entries.len();
            let header_bytes = buf
                .get(base..base + EntryHeader::SIZE)
                .with_context(|| format!("entry {entry_index}: truncated header at {base:#x}"))?;
            let (header, _reordered) = EntryHeader::detect(header_bytes)
                .with_context(|| format!("entry {entry_index}: unreadable header"))?;

            if !matches!(header.version, 0 | 2 | 3 | 4 | 7 | 8) {
                bail!(
                    "entry {entry_index}: impossible header version {}",
                    header.version
                );
            }
            if header.has_data > 1 {
                bail!(
                    "entry {entry_index}: has_data must be 0 or 1, found {}",
                    header.has_data
                );
            }
            if header.version == 8 && header.low_res_scale > 1 {
                bail!(
                    "entry {entry_index}: low_res_scale must be 0 or 1, found {}",
                    header.low_res_scale
                );
            }
            if !th19 && header.jpeg_quality != 0 {
                bail!(
                    "entry {entry_index}: jpeg_quality set in a pre-19 archive"
                );
            }
            if !th19 && (header.w_max != 0 || header.h_max != 0) {
                bail!("entry {entry_index}: w_max/h_max set in a pre-19 archive");
            }

            let name = cstr_at(buf, base + header.name_offset as usize)
                .with_context(|| format!("entry {entry_index}: bad name"))?;
            let name2 = if header.version == 0 && header.y != 0 {
                Some(
                    cstr_at(buf, base + header.y as usize)
                        .with_context(|| format!("entry {entry_index}: bad secondary name"))?,
                )
            } else {
                None
            };

            let untextured = header.has_data == 0 || name.starts_with('@');
            if untextured != (header.thtx_offset == 0) {
                bail!(
                    "entry {entry_index} (\"{name}\"): has_data={} disagrees with thtx_offset={:#x}",
                    header.has_data,
                    header.thtx_offset
                );
            }

            let mut sprites = Vec::with_capacity(header.sprites as usize);
            for s in 0..header.sprites as usize {
                let off = u32_at(buf, base + EntryHeader::SIZE + s * 4)
                    .with_context(|| format!("entry {entry_index}: truncated sprite table"))? as usize;
                let sprite = buf
                    .get(base + off..)
                    .and_then(|raw| Sprite::from_bytes(raw, th19))
                    .with_context(|| format!("entry {entry_index}: truncated sprite {s}"))?;
                sprites.push(sprite);
            }

            let script_table = base + EntryHeader::SIZE + header.sprites as usize * 4;
            let mut scripts = Vec::with_capacity(header.scripts as usize);
            for s in 0..header.scripts as usize {
                let id = i32_at(buf, script_table + s * 8)
                    .with_context(|| format!("entry {entry_index}: truncated script table"))?;
                let offset = u32_at(buf, script_table + s * 8 + 4)?;

                // A script runs to the next script, else to the texture, else
                // to the next entry, else to the end of the file.
                let limit = if s + 1 < header.scripts as usize {
                    base + u32_at(buf, script_table + (s + 1) * 8 + 4)? as usize
                } else if header.thtx_offset != 0 {
                    base + header.thtx_offset as usize
                } else if header.next_offset != 0 {
                    base + header.next_offset as usize
                } else {
                    buf.len()
                };
                let limit = limit.min(buf.len());

                let (mut instrs, no_sentinel) =
                    decode_script_instrs(buf, base, offset, limit, header.version, game)
                        .with_context(|| {
                            format!("entry {entry_index} (\"{name}\"): script {s}")
                        })?;
                if no_sentinel {
                    tracing::warn!(
                        entry = entry_index,
                        script = script_count,
                        "instruction stream ends without a sentinel"
                    );
                }
                insert_labels(&mut instrs);

                scripts.push(Script {
                    real_index: script_count,
                    id,
                    offset,
                    no_sentinel,
                    instrs,
                    labels: Vec::new(),
                });
                script_count += 1;
            }

            let (thtx, data) = if header.has_data != 0 {
                let thtx_pos = base + header.thtx_offset as usize;
                let thtx = buf
                    .get(thtx_pos..)
                    .and_then(ThtxHeader::from_bytes)
                    .with_context(|| {
                        format!("entry {entry_index} (\"{name}\"): bad THTX header at {thtx_pos:#x}")
                    })?;
                if thtx.zero != 0 {
                    bail!("entry {entry_index} (\"{name}\"): THTX reserved field is nonzero");
                }
                let format = thtx.texture_format().with_context(|| {
                    format!(
                        "entry {entry_index} (\"{name}\"): unknown texture format {}",
                        thtx.format
                    )
                })?;
                // From 19 on payloads may be PNG/JPEG, so the pixel math no
                // longer bounds the payload size.
                let pixel_bytes =
                    u64::from(thtx.w) * u64::from(thtx.h) * format.bytes_per_pixel() as u64;
                if !th19 && pixel_bytes > u64::from(thtx.size) {
                    bail!(
                        "entry {entry_index} (\"{name}\"): texture size {} too small for {}x{} pixels",
                        thtx.size,
                        thtx.w,
                        thtx.h
                    );
                }
                let data_pos = thtx_pos + ThtxHeader::SIZE;
                let data = buf
                    .get(data_pos..data_pos + thtx.size as usize)
                    .with_context(|| {
                        format!("entry {entry_index} (\"{name}\"): truncated texture payload")
                    })?
                    .to_vec();
                (Some(thtx), Some(data))
            } else {
                (None, None)
            };

            let next_offset = header.next_offset;
            archive.entries.push(Entry {
                header,
                name,
                name2,
                filename: None,
                sprites,
                scripts,
                thtx,
                data,
                base_offset: base as u64,
            });

            if next_offset == 0 {
                break;
            }
            base += next_offset as usize;
        }

        Ok(archive)
    }
}
