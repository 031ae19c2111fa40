//! Raw instruction codec.
//!
//! Two wire layouts, selected by the entry's header version:
//!
//! # Header version 0
//! ```text
//! 0x00: time i16
//! 0x02: opcode u8
//! 0x03: payload_len u8
//! 0x04: payload
//! ```
//! Sentinel: `time == 0 && opcode == 0`.
//!
//! # Header version >= 2
//! ```text
//! 0x00: opcode u16
//! 0x02: size u16        (including this 8-byte header)
//! 0x04: time i16
//! 0x06: param_mask u16
//! 0x08: payload
//! ```
//! Sentinel: `opcode == 0xffff`, written as `{0xffff, 0, 0, 0}`.

use crate::opcodes::SENTINEL_OPCODE;

pub const HEADER_SIZE_V0: usize = 4;
pub const HEADER_SIZE: usize = 8;

/// Fixed header size for the given header version.
pub fn header_size(header_version: u32) -> usize {
    if header_version == 0 {
        HEADER_SIZE_V0
    } else {
        HEADER_SIZE
    }
}

/// One instruction as it sits on the wire, payload still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstr {
    pub opcode: u16,
    pub time: i16,
    pub param_mask: u16,
    pub payload: Vec<u8>,
}

/// Outcome of pulling one instruction off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadInstr {
    /// A real instruction; the second field is the wire size consumed.
    Instr(RawInstr, usize),
    /// The version-appropriate terminator.
    Sentinel,
    /// The next instruction would cross the script limit.
    Truncated,
}

/// Read one instruction at `pos`, never looking past `limit`.
pub fn read_raw_instr(buf: &[u8], pos: usize, limit: usize, header_version: u32) -> ReadInstr {
    if header_version == 0 {
        if pos + HEADER_SIZE_V0 > limit {
            return ReadInstr::Truncated;
        }
        let time = i16::from_le_bytes([buf[pos], buf[pos + 1]]);
        let opcode = u16::from(buf[pos + 2]);
        let len = usize::from(buf[pos + 3]);
        if pos + HEADER_SIZE_V0 + len > limit {
            return ReadInstr::Truncated;
        }
        if opcode == 0 && time == 0 {
            return ReadInstr::Sentinel;
        }
        let payload = buf[pos + HEADER_SIZE_V0..pos + HEADER_SIZE_V0 + len].to_vec();
        ReadInstr::Instr(
            RawInstr {
                opcode,
                time,
                param_mask: 0,
                payload,
            },
            HEADER_SIZE_V0 + len,
        )
    } else {
        if pos + HEADER_SIZE > limit {
            return ReadInstr::Truncated;
        }
        let opcode = u16::from_le_bytes([buf[pos], buf[pos + 1]]);
        let size = usize::from(u16::from_le_bytes([buf[pos + 2], buf[pos + 3]]));
        let time = i16::from_le_bytes([buf[pos + 4], buf[pos + 5]]);
        let param_mask = u16::from_le_bytes([buf[pos + 6], buf[pos + 7]]);
        if pos + size > limit {
            return ReadInstr::Truncated;
        }
        if opcode == SENTINEL_OPCODE {
            return ReadInstr::Sentinel;
        }
        if size < HEADER_SIZE {
            tracing::warn!(opcode, size, "instruction size smaller than its header");
            return ReadInstr::Truncated;
        }
        let payload = buf[pos + HEADER_SIZE..pos + size].to_vec();
        ReadInstr::Instr(
            RawInstr {
                opcode,
                time,
                param_mask,
                payload,
            },
            size,
        )
    }
}

/// Append one instruction in the given header version's layout.
pub fn write_raw_instr(out: &mut Vec<u8>, instr: &RawInstr, header_version: u32) {
    if header_version == 0 {
        out.extend_from_slice(&instr.time.to_le_bytes());
        out.push(instr.opcode as u8);
        out.push(instr.payload.len() as u8);
        out.extend_from_slice(&instr.payload);
    } else {
        let size = (HEADER_SIZE + instr.payload.len()) as u16;
        out.extend_from_slice(&instr.opcode.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&instr.time.to_le_bytes());
        out.extend_from_slice(&instr.param_mask.to_le_bytes());
        out.extend_from_slice(&instr.payload);
    }
}

/// Append the version-appropriate terminator.
pub fn write_sentinel(out: &mut Vec<u8>, header_version: u32) {
    if header_version == 0 {
        out.extend_from_slice(&[0u8; HEADER_SIZE_V0]);
    } else {
        out.extend_from_slice(&SENTINEL_OPCODE.to_le_bytes());
        out.extend_from_slice(&[0u8; 6]);
    }
}
