//! Entry header codec.
//!
//! Two on-disk layouts, both 64 bytes. The early layout is used by header
//! versions 0 through 4 and doubles as the canonical in-memory shape. Header
//! versions 7 and 8 reorder the fields, shrink several to 16 bits and drop
//! `rt_textureslot`/`colorkey`.
//!
//! # Early layout
//! ```text
//! 0x00: sprites u32          0x20: x u32
//! 0x04: scripts u32          0x24: y u32
//! 0x08: rt_textureslot u32   0x28: version u32
//! 0x0c: w u32                0x2c: memory_priority u32
//! 0x10: h u32                0x30: thtx_offset u32
//! 0x14: format u32           0x34: has_data u16
//! 0x18: colorkey u32         0x36: low_res_scale u8, jpeg_quality u8
//! 0x1c: name_offset u32      0x38: next_offset u32
//!                            0x3c: w_max u16, h_max u16
//! ```
//!
//! # Reordered layout (header version >= 7)
//! ```text
//! 0x00: version u32          0x14: x u16, y u16
//! 0x04: sprites u16          0x18: memory_priority u32
//! 0x06: scripts u16          0x1c: thtx_offset u32
//! 0x08: zero1 u16            0x20: has_data u16
//! 0x0a: w u16                0x22: low_res_scale u8, jpeg_quality u8
//! 0x0c: h u16                0x24: next_offset u32
//! 0x0e: format u16           0x28: w_max u16, h_max u16
//! 0x10: name_offset u32      0x2c: zero padding to 0x40
//! ```
//!
//! Within a file the only way to tell the layouts apart is that bytes 6..12
//! are always zero in the early layout (`scripts` never exceeds 65535 and
//! `rt_textureslot` is always zero). Preserve that heuristic exactly.

fn u16_at(bytes: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([bytes[off], bytes[off + 1]])
}

fn u32_at(bytes: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([
        bytes[off],
        bytes[off + 1],
        bytes[off + 2],
        bytes[off + 3],
    ])
}

/// Canonical in-memory entry header (the early layout's field set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryHeader {
    pub sprites: u32,
    pub scripts: u32,
    /// Runtime texture slot; always zero in archives.
    pub rt_textureslot: u32,
    pub w: u32,
    pub h: u32,
    pub format: u32,
    pub colorkey: u32,
    pub name_offset: u32,
    pub x: u32,
    /// In version 0 entries a nonzero `y` is the offset of a secondary name.
    pub y: u32,
    pub version: u32,
    pub memory_priority: u32,
    pub thtx_offset: u32,
    pub has_data: u16,
    pub low_res_scale: u8,
    pub jpeg_quality: u8,
    pub next_offset: u32,
    pub w_max: u16,
    pub h_max: u16,
}

impl EntryHeader {
    pub const SIZE: usize = 64;

    /// Read the early layout.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            sprites: u32_at(bytes, 0x00),
            scripts: u32_at(bytes, 0x04),
            rt_textureslot: u32_at(bytes, 0x08),
            w: u32_at(bytes, 0x0c),
            h: u32_at(bytes, 0x10),
            format: u32_at(bytes, 0x14),
            colorkey: u32_at(bytes, 0x18),
            name_offset: u32_at(bytes, 0x1c),
            x: u32_at(bytes, 0x20),
            y: u32_at(bytes, 0x24),
            version: u32_at(bytes, 0x28),
            memory_priority: u32_at(bytes, 0x2c),
            thtx_offset: u32_at(bytes, 0x30),
            has_data: u16_at(bytes, 0x34),
            low_res_scale: bytes[0x36],
            jpeg_quality: bytes[0x37],
            next_offset: u32_at(bytes, 0x38),
            w_max: u16_at(bytes, 0x3c),
            h_max: u16_at(bytes, 0x3e),
        })
    }

    /// Read the reordered layout and widen it to the canonical shape.
    pub fn from_bytes_reordered(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            version: u32_at(bytes, 0x00),
            sprites: u32::from(u16_at(bytes, 0x04)),
            scripts: u32::from(u16_at(bytes, 0x06)),
            rt_textureslot: 0,
            w: u32::from(u16_at(bytes, 0x0a)),
            h: u32::from(u16_at(bytes, 0x0c)),
            format: u32::from(u16_at(bytes, 0x0e)),
            colorkey: 0,
            name_offset: u32_at(bytes, 0x10),
            x: u32::from(u16_at(bytes, 0x14)),
            y: u32::from(u16_at(bytes, 0x16)),
            memory_priority: u32_at(bytes, 0x18),
            thtx_offset: u32_at(bytes, 0x1c),
            has_data: u16_at(bytes, 0x20),
            low_res_scale: bytes[0x22],
            jpeg_quality: bytes[0x23],
            next_offset: u32_at(bytes, 0x24),
            w_max: u16_at(bytes, 0x28),
            h_max: u16_at(bytes, 0x2a),
        })
    }

    /// Read a header, discriminating the two layouts.
    ///
    /// Returns the canonical header and whether the reordered layout was
    /// detected on the wire.
    pub fn detect(bytes: &[u8]) -> Option<(Self, bool)> {
        let early = Self::from_bytes(bytes)?;
        if early.rt_textureslot != 0 || early.scripts > 65535 {
            Some((Self::from_bytes_reordered(bytes)?, true))
        } else {
            Some((early, false))
        }
    }

    /// Write the early layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x04].copy_from_slice(&self.sprites.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&self.scripts.to_le_bytes());
        bytes[0x08..0x0c].copy_from_slice(&self.rt_textureslot.to_le_bytes());
        bytes[0x0c..0x10].copy_from_slice(&self.w.to_le_bytes());
        bytes[0x10..0x14].copy_from_slice(&self.h.to_le_bytes());
        bytes[0x14..0x18].copy_from_slice(&self.format.to_le_bytes());
        bytes[0x18..0x1c].copy_from_slice(&self.colorkey.to_le_bytes());
        bytes[0x1c..0x20].copy_from_slice(&self.name_offset.to_le_bytes());
        bytes[0x20..0x24].copy_from_slice(&self.x.to_le_bytes());
        bytes[0x24..0x28].copy_from_slice(&self.y.to_le_bytes());
        bytes[0x28..0x2c].copy_from_slice(&self.version.to_le_bytes());
        bytes[0x2c..0x30].copy_from_slice(&self.memory_priority.to_le_bytes());
        bytes[0x30..0x34].copy_from_slice(&self.thtx_offset.to_le_bytes());
        bytes[0x34..0x36].copy_from_slice(&self.has_data.to_le_bytes());
        bytes[0x36] = self.low_res_scale;
        bytes[0x37] = self.jpeg_quality;
        bytes[0x38..0x3c].copy_from_slice(&self.next_offset.to_le_bytes());
        bytes[0x3c..0x3e].copy_from_slice(&self.w_max.to_le_bytes());
        bytes[0x3e..0x40].copy_from_slice(&self.h_max.to_le_bytes());
        bytes
    }

    /// Write the reordered layout used by header versions 7 and 8.
    pub fn to_bytes_reordered(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x04].copy_from_slice(&self.version.to_le_bytes());
        bytes[0x04..0x06].copy_from_slice(&(self.sprites as u16).to_le_bytes());
        bytes[0x06..0x08].copy_from_slice(&(self.scripts as u16).to_le_bytes());
        // zero1 at 0x08 stays zero
        bytes[0x0a..0x0c].copy_from_slice(&(self.w as u16).to_le_bytes());
        bytes[0x0c..0x0e].copy_from_slice(&(self.h as u16).to_le_bytes());
        bytes[0x0e..0x10].copy_from_slice(&(self.format as u16).to_le_bytes());
        bytes[0x10..0x14].copy_from_slice(&self.name_offset.to_le_bytes());
        bytes[0x14..0x16].copy_from_slice(&(self.x as u16).to_le_bytes());
        bytes[0x16..0x18].copy_from_slice(&(self.y as u16).to_le_bytes());
        bytes[0x18..0x1c].copy_from_slice(&self.memory_priority.to_le_bytes());
        bytes[0x1c..0x20].copy_from_slice(&self.thtx_offset.to_le_bytes());
        bytes[0x20..0x22].copy_from_slice(&self.has_data.to_le_bytes());
        bytes[0x22] = self.low_res_scale;
        bytes[0x23] = self.jpeg_quality;
        bytes[0x24..0x28].copy_from_slice(&self.next_offset.to_le_bytes());
        bytes[0x28..0x2a].copy_from_slice(&self.w_max.to_le_bytes());
        bytes[0x2a..0x2c].copy_from_slice(&self.h_max.to_le_bytes());
        // tail padding to 0x40 stays zero
        bytes
    }
}
