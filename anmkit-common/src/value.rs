//! Instruction parameter kinds and their little-endian wire codec.
//!
//! Format strings describe parameters with one character each:
//!
//! - `S` 32-bit int, `s` 16-bit int, `f` 32-bit float (raw data kinds)
//! - `o` jump target (byte offset within the script)
//! - `t` time target (resolved through a label at assembly time)
//! - `n` sprite reference, `N` script reference
//!
//! The reference kinds all travel as 32-bit ints on the wire.

use anyhow::{Result, bail};

/// One parameter slot kind from a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `S` - 32-bit integer
    Int,
    /// `s` - 16-bit integer
    Short,
    /// `f` - 32-bit float
    Float,
    /// `o` - jump target byte offset
    Offset,
    /// `t` - time, resolved through a label
    Time,
    /// `n` - sprite id
    SpriteRef,
    /// `N` - script index
    ScriptRef,
}

impl ParamKind {
    pub fn from_format_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(ParamKind::Int),
            's' => Some(ParamKind::Short),
            'f' => Some(ParamKind::Float),
            'o' => Some(ParamKind::Offset),
            't' => Some(ParamKind::Time),
            'n' => Some(ParamKind::SpriteRef),
            'N' => Some(ParamKind::ScriptRef),
            _ => None,
        }
    }

    pub fn format_char(self) -> char {
        match self {
            ParamKind::Int => 'S',
            ParamKind::Short => 's',
            ParamKind::Float => 'f',
            ParamKind::Offset => 'o',
            ParamKind::Time => 't',
            ParamKind::SpriteRef => 'n',
            ParamKind::ScriptRef => 'N',
        }
    }

    /// Encoded size in bytes. Everything except `s` is four bytes wide.
    pub fn wire_size(self) -> usize {
        match self {
            ParamKind::Short => 2,
            _ => 4,
        }
    }
}

/// A decoded (or not-yet-resolved) parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Short(i16),
    Float(f32),
    /// Symbolic reference (label, sprite or script name). Only produced by the
    /// spec parser; resolved to an `Int` before any bytes are written.
    Name(String),
}

impl Value {
    /// Decode one value of the given kind from the front of `bytes`.
    ///
    /// Returns the value and the number of bytes consumed, or `None` if the
    /// buffer is too short.
    pub fn read(bytes: &[u8], kind: ParamKind) -> Option<(Value, usize)> {
        match kind {
            ParamKind::Short => {
                let raw = bytes.get(0..2)?;
                Some((Value::Short(i16::from_le_bytes([raw[0], raw[1]])), 2))
            }
            ParamKind::Float => {
                let raw = bytes.get(0..4)?;
                let v = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                Some((Value::Float(v), 4))
            }
            _ => {
                let raw = bytes.get(0..4)?;
                let v = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                Some((Value::Int(v), 4))
            }
        }
    }

    /// Append the little-endian encoding of this value.
    ///
    /// `Name` values have no wire form; hitting one here means symbol
    /// resolution was skipped.
    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Name(name) => bail!("unresolved symbolic value `{name}`"),
        }
        Ok(())
    }

    /// Integer view of the value, used to look up register names for
    /// variable-flagged parameters. Floats are floored like the game does.
    pub fn as_reg_id(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Short(v) => Some(i32::from(*v)),
            Value::Float(v) => Some(v.floor() as i32),
            Value::Name(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_sizes() {
        assert_eq!(ParamKind::Short.wire_size(), 2);
        assert_eq!(ParamKind::Int.wire_size(), 4);
        assert_eq!(ParamKind::Float.wire_size(), 4);
        assert_eq!(ParamKind::Offset.wire_size(), 4);
    }

    #[test]
    fn test_int_roundtrip() {
        let mut out = Vec::new();
        Value::Int(-12345).write(&mut out).unwrap();
        let (v, n) = Value::read(&out, ParamKind::Int).unwrap();
        assert_eq!(n, 4);
        assert_eq!(v, Value::Int(-12345));
    }

    #[test]
    fn test_short_roundtrip() {
        let mut out = Vec::new();
        Value::Short(-5).write(&mut out).unwrap();
        let (v, n) = Value::read(&out, ParamKind::Short).unwrap();
        assert_eq!(n, 2);
        assert_eq!(v, Value::Short(-5));
    }

    #[test]
    fn test_reference_kinds_read_as_int() {
        let bytes = 7i32.to_le_bytes();
        for kind in [
            ParamKind::Offset,
            ParamKind::Time,
            ParamKind::SpriteRef,
            ParamKind::ScriptRef,
        ] {
            let (v, n) = Value::read(&bytes, kind).unwrap();
            assert_eq!(n, 4);
            assert_eq!(v, Value::Int(7));
        }
    }

    #[test]
    fn test_short_buffer() {
        assert!(Value::read(&[0x01], ParamKind::Int).is_none());
        assert!(Value::read(&[], ParamKind::Short).is_none());
    }

    #[test]
    fn test_name_has_no_wire_form() {
        let mut out = Vec::new();
        assert!(Value::Name("offset12".into()).write(&mut out).is_err());
    }

    #[test]
    fn test_reg_id_floors_floats() {
        assert_eq!(Value::Float(10003.9).as_reg_id(), Some(10003));
        assert_eq!(Value::Int(-1).as_reg_id(), Some(-1));
        assert_eq!(Value::Name("x".into()).as_reg_id(), None);
    }
}
