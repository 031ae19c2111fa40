//! Label insertion: turn raw jump offsets back into symbolic positions.

use crate::value::{ParamKind, Value};

use super::Instr;

/// Insert a `Label` pseudo-instruction at every byte offset targeted by a
/// jump parameter.
///
/// Jumps land either on an instruction boundary or one past the end of the
/// script body; a label lands immediately before the instruction it targets,
/// or at the very end for the one-past-the-end case. Duplicate targets are
/// coalesced. Anything else means the script is malformed and is reported,
/// leaving the raw offset in place so re-encoding stays faithful.
pub fn insert_labels(instrs: &mut Vec<Instr>) {
    let mut targets = Vec::new();
    for instr in instrs.iter() {
        let Instr::Op(op) = instr else { continue };
        for param in &op.params {
            if param.kind == ParamKind::Offset {
                if let Value::Int(v) = param.value {
                    targets.push(v as u32);
                }
            }
        }
    }

    for target in targets {
        let exists = instrs
            .iter()
            .any(|i| matches!(i, Instr::Label { offset } if *offset == target));
        if exists {
            continue;
        }

        let at = instrs.iter().position(
            |i| matches!(i, Instr::Op(op) if op.offset == target),
        );
        match at {
            Some(pos) => instrs.insert(pos, Instr::Label { offset: target }),
            None => {
                let past_end = instrs
                    .iter()
                    .rev()
                    .find_map(Instr::as_op)
                    .is_some_and(|last| last.offset + last.size == target);
                if past_end {
                    instrs.push(Instr::Label { offset: target });
                } else {
                    tracing::warn!(
                        target,
                        "jump target does not land on an instruction boundary"
                    );
                }
            }
        }
    }
}
