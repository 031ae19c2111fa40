//! Texture composition: chains of entries sharing a name describe one
//! tiled/layered image, extracted to and replaced from PNG files.

pub mod convert;
pub mod extract;
pub mod replace;

pub use extract::extract_chain;
pub use replace::replace_chain;

use crate::archive::Entry;
use crate::context::Context;

pub(crate) const PNG_MAGIC: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

pub(crate) fn is_png(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && &bytes[..8] == PNG_MAGIC
}

/// Offsets to blit a chain member at, honoring the ignore-offset option.
pub(crate) fn member_offsets(entry: &Entry, ctx: &Context) -> (u32, u32) {
    if ctx.no_offset_border {
        (0, 0)
    } else {
        (entry.header.x, entry.header.y)
    }
}

/// Bounding box of a chain's composite image.
pub(crate) fn chain_box(members: &[&Entry], ctx: &Context) -> (u32, u32) {
    let mut width = 0;
    let mut height = 0;
    for entry in members {
        if entry.header.has_data == 0 {
            continue;
        }
        let Some(thtx) = entry.thtx.as_ref() else {
            continue;
        };
        let (ox, oy) = member_offsets(entry, ctx);
        width = width.max(ox + thtx.w);
        height = height.max(oy + thtx.h);
    }
    (width, height)
}
