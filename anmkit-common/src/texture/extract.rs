//! Chain extraction: compose an archive's texture chain onto an RGBA canvas
//! and write it out as PNG.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use image::{ImageFormat, RgbaImage};

use crate::archive::Entry;
use crate::context::Context;
use crate::version::is_th19_or_newer;

use super::{chain_box, convert, is_png, member_offsets};

fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// A lone verbatim payload needs no warning; two identical copies of the
/// same texture (one real game ships such a pair) don't either.
fn warn_uncomposable(members: &[&Entry], ox: u32, oy: u32) -> bool {
    if ox != 0 || oy != 0 {
        return true;
    }
    let Some(next) = members.get(1) else {
        return false;
    };
    members.len() > 2
        || members[0].thtx.as_ref().map(|t| t.size) != next.thtx.as_ref().map(|t| t.size)
        || members[0].data != next.data
}

/// Decode one chain member to RGBA pixels.
fn member_rgba(entry: &Entry, png_payload: bool) -> Result<Vec<u8>> {
    let thtx = entry
        .thtx
        .as_ref()
        .with_context(|| format!("{}: textured entry without THTX header", entry.name))?;
    let data = entry
        .data
        .as_ref()
        .with_context(|| format!("{}: textured entry without payload", entry.name))?;
    if png_payload {
        let img = image::load_from_memory(data)
            .with_context(|| format!("{}: bad PNG payload", entry.name))?
            .to_rgba8();
        if img.dimensions() != (thtx.w, thtx.h) {
            bail!(
                "{}: PNG payload is {}x{} but THTX claims {}x{}",
                entry.name,
                img.width(),
                img.height(),
                thtx.w,
                thtx.h
            );
        }
        Ok(img.into_raw())
    } else {
        let format = thtx
            .texture_format()
            .with_context(|| format!("{}: unknown texture format {}", entry.name, thtx.format))?;
        Ok(convert::to_rgba(data, (thtx.w * thtx.h) as usize, format))
    }
}

/// Extract one chain to `path` as PNG.
///
/// For game 19 and later a single un-offset payload is written verbatim
/// (it is already PNG or JPEG); chains and offset payloads are composed,
/// which requires them to be PNG.
pub fn extract_chain(members: &[&Entry], path: &Path, game: u32, ctx: &Context) -> Result<()> {
    let (width, height) = chain_box(members, ctx);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let mut png_payload = false;
    if is_th19_or_newer(game) {
        let first = members[0];
        let data = first
            .data
            .as_ref()
            .with_context(|| format!("{}: textured entry without payload", first.name))?;
        let (ox, oy) = member_offsets(first, ctx);
        if is_png(data) && (ox != 0 || oy != 0 || members.len() > 1) {
            tracing::debug!(file = %path.display(), "composing");
            png_payload = true;
        } else {
            tracing::debug!(file = %path.display(), "not composing");
            if warn_uncomposable(members, ox, oy) {
                tracing::warn!(
                    "{} can't be composed because it's a JPEG",
                    path.display()
                );
            }
            ensure_parent_dirs(path)?;
            fs::write(path, data)
                .with_context(|| format!("could not write {}", path.display()))?;
            return Ok(());
        }
    }

    ensure_parent_dirs(path)?;

    // Uncovered canvas regions stay opaque white, matching what the games
    // expect around partial tiles.
    let mut canvas = vec![0xffu8; (width * height * 4) as usize];
    for entry in members {
        if entry.header.has_data == 0 {
            continue;
        }
        let Some(thtx) = entry.thtx.as_ref() else {
            continue;
        };
        let rgba = member_rgba(entry, png_payload)?;
        let (ox, oy) = member_offsets(entry, ctx);
        for y in 0..thtx.h {
            let src = (y * thtx.w * 4) as usize;
            let dst = (((oy + y) * width + ox) * 4) as usize;
            canvas[dst..dst + (thtx.w * 4) as usize]
                .copy_from_slice(&rgba[src..src + (thtx.w * 4) as usize]);
        }
    }

    let img = RgbaImage::from_raw(width, height, canvas)
        .context("composed canvas has the wrong size")?;
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}
