//! Chain replacement: distribute a source image over a texture chain,
//! either in place into an open archive file or into the in-memory payloads.

use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::archive::{Archive, Entry};
use crate::context::Context;
use crate::formats::thtx::{TextureFormat, ThtxHeader};
use crate::version::is_th19_or_newer;

use super::{chain_box, convert, is_png, member_offsets};

fn encode_png(rgba: Vec<u8>, w: u32, h: u32) -> Result<Vec<u8>> {
    let img = RgbaImage::from_raw(w, h, rgba).context("replacement buffer has the wrong size")?;
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .context("could not encode PNG payload")?;
    Ok(out.into_inner())
}

/// Copy the chain member's sub-rectangle out of the converted full image.
fn member_rows(converted: &[u8], img_width: u32, ox: u32, oy: u32, thtx: &ThtxHeader, bpp: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((thtx.w * thtx.h * bpp) as usize);
    for y in oy..oy + thtx.h {
        let src = ((y * img_width + ox) * bpp) as usize;
        out.extend_from_slice(&converted[src..src + (thtx.w * bpp) as usize]);
    }
    out
}

/// Replace one chain's textures from `image_path`.
///
/// With an open archive file the pixel rows are written in place at each
/// member's texture offset; otherwise the in-memory payloads are swapped,
/// which is how the create path paints freshly allocated textures. For game
/// 19 and later the source image is the first member's own PNG payload,
/// redistributed over the chain and re-encoded per member.
pub fn replace_chain(
    archive: &mut Archive,
    chain: &[usize],
    image_path: &Path,
    mut anm_file: Option<&mut File>,
    game: u32,
    ctx: &Context,
) -> Result<()> {
    let members: Vec<&Entry> = chain.iter().map(|&i| &archive.entries[i]).collect();
    let (width, height) = chain_box(&members, ctx);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let mut png_payload = false;
    let image = if is_th19_or_newer(game) {
        let first = members[0];
        let data = first
            .data
            .as_ref()
            .with_context(|| format!("{}: textured entry without payload", first.name))?;
        let (ox, oy) = member_offsets(first, ctx);
        if !(is_png(data) && (ox != 0 || oy != 0 || members.len() > 1)) {
            tracing::debug!(file = %image_path.display(), "not composing");
            if ox != 0
                || oy != 0
                || (members.len() > 2
                    || (members.len() == 2 && members[0].data != members[1].data))
            {
                tracing::warn!(
                    "{} can't be composed because it's a JPEG",
                    image_path.display()
                );
            }
            return Ok(());
        }
        tracing::debug!(file = %image_path.display(), "composing");
        png_payload = true;
        image::load_from_memory(data)
            .with_context(|| format!("{}: bad PNG payload", first.name))?
            .to_rgba8()
    } else {
        image::open(image_path)
            .with_context(|| format!("could not read image {}", image_path.display()))?
            .to_rgba8()
    };

    let (img_w, img_h) = image.dimensions();
    if width > img_w || height > img_h {
        bail!(
            "wrong image dimensions for {}: {}x{} instead of {}x{}",
            image_path.display(),
            img_w,
            img_h,
            width,
            height
        );
    }
    let rgba = image.into_raw();
    let pixel_count = (img_w * img_h) as usize;

    for &index in chain {
        let entry = &mut archive.entries[index];
        if entry.header.has_data == 0 {
            continue;
        }
        let (ox, oy) = if ctx.no_offset_border {
            (0, 0)
        } else {
            (entry.header.x, entry.header.y)
        };
        let thtx = entry
            .thtx
            .as_mut()
            .with_context(|| format!("{}: textured entry without THTX header", entry.name))?;
        let mut format = thtx
            .texture_format()
            .with_context(|| format!("{}: unknown texture format {}", entry.name, thtx.format))?;
        if png_payload {
            if format != TextureFormat::Bgra8888 {
                bail!("{}: PNG-backed texture is not BGRA8888", entry.name);
            }
            format = TextureFormat::Rgba8888;
            thtx.size = (u64::from(thtx.w) * u64::from(thtx.h) * 4) as u32;
        }
        let bpp = format.bytes_per_pixel() as u32;

        let converted = convert::from_rgba(&rgba, pixel_count, format);
        let rows = member_rows(&converted, img_w, ox, oy, thtx, bpp);

        if let Some(file) = anm_file.as_deref_mut() {
            let data_base = entry.base_offset
                + u64::from(entry.header.thtx_offset)
                + ThtxHeader::SIZE as u64;
            let row_len = (thtx.w * bpp) as usize;
            for (row_index, row) in rows.chunks_exact(row_len).enumerate() {
                file.seek(SeekFrom::Start(data_base + (row_index * row_len) as u64))
                    .context("seek failed while patching archive")?;
                file.write_all(row)
                    .context("write failed while patching archive")?;
            }
        } else if png_payload {
            let encoded = encode_png(rows, thtx.w, thtx.h)?;
            thtx.size = encoded.len() as u32;
            entry.data = Some(encoded);
        } else {
            // Payloads occasionally run longer than the pixel math says
            // (zero-padded tails); paint into place rather than truncate.
            match entry.data.as_mut() {
                Some(existing) if existing.len() >= rows.len() => {
                    existing[..rows.len()].copy_from_slice(&rows);
                }
                _ => entry.data = Some(rows),
            }
        }
    }

    Ok(())
}
