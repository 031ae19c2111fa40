//! Defaults pass: fill sentinel header fields from the source images.
//!
//! The spec compiler leaves texture geometry it was not told about at
//! [`DEFAULTVAL`]. Before serialization each textured entry's image file is
//! probed (header only, no pixel decode) and the blanks are filled in:
//! entry dimensions round up to powers of two, texture dimensions take the
//! native image size, and the payload size falls out of the pixel math.
//! From game 19 on the encoded file itself becomes the payload.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use image::{ImageFormat, ImageReader};

use crate::version::is_th19_or_newer;

use super::Archive;

/// Sentinel for "fill this in from the source image".
pub const DEFAULTVAL: u32 = 0xffff_ffff;

/// Probe a PNG file's dimensions without decoding pixels.
fn probe_png(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("could not open {} for reading", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("{}: unreadable image header", path.display()))?;
    if reader.format() != Some(ImageFormat::Png) {
        bail!("{}: not a PNG file", path.display());
    }
    reader
        .into_dimensions()
        .with_context(|| format!("{}: bad PNG header", path.display()))
}

/// Load an encoded PNG/JPEG verbatim and probe its dimensions.
fn load_encoded(path: &Path) -> Result<(Vec<u8>, u32, u32)> {
    let bytes =
        fs::read(path).with_context(|| format!("could not open {} for reading", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("{}: unrecognized image data", path.display()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        bail!(
            "{}: not a PNG or JPEG file; image files must be PNG or JPEG for game 19 and later",
            path.display()
        );
    }
    let (w, h) = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .with_context(|| format!("{}: unreadable image header", path.display()))?
        .into_dimensions()
        .with_context(|| format!("{}: bad image header", path.display()))?;
    Ok((bytes, w, h))
}

impl Archive {
    /// Resolve [`DEFAULTVAL`] fields in every textured entry from its image
    /// file, loading the payload verbatim for game 19 and later.
    pub fn apply_defaults(&mut self, game: u32) -> Result<()> {
        let th19 = is_th19_or_newer(game);
        for entry in &mut self.entries {
            if entry.header.has_data == 0 {
                continue;
            }
            let filename = entry.image_filename().to_owned();
            let path = Path::new(&filename);

            let (width, height) = if th19 {
                let (bytes, w, h) = load_encoded(path)?;
                if let Some(thtx) = entry.thtx.as_mut() {
                    thtx.size = bytes.len() as u32;
                }
                entry.data = Some(bytes);
                (w, h)
            } else {
                probe_png(path)?
            };

            // Entry dimensions are texture dimensions on the GPU side and
            // must be powers of two.
            if entry.header.w == DEFAULTVAL {
                entry.header.w = width.next_power_of_two();
            }
            if entry.header.h == DEFAULTVAL {
                entry.header.h = height.next_power_of_two();
            }

            let format = entry.header.format;
            if let Some(thtx) = entry.thtx.as_mut() {
                if thtx.format == DEFAULTVAL {
                    thtx.format = format;
                }
                if thtx.w == DEFAULTVAL {
                    thtx.w = width;
                }
                if thtx.h == DEFAULTVAL {
                    thtx.h = height;
                }
                if thtx.size == DEFAULTVAL {
                    let bpp = thtx
                        .texture_format()
                        .with_context(|| {
                            format!("{filename}: unknown texture format {}", thtx.format)
                        })?
                        .bytes_per_pixel() as u64;
                    thtx.size = (u64::from(thtx.w) * u64::from(thtx.h) * bpp) as u32;
                }
            }
        }
        Ok(())
    }

    /// Give every textured entry that still has no payload a zero-filled
    /// buffer of the declared size. The composition pass then paints the
    /// real pixels into it.
    pub fn allocate_missing_payloads(&mut self) {
        for entry in &mut self.entries {
            if entry.header.has_data != 0 && entry.data.is_none() {
                let size = entry.thtx.as_ref().map_or(0, |t| t.size) as usize;
                entry.data = Some(vec![0u8; size]);
            }
        }
    }
}
