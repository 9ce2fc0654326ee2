//! Pixel payload sizing.
//!
//! Computes how many bytes a `TexImage2D`/`TexSubImage2D` upload will read
//! from the caller's buffer under the current unpack alignment, so the
//! issuing side can copy exactly that much into the record. Any arithmetic
//! overflow is a hard failure of the call: no record is sent.

use crate::glenum;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("unsupported pixel format/type combination")]
    UnsupportedFormat,
    #[error("row alignment must be 1, 2, 4 or 8 (got {0})")]
    BadAlignment(i32),
    #[error("image size computation overflows")]
    Overflow,
}

/// Byte sizes of one image upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Total bytes accessed: all padded rows plus one unpadded final row.
    pub total: u32,
    pub unpadded_row: u32,
    pub padded_row: u32,
}

/// Size an image of `width` x `height` pixels in the given format/type under
/// `alignment` (the mirrored `UNPACK_ALIGNMENT` value).
pub fn image_data_size(
    width: u32,
    height: u32,
    format: u32,
    ty: u32,
    alignment: i32,
) -> Result<ImageSize, SizeError> {
    if !matches!(alignment, 1 | 2 | 4 | 8) {
        return Err(SizeError::BadAlignment(alignment));
    }
    let group_size = bytes_per_element(ty)
        .checked_mul(elements_per_group(format, ty))
        .filter(|&s| s != 0)
        .ok_or(SizeError::UnsupportedFormat)?;

    let row_size = width.checked_mul(group_size).ok_or(SizeError::Overflow)?;

    if height <= 1 {
        let total = row_size.checked_mul(height).ok_or(SizeError::Overflow)?;
        return Ok(ImageSize {
            total,
            unpadded_row: row_size,
            padded_row: row_size,
        });
    }

    let alignment = alignment as u32;
    let padded_row = row_size
        .checked_add(alignment - 1)
        .ok_or(SizeError::Overflow)?
        / alignment
        * alignment;
    // The final row is accessed unpadded.
    let total = padded_row
        .checked_mul(height - 1)
        .and_then(|v| v.checked_add(row_size))
        .ok_or(SizeError::Overflow)?;

    Ok(ImageSize {
        total,
        unpadded_row: row_size,
        padded_row,
    })
}

fn elements_per_group(format: u32, ty: u32) -> u32 {
    // Packed types encode a whole group in one element.
    match ty {
        glenum::UNSIGNED_SHORT_5_6_5
        | glenum::UNSIGNED_SHORT_4_4_4_4
        | glenum::UNSIGNED_SHORT_5_5_5_1 => return 1,
        _ => {}
    }

    match format {
        glenum::RGB => 3,
        glenum::LUMINANCE_ALPHA => 2,
        glenum::RGBA | glenum::BGRA_EXT => 4,
        glenum::ALPHA | glenum::LUMINANCE | glenum::DEPTH_COMPONENT => 1,
        _ => 0,
    }
}

fn bytes_per_element(ty: u32) -> u32 {
    match ty {
        glenum::FLOAT | glenum::UNSIGNED_INT => 4,
        glenum::UNSIGNED_SHORT
        | glenum::SHORT
        | glenum::UNSIGNED_SHORT_5_6_5
        | glenum::UNSIGNED_SHORT_4_4_4_4
        | glenum::UNSIGNED_SHORT_5_5_5_1 => 2,
        glenum::UNSIGNED_BYTE | glenum::BYTE => 1,
        _ => 0,
    }
}
