//! Mask image loading and binary PBM writing.
//!
//! Masks must be stored as 1-bit images (1-bit PNG or PBM). Light pixels
//! are land unless the descriptor asks for inversion. Image rows run north to
//! south and are flipped into the mask's south-to-north row order.

use std::io::Write;
use std::path::Path;

use glam::DVec2;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageReader};

use crate::descriptor::MapDescriptor;
use crate::error::CoastError;
use crate::mask::RasterMask;

/// Luminance at or above which a decoded pixel counts as light.
const LIGHT_THRESHOLD: u8 = 128;

/// Load the mask named by a descriptor.
pub fn load_descriptor_mask(
    descriptor: &MapDescriptor,
    descriptor_path: &Path,
) -> Result<RasterMask, CoastError> {
    let path = descriptor.mask_path(descriptor_path);
    load_mask(
        &path,
        descriptor.realwidth,
        DVec2::from(descriptor.realoffset),
        descriptor.invert,
    )
}

/// Load a 1-bit mask image.
///
/// `realwidth` is the world width of the image in meters and `origin` the
/// world position of its south-west corner.
pub fn load_mask(
    path: &Path,
    realwidth: f64,
    origin: DVec2,
    invert: bool,
) -> Result<RasterMask, CoastError> {
    let io_err = |source| CoastError::Io {
        path: path.to_path_buf(),
        source,
    };
    let image_err = |source| CoastError::Image {
        path: path.to_path_buf(),
        source,
    };

    let decoder = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .into_decoder()
        .map_err(image_err)?;

    let color = decoder.original_color_type();
    if color != ExtendedColorType::L1 {
        return Err(CoastError::NotOneBit {
            path: path.to_path_buf(),
            found: format!("{color:?}"),
        });
    }

    let luma = DynamicImage::from_decoder(decoder)
        .map_err(image_err)?
        .into_luma8();
    let (width, height) = luma.dimensions();
    if width == 0 || height == 0 {
        return Err(CoastError::InvalidMetadata(format!(
            "mask image {} has no pixels",
            path.display()
        )));
    }
    if !(realwidth.is_finite() && realwidth > 0.0) {
        return Err(CoastError::InvalidMetadata(format!(
            "realwidth must be a positive length in meters, got {realwidth}"
        )));
    }

    let pixel_size = realwidth / width as f64;
    Ok(RasterMask::from_fn(width, height, pixel_size, origin, |x, y| {
        let light = luma.get_pixel(x, height - 1 - y).0[0] >= LIGHT_THRESHOLD;
        light != invert
    }))
}

/// Serialize a mask as binary PBM (P4): land is white (bit 0), sea is black.
pub fn serialize_pbm(mask: &RasterMask) -> Vec<u8> {
    let w = mask.width();
    let h = mask.height();
    let row_bytes = (w as usize).div_ceil(8);
    let header = format!("P4\n{w} {h}\n");

    let mut buf = Vec::with_capacity(header.len() + row_bytes * h as usize);
    buf.extend_from_slice(header.as_bytes());

    // North row first
    for y in (0..h).rev() {
        let mut row = vec![0u8; row_bytes];
        for x in 0..w {
            if !mask.is_land(x, y) {
                row[x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
        buf.extend_from_slice(&row);
    }

    buf
}

/// Write a mask to a binary PBM file.
pub fn write_pbm(mask: &RasterMask, path: &Path) -> Result<(), CoastError> {
    let io_err = |source| CoastError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(path).map_err(io_err)?;
    file.write_all(&serialize_pbm(mask)).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_mask() -> RasterMask {
        RasterMask::from_ascii(
            &[
                "..........", //
                "..##......", //
                "..###.....", //
                "......#...", //
                "#.........", //
            ],
            1.0,
        )
    }

    #[test]
    fn test_pbm_header_and_size() {
        let bytes = serialize_pbm(&make_test_mask());
        assert!(bytes.starts_with(b"P4\n10 5\n"));
        // Two bytes per 10-pixel row.
        assert_eq!(bytes.len(), "P4\n10 5\n".len() + 5 * 2);
    }

    #[test]
    fn test_pbm_load_preserves_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.pbm");
        let mask = make_test_mask();
        write_pbm(&mask, &path).unwrap();

        let loaded = load_mask(&path, 10_000.0, DVec2::new(5.0, 7.0), false).unwrap();
        assert_eq!(loaded.width(), 10);
        assert_eq!(loaded.height(), 5);
        assert!((loaded.header.pixel_size - 1000.0).abs() < 1e-9);
        assert_eq!(loaded.header.origin, DVec2::new(5.0, 7.0));
        for y in 0..5 {
            for x in 0..10 {
                assert_eq!(loaded.is_land(x, y), mask.is_land(x, y), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_pbm_load_inverted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.pbm");
        let mask = make_test_mask();
        write_pbm(&mask, &path).unwrap();

        let loaded = load_mask(&path, 10.0, DVec2::ZERO, true).unwrap();
        assert_eq!(loaded.land_count(), 50 - mask.land_count());
    }

    #[test]
    fn test_eight_bit_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = image::GrayImage::from_pixel(4, 4, image::Luma([200u8]));
        img.save(&path).unwrap();

        let err = load_mask(&path, 10.0, DVec2::ZERO, false).unwrap_err();
        assert!(matches!(err, CoastError::NotOneBit { .. }), "got {err}");
        assert!(err.to_string().contains("gray.png"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_mask(Path::new("/nonexistent/mask.png"), 10.0, DVec2::ZERO, false)
            .unwrap_err();
        assert!(matches!(err, CoastError::Io { .. }));
    }
}
