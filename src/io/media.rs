// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stereo image loading and saving.
//!
//! Three source families are understood: multi-picture JPEG (`.mpo`, two
//! concatenated JPEG streams) and side-by-side JPEG/PNG (`.jps`, `.pns`).
//! Side-by-side files are stored cross-eyed, right eye in the left half,
//! which is also the order composites are written in.

use crate::error::{Result, StereoError};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::{Seek, Write};
use std::path::Path;

/// Extension of the project sidecar written next to each composite.
pub const PROJECT_EXTENSION: &str = "spct";

/// How a source file stores its two eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    MultiPicture,
    SideBySideJpeg,
    SideBySidePng,
}

impl SourceFamily {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mpo" => Some(SourceFamily::MultiPicture),
            "jps" => Some(SourceFamily::SideBySideJpeg),
            "pns" => Some(SourceFamily::SideBySidePng),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension and codec used for composites exported from this family.
    pub fn export_format(self) -> (&'static str, ImageFormat) {
        match self {
            SourceFamily::MultiPicture | SourceFamily::SideBySideJpeg => ("jps", ImageFormat::Jpeg),
            SourceFamily::SideBySidePng => ("pns", ImageFormat::Png),
        }
    }
}

/// Whether the directory scanner should list this file.
pub fn is_recognized(path: &Path) -> bool {
    SourceFamily::from_path(path).is_some() || is_project_file(path)
}

pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

/// Both eyes of a loaded source, decoded to RGB.
#[derive(Debug, Clone)]
pub struct EyeImages {
    pub left: RgbImage,
    pub right: RgbImage,
    pub family: SourceFamily,
}


/// Load the two eye images of a stereo source file.
pub fn load_eye_images(path: &Path) -> Result<EyeImages> {
    let family = SourceFamily::from_path(path)
        .ok_or_else(|| StereoError::UnsupportedSource(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;

    let (left, right) = match family {
        SourceFamily::MultiPicture => split_multi_picture(&bytes, path)?,
        SourceFamily::SideBySideJpeg => split_side_by_side(image::load_from_memory_with_format(
            &bytes,
            ImageFormat::Jpeg,
        )?)?,
        SourceFamily::SideBySidePng => split_side_by_side(image::load_from_memory_with_format(
            &bytes,
            ImageFormat::Png,
        )?)?,
    };

    if left.dimensions() != right.dimensions() {
        return Err(StereoError::UnsupportedSource(format!(
            "{}: eye sizes differ ({}x{} vs {}x{})",
            path.display(),
            left.width(),
            left.height(),
            right.width(),
            right.height()
        )));
    }

    log::info!(
        "Loaded {:?} stereo pair {} ({}x{} per eye)",
        family,
        path.display(),
        left.width(),
        left.height()
    );
    Ok(EyeImages { left, right, family })
}

/// Decode the first two full-size JPEG streams of an MPO file. Embedded
/// EXIF thumbnails also start with a JPEG marker, so candidates whose size
/// differs from the first frame are skipped.
fn split_multi_picture(bytes: &[u8], path: &Path) -> Result<(RgbImage, RgbImage)> {
    let left = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?.to_rgb8();

    let right = jpeg_starts(bytes)
        .skip(1)
        .filter_map(|start| {
            image::load_from_memory_with_format(&bytes[start..], ImageFormat::Jpeg).ok()
        })
        .map(|img| img.to_rgb8())
        .find(|img| img.dimensions() == left.dimensions())
        .ok_or_else(|| StereoError::MissingEyeFrame(path.display().to_string()))?;

    Ok((left, right))
}

/// Offsets of every JPEG start-of-image marker (FF D8 FF).
fn jpeg_starts(bytes: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bytes
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w.starts_with(&[0xFF, 0xD8, 0xFF]))
        .map(|(i, _)| i)
}

fn split_side_by_side(image: DynamicImage) -> Result<(RgbImage, RgbImage)> {
    let image = image.to_rgb8();
    let (width, height) = image.dimensions();
    if width < 2 || height == 0 {
        return Err(StereoError::UnsupportedSource(format!(
            "side-by-side image too small ({}x{})",
            width, height
        )));
    }
    let half = width / 2;
    let right = image::imageops::crop_imm(&image, 0, 0, half, height).to_image();
    let left = image::imageops::crop_imm(&image, half, 0, half, height).to_image();
    Ok((left, right))
}

/// Encode `image` into `writer` with the given codec.
pub fn write_image<W: Write + Seek>(image: &RgbImage, writer: &mut W, format: ImageFormat) -> Result<()> {
    image.write_to(writer, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_image(image, &mut cursor, format).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_family_from_extension() {
        assert_eq!(SourceFamily::from_extension("MPO"), Some(SourceFamily::MultiPicture));
        assert_eq!(SourceFamily::from_extension("pns"), Some(SourceFamily::SideBySidePng));
        assert_eq!(SourceFamily::from_extension("jpg"), None);
        assert!(is_recognized(Path::new("a/b.spct")));
        assert!(!is_recognized(Path::new("notes.txt")));
    }

    #[test]
    fn test_load_side_by_side_png_is_cross_eyed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.pns");
        let sbs = RgbImage::from_fn(8, 3, |x, _| if x < 4 { Rgb([200, 0, 0]) } else { Rgb([0, 0, 10]) });
        std::fs::write(&path, encode(&sbs, ImageFormat::Png)).unwrap();

        let eyes = load_eye_images(&path).unwrap();
        assert_eq!(eyes.left.dimensions(), (4, 3));
        assert_eq!(eyes.right.dimensions(), (4, 3));
        assert_eq!(eyes.right.get_pixel(0, 0).0, [200, 0, 0]);
        assert_eq!(eyes.left.get_pixel(0, 0).0, [0, 0, 10]);
    }

    #[test]
    fn test_load_multi_picture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.mpo");
        let mut bytes = encode(&RgbImage::from_pixel(16, 8, Rgb([20, 20, 20])), ImageFormat::Jpeg);
        bytes.extend(encode(&RgbImage::from_pixel(16, 8, Rgb([230, 230, 230])), ImageFormat::Jpeg));
        std::fs::write(&path, bytes).unwrap();

        let eyes = load_eye_images(&path).unwrap();
        assert_eq!(eyes.family, SourceFamily::MultiPicture);
        assert!(eyes.left.get_pixel(8, 4).0[0] < 60);
        assert!(eyes.right.get_pixel(8, 4).0[0] > 190);
    }

    #[test]
    fn test_multi_picture_without_second_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.mpo");
        std::fs::write(&path, encode(&RgbImage::new(8, 8), ImageFormat::Jpeg)).unwrap();
        assert!(matches!(load_eye_images(&path), Err(StereoError::MissingEyeFrame(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            load_eye_images(Path::new("photo.bmp")),
            Err(StereoError::UnsupportedSource(_))
        ));
    }
}
