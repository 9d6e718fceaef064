use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use image::{GenericImageView, ImageFormat, ImageReader};

use crate::models::{InlineImage, Profile};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image file not found: {path}")]
    NotFound { path: PathBuf },
    // Absence and other I/O failures (e.g. permission denied) are
    // reported separately.
    #[error("cannot read image {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("cannot decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("cannot re-encode image {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Joins the images directory with the profile's image reference. References
/// without an extension get the configured default appended, matching the
/// source deployments' handle-plus-".jpg" naming convention.
pub fn image_path(images_dir: &Path, profile: &Profile, default_extension: &str) -> PathBuf {
    let file_name = if Path::new(&profile.image_ref).extension().is_some() {
        profile.image_ref.clone()
    } else {
        format!("{}.{}", profile.image_ref, default_extension)
    };
    images_dir.join(file_name)
}

/// Resolves a profile's image from disk and re-encodes it to PNG for inline
/// embedding. Stateless per-item transform: no resizing or cropping, the
/// page's CSS handles display scaling.
pub fn resolve_image(
    images_dir: &Path,
    profile: &Profile,
    default_extension: &str,
) -> Result<InlineImage, ImageError> {
    let path = image_path(images_dir, profile, default_extension);

    let reader = ImageReader::open(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ImageError::NotFound { path: path.clone() },
        _ => ImageError::Unreadable {
            path: path.clone(),
            source: e,
        },
    })?;
    let decoded = reader
        .with_guessed_format()
        .map_err(|e| ImageError::Unreadable {
            path: path.clone(),
            source: e,
        })?
        .decode()
        .map_err(|e| ImageError::Decode {
            path: path.clone(),
            source: e,
        })?;

    let (width, height) = decoded.dimensions();
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ImageError::Encode {
            path: path.clone(),
            source: e,
        })?;

    Ok(InlineImage {
        png_base64: general_purpose::STANDARD.encode(&png),
        width,
        height,
    })
}
