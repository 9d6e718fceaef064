use std::env;
use std::path::PathBuf;

use crate::models::ViewportClass;

/// Maps the logical profile fields onto the source table's column headers.
/// Deployments disagree on naming (one ships `instagram`, another `imagem`
/// for the image column), so the mapping lives in configuration.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub name: String,
    pub image: String,
    pub link: String,
}

/// Column counts per viewport class, the single adaptation point between
/// desktop and mobile rendering.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub desktop_columns: usize,
    pub mobile_columns: usize,
}

impl GridConfig {
    pub fn columns_for(&self, viewport: ViewportClass) -> usize {
        let columns = match viewport {
            ViewportClass::Desktop => self.desktop_columns,
            ViewportClass::Mobile => self.mobile_columns,
        };
        columns.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub source_path: PathBuf,
    pub images_dir: PathBuf,
    /// Appended to image references that carry no extension of their own.
    pub image_extension: String,
    pub columns: ColumnMapping,
    pub grid: GridConfig,
    pub page_title: String,
}

impl GalleryConfig {
    /// Reads configuration from the environment (after dotenvy has loaded
    /// `.env`), falling back to defaults that match the reference deployment.
    pub fn from_env() -> Self {
        GalleryConfig {
            source_path: env_or("PROFILES_FILE", "profiles.csv").into(),
            images_dir: env_or("IMAGES_DIR", "profile-images").into(),
            image_extension: env_or("IMAGE_EXTENSION", "jpg"),
            columns: ColumnMapping {
                name: env_or("COLUMN_NAME", "name"),
                image: env_or("COLUMN_IMAGE", "image"),
                link: env_or("COLUMN_LINK", "link"),
            },
            grid: GridConfig {
                desktop_columns: env_columns("GRID_DESKTOP_COLUMNS", 4),
                mobile_columns: env_columns("GRID_MOBILE_COLUMNS", 1),
            },
            page_title: env_or("PAGE_TITLE", "Company Showcase"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_columns(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(default)
}
