use serde::Deserialize;
use tracing::warn;

use crate::config::GalleryConfig;
use crate::models::{InlineImage, Profile, ViewportClass};
use crate::services::image_service::{self, ImageError};
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Deserialize, Default)]
pub struct GalleryQuery {
    pub q: Option<String>,
}

/// One rendered card. A profile whose image failed to resolve keeps its slot
/// in the grid and carries a notice instead of image data.
#[derive(Debug)]
pub struct CardView {
    pub name: String,
    pub link: String,
    pub image: Option<InlineImage>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct GalleryPageData {
    pub rows: Vec<Vec<CardView>>,
    pub search_query: String,
    pub columns: usize,
    pub shown_count: usize,
    pub total_count: usize,
}

/// Case-insensitive substring filter over the name field. An empty (or
/// all-whitespace) term returns the input unchanged, in the same order.
pub fn filter_profiles(profiles: &[Profile], term: &str) -> Vec<Profile> {
    let term = term.trim();
    if term.is_empty() {
        return profiles.to_vec();
    }

    let needle = term.to_lowercase();
    profiles
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Partitions items into rows of `columns`, preserving order; the last row
/// may be short. A column count below 1 is treated as 1.
pub fn layout_rows<T>(items: Vec<T>, columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let mut rows: Vec<Vec<T>> = Vec::with_capacity(items.len().div_ceil(columns));
    for item in items {
        match rows.last_mut() {
            Some(row) if row.len() < columns => row.push(item),
            _ => rows.push(vec![item]),
        }
    }
    rows
}

/// Runs the pipeline: load, filter, per-card image resolution, then grid rows
/// for the viewport's column count. An image failure only marks its own card;
/// a source failure aborts the whole page.
pub async fn build_gallery_page(
    store: &ProfileStore,
    config: &GalleryConfig,
    viewport: ViewportClass,
    query: &GalleryQuery,
) -> Result<GalleryPageData, StoreError> {
    let profiles = store.load().await?;
    let total_count = profiles.len();

    let search_query = query.q.clone().unwrap_or_default();
    let filtered = filter_profiles(&profiles, &search_query);
    let shown_count = filtered.len();

    let cards: Vec<CardView> = filtered.iter().map(|p| build_card(config, p)).collect();

    let columns = config.grid.columns_for(viewport);
    Ok(GalleryPageData {
        rows: layout_rows(cards, columns),
        search_query,
        columns,
        shown_count,
        total_count,
    })
}

fn build_card(config: &GalleryConfig, profile: &Profile) -> CardView {
    match image_service::resolve_image(&config.images_dir, profile, &config.image_extension) {
        Ok(image) => CardView {
            name: profile.name.clone(),
            link: profile.link.clone(),
            image: Some(image),
            error: None,
        },
        Err(e) => {
            warn!("Image for '{}' failed to load: {}", profile.name, e);
            CardView {
                name: profile.name.clone(),
                link: profile.link.clone(),
                image: None,
                error: Some(card_error_notice(&e)),
            }
        }
    }
}

fn card_error_notice(error: &ImageError) -> String {
    match error {
        ImageError::NotFound { .. } => "Image not found".to_string(),
        ImageError::Unreadable { .. } => "Image could not be read".to_string(),
        ImageError::Decode { .. } | ImageError::Encode { .. } => {
            "Image could not be displayed".to_string()
        }
    }
}
