use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use tracing::error;

use crate::models::ViewportClass;
use crate::services::gallery_service::{self, CardView, GalleryQuery};
use crate::web::GalleryState;

#[derive(Template)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub title: String,
    pub rows: Vec<Vec<CardView>>,
    pub search_query: String,
    pub columns: usize,
    pub shown_count: usize,
    pub total_count: usize,
    pub build_id: String,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

pub async fn gallery_handler(
    Extension(viewport): Extension<ViewportClass>,
    Query(query): Query<GalleryQuery>,
    State(state): State<GalleryState>,
) -> Html<String> {
    // Source-level failures abort the whole view with a single message;
    // per-card image failures are already folded into the page data.
    let data =
        match gallery_service::build_gallery_page(&state.store, &state.config, viewport, &query)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                error!("Gallery page failed: {}", e);
                let template = ErrorTemplate {
                    message: e.to_string(),
                };
                return Html(template.render().unwrap());
            }
        };

    let template = GalleryTemplate {
        title: state.config.page_title.clone(),
        rows: data.rows,
        search_query: data.search_query,
        columns: data.columns,
        shown_count: data.shown_count,
        total_count: data.total_count,
        build_id: env!("SHOWCASE_BUILD_ID").to_string(),
    };
    Html(template.render().unwrap())
}
