use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::models::ViewportClass;

/// Derives the viewport class from request headers and injects it as an
/// extension, so handlers receive it as an explicit per-request value.
pub async fn detect_viewport(mut request: Request, next: Next) -> Response {
    let viewport = classify(request.headers());
    request.extensions_mut().insert(viewport);
    next.run(request).await
}

/// `Sec-CH-UA-Mobile` is authoritative when the browser sends it; otherwise a
/// User-Agent heuristic decides. Desktop is the fallback.
fn classify(headers: &HeaderMap) -> ViewportClass {
    if let Some(hint) = headers
        .get("sec-ch-ua-mobile")
        .and_then(|hv| hv.to_str().ok())
    {
        return if hint.trim() == "?1" {
            ViewportClass::Mobile
        } else {
            ViewportClass::Desktop
        };
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|hv| hv.to_str().ok())
        .unwrap_or("");
    if is_mobile_user_agent(user_agent) {
        ViewportClass::Mobile
    } else {
        ViewportClass::Desktop
    }
}

fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    ["mobi", "android", "iphone", "ipod", "windows phone"]
        .iter()
        .any(|marker| ua.contains(marker))
}
