// src/server/assets.rs

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::server::reload::RELOAD_SCRIPT;
use crate::server::ServerState;

/// Serve a file from the output tree, injecting the reload client into
/// full HTML responses.
pub(crate) async fn serve_asset(State(state): State<ServerState>, req: Request) -> Response {
    let is_get = req.method() == Method::GET;

    let response = match ServeDir::new(state.root.as_path()).oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    };

    if state.inject_reload_script && is_get && is_full_html(&response) {
        inject_reload_script(response).await
    } else {
        response
    }
}

fn is_full_html(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"))
}

async fn inject_reload_script(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(i) => format!("{}{RELOAD_SCRIPT}{}", &html[..i], &html[i..]),
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}
