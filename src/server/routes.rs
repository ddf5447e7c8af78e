//! HTTP handlers.
//!
//! Public: `/`, `/face-login`, `/authenticate`, `/get_level`, `/update_level`
//! (lift controller), `/face-logout`, `/logout`, `/health`.
//! Session-gated: `/profile`, `/level_control`, `/change_level`.

use crate::core::{AuthOutcome, Level};
use crate::server::error::{ApiError, ApiResult};
use crate::server::pages;
use crate::server::state::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Floors an authenticated user may request.
pub const AUTHORIZED_LEVELS: [Level; 2] = [Level::One, Level::Two];

#[derive(Debug, Deserialize)]
pub struct LevelForm {
    pub level: Option<String>,
}

/// Landing page. Visiting it always ends the current session.
pub async fn home(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.sessions.clear(&headers);
    ([(SET_COOKIE, state.sessions.expired_cookie())], pages::landing()).into_response()
}

pub async fn face_login() -> impl IntoResponse {
    pages::face_login()
}

pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let upload = match multipart {
        Ok(mut multipart) => read_image_field(&mut multipart).await?,
        Err(_) => None,
    };
    let upload = upload.ok_or_else(|| ApiError::BadRequest("No image uploaded.".into()))?;

    let authenticator = state.authenticator.clone();
    let outcome = tokio::task::spawn_blocking(move || authenticator.authenticate(&upload))
        .await
        .map_err(|e| ApiError::Internal(format!("Authentication task failed: {}", e)))??;

    match outcome {
        AuthOutcome::Matched(face) => {
            let token = state.sessions.create_authenticated(&face.identifier);
            let body = Json(json!({ "status": "success", "redirect_to": "/profile" }));
            Ok(([(SET_COOKIE, state.sessions.set_cookie(&token))], body).into_response())
        }
        AuthOutcome::NoMatch { .. } => Ok(Json(json!({
            "status": "error",
            "message": "Face not recognized. Please try again.",
        }))
        .into_response()),
    }
}

/// Returns the bytes of the first non-empty `image` field.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let data = field.bytes().await.map_err(upload_error)?;
        if !data.is_empty() {
            return Ok(Some(data));
        }
    }
    Ok(None)
}

/// Bodies cut off by the upload limit are 413, anything else is a client error.
fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

pub async fn profile(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match state.sessions.current(&headers) {
        Some(session) if session.authenticated => {
            pages::profile(&session.user_name, &AUTHORIZED_LEVELS).into_response()
        }
        _ => Redirect::to("/").into_response(),
    }
}

pub async fn level_control(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match state.sessions.current(&headers) {
        Some(session) if session.authenticated => {
            pages::level_control(state.level.get()).into_response()
        }
        _ => Redirect::to("/").into_response(),
    }
}

pub async fn get_level(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "current_level": state.level.get() }))
}

/// Position report from the lift controller. No session required.
pub async fn update_level(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LevelForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let value = form.ok().and_then(|Form(f)| f.level).unwrap_or_default();
    let level = state.level.public_update(&value)?;
    Ok(Json(json!({ "status": "success", "current_level": level })))
}

pub async fn change_level(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<LevelForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let session = state.sessions.current(&headers).filter(|s| s.authenticated);
    let Some(session) = session else {
        return Err(ApiError::Unauthorized);
    };

    let value = form.ok().and_then(|Form(f)| f.level).unwrap_or_default();
    let level = state.level.authenticated_change(&value)?;
    tracing::info!("{} moved the lift to level {}", session.user_name, level);
    Ok(Json(json!({ "status": "success", "new_level": level })))
}

pub async fn face_logout() -> impl IntoResponse {
    pages::face_logout()
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.sessions.clear(&headers);
    ([(SET_COOKIE, state.sessions.expired_cookie())], Redirect::to("/")).into_response()
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "authorized_faces": state.authenticator.registry().len(),
        "current_level": state.level.get(),
    }))
}
