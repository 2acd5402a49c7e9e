//! In-memory sensorhub API speaking Mason, used as the admin client's fixture server.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared::domain::MASON_JSON;

pub mod api;
pub mod config;
pub mod mason;
pub mod store;

use api::{ApiContext, ApiError};
use store::SensorStore;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiContext,
}

impl AppState {
    pub fn new(store: SensorStore) -> Self {
        Self {
            api: ApiContext { store },
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/sensors/", get(http_list_sensors).post(http_create_sensor))
        .route(
            "/api/sensors/:sensor/",
            get(http_get_sensor)
                .put(http_update_sensor)
                .delete(http_delete_sensor),
        )
        .route("/profiles/:profile/", get(http_profile))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn mason(status: StatusCode, body: serde_json::Value) -> Response {
    (status, [(header::CONTENT_TYPE, MASON_JSON)], Json(body)).into_response()
}

fn error_response(uri: &Uri, err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.code.status()).unwrap_or(StatusCode::BAD_REQUEST);
    let mut body = serde_json::to_value(err.document(uri.path())).unwrap_or_default();
    if let Some(object) = body.as_object_mut() {
        object.insert(
            shared::protocol::CONTROLS_KEY.to_string(),
            serde_json::json!({ "profile": { "href": mason::ERROR_PROFILE } }),
        );
    }
    mason(status, body)
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

async fn http_profile(Path(profile): Path<String>, uri: Uri) -> Response {
    match mason::profile_text(&profile) {
        Some(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        None => error_response(
            &uri,
            ApiError::new(
                api::ErrorCode::NotFound,
                "Not found",
                format!("No profile named {profile}"),
            ),
        ),
    }
}

async fn http_list_sensors(State(state): State<Arc<AppState>>) -> Response {
    let sensors = api::list_sensors(&state.api).await;
    mason(StatusCode::OK, mason::collection_body(&sensors))
}

async fn http_get_sensor(
    State(state): State<Arc<AppState>>,
    Path(sensor): Path<String>,
    uri: Uri,
) -> Response {
    match api::get_sensor(&state.api, &sensor).await {
        Ok(sensor) => mason(StatusCode::OK, mason::item_body(&sensor)),
        Err(err) => error_response(&uri, err),
    }
}

async fn http_create_sensor(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let created = match api::parse_sensor_input(content_type(&headers), &body) {
        Ok(input) => api::create_sensor(&state.api, input).await,
        Err(err) => Err(err),
    };
    match created {
        Ok(sensor) => {
            let location = mason::sensor_href(&sensor.name);
            match HeaderValue::from_str(&location) {
                Ok(location) => (StatusCode::CREATED, [(header::LOCATION, location)]).into_response(),
                Err(_) => StatusCode::CREATED.into_response(),
            }
        }
        Err(err) => error_response(&uri, err),
    }
}

async fn http_update_sensor(
    State(state): State<Arc<AppState>>,
    Path(sensor): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let updated = match api::get_sensor(&state.api, &sensor).await {
        Ok(_) => match api::parse_sensor_input(content_type(&headers), &body) {
            Ok(input) => api::update_sensor(&state.api, &sensor, input).await,
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };
    match updated {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&uri, err),
    }
}

async fn http_delete_sensor(
    State(state): State<Arc<AppState>>,
    Path(sensor): Path<String>,
    uri: Uri,
) -> Response {
    match api::delete_sensor(&state.api, &sensor).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&uri, err),
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
