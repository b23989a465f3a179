use crate::error::StoreError;
use crate::store::EmailStore;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use mailtrack_types::{AnnotationsUpdate, CaptureRequest, EmailRecord};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SERVICE_NAME: &str = "Gmail Email Tracker API";

/// Builds the HTTP surface over `store`.
///
/// CORS is wide open: the capture client runs as a content script on
/// arbitrary webmail pages.
pub fn app(store: EmailStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/livez", get(|| async { "OK" }))
        .route("/readyz", get(readyz))
        .route("/capture", post(capture_email))
        .route("/emails", get(list_emails))
        .route(
            "/emails/{id}",
            get(get_email).put(update_email).delete(delete_email),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readyz(State(store): State<EmailStore>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Database is not reachable");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}

async fn capture_email(
    State(store): State<EmailStore>,
    payload: Result<Json<CaptureRequest>, JsonRejection>,
) -> Result<Json<EmailRecord>, StoreError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected capture payload");
        StoreError::Validation(rejection.body_text())
    })?;

    let record = store.capture(&request).await?;
    Ok(Json(record))
}

async fn list_emails(
    State(store): State<EmailStore>,
) -> Result<Json<Vec<EmailRecord>>, StoreError> {
    Ok(Json(store.list().await?))
}

fn email_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, StoreError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| StoreError::Validation(rejection.body_text()))
}

async fn get_email(
    State(store): State<EmailStore>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<EmailRecord>, StoreError> {
    let id = email_id(path)?;
    Ok(Json(store.get(id).await?))
}

#[derive(Debug, Deserialize)]
struct AnnotationsQuery {
    annotations: Option<String>,
}

async fn update_email(
    State(store): State<EmailStore>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<AnnotationsQuery>, QueryRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, StoreError> {
    let id = email_id(path)?;
    let Query(query) =
        query.map_err(|rejection| StoreError::Validation(rejection.body_text()))?;

    // The query parameter wins; the dashboard sends a JSON body instead.
    let annotations = match query.annotations {
        Some(annotations) => annotations,
        None => annotations_from_body(&body)?,
    };

    store.update_annotations(id, &annotations).await?;
    Ok(Json(
        serde_json::json!({ "message": "Email updated successfully" }),
    ))
}

fn annotations_from_body(body: &[u8]) -> Result<String, StoreError> {
    if body.is_empty() {
        return Err(StoreError::Validation(
            "annotations is required".to_string(),
        ));
    }

    serde_json::from_slice::<AnnotationsUpdate>(body)
        .map(|update| update.annotations)
        .map_err(|e| StoreError::Validation(format!("Invalid annotations body: {e}")))
}

async fn delete_email(
    State(store): State<EmailStore>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, StoreError> {
    let id = email_id(path)?;
    store.delete(id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Email deleted successfully" }),
    ))
}
