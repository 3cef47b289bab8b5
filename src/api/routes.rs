//! API route definitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use super::state::AppState;
use crate::storage::IndexEntry;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/incidents", get(list_incidents))
        .route("/incidents/latest", get(latest_incident))
        .route("/incidents/{id}", get(get_incident))
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "API request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": { "message": self.message } })),
        )
            .into_response()
    }
}

/// Run blocking file I/O off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::from(anyhow::Error::new(e)))?
        .map_err(ApiError::from)
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn list_incidents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let index = state.store.index().clone();
    let entries = blocking(move || Ok(index.load()?)).await?;
    let total = entries.len();
    Ok(Json(json!({ "data": entries, "meta": { "total": total } })))
}

async fn latest_incident(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let Some(path) = state.checkpoint.clone() else {
        return Ok(Json(
            json!({ "data": null, "meta": { "message": "checkpointing disabled" } }),
        ));
    };

    let latest = blocking(move || -> anyhow::Result<Option<Value>> {
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    Ok(Json(match latest {
        Some(data) => json!({ "data": data }),
        None => json!({ "data": null, "meta": { "message": "no incidents yet" } }),
    }))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    let lookup_id = id.clone();
    let found = blocking(move || -> anyhow::Result<Option<(IndexEntry, Option<String>)>> {
        let Some(entry) = store.index().find(&lookup_id)? else {
            return Ok(None);
        };
        let markdown = store.read_markdown(&entry).ok();
        Ok(Some((entry, markdown)))
    })
    .await?;

    let Some((entry, markdown)) = found else {
        return Err(ApiError::not_found(format!("incident {} not found", id)));
    };
    Ok(Json(json!({
        "data": {
            "entry": entry,
            "report_markdown": markdown,
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::detect::Severity;
    use crate::storage::ReportStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(dir: &std::path::Path) -> (Router, ReportStore) {
        let store = ReportStore::new(dir.join("reports"));
        let state = AppState {
            store: store.clone(),
            checkpoint: Some(dir.join("reports/latest_incident.json")),
        };
        (router(state), store)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn seed(store: &ReportStore, id: &str) -> IndexEntry {
        let locations = store.locations_for(id);
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(&locations.markdown, format!("# Incident Report - {id}")).unwrap();
        let entry = IndexEntry {
            incident_id: id.to_string(),
            service: "auth-service".to_string(),
            severity: Severity::Critical,
            detected_at: chrono::Utc::now(),
            report_locations: locations,
        };
        store.index().append(entry.clone()).unwrap();
        entry
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = app(dir.path());
        let (status, body) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_and_get_incident() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, store) = app(dir.path());
        seed(&store, "INC-AB12CD");
        seed(&store, "INC-EF34AB");

        let (status, body) = get_json(app.clone(), "/api/v1/incidents").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["data"][1]["incident_id"], "INC-EF34AB");

        let (status, body) = get_json(app, "/api/v1/incidents/INC-AB12CD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entry"]["severity"], "CRITICAL");
        assert_eq!(body["data"]["report_markdown"], "# Incident Report - INC-AB12CD");
    }

    #[tokio::test]
    async fn test_unknown_incident_is_404() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = app(dir.path());
        let (status, body) = get_json(app, "/api/v1/incidents/INC-000000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("INC-000000"));
    }

    #[tokio::test]
    async fn test_latest_without_checkpoint_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = app(dir.path());
        let (status, body) = get_json(app, "/api/v1/incidents/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_malformed_index_is_500() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, store) = app(dir.path());
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.index().path(), "oops").unwrap();
        let (status, _) = get_json(app, "/api/v1/incidents").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = app(dir.path());
        let (status, _) = get_json(app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
