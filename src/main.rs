//! Resume Extractor - upload resumes, extract candidate fields, export them.

mod config;
mod error;
mod export;
mod extractor;
mod normalizer;
mod openrouter;
mod patterns;
mod schema;
mod store;
mod text_extractor;
mod upload;
mod vision;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use config::AppConfig;
use extractor::Extractor;
use openrouter::OpenRouterClient;
use patterns::FieldPatterns;
use schema::Candidate;
use serde::Serialize;
use std::sync::Arc;
use store::CandidateStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vision::ImageFieldExtractor;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    extractor: Arc<Extractor>,
    candidates: CandidateStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "resume_extractor=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let vision_client = OpenRouterClient::from_env(&config.vision_model, config.inference_timeout)?;
    info!("OpenRouter client initialized (model: {})", config.vision_model);

    let extractor = Extractor::new(
        FieldPatterns::compile()?,
        ImageFieldExtractor::new(Arc::new(vision_client)),
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        extractor: Arc::new(extractor),
        candidates: CandidateStore::new(),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload_files))
        .route("/candidates", get(list_candidates))
        .route("/candidates/:id", get(get_candidate))
        .route("/export/csv", get(export_csv))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct Rejection {
    filename: String,
    reason: String,
}

#[derive(Debug, Default, Serialize)]
struct UploadReport {
    accepted: Vec<Candidate>,
    rejected: Vec<Rejection>,
}

/// Upload one or more resumes (`files[]` or `file` fields) and extract each.
///
/// A failing file is reported in `rejected`; the rest of the batch continues.
/// A malformed body ends the batch: it is a 400 if nothing was processed yet,
/// otherwise the error is reported in `rejected` next to the files already stored.
async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>, (StatusCode, String)> {
    let mut report = UploadReport::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                abort_batch(&mut report, String::new(), format!("Multipart error: {}", e))?;
                break;
            }
        };
        if !matches!(field.name(), Some("files[]") | Some("file")) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                let reason = format!("Failed to read {}: {}", filename, e);
                abort_batch(&mut report, filename, reason)?;
                break;
            }
        };

        if filename.is_empty() || data.is_empty() {
            continue;
        }

        info!("Received file: {} ({} bytes)", filename, data.len());
        match process_file(&state, &filename, &data).await {
            Ok(candidate) => {
                state.candidates.insert(candidate.clone());
                report.accepted.push(candidate);
            }
            Err(reason) => {
                warn!("Rejected {}: {}", filename, reason);
                report.rejected.push(Rejection { filename, reason });
            }
        }
    }

    if report.accepted.is_empty() && report.rejected.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    info!(
        "Upload complete: {} accepted, {} rejected ({} stored)",
        report.accepted.len(),
        report.rejected.len(),
        state.candidates.len()
    );
    Ok(Json(report))
}

/// List stored candidates, newest first.
async fn list_candidates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Candidate>>, StatusCode> {
    require_admin(&headers, &state.config)?;
    Ok(Json(state.candidates.list()))
}

/// Get a candidate by ID.
async fn get_candidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Candidate>, StatusCode> {
    require_admin(&headers, &state.config)?;
    state.candidates.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Download every stored candidate as CSV.
async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_admin(&headers, &state.config).map_err(|s| (s, "Unauthorized".to_string()))?;

    let body = export::candidates_to_csv(&state.candidates.all()).map_err(|e| {
        error!("CSV export failed: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", e))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::EXPORT_FILENAME),
            ),
        ],
        body,
    ))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Handle an unreadable multipart body partway through a batch.
fn abort_batch(
    report: &mut UploadReport,
    filename: String,
    reason: String,
) -> Result<(), (StatusCode, String)> {
    if report.accepted.is_empty() && report.rejected.is_empty() {
        return Err((StatusCode::BAD_REQUEST, reason));
    }
    warn!("Upload batch cut short: {}", reason);
    report.rejected.push(Rejection { filename, reason });
    Ok(())
}

/// Allow-list, save, and extract one uploaded file.
async fn process_file(state: &AppState, filename: &str, data: &[u8]) -> Result<Candidate, String> {
    if !upload::allowed_file(filename) {
        return Err("file type not allowed".to_string());
    }

    let saved = upload::save_upload(&state.config.upload_dir, filename, data)
        .map_err(|e| format!("{:#}", e))?;

    let extraction = state
        .extractor
        .extract(&saved.request())
        .await
        .ok_or_else(|| "extraction failed".to_string())?;

    Ok(Candidate::new(
        saved.filename,
        saved.content_hash,
        extraction.record,
        extraction.strategy,
    ))
}

/// Check the bearer token when an admin token is configured.
fn require_admin(headers: &HeaderMap, config: &AppConfig) -> Result<(), StatusCode> {
    let Some(expected) = config.admin_token.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided == Some(expected) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Strategy, LOCATION_NOT_DERIVED};
    use crate::vision::tests::{write_image, FakeModel};
    use crate::text_extractor::tests::write_docx;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use tower::ServiceExt;

    const BOUNDARY: &str = "RESUMEBOUNDARY";

    /// One `files[]` part of a multipart body, without the closing boundary.
    fn file_part(filename: &str, data: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"files[]\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .into_bytes();
        part.extend_from_slice(data);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn fixture_bytes(name: &str, write: impl FnOnce(&std::path::Path)) -> Vec<u8> {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join(name);
        write(&path);
        std::fs::read(&path).unwrap()
    }

    fn test_state(upload_dir: &std::path::Path, model: FakeModel, admin: Option<&str>) -> AppState {
        let config = AppConfig::from_lookup(|key| match key {
            "UPLOAD_DIR" => Some(upload_dir.to_string_lossy().into_owned()),
            "ADMIN_TOKEN" => admin.map(str::to_string),
            _ => None,
        })
        .unwrap();

        AppState {
            config: Arc::new(config),
            extractor: Arc::new(Extractor::new(
                FieldPatterns::compile().unwrap(),
                ImageFieldExtractor::new(Arc::new(model)),
            )),
            candidates: CandidateStore::new(),
        }
    }

    #[test]
    fn test_admin_gate_open_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);
        assert!(require_admin(&HeaderMap::new(), &state.config).is_ok());
    }

    #[test]
    fn test_admin_gate_requires_bearer() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), Some("s3cret"));

        let mut headers = HeaderMap::new();
        assert_eq!(require_admin(&headers, &state.config), Err(StatusCode::UNAUTHORIZED));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert_eq!(require_admin(&headers, &state.config), Err(StatusCode::UNAUTHORIZED));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(require_admin(&headers, &state.config).is_ok());
    }

    #[tokio::test]
    async fn test_process_file_rejects_disallowed_type() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);

        let err = process_file(&state, "notes.txt", b"hello").await.unwrap_err();
        assert_eq!(err, "file type not allowed");
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_process_file_unreadable_docx_still_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);

        let candidate = process_file(&state, "my cv.docx", b"not a zip").await.unwrap();
        assert_eq!(candidate.filename, "my_cv.docx");
        assert_eq!(candidate.strategy, Strategy::Pattern);
        assert_eq!(candidate.record.location, LOCATION_NOT_DERIVED);
        assert!(dir.path().join("my_cv.docx").exists());
    }

    #[tokio::test]
    async fn test_process_file_image_failure_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::failing("401 unauthorized"), None);

        let scratch = tempfile::tempdir().unwrap();
        let image_path = scratch.path().join("scan.png");
        write_image(&image_path);
        let data = std::fs::read(&image_path).unwrap();

        let err = process_file(&state, "scan.png", &data).await.unwrap_err();
        assert_eq!(err, "extraction failed");
    }

    #[tokio::test]
    async fn test_process_file_image_success() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            dir.path(),
            FakeModel::replying("```json\n{\"Name\": \"Ravi Kumar\", \"Contact\": \"9123456789\"}\n```"),
            None,
        );

        let scratch = tempfile::tempdir().unwrap();
        let image_path = scratch.path().join("scan.png");
        write_image(&image_path);
        let data = std::fs::read(&image_path).unwrap();

        let candidate = process_file(&state, "scan.png", &data).await.unwrap();
        assert_eq!(candidate.strategy, Strategy::Model);
        assert_eq!(candidate.record.name, "Ravi Kumar");
        assert_eq!(candidate.record.phone, "9123456789");
    }

    #[tokio::test]
    async fn test_upload_batch_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::failing("model unavailable"), None);

        let docx = fixture_bytes("cv.docx", |p| {
            write_docx(p, &["JANE ROE", "jane@example.org", "Mobile 9876543210"])
        });
        let png = fixture_bytes("scan.png", |p| write_image(p));

        let mut body = file_part("cv.docx", &docx);
        body.extend(file_part("notes.txt", b"plain text"));
        body.extend(file_part("scan.png", &png));
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let resp = router(state.clone()).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let report = json_body(resp).await;
        let accepted = report["accepted"].as_array().unwrap();
        let rejected = report["rejected"].as_array().unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0]["filename"], "cv.docx");
        assert_eq!(accepted[0]["Phone"], "9876543210");
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0]["filename"], "notes.txt");
        assert_eq!(rejected[0]["reason"], "file type not allowed");
        assert_eq!(rejected[1]["filename"], "scan.png");
        assert_eq!(rejected[1]["reason"], "extraction failed");
        assert_eq!(state.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_truncated_body_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);

        let docx = fixture_bytes("cv.docx", |p| write_docx(p, &["JANE ROE"]));
        let mut body = file_part("cv.docx", &docx);
        // second part never reaches a closing boundary
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files[]\"; filename=\"late.pdf\"\r\n\r\n%PDF-1.5 trunc",
                BOUNDARY
            )
            .as_bytes(),
        );

        let resp = router(state.clone()).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let report = json_body(resp).await;
        assert_eq!(report["accepted"].as_array().unwrap().len(), 1);
        let rejected = report["rejected"].as_array().unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0]["filename"], "late.pdf");
        assert_eq!(state.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_malformed_body_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);

        let body = format!("--{}\r\nnot a header block", BOUNDARY).into_bytes();
        let resp = router(state.clone()).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.candidates.len(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_files_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeModel::replying("{}"), None);

        let body = format!("--{}--\r\n", BOUNDARY).into_bytes();
        let resp = router(state).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
