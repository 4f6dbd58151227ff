//! HTTP surface for the intake pipeline and the public ledger.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/applications` | Multipart upload; runs the full intake pipeline |
//! | `POST` | `/ledger` | Append a pre-built ledger entry |
//! | `GET`  | `/ledger` | All entries in insertion order |
//! | `GET`  | `/ledger/verify/{resume_hash}` | Entries recorded for a fingerprint |
//! | `POST` | `/tokens` | Save a token set artifact |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "store_unavailable", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `duplicate_id` (409),
//! `payload_too_large` (413), `unsupported_format` (415), `corrupt_document` (422),
//! `store_unavailable` (500), `token_write_failed` (500).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::error::{IntakeError, StoreError};
use crate::extract::DocumentFormat;
use crate::fingerprint::is_valid_hash;
use crate::intake::{self, Intake, Submission};
use crate::models::{ApplicantMetadata, Document, EntryId, LedgerEntry, TokenSet};
use crate::verify::{lookup_hash, Verification};

/// Multipart field carrying the document.
pub const RESUME_FIELD: &str = "resume";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<Intake>,
}

impl AppState {
    pub fn new(intake: Intake) -> Self {
        Self {
            intake: Arc::new(intake),
        }
    }
}

/// Opens the configured stores and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let intake = intake::open(config).await?;
    let app = build_router(AppState::new(intake), &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("ledger server listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the router with CORS, tracing, timeout and body-size layers.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/applications", post(handle_submit_application))
        .route("/ledger", get(handle_list_ledger).post(handle_append_entry))
        .route("/ledger/verify/{resume_hash}", get(handle_verify))
        .route("/tokens", post(handle_save_tokens))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "{}", self.message);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        let message = err.to_string();
        match err {
            IntakeError::UnsupportedFormat(_) => AppError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_format",
                message,
            ),
            IntakeError::CorruptDocument(_) => AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "corrupt_document",
                message,
            ),
            IntakeError::StoreUnavailable(_) => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_unavailable",
                message,
            ),
            IntakeError::DuplicateId(_) => {
                AppError::new(StatusCode::CONFLICT, "duplicate_id", message)
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        IntakeError::from(err).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /applications ============

#[derive(Serialize)]
struct ApplicationResponse {
    application_id: String,
    resume_hash: String,
    sequence: EntryId,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger: Option<Vec<LedgerEntry>>,
}

/// Handler for `POST /applications`.
///
/// Expects a `resume` file part plus optional text parts named after the
/// applicant metadata fields. The part's declared content type is used as
/// the media type; if absent, it is inferred from the file name.
async fn handle_submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == RESUME_FIELD {
            let declared = field
                .content_type()
                .map(str::to_string)
                .filter(|ct| ct != "application/octet-stream");
            let inferred = field
                .file_name()
                .and_then(|f| f.rsplit_once('.'))
                .and_then(|(_, ext)| DocumentFormat::media_type_for_extension(ext))
                .map(str::to_string);
            let media_type = declared.or(inferred).unwrap_or_default();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            submission.document = Some(Document::new(bytes.to_vec(), media_type));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            set_metadata_field(&mut submission.metadata, &name, value);
        }
    }

    let outcome = state.intake.submit(submission).await?;
    let response = ApplicationResponse {
        application_id: outcome.receipt.application_id,
        resume_hash: outcome.receipt.resume_hash,
        sequence: outcome.receipt.sequence,
        warnings: outcome.warnings,
        ledger: outcome.ledger,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Keeps the status multer/axum chose, e.g. 413 when the body limit is hit.
fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    AppError::new(status, code, err.body_text())
}

fn set_metadata_field(metadata: &mut ApplicantMetadata, field: &str, value: String) {
    let value = Some(value).filter(|v| !v.trim().is_empty());
    match field {
        "name" | "fullName" => metadata.name = value,
        "email" => metadata.email = value,
        "phone" => metadata.phone = value,
        "qualification" => metadata.qualification = value,
        "experience" => metadata.experience = value,
        "skills" => metadata.skills = value,
        "gender" => metadata.gender = value,
        _ => {}
    }
}

// ============ /ledger ============

#[derive(Serialize)]
struct AppendResponse {
    message: String,
    id: EntryId,
}

/// Handler for `POST /ledger`. Any `sequence` in the body is ignored.
async fn handle_append_entry(
    State(state): State<AppState>,
    body: Result<Json<LedgerEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<AppendResponse>), AppError> {
    let Json(entry) = body?;
    if entry.application_id.trim().is_empty() {
        return Err(bad_request("application_id must not be empty"));
    }
    if !is_valid_hash(&entry.resume_hash) {
        return Err(bad_request(
            "resume_hash must be 64 lowercase hexadecimal characters",
        ));
    }

    let id = state
        .intake
        .bounded(state.intake.ledger().append(&entry))
        .await?;
    info!(application_id = %entry.application_id, id, "ledger entry appended");
    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            message: "Entry added".to_string(),
            id,
        }),
    ))
}

async fn handle_list_ledger(
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let entries = state
        .intake
        .bounded(state.intake.ledger().list_all())
        .await?;
    Ok(Json(entries))
}

async fn handle_verify(
    State(state): State<AppState>,
    Path(resume_hash): Path<String>,
) -> Result<Json<Verification>, AppError> {
    if !is_valid_hash(&resume_hash) {
        return Err(bad_request(
            "resume_hash must be 64 lowercase hexadecimal characters",
        ));
    }
    let verification = state
        .intake
        .bounded(lookup_hash(state.intake.ledger().as_ref(), &resume_hash))
        .await?;
    Ok(Json(verification))
}

// ============ POST /tokens ============

/// Keys marked `true` are normalised with the document tokenizer before
/// they are saved, so `"Node.JS"` is stored as `nodejs`.
#[derive(Deserialize)]
struct TokensRequest {
    tokens: BTreeMap<String, bool>,
    #[serde(default)]
    application_id: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_save_tokens(
    State(state): State<AppState>,
    body: Result<Json<TokensRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = body?;
    let tokens = TokenSet::from_presence_map(request.tokens);
    state
        .intake
        .token_store()
        .save(request.application_id.as_deref(), &tokens)
        .await
        .map_err(|e| {
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_write_failed",
                format!("Failed to save tokens: {:#}", e),
            )
        })?;
    Ok(Json(MessageResponse {
        message: "Tokens saved".to_string(),
    }))
}
