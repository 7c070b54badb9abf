use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dmed::format::{format_brl, format_cpf};
use crate::dmed::models::{Cpf, HolderRecord};
use crate::dmed::parser::parse_dmed;
use crate::dmed::search::{search_holders, SearchResult, NOT_FOUND_MESSAGE};
use crate::dmed::session::{Session, SessionSummary};
use crate::errors::AppError;
use crate::render::declaration::{declaration_file_name, render_declaration, DeclarationContext};
use crate::render::header_image::HeaderImageStatus;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Picks one holder when the file repeats a CPF. Uses the `index` from search.
#[derive(Debug, Deserialize)]
pub struct HolderQuery {
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DependentView {
    pub cpf: Cpf,
    pub cpf_formatted: String,
    pub name: String,
    pub amount: Decimal,
    pub amount_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct HolderView {
    pub index: usize,
    pub cpf: Cpf,
    pub cpf_formatted: String,
    pub name: String,
    pub own_amount: Decimal,
    pub own_amount_formatted: String,
    pub total_amount: Decimal,
    pub total_amount_formatted: String,
    pub dependents: Vec<DependentView>,
    pub declaration_file_name: String,
}

impl HolderView {
    fn new(index: usize, h: &HolderRecord) -> Self {
        Self {
            index,
            cpf: h.cpf().clone(),
            cpf_formatted: format_cpf(h.cpf()),
            name: h.name().to_string(),
            own_amount: h.own_amount(),
            own_amount_formatted: format_brl(h.own_amount()),
            total_amount: h.total_amount(),
            total_amount_formatted: format_brl(h.total_amount()),
            dependents: h
                .dependents()
                .iter()
                .map(|d| DependentView {
                    cpf: d.cpf.clone(),
                    cpf_formatted: format_cpf(&d.cpf),
                    name: d.name.clone(),
                    amount: d.amount,
                    amount_formatted: format_brl(d.amount),
                })
                .collect(),
            declaration_file_name: declaration_file_name(h.cpf()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/dmed
///
/// Multipart upload with the export in the `file` field. Any previous session
/// is discarded before parsing, whether or not this run succeeds.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionSummary>, AppError> {
    state.sessions.clear().await;

    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let content = decode_text(&bytes);
    let outcome = parse_dmed(&content);

    if outcome.holders.is_empty() {
        info!(
            "{file_name}: no valid holder ({} warnings)",
            outcome.warnings.len()
        );
        return Err(AppError::NoValidHolder {
            warnings: outcome.warnings,
        });
    }

    let session = state.sessions.replace(Session::new(file_name, outcome)).await;
    let summary = session.summary();
    info!(
        "Processed {} ({} bytes): {} holders, {} dependents, {} warnings",
        summary.file_name,
        bytes.len(),
        summary.holder_count,
        summary.dependent_count,
        summary.warnings.len()
    );
    Ok(Json(summary))
}

/// GET /api/v1/dmed/session
pub async fn handle_get_session(
    State(state): State<AppState>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = current_session(&state).await?;
    Ok(Json(session.summary()))
}

/// GET /api/v1/holders/search?q=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResult>, AppError> {
    let session = current_session(&state).await?;
    Ok(Json(search_holders(&session.holders, &params.q)))
}

/// GET /api/v1/holders/:cpf?index=
pub async fn handle_get_holder(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
    Query(params): Query<HolderQuery>,
) -> Result<Json<HolderView>, AppError> {
    let session = current_session(&state).await?;
    let (index, holder) = find_holder(&session, &cpf, params.index)?;
    Ok(Json(HolderView::new(index, holder)))
}

/// GET /api/v1/holders/:cpf/declaration?index=
///
/// Renders the holder's declaration on demand and returns it as a PDF download.
pub async fn handle_declaration(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
    Query(params): Query<HolderQuery>,
) -> Result<Response, AppError> {
    let session = current_session(&state).await?;
    let (_, holder) = find_holder(&session, &cpf, params.index)?;
    let holder = holder.clone();

    let wait = Duration::from_millis(state.config.header_image_wait_ms);
    let image = match state.header_image.wait(wait).await {
        HeaderImageStatus::Ready(image) => image,
        HeaderImageStatus::Loading => return Err(AppError::HeaderImagePending),
        HeaderImageStatus::Failed(detail) => return Err(AppError::HeaderImageUnavailable(detail)),
    };

    let ctx = DeclarationContext {
        year: state.config.declaration_year,
        city: state.config.issuer_city.clone(),
        sector: state.config.issuer_sector.clone(),
        issued_on: Local::now().date_naive(),
    };
    let file_name = declaration_file_name(holder.cpf());

    let pdf = tokio::task::spawn_blocking(move || render_declaration(&holder, &image, &ctx))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    info!("Generated {file_name} ({} bytes)", pdf.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn current_session(state: &AppState) -> Result<Arc<Session>, AppError> {
    state.sessions.current().await.ok_or(AppError::NoSession)
}

fn find_holder<'a>(
    session: &'a Session,
    raw_cpf: &str,
    index: Option<usize>,
) -> Result<(usize, &'a HolderRecord), AppError> {
    let cpf = Cpf::parse(raw_cpf)
        .ok_or_else(|| AppError::Validation(format!("CPF inválido: {raw_cpf}")))?;
    session
        .find_holder(&cpf, index)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

/// Returns the name and contents of the `file` field.
/// A missing field, or the empty part browsers send when nothing was picked,
/// counts as no file selected.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::FileRead(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("dmed.txt")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::FileRead(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::NoFileSelected);
        }
        return Ok((file_name, bytes));
    }
    Err(AppError::NoFileSelected)
}

/// DMED exports are usually ISO-8859-1; UTF-8 files are accepted as well.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
