use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::dmed::parser::ParseWarning;
use crate::render::pdf::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Messages are shown to the end user as-is, hence Portuguese.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Por favor, selecione um arquivo.")]
    NoFileSelected,

    #[error("Erro ao ler o arquivo. Por favor, tente novamente. ({0})")]
    FileRead(String),

    #[error("Nenhum titular válido encontrado no arquivo.")]
    NoValidHolder { warnings: Vec<ParseWarning> },

    #[error("Nenhum arquivo DMED foi processado ainda.")]
    NoSession,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Imagem não carregada ainda. Tente novamente.")]
    HeaderImagePending,

    #[error("Imagem do cabeçalho indisponível: {0}")]
    HeaderImageUnavailable(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NoFileSelected => (StatusCode::BAD_REQUEST, "NO_FILE_SELECTED"),
            AppError::FileRead(_) => (StatusCode::BAD_REQUEST, "FILE_READ_ERROR"),
            AppError::NoValidHolder { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_VALID_HOLDER")
            }
            AppError::NoSession => (StatusCode::CONFLICT, "NO_SESSION"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::HeaderImagePending => {
                (StatusCode::SERVICE_UNAVAILABLE, "HEADER_IMAGE_PENDING")
            }
            AppError::HeaderImageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "HEADER_IMAGE_UNAVAILABLE")
            }
            AppError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        let message = match &self {
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                "Não foi possível gerar o PDF.".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::HeaderImageUnavailable(detail) => {
                tracing::warn!("Declaration refused, header image unavailable: {detail}");
                self.to_string()
            }
            other => other.to_string(),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let AppError::NoValidHolder { warnings } = &self {
            error["details"] = json!({ "warnings": warnings });
        }

        let body: Json<Value> = Json(json!({ "error": error }));
        (status, body).into_response()
    }
}
