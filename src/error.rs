use std::sync::OnceLock;

use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

/// Incluir el mensaje del error subyacente en las respuestas 5xx.
/// Se fija una sola vez en el arranque a partir de la configuración.
static EXPOSE_ERRORS: OnceLock<bool> = OnceLock::new();

pub fn set_expose_errors(expose: bool) {
    let _ = EXPOSE_ERRORS.set(expose);
}

fn expose_errors() -> bool {
    *EXPOSE_ERRORS.get().unwrap_or(&false)
}

/// Un error de validación asociado a un campo concreto del request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorCampo {
    pub campo: String,
    pub mensaje: String,
}

impl ErrorCampo {
    pub fn new(campo: &str, mensaje: impl Into<String>) -> Self {
        Self {
            campo: campo.to_string(),
            mensaje: mensaje.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Entrada malformada o incompleta, con mensajes por campo.
    Validation(Vec<ErrorCampo>),
    /// Credenciales o token ausentes o inválidos.
    Unauthorized(String),
    /// Autenticado pero sin permiso sobre el recurso.
    Forbidden(String),
    NotFound(String),
    /// Violación de un campo único (email, cédula, ...).
    Conflict(String),
    /// Transición de estado ilegal en el flujo de moderación.
    InvalidState(String),
    /// Falla de un servicio externo en una ruta crítica.
    Upstream(String),
    /// Cualquier otra cosa; el detalle se registra y solo se expone
    /// cuando EXPOSE_ERRORS está activo.
    Internal(String),
}

impl AppError {
    pub fn validation(campo: &str, mensaje: impl Into<String>) -> Self {
        AppError::Validation(vec![ErrorCampo::new(campo, mensaje)])
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, detail) = match self {
            AppError::Validation(errores) => (
                "Errores de validación".to_string(),
                Some(json!(errores)),
            ),
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidState(msg) => (msg, None),
            AppError::Upstream(detalle) => {
                error!("Upstream failure: {}", detalle);
                (
                    "Error al comunicarse con un servicio externo".to_string(),
                    expose_errors().then(|| json!(detalle)),
                )
            }
            AppError::Internal(detalle) => {
                error!("Internal error: {}", detalle);
                (
                    "Error interno del servidor".to_string(),
                    expose_errors().then(|| json!(detalle)),
                )
            }
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            error: detail,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() {
                return AppError::Conflict("El registro ya existe".to_string());
            }
        }
        AppError::Internal(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("jwt: {}", e))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("bcrypt: {}", e))
    }
}
