use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::policy::Rol;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// Claims del bearer token: identidad y rol del estudiante.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub rol: Rol,
    pub exp: i64,
    pub iat: i64,
}

pub fn crear_token_jwt(
    id: Uuid,
    rol: Rol,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let ahora = Utc::now();
    let expiration = ahora
        .checked_add_signed(Duration::seconds(config.jwt_expiration().as_secs() as i64))
        .unwrap_or(ahora)
        .timestamp();

    let claims = Claims {
        id,
        rol,
        exp: expiration,
        iat: ahora.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verificar_token_jwt(
    token: &str,
    config: &Config,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Token de un solo uso para confirmación de cuenta y recuperación de
/// password. Se guarda en claro en la fila del estudiante y se anula al
/// consumirse.
pub fn generar_token_unico() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Envoltura común de todas las respuestas del API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Paginacion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginacion {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

impl Paginacion {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            page,
            pages: (total + limit - 1) / limit,
            limit,
        }
    }
}

pub fn success_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
        pagination: None,
    })
}

pub fn message_response<T: Serialize>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
        pagination: None,
    })
}

pub fn paginated_response<T: Serialize>(
    data: T,
    pagination: Paginacion,
) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
        pagination: Some(pagination),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_de_prueba() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "secreto-de-prueba".into(),
            jwt_expiration_secs: 3600,
            server_host: "::".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            url_backend: "http://localhost:3000/".into(),
            expose_errors: false,
            stripe_secret_key: String::new(),
            cloudinary_cloud: String::new(),
            cloudinary_api_key: String::new(),
            cloudinary_api_secret: String::new(),
            mail_api_url: String::new(),
            mail_api_key: String::new(),
            hf_api_token: String::new(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_callback_url: String::new(),
            facebook_client_id: String::new(),
            facebook_client_secret: String::new(),
            facebook_callback_url: String::new(),
        }
    }

    #[test]
    fn token_ida_y_vuelta_conserva_id_y_rol() {
        let config = config_de_prueba();
        let id = Uuid::new_v4();

        let token = crear_token_jwt(id, Rol::Admin, &config).unwrap();
        let claims = verificar_token_jwt(&token, &config).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.rol, Rol::Admin);
    }

    #[test]
    fn token_con_otro_secreto_es_rechazado() {
        let config = config_de_prueba();
        let mut otra = config_de_prueba();
        otra.jwt_secret = "otro-secreto".into();

        let token = crear_token_jwt(Uuid::new_v4(), Rol::Estudiante, &config).unwrap();
        assert!(verificar_token_jwt(&token, &otra).is_err());
    }

    #[test]
    fn paginacion_redondea_hacia_arriba() {
        let p = Paginacion::new(21, 1, 10);
        assert_eq!(p.pages, 3);

        let p = Paginacion::new(20, 2, 10);
        assert_eq!(p.pages, 2);

        let p = Paginacion::new(0, 1, 10);
        assert_eq!(p.pages, 0);
    }

    #[test]
    fn hash_y_verificacion_de_password() {
        let hash = hash_password("secreta123").unwrap();
        assert!(verify_password("secreta123", &hash).unwrap());
        assert!(!verify_password("otra", &hash).unwrap());
    }
}
