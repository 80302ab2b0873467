//! Colaboradores externos consumidos por red: pasarela de pagos, correo
//! transaccional, almacenamiento de imágenes, inferencia de texto y
//! proveedores OAuth. Cada uno se modela como un trait con una
//! implementación HTTP concreta; los handlers solo conocen el trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::Upstreams;
use crate::config::Config;
use crate::error::AppError;

pub mod inference;
pub mod mail;
pub mod oauth;
pub mod payments;
pub mod storage;

pub use inference::{HuggingFaceClient, extraer_json};
pub use mail::MailHttpClient;
pub use oauth::{FacebookOAuth, GoogleOAuth, PerfilOAuth};
pub use payments::{ResultadoPago, StripeClient};
pub use storage::{CloudinaryClient, ImagenSubida};

/// Pasarela de pagos: crea y confirma un intento de pago en una sola
/// llamada. Falla en ruta crítica: ninguna escritura al libro de
/// donaciones ocurre si esto no confirma.
#[async_trait]
pub trait PasarelaPagos: Send + Sync {
    async fn cobrar(
        &self,
        monto: f64,
        payment_method_id: &str,
        descripcion: &str,
    ) -> Result<ResultadoPago, AppError>;
}

/// Correo transaccional con plantilla. Falla en ruta no crítica: el
/// registro ya confirmado no se revierte si el envío falla.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn enviar_confirmacion(&self, email: &str, token: &str) -> Result<(), AppError>;
    async fn enviar_recuperacion(&self, email: &str, token: &str) -> Result<(), AppError>;
}

/// Almacenamiento binario de imágenes: sube y devuelve `{url, public_id}`,
/// elimina por id.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn subir_imagen(&self, base64: &str, carpeta: &str) -> Result<ImagenSubida, AppError>;
    async fn eliminar_imagen(&self, public_id: &str) -> Result<(), AppError>;
}

/// Generación de texto libre que luego se interpreta como JSON.
#[async_trait]
pub trait Inferencia: Send + Sync {
    async fn generar(&self, prompt: &str) -> Result<String, AppError>;
    /// Identificador del modelo, para reportarlo en las respuestas.
    fn modelo(&self) -> &'static str;
}

/// Proveedor OAuth por delegación: URL de autorización y canje del código
/// por el perfil del usuario.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn url_autorizacion(&self) -> String;
    async fn perfil_desde_codigo(&self, code: &str) -> Result<PerfilOAuth, AppError>;
}

/// Respuesta genérica de envío (la usa el mailer HTTP).
#[derive(Debug, Serialize)]
pub struct CorreoSaliente<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub html: String,
}

impl Upstreams {
    /// Construye todos los clientes una sola vez, compartiendo el mismo
    /// `reqwest::Client`.
    pub fn from_config(config: &Config) -> Upstreams {
        let http = reqwest::Client::new();

        Upstreams {
            pagos: Arc::new(StripeClient::new(http.clone(), config)),
            mailer: Arc::new(MailHttpClient::new(http.clone(), config)),
            storage: Arc::new(CloudinaryClient::new(http.clone(), config)),
            inferencia: Arc::new(HuggingFaceClient::new(http.clone(), config)),
            google: Arc::new(GoogleOAuth::new(http.clone(), config)),
            facebook: Arc::new(FacebookOAuth::new(http, config)),
        }
    }
}
