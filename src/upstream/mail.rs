use async_trait::async_trait;

use super::{CorreoSaliente, Mailer};
use crate::config::Config;
use crate::error::AppError;

/// Mailer transaccional sobre un API HTTP de envío. Las plantillas viven
/// aquí; los handlers solo piden "confirmación" o "recuperación".
pub struct MailHttpClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    url_backend: String,
}

impl MailHttpClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            url_backend: config.url_backend.clone(),
        }
    }

    async fn enviar(&self, correo: CorreoSaliente<'_>) -> Result<(), AppError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&correo)
            .send()
            .await?;

        if !response.status().is_success() {
            let cuerpo = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("mail: {}", cuerpo)));
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for MailHttpClient {
    async fn enviar_confirmacion(&self, email: &str, token: &str) -> Result<(), AppError> {
        let enlace = format!("{}api/auth/confirm/{}", self.url_backend, token);
        let html = format!(
            "<h1>Bienvenido al Sistema de Proyectos Académicos</h1>\
             <p>Para activar tu cuenta y comenzar a publicar tus proyectos, \
             haz clic en el siguiente enlace:</p>\
             <p><a href=\"{enlace}\">Confirmar mi cuenta</a></p>\
             <p>Si el enlace no funciona, copia y pega esta dirección en tu \
             navegador: {enlace}</p>"
        );

        self.enviar(CorreoSaliente {
            to: email,
            subject: "Bienvenido - Sistema de Proyectos Académicos",
            html,
        })
        .await
    }

    async fn enviar_recuperacion(&self, email: &str, token: &str) -> Result<(), AppError> {
        let enlace = format!("{}api/auth/recuperarpassword/{}", self.url_backend, token);
        let html = format!(
            "<h1>Recuperación de password</h1>\
             <p>Haz clic en el siguiente enlace para reestablecer tu \
             password:</p>\
             <p><a href=\"{enlace}\">Reestablecer password</a></p>\
             <p>Si no solicitaste este cambio, ignora este correo.</p>"
        );

        self.enviar(CorreoSaliente {
            to: email,
            subject: "Recupera tu acceso - Sistema de Proyectos Académicos",
            html,
        })
        .await
    }
}
