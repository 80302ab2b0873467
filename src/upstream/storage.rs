use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Storage;
use crate::config::Config;
use crate::error::AppError;

/// Par URL + id eliminable que el almacén devuelve por cada imagen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagenSubida {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct RespuestaUpload {
    secure_url: String,
    public_id: String,
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            cloud: config.cloudinary_cloud.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
        }
    }

    /// Firma de la petición: parámetros ordenados alfabéticamente, unidos
    /// con `&`, concatenados con el secreto y pasados por SHA-256.
    fn firmar(&self, params: &[(&str, &str)]) -> String {
        let mut ordenados: Vec<&(&str, &str)> = params.iter().collect();
        ordenados.sort_by_key(|(k, _)| *k);

        let cadena = ordenados
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(cadena.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn endpoint(&self, accion: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud, accion
        )
    }
}

#[async_trait]
impl Storage for CloudinaryClient {
    async fn subir_imagen(&self, base64: &str, carpeta: &str) -> Result<ImagenSubida, AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let firma = self.firmar(&[("folder", carpeta), ("timestamp", &timestamp)]);

        // Cloudinary acepta el contenido como data URI en el campo `file`.
        let file = if base64.starts_with("data:") {
            base64.to_string()
        } else {
            format!("data:image/png;base64,{}", base64)
        };

        let params = [
            ("file", file.as_str()),
            ("folder", carpeta),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", firma.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint("upload"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let cuerpo = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("cloudinary upload: {}", cuerpo)));
        }

        let subida = response.json::<RespuestaUpload>().await?;
        Ok(ImagenSubida {
            url: subida.secure_url,
            public_id: subida.public_id,
        })
    }

    async fn eliminar_imagen(&self, public_id: &str) -> Result<(), AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let firma = self.firmar(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", firma.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let cuerpo = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "cloudinary destroy: {}",
                cuerpo
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn la_firma_ordena_los_parametros() {
        let cliente = CloudinaryClient {
            http: reqwest::Client::new(),
            cloud: "demo".into(),
            api_key: "key".into(),
            api_secret: "secreto".into(),
        };

        // El orden de entrada no debe afectar la firma.
        let a = cliente.firmar(&[("timestamp", "100"), ("folder", "Proyectos")]);
        let b = cliente.firmar(&[("folder", "Proyectos"), ("timestamp", "100")]);
        assert_eq!(a, b);
    }
}
