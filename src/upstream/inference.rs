use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::Inferencia;
use crate::config::Config;
use crate::error::AppError;

const HF_API_URL: &str = "https://router.huggingface.co/v1/chat/completions";
const MODELO: &str = "meta-llama/Llama-3.2-1B-Instruct";

#[derive(Debug, Deserialize)]
struct RespuestaChat {
    choices: Vec<Opcion>,
}

#[derive(Debug, Deserialize)]
struct Opcion {
    message: Mensaje,
}

#[derive(Debug, Deserialize)]
struct Mensaje {
    content: String,
}

pub struct HuggingFaceClient {
    http: reqwest::Client,
    api_token: String,
}

impl HuggingFaceClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_token: config.hf_api_token.clone(),
        }
    }
}

#[async_trait]
impl Inferencia for HuggingFaceClient {
    async fn generar(&self, prompt: &str) -> Result<String, AppError> {
        if self.api_token.is_empty() {
            return Err(AppError::Internal(
                "Servicio de IA no configurado".to_string(),
            ));
        }

        let response = self
            .http
            .post(HF_API_URL)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "model": MODELO,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": 0.7,
                "max_tokens": 250,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let cuerpo = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("huggingface: {}", cuerpo)));
        }

        let respuesta = response.json::<RespuestaChat>().await?;
        let texto = respuesta
            .choices
            .into_iter()
            .next()
            .map(|o| o.message.content)
            .unwrap_or_default();

        Ok(texto)
    }

    fn modelo(&self) -> &'static str {
        MODELO
    }
}

/// El modelo devuelve texto libre; extrae el primer objeto `{...}` para
/// intentar parsearlo como JSON.
pub fn extraer_json(texto: &str) -> Option<&str> {
    let inicio = texto.find('{')?;
    let fin = texto.rfind('}')?;
    if fin < inicio {
        return None;
    }
    Some(&texto[inicio..=fin])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrae_el_json_rodeado_de_ruido() {
        let texto = "Claro, aquí tienes:\n{\"titulos\": [\"a\"]}\n¡Suerte!";
        assert_eq!(extraer_json(texto), Some("{\"titulos\": [\"a\"]}"));
    }

    #[test]
    fn sin_llaves_no_hay_json() {
        assert_eq!(extraer_json("no hay nada aquí"), None);
        assert_eq!(extraer_json("} al revés {"), None);
    }

    #[test]
    fn el_recorte_es_parseable() {
        let texto = "```json\n{\"titulos\": [\"x\", \"y\"], \"ejemplo\": \"z\"}\n```";
        let recorte = extraer_json(texto).unwrap();
        let valor: serde_json::Value = serde_json::from_str(recorte).unwrap();
        assert_eq!(valor["ejemplo"], "z");
    }
}
