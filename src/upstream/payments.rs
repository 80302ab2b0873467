use async_trait::async_trait;
use serde::Deserialize;

use super::PasarelaPagos;
use crate::config::Config;
use crate::error::AppError;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1/payment_intents";

/// Resultado de un intento de pago ya confirmado por la pasarela.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultadoPago {
    pub id: String,
    pub status: String,
}

impl ResultadoPago {
    pub fn exitoso(&self) -> bool {
        self.status == "succeeded"
    }
}

pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            secret_key: config.stripe_secret_key.clone(),
        }
    }
}

#[async_trait]
impl PasarelaPagos for StripeClient {
    async fn cobrar(
        &self,
        monto: f64,
        payment_method_id: &str,
        descripcion: &str,
    ) -> Result<ResultadoPago, AppError> {
        // Stripe trabaja en centavos.
        let centavos = (monto * 100.0).round() as i64;

        let params = [
            ("amount", centavos.to_string()),
            ("currency", "usd".to_string()),
            ("description", descripcion.to_string()),
            ("payment_method", payment_method_id.to_string()),
            ("confirm", "true".to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            (
                "automatic_payment_methods[allow_redirects]",
                "never".to_string(),
            ),
        ];

        let response = self
            .http
            .post(STRIPE_API_URL)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let cuerpo = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("stripe: {}", cuerpo)));
        }

        let resultado = response.json::<ResultadoPago>().await?;
        Ok(resultado)
    }
}
