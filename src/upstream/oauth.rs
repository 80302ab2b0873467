use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::OAuthProvider;
use crate::config::Config;
use crate::error::AppError;

/// Perfil mínimo que cualquier proveedor debe entregar tras el canje del
/// código de autorización.
#[derive(Debug, Clone)]
pub struct PerfilOAuth {
    pub provider: &'static str,
    pub subject_id: String,
    pub email: String,
    pub nombre: String,
    pub apellido: String,
    pub foto: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

// ===== Google =====

pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
    picture: Option<String>,
}

impl GoogleOAuth {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            callback_url: config.google_callback_url.clone(),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn url_autorizacion(&self) -> String {
        let url = Url::parse_with_params(
            "https://accounts.google.com/o/oauth2/v2/auth",
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid profile email"),
            ],
        )
        .expect("URL de autorización de Google inválida");
        url.to_string()
    }

    async fn perfil_desde_codigo(&self, code: &str) -> Result<PerfilOAuth, AppError> {
        let token = self
            .http
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("google token: {}", e)))?
            .json::<TokenResponse>()
            .await?;

        let info = self
            .http
            .get("https://openidconnect.googleapis.com/v1/userinfo")
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("google userinfo: {}", e)))?
            .json::<GoogleUserInfo>()
            .await?;

        Ok(PerfilOAuth {
            provider: "google",
            subject_id: info.sub,
            email: info.email,
            nombre: info.given_name,
            apellido: info.family_name,
            foto: info.picture,
        })
    }
}

// ===== Facebook =====

pub struct FacebookOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct FacebookMe {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    picture: Option<FacebookPicture>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: String,
}

impl FacebookOAuth {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            client_id: config.facebook_client_id.clone(),
            client_secret: config.facebook_client_secret.clone(),
            callback_url: config.facebook_callback_url.clone(),
        }
    }
}

#[async_trait]
impl OAuthProvider for FacebookOAuth {
    fn url_autorizacion(&self) -> String {
        let url = Url::parse_with_params(
            "https://www.facebook.com/v19.0/dialog/oauth",
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "email,public_profile"),
            ],
        )
        .expect("URL de autorización de Facebook inválida");
        url.to_string()
    }

    async fn perfil_desde_codigo(&self, code: &str) -> Result<PerfilOAuth, AppError> {
        let token = self
            .http
            .get("https://graph.facebook.com/v19.0/oauth/access_token")
            .query(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("facebook token: {}", e)))?
            .json::<TokenResponse>()
            .await?;

        let info = self
            .http
            .get("https://graph.facebook.com/v19.0/me")
            .query(&[("fields", "id,email,first_name,last_name,picture")])
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("facebook me: {}", e)))?
            .json::<FacebookMe>()
            .await?;

        Ok(PerfilOAuth {
            provider: "facebook",
            subject_id: info.id,
            email: info.email,
            nombre: info.first_name,
            apellido: info.last_name,
            foto: info.picture.map(|p| p.data.url),
        })
    }
}
