use std::env;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// URL pública del backend, usada en los enlaces de los correos.
    pub url_backend: String,
    /// Incluir el detalle del error subyacente en las respuestas 5xx.
    pub expose_errors: bool,
    pub stripe_secret_key: String,
    pub cloudinary_cloud: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub hf_api_token: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_callback_url: String,
    pub facebook_client_id: String,
    pub facebook_client_secret: String,
    pub facebook_callback_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .unwrap_or_else(|_| "24".into())
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(24);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_default()
                .parse()
                .unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            url_backend: env::var("URL_BACKEND")
                .unwrap_or_else(|_| "http://localhost:3000/".into()),
            expose_errors: env::var("EXPOSE_ERRORS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(cfg!(debug_assertions)),
            stripe_secret_key: env::var("STRIPE_PRIVATE_KEY").unwrap_or_default(),
            cloudinary_cloud: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            cloudinary_api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
            cloudinary_api_secret: env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_callback_url: env::var("GOOGLE_CALLBACK_URL").unwrap_or_default(),
            facebook_client_id: env::var("FACEBOOK_CLIENT_ID").unwrap_or_default(),
            facebook_client_secret: env::var("FACEBOOK_CLIENT_SECRET").unwrap_or_default(),
            facebook_callback_url: env::var("FACEBOOK_CALLBACK_URL").unwrap_or_default(),
        })
    }

    pub fn jwt_expiration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.jwt_expiration_secs)
    }
}
