use std::sync::Arc;

use config::Config;
use sqlx::PgPool;
use upstream::{Inferencia, Mailer, OAuthProvider, PasarelaPagos, Storage};

pub mod config;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod upstream;
pub mod utils;

/// Colaboradores externos construidos una sola vez en `main` e inyectados
/// en los handlers a través del estado de la aplicación.
#[derive(Clone)]
pub struct Upstreams {
    pub pagos: Arc<dyn PasarelaPagos>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn Storage>,
    pub inferencia: Arc<dyn Inferencia>,
    pub google: Arc<dyn OAuthProvider>,
    pub facebook: Arc<dyn OAuthProvider>,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub upstreams: Upstreams,
}
