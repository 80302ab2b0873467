use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use backend::{
    AppState, Upstreams,
    config::Config,
    error::set_expose_errors,
    middleware::{auth_middleware, log_errors, optional_auth_middleware, require_admin},
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    set_expose_errors(config.expose_errors);

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'proyectos_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let upstreams = Upstreams::from_config(&config);

    let state = AppState {
        pool,
        config: config.clone(),
        upstreams,
    };

    // Rutas abiertas: registro, sesión, OAuth y donaciones.
    let public_routes = Router::new()
        .route("/auth/registro", post(routes::auth::registrar))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/confirm/{token}", get(routes::auth::confirmar_cuenta))
        .route(
            "/auth/recuperarpassword",
            post(routes::auth::recuperar_password),
        )
        .route(
            "/auth/recuperarpassword/{token}",
            get(routes::auth::comprobar_token),
        )
        .route(
            "/auth/nuevopassword/{token}",
            post(routes::auth::nuevo_password),
        )
        .route("/auth/google", get(routes::auth::google_redirect))
        .route("/auth/google/callback", get(routes::auth::google_callback))
        .route("/auth/google/failure", get(routes::auth::google_failure))
        .route("/auth/facebook", get(routes::auth::facebook_redirect))
        .route(
            "/auth/facebook/callback",
            get(routes::auth::facebook_callback),
        )
        .route(
            "/auth/facebook/failure",
            get(routes::auth::facebook_failure),
        )
        .route("/donaciones", post(routes::donacion::crear_donacion));

    // Lecturas de proyectos: abiertas, pero si llega un bearer token la
    // visibilidad se amplía a lo propio del visor.
    let proyecto_routes = Router::new()
        .route("/proyectos", get(routes::proyecto::listar_proyectos))
        .route(
            "/proyectos/destacados",
            get(routes::proyecto::proyectos_destacados),
        )
        .route("/proyectos/buscar", get(routes::proyecto::buscar_proyectos))
        .route(
            "/proyectos/categoria/{categoria}",
            get(routes::proyecto::proyectos_por_categoria),
        )
        .route(
            "/proyectos/carrera/{carrera}",
            get(routes::proyecto::proyectos_por_carrera),
        )
        .route(
            "/proyectos/estudiante/{id}",
            get(routes::proyecto::proyectos_por_estudiante),
        )
        .route("/proyectos/{id}", get(routes::proyecto::obtener_proyecto))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let protected_routes = Router::new()
        .route("/auth/perfil", get(routes::auth::perfil))
        .route("/auth/perfil/{id}", put(routes::auth::actualizar_perfil))
        .route(
            "/auth/password/{id}",
            put(routes::auth::actualizar_password),
        )
        .route("/proyectos", post(routes::proyecto::crear_proyecto))
        .route(
            "/proyectos/{id}",
            put(routes::proyecto::actualizar_proyecto)
                .delete(routes::proyecto::eliminar_proyecto),
        )
        .route(
            "/proyectos/{id}/like",
            post(routes::proyecto::agregar_like).delete(routes::proyecto::quitar_like),
        )
        .route(
            "/proyectos/{id}/comentarios",
            post(routes::proyecto::agregar_comentario),
        )
        .route(
            "/proyectos/{id}/comentarios/{comentario_id}",
            delete(routes::proyecto::eliminar_comentario),
        )
        .route("/dashboard/usuario", get(routes::dashboard::dashboard_usuario))
        .route("/ia/generar-titulo", post(routes::ia::generar_titulo))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Moderación y tableros: token válido y rol admin, en ese orden.
    let admin_routes = Router::new()
        .route("/admin/proyectos", get(routes::proyecto_admin::listar_todos))
        .route(
            "/admin/proyectos/destacados",
            get(routes::proyecto_admin::proyectos_destacados),
        )
        .route(
            "/admin/proyectos/buscar",
            get(routes::proyecto_admin::buscar_proyectos),
        )
        .route(
            "/admin/proyectos/categoria/{categoria}",
            get(routes::proyecto_admin::proyectos_por_categoria),
        )
        .route(
            "/admin/proyectos/carrera/{carrera}",
            get(routes::proyecto_admin::proyectos_por_carrera),
        )
        .route(
            "/admin/proyectos/{id}",
            get(routes::proyecto_admin::obtener_proyecto)
                .put(routes::proyecto_admin::actualizar_proyecto)
                .delete(routes::proyecto_admin::eliminar_proyecto),
        )
        .route(
            "/admin/proyectos/{id}/publicar",
            put(routes::proyecto_admin::publicar_proyecto),
        )
        .route(
            "/admin/proyectos/{id}/despublicar",
            put(routes::proyecto_admin::despublicar_proyecto),
        )
        .route(
            "/admin/estudiantes",
            get(routes::estudiante::listar_estudiantes),
        )
        .route(
            "/admin/estudiantes/estadisticas",
            get(routes::estudiante::estadisticas_estudiantes),
        )
        .route(
            "/admin/estudiantes/{id}",
            get(routes::estudiante::obtener_estudiante),
        )
        .route("/dashboard/admin", get(routes::dashboard::dashboard_admin))
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new().nest(
        &config.api_base_uri.clone(),
        Router::new()
            .merge(public_routes)
            .merge(proyecto_routes)
            .merge(protected_routes)
            .merge(admin_routes),
    );

    let router = router.layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
