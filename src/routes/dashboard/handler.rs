use axum::Extension;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::utils::{Claims, success_response};

use super::model;

const TOP_PROYECTOS: i64 = 8;

/// Tablero global de administración: distribución de proyectos, serie
/// mensual de donaciones, los más vistos y los totales.
#[axum::debug_handler]
pub async fn dashboard_admin(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let desde = model::inicio_ventana_12_meses(Utc::now());

    let por_categoria = model::proyectos_por_categoria(&state.pool).await?;
    let por_carrera = model::proyectos_por_carrera(&state.pool).await?;
    let por_estado = model::proyectos_por_estado(&state.pool).await?;
    let donaciones_por_mes = model::donaciones_por_mes(&state.pool, desde).await?;
    let top_proyectos = model::top_proyectos(&state.pool, TOP_PROYECTOS).await?;
    let resumen = model::resumen(&state.pool).await?;

    Ok(success_response(json!({
        "porCategoria": por_categoria,
        "porCarrera": por_carrera,
        "porEstado": por_estado,
        "donacionesPorMes": donaciones_por_mes,
        "topProyectos": top_proyectos,
        "resumen": resumen,
    })))
}

/// Tablero personal: los proyectos del estudiante autenticado y sus
/// métricas agregadas.
#[axum::debug_handler]
pub async fn dashboard_usuario(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let proyectos = model::proyectos_propios(&state.pool, claims.id).await?;
    let por_categoria = model::propios_por_categoria(&state.pool, claims.id).await?;
    let por_estado = model::propios_por_estado(&state.pool, claims.id).await?;

    let total_vistas: i64 = proyectos.iter().map(|p| p.vistas).sum();
    let total_likes: i64 = proyectos.iter().map(|p| p.likes).sum();

    Ok(success_response(json!({
        "proyectos": proyectos,
        "porCategoria": por_categoria,
        "porEstado": por_estado,
        "totalVistas": total_vistas,
        "totalLikes": total_likes,
    })))
}
