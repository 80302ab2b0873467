use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::routes::dashboard::model::Conteo;
use crate::utils::success_response;

use super::model::{Estudiante, FiltroEstudiantes};

/// Listado de administración de estudiantes, con filtros exactos por
/// carrera y nivel y parcial por apellido.
#[axum::debug_handler]
pub async fn listar_estudiantes(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroEstudiantes>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(nivel) = filtro.nivel {
        if !(1..=6).contains(&nivel) {
            return Err(AppError::validation(
                "nivel",
                "El nivel debe estar entre 1 y 6",
            ));
        }
    }

    let estudiantes = Estudiante::listar(&state.pool, &filtro).await?;
    Ok(success_response(estudiantes))
}

#[axum::debug_handler]
pub async fn obtener_estudiante(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let estudiante = Estudiante::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Estudiante no encontrado".to_string()))?;
    Ok(success_response(estudiante))
}

/// Distribución de la matrícula: total, por carrera y por nivel.
#[axum::debug_handler]
pub async fn estadisticas_estudiantes(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let total = Estudiante::contar_estudiantes(&state.pool).await?;

    let por_carrera = sqlx::query_as::<_, Conteo>(
        "SELECT carrera AS clave, COUNT(*) AS total FROM estudiantes \
         WHERE rol = 'estudiante' GROUP BY carrera ORDER BY total DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let por_nivel = sqlx::query_as::<_, Conteo>(
        "SELECT nivel::TEXT AS clave, COUNT(*) AS total FROM estudiantes \
         WHERE rol = 'estudiante' GROUP BY nivel ORDER BY nivel",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(success_response(json!({
        "total": total,
        "porCarrera": por_carrera,
        "porNivel": por_nivel,
    })))
}
