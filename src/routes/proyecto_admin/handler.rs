use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::policy::{Alcance, FiltroProyectos, Visor};
use crate::utils::{Claims, Paginacion, message_response, paginated_response, success_response};

use crate::routes::proyecto::handler::{
    BusquedaQuery, ListarProyectosQuery, PaginacionQuery, eliminar_imagenes,
    parsear_categoria, parsear_estado, reemplazar_imagen,
};
use crate::routes::proyecto::model::{
    ActualizarProyecto, Orden, Proyecto, validar_actualizacion,
};

const LIMITE_BUSQUEDA_ADMIN: i64 = 50;
const LIMITE_DESTACADOS_ADMIN: i64 = 10;

/// Recuento por estado que encabeza el listado de moderación.
#[derive(Debug, Serialize, FromRow)]
pub struct ConteoPorEstado {
    pub estado: String,
    pub total: i64,
}

fn visor_admin(claims: &Claims) -> Visor {
    Visor::Admin(claims.id)
}

async fn proyecto_o_404(state: &AppState, id: Uuid) -> Result<Proyecto, AppError> {
    Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))
}

/// Listado completo de moderación: todos los estados, también lo privado,
/// con el desglose por estado para el tablero.
#[axum::debug_handler]
pub async fn listar_todos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<ListarProyectosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor_admin(&claims);
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).clamp(1, 100);

    let alcance = Alcance {
        estado: parsear_estado(q.estado.as_ref())?,
        carrera: q.carrera,
        categoria: q.categoria.as_deref().map(parsear_categoria).transpose()?,
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    let estadisticas = sqlx::query_as::<_, ConteoPorEstado>(
        "SELECT estado, COUNT(*) AS total FROM proyectos GROUP BY estado",
    )
    .fetch_all(&state.pool)
    .await?;

    let pagination = Paginacion::new(total, page, limit);
    Ok(paginated_response(
        json!({ "proyectos": proyectos, "estadisticas": estadisticas }),
        pagination,
    ))
}

/// Lectura de moderación: sin filtro de visibilidad y sin contar vistas.
#[axum::debug_handler]
pub async fn obtener_proyecto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detalle = Proyecto::detalle(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;
    Ok(success_response(detalle))
}

#[axum::debug_handler]
pub async fn actualizar_proyecto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(cambios): Json<ActualizarProyecto>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = proyecto_o_404(&state, id).await?;
    validar_actualizacion(&cambios)?;

    if let Some(base64) = &cambios.imagen {
        let (urls, ids) = reemplazar_imagen(
            state.upstreams.storage.as_ref(),
            &proyecto.imagenes_id,
            base64,
        )
        .await?;
        Proyecto::actualizar_imagenes(&state.pool, id, &urls, &ids).await?;
    }

    let actualizado = Proyecto::actualizar(&state.pool, id, &cambios).await?;
    Ok(message_response("Proyecto actualizado", actualizado))
}

#[axum::debug_handler]
pub async fn eliminar_proyecto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = proyecto_o_404(&state, id).await?;

    eliminar_imagenes(&state, &proyecto.imagenes_id).await;
    Proyecto::eliminar(&state.pool, id).await?;

    info!(admin = %claims.id, proyecto = %id, "proyecto eliminado por moderación");
    Ok(message_response("Proyecto eliminado correctamente", ()))
}

/// `en_progreso -> publicado`. La transición nula responde 400, nunca un
/// éxito silencioso.
#[axum::debug_handler]
pub async fn publicar_proyecto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = proyecto_o_404(&state, id).await?;

    let nuevo_estado = proyecto.estado().publicar()?;
    let publicado = Proyecto::cambiar_estado(&state.pool, id, nuevo_estado).await?;

    info!(admin = %claims.id, proyecto = %id, "proyecto publicado");
    Ok(message_response(
        "Proyecto publicado: ahora es visible para todos",
        publicado,
    ))
}

/// `publicado -> en_progreso`, reversible indefinidamente.
#[axum::debug_handler]
pub async fn despublicar_proyecto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = proyecto_o_404(&state, id).await?;

    let nuevo_estado = proyecto.estado().despublicar()?;
    let despublicado = Proyecto::cambiar_estado(&state.pool, id, nuevo_estado).await?;

    info!(admin = %claims.id, proyecto = %id, "proyecto despublicado");
    Ok(message_response(
        "Proyecto despublicado: vuelve a estado \"en_progreso\"",
        despublicado,
    ))
}

#[axum::debug_handler]
pub async fn proyectos_por_categoria(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(categoria): Path<String>,
    Query(q): Query<PaginacionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor_admin(&claims);
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).clamp(1, 100);

    let alcance = Alcance {
        categoria: Some(parsear_categoria(&categoria)?),
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(
        proyectos,
        Paginacion::new(total, page, limit),
    ))
}

#[axum::debug_handler]
pub async fn proyectos_por_carrera(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(carrera): Path<String>,
    Query(q): Query<PaginacionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor_admin(&claims);
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).clamp(1, 100);

    let alcance = Alcance {
        carrera: Some(carrera),
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(
        proyectos,
        Paginacion::new(total, page, limit),
    ))
}

/// Búsqueda de moderación: mismo índice de texto, sin recorte de
/// visibilidad y con un tope más generoso.
#[axum::debug_handler]
pub async fn buscar_proyectos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<BusquedaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor_admin(&claims);
    let texto = match q.q {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            return Err(AppError::validation(
                "q",
                "El término de búsqueda es obligatorio",
            ));
        }
    };

    let filtro = FiltroProyectos::componer(
        &visor,
        Alcance {
            texto: Some(texto),
            ..Default::default()
        },
    );

    let proyectos = Proyecto::listar_limitado(
        &state.pool,
        &filtro,
        Orden::Recientes,
        LIMITE_BUSQUEDA_ADMIN,
    )
    .await?;
    Ok(success_response(proyectos))
}

#[axum::debug_handler]
pub async fn proyectos_destacados(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor_admin(&claims);
    let filtro = FiltroProyectos::componer(&visor, Alcance::default());

    let proyectos = Proyecto::listar_limitado(
        &state.pool,
        &filtro,
        Orden::MasVistos,
        LIMITE_DESTACADOS_ADMIN,
    )
    .await?;
    Ok(success_response(proyectos))
}
