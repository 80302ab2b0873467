use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::upstream::Storage;
use crate::policy::{Accion, Alcance, Categoria, Estado, FiltroProyectos, Recurso, Visor, autorizar};
use crate::utils::{Claims, Paginacion, message_response, paginated_response, success_response};

use super::model::{
    ActualizarProyecto, NuevoProyecto, Orden, Proyecto, validar_actualizacion,
    validar_comentario, validar_nuevo_proyecto,
};

const LIMITE_BUSQUEDA: i64 = 20;
const LIMITE_DESTACADOS: i64 = 6;

#[derive(Debug, Deserialize)]
pub struct ListarProyectosQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub estado: Option<String>,
    pub carrera: Option<String>,
    pub categoria: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaginacionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BusquedaQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComentarioRequest {
    pub texto: String,
}

fn normalizar_paginacion(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

pub(crate) fn parsear_estado(valor: Option<&String>) -> Result<Option<Estado>, AppError> {
    match valor {
        None => Ok(None),
        Some(s) => Estado::parse(s).map(Some).ok_or_else(|| {
            AppError::validation("estado", "Estado desconocido: use en_progreso o publicado")
        }),
    }
}

pub(crate) fn parsear_categoria(valor: &str) -> Result<Categoria, AppError> {
    Categoria::parse(valor).ok_or_else(|| {
        AppError::validation(
            "categoria",
            "Categoría desconocida: use academico o extracurricular",
        )
    })
}

fn recurso_de(proyecto: &Proyecto) -> Recurso {
    Recurso::Proyecto {
        autor: proyecto.autor,
        estado: proyecto.estado(),
    }
}

/// Sube la imagen al almacén y devuelve los vectores de URL e id con los
/// que se persiste el proyecto.
async fn subir_imagen(
    state: &AppState,
    base64: &str,
) -> Result<(Vec<String>, Vec<String>), AppError> {
    let subida = state.upstreams.storage.subir_imagen(base64, "Proyectos").await?;
    Ok((vec![subida.url], vec![subida.public_id]))
}

/// Borra las imágenes anteriores; un fallo del almacén no aborta la
/// operación que lo pidió, solo se registra.
pub(crate) async fn eliminar_imagenes(state: &AppState, ids: &[String]) {
    for public_id in ids {
        if let Err(e) = state.upstreams.storage.eliminar_imagen(public_id).await {
            warn!(public_id, "no se pudo eliminar la imagen: {:?}", e);
        }
    }
}

/// Reemplaza la imagen del proyecto en el almacén: borra las anteriores
/// (fallo no fatal) y sube la nueva. La subida sí es crítica.
pub(crate) async fn reemplazar_imagen(
    storage: &dyn Storage,
    anteriores: &[String],
    base64: &str,
) -> Result<(Vec<String>, Vec<String>), AppError> {
    for public_id in anteriores {
        if let Err(e) = storage.eliminar_imagen(public_id).await {
            warn!(public_id, "no se pudo eliminar la imagen: {:?}", e);
        }
    }
    let subida = storage.subir_imagen(base64, "Proyectos").await?;
    Ok((vec![subida.url], vec![subida.public_id]))
}

// ===== Listados públicos =====

#[axum::debug_handler]
pub async fn listar_proyectos(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Query(q): Query<ListarProyectosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();
    let (page, limit) = normalizar_paginacion(q.page, q.limit);

    let alcance = Alcance {
        estado: parsear_estado(q.estado.as_ref())?,
        carrera: q.carrera,
        categoria: q.categoria.as_deref().map(parsear_categoria).transpose()?,
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(proyectos, Paginacion::new(total, page, limit)))
}

#[axum::debug_handler]
pub async fn obtener_proyecto(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();

    let mut detalle = Proyecto::detalle(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let recurso = recurso_de(&detalle.proyecto.proyecto);
    autorizar(&visor, &recurso, Accion::Ver)?;

    // Toda lectura de un publicado cuenta, incluidas las del propio autor.
    // Un borrador leído por su autor no cuenta vistas.
    if detalle.proyecto.proyecto.estado() == Estado::Publicado {
        Proyecto::incrementar_vistas(&state.pool, id).await?;
        detalle.proyecto.proyecto.vistas += 1;
    }

    Ok(success_response(detalle))
}

#[axum::debug_handler]
pub async fn proyectos_por_categoria(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Path(categoria): Path<String>,
    Query(q): Query<PaginacionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();
    let (page, limit) = normalizar_paginacion(q.page, q.limit);

    let alcance = Alcance {
        categoria: Some(parsear_categoria(&categoria)?),
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(proyectos, Paginacion::new(total, page, limit)))
}

#[axum::debug_handler]
pub async fn proyectos_por_carrera(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Path(carrera): Path<String>,
    Query(q): Query<PaginacionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();
    let (page, limit) = normalizar_paginacion(q.page, q.limit);

    let alcance = Alcance {
        carrera: Some(carrera),
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(proyectos, Paginacion::new(total, page, limit)))
}

#[axum::debug_handler]
pub async fn proyectos_por_estudiante(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Path(id): Path<Uuid>,
    Query(q): Query<PaginacionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();
    let (page, limit) = normalizar_paginacion(q.page, q.limit);

    let alcance = Alcance {
        autor: Some(id),
        ..Default::default()
    };
    let filtro = FiltroProyectos::componer(&visor, alcance);

    let (proyectos, total) = Proyecto::listar(&state.pool, &filtro, page, limit).await?;
    Ok(paginated_response(proyectos, Paginacion::new(total, page, limit)))
}

#[axum::debug_handler]
pub async fn buscar_proyectos(
    State(state): State<AppState>,
    Extension(visor): Extension<Visor>,
    Query(q): Query<BusquedaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visor = visor.sin_privilegios();
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

    let proyectos =
        Proyecto::listar_limitado(&state.pool, &filtro, Orden::Recientes, LIMITE_BUSQUEDA)
            .await?;
    Ok(success_response(proyectos))
}

/// Los más vistos entre lo publicado. La vitrina es la misma para todos
/// los visitantes, autenticados o no.
#[axum::debug_handler]
pub async fn proyectos_destacados(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let filtro = FiltroProyectos::componer(&Visor::Anonimo, Alcance::default());
    let proyectos =
        Proyecto::listar_limitado(&state.pool, &filtro, Orden::MasVistos, LIMITE_DESTACADOS)
            .await?;
    Ok(success_response(proyectos))
}

// ===== Escritura (autenticado) =====

#[axum::debug_handler]
pub async fn crear_proyecto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(datos): Json<NuevoProyecto>,
) -> Result<impl IntoResponse, AppError> {
    validar_nuevo_proyecto(&datos)?;

    let imagenes = match &datos.imagen {
        Some(base64) => subir_imagen(&state, base64).await?,
        None => (vec![], vec![]),
    };

    let proyecto = Proyecto::crear(&state.pool, claims.id, &datos, imagenes).await?;

    Ok((
        StatusCode::CREATED,
        message_response(
            "Proyecto creado exitosamente. Está en estado \"en_progreso\" hasta que un \
             administrador lo publique",
            proyecto,
        ),
    ))
}

#[axum::debug_handler]
pub async fn actualizar_proyecto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(cambios): Json<ActualizarProyecto>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims));
    autorizar(&visor, &recurso_de(&proyecto), Accion::Editar)?;
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
    let proyecto = Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims));
    autorizar(&visor, &recurso_de(&proyecto), Accion::Eliminar)?;

    eliminar_imagenes(&state, &proyecto.imagenes_id).await;
    Proyecto::eliminar(&state.pool, id).await?;

    Ok(message_response("Proyecto eliminado correctamente", ()))
}

// ===== Likes =====

#[axum::debug_handler]
pub async fn agregar_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims)).sin_privilegios();
    autorizar(&visor, &recurso_de(&proyecto), Accion::Interactuar)?;

    let likes = Proyecto::agregar_like(&state.pool, id, claims.id).await?;
    Ok(message_response("Like agregado", json!({ "likes": likes })))
}

#[axum::debug_handler]
pub async fn quitar_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proyecto = Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims)).sin_privilegios();
    autorizar(&visor, &recurso_de(&proyecto), Accion::Interactuar)?;

    let likes = Proyecto::quitar_like(&state.pool, id, claims.id).await?;
    Ok(message_response("Like eliminado", json!({ "likes": likes })))
}

// ===== Comentarios =====

#[axum::debug_handler]
pub async fn agregar_comentario(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ComentarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    let texto = validar_comentario(&req.texto)?.to_string();

    let proyecto = Proyecto::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims)).sin_privilegios();
    autorizar(&visor, &recurso_de(&proyecto), Accion::Interactuar)?;

    let comentarios = Proyecto::agregar_comentario(&state.pool, id, claims.id, &texto).await?;
    Ok((
        StatusCode::CREATED,
        message_response("Comentario agregado", comentarios),
    ))
}

#[axum::debug_handler]
pub async fn eliminar_comentario(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((proyecto_id, comentario_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    Proyecto::buscar_por_id(&state.pool, proyecto_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;

    let comentario = Proyecto::comentario_por_id(&state.pool, comentario_id)
        .await?
        .filter(|c| c.proyecto_id == proyecto_id)
        .ok_or_else(|| AppError::NotFound("Comentario no encontrado".to_string()))?;

    let visor = Visor::from_claims(Some(&claims));
    autorizar(
        &visor,
        &Recurso::Comentario {
            autor: comentario.estudiante_id,
        },
        Accion::Eliminar,
    )?;

    Proyecto::eliminar_comentario(&state.pool, comentario_id).await?;
    let comentarios = Proyecto::comentarios_de(&state.pool, proyecto_id).await?;
    Ok(message_response("Comentario eliminado", comentarios))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::upstream::ImagenSubida;

    #[derive(Default)]
    struct AlmacenEnMemoria {
        eliminadas: Mutex<Vec<String>>,
        subidas: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Storage for AlmacenEnMemoria {
        async fn subir_imagen(
            &self,
            base64: &str,
            carpeta: &str,
        ) -> Result<ImagenSubida, AppError> {
            self.subidas
                .lock()
                .unwrap()
                .push((base64.to_string(), carpeta.to_string()));
            Ok(ImagenSubida {
                url: "https://img.invalid/nueva.png".to_string(),
                public_id: "nueva".to_string(),
            })
        }

        async fn eliminar_imagen(&self, public_id: &str) -> Result<(), AppError> {
            self.eliminadas.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn reemplazar_imagen_borra_las_anteriores_y_sube_la_nueva() {
        let almacen = AlmacenEnMemoria::default();
        let anteriores = vec!["vieja-1".to_string(), "vieja-2".to_string()];

        let (urls, ids) =
            reemplazar_imagen(&almacen, &anteriores, "data:image/png;base64,QUJD")
                .await
                .unwrap();

        assert_eq!(urls, vec!["https://img.invalid/nueva.png".to_string()]);
        assert_eq!(ids, vec!["nueva".to_string()]);
        assert_eq!(*almacen.eliminadas.lock().unwrap(), anteriores);

        let subidas = almacen.subidas.lock().unwrap();
        assert_eq!(subidas.len(), 1);
        assert_eq!(subidas[0].1, "Proyectos");
    }

    #[tokio::test]
    async fn reemplazar_imagen_sin_anteriores_solo_sube() {
        let almacen = AlmacenEnMemoria::default();

        let (urls, _) = reemplazar_imagen(&almacen, &[], "data:image/png;base64,QUJD")
            .await
            .unwrap();

        assert_eq!(urls.len(), 1);
        assert!(almacen.eliminadas.lock().unwrap().is_empty());
    }
}
