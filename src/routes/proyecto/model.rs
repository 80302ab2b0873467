use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, ErrorCampo};
use crate::policy::{Categoria, Estado, FiltroProyectos};

#[derive(Debug, Serialize, FromRow)]
pub struct Proyecto {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub categoria: String,
    pub asignatura: Option<String>,
    pub autor: Uuid,
    pub docente_nombre: Option<String>,
    pub docente_email: Option<String>,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: Option<NaiveDate>,
    pub estado: String,
    pub imagenes: Vec<String>,
    pub imagenes_id: Vec<String>,
    pub tecnologias: Vec<String>,
    pub repositorio: Option<String>,
    pub enlace_demo: Option<String>,
    pub tags: Vec<String>,
    pub carrera: String,
    pub nivel: Option<i32>,
    pub publico: bool,
    pub vistas: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proyecto {
    pub fn estado(&self) -> Estado {
        Estado::parse(&self.estado).unwrap_or(Estado::EnProgreso)
    }
}

/// Fila de listado y detalle: el proyecto más los datos del autor y el
/// recuento de likes, resueltos en la misma consulta.
#[derive(Debug, Serialize, FromRow)]
pub struct ProyectoConAutor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub proyecto: Proyecto,
    pub autor_nombre: String,
    pub autor_apellido: String,
    pub autor_carrera: String,
    pub autor_email: String,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct ProyectoDetalle {
    #[serde(flatten)]
    pub proyecto: ProyectoConAutor,
    pub colaboradores: Vec<ColaboradorResumen>,
    pub comentarios: Vec<ComentarioConAutor>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ColaboradorResumen {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub carrera: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Comentario {
    pub id: Uuid,
    pub proyecto_id: Uuid,
    pub estudiante_id: Uuid,
    pub texto: String,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ComentarioConAutor {
    pub id: Uuid,
    pub estudiante_id: Uuid,
    pub texto: String,
    pub fecha: DateTime<Utc>,
    pub autor_nombre: String,
    pub autor_apellido: String,
}

/// Payload de creación. La imagen llega en base64 y se sube al almacén
/// antes del INSERT; `estado` no es un campo del cliente.
#[derive(Debug, Deserialize)]
pub struct NuevoProyecto {
    pub titulo: String,
    pub descripcion: String,
    pub categoria: String,
    pub asignatura: Option<String>,
    pub docente_nombre: Option<String>,
    pub docente_email: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default)]
    pub tecnologias: Vec<String>,
    pub repositorio: Option<String>,
    pub enlace_demo: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub carrera: Option<String>,
    pub nivel: Option<i32>,
    pub publico: Option<bool>,
    #[serde(default)]
    pub colaboradores: Vec<Uuid>,
    pub imagen: Option<String>,
}

/// Actualización parcial: solo los campos presentes cambian. `estado`
/// queda fuera a propósito; solo se mueve por las rutas de moderación.
#[derive(Debug, Default, Deserialize)]
pub struct ActualizarProyecto {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub asignatura: Option<String>,
    pub docente_nombre: Option<String>,
    pub docente_email: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub tecnologias: Option<Vec<String>>,
    pub repositorio: Option<String>,
    pub enlace_demo: Option<String>,
    pub tags: Option<Vec<String>>,
    pub carrera: Option<String>,
    pub nivel: Option<i32>,
    pub publico: Option<bool>,
    pub colaboradores: Option<Vec<Uuid>>,
    pub imagen: Option<String>,
}

/// Criterio de orden de los listados.
#[derive(Debug, Clone, Copy)]
pub enum Orden {
    Recientes,
    MasVistos,
}

impl Orden {
    fn sql(self) -> &'static str {
        match self {
            Orden::Recientes => " ORDER BY p.created_at DESC",
            Orden::MasVistos => " ORDER BY p.vistas DESC, p.created_at DESC",
        }
    }
}

/// Los tags se guardan normalizados en minúsculas.
fn normalizar_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

const SELECT_CON_AUTOR: &str = "SELECT p.*, \
     a.nombre AS autor_nombre, a.apellido AS autor_apellido, \
     a.carrera AS autor_carrera, a.email AS autor_email, \
     (SELECT COUNT(*) FROM proyecto_likes l WHERE l.proyecto_id = p.id) AS likes \
     FROM proyectos p JOIN estudiantes a ON a.id = p.autor WHERE 1=1";

impl Proyecto {
    pub async fn crear(
        pool: &PgPool,
        autor: Uuid,
        datos: &NuevoProyecto,
        imagenes: (Vec<String>, Vec<String>),
    ) -> Result<Self, sqlx::Error> {
        let proyecto = sqlx::query_as::<_, Proyecto>(
            r#"
            INSERT INTO proyectos (
                titulo, descripcion, categoria, asignatura, autor,
                docente_nombre, docente_email, fecha_inicio, fecha_fin,
                tecnologias, repositorio, enlace_demo, tags, carrera, nivel,
                publico, imagenes, imagenes_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(&datos.titulo)
        .bind(&datos.descripcion)
        .bind(&datos.categoria)
        .bind(&datos.asignatura)
        .bind(autor)
        .bind(&datos.docente_nombre)
        .bind(&datos.docente_email)
        .bind(datos.fecha_inicio)
        .bind(datos.fecha_fin)
        .bind(&datos.tecnologias)
        .bind(&datos.repositorio)
        .bind(&datos.enlace_demo)
        .bind(normalizar_tags(&datos.tags))
        .bind(&datos.carrera)
        .bind(datos.nivel)
        .bind(datos.publico.unwrap_or(true))
        .bind(imagenes.0)
        .bind(imagenes.1)
        .fetch_one(pool)
        .await?;

        if !datos.colaboradores.is_empty() {
            Self::reemplazar_colaboradores(pool, proyecto.id, &datos.colaboradores).await?;
        }

        Ok(proyecto)
    }

    pub async fn buscar_por_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Proyecto>("SELECT * FROM proyectos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn detalle(pool: &PgPool, id: Uuid) -> Result<Option<ProyectoDetalle>, sqlx::Error> {
        let fila = sqlx::query_as::<_, ProyectoConAutor>(&format!(
            "{} AND p.id = $1",
            SELECT_CON_AUTOR
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(proyecto) = fila else {
            return Ok(None);
        };

        let colaboradores = sqlx::query_as::<_, ColaboradorResumen>(
            "SELECT e.id, e.nombre, e.apellido, e.carrera \
             FROM proyecto_colaboradores pc \
             JOIN estudiantes e ON e.id = pc.estudiante_id \
             WHERE pc.proyecto_id = $1 ORDER BY e.apellido",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let comentarios = Self::comentarios_de(pool, id).await?;

        Ok(Some(ProyectoDetalle {
            proyecto,
            colaboradores,
            comentarios,
        }))
    }

    /// Listado filtrado y paginado. El filtro ya viene compuesto por la
    /// política según el visor; aquí solo se ejecuta.
    pub async fn listar(
        pool: &PgPool,
        filtro: &FiltroProyectos,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ProyectoConAutor>, i64), sqlx::Error> {
        let total = Self::contar(pool, filtro).await?;

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(SELECT_CON_AUTOR);
        filtro.aplicar(&mut qb);
        qb.push(Orden::Recientes.sql());
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * limit);

        let filas = qb.build_query_as::<ProyectoConAutor>().fetch_all(pool).await?;
        Ok((filas, total))
    }

    /// Listado acotado sin paginación (búsqueda, destacados).
    pub async fn listar_limitado(
        pool: &PgPool,
        filtro: &FiltroProyectos,
        orden: Orden,
        limit: i64,
    ) -> Result<Vec<ProyectoConAutor>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(SELECT_CON_AUTOR);
        filtro.aplicar(&mut qb);
        qb.push(orden.sql());
        qb.push(" LIMIT ");
        qb.push_bind(limit);

        qb.build_query_as::<ProyectoConAutor>().fetch_all(pool).await
    }

    pub async fn contar(pool: &PgPool, filtro: &FiltroProyectos) -> Result<i64, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM proyectos p WHERE 1=1");
        filtro.aplicar(&mut qb);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn actualizar(
        pool: &PgPool,
        id: Uuid,
        cambios: &ActualizarProyecto,
    ) -> Result<Self, sqlx::Error> {
        let proyecto = sqlx::query_as::<_, Proyecto>(
            r#"
            UPDATE proyectos SET
                titulo = COALESCE($2, titulo),
                descripcion = COALESCE($3, descripcion),
                categoria = COALESCE($4, categoria),
                asignatura = COALESCE($5, asignatura),
                docente_nombre = COALESCE($6, docente_nombre),
                docente_email = COALESCE($7, docente_email),
                fecha_inicio = COALESCE($8, fecha_inicio),
                fecha_fin = COALESCE($9, fecha_fin),
                tecnologias = COALESCE($10, tecnologias),
                repositorio = COALESCE($11, repositorio),
                enlace_demo = COALESCE($12, enlace_demo),
                tags = COALESCE($13, tags),
                carrera = COALESCE($14, carrera),
                nivel = COALESCE($15, nivel),
                publico = COALESCE($16, publico),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&cambios.titulo)
        .bind(&cambios.descripcion)
        .bind(&cambios.categoria)
        .bind(&cambios.asignatura)
        .bind(&cambios.docente_nombre)
        .bind(&cambios.docente_email)
        .bind(cambios.fecha_inicio)
        .bind(cambios.fecha_fin)
        .bind(&cambios.tecnologias)
        .bind(&cambios.repositorio)
        .bind(&cambios.enlace_demo)
        .bind(cambios.tags.as_deref().map(normalizar_tags))
        .bind(&cambios.carrera)
        .bind(cambios.nivel)
        .bind(cambios.publico)
        .fetch_one(pool)
        .await?;

        if let Some(colaboradores) = &cambios.colaboradores {
            Self::reemplazar_colaboradores(pool, id, colaboradores).await?;
        }

        Ok(proyecto)
    }

    pub async fn actualizar_imagenes(
        pool: &PgPool,
        id: Uuid,
        urls: &[String],
        ids: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE proyectos SET imagenes = $2, imagenes_id = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(urls)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn eliminar(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM proyectos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Persiste un cambio de estado ya validado por la máquina de estados.
    pub async fn cambiar_estado(
        pool: &PgPool,
        id: Uuid,
        estado: Estado,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Proyecto>(
            "UPDATE proyectos SET estado = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(estado.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn incrementar_vistas(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE proyectos SET vistas = vistas + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    async fn reemplazar_colaboradores(
        pool: &PgPool,
        proyecto_id: Uuid,
        colaboradores: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM proyecto_colaboradores WHERE proyecto_id = $1")
            .bind(proyecto_id)
            .execute(pool)
            .await?;

        for estudiante_id in colaboradores {
            sqlx::query(
                "INSERT INTO proyecto_colaboradores (proyecto_id, estudiante_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(proyecto_id)
            .bind(estudiante_id)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    // ===== Likes =====

    /// Semántica de conjunto: dar like dos veces deja un solo like y no es
    /// un error. Devuelve el recuento resultante.
    pub async fn agregar_like(
        pool: &PgPool,
        proyecto_id: Uuid,
        estudiante_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query(
            "INSERT INTO proyecto_likes (proyecto_id, estudiante_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(proyecto_id)
        .bind(estudiante_id)
        .execute(pool)
        .await?;

        Self::contar_likes(pool, proyecto_id).await
    }

    /// Quitar un like inexistente tampoco es un error.
    pub async fn quitar_like(
        pool: &PgPool,
        proyecto_id: Uuid,
        estudiante_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query(
            "DELETE FROM proyecto_likes WHERE proyecto_id = $1 AND estudiante_id = $2",
        )
        .bind(proyecto_id)
        .bind(estudiante_id)
        .execute(pool)
        .await?;

        Self::contar_likes(pool, proyecto_id).await
    }

    pub async fn contar_likes(pool: &PgPool, proyecto_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM proyecto_likes WHERE proyecto_id = $1",
        )
        .bind(proyecto_id)
        .fetch_one(pool)
        .await
    }

    // ===== Comentarios =====

    pub async fn agregar_comentario(
        pool: &PgPool,
        proyecto_id: Uuid,
        estudiante_id: Uuid,
        texto: &str,
    ) -> Result<Vec<ComentarioConAutor>, sqlx::Error> {
        sqlx::query(
            "INSERT INTO comentarios (proyecto_id, estudiante_id, texto) VALUES ($1, $2, $3)",
        )
        .bind(proyecto_id)
        .bind(estudiante_id)
        .bind(texto)
        .execute(pool)
        .await?;

        Self::comentarios_de(pool, proyecto_id).await
    }

    pub async fn comentario_por_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Comentario>, sqlx::Error> {
        sqlx::query_as::<_, Comentario>("SELECT * FROM comentarios WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn eliminar_comentario(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM comentarios WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn comentarios_de(
        pool: &PgPool,
        proyecto_id: Uuid,
    ) -> Result<Vec<ComentarioConAutor>, sqlx::Error> {
        sqlx::query_as::<_, ComentarioConAutor>(
            "SELECT c.id, c.estudiante_id, c.texto, c.fecha, \
             e.nombre AS autor_nombre, e.apellido AS autor_apellido \
             FROM comentarios c JOIN estudiantes e ON e.id = c.estudiante_id \
             WHERE c.proyecto_id = $1 ORDER BY c.fecha",
        )
        .bind(proyecto_id)
        .fetch_all(pool)
        .await
    }
}

// ===== Validación =====

fn es_url(valor: &str) -> bool {
    valor.starts_with("http://") || valor.starts_with("https://")
}

pub fn validar_nuevo_proyecto(datos: &NuevoProyecto) -> Result<(), AppError> {
    let mut errores = Vec::new();

    let titulo = datos.titulo.trim();
    if titulo.chars().count() < 5 || titulo.chars().count() > 200 {
        errores.push(ErrorCampo::new(
            "titulo",
            "El título debe tener entre 5 y 200 caracteres",
        ));
    }

    let descripcion = datos.descripcion.trim();
    if descripcion.chars().count() < 20 || descripcion.chars().count() > 2000 {
        errores.push(ErrorCampo::new(
            "descripcion",
            "La descripción debe tener entre 20 y 2000 caracteres",
        ));
    }

    if Categoria::parse(&datos.categoria).is_none() {
        errores.push(ErrorCampo::new(
            "categoria",
            "La categoría debe ser \"academico\" o \"extracurricular\"",
        ));
    }

    if datos.fecha_inicio.is_none() {
        errores.push(ErrorCampo::new(
            "fechaInicio",
            "La fecha de inicio es obligatoria",
        ));
    }

    if let (Some(inicio), Some(fin)) = (datos.fecha_inicio, datos.fecha_fin) {
        if fin < inicio {
            errores.push(ErrorCampo::new(
                "fechaFin",
                "La fecha de fin no puede ser anterior a la de inicio",
            ));
        }
    }

    match &datos.carrera {
        Some(c) if !c.trim().is_empty() => {}
        _ => errores.push(ErrorCampo::new("carrera", "La carrera es obligatoria")),
    }

    if let Some(nivel) = datos.nivel {
        if !(1..=6).contains(&nivel) {
            errores.push(ErrorCampo::new("nivel", "El nivel debe estar entre 1 y 6"));
        }
    }

    if let Some(repo) = &datos.repositorio {
        if !repo.is_empty() && !es_url(repo) {
            errores.push(ErrorCampo::new(
                "repositorio",
                "El repositorio debe ser una URL http(s)",
            ));
        }
    }

    if let Some(demo) = &datos.enlace_demo {
        if !demo.is_empty() && !es_url(demo) {
            errores.push(ErrorCampo::new(
                "enlaceDemo",
                "El enlace de demo debe ser una URL http(s)",
            ));
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errores))
    }
}

pub fn validar_actualizacion(cambios: &ActualizarProyecto) -> Result<(), AppError> {
    let mut errores = Vec::new();

    if let Some(titulo) = &cambios.titulo {
        let titulo = titulo.trim();
        if titulo.chars().count() < 5 || titulo.chars().count() > 200 {
            errores.push(ErrorCampo::new(
                "titulo",
                "El título debe tener entre 5 y 200 caracteres",
            ));
        }
    }

    if let Some(descripcion) = &cambios.descripcion {
        let descripcion = descripcion.trim();
        if descripcion.chars().count() < 20 || descripcion.chars().count() > 2000 {
            errores.push(ErrorCampo::new(
                "descripcion",
                "La descripción debe tener entre 20 y 2000 caracteres",
            ));
        }
    }

    if let Some(categoria) = &cambios.categoria {
        if Categoria::parse(categoria).is_none() {
            errores.push(ErrorCampo::new(
                "categoria",
                "La categoría debe ser \"academico\" o \"extracurricular\"",
            ));
        }
    }

    if let (Some(inicio), Some(fin)) = (cambios.fecha_inicio, cambios.fecha_fin) {
        if fin < inicio {
            errores.push(ErrorCampo::new(
                "fechaFin",
                "La fecha de fin no puede ser anterior a la de inicio",
            ));
        }
    }

    if let Some(nivel) = cambios.nivel {
        if !(1..=6).contains(&nivel) {
            errores.push(ErrorCampo::new("nivel", "El nivel debe estar entre 1 y 6"));
        }
    }

    if let Some(repo) = &cambios.repositorio {
        if !repo.is_empty() && !es_url(repo) {
            errores.push(ErrorCampo::new(
                "repositorio",
                "El repositorio debe ser una URL http(s)",
            ));
        }
    }

    if let Some(demo) = &cambios.enlace_demo {
        if !demo.is_empty() && !es_url(demo) {
            errores.push(ErrorCampo::new(
                "enlaceDemo",
                "El enlace de demo debe ser una URL http(s)",
            ));
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errores))
    }
}

/// Comentario: no vacío tras recortar espacios y de 500 caracteres máximo.
pub fn validar_comentario(texto: &str) -> Result<&str, AppError> {
    let texto = texto.trim();
    if texto.is_empty() {
        return Err(AppError::validation(
            "texto",
            "El comentario no puede estar vacío",
        ));
    }
    if texto.chars().count() > 500 {
        return Err(AppError::validation(
            "texto",
            "El comentario no puede superar los 500 caracteres",
        ));
    }
    Ok(texto)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nuevo_valido() -> NuevoProyecto {
        NuevoProyecto {
            titulo: "Sistema de riego automatizado".to_string(),
            descripcion: "Prototipo de riego con sensores de humedad y control remoto"
                .to_string(),
            categoria: "academico".to_string(),
            asignatura: None,
            docente_nombre: None,
            docente_email: None,
            fecha_inicio: NaiveDate::from_ymd_opt(2026, 1, 15),
            fecha_fin: None,
            tecnologias: vec![],
            repositorio: None,
            enlace_demo: None,
            tags: vec![],
            carrera: Some("Electrónica".to_string()),
            nivel: Some(4),
            publico: None,
            colaboradores: vec![],
            imagen: None,
        }
    }

    #[test]
    fn un_proyecto_valido_pasa() {
        assert!(validar_nuevo_proyecto(&nuevo_valido()).is_ok());
    }

    #[test]
    fn titulo_corto_y_categoria_invalida_acumulan_errores() {
        let mut datos = nuevo_valido();
        datos.titulo = "Ab".to_string();
        datos.categoria = "deportivo".to_string();

        let err = validar_nuevo_proyecto(&datos).unwrap_err();
        let AppError::Validation(errores) = err else {
            panic!("se esperaba Validation");
        };
        let campos: Vec<&str> = errores.iter().map(|e| e.campo.as_str()).collect();
        assert!(campos.contains(&"titulo"));
        assert!(campos.contains(&"categoria"));
    }

    #[test]
    fn fecha_fin_anterior_a_inicio_es_invalida() {
        let mut datos = nuevo_valido();
        datos.fecha_fin = NaiveDate::from_ymd_opt(2025, 12, 1);
        assert!(validar_nuevo_proyecto(&datos).is_err());

        datos.fecha_fin = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert!(validar_nuevo_proyecto(&datos).is_ok());
    }

    #[test]
    fn la_fecha_de_inicio_es_obligatoria() {
        let mut datos = nuevo_valido();
        datos.fecha_inicio = None;
        assert!(validar_nuevo_proyecto(&datos).is_err());
    }

    #[test]
    fn los_enlaces_deben_ser_http() {
        let mut datos = nuevo_valido();
        datos.repositorio = Some("git@github.com:user/repo.git".to_string());
        assert!(validar_nuevo_proyecto(&datos).is_err());

        datos.repositorio = Some("https://github.com/user/repo".to_string());
        assert!(validar_nuevo_proyecto(&datos).is_ok());
    }

    #[test]
    fn la_actualizacion_solo_valida_lo_presente() {
        let cambios = ActualizarProyecto::default();
        assert!(validar_actualizacion(&cambios).is_ok());

        let cambios = ActualizarProyecto {
            nivel: Some(9),
            ..Default::default()
        };
        assert!(validar_actualizacion(&cambios).is_err());
    }

    #[test]
    fn los_tags_se_normalizan_en_minusculas() {
        let tags = vec!["  Rust ".to_string(), "IoT".to_string(), " ".to_string()];
        assert_eq!(normalizar_tags(&tags), vec!["rust", "iot"]);
    }

    #[test]
    fn comentario_vacio_o_largo_se_rechaza() {
        assert!(validar_comentario("   ").is_err());
        assert!(validar_comentario(&"a".repeat(501)).is_err());
        assert_eq!(validar_comentario("  buen trabajo  ").unwrap(), "buen trabajo");
    }
}
