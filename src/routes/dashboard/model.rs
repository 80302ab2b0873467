use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Recuento agrupado por una clave textual (categoría, carrera, estado...).
#[derive(Debug, Serialize, FromRow)]
pub struct Conteo {
    pub clave: String,
    pub total: i64,
}

/// Un mes de la serie de donaciones.
#[derive(Debug, Serialize, FromRow)]
pub struct DonacionMes {
    pub anio: i32,
    pub mes: i32,
    pub total_monto: f64,
    pub cantidad: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TopProyecto {
    pub id: Uuid,
    pub titulo: String,
    pub categoria: String,
    pub vistas: i64,
    pub likes: i64,
    pub autor_nombre: String,
    pub autor_apellido: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Resumen {
    pub total_proyectos: i64,
    pub total_publicados: i64,
    pub total_donaciones: f64,
}

/// Fila del tablero personal: cada proyecto del autor con sus métricas.
#[derive(Debug, Serialize, FromRow)]
pub struct ProyectoPropio {
    pub id: Uuid,
    pub titulo: String,
    pub categoria: String,
    pub estado: String,
    pub publico: bool,
    pub vistas: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// Primer día del mes de hace once meses, a medianoche UTC: la ventana de
/// la serie mensual cubre doce meses contando el mes en curso.
pub fn inicio_ventana_12_meses(ahora: DateTime<Utc>) -> DateTime<Utc> {
    let fecha = ahora.date_naive();
    let meses = fecha.year() * 12 + fecha.month() as i32 - 1 - 11;
    let anio = meses.div_euclid(12);
    let mes = (meses.rem_euclid(12) + 1) as u32;

    NaiveDate::from_ymd_opt(anio, mes, 1)
        .unwrap_or(fecha)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

pub async fn proyectos_por_categoria(pool: &PgPool) -> Result<Vec<Conteo>, sqlx::Error> {
    sqlx::query_as::<_, Conteo>(
        "SELECT categoria AS clave, COUNT(*) AS total FROM proyectos \
         GROUP BY categoria ORDER BY clave",
    )
    .fetch_all(pool)
    .await
}

pub async fn proyectos_por_carrera(pool: &PgPool) -> Result<Vec<Conteo>, sqlx::Error> {
    sqlx::query_as::<_, Conteo>(
        "SELECT carrera AS clave, COUNT(*) AS total FROM proyectos \
         GROUP BY carrera ORDER BY total DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn proyectos_por_estado(pool: &PgPool) -> Result<Vec<Conteo>, sqlx::Error> {
    sqlx::query_as::<_, Conteo>(
        "SELECT estado AS clave, COUNT(*) AS total FROM proyectos \
         GROUP BY estado ORDER BY clave",
    )
    .fetch_all(pool)
    .await
}

/// Serie mensual de donaciones exitosas dentro de la ventana.
pub async fn donaciones_por_mes(
    pool: &PgPool,
    desde: DateTime<Utc>,
) -> Result<Vec<DonacionMes>, sqlx::Error> {
    sqlx::query_as::<_, DonacionMes>(
        "SELECT EXTRACT(YEAR FROM created_at)::INT4 AS anio, \
         EXTRACT(MONTH FROM created_at)::INT4 AS mes, \
         COALESCE(SUM(monto), 0) AS total_monto, COUNT(*) AS cantidad \
         FROM donaciones WHERE estado = 'exitosa' AND created_at >= $1 \
         GROUP BY 1, 2 ORDER BY 1, 2",
    )
    .bind(desde)
    .fetch_all(pool)
    .await
}

/// Los publicados con más vistas, para la vitrina del tablero.
pub async fn top_proyectos(pool: &PgPool, limit: i64) -> Result<Vec<TopProyecto>, sqlx::Error> {
    sqlx::query_as::<_, TopProyecto>(
        "SELECT p.id, p.titulo, p.categoria, p.vistas, \
         (SELECT COUNT(*) FROM proyecto_likes l WHERE l.proyecto_id = p.id) AS likes, \
         a.nombre AS autor_nombre, a.apellido AS autor_apellido \
         FROM proyectos p JOIN estudiantes a ON a.id = p.autor \
         WHERE p.estado = 'publicado' AND p.publico = TRUE \
         ORDER BY p.vistas DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn resumen(pool: &PgPool) -> Result<Resumen, sqlx::Error> {
    sqlx::query_as::<_, Resumen>(
        "SELECT \
         (SELECT COUNT(*) FROM proyectos) AS total_proyectos, \
         (SELECT COUNT(*) FROM proyectos WHERE estado = 'publicado') AS total_publicados, \
         (SELECT COALESCE(SUM(monto), 0) FROM donaciones WHERE estado = 'exitosa') \
             AS total_donaciones",
    )
    .fetch_one(pool)
    .await
}

// ===== Tablero personal =====

pub async fn proyectos_propios(
    pool: &PgPool,
    autor: Uuid,
) -> Result<Vec<ProyectoPropio>, sqlx::Error> {
    sqlx::query_as::<_, ProyectoPropio>(
        "SELECT p.id, p.titulo, p.categoria, p.estado, p.publico, p.vistas, \
         (SELECT COUNT(*) FROM proyecto_likes l WHERE l.proyecto_id = p.id) AS likes, \
         p.created_at \
         FROM proyectos p WHERE p.autor = $1 ORDER BY p.created_at DESC",
    )
    .bind(autor)
    .fetch_all(pool)
    .await
}

pub async fn propios_por_categoria(
    pool: &PgPool,
    autor: Uuid,
) -> Result<Vec<Conteo>, sqlx::Error> {
    sqlx::query_as::<_, Conteo>(
        "SELECT categoria AS clave, COUNT(*) AS total FROM proyectos \
         WHERE autor = $1 GROUP BY categoria ORDER BY clave",
    )
    .bind(autor)
    .fetch_all(pool)
    .await
}

pub async fn propios_por_estado(pool: &PgPool, autor: Uuid) -> Result<Vec<Conteo>, sqlx::Error> {
    sqlx::query_as::<_, Conteo>(
        "SELECT estado AS clave, COUNT(*) AS total FROM proyectos \
         WHERE autor = $1 GROUP BY estado ORDER BY clave",
    )
    .bind(autor)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn la_ventana_retrocede_once_meses_al_primer_dia() {
        let ahora = Utc.with_ymd_and_hms(2026, 8, 23, 15, 30, 0).unwrap();
        let inicio = inicio_ventana_12_meses(ahora);
        assert_eq!(inicio, Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn la_ventana_cruza_el_cambio_de_anio() {
        let ahora = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let inicio = inicio_ventana_12_meses(ahora);
        assert_eq!(inicio, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn diciembre_abre_la_ventana_en_enero() {
        let ahora = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let inicio = inicio_ventana_12_meses(ahora);
        assert_eq!(inicio, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
