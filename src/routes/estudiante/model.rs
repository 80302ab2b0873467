use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::policy::Rol;
use crate::upstream::PerfilOAuth;
use crate::utils::hash_password;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Estudiante {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub cedula: Option<String>,
    pub celular: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub carrera: String,
    pub nivel: i32,
    pub rol: String,
    pub bio: Option<String>,
    pub foto_perfil_url: Option<String>,
    pub foto_perfil_id: Option<String>,
    pub confirm_email: bool,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub auth_provider: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos con los que se inserta un estudiante nuevo (registro local).
#[derive(Debug)]
pub struct NuevoEstudiante {
    pub nombre: String,
    pub apellido: String,
    pub cedula: Option<String>,
    pub celular: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub carrera: String,
    pub nivel: i32,
    pub bio: Option<String>,
    pub foto_perfil_url: Option<String>,
    pub foto_perfil_id: Option<String>,
    pub token: String,
}

/// Actualización parcial del perfil: solo los campos presentes cambian.
#[derive(Debug, Default, Deserialize)]
pub struct ActualizarPerfil {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub celular: Option<String>,
    pub email: Option<String>,
    pub carrera: Option<String>,
    pub nivel: Option<i32>,
    pub cedula: Option<String>,
    pub bio: Option<String>,
    /// Imagen en base64; se sube al almacén antes de guardar.
    pub foto_perfil: Option<String>,
}

/// Vista reducida para el listado de administración.
#[derive(Debug, Serialize, FromRow)]
pub struct EstudianteResumen {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub carrera: String,
    pub nivel: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroEstudiantes {
    pub carrera: Option<String>,
    pub nivel: Option<i32>,
    pub apellido: Option<String>,
}

impl Estudiante {
    pub fn rol(&self) -> Rol {
        Rol::parse(&self.rol).unwrap_or(Rol::Estudiante)
    }

    pub async fn crear(pool: &PgPool, nuevo: NuevoEstudiante) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Estudiante>(
            r#"
            INSERT INTO estudiantes (
                nombre, apellido, cedula, celular, email, password_hash,
                carrera, nivel, bio, foto_perfil_url, foto_perfil_id, token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(nuevo.nombre)
        .bind(nuevo.apellido)
        .bind(nuevo.cedula)
        .bind(nuevo.celular)
        .bind(nuevo.email)
        .bind(nuevo.password_hash)
        .bind(nuevo.carrera)
        .bind(nuevo.nivel)
        .bind(nuevo.bio)
        .bind(nuevo.foto_perfil_url)
        .bind(nuevo.foto_perfil_id)
        .bind(nuevo.token)
        .fetch_one(pool)
        .await
    }

    pub async fn buscar_por_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Estudiante>("SELECT * FROM estudiantes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn buscar_por_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Estudiante>("SELECT * FROM estudiantes WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(pool)
            .await
    }

    pub async fn buscar_por_cedula(
        pool: &PgPool,
        cedula: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Estudiante>("SELECT * FROM estudiantes WHERE cedula = $1")
            .bind(cedula)
            .fetch_optional(pool)
            .await
    }

    pub async fn buscar_por_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Estudiante>("SELECT * FROM estudiantes WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Confirma la cuenta y consume el token de un solo uso.
    pub async fn confirmar(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE estudiantes SET confirm_email = TRUE, token = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn asignar_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE estudiantes SET token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Cambia el password y consume el token de recuperación si existía.
    pub async fn actualizar_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE estudiantes SET password_hash = $2, token = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn actualizar_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE estudiantes SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn actualizar_perfil(
        pool: &PgPool,
        id: Uuid,
        cambios: &ActualizarPerfil,
        foto: Option<(String, String)>,
    ) -> Result<Self, sqlx::Error> {
        let (foto_url, foto_id) = match foto {
            Some((url, public_id)) => (Some(url), Some(public_id)),
            None => (None, None),
        };

        sqlx::query_as::<_, Estudiante>(
            r#"
            UPDATE estudiantes SET
                nombre = COALESCE($2, nombre),
                apellido = COALESCE($3, apellido),
                celular = COALESCE($4, celular),
                email = COALESCE($5, email),
                carrera = COALESCE($6, carrera),
                nivel = COALESCE($7, nivel),
                cedula = COALESCE($8, cedula),
                bio = COALESCE($9, bio),
                foto_perfil_url = COALESCE($10, foto_perfil_url),
                foto_perfil_id = COALESCE($11, foto_perfil_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&cambios.nombre)
        .bind(&cambios.apellido)
        .bind(&cambios.celular)
        .bind(cambios.email.as_ref().map(|e| e.to_lowercase()))
        .bind(&cambios.carrera)
        .bind(cambios.nivel)
        .bind(&cambios.cedula)
        .bind(&cambios.bio)
        .bind(foto_url)
        .bind(foto_id)
        .fetch_one(pool)
        .await
    }

    // ===== OAuth =====

    pub async fn buscar_por_oauth(
        pool: &PgPool,
        provider: &str,
        subject_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let columna = if provider == "google" {
            "google_id"
        } else {
            "facebook_id"
        };
        sqlx::query_as::<_, Estudiante>(&format!(
            "SELECT * FROM estudiantes WHERE {} = $1",
            columna
        ))
        .bind(subject_id)
        .fetch_optional(pool)
        .await
    }

    /// Vincula una identidad OAuth a una cuenta local ya existente. El
    /// proveedor ya verificó el email, así que la cuenta queda confirmada.
    pub async fn vincular_oauth(
        pool: &PgPool,
        id: Uuid,
        perfil: &PerfilOAuth,
    ) -> Result<Self, sqlx::Error> {
        let columna = if perfil.provider == "google" {
            "google_id"
        } else {
            "facebook_id"
        };
        sqlx::query_as::<_, Estudiante>(&format!(
            "UPDATE estudiantes SET {} = $2, confirm_email = TRUE, \
             foto_perfil_url = COALESCE(foto_perfil_url, $3), updated_at = NOW() \
             WHERE id = $1 RETURNING *",
            columna
        ))
        .bind(id)
        .bind(&perfil.subject_id)
        .bind(&perfil.foto)
        .fetch_one(pool)
        .await
    }

    /// Alta de un estudiante desde un proveedor OAuth, con valores por
    /// defecto en los campos académicos que el proveedor no conoce.
    pub async fn crear_desde_oauth(
        pool: &PgPool,
        perfil: &PerfilOAuth,
    ) -> Result<Self, AppError> {
        // Password aleatorio: la cuenta nunca inicia sesión en local.
        let password_hash = hash_password(&Uuid::new_v4().simple().to_string())?;

        let (google_id, facebook_id) = if perfil.provider == "google" {
            (Some(perfil.subject_id.as_str()), None)
        } else {
            (None, Some(perfil.subject_id.as_str()))
        };

        let estudiante = sqlx::query_as::<_, Estudiante>(
            r#"
            INSERT INTO estudiantes (
                nombre, apellido, email, password_hash, carrera, nivel,
                foto_perfil_url, confirm_email, google_id, facebook_id,
                auth_provider
            )
            VALUES ($1, $2, $3, $4, 'Desarrollo de Software', 1, $5, TRUE, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&perfil.nombre)
        .bind(&perfil.apellido)
        .bind(perfil.email.to_lowercase())
        .bind(password_hash)
        .bind(&perfil.foto)
        .bind(google_id)
        .bind(facebook_id)
        .bind(perfil.provider)
        .fetch_one(pool)
        .await?;

        Ok(estudiante)
    }

    // ===== Administración =====

    pub async fn listar(
        pool: &PgPool,
        filtro: &FiltroEstudiantes,
    ) -> Result<Vec<EstudianteResumen>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, nombre, apellido, email, carrera, nivel \
             FROM estudiantes WHERE rol = 'estudiante'",
        );

        if let Some(carrera) = &filtro.carrera {
            qb.push(" AND carrera = ");
            qb.push_bind(carrera.clone());
        }
        if let Some(nivel) = filtro.nivel {
            qb.push(" AND nivel = ");
            qb.push_bind(nivel);
        }
        if let Some(apellido) = &filtro.apellido {
            qb.push(" AND apellido ILIKE ");
            qb.push_bind(format!("%{}%", apellido));
        }

        qb.push(" ORDER BY apellido, nombre");
        qb.build_query_as::<EstudianteResumen>().fetch_all(pool).await
    }

    pub async fn contar_estudiantes(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM estudiantes WHERE rol = 'estudiante'",
        )
        .fetch_one(pool)
        .await
    }
}
