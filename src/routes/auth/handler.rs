use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Json};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::policy::Rol;
use crate::routes::estudiante::model::{ActualizarPerfil, Estudiante, NuevoEstudiante};
use crate::upstream::{OAuthProvider, PerfilOAuth};
use crate::utils::{
    ApiResponse, Claims, crear_token_jwt, generar_token_unico, hash_password,
    message_response, success_response, verify_password,
};

use super::model::{
    ActualizarPasswordRequest, EmailRequest, LoginRequest, NuevoPasswordRequest,
    OAuthCallbackQuery, RegistroRequest, validar_actualizar_perfil, validar_registro,
};

const CARPETA_PERFILES: &str = "Perfiles";

async fn estudiante_o_404(state: &AppState, id: Uuid) -> Result<Estudiante, AppError> {
    Estudiante::buscar_por_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Estudiante no encontrado".to_string()))
}

/// Una cuenta la gestiona su dueño; un admin puede gestionar cualquiera.
fn puede_gestionar_cuenta(claims: &Claims, id: Uuid) -> bool {
    claims.id == id || claims.rol == Rol::Admin
}

// ===== Registro y sesión =====

#[axum::debug_handler]
pub async fn registrar(
    State(state): State<AppState>,
    Json(datos): Json<RegistroRequest>,
) -> Result<impl IntoResponse, AppError> {
    validar_registro(&datos)?;

    let email = datos.email.trim().to_lowercase();
    if Estudiante::buscar_por_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "Lo sentimos, el email ya se encuentra registrado".to_string(),
        ));
    }
    if let Some(cedula) = &datos.cedula {
        if Estudiante::buscar_por_cedula(&state.pool, cedula).await?.is_some() {
            return Err(AppError::Conflict(
                "Lo sentimos, la cédula ya se encuentra registrada".to_string(),
            ));
        }
    }

    // La foto es opcional y su subida no bloquea el registro.
    let (foto_url, foto_id) = match &datos.foto_perfil {
        Some(base64) => match state
            .upstreams
            .storage
            .subir_imagen(base64, CARPETA_PERFILES)
            .await
        {
            Ok(subida) => (Some(subida.url), Some(subida.public_id)),
            Err(e) => {
                warn!("no se pudo subir la foto de perfil: {:?}", e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let token = generar_token_unico();
    let estudiante = Estudiante::crear(
        &state.pool,
        NuevoEstudiante {
            nombre: datos.nombre.trim().to_string(),
            apellido: datos.apellido.trim().to_string(),
            cedula: datos.cedula,
            celular: datos.celular,
            email: email.clone(),
            password_hash: hash_password(&datos.password)?,
            carrera: datos.carrera.trim().to_string(),
            nivel: datos.nivel,
            bio: datos.bio,
            foto_perfil_url: foto_url,
            foto_perfil_id: foto_id,
            token: token.clone(),
        },
    )
    .await?;

    // La cuenta ya existe aunque el correo no salga; el estudiante puede
    // pedir el reenvío con la recuperación.
    if let Err(e) = state.upstreams.mailer.enviar_confirmacion(&email, &token).await {
        warn!(email, "no se pudo enviar el correo de confirmación: {:?}", e);
    }

    Ok((
        StatusCode::CREATED,
        message_response(
            "Registro exitoso. Revisa tu correo para confirmar tu cuenta",
            json!({
                "id": estudiante.id,
                "nombre": estudiante.nombre,
                "email": estudiante.email,
                "fotoPerfil": estudiante.foto_perfil_url,
            }),
        ),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(datos): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if datos.email.trim().is_empty() || datos.password.is_empty() {
        return Err(AppError::validation(
            "email",
            "El email y el password son obligatorios",
        ));
    }

    let estudiante = Estudiante::buscar_por_email(&state.pool, datos.email.trim())
        .await?
        .ok_or_else(|| {
            AppError::NotFound("El usuario no se encuentra registrado".to_string())
        })?;

    if !verify_password(&datos.password, &estudiante.password_hash)? {
        return Err(AppError::Unauthorized("Password incorrecto".to_string()));
    }
    if !estudiante.confirm_email {
        return Err(AppError::Forbidden(
            "Debes confirmar tu cuenta antes de iniciar sesión. Revisa tu correo".to_string(),
        ));
    }

    Estudiante::actualizar_last_login(&state.pool, estudiante.id).await?;
    let token = crear_token_jwt(estudiante.id, estudiante.rol(), &state.config)?;

    Ok(message_response(
        "Inicio de sesión exitoso",
        json!({ "token": token, "estudiante": estudiante }),
    ))
}

#[axum::debug_handler]
pub async fn confirmar_cuenta(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let estudiante = Estudiante::buscar_por_token(&state.pool, &token)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Token inválido o cuenta ya confirmada".to_string())
        })?;

    Estudiante::confirmar(&state.pool, estudiante.id).await?;
    Ok(message_response(
        "Cuenta confirmada, ya puedes iniciar sesión",
        (),
    ))
}

// ===== Recuperación de password =====

#[axum::debug_handler]
pub async fn recuperar_password(
    State(state): State<AppState>,
    Json(datos): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if datos.email.trim().is_empty() {
        return Err(AppError::validation("email", "El email es obligatorio"));
    }

    let estudiante = Estudiante::buscar_por_email(&state.pool, datos.email.trim())
        .await?
        .ok_or_else(|| {
            AppError::NotFound("El usuario no se encuentra registrado".to_string())
        })?;

    let token = generar_token_unico();
    Estudiante::asignar_token(&state.pool, estudiante.id, &token).await?;

    // Aquí el correo sí es la ruta crítica: sin él no hay recuperación.
    state
        .upstreams
        .mailer
        .enviar_recuperacion(&estudiante.email, &token)
        .await?;

    Ok(message_response(
        "Revisa tu correo electrónico para reestablecer tu cuenta",
        (),
    ))
}

#[axum::debug_handler]
pub async fn comprobar_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Estudiante::buscar_por_token(&state.pool, &token)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Lo sentimos, no se puede validar la cuenta".to_string())
        })?;

    Ok(message_response(
        "Token confirmado, ya puedes crear tu nuevo password",
        (),
    ))
}

#[axum::debug_handler]
pub async fn nuevo_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(datos): Json<NuevoPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if datos.password.chars().count() < 6 {
        return Err(AppError::validation(
            "password",
            "El password debe tener al menos 6 caracteres",
        ));
    }
    if datos.password != datos.confirmar_password {
        return Err(AppError::validation(
            "confirmarPassword",
            "Los passwords no coinciden",
        ));
    }

    let estudiante = Estudiante::buscar_por_token(&state.pool, &token)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Lo sentimos, no se puede validar la cuenta".to_string())
        })?;

    let hash = hash_password(&datos.password)?;
    Estudiante::actualizar_password(&state.pool, estudiante.id, &hash).await?;

    Ok(message_response(
        "Felicitaciones, ya puedes iniciar sesión con tu nuevo password",
        (),
    ))
}

// ===== Perfil =====

#[axum::debug_handler]
pub async fn perfil(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let estudiante = estudiante_o_404(&state, claims.id).await?;
    Ok(success_response(estudiante))
}

#[axum::debug_handler]
pub async fn actualizar_perfil(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(cambios): Json<ActualizarPerfil>,
) -> Result<impl IntoResponse, AppError> {
    if !puede_gestionar_cuenta(&claims, id) {
        return Err(AppError::Forbidden(
            "No tienes permiso para modificar este perfil".to_string(),
        ));
    }

    validar_actualizar_perfil(&cambios)?;
    let actual = estudiante_o_404(&state, id).await?;

    if let Some(email) = &cambios.email {
        let email = email.trim().to_lowercase();
        if email != actual.email {
            if Estudiante::buscar_por_email(&state.pool, &email).await?.is_some() {
                return Err(AppError::Conflict(
                    "Lo sentimos, el email ya se encuentra registrado".to_string(),
                ));
            }
        }
    }

    let foto = match &cambios.foto_perfil {
        Some(base64) => {
            if let Some(anterior) = &actual.foto_perfil_id {
                if let Err(e) = state.upstreams.storage.eliminar_imagen(anterior).await {
                    warn!("no se pudo eliminar la foto anterior: {:?}", e);
                }
            }
            let subida = state
                .upstreams
                .storage
                .subir_imagen(base64, CARPETA_PERFILES)
                .await?;
            Some((subida.url, subida.public_id))
        }
        None => None,
    };

    let actualizado = Estudiante::actualizar_perfil(&state.pool, id, &cambios, foto).await?;
    Ok(message_response("Perfil actualizado", actualizado))
}

#[axum::debug_handler]
pub async fn actualizar_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(datos): Json<ActualizarPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !puede_gestionar_cuenta(&claims, id) {
        return Err(AppError::Forbidden(
            "No tienes permiso para modificar este password".to_string(),
        ));
    }

    if datos.password_nuevo.chars().count() < 6 {
        return Err(AppError::validation(
            "passwordNuevo",
            "El password debe tener al menos 6 caracteres",
        ));
    }

    let estudiante = estudiante_o_404(&state, id).await?;
    if !verify_password(&datos.password_actual, &estudiante.password_hash)? {
        return Err(AppError::Unauthorized(
            "El password actual es incorrecto".to_string(),
        ));
    }

    let hash = hash_password(&datos.password_nuevo)?;
    Estudiante::actualizar_password(&state.pool, estudiante.id, &hash).await?;

    Ok(message_response("Password actualizado correctamente", ()))
}

// ===== OAuth =====

/// Alta o reconexión de una identidad delegada: primero por id del
/// proveedor, luego por email (vinculación) y como último recurso se crea
/// la cuenta con valores académicos por defecto.
async fn upsert_oauth(state: &AppState, perfil: &PerfilOAuth) -> Result<Estudiante, AppError> {
    if let Some(e) =
        Estudiante::buscar_por_oauth(&state.pool, perfil.provider, &perfil.subject_id).await?
    {
        return Ok(e);
    }

    if perfil.email.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "El proveedor no entregó un email verificado".to_string(),
        ));
    }

    if let Some(e) = Estudiante::buscar_por_email(&state.pool, &perfil.email).await? {
        return Ok(Estudiante::vincular_oauth(&state.pool, e.id, perfil).await?);
    }

    Estudiante::crear_desde_oauth(&state.pool, perfil).await
}

async fn callback_oauth(
    state: &AppState,
    provider: &Arc<dyn OAuthProvider>,
    q: OAuthCallbackQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let code = match (q.code, q.error) {
        (Some(code), None) => code,
        _ => {
            return Err(AppError::Unauthorized(
                "Autenticación cancelada por el usuario".to_string(),
            ));
        }
    };

    let perfil = provider.perfil_desde_codigo(&code).await?;
    let estudiante = upsert_oauth(state, &perfil).await?;

    Estudiante::actualizar_last_login(&state.pool, estudiante.id).await?;
    let token = crear_token_jwt(estudiante.id, estudiante.rol(), &state.config)?;

    Ok(message_response(
        "Autenticación exitosa",
        json!({ "token": token, "estudiante": estudiante }),
    ))
}

#[axum::debug_handler]
pub async fn google_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.upstreams.google.url_autorizacion())
}

#[axum::debug_handler]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(q): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    callback_oauth(&state, &state.upstreams.google, q).await
}

#[axum::debug_handler]
pub async fn facebook_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.upstreams.facebook.url_autorizacion())
}

#[axum::debug_handler]
pub async fn facebook_callback(
    State(state): State<AppState>,
    Query(q): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    callback_oauth(&state, &state.upstreams.facebook, q).await
}

#[axum::debug_handler]
pub async fn google_failure() -> AppError {
    AppError::Unauthorized("Autenticación con Google fallida".to_string())
}

#[axum::debug_handler]
pub async fn facebook_failure() -> AppError {
    AppError::Unauthorized("Autenticación con Facebook fallida".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(id: Uuid, rol: Rol) -> Claims {
        Claims {
            id,
            rol,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn el_dueno_gestiona_su_propia_cuenta() {
        let id = Uuid::new_v4();
        assert!(puede_gestionar_cuenta(&claims(id, Rol::Estudiante), id));
    }

    #[test]
    fn un_estudiante_no_gestiona_cuentas_ajenas() {
        let propia = Uuid::new_v4();
        let ajena = Uuid::new_v4();
        assert!(!puede_gestionar_cuenta(
            &claims(propia, Rol::Estudiante),
            ajena
        ));
    }

    #[test]
    fn un_admin_gestiona_cualquier_cuenta() {
        let admin = Uuid::new_v4();
        let ajena = Uuid::new_v4();
        assert!(puede_gestionar_cuenta(&claims(admin, Rol::Admin), ajena));
    }
}
