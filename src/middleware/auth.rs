use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    policy::{Rol, Visor},
    utils::{Claims, verificar_token_jwt},
};

fn claims_del_header(req: &Request<Body>, state: &AppState) -> Result<Option<Claims>, AppError> {
    let header = match req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => return Ok(None),
    };

    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    let claims = verificar_token_jwt(token, &state.config)
        .map_err(|e| AppError::Unauthorized(format!("Token inválido o expirado - {}", e)))?;

    Ok(Some(claims))
}

/// Rutas protegidas: exige un bearer token válido e inyecta los claims y
/// el visor en las extensiones de la request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_del_header(&req, &state)?.ok_or_else(|| {
        AppError::Unauthorized("Acceso denegado: token no proporcionado".to_string())
    })?;

    let visor = Visor::from_claims(Some(&claims));
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(visor);

    Ok(next.run(req).await)
}

/// Rutas de lectura pública: el token es opcional. Sin header el visor es
/// anónimo; un token presente pero inválido sigue siendo 401.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_del_header(&req, &state)?;
    let visor = Visor::from_claims(claims.as_ref());

    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }
    req.extensions_mut().insert(visor);

    Ok(next.run(req).await)
}

/// Capa adicional para los endpoints de administrador. Se aplica después
/// de `auth_middleware`.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("Acceso denegado: token no proporcionado".to_string()))?;

    if claims.rol != Rol::Admin {
        return Err(AppError::Forbidden(
            "Acceso denegado: se requieren permisos de administrador".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
