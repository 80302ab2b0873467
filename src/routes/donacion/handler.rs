use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::AppError;
use crate::utils::{ApiResponse, message_response};

use super::model::{Donacion, NuevaDonacion, validar_donacion};

const DONANTE_ANONIMO: &str = "Anónimo";

/// Cobro y asiento de una donación. El orden importa: primero la
/// validación, luego la pasarela y solo con el pago confirmado se escribe
/// el libro. Un pago no confirmado responde 400 sin dejar rastro.
#[axum::debug_handler]
pub async fn crear_donacion(
    State(state): State<AppState>,
    Json(datos): Json<NuevaDonacion>,
) -> Result<Response, AppError> {
    validar_donacion(&datos)?;

    let nombre = datos
        .nombre
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DONANTE_ANONIMO);

    let descripcion = format!("Donación de {} a la plataforma de proyectos", nombre);
    let pago = state
        .upstreams
        .pagos
        .cobrar(datos.monto, &datos.payment_method_id, &descripcion)
        .await?;

    if !pago.exitoso() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<serde_json::Value> {
                success: false,
                message: Some("El pago no se completó".to_string()),
                data: Some(json!({ "stripeStatus": pago.status })),
                pagination: None,
            }),
        )
            .into_response());
    }

    let donacion = Donacion::crear(
        &state.pool,
        nombre,
        datos.monto,
        datos.mensaje.as_deref(),
        &pago.id,
    )
    .await?;

    info!(donacion = %donacion.id, monto = donacion.monto, "donación registrada");

    Ok((
        StatusCode::CREATED,
        message_response(
            "¡Gracias por tu donación a la plataforma!",
            json!({
                "donacionId": donacion.id,
                "nombreDonante": donacion.donante_nombre,
                "monto": donacion.monto,
                "mensaje": donacion.mensaje,
                "fecha": donacion.created_at,
                "stripePaymentIntentId": donacion.stripe_payment_intent_id,
            }),
        ),
    )
        .into_response())
}
