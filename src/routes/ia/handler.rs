use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::upstream::extraer_json;
use crate::utils::success_response;

const DESCRIPCION_MINIMA: usize = 15;

#[derive(Debug, Deserialize)]
pub struct GenerarTituloRequest {
    pub descripcion: String,
}

#[derive(Debug, Deserialize)]
struct TitulosGenerados {
    #[serde(default)]
    titulos: Vec<String>,
    #[serde(default)]
    ejemplo: String,
}

/// Pide al modelo tres títulos candidatos para un proyecto a partir de su
/// descripción. La salida del modelo es texto libre; se recorta el primer
/// objeto JSON y cualquier cosa no interpretable se reporta como falla del
/// servicio externo.
#[axum::debug_handler]
pub async fn generar_titulo(
    State(state): State<AppState>,
    Json(req): Json<GenerarTituloRequest>,
) -> Result<impl IntoResponse, AppError> {
    let descripcion = req.descripcion.trim();
    if descripcion.chars().count() < DESCRIPCION_MINIMA {
        return Err(AppError::validation(
            "descripcion",
            format!(
                "La descripción debe tener al menos {} caracteres",
                DESCRIPCION_MINIMA
            ),
        ));
    }

    let prompt = format!(
        "Eres un asistente para estudiantes universitarios. A partir de la \
         siguiente descripción de un proyecto académico, propone exactamente \
         3 títulos breves y atractivos en español. Responde únicamente con un \
         objeto JSON con la forma {{\"titulos\": [\"...\", \"...\", \"...\"], \
         \"ejemplo\": \"una frase de presentación del proyecto\"}}.\n\n\
         Descripción: {}",
        descripcion
    );

    let texto = state.upstreams.inferencia.generar(&prompt).await?;

    let recorte = extraer_json(&texto).ok_or_else(|| {
        AppError::Upstream("La IA no devolvió un JSON interpretable".to_string())
    })?;
    let generado: TitulosGenerados = serde_json::from_str(recorte).map_err(|e| {
        AppError::Upstream(format!("La IA devolvió un JSON inválido: {}", e))
    })?;

    Ok(success_response(json!({
        "titulos": generado.titulos,
        "ejemplo": generado.ejemplo,
        "modelo": state.upstreams.inferencia.modelo(),
    })))
}
