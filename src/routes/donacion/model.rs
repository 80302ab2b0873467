use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, ErrorCampo};

/// Asiento del libro de donaciones. Solo se escribe después de que la
/// pasarela confirma el cobro; nunca hay asiento sin pago.
#[derive(Debug, Serialize, FromRow)]
pub struct Donacion {
    pub id: Uuid,
    pub donante_nombre: String,
    pub monto: f64,
    pub mensaje: Option<String>,
    pub stripe_payment_intent_id: String,
    pub estado: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevaDonacion {
    pub payment_method_id: String,
    pub monto: f64,
    pub nombre: Option<String>,
    pub mensaje: Option<String>,
}

impl Donacion {
    pub async fn crear(
        pool: &PgPool,
        donante_nombre: &str,
        monto: f64,
        mensaje: Option<&str>,
        payment_intent_id: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Donacion>(
            r#"
            INSERT INTO donaciones (donante_nombre, monto, mensaje,
                                    stripe_payment_intent_id, estado)
            VALUES ($1, $2, $3, $4, 'exitosa')
            RETURNING *
            "#,
        )
        .bind(donante_nombre)
        .bind(monto)
        .bind(mensaje)
        .bind(payment_intent_id)
        .fetch_one(pool)
        .await
    }
}

/// La validación corre completa antes de tocar la pasarela: un request
/// inválido jamás genera un intento de cobro.
pub fn validar_donacion(datos: &NuevaDonacion) -> Result<(), AppError> {
    let mut errores = Vec::new();

    if datos.payment_method_id.trim().is_empty() {
        errores.push(ErrorCampo::new(
            "paymentMethodId",
            "El método de pago es obligatorio",
        ));
    }

    if !(datos.monto > 0.0) || !datos.monto.is_finite() {
        errores.push(ErrorCampo::new(
            "monto",
            "El monto debe ser un número mayor que cero",
        ));
    }

    if let Some(nombre) = &datos.nombre {
        if nombre.chars().count() > 100 {
            errores.push(ErrorCampo::new(
                "nombre",
                "El nombre no puede superar los 100 caracteres",
            ));
        }
    }

    if let Some(mensaje) = &datos.mensaje {
        if mensaje.chars().count() > 300 {
            errores.push(ErrorCampo::new(
                "mensaje",
                "El mensaje no puede superar los 300 caracteres",
            ));
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donacion_valida() -> NuevaDonacion {
        NuevaDonacion {
            payment_method_id: "pm_card_visa".to_string(),
            monto: 25.0,
            nombre: Some("Ana".to_string()),
            mensaje: None,
        }
    }

    #[test]
    fn una_donacion_valida_pasa() {
        assert!(validar_donacion(&donacion_valida()).is_ok());
    }

    #[test]
    fn monto_cero_negativo_o_nan_se_rechaza() {
        for monto in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut datos = donacion_valida();
            datos.monto = monto;
            assert!(validar_donacion(&datos).is_err(), "monto {monto} aceptado");
        }
    }

    #[test]
    fn el_metodo_de_pago_es_obligatorio() {
        let mut datos = donacion_valida();
        datos.payment_method_id = "   ".to_string();
        assert!(validar_donacion(&datos).is_err());
    }

    #[test]
    fn nombre_y_mensaje_tienen_tope() {
        let mut datos = donacion_valida();
        datos.nombre = Some("x".repeat(101));
        assert!(validar_donacion(&datos).is_err());

        let mut datos = donacion_valida();
        datos.mensaje = Some("y".repeat(301));
        assert!(validar_donacion(&datos).is_err());
    }
}
