use serde::Deserialize;

use crate::error::{AppError, ErrorCampo};
use crate::routes::estudiante::model::ActualizarPerfil;

#[derive(Debug, Deserialize)]
pub struct RegistroRequest {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub password: String,
    pub carrera: String,
    pub nivel: i32,
    pub cedula: Option<String>,
    pub celular: Option<String>,
    pub bio: Option<String>,
    /// Foto de perfil en base64, opcional.
    pub foto_perfil: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevoPasswordRequest {
    pub password: String,
    pub confirmar_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualizarPasswordRequest {
    pub password_actual: String,
    pub password_nuevo: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

fn email_valido(email: &str) -> bool {
    let Some((local, dominio)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !dominio.is_empty()
        && dominio.contains('.')
        && !dominio.starts_with('.')
        && !dominio.ends_with('.')
        && !email.contains(' ')
}

fn son_digitos(valor: &str, largo: usize) -> bool {
    valor.len() == largo && valor.chars().all(|c| c.is_ascii_digit())
}

pub fn validar_registro(datos: &RegistroRequest) -> Result<(), AppError> {
    let mut errores = Vec::new();

    if datos.nombre.trim().chars().count() < 2 {
        errores.push(ErrorCampo::new(
            "nombre",
            "El nombre debe tener al menos 2 caracteres",
        ));
    }
    if datos.apellido.trim().chars().count() < 2 {
        errores.push(ErrorCampo::new(
            "apellido",
            "El apellido debe tener al menos 2 caracteres",
        ));
    }
    if !email_valido(datos.email.trim()) {
        errores.push(ErrorCampo::new("email", "El email no es válido"));
    }
    if datos.password.chars().count() < 6 {
        errores.push(ErrorCampo::new(
            "password",
            "El password debe tener al menos 6 caracteres",
        ));
    }
    if datos.carrera.trim().is_empty() {
        errores.push(ErrorCampo::new("carrera", "La carrera es obligatoria"));
    }
    if !(1..=6).contains(&datos.nivel) {
        errores.push(ErrorCampo::new("nivel", "El nivel debe estar entre 1 y 6"));
    }
    if let Some(cedula) = &datos.cedula {
        if !son_digitos(cedula, 10) {
            errores.push(ErrorCampo::new(
                "cedula",
                "La cédula debe tener 10 dígitos numéricos",
            ));
        }
    }
    if let Some(celular) = &datos.celular {
        if !son_digitos(celular, 10) {
            errores.push(ErrorCampo::new(
                "celular",
                "El celular debe tener 10 dígitos numéricos",
            ));
        }
    }
    if let Some(bio) = &datos.bio {
        if bio.chars().count() > 500 {
            errores.push(ErrorCampo::new(
                "bio",
                "La bio no puede superar los 500 caracteres",
            ));
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errores))
    }
}

/// Mismas reglas que el registro, aplicadas solo a lo presente.
pub fn validar_actualizar_perfil(cambios: &ActualizarPerfil) -> Result<(), AppError> {
    let mut errores = Vec::new();

    if let Some(nombre) = &cambios.nombre {
        if nombre.trim().chars().count() < 2 {
            errores.push(ErrorCampo::new(
                "nombre",
                "El nombre debe tener al menos 2 caracteres",
            ));
        }
    }
    if let Some(apellido) = &cambios.apellido {
        if apellido.trim().chars().count() < 2 {
            errores.push(ErrorCampo::new(
                "apellido",
                "El apellido debe tener al menos 2 caracteres",
            ));
        }
    }
    if let Some(email) = &cambios.email {
        if !email_valido(email.trim()) {
            errores.push(ErrorCampo::new("email", "El email no es válido"));
        }
    }
    if let Some(nivel) = cambios.nivel {
        if !(1..=6).contains(&nivel) {
            errores.push(ErrorCampo::new("nivel", "El nivel debe estar entre 1 y 6"));
        }
    }
    if let Some(cedula) = &cambios.cedula {
        if !son_digitos(cedula, 10) {
            errores.push(ErrorCampo::new(
                "cedula",
                "La cédula debe tener 10 dígitos numéricos",
            ));
        }
    }
    if let Some(celular) = &cambios.celular {
        if !son_digitos(celular, 10) {
            errores.push(ErrorCampo::new(
                "celular",
                "El celular debe tener 10 dígitos numéricos",
            ));
        }
    }
    if let Some(bio) = &cambios.bio {
        if bio.chars().count() > 500 {
            errores.push(ErrorCampo::new(
                "bio",
                "La bio no puede superar los 500 caracteres",
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

    fn registro_valido() -> RegistroRequest {
        RegistroRequest {
            nombre: "Ana".to_string(),
            apellido: "Paredes".to_string(),
            email: "ana@example.edu.ec".to_string(),
            password: "secreta123".to_string(),
            carrera: "Desarrollo de Software".to_string(),
            nivel: 3,
            cedula: None,
            celular: None,
            bio: None,
            foto_perfil: None,
        }
    }

    #[test]
    fn un_registro_valido_pasa() {
        assert!(validar_registro(&registro_valido()).is_ok());
    }

    #[test]
    fn cada_campo_invalido_se_reporta_con_su_nombre() {
        let mut datos = registro_valido();
        datos.nombre = "A".to_string();
        datos.email = "sin-arroba".to_string();
        datos.password = "123".to_string();
        datos.nivel = 7;

        let AppError::Validation(errores) = validar_registro(&datos).unwrap_err() else {
            panic!("se esperaba Validation");
        };
        let campos: Vec<&str> = errores.iter().map(|e| e.campo.as_str()).collect();
        assert_eq!(campos, vec!["nombre", "email", "password", "nivel"]);
    }

    #[test]
    fn cedula_y_celular_exigen_diez_digitos() {
        let mut datos = registro_valido();
        datos.cedula = Some("12345".to_string());
        assert!(validar_registro(&datos).is_err());

        datos.cedula = Some("1712345678".to_string());
        datos.celular = Some("09912345ab".to_string());
        assert!(validar_registro(&datos).is_err());

        datos.celular = Some("0991234567".to_string());
        assert!(validar_registro(&datos).is_ok());
    }

    #[test]
    fn emails_malformados_se_rechazan() {
        for email in ["a@b", "@dominio.com", "user@", "user @mail.com", "user@.com"] {
            assert!(!email_valido(email), "{email} aceptado");
        }
        assert!(email_valido("user@mail.com"));
    }

    #[test]
    fn la_actualizacion_parcial_solo_valida_lo_presente() {
        let cambios = ActualizarPerfil::default();
        assert!(validar_actualizar_perfil(&cambios).is_ok());

        let cambios = ActualizarPerfil {
            email: Some("no-es-email".to_string()),
            ..Default::default()
        };
        assert!(validar_actualizar_perfil(&cambios).is_err());
    }
}
