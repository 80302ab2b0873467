pub mod handler;
pub mod model;

pub use handler::{
    actualizar_password,
    actualizar_perfil,
    comprobar_token,
    confirmar_cuenta,
    facebook_callback,
    facebook_failure,
    facebook_redirect,
    google_callback,
    google_failure,
    google_redirect,
    login,
    nuevo_password,
    perfil,
    recuperar_password,
    registrar,
};
