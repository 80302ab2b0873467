pub mod auth;
pub mod dashboard;
pub mod donacion;
pub mod estudiante;
pub mod ia;
pub mod proyecto;
pub mod proyecto_admin;
