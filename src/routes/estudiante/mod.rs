pub mod handler;
pub mod model;

pub use handler::{estadisticas_estudiantes, listar_estudiantes, obtener_estudiante};
