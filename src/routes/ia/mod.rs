pub mod handler;

pub use handler::generar_titulo;
