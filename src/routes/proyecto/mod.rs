pub mod handler;
pub mod model;

pub use handler::{
    agregar_comentario,
    agregar_like,
    actualizar_proyecto,
    buscar_proyectos,
    crear_proyecto,
    eliminar_comentario,
    eliminar_proyecto,
    listar_proyectos,
    obtener_proyecto,
    proyectos_destacados,
    proyectos_por_carrera,
    proyectos_por_categoria,
    proyectos_por_estudiante,
    quitar_like,
};
