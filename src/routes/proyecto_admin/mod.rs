pub mod handler;

pub use handler::{
    actualizar_proyecto,
    buscar_proyectos,
    despublicar_proyecto,
    eliminar_proyecto,
    listar_todos,
    obtener_proyecto,
    proyectos_destacados,
    proyectos_por_carrera,
    proyectos_por_categoria,
    publicar_proyecto,
};
