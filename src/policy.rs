//! Política de visibilidad y autorización sobre proyectos.
//!
//! Todo punto de entrada que toca un proyecto pasa por aquí: los listados
//! componen su filtro con [`FiltroProyectos::componer`] y las operaciones
//! sobre una entidad concreta se deciden con [`autorizar`]. Las reglas de
//! la máquina de estados de moderación viven en [`Estado`].

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Estudiante,
    Admin,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Estudiante => "estudiante",
            Rol::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Rol> {
        match s {
            "estudiante" => Some(Rol::Estudiante),
            "admin" => Some(Rol::Admin),
            _ => None,
        }
    }
}

/// Estado de moderación de un proyecto. Dos estados, reversibles
/// indefinidamente, sin transiciones automáticas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    EnProgreso,
    Publicado,
}

impl Estado {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::EnProgreso => "en_progreso",
            Estado::Publicado => "publicado",
        }
    }

    pub fn parse(s: &str) -> Option<Estado> {
        match s {
            "en_progreso" => Some(Estado::EnProgreso),
            "publicado" => Some(Estado::Publicado),
            _ => None,
        }
    }

    /// Transición `en_progreso -> publicado`. La transición nula se
    /// rechaza, nunca se acepta en silencio.
    pub fn publicar(self) -> Result<Estado, AppError> {
        match self {
            Estado::EnProgreso => Ok(Estado::Publicado),
            Estado::Publicado => Err(AppError::InvalidState(
                "El proyecto ya está publicado".to_string(),
            )),
        }
    }

    /// Transición `publicado -> en_progreso`, simétrica a [`publicar`].
    ///
    /// [`publicar`]: Estado::publicar
    pub fn despublicar(self) -> Result<Estado, AppError> {
        match self {
            Estado::Publicado => Ok(Estado::EnProgreso),
            Estado::EnProgreso => Err(AppError::InvalidState(
                "El proyecto ya está en estado \"en_progreso\"".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Categoria {
    Academico,
    Extracurricular,
}

impl Categoria {
    pub fn as_str(&self) -> &'static str {
        match self {
            Categoria::Academico => "academico",
            Categoria::Extracurricular => "extracurricular",
        }
    }

    pub fn parse(s: &str) -> Option<Categoria> {
        match s {
            "academico" => Some(Categoria::Academico),
            "extracurricular" => Some(Categoria::Extracurricular),
            _ => None,
        }
    }
}

/// La identidad que hace la petición, vista por la política.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visor {
    Anonimo,
    Estudiante(Uuid),
    Admin(Uuid),
}

impl Visor {
    pub fn from_claims(claims: Option<&Claims>) -> Visor {
        match claims {
            None => Visor::Anonimo,
            Some(c) if c.rol == Rol::Admin => Visor::Admin(c.id),
            Some(c) => Visor::Estudiante(c.id),
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Visor::Anonimo => None,
            Visor::Estudiante(id) | Visor::Admin(id) => Some(*id),
        }
    }

    pub fn es_admin(&self) -> bool {
        matches!(self, Visor::Admin(_))
    }

    /// El mismo visor sin privilegios de administrador. Los endpoints
    /// públicos tratan a un admin como un estudiante más: sus lecturas
    /// cuentan vistas y sus listados se filtran como los de cualquiera.
    pub fn sin_privilegios(self) -> Visor {
        match self {
            Visor::Admin(id) => Visor::Estudiante(id),
            otro => otro,
        }
    }
}

/// Recorte de alcance pedido explícitamente por el cliente en un listado.
#[derive(Debug, Clone, Default)]
pub struct Alcance {
    pub categoria: Option<Categoria>,
    pub carrera: Option<String>,
    pub estado: Option<Estado>,
    pub autor: Option<Uuid>,
    pub texto: Option<String>,
}

/// Filtro compuesto sobre el almacén de proyectos. Campos enumerados y
/// tipados; nunca un mapa abierto.
#[derive(Debug, Clone, Default)]
pub struct FiltroProyectos {
    pub categoria: Option<Categoria>,
    pub carrera: Option<String>,
    pub estado: Option<Estado>,
    pub autor: Option<Uuid>,
    pub texto: Option<String>,
    /// Rama OR `estado = 'publicado' OR autor = <id>` para que un autor
    /// autenticado siempre vea su propio trabajo sin publicar.
    pub publicado_o_autor: Option<Uuid>,
    /// Exigir `publico = true`. No se levanta para autores: el borrador
    /// privado de un autor es invisible incluso para él en los listados
    /// (asimetría heredada, pendiente de aclaración de producto).
    pub requiere_publico: bool,
}

impl FiltroProyectos {
    /// Compone el filtro de un listado a partir del visor y el alcance.
    pub fn componer(visor: &Visor, alcance: Alcance) -> FiltroProyectos {
        match visor {
            // Los endpoints de admin no restringen estado ni visibilidad.
            Visor::Admin(_) => FiltroProyectos {
                categoria: alcance.categoria,
                carrera: alcance.carrera,
                estado: alcance.estado,
                autor: alcance.autor,
                texto: alcance.texto,
                publicado_o_autor: None,
                requiere_publico: false,
            },
            Visor::Estudiante(id) => FiltroProyectos {
                categoria: alcance.categoria,
                carrera: alcance.carrera,
                estado: alcance.estado,
                autor: alcance.autor,
                texto: alcance.texto,
                publicado_o_autor: Some(*id),
                requiere_publico: true,
            },
            // Un recorte por estado pedido por un visitante anónimo se
            // ignora: solo existe lo publicado.
            Visor::Anonimo => FiltroProyectos {
                categoria: alcance.categoria,
                carrera: alcance.carrera,
                estado: Some(Estado::Publicado),
                autor: alcance.autor,
                texto: alcance.texto,
                publicado_o_autor: None,
                requiere_publico: true,
            },
        }
    }

    /// Predicado puro equivalente al filtro SQL, usado en pruebas y en los
    /// recuentos en memoria.
    pub fn permite(&self, p: &VistaProyecto) -> bool {
        if let Some(autor) = self.publicado_o_autor {
            if p.estado != Estado::Publicado && p.autor != autor {
                return false;
            }
        }
        if self.requiere_publico && !p.publico {
            return false;
        }
        if let Some(estado) = self.estado {
            if p.estado != estado {
                return false;
            }
        }
        if let Some(categoria) = self.categoria {
            if p.categoria != categoria {
                return false;
            }
        }
        if let Some(carrera) = &self.carrera {
            if &p.carrera != carrera {
                return false;
            }
        }
        if let Some(autor) = self.autor {
            if p.autor != autor {
                return false;
            }
        }
        if let Some(texto) = &self.texto {
            let texto = texto.to_lowercase();
            if !p.titulo.to_lowercase().contains(&texto) {
                return false;
            }
        }
        true
    }

    /// Agrega las condiciones del filtro a una consulta que ya contiene
    /// `WHERE 1=1` (o equivalente). `p` es el alias de la tabla proyectos.
    pub fn aplicar(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(autor) = self.publicado_o_autor {
            qb.push(" AND (p.estado = 'publicado' OR p.autor = ");
            qb.push_bind(autor);
            qb.push(")");
        }
        if self.requiere_publico {
            qb.push(" AND p.publico = TRUE");
        }
        if let Some(estado) = self.estado {
            qb.push(" AND p.estado = ");
            qb.push_bind(estado.as_str());
        }
        if let Some(categoria) = self.categoria {
            qb.push(" AND p.categoria = ");
            qb.push_bind(categoria.as_str());
        }
        if let Some(carrera) = &self.carrera {
            qb.push(" AND p.carrera = ");
            qb.push_bind(carrera.clone());
        }
        if let Some(autor) = self.autor {
            qb.push(" AND p.autor = ");
            qb.push_bind(autor);
        }
        if let Some(texto) = &self.texto {
            qb.push(
                " AND to_tsvector('spanish', p.titulo || ' ' || p.descripcion) \
                 @@ plainto_tsquery('spanish', ",
            );
            qb.push_bind(texto.clone());
            qb.push(")");
        }
    }
}

/// Los campos de un proyecto que la política necesita para decidir.
#[derive(Debug, Clone)]
pub struct VistaProyecto {
    pub autor: Uuid,
    pub estado: Estado,
    pub publico: bool,
    pub categoria: Categoria,
    pub carrera: String,
    pub titulo: String,
}

/// Recurso sobre el que se pide actuar.
#[derive(Debug, Clone, Copy)]
pub enum Recurso {
    Proyecto { autor: Uuid, estado: Estado },
    Comentario { autor: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accion {
    /// Lectura de una entidad concreta (no listado).
    Ver,
    Editar,
    Eliminar,
    /// Likes y comentarios.
    Interactuar,
}

/// Chequeo central de capacidades: (visor, recurso, acción) -> decisión.
/// Lo invocan de manera uniforme todos los handlers que tocan un proyecto
/// o un comentario.
pub fn autorizar(visor: &Visor, recurso: &Recurso, accion: Accion) -> Result<(), AppError> {
    if visor.es_admin() {
        return Ok(());
    }

    match (recurso, accion) {
        // Lectura e interacción: publicado, o el autor sobre lo suyo.
        // Lecturas no autorizadas fallan con Forbidden, no NotFound: la
        // existencia se revela, el contenido no.
        (Recurso::Proyecto { autor, estado }, Accion::Ver) => {
            if *estado == Estado::Publicado || visor.id() == Some(*autor) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No tienes permiso para ver este proyecto".to_string(),
                ))
            }
        }
        (Recurso::Proyecto { autor, estado }, Accion::Interactuar) => {
            if visor.id().is_none() {
                return Err(AppError::Unauthorized(
                    "Acceso denegado: token no proporcionado".to_string(),
                ));
            }
            if *estado == Estado::Publicado || visor.id() == Some(*autor) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No tienes permiso para interactuar con este proyecto".to_string(),
                ))
            }
        }
        (Recurso::Proyecto { autor, .. }, Accion::Editar) => {
            if visor.id() == Some(*autor) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No tienes permiso para editar este proyecto".to_string(),
                ))
            }
        }
        (Recurso::Proyecto { autor, .. }, Accion::Eliminar) => {
            if visor.id() == Some(*autor) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No tienes permiso para eliminar este proyecto".to_string(),
                ))
            }
        }
        // El autor de un comentario (o un admin, cubierto arriba) puede
        // eliminarlo. No existe edición de comentarios.
        (Recurso::Comentario { autor }, Accion::Eliminar) => {
            if visor.id() == Some(*autor) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No tienes permiso para eliminar este comentario".to_string(),
                ))
            }
        }
        (Recurso::Comentario { .. }, _) => Err(AppError::Forbidden(
            "Acción no permitida sobre el comentario".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proyecto(autor: Uuid, estado: Estado, publico: bool) -> VistaProyecto {
        VistaProyecto {
            autor,
            estado,
            publico,
            categoria: Categoria::Academico,
            carrera: "Desarrollo de Software".to_string(),
            titulo: "Demo".to_string(),
        }
    }

    #[test]
    fn anonimo_solo_ve_publicados_y_publicos() {
        let autor = Uuid::new_v4();
        let filtro = FiltroProyectos::componer(&Visor::Anonimo, Alcance::default());

        assert!(filtro.permite(&proyecto(autor, Estado::Publicado, true)));
        assert!(!filtro.permite(&proyecto(autor, Estado::EnProgreso, true)));
        assert!(!filtro.permite(&proyecto(autor, Estado::Publicado, false)));
    }

    #[test]
    fn anonimo_no_puede_recortar_por_estado() {
        let filtro = FiltroProyectos::componer(
            &Visor::Anonimo,
            Alcance {
                estado: Some(Estado::EnProgreso),
                ..Default::default()
            },
        );
        assert_eq!(filtro.estado, Some(Estado::Publicado));
    }

    #[test]
    fn autor_ve_su_borrador_en_el_listado() {
        let autor = Uuid::new_v4();
        let otro = Uuid::new_v4();
        let filtro = FiltroProyectos::componer(&Visor::Estudiante(autor), Alcance::default());

        assert!(filtro.permite(&proyecto(autor, Estado::EnProgreso, true)));
        assert!(!filtro.permite(&proyecto(otro, Estado::EnProgreso, true)));
        assert!(filtro.permite(&proyecto(otro, Estado::Publicado, true)));
    }

    #[test]
    fn el_borrador_privado_es_invisible_incluso_para_su_autor() {
        // Asimetría heredada: el AND sobre publico no se levanta para el
        // autor en los listados.
        let autor = Uuid::new_v4();
        let filtro = FiltroProyectos::componer(&Visor::Estudiante(autor), Alcance::default());

        assert!(!filtro.permite(&proyecto(autor, Estado::EnProgreso, false)));
    }

    #[test]
    fn admin_ve_todo_sin_restricciones() {
        let admin = Visor::Admin(Uuid::new_v4());
        let filtro = FiltroProyectos::componer(&admin, Alcance::default());
        let autor = Uuid::new_v4();

        assert!(filtro.permite(&proyecto(autor, Estado::EnProgreso, false)));
        assert!(filtro.permite(&proyecto(autor, Estado::Publicado, true)));
    }

    #[test]
    fn el_alcance_recorta_dentro_de_la_visibilidad() {
        let filtro = FiltroProyectos::componer(
            &Visor::Anonimo,
            Alcance {
                categoria: Some(Categoria::Extracurricular),
                carrera: Some("Redes".to_string()),
                ..Default::default()
            },
        );

        let mut p = proyecto(Uuid::new_v4(), Estado::Publicado, true);
        assert!(!filtro.permite(&p));
        p.categoria = Categoria::Extracurricular;
        assert!(!filtro.permite(&p));
        p.carrera = "Redes".to_string();
        assert!(filtro.permite(&p));
    }

    #[test]
    fn busqueda_por_texto_dentro_de_la_visibilidad() {
        let filtro = FiltroProyectos::componer(
            &Visor::Anonimo,
            Alcance {
                texto: Some("demo".to_string()),
                ..Default::default()
            },
        );
        let p = proyecto(Uuid::new_v4(), Estado::Publicado, true);
        assert!(filtro.permite(&p));

        let filtro = FiltroProyectos::componer(
            &Visor::Anonimo,
            Alcance {
                texto: Some("inexistente".to_string()),
                ..Default::default()
            },
        );
        assert!(!filtro.permite(&p));
    }

    #[test]
    fn lectura_individual_de_borrador_solo_para_el_autor() {
        let autor = Uuid::new_v4();
        let recurso = Recurso::Proyecto {
            autor,
            estado: Estado::EnProgreso,
        };

        assert!(autorizar(&Visor::Estudiante(autor), &recurso, Accion::Ver).is_ok());
        assert!(autorizar(&Visor::Admin(Uuid::new_v4()), &recurso, Accion::Ver).is_ok());

        let err = autorizar(&Visor::Estudiante(Uuid::new_v4()), &recurso, Accion::Ver)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn solo_el_autor_edita_y_elimina() {
        let autor = Uuid::new_v4();
        let recurso = Recurso::Proyecto {
            autor,
            estado: Estado::Publicado,
        };

        assert!(autorizar(&Visor::Estudiante(autor), &recurso, Accion::Editar).is_ok());
        assert!(
            autorizar(&Visor::Estudiante(Uuid::new_v4()), &recurso, Accion::Eliminar).is_err()
        );
    }

    #[test]
    fn eliminar_comentario_requiere_autor_o_admin() {
        let autor = Uuid::new_v4();
        let recurso = Recurso::Comentario { autor };

        assert!(autorizar(&Visor::Estudiante(autor), &recurso, Accion::Eliminar).is_ok());
        assert!(autorizar(&Visor::Admin(Uuid::new_v4()), &recurso, Accion::Eliminar).is_ok());

        let err = autorizar(
            &Visor::Estudiante(Uuid::new_v4()),
            &recurso,
            Accion::Eliminar,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn en_rutas_publicas_el_admin_filtra_como_estudiante() {
        let id = Uuid::new_v4();
        let visor = Visor::Admin(id).sin_privilegios();
        assert_eq!(visor, Visor::Estudiante(id));

        let filtro = FiltroProyectos::componer(&visor, Alcance::default());
        assert!(!filtro.permite(&proyecto(Uuid::new_v4(), Estado::EnProgreso, true)));
    }

    #[test]
    fn publicar_es_valido_solo_desde_en_progreso() {
        assert_eq!(Estado::EnProgreso.publicar().unwrap(), Estado::Publicado);
        assert!(matches!(
            Estado::Publicado.publicar().unwrap_err(),
            AppError::InvalidState(_)
        ));
    }

    #[test]
    fn despublicar_es_valido_solo_desde_publicado() {
        assert_eq!(Estado::Publicado.despublicar().unwrap(), Estado::EnProgreso);
        assert!(matches!(
            Estado::EnProgreso.despublicar().unwrap_err(),
            AppError::InvalidState(_)
        ));
    }
}
