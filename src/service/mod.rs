//! CRUD service layer: validation plus generic execution over the connectors.

mod crud;
mod validation;

pub use crud::CrudService;
pub use validation::RequestValidator;
