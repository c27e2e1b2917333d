mod pagination;
mod relation;
mod repository;

pub use pagination::*;
pub use relation::*;
pub use repository::*;
