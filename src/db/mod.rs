pub mod entities;
pub mod schema;
pub mod services;
pub mod store;

pub use schema::ensure_schema;
pub use store::SeaOrmStore;
