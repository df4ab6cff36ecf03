pub mod connection;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod schema_setup;

pub use connection::{
    DatabaseError, DbConnection, DbPool, create_connection_pool, get_connection_from_pool,
    get_database_connection,
};
pub use schema_setup::{VectorSupport, setup_schema};
