use diesel::{
    Connection, PgConnection,
    r2d2::{self, ConnectionManager},
};
use thiserror::Error;

use crate::config::StoreConfig;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Pool error: {0}")]
    PoolError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
}

pub fn create_connection_pool(config: &StoreConfig) -> Result<DbPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

    r2d2::Pool::builder()
        .max_size(config.pool_size)
        .min_idle(Some(1))
        .build(manager)
        .map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn get_database_connection(config: &StoreConfig) -> Result<PgConnection, DatabaseError> {
    PgConnection::establish(&config.database_url)
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
}

pub fn get_connection_from_pool(pool: &DbPool) -> Result<DbConnection, DatabaseError> {
    pool.get().map_err(|e| DatabaseError::PoolError(e.to_string()))
}
