pub mod activity;
pub mod collections;
pub mod db;
pub mod models;
pub mod preferences;
pub mod queries;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
