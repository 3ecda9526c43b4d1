pub mod analytics;
pub mod connection;
pub mod migrate;
pub mod queries;
