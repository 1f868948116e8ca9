pub mod calendar;
pub mod config;
pub mod grid;
pub mod ingest;
pub mod model;
pub mod observability;
pub mod render;
pub mod session;
pub mod source;
