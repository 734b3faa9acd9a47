pub mod model;
pub mod config;
pub mod control;
pub mod rec;
