pub mod classifier;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod languages;
pub mod types;
pub mod validation;
