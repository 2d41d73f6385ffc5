pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod providers;
pub mod routing;
pub mod scoring;
pub mod storage;
