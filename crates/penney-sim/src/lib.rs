pub mod batch;
pub mod config;
pub mod heatmap;
pub mod logging;
pub mod runner;
pub mod store;
