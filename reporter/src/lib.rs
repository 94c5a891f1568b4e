pub mod client;
pub mod config;
pub mod input;
pub mod models;
pub mod plot;
pub mod refine;
pub mod report;
