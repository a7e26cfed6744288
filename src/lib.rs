pub mod cli;
pub mod error;
pub mod export;
pub mod filters;
pub mod links;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod sources;
pub mod ui;
