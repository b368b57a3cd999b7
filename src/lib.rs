pub mod app;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod models;
pub mod state;
pub mod ui;

pub use app::router;
pub use client::{AssessmentApi, BackendClient};
pub use config::Config;
pub use state::AppState;
