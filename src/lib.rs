pub mod app;
pub mod config;
pub mod conversation;
pub mod error;
pub mod html;
pub mod image_io;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
pub mod session;

pub use app::build_app;
pub use models::AppState;
