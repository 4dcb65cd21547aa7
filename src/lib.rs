pub mod config;
pub mod data;
pub mod db;
pub mod features;
pub mod handlers;
pub mod schema;
pub mod state;
pub mod utils;

pub use handlers::review_router;
pub use state::AppState;
