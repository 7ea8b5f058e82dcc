//! HTTP API handlers for rollcall-api

pub mod health;
pub mod roster;
pub mod ui;
pub mod upload;

pub use health::health_routes;
pub use roster::get_roster;
pub use ui::{serve_app_js, serve_index};
pub use upload::upload_sheet;
