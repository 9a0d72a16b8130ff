//! HTTP surface: health, lobby counts and the WebSocket upgrade

mod routes;

pub use routes::build_router;
