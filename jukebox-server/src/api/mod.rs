//! HTTP API handlers for jukebox-server

pub mod health;
pub mod library;
pub mod stream;

pub use health::health_routes;
pub use library::library_routes;
pub use stream::stream_routes;
