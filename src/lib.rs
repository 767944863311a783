pub mod api;
pub mod color;
pub mod config;
pub mod debounce;
pub mod http_server;
pub mod mock;
pub mod models;
pub mod session;
