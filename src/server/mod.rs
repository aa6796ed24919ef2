mod client_identity;
pub mod config;
mod http_layers;
pub mod server;
pub mod state;

pub use client_identity::{ClientIdentity, ANONYMOUS_CLIENT};
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
