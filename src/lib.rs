pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod normalize;
pub mod observability;
pub mod relay;
