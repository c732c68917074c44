pub mod admin;
pub mod auth;
pub mod cli;
pub mod client;
pub mod credentials;
pub mod deploy;
pub mod models;
pub mod session;
