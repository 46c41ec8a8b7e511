pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod inventory;
pub mod state;
pub mod sweets;
