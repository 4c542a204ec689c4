pub mod config;
pub mod db;
pub mod format;
pub mod import;
pub mod models;
pub mod settings;
pub mod vault;
