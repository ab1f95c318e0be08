pub mod catalog_sqlx;
pub mod cli;
pub mod config;
pub mod db;
pub mod overrides;
pub mod purge;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod transition;

pub mod error;
pub mod logger;
