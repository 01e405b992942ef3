pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod tasks;
pub mod voting;
