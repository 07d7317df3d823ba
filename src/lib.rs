pub mod api;
pub mod cards;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
