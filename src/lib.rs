pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod web;
