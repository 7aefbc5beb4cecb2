pub mod api;
pub mod auth;
pub mod cart;
pub mod cli;
pub mod config;
pub mod database;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod models;
pub mod routes;
pub mod state;
pub mod threadpool;
