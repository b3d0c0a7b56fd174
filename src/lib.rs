//! Customer Master API Library
//!
//! Master-data management for customer records: create, retrieve by id,
//! partial-match search, partial update and hard delete over HTTP/JSON.
//!
//! # Modules
//!
//! - `app`: Router assembly and OpenAPI document.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and schema bootstrap.
//! - `db_storage`: `CustomerStore` trait and the PostgreSQL store.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `memory_storage`: In-process `CustomerStore`.
//! - `models`: Wire and storage models.
//! - `services`: Customer operations.
//! - `validation`: Field-level validation rules.

pub mod app;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod memory_storage;
pub mod models;
pub mod services;
pub mod validation;
