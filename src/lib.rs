//! FichaPRO Portfolio API Library
//!
//! This library provides the core functionality for the FichaPRO real-estate
//! back-office API: the complex-property unification and aggregation engine,
//! database storage, HTTP handlers, and the public ficha surface.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Database storage operations.
//! - `errors`: Error handling types.
//! - `ficha`: Public ficha share links.
//! - `handlers`: HTTP request handlers.
//! - `lead_capture`: Public lead capture.
//! - `models`: Core data models.
//! - `policy`: Role capability checks.
//! - `portfolio`: Unification and aggregation engine.

pub mod api;
pub mod core;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod ficha;
pub mod handlers;
pub mod lead_capture;
pub mod models;
pub mod policy;
pub mod portfolio;
