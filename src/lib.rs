//! Telecom Customer Insights API Library
//!
//! Recommends service plans to telecom customers from their usage
//! statistics and reports savings and upsell opportunities across the
//! customer population.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Recommendation engine and query pipeline.
//! - `data`: Customer data access layer.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `db`: Database pool management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `object_store`: S3-compatible object download client.
//! - `pipeline`: Filter/sort/paginate/aggregate over recommendations.
//! - `recommender`: Plan catalog and rule-based recommendation.
//! - `repository`: Cached customer table with source fallback.
//! - `sources`: Filesystem, object store and database data sources.

pub mod api;
pub mod core;
pub mod data;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod object_store;
pub mod pipeline;
pub mod recommender;
pub mod repository;
pub mod sources;
