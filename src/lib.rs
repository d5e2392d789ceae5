// Harvest - Consent Preference Retrieval Engine
// Copyright (c) 2025 Harvest Contributors
// Licensed under the MIT License

//! # Harvest - Consent Preference Retrieval Engine
//!
//! Harvest retrieves complete consent preference datasets from a remote
//! preference service whose query API is cursor-paginated and offers no
//! bulk endpoint. It splits the requested time span into hour-aligned
//! windows, fetches them concurrently, and reassembles the pages into
//! one deterministically ordered, duplicate-free record sequence.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Planning** hour-aligned, half-open time windows over a span
//! - **Discovering** span endpoints the caller leaves open, by probing
//!   the dataset for its earliest and latest days with data
//! - **Fetching** windows concurrently with retries and backoff
//! - **Merging** pages in strict window order with bounded dedup
//!
//! ## Architecture
//!
//! Harvest follows a layered architecture:
//!
//! - [`core`] - Business logic (chunking, discovery, pagination,
//!   orchestration, dedup, ordering)
//! - [`adapters`] - The preference service HTTP client
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use harvest::adapters::preferences::PreferenceClient;
//! use harvest::config::HarvestConfig;
//! use harvest::core::{ExportRequest, PreferenceExporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = HarvestConfig::from_file("harvest.toml")?;
//!
//!     // Create the client and the exporter
//!     let client = Arc::new(PreferenceClient::new(&config.api)?);
//!     let exporter = PreferenceExporter::new(client, config);
//!
//!     // Retrieve every record in the "acme" partition
//!     let outcome = exporter.export(ExportRequest::new("acme")).await?;
//!
//!     println!("Retrieved {} records", outcome.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Harvest uses the [`domain::HarvestError`] type for all errors:
//!
//! ```rust,no_run
//! use harvest::domain::HarvestError;
//!
//! fn example() -> Result<(), HarvestError> {
//!     // Errors are automatically converted using the ? operator
//!     let config = harvest::config::HarvestConfig::from_file("harvest.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Harvest uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(partition = "acme", "Starting export");
//! warn!(chunk_index = 3, "Window failed; skipping its results");
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
