//! Preference service adapter
//!
//! External boundary of the retrieval engine: the wire models for the
//! query endpoint and the authenticated HTTP client behind the
//! [`client::PreferenceStore`] trait.

pub mod client;
pub mod models;

pub use client::{PreferenceClient, PreferenceStore};
pub use models::{QueryPage, QueryRequest, MAX_PAGE_SIZE};
