//! External service adapters

pub mod preferences;
