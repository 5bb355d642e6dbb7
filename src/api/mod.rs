//! Snyk API access.
//!
//! This module provides the HTTP client for the REST and legacy v1 APIs.

pub mod client;

pub use client::{filter_targets_by_integration, SnykClient};
