//! Transparency module for the HSI core.
//!
//! This module provides tools for tracking and exposing what data
//! the core collects and uploads, supporting user trust and regulatory
//! compliance.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
