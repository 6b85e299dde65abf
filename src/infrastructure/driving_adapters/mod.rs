//! Driving Adapters
//!
//! Entry points that drive the application:
//! - Console runner printing demo result tables

pub mod console;
