// ABOUTME: Library root for cohort - rolling container deploys across engine hosts.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod runtime;
pub mod service;
pub mod tunnel;
pub mod types;
