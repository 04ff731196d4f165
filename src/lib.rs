//! ClipWatch - wearable safety alert intake and notification dispatch
//!
//! This library provides the core functionality for receiving emergency
//! alerts from wearable devices, persisting them durably, and notifying
//! each device's registered guardian and police contacts by SMS.

pub mod cli;
pub mod config;
pub mod contacts;
pub mod core;
pub mod formatting;
pub mod ingest;
pub mod notification;
pub mod server;
pub mod storage;

// Re-export core types for convenience
pub use crate::core::{
    AlertPayload, AlertRecord, AlertStore, ContactEntry, DispatchOutcome, Notifier,
};
