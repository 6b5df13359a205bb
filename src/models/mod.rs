// src/models/mod.rs

//! Domain models for the watcher application.

mod config;
mod measure;

// Re-export all public types
pub use config::{Config, SelectorConfig, StorageConfig, TelegramConfig, WatcherConfig};
pub use measure::Measure;
