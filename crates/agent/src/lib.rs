//! Scheduler agent: periodic resource sampling behind health, metrics and
//! read-only resource endpoints

pub mod api;
pub mod config;
