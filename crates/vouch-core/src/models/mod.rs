//! Data models for parsed receipts, stored transfers and configuration.

pub mod config;
pub mod receipt;
pub mod transfer;
