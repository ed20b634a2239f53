//! HTTP host for the PSA trend engine

pub mod api;
pub mod config;
