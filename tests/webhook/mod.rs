//! Webhook Integration Test Modules

pub mod cleanup;
pub mod processing;
pub mod rejection;
