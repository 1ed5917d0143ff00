//! Application module

pub mod cli;
pub mod config;
pub mod startup;
