pub mod app;
pub mod core;
pub mod credentials;
pub mod fetcher;
pub mod notifications;
pub mod scanner;
pub mod server;
pub mod submission;
