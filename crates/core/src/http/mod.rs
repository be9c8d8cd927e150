//! Shared HTTP plumbing for the price sources

pub mod pool;

pub use pool::create_client;
