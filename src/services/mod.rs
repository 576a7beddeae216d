pub mod cache;
pub mod cleanup;
pub mod error;
