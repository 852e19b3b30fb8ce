//! Doubles and fixtures used by the relay tests.
//!
//! Everything here runs in process: scripted row sources, stores and
//! publishers that fail on demand, and a runnable that only counts its runs.
pub mod encoder;
pub mod publisher;
pub mod record;
pub mod runnable;
pub mod source;
pub mod store;
