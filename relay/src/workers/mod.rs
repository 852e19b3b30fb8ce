pub mod base;
pub mod runner;
