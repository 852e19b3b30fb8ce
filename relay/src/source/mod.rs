mod base;
mod postgres;

pub use base::*;
pub use postgres::*;
