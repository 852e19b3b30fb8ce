mod base;
mod country;
mod user;

pub use base::*;
pub use country::*;
pub use user::*;
