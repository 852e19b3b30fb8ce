pub mod shutdown;
pub mod stream;
