//! Polls Postgres for rows changed since a per task checkpoint, encodes every
//! row as Avro in the schema registry wire format and publishes it to Kafka.
//!
//! A [`task::Task`] performs one pass: it reads its checkpoint, streams the
//! changed rows from a [`source::RowSource`], relays each of them through an
//! [`encoding::Encoder`] and a [`publisher::Publisher`] and finally moves the
//! checkpoint in the [`store::CheckpointStore`] to the time the pass started.
//! A [`pipeline::Pipeline`] drives every task on its own interval until
//! shutdown is signaled.

pub mod concurrency;
pub mod encoding;
pub mod error;
mod macros;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod publisher;
pub mod source;
pub mod store;
pub mod task;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod workers;
