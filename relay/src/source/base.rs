use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::RelayResult;
use crate::models::Record;

/// Lazy stream of rows changed since a checkpoint.
///
/// Yields `Ok` rows in query order. A failed query or an undecodable row is
/// reported as a single trailing `Err`, after which the stream ends.
pub type RowStream<'a, R> = BoxStream<'a, RelayResult<R>>;

/// Source of rows for one task.
///
/// Implementations must stream results rather than materialize them, a
/// backlog can be arbitrarily large.
pub trait RowSource: Send + Sync {
    type Record: Record;

    /// Opens a stream of the rows modified after `since`.
    fn stream(&self, since: DateTime<Utc>) -> RowStream<'_, Self::Record>;
}
