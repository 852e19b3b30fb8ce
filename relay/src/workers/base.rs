use std::future::Future;

use crate::error::RelayResult;

/// A trait for types that can be started as workers.
///
/// `H` is the handle returned once the worker is running and `S` the state
/// observable through that handle.
pub trait Worker<H, S>
where
    H: WorkerHandle<S>,
{
    /// Error type.
    type Error;

    /// Starts the worker and returns a handle to it.
    fn start(self) -> impl Future<Output = Result<H, Self::Error>> + Send;
}

/// A handle to a running worker.
pub trait WorkerHandle<S> {
    /// Returns the current state of the worker.
    fn state(&self) -> S;

    /// Returns a future that resolves when the worker completes.
    fn wait(self) -> impl Future<Output = RelayResult<()>> + Send;
}
