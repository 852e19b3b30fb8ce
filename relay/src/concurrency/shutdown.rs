use tokio::sync::watch;

/// Sending half of the process wide shutdown signal.
///
/// The signal is level triggered: receivers subscribed after [`ShutdownTx::shutdown`]
/// still observe it.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

impl ShutdownTx {
    pub fn wrap(tx: watch::Sender<bool>) -> Self {
        Self(tx)
    }

    /// Signals shutdown to every current and future receiver.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }

    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }

    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }
}

/// Receiving half of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been signaled.
    ///
    /// Also resolves when every [`ShutdownTx`] has been dropped, since no signal can
    /// arrive anymore.
    pub async fn wait(&mut self) {
        let _ = self.0.wait_for(|shutdown| *shutdown).await;
    }
}

pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx::wrap(tx), ShutdownRx(rx))
}
