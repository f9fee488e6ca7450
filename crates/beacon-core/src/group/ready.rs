use tokio::sync::oneshot;

/// One-shot readiness notification handed to a group member.
///
/// Dropping the signal without calling [`ReadySignal::notify`] tells the
/// supervisor the member never became ready.
#[derive(Debug)]
pub struct ReadySignal {
    tx: oneshot::Sender<()>,
}

impl ReadySignal {
    /// Create a signal and the receiver the supervisor waits on.
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Announce readiness.
    pub fn notify(self) {
        let _ = self.tx.send(());
    }
}
