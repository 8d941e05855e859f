use std::future::Future;
use std::pin::Pin;

use minicron::signals::TerminationListener;
use tokio::sync::mpsc;

/// Test stand-in for SIGTERM: requests are sent through a channel.
#[derive(Debug)]
pub struct ManualTermination {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Sending half of a [`ManualTermination`].
#[derive(Debug, Clone)]
pub struct TerminationTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl TerminationTrigger {
    pub fn request(&self) {
        let _ = self.tx.send(());
    }
}

pub fn manual_termination() -> (TerminationTrigger, ManualTermination) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TerminationTrigger { tx }, ManualTermination { rx })
}

impl TerminationListener for ManualTermination {
    fn requested(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.rx.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        })
    }
}
