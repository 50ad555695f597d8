use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{Error, Result, BACKOFF};

/// Liveness check of the site behind the pages.
#[allow(async_fn_in_trait)]
pub trait Probe {
    async fn is_reachable(&self) -> bool;
}

/// Holds every navigation back until the site answers again.
///
/// The site rate-limits aggressive clients by refusing requests for a while,
/// so the gate probes, sleeps a fixed backoff and probes again. There is no
/// retry limit: without a cancel receiver a site that never comes back blocks
/// forever.
pub struct ReachabilityGate<P> {
    probe: P,
    backoff: Duration,
    cancel: Option<watch::Receiver<bool>>,
}

enum Wake {
    Slept,
    Cancelled,
    SenderGone,
}

impl<P: Probe> ReachabilityGate<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            backoff: BACKOFF,
            cancel: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sending `true` on the paired sender aborts a pending wait with [`Error::Cancelled`].
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn ensure_reachable(&mut self) -> Result<()> {
        let mut failed = 0u32;
        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if self.probe.is_reachable().await {
                if failed > 0 {
                    info!("site reachable again after {failed} failed probes");
                }
                return Ok(());
            }
            failed += 1;
            warn!(
                "site unreachable (probe {failed}), retrying in {}s",
                self.backoff.as_secs()
            );
            self.wait_backoff().await?;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow())
    }

    async fn wait_backoff(&mut self) -> Result<()> {
        let Some(cancel) = self.cancel.as_mut() else {
            sleep(self.backoff).await;
            return Ok(());
        };

        let pause = sleep(self.backoff);
        tokio::pin!(pause);
        let wake = tokio::select! {
            _ = &mut pause => Wake::Slept,
            res = cancel.wait_for(|cancelled| *cancelled) => {
                if res.is_ok() { Wake::Cancelled } else { Wake::SenderGone }
            }
        };

        match wake {
            Wake::Slept => Ok(()),
            Wake::Cancelled => Err(Error::Cancelled),
            // Nobody can cancel anymore.
            Wake::SenderGone => {
                self.cancel = None;
                pause.await;
                Ok(())
            }
        }
    }
}
