//! Shutdown coordination.
//!
//! The node stops on the shell's `exit`, at end of input or on SIGINT/SIGTERM.
//! Each of those goes through [`Shutdown::trigger`], which wakes every
//! [`ShutdownGuard`]. Tasks take their guard before they are spawned so a
//! trigger that fires early is never missed.

use std::fmt;
use std::future::Future;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// What stopped the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The user typed `exit`.
    Exit,
    /// Stdin closed.
    EndOfInput,
    /// SIGINT or Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exit => "exit command",
            Self::EndOfInput => "end of input",
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        };
        f.write_str(name)
    }
}

/// Shutdown trigger shared by the node's tasks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    /// Create an untriggered shutdown.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Take a guard that observes every later trigger.
    pub fn guard(&self) -> ShutdownGuard {
        ShutdownGuard {
            rx: self.tx.subscribe(),
        }
    }

    /// Stop the node.
    pub fn trigger(&self, reason: ShutdownReason) {
        tracing::info!(%reason, "Shutdown requested");
        let _ = self.tx.send(reason);
    }

    /// Wait until shutdown is triggered or a termination signal arrives.
    ///
    /// A signal is turned into a trigger, so every guard wakes either way.
    pub async fn wait_for_trigger_or_signal(&self, guard: &mut ShutdownGuard) {
        let signal = async {
            match wait_for_signal().await {
                Ok(reason) => reason,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for signals");
                    std::future::pending().await
                }
            }
        };

        tokio::select! {
            _ = guard.wait() => {}
            reason = signal => self.trigger(reason),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`Shutdown`].
pub struct ShutdownGuard {
    rx: broadcast::Receiver<ShutdownReason>,
}

impl ShutdownGuard {
    /// Wait for a trigger, or for every [`Shutdown`] to be dropped.
    pub async fn wait(&mut self) {
        loop {
            match self.rx.recv().await {
                Ok(_) | Err(RecvError::Closed) => return,
                Err(RecvError::Lagged(_)) => continue,
            }
        }
    }

    /// Drive `fut` to completion unless shutdown comes first.
    pub async fn run_until<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.wait() => None,
            output = fut => Some(output),
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() -> std::io::Result<ShutdownReason> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => Ok(ShutdownReason::Interrupt),
            _ = sigterm.recv() => Ok(ShutdownReason::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownReason::Interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_before_wait_is_seen() {
        let shutdown = Shutdown::new();
        let mut guard = shutdown.guard();

        shutdown.trigger(ShutdownReason::EndOfInput);

        timeout(Duration::from_secs(1), guard.wait())
            .await
            .expect("guard taken before the trigger should wake");
    }

    #[tokio::test]
    async fn test_repeated_triggers_still_wake() {
        let shutdown = Shutdown::new();
        let mut guard = shutdown.guard();

        shutdown.trigger(ShutdownReason::Exit);
        shutdown.trigger(ShutdownReason::Interrupt);

        timeout(Duration::from_secs(1), guard.wait())
            .await
            .expect("lagged guard should still wake");
    }

    #[tokio::test]
    async fn test_wait_returns_when_dropped() {
        let shutdown = Shutdown::new();
        let mut guard = shutdown.guard();
        drop(shutdown);

        timeout(Duration::from_secs(1), guard.wait())
            .await
            .expect("guard should wake once every sender is gone");
    }

    #[tokio::test]
    async fn test_run_until() {
        let shutdown = Shutdown::new();
        let mut guard = shutdown.guard();

        assert_eq!(guard.run_until(async { 7 }).await, Some(7));

        shutdown.trigger(ShutdownReason::Exit);
        let stalled = guard.run_until(std::future::pending::<()>());
        let result = timeout(Duration::from_secs(1), stalled)
            .await
            .expect("shutdown should cut the future short");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_wait_for_trigger_or_signal_returns_on_trigger() {
        let shutdown = Shutdown::new();
        let mut guard = shutdown.guard();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger(ShutdownReason::Exit);
        });

        timeout(
            Duration::from_secs(1),
            shutdown.wait_for_trigger_or_signal(&mut guard),
        )
        .await
        .expect("trigger should end the wait");
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::Exit.to_string(), "exit command");
        assert_eq!(ShutdownReason::Terminate.to_string(), "SIGTERM");
    }
}
