//! Inbox printer.
//!
//! Periodically drains every peer's queue and prints `<host> - <message>`.

use std::time::Duration;

use parley_p2p::MessengerHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::shutdown::ShutdownGuard;

/// Drain all pending messages, formatted for display.
pub fn collect_inbox(handle: &MessengerHandle) -> Vec<String> {
    handle
        .list_peers()
        .into_iter()
        .filter(|peer| peer.pending > 0)
        .flat_map(|peer| {
            handle
                .drain(&peer.host)
                .into_iter()
                .map(move |message| format!("{} - {}", peer.host, message))
        })
        .collect()
}

/// Print incoming messages until shutdown.
pub async fn run_inbox_printer(
    handle: MessengerHandle,
    poll_interval: Duration,
    mut shutdown: ShutdownGuard,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {
                for line in collect_inbox(&handle) {
                    println!("{}", line);
                }
            }
        }
    }

    tracing::debug!("Inbox printer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::KeyPair;
    use parley_p2p::{P2pConfig, P2pNode};

    use crate::shutdown::{Shutdown, ShutdownReason};

    #[tokio::test]
    async fn test_collect_inbox() {
        let node = P2pNode::bind(
            P2pConfig::new("127.0.0.1:0".parse().unwrap()),
            KeyPair::generate(),
        )
        .await
        .unwrap();
        let handle = node.handle();
        let table = handle.peer_table();

        table.upsert("10.0.0.2", 8000, vec![2; 32]);
        table.upsert("10.0.0.3", 8000, vec![3; 32]);
        table.enqueue("10.0.0.3", "second".into()).unwrap();
        table.enqueue("10.0.0.2", "first".into()).unwrap();
        table.enqueue("10.0.0.2", "again".into()).unwrap();

        assert_eq!(
            collect_inbox(&handle),
            vec!["10.0.0.2 - first", "10.0.0.2 - again", "10.0.0.3 - second"]
        );
        assert!(collect_inbox(&handle).is_empty());
    }

    #[tokio::test]
    async fn test_printer_stops_on_shutdown() {
        let node = P2pNode::bind(
            P2pConfig::new("127.0.0.1:0".parse().unwrap()),
            KeyPair::generate(),
        )
        .await
        .unwrap();
        let shutdown = Shutdown::new();

        let printer = tokio::spawn(run_inbox_printer(
            node.handle(),
            Duration::from_millis(10),
            shutdown.guard(),
        ));
        shutdown.trigger(ShutdownReason::Exit);

        tokio::time::timeout(Duration::from_secs(2), printer)
            .await
            .expect("printer should stop")
            .unwrap();
    }
}
