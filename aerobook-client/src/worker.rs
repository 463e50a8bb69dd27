use aerobook_core::{BookingGateway, Identity};
use aerobook_order::Transition;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::{SharedTickets, TransitionSender};

#[derive(Debug, Default)]
pub struct PollStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl PollStats {
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Refreshes the caller's tickets at a fixed cadence so that asynchronous
/// payment settlement becomes visible.
pub struct TicketPoller<G: ?Sized> {
    gateway: Arc<G>,
    identity: Identity,
    tickets: SharedTickets,
    events: TransitionSender,
    period: Duration,
    stats: Arc<PollStats>,
}

impl<G> TicketPoller<G>
where
    G: BookingGateway + ?Sized + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        identity: Identity,
        tickets: SharedTickets,
        events: TransitionSender,
        period: Duration,
    ) -> Self {
        Self {
            gateway,
            identity,
            tickets,
            events,
            // interval() panics on a zero period
            period: period.max(Duration::from_millis(1)),
            stats: Arc::new(PollStats::default()),
        }
    }

    /// One refresh. Failures are logged and swallowed.
    pub async fn poll_once(&self) -> Option<Vec<Transition>> {
        match self.gateway.list_tickets(&self.identity).await {
            Ok(fetched) => {
                let transitions = self.tickets.write().await.replace_all(fetched);
                self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                for t in &transitions {
                    // Nobody listening is fine
                    let _ = self.events.send(t.clone());
                }
                Some(transitions)
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Ticket poll for {} failed: {}", self.identity.user_id, e);
                None
            }
        }
    }

    /// Start polling on the runtime. The first refresh happens one period
    /// from now; the initial load is the caller's job.
    pub fn spawn(self) -> PollHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let stats = self.stats.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately once
            ticker.tick().await;

            info!("Ticket poller started for {} every {:?}", self.identity.user_id, self.period);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.poll_once().await;
                    }
                }
            }
            debug!("Ticket poller for {} stopped", self.identity.user_id);
        });

        PollHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            stats,
        }
    }
}

/// Owns the running poller. Dropping it aborts the task.
pub struct PollHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    stats: Arc<PollStats>,
}

impl PollHandle {
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop ticking and wait for an in-flight poll to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Ticket poller ended abnormally: {}", e);
                }
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{shared_tickets, transition_channel};
    use crate::testing::{passenger, FakeGateway};
    use aerobook_core::{Ticket, TicketState};
    use rust_decimal::Decimal;

    fn poller(gateway: Arc<FakeGateway>, tickets: SharedTickets) -> TicketPoller<FakeGateway> {
        TicketPoller::new(
            gateway,
            passenger("u1"),
            tickets,
            transition_channel(),
            Duration::from_secs(3),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_at_fixed_interval() {
        let gateway = Arc::new(FakeGateway::default());
        let handle = poller(gateway.clone(), shared_tickets()).spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gateway.list_calls(), 0);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(gateway.list_calls(), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(gateway.list_calls(), 3);
        assert_eq!(handle.stats().succeeded(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_does_not_stop_schedule() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.fail_lists(2);
        let handle = poller(gateway.clone(), shared_tickets()).spawn();

        tokio::time::sleep(Duration::from_millis(9_100)).await;

        assert_eq!(gateway.list_calls(), 3);
        assert_eq!(handle.stats().failed(), 2);
        assert_eq!(handle.stats().succeeded(), 1);
        assert!(handle.is_running());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_schedule() {
        let gateway = Arc::new(FakeGateway::default());
        let handle = poller(gateway.clone(), shared_tickets()).spawn();

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        handle.stop().await;
        let calls = gateway.list_calls();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.list_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_schedule() {
        let gateway = Arc::new(FakeGateway::default());
        let handle = poller(gateway.clone(), shared_tickets()).spawn();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_poll_replaces_view_and_publishes_settlement() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.seed_ticket(Ticket::new("T1", "FL7", "u1", Decimal::from(5000)).with_state(TicketState::Paid));

        let tickets = shared_tickets();
        tickets
            .write()
            .await
            .insert(Ticket::new("T1", "FL7", "u1", Decimal::from(5000)).with_state(TicketState::Pending));

        let events = transition_channel();
        let mut rx = events.subscribe();
        let poller = TicketPoller::new(gateway, passenger("u1"), tickets.clone(), events, Duration::from_secs(3));

        let transitions = poller.poll_once().await.unwrap();
        assert_eq!(transitions, vec![Transition::Settled { ticket_id: "T1".to_string() }]);
        assert_eq!(rx.recv().await.unwrap(), Transition::Settled { ticket_id: "T1".to_string() });
        assert_eq!(tickets.read().await.get("T1").unwrap().state, TicketState::Paid);
    }
}
