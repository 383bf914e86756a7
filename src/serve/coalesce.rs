//! Coalescing bursts of change notifications into single rebuilds.
//!
//! Editors emit several filesystem events per save. [`Coalescer`] is the explicit
//! `Idle -> Warming -> Running -> Cooldown -> Idle` state machine that turns each burst into one
//! rebuild, and [`run_coalesced`] drives it from a channel of triggers using tokio's clock, so
//! tests can run it under a paused runtime.

use std::{future::Future, time::Duration};
use tokio::{sync::mpsc::UnboundedReceiver, time::Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalesceTiming {
    /// Quiet period after the latest trigger before a rebuild starts.
    pub warmup: Duration,
    /// Grace period after a rebuild during which triggers are only counted.
    pub cooldown: Duration,
}

impl Default for CoalesceTiming {
    fn default() -> Self {
        CoalesceTiming {
            warmup: Duration::from_millis(100),
            cooldown: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerState {
    Idle,
    Warming { deadline: Instant },
    Running,
    Cooldown { until: Instant },
}

#[derive(Debug, Clone)]
pub struct Coalescer {
    timing: CoalesceTiming,
    state: CoalescerState,
    buffered: usize,
}

impl Coalescer {
    pub fn new(timing: CoalesceTiming) -> Self {
        Coalescer {
            timing,
            state: CoalescerState::Idle,
            buffered: 0,
        }
    }

    pub fn state(&self) -> CoalescerState {
        self.state
    }

    /// Triggers seen since the machine last left `Idle`.
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn trigger(&mut self, now: Instant) {
        match self.state {
            CoalescerState::Idle => {
                self.buffered = 1;
                self.state = CoalescerState::Warming {
                    deadline: now + self.timing.warmup,
                };
            }
            CoalescerState::Warming { deadline } => {
                self.buffered += 1;
                if now < deadline {
                    self.state = CoalescerState::Warming {
                        deadline: now + self.timing.warmup,
                    };
                }
            }
            CoalescerState::Running | CoalescerState::Cooldown { .. } => {
                self.buffered += 1;
            }
        }
    }

    /// When [`on_deadline`](Coalescer::on_deadline) should next be called, if at all.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            CoalescerState::Warming { deadline } => Some(deadline),
            CoalescerState::Cooldown { until } => Some(until),
            CoalescerState::Idle | CoalescerState::Running => None,
        }
    }

    /// Advance a due timer. Returns the buffered count when a rebuild should start now; the
    /// caller must report its completion with [`finish`](Coalescer::finish).
    pub fn on_deadline(&mut self, now: Instant) -> Option<usize> {
        match self.state {
            CoalescerState::Warming { deadline } if now >= deadline => {
                self.state = CoalescerState::Running;
                Some(self.buffered)
            }
            CoalescerState::Cooldown { until } if now >= until => {
                if self.buffered > 0 {
                    tracing::trace!(
                        "Dropping {} triggers buffered since the last rebuild",
                        self.buffered
                    );
                }
                self.state = CoalescerState::Idle;
                self.buffered = 0;
                None
            }
            _ => None,
        }
    }

    /// The rebuild started by [`on_deadline`](Coalescer::on_deadline) has completed.
    pub fn finish(&mut self, now: Instant) {
        if self.state == CoalescerState::Running {
            self.state = CoalescerState::Cooldown {
                until: now + self.timing.cooldown,
            };
        }
    }
}

/// Run `rebuild` once per burst of triggers received on `triggers`, until the channel closes.
///
/// `rebuild` receives the number of triggers in the burst. It is awaited in place, so two
/// rebuilds never overlap.
pub async fn run_coalesced<F, Fut>(
    mut triggers: UnboundedReceiver<()>,
    timing: CoalesceTiming,
    mut rebuild: F,
) where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut coalescer = Coalescer::new(timing);
    loop {
        let deadline = coalescer.next_deadline();
        tokio::select! {
            received = triggers.recv() => match received {
                Some(()) => coalescer.trigger(Instant::now()),
                None => break,
            },
            _ = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Some(count) = coalescer.on_deadline(Instant::now()) {
                    tracing::debug!("Rebuilding after {count} change notifications");
                    rebuild(count).await;
                    coalescer.finish(Instant::now());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::unbounded_channel;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test_log::test]
    fn test_state_machine_cycle() {
        let t0 = Instant::now();
        let mut c = Coalescer::new(CoalesceTiming::default());
        assert_eq!(c.next_deadline(), None);

        c.trigger(t0);
        assert_eq!(c.state(), CoalescerState::Warming { deadline: t0 + ms(100) });
        c.trigger(t0 + ms(50));
        assert_eq!(c.next_deadline(), Some(t0 + ms(150)));
        assert_eq!(c.on_deadline(t0 + ms(100)), None);

        assert_eq!(c.on_deadline(t0 + ms(150)), Some(2));
        assert_eq!(c.state(), CoalescerState::Running);
        c.trigger(t0 + ms(160));
        assert_eq!(c.next_deadline(), None);

        c.finish(t0 + ms(200));
        assert_eq!(c.state(), CoalescerState::Cooldown { until: t0 + ms(700) });
        c.trigger(t0 + ms(300));
        assert_eq!(c.buffered(), 4);
        assert_eq!(c.on_deadline(t0 + ms(700)), None);
        assert_eq!(c.state(), CoalescerState::Idle);
        assert_eq!(c.buffered(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_rebuild() {
        let (tx, rx) = unbounded_channel();
        let runs = Arc::new(Mutex::new(Vec::new()));
        let recorded = runs.clone();
        let start = Instant::now();
        let driver = tokio::spawn(run_coalesced(rx, CoalesceTiming::default(), move |count| {
            recorded.lock().unwrap().push((count, Instant::now()));
            async {}
        }));

        for _ in 0..3 {
            tx.send(()).unwrap();
            tokio::time::sleep(ms(10)).await;
        }
        let last_trigger = start + ms(20);
        tokio::time::sleep(ms(1000)).await;
        drop(tx);
        driver.await.unwrap();

        let runs = runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        let (count, at) = runs[0];
        assert_eq!(count, 3);
        assert!(at >= last_trigger + ms(100));
        assert!(at < last_trigger + ms(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_during_cooldown_are_not_replayed() {
        let (tx, rx) = unbounded_channel();
        let runs = Arc::new(Mutex::new(Vec::new()));
        let recorded = runs.clone();
        let driver = tokio::spawn(run_coalesced(rx, CoalesceTiming::default(), move |count| {
            recorded.lock().unwrap().push(count);
            async {}
        }));

        tx.send(()).unwrap();
        tokio::time::sleep(ms(200)).await;
        // Cooldown lasts until roughly 600ms.
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(*runs.lock().unwrap(), vec![1]);

        // A fresh event after cooldown starts a new cycle.
        tx.send(()).unwrap();
        tokio::time::sleep(ms(200)).await;
        drop(tx);
        driver.await.unwrap();
        assert_eq!(*runs.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuilds_never_overlap() {
        let (tx, rx) = unbounded_channel();
        let active = Arc::new(Mutex::new((0usize, 0usize)));
        let tracked = active.clone();
        let timing = CoalesceTiming {
            warmup: ms(10),
            cooldown: ms(10),
        };
        let driver = tokio::spawn(run_coalesced(rx, timing, move |_| {
            let tracked = tracked.clone();
            async move {
                {
                    let mut guard = tracked.lock().unwrap();
                    guard.0 += 1;
                    guard.1 = guard.1.max(guard.0);
                }
                tokio::time::sleep(ms(100)).await;
                tracked.lock().unwrap().0 -= 1;
            }
        }));

        for _ in 0..20 {
            tx.send(()).unwrap();
            tokio::time::sleep(ms(15)).await;
        }
        tokio::time::sleep(ms(500)).await;
        drop(tx);
        driver.await.unwrap();
        assert_eq!(active.lock().unwrap().1, 1);
    }
}
