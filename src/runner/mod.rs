//! Sequential task runner.
//!
//! Drives fetch → activate → forge → submit for each work item. The `ScoApi`
//! trait abstracts the three remote calls so the loop can be exercised
//! against a scripted fake; `ScoClient` is the real implementation.
//!
//! Per-item failures downgrade that item's outcome and the loop moves on.
//! Only an external interrupt stops the loop, and only between items.

pub mod sco_client;

pub use sco_client::ScoClient;

use crate::forge;
use crate::forge::record;
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Reply from the submit endpoint. `ret == 0` means accepted.
#[derive(Debug, Clone)]
pub struct SubmitReply {
    pub ret: i64,
    pub mess: Option<String>,
}

/// The three remote calls a work item needs.
///
/// Transport failures are absorbed inside each call (`None`, `false`, or a
/// synthetic error reply) — they must never abort the whole run.
#[async_trait]
pub trait ScoApi: Send + Sync {
    /// Current tracking text for a SCO, `None` when it has no record yet or
    /// the call failed.
    async fn fetch_info(&self, scoid: &str) -> Option<String>;
    /// Activate an uninitialized SCO. `false` when the platform refuses,
    /// meaning the SCO does not exist for this learner/course combination.
    async fn activate(&self, scoid: &str) -> bool;
    /// Submit a forged envelope with the end-of-session flag.
    async fn submit(&self, scoid: &str, payload: &str) -> SubmitReply;
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Activated if needed, forged, submitted, accepted.
    Completed,
    /// The fetched record already asserts full completion; nothing sent.
    AlreadyDone,
    /// Activation refused — the item does not exist for this course.
    NotActivatable,
    /// No tracking data even after activation.
    FetchFailed,
    /// The submit call was rejected, with the remote message.
    SubmitFailed(String),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::AlreadyDone => write!(f, "already done"),
            Outcome::NotActivatable => write!(f, "skipped (not activatable)"),
            Outcome::FetchFailed => write!(f, "no tracking data"),
            Outcome::SubmitFailed(msg) => write!(f, "submit failed: {msg}"),
        }
    }
}

/// Process one work item end to end.
pub async fn run_item(api: &dyn ScoApi, scoid: &str) -> Outcome {
    let mut info = api.fetch_info(scoid).await;

    if info.is_none() {
        tracing::debug!("{scoid}: no record, attempting activation");
        if !api.activate(scoid).await {
            return Outcome::NotActivatable;
        }
        info = api.fetch_info(scoid).await;
    }

    let Some(text) = info else {
        return Outcome::FetchFailed;
    };

    if let Ok(existing) = record::parse_record(&text) {
        if existing.is_complete() {
            return Outcome::AlreadyDone;
        }
    }

    let existing = if text.trim().is_empty() {
        None
    } else {
        Some(text.as_str())
    };
    let envelope = match forge::forge(existing) {
        Ok(envelope) => envelope,
        Err(e) => return Outcome::SubmitFailed(e.to_string()),
    };

    let reply = api.submit(scoid, envelope.as_str()).await;
    if reply.ret == 0 {
        Outcome::Completed
    } else {
        Outcome::SubmitFailed(reply.mess.unwrap_or_else(|| "unknown error".to_string()))
    }
}

/// Randomized delay between successive items.
///
/// Deliberate pacing, not a performance knob: bursts of back-to-back submits
/// are what the platform's rate-limiting notices.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(2),
        }
    }
}

impl Pacing {
    fn sample(&self) -> Duration {
        let (lo, hi) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        if hi <= lo {
            return self.min;
        }
        let ms = rand::thread_rng().gen_range(lo..=hi);
        Duration::from_millis(ms)
    }
}

/// Outcome counts for the final report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub completed: usize,
    pub already_done: usize,
    pub not_activatable: usize,
    pub fetch_failed: usize,
    pub submit_failed: usize,
    /// True when the loop stopped early on an external interrupt.
    pub interrupted: bool,
}

impl Tally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Completed => self.completed += 1,
            Outcome::AlreadyDone => self.already_done += 1,
            Outcome::NotActivatable => self.not_activatable += 1,
            Outcome::FetchFailed => self.fetch_failed += 1,
            Outcome::SubmitFailed(_) => self.submit_failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.completed
            + self.already_done
            + self.not_activatable
            + self.fetch_failed
            + self.submit_failed
    }
}

/// Run the whole queue sequentially.
///
/// `stop` is checked between items only; an in-flight item always finishes.
/// `on_outcome` is invoked once per processed item, in queue order.
pub async fn run_all<F>(
    api: &dyn ScoApi,
    items: &[String],
    pacing: Pacing,
    stop: &AtomicBool,
    mut on_outcome: F,
) -> Tally
where
    F: FnMut(&str, &Outcome),
{
    let mut tally = Tally::default();

    for (i, scoid) in items.iter().enumerate() {
        if stop.load(Ordering::Relaxed) {
            tally.interrupted = true;
            break;
        }

        let outcome = run_item(api, scoid).await;
        tracing::debug!("{scoid}: {outcome}");
        tally.record(&outcome);
        on_outcome(scoid, &outcome);

        if i + 1 < items.len() && !stop.load(Ordering::Relaxed) {
            tokio::time::sleep(pacing.sample()).await;
        }
    }

    tally
}
