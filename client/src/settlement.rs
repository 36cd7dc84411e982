// Lucky Draw Client - Settlement retry loop
//
// After a transaction confirms, read APIs lag behind it. The loop re-reads
// the pool until the expected change shows up or the attempt budget runs
// out. Running out is reported as a stale view, never as a failure.
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::composer::{Intent, Operation};
use crate::constants::{DEFAULT_RECONCILE_ATTEMPTS, DEFAULT_RECONCILE_INTERVAL_MS};
use crate::error::ClientError;
use crate::events::EventFilter;
use crate::projector::{PoolView, ViewCache};
use crate::reader::{fetch_pool, ChainReader};
use crate::submit::Submitter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between attempts
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RECONCILE_ATTEMPTS, DEFAULT_RECONCILE_INTERVAL_MS)
    }
}

/// Change a reconcile waits to observe
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Any successful read
    Latest,
    /// The pool account exists
    Visible,
    /// `owner` holds at least this many tickets
    TicketsHeld { owner: Pubkey, at_least: usize },
    /// `owner` holds more tickets than the first read shows. Used when the
    /// count before submission is unknown.
    TicketsRise { owner: Pubkey },
    /// The pool is no longer active
    Settled,
}

impl Expectation {
    pub fn is_met(&self, view: &PoolView) -> bool {
        match self {
            Expectation::Latest | Expectation::Visible => true,
            Expectation::TicketsHeld { owner, at_least } => view.tickets_of(owner) >= *at_least,
            // Needs a floor first, see `settle_floor`
            Expectation::TicketsRise { .. } => false,
            Expectation::Settled => view.status.is_terminal(),
        }
    }

    /// What should be visible once `intent` has executed, given the view
    /// the caller had before submitting.
    ///
    /// A join without a baseline cannot assume the payer held no tickets,
    /// so it waits for the count to rise between reads instead.
    pub fn after(intent: &Intent, baseline: Option<&PoolView>) -> Self {
        match &intent.operation {
            Operation::CreatePool { .. } => Expectation::Visible,
            Operation::JoinPool { payer, .. } => match baseline {
                Some(view) => Expectation::TicketsHeld {
                    owner: *payer,
                    at_least: view.tickets_of(payer) + 1,
                },
                None => Expectation::TicketsRise { owner: *payer },
            },
            Operation::ExecuteDraw { .. } => Expectation::Settled,
        }
    }

    /// Pin a rising expectation to the first view read. Other kinds are unchanged.
    fn settle_floor(&self, view: &PoolView) -> Option<Self> {
        match self {
            Expectation::TicketsRise { owner } => Some(Expectation::TicketsHeld {
                owner: *owner,
                at_least: view.tickets_of(owner) + 1,
            }),
            _ => None,
        }
    }
}

/// Result of a reconcile
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The expected change is visible
    Converged(PoolView),
    /// The attempt budget ran out first. Carries the latest view read, if any.
    Stale(Option<PoolView>),
}

impl Reconciled {
    pub fn view(&self) -> Option<&PoolView> {
        match self {
            Reconciled::Converged(view) => Some(view),
            Reconciled::Stale(view) => view.as_ref(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Reconciled::Stale(_))
    }
}

/// One read-project-offer cycle. Returns whether the cached view was replaced.
pub async fn refresh<R: ChainReader + ?Sized>(
    reader: &R,
    cache: &ViewCache,
) -> Result<bool, ClientError> {
    let seq = cache.begin_fetch();
    let snapshot = fetch_pool(reader, cache.pool_id()).await?;
    let events = reader.fetch_events(EventFilter::WinnerDrawn).await?;
    Ok(cache.accept_snapshot(seq, &snapshot, &events)?)
}

/// Re-read `cache`'s pool until `expect` holds, at most `policy.max_attempts` times.
pub async fn reconcile_into<R: ChainReader + ?Sized>(
    reader: &R,
    cache: &ViewCache,
    expect: &Expectation,
    policy: &RetryPolicy,
) -> Reconciled {
    let attempts = policy.max_attempts.max(1);
    let mut expect = expect.clone();

    for attempt in 1..=attempts {
        match refresh(reader, cache).await {
            Ok(_) => {
                if let Some(view) = cache.current() {
                    if let Some(pinned) = expect.settle_floor(&view) {
                        debug!(pool = %cache.pool_id(), attempt, ?pinned, "ticket floor taken");
                        expect = pinned;
                    } else if expect.is_met(&view) {
                        debug!(pool = %cache.pool_id(), attempt, "reconcile converged");
                        return Reconciled::Converged(view);
                    }
                }
                debug!(pool = %cache.pool_id(), attempt, ?expect, "change not visible yet");
            }
            Err(e) => {
                warn!(pool = %cache.pool_id(), attempt, error = %e, "reconcile read failed");
            }
        }

        if attempt < attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    info!(pool = %cache.pool_id(), attempts, "view still stale, check back later");
    Reconciled::Stale(cache.current())
}

/// Reconcile a pool without a shared cache
pub async fn reconcile<R: ChainReader + ?Sized>(
    reader: &R,
    pool_id: &Pubkey,
    expect: &Expectation,
    policy: &RetryPolicy,
) -> Reconciled {
    let cache = ViewCache::new(*pool_id);
    reconcile_into(reader, &cache, expect, policy).await
}

/// Terminal outcome of a submitted operation. Exactly one is reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Confirmed and visible in reads
    Confirmed { signature: Signature, view: PoolView },
    /// Confirmed, but reads have not caught up. Check back later.
    Pending {
        signature: Signature,
        view: Option<PoolView>,
    },
    /// Refused by the signer or the program. Not retried.
    Rejected { reason: String },
}

impl Outcome {
    pub fn view(&self) -> Option<&PoolView> {
        match self {
            Outcome::Confirmed { view, .. } => Some(view),
            Outcome::Pending { view, .. } => view.as_ref(),
            Outcome::Rejected { .. } => None,
        }
    }
}

/// Submit `intent` once, then reconcile the pool it touches.
///
/// `cache` should be the displayed view of the same pool so the settled
/// read is ordered against concurrent polls; a private cache is used otherwise.
pub async fn submit_and_settle<R, S>(
    reader: &R,
    submitter: &S,
    intent: &Intent,
    cache: Option<&ViewCache>,
    policy: &RetryPolicy,
) -> Outcome
where
    R: ChainReader + ?Sized,
    S: Submitter + ?Sized,
{
    let pool_id = *intent.pool();
    let private;
    let cache = match cache {
        Some(cache) if *cache.pool_id() == pool_id => cache,
        _ => {
            private = ViewCache::new(pool_id);
            &private
        }
    };

    // A join's expectation depends on the tickets already held, so an empty
    // cache is filled before submitting. Other operations don't need a baseline.
    let mut baseline = cache.current();
    if baseline.is_none() && matches!(intent.operation, Operation::JoinPool { .. }) {
        if let Err(e) = refresh(reader, cache).await {
            warn!(pool = %pool_id, error = %e, "baseline read failed");
        }
        baseline = cache.current();
    }
    let expect = Expectation::after(intent, baseline.as_ref());

    let signature = match submitter.submit(intent).await {
        Ok(signature) => signature,
        Err(ClientError::SubmissionRejected(reason)) => {
            warn!(pool = %pool_id, %reason, "operation rejected");
            return Outcome::Rejected { reason };
        }
        Err(e) => {
            warn!(pool = %pool_id, error = %e, "operation rejected");
            return Outcome::Rejected {
                reason: e.to_string(),
            };
        }
    };
    info!(pool = %pool_id, %signature, "operation confirmed, reconciling");

    match reconcile_into(reader, cache, &expect, policy).await {
        Reconciled::Converged(view) => Outcome::Confirmed { signature, view },
        Reconciled::Stale(view) => Outcome::Pending { signature, view },
    }
}
