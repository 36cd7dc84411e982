// Lucky Draw Client - Automation agent
//
// Opens a daily draw on a schedule and sweeps for pools whose deadline has
// passed, triggering the draw on each. Failures on one pool never stop the
// sweep.
use chrono::{TimeZone, Utc};
use solana_program::pubkey::Pubkey;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::composer::Composer;
use crate::config::KeeperConfig;
use crate::constants::DAILY_DRAW_PREFIX;
use crate::eligibility::is_eligible_for_draw;
use crate::error::{ClientError, ReadError};
use crate::events::{ChainEvent, EventFilter};
use crate::projector::{project, PoolView};
use crate::reader::{fetch_pool, ChainReader};
use crate::registry::PoolRegistry;
use crate::settlement::{submit_and_settle, Outcome, RetryPolicy};
use crate::submit::Submitter;
use crate::utils::TimeSource;

/// Description of the daily draw opened at `now_ms`
pub fn daily_draw_description(now_ms: u64) -> String {
    let date = Utc
        .timestamp_millis_opt(now_ms as i64)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| now_ms.to_string());
    format!("{} #{}", DAILY_DRAW_PREFIX, date)
}

/// What one settlement sweep did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Pools known from event history
    pub scanned: usize,
    /// Pools the draw was attempted on
    pub attempted: Vec<Pubkey>,
    /// Draws confirmed and visible
    pub settled: Vec<Pubkey>,
    /// Draws confirmed but not yet visible in reads
    pub pending: Vec<Pubkey>,
    /// Draws refused by the program, with the reason
    pub rejected: Vec<(Pubkey, String)>,
    /// Pools that could not be read this round
    pub unreadable: Vec<(Pubkey, ClientError)>,
}

pub struct Keeper<R, S, T>
where
    R: ChainReader + ?Sized,
    S: Submitter + ?Sized,
    T: TimeSource,
{
    reader: Arc<R>,
    submitter: Arc<S>,
    composer: Composer<T>,
    config: KeeperConfig,
    policy: RetryPolicy,
}

impl<R, S, T> Keeper<R, S, T>
where
    R: ChainReader + ?Sized,
    S: Submitter + ?Sized,
    T: TimeSource,
{
    pub fn new(
        reader: Arc<R>,
        submitter: Arc<S>,
        composer: Composer<T>,
        config: KeeperConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            reader,
            submitter,
            composer,
            config,
            policy,
        }
    }

    /// Open the scheduled daily draw
    pub async fn create_daily_draw(&self) -> Result<Outcome, ClientError> {
        let description = daily_draw_description(self.composer.now_ms());
        let intent = self.composer.compose_create_pool(
            &description,
            self.config.ticket_price,
            self.config.duration_ms,
        )?;
        info!(pool = %intent.pool(), %description, "creating daily draw");

        let outcome =
            submit_and_settle(&*self.reader, &*self.submitter, &intent, None, &self.policy).await;
        Ok(outcome)
    }

    /// Trigger the draw on every known pool that is active and past its deadline
    pub async fn settle_ended_draws(&self) -> Result<SweepReport, ReadError> {
        let mut registry = PoolRegistry::new();
        registry.refresh(&*self.reader).await?;
        let winners = self.reader.fetch_events(EventFilter::WinnerDrawn).await?;

        let mut report = SweepReport {
            scanned: registry.len(),
            ..SweepReport::default()
        };

        for listing in registry.listings() {
            let pool_id = listing.pool_id;
            let view = match self.read_view(&pool_id, &winners).await {
                Ok(view) => view,
                Err(e) => {
                    warn!(pool = %pool_id, error = %e, "skipping unreadable pool");
                    report.unreadable.push((pool_id, e));
                    continue;
                }
            };

            let now = self.composer.now_ms();
            if !is_eligible_for_draw(&view, now) {
                continue;
            }

            info!(pool = %pool_id, tickets = view.ticket_count(), "pool ready, executing draw");
            report.attempted.push(pool_id);
            let intent = self.composer.compose_execute_draw(&pool_id, Some(&view));
            match submit_and_settle(&*self.reader, &*self.submitter, &intent, None, &self.policy)
                .await
            {
                Outcome::Confirmed { .. } => report.settled.push(pool_id),
                Outcome::Pending { .. } => report.pending.push(pool_id),
                Outcome::Rejected { reason } => {
                    warn!(pool = %pool_id, %reason, "draw rejected");
                    report.rejected.push((pool_id, reason));
                }
            }
        }

        info!(
            scanned = report.scanned,
            attempted = report.attempted.len(),
            settled = report.settled.len(),
            pending = report.pending.len(),
            rejected = report.rejected.len(),
            "settlement sweep finished"
        );
        Ok(report)
    }

    async fn read_view(
        &self,
        pool_id: &Pubkey,
        winners: &[ChainEvent],
    ) -> Result<PoolView, ClientError> {
        let snapshot = fetch_pool(&*self.reader, pool_id).await?;
        Ok(project(&snapshot, winners)?)
    }

    /// Run on the configured schedule until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut create = interval(self.config.create_interval);
        create.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep = interval(self.config.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(keeper = %self.composer.signer(), program = %self.composer.program_id(), "keeper started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = create.tick() => {
                    match self.create_daily_draw().await {
                        Ok(Outcome::Rejected { reason }) => warn!(%reason, "daily draw rejected"),
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "daily draw not composed"),
                    }
                }
                _ = sweep.tick() => {
                    if let Err(e) = self.settle_ended_draws().await {
                        warn!(error = %e, "settlement sweep could not list pools");
                    }
                }
            }
        }
        info!("keeper stopped");
    }
}
