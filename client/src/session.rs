// Lucky Draw Client - Session and pool subscriptions
//
// A session holds the connected wallet, the pool list poller and every
// polling subscription. Each of them owns its timers; dropping it cancels them.
use solana_program::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::composer::{Composer, Intent};
use crate::config::ClientConfig;
use crate::eligibility::{phase, time_remaining, Phase};
use crate::error::{ClientError, ReadError};
use crate::projector::{PoolView, ViewCache};
use crate::reader::ChainReader;
use crate::registry::{PoolListing, PoolRegistry};
use crate::settlement::{refresh, submit_and_settle, Outcome};
use crate::submit::Submitter;
use crate::utils::TimeSource;

/// Health of the last poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    /// No read has completed yet
    Loading,
    Live,
    /// The pool account does not exist
    NotFound,
    /// The last read failed; the view shown is from an earlier read
    ReadFailed(ReadError),
}

/// What a pool subscription publishes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolFeed {
    pub view: Option<PoolView>,
    pub status: FeedStatus,
    /// Time until the deadline, refreshed every countdown tick
    pub remaining: Duration,
    pub phase: Option<Phase>,
}

impl PoolFeed {
    fn loading() -> Self {
        Self {
            view: None,
            status: FeedStatus::Loading,
            remaining: Duration::ZERO,
            phase: None,
        }
    }

    /// Recompute time-derived fields. Returns whether anything changed.
    fn retime(&mut self, now_ms: u64) -> bool {
        let (remaining, next_phase) = match &self.view {
            Some(view) => (time_remaining(view, now_ms), Some(phase(view, now_ms))),
            None => (Duration::ZERO, None),
        };
        let changed = remaining != self.remaining || next_phase != self.phase;
        self.remaining = remaining;
        self.phase = next_phase;
        changed
    }
}

/// Live view of one pool. Polling and countdown tasks stop when this is dropped.
pub struct PoolSubscription {
    pool_id: Pubkey,
    cache: Arc<ViewCache>,
    sender: Arc<watch::Sender<PoolFeed>>,
    tasks: Vec<JoinHandle<()>>,
}

impl PoolSubscription {
    /// Start polling `pool_id`. Must be called inside a tokio runtime.
    pub fn spawn<R, T>(
        pool_id: Pubkey,
        reader: Arc<R>,
        time: Arc<T>,
        poll_interval: Duration,
        countdown_tick: Duration,
    ) -> Self
    where
        R: ChainReader + ?Sized + 'static,
        T: TimeSource + ?Sized + 'static,
    {
        let cache = Arc::new(ViewCache::new(pool_id));
        let (sender, _) = watch::channel(PoolFeed::loading());
        let sender = Arc::new(sender);

        let poller = {
            let cache = cache.clone();
            let sender = sender.clone();
            let time = time.clone();
            tokio::spawn(async move {
                let mut ticker = interval(poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let status = match refresh(&*reader, &cache).await {
                        Ok(_) => FeedStatus::Live,
                        Err(ClientError::NotFound(_)) => FeedStatus::NotFound,
                        Err(ClientError::Read(e)) => {
                            warn!(pool = %pool_id, error = %e, "pool poll failed");
                            FeedStatus::ReadFailed(e)
                        }
                        Err(e) => {
                            warn!(pool = %pool_id, error = %e, "unexpected poll error");
                            continue;
                        }
                    };
                    let view = cache.current();
                    let now = time.now_ms();
                    sender.send_modify(|feed| {
                        feed.status = status;
                        feed.view = view;
                        feed.retime(now);
                    });
                }
            })
        };

        let countdown = {
            let sender = sender.clone();
            tokio::spawn(async move {
                let mut ticker = interval(countdown_tick);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let now = time.now_ms();
                    sender.send_if_modified(|feed| feed.retime(now));
                }
            })
        };

        debug!(pool = %pool_id, "subscription started");
        Self {
            pool_id,
            cache,
            sender,
            tasks: vec![poller, countdown],
        }
    }

    pub fn pool_id(&self) -> &Pubkey {
        &self.pool_id
    }

    /// Cache shared with the poller. Pass it to settlement so reads stay ordered.
    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub fn feed(&self) -> watch::Receiver<PoolFeed> {
        self.sender.subscribe()
    }

    /// Latest published feed
    pub fn latest(&self) -> PoolFeed {
        self.sender.borrow().clone()
    }

    /// Publish whatever the cache holds now, e.g. after a reconcile
    pub fn publish_cached(&self, now_ms: u64) {
        let view = self.cache.current();
        if view.is_none() {
            return;
        }
        self.sender.send_modify(|feed| {
            feed.view = view;
            feed.status = FeedStatus::Live;
            feed.retime(now_ms);
        });
    }
}

impl Drop for PoolSubscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        debug!(pool = %self.pool_id, "subscription stopped");
    }
}

/// Periodic rebuild of the pool list. The task stops when this is dropped.
struct RegistryPoller {
    task: JoinHandle<()>,
}

impl RegistryPoller {
    fn spawn<R>(reader: Arc<R>, sender: Arc<watch::Sender<Vec<PoolListing>>>, every: Duration) -> Self
    where
        R: ChainReader + ?Sized + 'static,
    {
        let task = tokio::spawn(async move {
            let mut registry = PoolRegistry::new();
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match registry.refresh(&*reader).await {
                    Ok(count) => {
                        let listings = registry.listings();
                        let changed = sender.send_if_modified(|current| {
                            if current.as_slice() == listings {
                                return false;
                            }
                            *current = listings.to_vec();
                            true
                        });
                        if changed {
                            debug!(count, "pool list updated");
                        }
                    }
                    // Keep the last list on screen
                    Err(e) => warn!(error = %e, "pool list refresh failed"),
                }
            }
        });
        debug!(every_ms = every.as_millis() as u64, "registry poller started");
        Self { task }
    }
}

impl Drop for RegistryPoller {
    fn drop(&mut self) {
        self.task.abort();
        debug!("registry poller stopped");
    }
}

/// Connected wallet and everything being watched on its behalf
pub struct Session<R, T>
where
    R: ChainReader + ?Sized + 'static,
    T: TimeSource + ?Sized + 'static,
{
    reader: Arc<R>,
    time: Arc<T>,
    config: ClientConfig,
    wallet: Option<Pubkey>,
    pools: Arc<watch::Sender<Vec<PoolListing>>>,
    registry_poller: Option<RegistryPoller>,
    subscriptions: HashMap<Pubkey, PoolSubscription>,
}

impl<R, T> Session<R, T>
where
    R: ChainReader + ?Sized + 'static,
    T: TimeSource + ?Sized + 'static,
{
    pub fn new(reader: Arc<R>, time: Arc<T>, config: ClientConfig) -> Self {
        Self {
            reader,
            time,
            config,
            wallet: None,
            pools: Arc::new(watch::channel(Vec::new()).0),
            registry_poller: None,
            subscriptions: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect a wallet and start keeping the pool list fresh.
    /// Must be called inside a tokio runtime.
    pub fn connect(&mut self, wallet: Pubkey) {
        if self.wallet.replace(wallet).is_some() {
            self.subscriptions.clear();
        }
        if self.registry_poller.is_none() {
            self.registry_poller = Some(RegistryPoller::spawn(
                self.reader.clone(),
                self.pools.clone(),
                self.config.registry_interval,
            ));
        }
        info!(%wallet, "wallet connected");
    }

    /// Forget the wallet and stop every subscription and the pool list poller
    pub fn disconnect(&mut self) {
        let dropped = self.subscriptions.len();
        self.subscriptions.clear();
        self.registry_poller = None;
        if let Some(wallet) = self.wallet.take() {
            info!(%wallet, dropped, "wallet disconnected");
        }
    }

    pub fn wallet(&self) -> Option<&Pubkey> {
        self.wallet.as_ref()
    }

    /// Composer signing as the connected wallet
    pub fn composer(&self) -> Option<Composer<Arc<T>>> {
        self.wallet
            .map(|wallet| Composer::new(self.config.program_id, wallet, self.time.clone()))
    }

    /// Start watching a pool, or join the existing subscription
    pub fn watch(&mut self, pool_id: Pubkey) -> watch::Receiver<PoolFeed> {
        let reader = &self.reader;
        let time = &self.time;
        let config = &self.config;
        self.subscriptions
            .entry(pool_id)
            .or_insert_with(|| {
                PoolSubscription::spawn(
                    pool_id,
                    reader.clone(),
                    time.clone(),
                    config.poll_interval,
                    config.countdown_tick,
                )
            })
            .feed()
    }

    /// Stop watching a pool. Returns whether it was watched.
    pub fn unwatch(&mut self, pool_id: &Pubkey) -> bool {
        self.subscriptions.remove(pool_id).is_some()
    }

    pub fn watched(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscription(&self, pool_id: &Pubkey) -> Option<&PoolSubscription> {
        self.subscriptions.get(pool_id)
    }

    /// Rebuild the pool list from event history now, without waiting for the poller
    pub async fn refresh_pools(&self) -> Result<Vec<PoolListing>, ReadError> {
        let mut registry = PoolRegistry::new();
        registry.refresh(&*self.reader).await?;
        let listings = registry.listings().to_vec();
        self.pools.send_replace(listings.clone());
        Ok(listings)
    }

    /// Last published pool list, newest first
    pub fn pools(&self) -> Vec<PoolListing> {
        self.pools.borrow().clone()
    }

    pub fn pools_feed(&self) -> watch::Receiver<Vec<PoolListing>> {
        self.pools.subscribe()
    }

    /// Whether the pool list is being refreshed in the background
    pub fn is_polling_pools(&self) -> bool {
        self.registry_poller.is_some()
    }

    /// Tickets the connected wallet holds in `view`
    pub fn my_tickets(&self, view: &PoolView) -> usize {
        self.wallet.map(|w| view.tickets_of(&w)).unwrap_or(0)
    }

    /// Submit an intent and settle it against the watched view, if any
    pub async fn submit<S: Submitter + ?Sized>(&self, submitter: &S, intent: &Intent) -> Outcome {
        let subscription = self.subscriptions.get(intent.pool());
        let outcome = submit_and_settle(
            &*self.reader,
            submitter,
            intent,
            subscription.map(|s| s.cache()),
            &self.config.reconcile,
        )
        .await;
        if let Some(subscription) = subscription {
            subscription.publish_cached(self.time.now_ms());
        }
        outcome
    }
}
