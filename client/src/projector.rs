// Lucky Draw Client - Pool state projection
use solana_program::pubkey::Pubkey;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::error::ReadError;
use crate::events::{ChainEvent, EventCursor, EventKind};
use crate::state::{PoolSnapshot, PoolStatus, RewardResult};

/// Canonical client-side view of a pool, derived from a snapshot and event history.
///
/// A view is a disposable cache of chain state. It is only ever replaced by a
/// freshly projected value, never patched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolView {
    pub id: Pubkey,
    pub creator: Pubkey,
    pub description: String,
    pub ticket_price: u64,
    /// Deadline in milliseconds since the epoch
    pub end_time: u64,
    pub status: PoolStatus,
    /// One entry per ticket, in purchase order
    pub participants: Vec<Pubkey>,
    pub reward_balance: u64,
    /// `None` while not drawn, or drawn but not yet indexed
    pub winner: Option<Pubkey>,
    /// Reward result account, known once the `WinnerDrawn` event is seen
    pub result_id: Option<Pubkey>,
}

impl PoolView {
    pub fn ticket_count(&self) -> usize {
        self.participants.len()
    }

    /// Number of tickets held by `owner`
    pub fn tickets_of(&self, owner: &Pubkey) -> usize {
        self.participants.iter().filter(|p| *p == owner).count()
    }

    pub fn is_drawn(&self) -> bool {
        self.status == PoolStatus::Drawn
    }

    /// Drawn, but the winner has not shown up in any read yet
    pub fn winner_pending(&self) -> bool {
        self.is_drawn() && self.winner.is_none()
    }
}

/// Derive a `PoolView` from a snapshot and the program's event history.
///
/// The winner comes from the most recent `WinnerDrawn` event for this pool,
/// falling back to the account field. A matching event also marks the pool
/// drawn, since the event can be visible before the account is re-indexed.
pub fn project(snapshot: &PoolSnapshot, events: &[ChainEvent]) -> Result<PoolView, ReadError> {
    let account = &snapshot.account;
    let mut status = account.status()?;

    let drawn = latest_winner_event(&snapshot.pool_id, events);

    let (winner, result_id) = match drawn {
        Some((_, winner, result_id)) => {
            status = PoolStatus::Drawn;
            (Some(winner), Some(result_id))
        }
        None if status == PoolStatus::Drawn => (account.winner(), None),
        None => (None, None),
    };

    Ok(PoolView {
        id: snapshot.pool_id,
        creator: account.creator(),
        description: account.description.clone(),
        ticket_price: account.ticket_price,
        end_time: account.end_time,
        status,
        participants: account.participants(),
        reward_balance: account.reward_balance,
        winner,
        result_id,
    })
}

fn latest_winner_event(
    pool_id: &Pubkey,
    events: &[ChainEvent],
) -> Option<(EventCursor, Pubkey, Pubkey)> {
    events
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::WinnerDrawn(drawn) if drawn.pool_id == *pool_id => {
                Some((event.cursor, drawn.winner, drawn.result_id))
            }
            _ => None,
        })
        .max_by_key(|(cursor, _, _)| *cursor)
}

/// Settled outcome of a pool's draw
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawResult {
    pub pool_id: Pubkey,
    pub winner: Pubkey,
    pub prize_amount: u64,
    /// Milliseconds since the epoch
    pub executed_at: u64,
}

impl DrawResult {
    /// Combine a drawn view with its reward result account.
    /// Returns `None` if the record does not belong to this pool.
    pub fn from_parts(view: &PoolView, reward: &RewardResult) -> Option<Self> {
        if !view.is_drawn() || reward.pool != view.id {
            return None;
        }
        Some(Self {
            pool_id: view.id,
            winner: view.winner.unwrap_or(reward.winner),
            prize_amount: reward.prize_amount,
            executed_at: reward.executed_at,
        })
    }
}

/// Ordering key for reads of one pool: the slot the reader reports, if any,
/// and the local fetch sequence assigned when the read was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Freshness {
    pub slot: Option<u64>,
    pub seq: u64,
}

impl Freshness {
    /// Slots decide only when both reads carry one and they differ.
    /// Otherwise the later-issued read wins.
    pub fn is_newer_than(&self, other: &Freshness) -> bool {
        match (self.slot, other.slot) {
            (Some(slot), Some(other_slot)) if slot != other_slot => slot > other_slot,
            _ => self.seq > other.seq,
        }
    }
}

#[derive(Default)]
struct CacheState {
    next_seq: u64,
    accepted: Option<(Freshness, PoolView)>,
}

/// Latest accepted view of one pool.
///
/// Reads may complete out of order; a read older than the accepted one is
/// discarded so the displayed status never moves backwards.
pub struct ViewCache {
    pool_id: Pubkey,
    state: Mutex<CacheState>,
}

impl ViewCache {
    pub fn new(pool_id: Pubkey) -> Self {
        Self {
            pool_id,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn pool_id(&self) -> &Pubkey {
        &self.pool_id
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a sequence number. Call before issuing the read.
    pub fn begin_fetch(&self) -> u64 {
        let mut state = self.lock();
        state.next_seq += 1;
        state.next_seq
    }

    /// Offer a projected view. Returns whether it replaced the current one.
    pub fn offer(&self, freshness: Freshness, view: PoolView) -> bool {
        let mut state = self.lock();
        if let Some((accepted, current)) = &state.accepted {
            if !freshness.is_newer_than(accepted) {
                debug!(pool = %self.pool_id, ?freshness, ?accepted, "discarding out-of-order read");
                return false;
            }
            if view.status.rank() < current.status.rank() {
                warn!(
                    pool = %self.pool_id,
                    from = ?current.status,
                    to = ?view.status,
                    "discarding read that would regress pool status"
                );
                return false;
            }
        }
        state.accepted = Some((freshness, view));
        true
    }

    /// Project `snapshot` and offer it under fetch sequence `seq`
    pub fn accept_snapshot(
        &self,
        seq: u64,
        snapshot: &PoolSnapshot,
        events: &[ChainEvent],
    ) -> Result<bool, ReadError> {
        let view = project(snapshot, events)?;
        let freshness = Freshness {
            slot: snapshot.slot,
            seq,
        };
        Ok(self.offer(freshness, view))
    }

    pub fn current(&self) -> Option<PoolView> {
        self.lock().accepted.as_ref().map(|(_, view)| view.clone())
    }

    /// Drop the cached view. It is rebuilt by the next read.
    pub fn clear(&self) {
        self.lock().accepted = None;
    }
}
