// Lucky Draw Client - Pool discovery
//
// There is no on-chain index of pools. The registry is rebuilt by replaying
// `PoolCreated` events, newest first.
use solana_program::pubkey::Pubkey;
use std::collections::HashSet;

use crate::constants::UNTITLED_DRAW;
use crate::error::ReadError;
use crate::events::{ChainEvent, EventCursor, EventFilter, EventKind, PoolCreated};
use crate::reader::ChainReader;

/// Creation-time facts about a pool, as announced by its `PoolCreated` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolListing {
    pub pool_id: Pubkey,
    pub creator: Pubkey,
    pub description: String,
    pub ticket_price: u64,
    pub end_time: u64,
    pub created_at: EventCursor,
}

/// Build listings from event history, newest first, one per pool id.
pub fn listings_from_events(events: &[ChainEvent]) -> Vec<PoolListing> {
    let mut created: Vec<(EventCursor, &PoolCreated)> = events
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::PoolCreated(created) => Some((event.cursor, created)),
            _ => None,
        })
        .collect();
    created.sort_by(|a, b| b.0.cmp(&a.0));

    let mut seen = HashSet::new();
    created
        .into_iter()
        .filter(|(_, c)| seen.insert(c.pool_id))
        .map(|(cursor, c)| PoolListing {
            pool_id: c.pool_id,
            creator: c.creator,
            description: if c.description.trim().is_empty() {
                UNTITLED_DRAW.to_string()
            } else {
                c.description.clone()
            },
            ticket_price: c.ticket_price,
            end_time: c.end_time,
            created_at: cursor,
        })
        .collect()
}

/// Known pools, refreshed from event history
#[derive(Debug, Default)]
pub struct PoolRegistry {
    listings: Vec<PoolListing>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `PoolCreated` events. On failure the previous listing is kept.
    pub async fn refresh<R: ChainReader + ?Sized>(&mut self, reader: &R) -> Result<usize, ReadError> {
        let events = reader.fetch_events(EventFilter::PoolCreated).await?;
        self.listings = listings_from_events(&events);
        Ok(self.listings.len())
    }

    /// Newest first
    pub fn listings(&self) -> &[PoolListing] {
        &self.listings
    }

    pub fn get(&self, pool_id: &Pubkey) -> Option<&PoolListing> {
        self.listings.iter().find(|l| l.pool_id == *pool_id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
