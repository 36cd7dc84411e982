// Lucky Draw Client - Program events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::ReadError;

/// Event payload as logged by the draw program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum EventRecord {
    PoolCreated {
        pool_id: [u8; 32],
        creator: [u8; 32],
        description: String,
        ticket_price: u64,
        end_time: u64,
    },
    WinnerDrawn {
        pool_id: [u8; 32],
        winner: [u8; 32],
        result_id: [u8; 32],
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolCreated {
    pub pool_id: Pubkey,
    pub creator: Pubkey,
    pub description: String,
    pub ticket_price: u64,
    pub end_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinnerDrawn {
    pub pool_id: Pubkey,
    pub winner: Pubkey,
    /// Address of the `RewardResult` account
    pub result_id: Pubkey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    PoolCreated(PoolCreated),
    WinnerDrawn(WinnerDrawn),
}

impl EventKind {
    /// Decode a logged event payload
    pub fn decode(data: &[u8]) -> Result<Self, ReadError> {
        let record = EventRecord::try_from_slice(data)?;
        Ok(record.into())
    }

    /// Pool the event refers to
    pub fn pool_id(&self) -> &Pubkey {
        match self {
            EventKind::PoolCreated(e) => &e.pool_id,
            EventKind::WinnerDrawn(e) => &e.pool_id,
        }
    }
}

impl From<EventRecord> for EventKind {
    fn from(record: EventRecord) -> Self {
        match record {
            EventRecord::PoolCreated {
                pool_id,
                creator,
                description,
                ticket_price,
                end_time,
            } => EventKind::PoolCreated(PoolCreated {
                pool_id: Pubkey::new_from_array(pool_id),
                creator: Pubkey::new_from_array(creator),
                description,
                ticket_price,
                end_time,
            }),
            EventRecord::WinnerDrawn {
                pool_id,
                winner,
                result_id,
            } => EventKind::WinnerDrawn(WinnerDrawn {
                pool_id: Pubkey::new_from_array(pool_id),
                winner: Pubkey::new_from_array(winner),
                result_id: Pubkey::new_from_array(result_id),
            }),
        }
    }
}

/// Position of an event in chain history. Later events compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventCursor {
    pub slot: u64,
    /// Position within the slot
    pub index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEvent {
    pub cursor: EventCursor,
    pub kind: EventKind,
}

impl ChainEvent {
    pub fn new(slot: u64, index: u32, kind: EventKind) -> Self {
        Self {
            cursor: EventCursor { slot, index },
            kind,
        }
    }
}

/// Which events a reader should return
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    All,
    PoolCreated,
    WinnerDrawn,
}

impl EventFilter {
    pub fn matches(&self, kind: &EventKind) -> bool {
        matches!(
            (self, kind),
            (EventFilter::All, _)
                | (EventFilter::PoolCreated, EventKind::PoolCreated(_))
                | (EventFilter::WinnerDrawn, EventKind::WinnerDrawn(_))
        )
    }
}
