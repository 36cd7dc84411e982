// Lucky Draw Client - On-chain account layouts
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::constants::{STATUS_ACTIVE, STATUS_CLOSED, STATUS_DRAWN};
use crate::error::{ReadError, ValidationError};

/// Lifecycle status of a pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolStatus {
    /// Open for tickets
    Active,
    /// Ended without a winner
    Closed,
    /// Winner selected and paid
    Drawn,
}

impl PoolStatus {
    /// Position in the lifecycle. Transitions only ever increase it.
    pub fn rank(self) -> u8 {
        match self {
            PoolStatus::Active => 0,
            PoolStatus::Closed | PoolStatus::Drawn => 1,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != PoolStatus::Active
    }
}

impl TryFrom<u8> for PoolStatus {
    type Error = ReadError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            STATUS_ACTIVE => Ok(PoolStatus::Active),
            STATUS_CLOSED => Ok(PoolStatus::Closed),
            STATUS_DRAWN => Ok(PoolStatus::Drawn),
            other => Err(ReadError::UnknownStatus(other)),
        }
    }
}

impl From<PoolStatus> for u8 {
    fn from(status: PoolStatus) -> Self {
        match status {
            PoolStatus::Active => STATUS_ACTIVE,
            PoolStatus::Closed => STATUS_CLOSED,
            PoolStatus::Drawn => STATUS_DRAWN,
        }
    }
}

/// Pool account data as stored by the draw program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolAccount {
    /// Wallet that created the pool
    pub creator: [u8; 32],
    /// Human-readable title
    pub description: String,
    /// Price of one ticket in base units
    pub ticket_price: u64,
    /// Deadline in milliseconds since the epoch
    pub end_time: u64,
    /// Raw status code (1 active, 2 closed, 3 drawn)
    pub status: u8,
    /// One entry per ticket, in purchase order
    pub participants: Vec<[u8; 32]>,
    /// Pot accumulated from ticket sales
    pub reward_balance: u64,
    /// Winner, once the account field has been written
    pub winner: Option<[u8; 32]>,
}

impl PoolAccount {
    /// Decode account data. Trailing padding after the encoded fields is ignored.
    pub fn unpack(data: &[u8]) -> Result<Self, ReadError> {
        let mut buf = data;
        Ok(Self::deserialize(&mut buf)?)
    }

    pub fn status(&self) -> Result<PoolStatus, ReadError> {
        PoolStatus::try_from(self.status)
    }

    pub fn creator(&self) -> Pubkey {
        Pubkey::new_from_array(self.creator)
    }

    pub fn participants(&self) -> Vec<Pubkey> {
        self.participants
            .iter()
            .map(|p| Pubkey::new_from_array(*p))
            .collect()
    }

    pub fn winner(&self) -> Option<Pubkey> {
        self.winner.map(Pubkey::new_from_array)
    }
}

/// A point-in-time read of a pool account. May be stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Address of the pool account
    pub pool_id: Pubkey,
    /// Slot the read was served at, when the reader reports one
    pub slot: Option<u64>,
    pub account: PoolAccount,
}

impl PoolSnapshot {
    pub fn new(pool_id: Pubkey, slot: Option<u64>, account: PoolAccount) -> Self {
        Self {
            pool_id,
            slot,
            account,
        }
    }

    pub fn from_account_data(
        pool_id: Pubkey,
        slot: Option<u64>,
        data: &[u8],
    ) -> Result<Self, ReadError> {
        Ok(Self::new(pool_id, slot, PoolAccount::unpack(data)?))
    }
}

/// Result record written by `execute_draw`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardResult {
    pub is_initialized: bool,
    /// Pool this result settles
    pub pool: Pubkey,
    pub winner: Pubkey,
    /// Amount paid to the winner
    pub prize_amount: u64,
    /// Execution time in milliseconds since the epoch
    pub executed_at: u64,
}

impl Sealed for RewardResult {}

impl IsInitialized for RewardResult {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for RewardResult {
    const LEN: usize = 1 + 32 + 32 + 8 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RewardResult::LEN];
        let (is_initialized, pool, winner, prize_amount, executed_at) =
            array_refs![src, 1, 32, 32, 8, 8];

        Ok(RewardResult {
            is_initialized: is_initialized[0] != 0,
            pool: Pubkey::new_from_array(*pool),
            winner: Pubkey::new_from_array(*winner),
            prize_amount: u64::from_le_bytes(*prize_amount),
            executed_at: u64::from_le_bytes(*executed_at),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RewardResult::LEN];
        let (is_initialized_dst, pool_dst, winner_dst, prize_amount_dst, executed_at_dst) =
            mut_array_refs![dst, 1, 32, 32, 8, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        pool_dst.copy_from_slice(self.pool.as_ref());
        winner_dst.copy_from_slice(self.winner.as_ref());
        *prize_amount_dst = self.prize_amount.to_le_bytes();
        *executed_at_dst = self.executed_at.to_le_bytes();
    }
}

/// Pool durations offered when creating a draw, in minutes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationPreset {
    OneMinute = 1,
    FiveMinutes = 5,
    TenMinutes = 10,
    OneHour = 60,
    SixHours = 360,
    OneDay = 1440,
    TwoDays = 2880,
    OneWeek = 10080,
}

impl TryFrom<u64> for DurationPreset {
    type Error = ValidationError;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        match minutes {
            1 => Ok(DurationPreset::OneMinute),
            5 => Ok(DurationPreset::FiveMinutes),
            10 => Ok(DurationPreset::TenMinutes),
            60 => Ok(DurationPreset::OneHour),
            360 => Ok(DurationPreset::SixHours),
            1440 => Ok(DurationPreset::OneDay),
            2880 => Ok(DurationPreset::TwoDays),
            10080 => Ok(DurationPreset::OneWeek),
            _ => Err(ValidationError::UnknownDuration(minutes)),
        }
    }
}

impl DurationPreset {
    pub const ALL: [DurationPreset; 8] = [
        DurationPreset::OneMinute,
        DurationPreset::FiveMinutes,
        DurationPreset::TenMinutes,
        DurationPreset::OneHour,
        DurationPreset::SixHours,
        DurationPreset::OneDay,
        DurationPreset::TwoDays,
        DurationPreset::OneWeek,
    ];

    pub fn minutes(self) -> u64 {
        self as u64
    }

    pub fn as_millis(self) -> u64 {
        self.minutes() * 60 * 1000
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationPreset::OneMinute => "1 minute (test)",
            DurationPreset::FiveMinutes => "5 minutes",
            DurationPreset::TenMinutes => "10 minutes",
            DurationPreset::OneHour => "1 hour",
            DurationPreset::SixHours => "6 hours",
            DurationPreset::OneDay => "24 hours",
            DurationPreset::TwoDays => "48 hours",
            DurationPreset::OneWeek => "7 days",
        }
    }
}
