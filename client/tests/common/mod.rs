// In-memory stand-in for the draw program and its read APIs
#![allow(dead_code)]

use async_trait::async_trait;
use luckydraw::{
    composer::{Composer, Intent},
    constants::{STATUS_ACTIVE, STATUS_CLOSED, STATUS_DRAWN},
    error::{ClientError, ReadError},
    events::{ChainEvent, EventFilter, EventKind, PoolCreated, WinnerDrawn},
    instruction::DrawInstruction,
    reader::ChainReader,
    state::{PoolAccount, PoolSnapshot, RewardResult},
    submit::Submitter,
    utils::TimeSource,
};
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::signature::Signature;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const START_MS: u64 = 1_767_225_600_000; // 2026-01-01T00:00:00Z

/// Wall clock the tests move by hand
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(now_ms: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(now_ms)))
    }

    pub fn set(&self, now_ms: u64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
struct Ledger {
    pools: BTreeMap<Pubkey, PoolAccount>,
    results: HashMap<Pubkey, RewardResult>,
    events: Vec<ChainEvent>,
}

struct Inner {
    /// State after each committed transaction; index 0 is genesis
    history: Vec<Ledger>,
    /// Reads a new commit stays invisible for
    lag: usize,
    lag_remaining: usize,
    fail_reads: usize,
    /// Pools whose account reads always fail
    unreadable: HashSet<Pubkey>,
    reads: usize,
    submissions: usize,
}

/// Executes draw program rules against an in-memory ledger
pub struct MemoryChain {
    pub program_id: Pubkey,
    clock: Arc<ManualClock>,
    inner: Mutex<Inner>,
}

impl MemoryChain {
    pub fn new(clock: Arc<ManualClock>) -> Arc<Self> {
        Arc::new(Self {
            program_id: Pubkey::new_unique(),
            clock,
            inner: Mutex::new(Inner {
                history: vec![Ledger::default()],
                lag: 0,
                lag_remaining: 0,
                fail_reads: 0,
                unreadable: HashSet::new(),
                reads: 0,
                submissions: 0,
            }),
        })
    }

    pub fn composer(&self, signer: Pubkey) -> Composer<Arc<ManualClock>> {
        Composer::new(self.program_id, signer, self.clock.clone())
    }

    /// Commits become visible only after this many pool reads
    pub fn set_lag(&self, lag: usize) {
        self.inner.lock().unwrap().lag = lag;
    }

    pub fn fail_next_reads(&self, count: usize) {
        self.inner.lock().unwrap().fail_reads = count;
    }

    pub fn make_unreadable(&self, pool_id: Pubkey) {
        self.inner.lock().unwrap().unreadable.insert(pool_id);
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    pub fn submissions(&self) -> usize {
        self.inner.lock().unwrap().submissions
    }

    /// Authoritative account, ignoring indexing lag
    pub fn pool(&self, pool_id: &Pubkey) -> Option<PoolAccount> {
        let inner = self.inner.lock().unwrap();
        inner.history.last().and_then(|l| l.pools.get(pool_id).cloned())
    }

    fn begin_read(&self, advance_lag: bool) -> Result<(u64, Ledger), ReadError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        if inner.fail_reads > 0 {
            inner.fail_reads -= 1;
            return Err(ReadError::Rpc("connection reset".to_string()));
        }
        let latest = inner.history.len() - 1;
        let idx = latest.saturating_sub(inner.lag_remaining);
        if advance_lag {
            inner.lag_remaining = inner.lag_remaining.saturating_sub(1);
        }
        Ok((idx as u64, inner.history[idx].clone()))
    }

    fn apply(&self, ledger: &mut Ledger, slot: u64, ix: &Instruction) -> Result<(), String> {
        let now = self.clock.now_ms();
        let instruction = DrawInstruction::unpack(&ix.data).map_err(|e| e.to_string())?;
        let index = ledger.events.len() as u32;

        match instruction {
            DrawInstruction::CreatePool {
                description,
                ticket_price,
                end_time_ms,
            } => {
                let creator = ix.accounts[0].pubkey;
                let pool_id = ix.accounts[1].pubkey;
                if ledger.pools.contains_key(&pool_id) {
                    return Err("EPoolExists".to_string());
                }
                if end_time_ms <= now {
                    return Err("EInvalidEndTime".to_string());
                }
                ledger.pools.insert(
                    pool_id,
                    PoolAccount {
                        creator: creator.to_bytes(),
                        description: description.clone(),
                        ticket_price,
                        end_time: end_time_ms,
                        status: STATUS_ACTIVE,
                        participants: vec![],
                        reward_balance: 0,
                        winner: None,
                    },
                );
                ledger.events.push(ChainEvent::new(
                    slot,
                    index,
                    EventKind::PoolCreated(PoolCreated {
                        pool_id,
                        creator,
                        description,
                        ticket_price,
                        end_time: end_time_ms,
                    }),
                ));
            }
            DrawInstruction::JoinPool { payment } => {
                let payer = ix.accounts[0].pubkey;
                let pool_id = ix.accounts[1].pubkey;
                let pool = ledger
                    .pools
                    .get_mut(&pool_id)
                    .ok_or_else(|| "EPoolNotFound".to_string())?;
                if pool.status != STATUS_ACTIVE || now >= pool.end_time {
                    return Err("EPoolEnded".to_string());
                }
                if payment != pool.ticket_price {
                    return Err("EIncorrectPayment".to_string());
                }
                pool.participants.push(payer.to_bytes());
                pool.reward_balance += payment;
            }
            DrawInstruction::ExecuteDraw => {
                let pool_id = ix.accounts[1].pubkey;
                let result_id = ix.accounts[2].pubkey;
                let pool = ledger
                    .pools
                    .get_mut(&pool_id)
                    .ok_or_else(|| "EPoolNotFound".to_string())?;
                if pool.status != STATUS_ACTIVE {
                    return Err("EAlreadyDrawn".to_string());
                }
                if now < pool.end_time {
                    return Err("EDrawTooEarly".to_string());
                }
                if pool.participants.is_empty() {
                    pool.status = STATUS_CLOSED;
                    return Ok(());
                }
                let winner = pool.participants[(now as usize) % pool.participants.len()];
                let incentive = pool.reward_balance / 100;
                let prize = pool.reward_balance - incentive;
                pool.status = STATUS_DRAWN;
                pool.winner = Some(winner);
                let winner = Pubkey::new_from_array(winner);
                ledger.results.insert(
                    result_id,
                    RewardResult {
                        is_initialized: true,
                        pool: pool_id,
                        winner,
                        prize_amount: prize,
                        executed_at: now,
                    },
                );
                ledger.events.push(ChainEvent::new(
                    slot,
                    index,
                    EventKind::WinnerDrawn(WinnerDrawn {
                        pool_id,
                        winner,
                        result_id,
                    }),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MemoryChain {
    async fn fetch_pool_snapshot(
        &self,
        pool_id: &Pubkey,
    ) -> Result<Option<PoolSnapshot>, ReadError> {
        if self.inner.lock().unwrap().unreadable.contains(pool_id) {
            return Err(ReadError::Timeout(30_000));
        }
        let (slot, ledger) = self.begin_read(true)?;
        Ok(ledger
            .pools
            .get(pool_id)
            .map(|account| PoolSnapshot::new(*pool_id, Some(slot), account.clone())))
    }

    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<ChainEvent>, ReadError> {
        let (_, ledger) = self.begin_read(false)?;
        Ok(ledger
            .events
            .into_iter()
            .filter(|e| filter.matches(&e.kind))
            .collect())
    }

    async fn fetch_reward_result(
        &self,
        result_id: &Pubkey,
    ) -> Result<Option<RewardResult>, ReadError> {
        let (_, ledger) = self.begin_read(false)?;
        Ok(ledger.results.get(result_id).copied())
    }
}

#[async_trait]
impl Submitter for MemoryChain {
    async fn submit(&self, intent: &Intent) -> Result<Signature, ClientError> {
        let mut next = {
            let mut inner = self.inner.lock().unwrap();
            inner.submissions += 1;
            inner.history.last().cloned().unwrap_or_default()
        };
        let slot = self.inner.lock().unwrap().history.len() as u64;
        for ix in &intent.instructions {
            self.apply(&mut next, slot, ix)
                .map_err(ClientError::SubmissionRejected)?;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.history.push(next);
        inner.lag_remaining = inner.lag;
        Ok(Signature::new_unique())
    }
}

/// Submitter that refuses draws on one pool and forwards everything else
pub struct RejectDrawOn {
    pub chain: Arc<MemoryChain>,
    pub pool: Pubkey,
}

#[async_trait]
impl Submitter for RejectDrawOn {
    async fn submit(&self, intent: &Intent) -> Result<Signature, ClientError> {
        if *intent.pool() == self.pool {
            return Err(ClientError::SubmissionRejected(
                "insufficient gas".to_string(),
            ));
        }
        self.chain.submit(intent).await
    }
}

/// Build a snapshot by hand
pub fn snapshot(
    pool_id: Pubkey,
    slot: Option<u64>,
    status: u8,
    participants: &[Pubkey],
    winner: Option<Pubkey>,
) -> PoolSnapshot {
    PoolSnapshot::new(
        pool_id,
        slot,
        PoolAccount {
            creator: Pubkey::new_unique().to_bytes(),
            description: "Lantern Festival Draw".to_string(),
            ticket_price: 100_000_000,
            end_time: START_MS + 60_000,
            status,
            participants: participants.iter().map(|p| p.to_bytes()).collect(),
            reward_balance: 100_000_000 * participants.len() as u64,
            winner: winner.map(|w| w.to_bytes()),
        },
    )
}

pub fn winner_event(slot: u64, index: u32, pool_id: Pubkey, winner: Pubkey) -> ChainEvent {
    ChainEvent::new(
        slot,
        index,
        EventKind::WinnerDrawn(WinnerDrawn {
            pool_id,
            winner,
            result_id: Pubkey::new_unique(),
        }),
    )
}
