// Lucky Draw Client - Transaction composition
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::transaction::Transaction;
use std::time::Duration;

use crate::constants::MAX_DESCRIPTION_LEN;
use crate::eligibility::{is_eligible_for_draw, time_remaining};
use crate::error::ValidationError;
use crate::instruction::{self, find_pool_address, find_result_address};
use crate::projector::PoolView;
use crate::utils::TimeSource;

/// Funds a wallet has available for ticket payments
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Funds {
    pub owner: Pubkey,
    pub available: u64,
}

impl Funds {
    pub fn new(owner: Pubkey, available: u64) -> Self {
        Self { owner, available }
    }

    /// Split `amount` off the available balance to attach to a call
    pub fn split(&mut self, amount: u64) -> Result<Payment, ValidationError> {
        let remaining =
            self.available
                .checked_sub(amount)
                .ok_or(ValidationError::InsufficientFunds {
                    required: amount,
                    available: self.available,
                })?;
        self.available = remaining;
        Ok(Payment {
            payer: self.owner,
            amount,
        })
    }
}

/// An amount split from a payer, attached to `join_pool`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payment {
    pub payer: Pubkey,
    pub amount: u64,
}

/// What an intent will do once signed and submitted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    CreatePool {
        pool: Pubkey,
        end_time: u64,
    },
    JoinPool {
        pool: Pubkey,
        payer: Pubkey,
        payment: u64,
    },
    ExecuteDraw {
        pool: Pubkey,
        result: Pubkey,
    },
}

impl Operation {
    pub fn pool(&self) -> &Pubkey {
        match self {
            Operation::CreatePool { pool, .. }
            | Operation::JoinPool { pool, .. }
            | Operation::ExecuteDraw { pool, .. } => pool,
        }
    }
}

/// Reasons a composed draw is likely to be refused by the program
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawWarning {
    /// The deadline has not passed locally
    NotYetEligible { remaining: Duration },
    /// The pool is no longer active
    AlreadySettled,
    /// Nobody bought a ticket
    NoParticipants,
}

/// A transaction ready to be signed. Nothing is sent until a submitter takes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    pub operation: Operation,
    /// Wallet that must sign and pay fees
    pub signer: Pubkey,
    pub instructions: Vec<Instruction>,
    /// Set when the local view suggests the program will refuse this draw
    pub warning: Option<DrawWarning>,
}

impl Intent {
    pub fn pool(&self) -> &Pubkey {
        self.operation.pool()
    }

    /// Unsigned transaction with the signer as fee payer
    pub fn to_transaction(&self) -> Transaction {
        Transaction::new_with_payer(&self.instructions, Some(&self.signer))
    }
}

/// Builds draw program intents for one signing wallet
pub struct Composer<T: TimeSource> {
    program_id: Pubkey,
    signer: Pubkey,
    time: T,
}

impl<T: TimeSource> Composer<T> {
    pub fn new(program_id: Pubkey, signer: Pubkey, time: T) -> Self {
        Self {
            program_id,
            signer,
            time,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn signer(&self) -> &Pubkey {
        &self.signer
    }

    pub fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }

    /// Compose `create_pool`. The deadline is taken from the clock at this call.
    /// The description is sent as entered; whitespace only matters for the
    /// emptiness check.
    pub fn compose_create_pool(
        &self,
        description: &str,
        ticket_price: u64,
        duration_ms: u64,
    ) -> Result<Intent, ValidationError> {
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::DescriptionTooLong {
                len: description.len(),
                max: MAX_DESCRIPTION_LEN,
            });
        }
        if ticket_price == 0 {
            return Err(ValidationError::ZeroTicketPrice);
        }
        if duration_ms == 0 {
            return Err(ValidationError::ZeroDuration);
        }

        let end_time = self
            .time
            .now_ms()
            .checked_add(duration_ms)
            .ok_or(ValidationError::DeadlineOverflow)?;
        let (pool, _) = find_pool_address(&self.program_id, &self.signer, end_time);

        let ix = instruction::create_pool(
            &self.program_id,
            &self.signer,
            &pool,
            description.to_string(),
            ticket_price,
            end_time,
        );

        Ok(Intent {
            operation: Operation::CreatePool { pool, end_time },
            signer: self.signer,
            instructions: vec![ix],
            warning: None,
        })
    }

    /// Compose `join_pool`. The attached payment must equal the ticket price exactly.
    pub fn compose_join_pool(
        &self,
        pool_id: &Pubkey,
        ticket_price: u64,
        payment: Payment,
    ) -> Result<Intent, ValidationError> {
        if payment.payer != self.signer {
            return Err(ValidationError::PayerMismatch {
                payer: payment.payer,
                signer: self.signer,
            });
        }
        if payment.amount != ticket_price {
            return Err(ValidationError::PaymentMismatch {
                expected: ticket_price,
                attached: payment.amount,
            });
        }

        let ix = instruction::join_pool(&self.program_id, &payment.payer, pool_id, payment.amount);

        Ok(Intent {
            operation: Operation::JoinPool {
                pool: *pool_id,
                payer: payment.payer,
                payment: payment.amount,
            },
            signer: self.signer,
            instructions: vec![ix],
            warning: None,
        })
    }

    /// Split the ticket price from `funds` and compose `join_pool`.
    /// Funds are left untouched if composition fails.
    pub fn compose_join_with_funds(
        &self,
        pool: &PoolView,
        funds: &mut Funds,
    ) -> Result<Intent, ValidationError> {
        let mut working = *funds;
        let payment = working.split(pool.ticket_price)?;
        let intent = self.compose_join_pool(&pool.id, pool.ticket_price, payment)?;
        *funds = working;
        Ok(intent)
    }

    /// Compose `execute_draw`. Never refused locally: the program decides.
    /// When a view is supplied, the intent carries a warning if the draw
    /// looks premature or pointless.
    pub fn compose_execute_draw(&self, pool_id: &Pubkey, known: Option<&PoolView>) -> Intent {
        let (result, _) = find_result_address(&self.program_id, pool_id);
        let ix = instruction::execute_draw(&self.program_id, &self.signer, pool_id, &result);

        let warning = known.and_then(|view| self.draw_warning(view));

        Intent {
            operation: Operation::ExecuteDraw {
                pool: *pool_id,
                result,
            },
            signer: self.signer,
            instructions: vec![ix],
            warning,
        }
    }

    fn draw_warning(&self, view: &PoolView) -> Option<DrawWarning> {
        let now = self.time.now_ms();
        if view.status.is_terminal() {
            Some(DrawWarning::AlreadySettled)
        } else if !is_eligible_for_draw(view, now) {
            Some(DrawWarning::NotYetEligible {
                remaining: time_remaining(view, now),
            })
        } else if view.participants.is_empty() {
            Some(DrawWarning::NoParticipants)
        } else {
            None
        }
    }
}
