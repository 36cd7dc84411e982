// Lucky Draw Client - Draw program instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::constants::{clock_object, randomness_object, POOL_SEED, RESULT_SEED};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum DrawInstruction {
    /// Create a new pool
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The creator, pays for the pool account
    /// 1. `[writable]` The pool account (PDA of creator and end time)
    /// 2. `[]` The system program
    /// 3. `[]` The clock object
    CreatePool {
        description: String,
        /// Price per ticket in base units
        ticket_price: u64,
        /// Deadline in milliseconds since the epoch
        end_time_ms: u64,
    },

    /// Buy one ticket
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer, debited exactly `payment`
    /// 1. `[writable]` The pool account
    /// 2. `[]` The system program
    /// 3. `[]` The clock object
    JoinPool {
        /// Must equal the pool's ticket price
        payment: u64,
    },

    /// Select a winner and pay out. Anyone may call this once the deadline passed.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The keeper, receives the incentive
    /// 1. `[writable]` The pool account
    /// 2. `[writable]` The reward result account (PDA of the pool)
    /// 3. `[]` The system program
    /// 4. `[]` The clock object
    /// 5. `[]` The randomness object
    ExecuteDraw,
}

impl DrawInstruction {
    /// Entry point name on the draw program
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatePool { .. } => "create_pool",
            Self::JoinPool { .. } => "join_pool",
            Self::ExecuteDraw => "execute_draw",
        }
    }

    /// Packs a DrawInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        // Serializing into a Vec cannot fail
        self.try_to_vec().unwrap_or_default()
    }

    /// Unpacks a byte buffer into a DrawInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Find the program derived address of a pool
pub fn find_pool_address(program_id: &Pubkey, creator: &Pubkey, end_time_ms: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[POOL_SEED, creator.as_ref(), &end_time_ms.to_le_bytes()],
        program_id,
    )
}

/// Find the program derived address of a pool's reward result
pub fn find_result_address(program_id: &Pubkey, pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RESULT_SEED, pool.as_ref()], program_id)
}

/// Create create_pool instruction
pub fn create_pool(
    program_id: &Pubkey,
    creator: &Pubkey,
    pool_account: &Pubkey,
    description: String,
    ticket_price: u64,
    end_time_ms: u64,
) -> Instruction {
    let data = DrawInstruction::CreatePool {
        description,
        ticket_price,
        end_time_ms,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*creator, true),
        AccountMeta::new(*pool_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(clock_object(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create join_pool instruction
pub fn join_pool(
    program_id: &Pubkey,
    payer: &Pubkey,
    pool_account: &Pubkey,
    payment: u64,
) -> Instruction {
    let data = DrawInstruction::JoinPool { payment }.pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*pool_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(clock_object(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create execute_draw instruction
pub fn execute_draw(
    program_id: &Pubkey,
    keeper: &Pubkey,
    pool_account: &Pubkey,
    result_account: &Pubkey,
) -> Instruction {
    let data = DrawInstruction::ExecuteDraw.pack();

    let accounts = vec![
        AccountMeta::new(*keeper, true),
        AccountMeta::new(*pool_account, false),
        AccountMeta::new(*result_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(clock_object(), false),
        AccountMeta::new_readonly(randomness_object(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
