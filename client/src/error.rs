// Lucky Draw Client - Errors
use solana_program::{program_error::ProgramError, pubkey::Pubkey};
use thiserror::Error;

/// Failure to read chain state. Never means "the pool does not exist".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The RPC or indexer request failed
    #[error("chain read failed: {0}")]
    Rpc(String),

    /// The request did not complete in time
    #[error("chain read timed out after {0} ms")]
    Timeout(u64),

    /// Account or event bytes could not be decoded
    #[error("malformed chain data: {0}")]
    Malformed(String),

    /// Pool status byte outside the known encoding
    #[error("unknown pool status code {0}")]
    UnknownStatus(u8),
}

impl From<ProgramError> for ReadError {
    fn from(e: ProgramError) -> Self {
        ReadError::Malformed(e.to_string())
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Malformed(e.to_string())
    }
}

/// Composition-time rejections. Raised before anything reaches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Description is empty or only whitespace
    #[error("pool description must not be empty")]
    EmptyDescription,

    /// Description does not fit the pool account
    #[error("pool description is {len} bytes, limit is {max}")]
    DescriptionTooLong { len: usize, max: usize },

    /// Ticket price must be positive
    #[error("ticket price must be greater than zero")]
    ZeroTicketPrice,

    /// Duration must be positive
    #[error("pool duration must be greater than zero")]
    ZeroDuration,

    /// now + duration does not fit in a u64 millisecond timestamp
    #[error("pool deadline overflows the timestamp range")]
    DeadlineOverflow,

    /// Attached payment differs from the ticket price
    #[error("payment of {attached} does not match ticket price {expected}")]
    PaymentMismatch { expected: u64, attached: u64 },

    /// Payment was split from a different wallet than the one signing
    #[error("payment comes from {payer}, but the signer is {signer}")]
    PayerMismatch { payer: Pubkey, signer: Pubkey },

    /// Payer cannot cover the requested split
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// A user-entered amount could not be parsed
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// No duration preset has this many minutes
    #[error("no duration preset of {0} minutes")]
    UnknownDuration(u64),
}

/// Errors surfaced by client operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The pool account genuinely does not exist
    #[error("no such pool: {0}")]
    NotFound(Pubkey),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The draw program or the signer refused the operation. Not retried.
    #[error("operation rejected: {0}")]
    SubmissionRejected(String),
}

/// Errors loading client configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },

    #[error("failed to read keypair from {path}: {reason}")]
    Keypair { path: String, reason: String },
}
