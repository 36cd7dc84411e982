// Lucky Draw Client
// Tracks pools of the on-chain lucky draw program and drives their lifecycle:
// create a pool, buy tickets, trigger the randomized draw.

// Chain model
pub mod constants;
pub mod error;
pub mod events;
pub mod instruction;
pub mod state;

// Reading and projection
pub mod eligibility;
pub mod projector;
pub mod reader;
pub mod registry;

// Writing and settlement
pub mod composer;
pub mod settlement;
pub mod submit;

// Runtime
pub mod config;
pub mod keeper;
pub mod session;
pub mod utils;

pub use composer::{Composer, Funds, Intent, Operation, Payment};
pub use error::{ClientError, ReadError, ValidationError};
pub use projector::{project, DrawResult, PoolView, ViewCache};
pub use reader::ChainReader;
pub use settlement::{reconcile, Expectation, Outcome, Reconciled, RetryPolicy};
pub use state::PoolStatus;
pub use submit::Submitter;
