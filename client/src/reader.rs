use async_trait::async_trait;
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, ReadError};
use crate::events::{ChainEvent, EventFilter};
use crate::projector::{DrawResult, PoolView};
use crate::state::{PoolSnapshot, RewardResult};

/// Read-only access to draw program state.
///
/// Every answer reflects some past confirmed state and may lag behind
/// the latest. Implementations report transport failures as `ReadError`
/// and only return `None` when the account is known to be absent.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Read a pool account. `Ok(None)` means the pool does not exist.
    async fn fetch_pool_snapshot(&self, pool_id: &Pubkey)
        -> Result<Option<PoolSnapshot>, ReadError>;

    /// Read program events matching `filter`, in any order.
    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<ChainEvent>, ReadError>;

    /// Read the reward result account written by a draw.
    async fn fetch_reward_result(&self, result_id: &Pubkey)
        -> Result<Option<RewardResult>, ReadError>;
}

/// Read a pool, turning absence into `ClientError::NotFound`
pub async fn fetch_pool<R: ChainReader + ?Sized>(
    reader: &R,
    pool_id: &Pubkey,
) -> Result<PoolSnapshot, ClientError> {
    reader
        .fetch_pool_snapshot(pool_id)
        .await?
        .ok_or(ClientError::NotFound(*pool_id))
}

/// Look up the settled result of a drawn pool.
/// `Ok(None)` while the pool is undrawn or the result is not indexed yet.
pub async fn fetch_draw_result<R: ChainReader + ?Sized>(
    reader: &R,
    view: &PoolView,
) -> Result<Option<DrawResult>, ReadError> {
    let result_id = match (view.is_drawn(), view.result_id) {
        (true, Some(result_id)) => result_id,
        _ => return Ok(None),
    };
    let reward = reader.fetch_reward_result(&result_id).await?;
    Ok(reward.and_then(|reward| DrawResult::from_parts(view, &reward)))
}
