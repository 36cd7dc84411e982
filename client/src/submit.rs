use async_trait::async_trait;
use solana_sdk::signature::Signature;

use crate::composer::Intent;
use crate::error::ClientError;

/// Signs and sends composed intents. Implemented by wallet adapters and
/// keypair signers.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Sign and send `intent`, returning once the transaction is confirmed.
    ///
    /// Refusals by the wallet or the draw program are reported as
    /// `ClientError::SubmissionRejected` with the message verbatim.
    async fn submit(&self, intent: &Intent) -> Result<Signature, ClientError>;
}
