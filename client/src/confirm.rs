//! Polling a submitted transaction until it lands, fails or runs out of time.

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::backend::{ChainBackend, TxHash, TxReceipt, TxStatus};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Polls `hash` every `poll_interval` until it leaves the pending state or
/// `confirmation_timeout` runs out.
pub async fn wait_for_confirmation<B: ChainBackend + ?Sized>(
    backend: &B,
    hash: TxHash,
    config: &ClientConfig,
) -> Result<TxReceipt, ClientError> {
    let started = Instant::now();
    let timeout = config.confirmation_timeout();
    loop {
        match backend.status(hash) {
            TxStatus::Confirmed(receipt) => {
                debug!(%hash, block = receipt.block_number, "transaction confirmed");
                return Ok(receipt);
            }
            TxStatus::Reverted { reason, data } => {
                warn!(%hash, %reason, "transaction reverted");
                return Err(ClientError::reverted(hash, reason, &data));
            }
            TxStatus::Dropped => {
                warn!(%hash, "transaction dropped");
                return Err(ClientError::Dropped(hash));
            }
            TxStatus::Pending => {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(ClientError::Timeout { hash, waited });
                }
                sleep(config.poll_interval().min(timeout - waited)).await;
            }
        }
    }
}
