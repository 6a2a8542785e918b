//! Submission state of user operations and receipt polling

use crate::{bundler::BundlerClient, config::WaitConfig, error::ClientError};
use ethers::{providers::Middleware, types::U256};
use lightkit_primitives::{UserOperationHash, UserOperationReceipt, UserOperationRequest};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, info, trace, warn};

/// `Built -> Submitted -> {Confirmed | Dropped}`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    Built,
    Submitted,
    Confirmed,
    Dropped,
}

impl SubmissionState {
    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        matches!(
            (self, next),
            (SubmissionState::Built, SubmissionState::Submitted)
                | (SubmissionState::Submitted, SubmissionState::Confirmed)
                | (SubmissionState::Submitted, SubmissionState::Dropped)
        )
    }

    /// Whether the user operation reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Confirmed | SubmissionState::Dropped)
    }
}

/// A signed user operation and where it is in its lifecycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationSubmission {
    pub hash: UserOperationHash,
    pub request: UserOperationRequest,
    pub state: SubmissionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<UserOperationReceipt>,
    /// User operation superseded by this one (drop-and-replace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<UserOperationHash>,
}

impl UserOperationSubmission {
    pub fn built(hash: UserOperationHash, request: UserOperationRequest) -> Self {
        Self { hash, request, state: SubmissionState::Built, receipt: None, replaces: None }
    }

    pub fn nonce(&self) -> U256 {
        self.request.nonce
    }

    /// Moves to `next`, returns `false` (and stays put) if the transition isn't allowed
    pub fn transition(&mut self, next: SubmissionState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!("User operation {} can't go from {} to {next}", self.hash, self.state);
            return false;
        }
        trace!("User operation {} {} -> {next}", self.hash, self.state);
        self.state = next;
        true
    }

    pub fn confirm(&mut self, receipt: UserOperationReceipt) -> bool {
        let moved = self.transition(SubmissionState::Confirmed);
        if moved {
            self.receipt = Some(receipt);
        }
        moved
    }
}

/// Polls the receipt of `hash` until it is mined, evicted, or the timeout elapses
///
/// Abandoning the returned future doesn't affect the user operation on the bundler side.
pub async fn wait_for_receipt<M: Middleware + 'static>(
    bundler: &BundlerClient<M>,
    hash: &UserOperationHash,
    nonce: U256,
    wait: &WaitConfig,
) -> Result<UserOperationReceipt, ClientError> {
    let poll = async {
        let mut interval = wait.poll_interval();
        loop {
            let receipt = bundler
                .get_user_operation_receipt(hash)
                .await
                .map_err(|err| ClientError::provider(&err))?;
            if let Some(receipt) = receipt {
                info!(
                    "User operation {hash} mined in transaction {:?}",
                    receipt.receipt.transaction_hash
                );
                return Ok(receipt);
            }

            let pending = bundler
                .get_user_operation_by_hash(hash)
                .await
                .map_err(|err| ClientError::provider(&err))?;
            if pending.is_none() {
                return Err(ClientError::OperationDropped {
                    hash: *hash,
                    nonce,
                    reason: "evicted by the bundler".into(),
                });
            }

            trace!("User operation {hash} still pending, next poll in {interval:?}");
            tokio::time::sleep(interval).await;
            interval = wait.next_interval(interval);
        }
    };

    match tokio::time::timeout(wait.timeout(), poll).await {
        Ok(res) => res,
        Err(_) => {
            debug!("User operation {hash} not mined within {:?}", wait.timeout());
            Err(ClientError::OperationDropped {
                hash: *hash,
                nonce,
                reason: format!("not mined within {}ms", wait.timeout),
            })
        }
    }
}
