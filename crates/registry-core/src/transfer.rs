//! Transfer gateway: consuming allowances to move tokens.
//!
//! The token itself is an external capability behind [`TokenTransfer`]. The
//! gateway validates each movement against (buffered) allowance state,
//! invokes the capability, and commits the decrements only after every
//! movement succeeded, so a failed call leaves registry state untouched.
//! External movements already performed when a later batch entry fails are
//! the hosting environment's to revert.

use crate::{AllowanceRegistry, RegistryError};
use alloy_primitives::{aliases::U160, Address};
use async_trait::async_trait;
use registry_state::StateBatch;
use registry_types::{current_timestamp, AllowanceKey, AllowanceRecord, TransferDetails};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by the external token capability.
#[derive(Debug, Error)]
pub enum TokenError {
	/// The token contract rejected or failed the movement.
	#[error("Transfer failed: {0}")]
	TransferFailed(String),
}

/// External token-movement capability.
///
/// Implementations move `amount` of `token` from `from` to `to`, reporting
/// failure to abort the surrounding registry operation. Implementations
/// must not call back into the registry; the call guard serializes
/// operations, so a reentrant call cannot make progress.
#[async_trait]
pub trait TokenTransfer: Send + Sync {
	async fn transfer(
		&self,
		token: Address,
		from: Address,
		to: Address,
		amount: U160,
	) -> Result<(), TokenError>;
}

impl AllowanceRegistry {
	/// Moves tokens on behalf of `from`, consuming the caller's allowance.
	///
	/// The caller is the spender. Unlimited approvals are never
	/// decremented; all other decrements are checked, so requesting more
	/// than the remaining amount fails rather than wrapping.
	pub async fn transfer_from(
		&self,
		spender: Address,
		from: Address,
		details: &TransferDetails,
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;
		let now = current_timestamp();

		let mut pending = HashMap::new();
		self.consume_allowance(&mut pending, spender, from, details, now)
			.await?;
		self.commit_pending(pending).await?;

		tracing::info!(
			%spender,
			%from,
			token = %details.token,
			to = %details.to,
			amount = %details.amount,
			"transfer executed"
		);
		Ok(())
	}

	/// Moves several tokens on behalf of `from`, per entry in order, with
	/// first-failure-aborts-all semantics: no decrement is observable
	/// unless every entry succeeded.
	pub async fn batch_transfer_from(
		&self,
		spender: Address,
		from: Address,
		details: &[TransferDetails],
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;
		let now = current_timestamp();

		let mut pending = HashMap::new();
		for entry in details {
			self.consume_allowance(&mut pending, spender, from, entry, now)
				.await?;
		}
		self.commit_pending(pending).await?;

		tracing::info!(%spender, %from, entries = details.len(), "batch transfer executed");
		Ok(())
	}

	/// Validates one movement against the buffered allowance state and
	/// invokes the capability. The decrement lands in `pending` only;
	/// repeated movements over the same key within a call see each other's
	/// buffered balance.
	async fn consume_allowance(
		&self,
		pending: &mut HashMap<AllowanceKey, AllowanceRecord>,
		spender: Address,
		from: Address,
		details: &TransferDetails,
		now: u64,
	) -> Result<(), RegistryError> {
		let key = AllowanceKey {
			owner: from,
			token: details.token,
			spender,
		};
		let record = match pending.get(&key) {
			Some(record) => *record,
			None => self.state.allowance(&key).await?,
		};

		if record.is_expired(now) {
			return Err(RegistryError::AllowanceExpired {
				expiration: record.expiration,
			});
		}

		if record.is_unlimited() {
			self.token
				.transfer(details.token, from, details.to, details.amount)
				.await
				.map_err(|e| {
					tracing::warn!(%spender, %from, token = %details.token, error = %e, "token capability failed, transfer aborted");
					e
				})?;
			return Ok(());
		}

		let remaining = record.amount.checked_sub(details.amount).ok_or(
			RegistryError::InsufficientAllowance {
				available: record.amount,
				requested: details.amount,
			},
		)?;

		self.token
			.transfer(details.token, from, details.to, details.amount)
			.await
			.map_err(|e| {
				tracing::warn!(%spender, %from, token = %details.token, error = %e, "token capability failed, transfer aborted");
				e
			})?;
		pending.insert(
			key,
			AllowanceRecord {
				amount: remaining,
				..record
			},
		);
		Ok(())
	}

	async fn commit_pending(
		&self,
		pending: HashMap<AllowanceKey, AllowanceRecord>,
	) -> Result<(), RegistryError> {
		let mut batch = StateBatch::new();
		for (key, record) in pending {
			batch.set_allowance(key, record);
		}
		Ok(self.state.commit(batch).await?)
	}
}
