//! Nonce registry: monotonic per-owner counters with capped invalidation.

use crate::{AllowanceRegistry, RegistryError};
use alloy_primitives::Address;
use registry_state::StateBatch;

/// Cap on how far one invalidation call may advance a counter.
///
/// A guardrail against user error, not an authorization rule: without it an
/// owner could skip past every realistically reachable nonce in one call
/// and lock themselves out of the permit path.
pub const MAX_NONCE_INVALIDATION: u64 = 1 << 16;

impl AllowanceRegistry {
	/// Advances the owner's nonce counter by `count`, voiding any
	/// outstanding permit signed over a skipped value. Returns the new
	/// counter value so callers can display and confirm it.
	pub async fn invalidate_nonces(
		&self,
		owner: Address,
		count: u64,
	) -> Result<u64, RegistryError> {
		let _guard = self.call_guard.lock().await;
		let next = self.advanced_nonce(owner, count).await?;

		let mut batch = StateBatch::new();
		batch.set_nonce(owner, next);
		self.state.commit(batch).await?;

		tracing::info!(%owner, count, nonce = next, "nonces invalidated");
		Ok(next)
	}

	/// Computes the owner's counter advanced by `count`, enforcing the cap
	/// and overflow checks without writing anything. Callers hold the call
	/// guard and commit the result themselves.
	pub(crate) async fn advanced_nonce(
		&self,
		owner: Address,
		count: u64,
	) -> Result<u64, RegistryError> {
		if count > MAX_NONCE_INVALIDATION {
			return Err(RegistryError::ExcessiveInvalidation { count });
		}
		let current = self.state.nonce(&owner).await?;
		current
			.checked_add(count)
			.ok_or(RegistryError::NonceOverflow)
	}
}
