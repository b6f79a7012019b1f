//! The allowance registry engine.

use crate::{RegistryError, TokenTransfer};
use alloy_primitives::{aliases::U160, Address, B256};
use registry_config::DomainConfig;
use registry_state::{StateBatch, StateService};
use registry_types::utils::compute_domain_hash;
use registry_types::{AllowanceKey, AllowanceRecord, TokenSpenderPair};
use registry_verifier::VerifierService;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Allowance and nonce state machine with signature-authenticated mutation.
///
/// The engine owns no cryptography and no durability of its own: it wires
/// the state backend, the verification oracle, and the external token
/// capability together and enforces the protocol rules between them.
///
/// Every mutating operation runs behind an internal call guard, making the
/// serialized-execution assumption explicit: one operation validates,
/// invokes any external capability, and commits (or aborts) as a whole
/// before the next begins. All writes of one operation go through a single
/// atomic [`StateBatch`] commit, so a failed call leaves no partial state.
pub struct AllowanceRegistry {
	/// Signing-domain identity bound into every permit digest.
	domain: DomainConfig,
	/// Precomputed EIP-712 domain hash.
	domain_hash: B256,
	/// Persisted allowance and nonce state.
	pub(crate) state: Arc<StateService>,
	/// Signature verification oracle.
	pub(crate) verifier: Arc<VerifierService>,
	/// External token-movement capability.
	pub(crate) token: Arc<dyn TokenTransfer>,
	/// Serializes mutating operations.
	pub(crate) call_guard: Mutex<()>,
}

impl AllowanceRegistry {
	/// Creates a registry over the given backends.
	pub fn new(
		domain: DomainConfig,
		state: Arc<StateService>,
		verifier: Arc<VerifierService>,
		token: Arc<dyn TokenTransfer>,
	) -> Self {
		let domain_hash =
			compute_domain_hash(&domain.name, domain.chain_id, &domain.verifying_contract);
		Self {
			domain,
			domain_hash,
			state,
			verifier,
			token,
			call_guard: Mutex::new(()),
		}
	}

	/// The signing-domain identity this registry verifies against.
	pub fn domain(&self) -> &DomainConfig {
		&self.domain
	}

	/// The EIP-712 domain hash permit digests are bound to.
	pub fn domain_hash(&self) -> &B256 {
		&self.domain_hash
	}

	/// Current allowance record for (owner, token, spender).
	///
	/// Absent records read as the zero record; a zero amount is
	/// indistinguishable from "no allowance".
	pub async fn allowance(
		&self,
		owner: Address,
		token: Address,
		spender: Address,
	) -> Result<AllowanceRecord, RegistryError> {
		let record = self
			.state
			.allowance(&AllowanceKey {
				owner,
				token,
				spender,
			})
			.await?;
		tracing::debug!(%owner, %token, %spender, amount = %record.amount, "allowance read");
		Ok(record)
	}

	/// Current nonce counter for an owner.
	pub async fn nonce(&self, owner: Address) -> Result<u64, RegistryError> {
		let nonce = self.state.nonce(&owner).await?;
		tracing::debug!(%owner, nonce, "nonce read");
		Ok(nonce)
	}

	/// Unconditionally overwrites the allowance for (owner, token, spender).
	///
	/// The caller is the owner, so no signature is involved. The previous
	/// amount is discarded, not accumulated. The stored nonce marker is
	/// preserved so permit replay detection is unaffected.
	pub async fn approve(
		&self,
		owner: Address,
		token: Address,
		spender: Address,
		amount: U160,
		expiration: u64,
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;
		let key = AllowanceKey {
			owner,
			token,
			spender,
		};
		let prior = self.state.allowance(&key).await?;

		let mut batch = StateBatch::new();
		batch.set_allowance(
			key,
			AllowanceRecord {
				amount,
				expiration,
				nonce: prior.nonce,
			},
		);
		self.state.commit(batch).await?;

		tracing::info!(%owner, %token, %spender, %amount, expiration, "approval written");
		Ok(())
	}

	/// Revokes the allowance for every given (token, spender) pair,
	/// optionally advancing the owner's nonce in the same atomic commit.
	///
	/// Deleting an absent record is a no-op, so lockdown is idempotent. If
	/// the invalidation count fails the cap check, the whole call fails and
	/// no deletion persists.
	pub async fn lockdown(
		&self,
		owner: Address,
		pairs: &[TokenSpenderPair],
		invalidate: Option<u64>,
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;

		let mut batch = StateBatch::new();
		for pair in pairs {
			batch.clear_allowance(AllowanceKey {
				owner,
				token: pair.token,
				spender: pair.spender,
			});
		}
		if let Some(count) = invalidate {
			let next = self.advanced_nonce(owner, count).await?;
			batch.set_nonce(owner, next);
		}
		self.state.commit(batch).await?;

		tracing::info!(%owner, pairs = pairs.len(), invalidated = invalidate.unwrap_or(0), "lockdown applied");
		Ok(())
	}
}
