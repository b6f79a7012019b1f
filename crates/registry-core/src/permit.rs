//! Permit protocol: signature-authenticated allowance mutation.
//!
//! A permit message moves through construction off-chain, verification
//! against the claimed owner, and an atomic commit of the resulting
//! allowance records together with a single nonce advance. Any relayer may
//! submit the message; authorization derives entirely from the signature
//! over the canonical digest.

use crate::digest::{permit_batch_digest, permit_single_digest};
use crate::{AllowanceRegistry, RegistryError};
use alloy_primitives::{Address, B256};
use registry_state::StateBatch;
use registry_types::{
	current_timestamp, AllowanceKey, AllowanceRecord, PermitBatch, PermitSingle, Signature,
};

impl AllowanceRegistry {
	/// Commits a signed single-token permit on behalf of `owner`.
	pub async fn permit(
		&self,
		owner: Address,
		message: &PermitSingle,
		signature: &Signature,
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;
		let now = current_timestamp();
		if message.sig_deadline < now {
			return Err(RegistryError::SignatureExpired {
				deadline: message.sig_deadline,
			});
		}

		// The stored counter, not the message's nonce field, is hashed; a
		// replayed message fails recovery because the digest moved on.
		let nonce = self.state.nonce(&owner).await?;
		let digest = permit_single_digest(self.domain_hash(), message, nonce);
		self.verify_owner(owner, digest, signature).await?;

		let next = nonce.checked_add(1).ok_or(RegistryError::NonceOverflow)?;
		let mut batch = StateBatch::new();
		batch.set_allowance(
			AllowanceKey {
				owner,
				token: message.details.token,
				spender: message.spender,
			},
			AllowanceRecord {
				amount: message.details.amount,
				expiration: message.details.expiration,
				nonce,
			},
		);
		batch.set_nonce(owner, next);
		self.state.commit(batch).await?;

		tracing::info!(
			%owner,
			token = %message.details.token,
			spender = %message.spender,
			amount = %message.details.amount,
			nonce,
			"permit committed"
		);
		Ok(())
	}

	/// Commits a signed batch permit on behalf of `owner`.
	///
	/// All entries commit together or none do, and the owner nonce advances
	/// exactly once for the whole batch: one signature authorizes the batch
	/// atomically. A length mismatch between the parallel arrays fails the
	/// message before any signature work.
	pub async fn permit_batch(
		&self,
		owner: Address,
		message: &PermitBatch,
		signature: &Signature,
	) -> Result<(), RegistryError> {
		let _guard = self.call_guard.lock().await;
		if !message.arrays_consistent() {
			return Err(RegistryError::MalformedBatch {
				tokens: message.tokens.len(),
				amounts: message.amounts.len(),
				expirations: message.expirations.len(),
			});
		}

		let now = current_timestamp();
		if message.sig_deadline < now {
			return Err(RegistryError::SignatureExpired {
				deadline: message.sig_deadline,
			});
		}

		let nonce = self.state.nonce(&owner).await?;
		let digest = permit_batch_digest(self.domain_hash(), message, nonce);
		self.verify_owner(owner, digest, signature).await?;

		let next = nonce.checked_add(1).ok_or(RegistryError::NonceOverflow)?;
		let mut batch = StateBatch::new();
		for entry in message.entries() {
			batch.set_allowance(
				AllowanceKey {
					owner,
					token: entry.token,
					spender: message.spender,
				},
				AllowanceRecord {
					amount: entry.amount,
					expiration: entry.expiration,
					nonce,
				},
			);
		}
		batch.set_nonce(owner, next);
		self.state.commit(batch).await?;

		tracing::info!(
			%owner,
			spender = %message.spender,
			entries = message.len(),
			nonce,
			"batch permit committed"
		);
		Ok(())
	}

	/// Recovers the signer of `digest` and requires it to be the non-zero
	/// claimed owner. Oracle failures surface as [`RegistryError::InvalidSigner`].
	async fn verify_owner(
		&self,
		owner: Address,
		digest: B256,
		signature: &Signature,
	) -> Result<(), RegistryError> {
		let recovered = self
			.verifier
			.recover(digest, signature)
			.await
			.map_err(|e| {
				tracing::debug!(error = %e, "signature recovery failed");
				RegistryError::InvalidSigner
			})?;
		if recovered == Address::ZERO || recovered != owner {
			return Err(RegistryError::InvalidSigner);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_util::{
		ecdsa_registry, mock_registry, sign_digest, OWNER, SPENDER, TOKEN_A, TOKEN_B,
	};
	use alloy_primitives::aliases::U160;
	use alloy_signer_local::PrivateKeySigner;
	use registry_types::{current_timestamp, PermitDetails};

	fn single(nonce: u64) -> PermitSingle {
		PermitSingle {
			details: PermitDetails {
				token: TOKEN_A,
				amount: U160::from(100u64),
				expiration: 0,
			},
			spender: SPENDER,
			nonce,
			sig_deadline: current_timestamp() + 600,
		}
	}

	fn batch(nonce: u64) -> PermitBatch {
		PermitBatch {
			tokens: vec![TOKEN_A, TOKEN_B],
			amounts: vec![U160::from(5u64), U160::from(10u64)],
			expirations: vec![0, 0],
			spender: SPENDER,
			nonce,
			sig_deadline: current_timestamp() + 600,
		}
	}

	#[tokio::test]
	async fn test_permit_matches_direct_approval() {
		let signer = PrivateKeySigner::random();
		let owner = signer.address();
		let (registry, _token, _state) = ecdsa_registry();

		let message = single(0);
		let digest = permit_single_digest(registry.domain_hash(), &message, message.nonce);
		registry
			.permit(owner, &message, &sign_digest(&signer, digest))
			.await
			.unwrap();

		// Same record an equivalent direct approval would produce.
		let record = registry.allowance(owner, TOKEN_A, SPENDER).await.unwrap();
		assert_eq!(record.amount, U160::from(100u64));
		assert_eq!(record.expiration, 0);
		assert_eq!(record.nonce, 0);
		assert_eq!(registry.nonce(owner).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_replayed_permit_is_rejected() {
		let signer = PrivateKeySigner::random();
		let owner = signer.address();
		let (registry, _token, _state) = ecdsa_registry();

		let message = single(0);
		let digest = permit_single_digest(registry.domain_hash(), &message, message.nonce);
		let signature = sign_digest(&signer, digest);

		registry.permit(owner, &message, &signature).await.unwrap();

		// The stored counter moved, so the identical submission recovers a
		// different identity and fails.
		let replay = registry.permit(owner, &message, &signature).await;
		assert!(matches!(replay, Err(RegistryError::InvalidSigner)));
		assert_eq!(registry.nonce(owner).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_foreign_signer_is_rejected() {
		let signer = PrivateKeySigner::random();
		let (registry, _token, _state) = ecdsa_registry();

		let message = single(0);
		let digest = permit_single_digest(registry.domain_hash(), &message, message.nonce);
		// Claimed owner differs from the actual signer.
		let claimed = Address::repeat_byte(0x99);
		let result = registry
			.permit(claimed, &message, &sign_digest(&signer, digest))
			.await;
		assert!(matches!(result, Err(RegistryError::InvalidSigner)));
	}

	#[tokio::test]
	async fn test_zero_recovered_identity_is_rejected() {
		// Oracle that "recovers" the zero address must never authorize the
		// zero owner.
		let (registry, _token, _state) = mock_registry(Address::ZERO);
		let message = single(0);
		let result = registry
			.permit(Address::ZERO, &message, &Signature(vec![0u8; 65]))
			.await;
		assert!(matches!(result, Err(RegistryError::InvalidSigner)));
	}

	#[tokio::test]
	async fn test_expired_deadline_is_rejected() {
		let (registry, _token, _state) = mock_registry(OWNER);
		let mut message = single(0);
		message.sig_deadline = current_timestamp() - 10;

		let result = registry
			.permit(OWNER, &message, &Signature(vec![0u8; 65]))
			.await;
		assert!(matches!(
			result,
			Err(RegistryError::SignatureExpired { .. })
		));
		assert_eq!(registry.nonce(OWNER).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_batch_commits_atomically_with_one_nonce() {
		let signer = PrivateKeySigner::random();
		let owner = signer.address();
		let (registry, _token, _state) = ecdsa_registry();

		let message = batch(0);
		let digest = permit_batch_digest(registry.domain_hash(), &message, message.nonce);
		registry
			.permit_batch(owner, &message, &sign_digest(&signer, digest))
			.await
			.unwrap();

		let a = registry.allowance(owner, TOKEN_A, SPENDER).await.unwrap();
		let b = registry.allowance(owner, TOKEN_B, SPENDER).await.unwrap();
		assert_eq!(a.amount, U160::from(5u64));
		assert_eq!(b.amount, U160::from(10u64));
		// One signature, one nonce: advanced by 1, not per entry.
		assert_eq!(registry.nonce(owner).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_mismatched_batch_fails_before_signature_work() {
		let (registry, _token, _state) = mock_registry(OWNER);
		let mut message = batch(0);
		message.amounts.pop();

		// An empty signature would fail recovery; the malformed shape must
		// win instead, proving no signature work happened.
		let result = registry
			.permit_batch(OWNER, &message, &Signature(Vec::new()))
			.await;
		assert!(matches!(
			result,
			Err(RegistryError::MalformedBatch {
				tokens: 2,
				amounts: 1,
				expirations: 2
			})
		));
	}

	#[tokio::test]
	async fn test_batch_replay_is_rejected() {
		let signer = PrivateKeySigner::random();
		let owner = signer.address();
		let (registry, _token, _state) = ecdsa_registry();

		let message = batch(0);
		let digest = permit_batch_digest(registry.domain_hash(), &message, message.nonce);
		let signature = sign_digest(&signer, digest);

		registry
			.permit_batch(owner, &message, &signature)
			.await
			.unwrap();
		let replay = registry.permit_batch(owner, &message, &signature).await;
		assert!(matches!(replay, Err(RegistryError::InvalidSigner)));
	}
}
