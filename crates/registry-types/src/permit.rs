//! Off-chain permit message types.
//!
//! Permit messages are constructed and signed off-chain, then submitted by
//! any relayer together with the claimed owner and signature. They are never
//! persisted; on success the registry writes the resulting allowance records
//! and advances the owner's nonce.

use alloy_primitives::{aliases::U160, Address};
use serde::{Deserialize, Serialize};

/// Terms for one token within a permit: the approval the signer is granting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitDetails {
	/// Token the approval covers.
	pub token: Address,
	/// Approved amount.
	pub amount: U160,
	/// Unix timestamp after which the approval is void for spending.
	/// Zero means no expiry.
	pub expiration: u64,
}

/// Single-token permit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSingle {
	/// Approval terms.
	pub details: PermitDetails,
	/// Spender being authorized.
	pub spender: Address,
	/// Owner nonce the signer expects to consume. The registry hashes its
	/// own stored counter when verifying, so a stale nonce fails recovery.
	pub nonce: u64,
	/// Unix timestamp after which the signature itself is void.
	pub sig_deadline: u64,
}

/// Multi-token permit message.
///
/// Per-token terms are carried as parallel arrays sharing one spender, one
/// nonce, and one signature deadline. The arrays must agree in length; a
/// mismatch makes the whole message malformed before any signature work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitBatch {
	/// Tokens being approved, one entry per approval.
	pub tokens: Vec<Address>,
	/// Approved amounts, parallel to `tokens`.
	pub amounts: Vec<U160>,
	/// Per-approval expirations, parallel to `tokens`. Zero means no expiry.
	pub expirations: Vec<u64>,
	/// Spender authorized for every entry.
	pub spender: Address,
	/// Owner nonce for the whole batch; consumed once, not per entry.
	pub nonce: u64,
	/// Unix timestamp after which the signature is void.
	pub sig_deadline: u64,
}

impl PermitBatch {
	/// Whether the parallel arrays agree in length.
	pub fn arrays_consistent(&self) -> bool {
		self.tokens.len() == self.amounts.len() && self.tokens.len() == self.expirations.len()
	}

	/// Number of per-token entries.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Whether the batch carries no entries.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Iterate the per-token entries as [`PermitDetails`].
	///
	/// Callers must check [`arrays_consistent`](Self::arrays_consistent)
	/// first; iteration stops at the shortest array.
	pub fn entries(&self) -> impl Iterator<Item = PermitDetails> + '_ {
		self.tokens
			.iter()
			.zip(self.amounts.iter())
			.zip(self.expirations.iter())
			.map(|((token, amount), expiration)| PermitDetails {
				token: *token,
				amount: *amount,
				expiration: *expiration,
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn batch(tokens: usize, amounts: usize, expirations: usize) -> PermitBatch {
		PermitBatch {
			tokens: vec![Address::repeat_byte(0x11); tokens],
			amounts: vec![U160::from(1u64); amounts],
			expirations: vec![0; expirations],
			spender: Address::repeat_byte(0x22),
			nonce: 0,
			sig_deadline: 100,
		}
	}

	#[test]
	fn test_consistent_arrays() {
		assert!(batch(2, 2, 2).arrays_consistent());
		assert!(batch(0, 0, 0).arrays_consistent());
	}

	#[test]
	fn test_mismatched_arrays() {
		assert!(!batch(2, 1, 2).arrays_consistent());
		assert!(!batch(2, 2, 3).arrays_consistent());
	}

	#[test]
	fn test_entries_zip() {
		let batch = batch(3, 3, 3);
		assert_eq!(batch.entries().count(), 3);
	}
}
