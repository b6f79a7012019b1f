//! Allowance state types for the registry.
//!
//! The registry persists exactly one record per (owner, token, spender) key.
//! Amounts are 160-bit unsigned integers; expirations and nonces are carried
//! as `u64` and encoded as 48-bit fields in signed messages.

use alloy_primitives::{aliases::U160, Address};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount sentinel meaning "unlimited approval". Never decremented on spend.
pub const UNLIMITED_ALLOWANCE: U160 = U160::MAX;

/// Expiration value meaning "no expiry".
pub const NO_EXPIRATION: u64 = 0;

/// Key of one allowance record: the owner granting, the token covered, and
/// the spender authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowanceKey {
	/// Address whose tokens the allowance spends.
	pub owner: Address,
	/// Token contract the allowance covers.
	pub token: Address,
	/// Address authorized to spend.
	pub spender: Address,
}

/// Stored approval for one [`AllowanceKey`].
///
/// A record with `amount == 0` is indistinguishable from "no allowance";
/// reads of absent keys return [`AllowanceRecord::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceRecord {
	/// Remaining spendable amount. [`UNLIMITED_ALLOWANCE`] is never decremented.
	pub amount: U160,
	/// Unix timestamp after which the record is void for spending.
	/// [`NO_EXPIRATION`] means the record never expires.
	pub expiration: u64,
	/// Owner nonce consumed by the permit that produced this record.
	/// Replay-guard metadata only; transfers never consult it.
	pub nonce: u64,
}

impl AllowanceRecord {
	/// Whether the record is void for spending at the given time.
	pub fn is_expired(&self, now: u64) -> bool {
		self.expiration != NO_EXPIRATION && now > self.expiration
	}

	/// Whether the record carries the unlimited sentinel.
	pub fn is_unlimited(&self) -> bool {
		self.amount == UNLIMITED_ALLOWANCE
	}
}

/// One (token, spender) approval targeted by a lockdown call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpenderPair {
	/// Token contract of the approval to revoke.
	pub token: Address,
	/// Spender of the approval to revoke.
	pub spender: Address,
}

/// Parameters of one delegated token movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDetails {
	/// Token to move.
	pub token: Address,
	/// Recipient of the movement.
	pub to: Address,
	/// Quantity to move, deducted from the allowance unless unlimited.
	pub amount: U160,
}

/// Opaque signature bytes (65-byte r || s || v). Parsing and recovery belong
/// to the verifier oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
	/// Signature bytes as a slice.
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for Signature {
	fn from(bytes: Vec<u8>) -> Self {
		Signature(bytes)
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(&self.0))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_absent_record_is_zero_allowance() {
		let record = AllowanceRecord::default();
		assert_eq!(record.amount, U160::ZERO);
		assert_eq!(record.expiration, NO_EXPIRATION);
		assert!(!record.is_expired(u64::MAX));
		assert!(!record.is_unlimited());
	}

	#[test]
	fn test_expiry_is_strictly_after() {
		let record = AllowanceRecord {
			amount: U160::from(1u64),
			expiration: 100,
			nonce: 0,
		};
		assert!(!record.is_expired(99));
		assert!(!record.is_expired(100));
		assert!(record.is_expired(101));
	}

	#[test]
	fn test_unlimited_sentinel() {
		let record = AllowanceRecord {
			amount: UNLIMITED_ALLOWANCE,
			expiration: NO_EXPIRATION,
			nonce: 0,
		};
		assert!(record.is_unlimited());
	}

	#[test]
	fn test_signature_display_is_hex() {
		let signature = Signature(vec![0xab, 0xcd]);
		assert_eq!(signature.to_string(), "0xabcd");
	}
}
