//! Canonical EIP-712 digests for permit messages.
//!
//! The nonce hashed into a digest is an explicit parameter: signing tooling
//! passes the nonce embedded in the message, while the registry passes its
//! stored counter. A message signed over a stale nonce therefore hashes to
//! a digest the signature no longer matches, which is the replay guard.

use alloy_primitives::{keccak256, B256};
use registry_types::utils::eip712::{
	compute_final_digest, StructEncoder, PERMIT_BATCH_TYPE, PERMIT_DETAILS_TYPE,
	PERMIT_SINGLE_TYPE,
};
use registry_types::{PermitBatch, PermitDetails, PermitSingle};

fn permit_details_hash(details: &PermitDetails) -> B256 {
	let type_hash = keccak256(PERMIT_DETAILS_TYPE.as_bytes());
	let mut enc = StructEncoder::new();
	enc.push_b256(&type_hash);
	enc.push_address(&details.token);
	enc.push_u160(details.amount);
	enc.push_u64(details.expiration);
	keccak256(enc.finish())
}

/// Digest of a single-token permit under the given domain, binding `nonce`.
pub fn permit_single_digest(domain_hash: &B256, message: &PermitSingle, nonce: u64) -> B256 {
	let type_hash =
		keccak256(format!("{}{}", PERMIT_SINGLE_TYPE, PERMIT_DETAILS_TYPE).as_bytes());
	let mut enc = StructEncoder::new();
	enc.push_b256(&type_hash);
	enc.push_b256(&permit_details_hash(&message.details));
	enc.push_address(&message.spender);
	enc.push_u64(nonce);
	enc.push_u64(message.sig_deadline);
	compute_final_digest(domain_hash, &keccak256(enc.finish()))
}

/// Digest of a batch permit under the given domain, binding `nonce`.
///
/// The per-token terms hash as an array of PermitDetails struct hashes.
/// Callers must have checked the batch arrays for consistency.
pub fn permit_batch_digest(domain_hash: &B256, message: &PermitBatch, nonce: u64) -> B256 {
	let type_hash = keccak256(format!("{}{}", PERMIT_BATCH_TYPE, PERMIT_DETAILS_TYPE).as_bytes());

	let mut details = Vec::with_capacity(message.len() * 32);
	for entry in message.entries() {
		details.extend_from_slice(permit_details_hash(&entry).as_slice());
	}
	let details_hash = keccak256(details);

	let mut enc = StructEncoder::new();
	enc.push_b256(&type_hash);
	enc.push_b256(&details_hash);
	enc.push_address(&message.spender);
	enc.push_u64(nonce);
	enc.push_u64(message.sig_deadline);
	compute_final_digest(domain_hash, &keccak256(enc.finish()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{aliases::U160, Address};
	use registry_types::utils::compute_domain_hash;

	fn domain() -> B256 {
		compute_domain_hash("AllowanceRegistry", 1, &Address::repeat_byte(0xdd))
	}

	fn single() -> PermitSingle {
		PermitSingle {
			details: PermitDetails {
				token: Address::repeat_byte(0x10),
				amount: U160::from(100u64),
				expiration: 0,
			},
			spender: Address::repeat_byte(0x02),
			nonce: 0,
			sig_deadline: 1000,
		}
	}

	#[test]
	fn test_digest_is_deterministic() {
		let domain = domain();
		assert_eq!(
			permit_single_digest(&domain, &single(), 0),
			permit_single_digest(&domain, &single(), 0)
		);
	}

	#[test]
	fn test_nonce_changes_digest() {
		let domain = domain();
		assert_ne!(
			permit_single_digest(&domain, &single(), 0),
			permit_single_digest(&domain, &single(), 1)
		);
	}

	#[test]
	fn test_fields_change_digest() {
		let domain = domain();
		let base = permit_single_digest(&domain, &single(), 0);

		let mut other = single();
		other.details.amount = U160::from(101u64);
		assert_ne!(base, permit_single_digest(&domain, &other, 0));

		let mut other = single();
		other.sig_deadline = 1001;
		assert_ne!(base, permit_single_digest(&domain, &other, 0));
	}

	#[test]
	fn test_batch_digest_covers_entries() {
		let domain = domain();
		let message = PermitBatch {
			tokens: vec![Address::repeat_byte(0x10), Address::repeat_byte(0x11)],
			amounts: vec![U160::from(5u64), U160::from(10u64)],
			expirations: vec![0, 0],
			spender: Address::repeat_byte(0x02),
			nonce: 0,
			sig_deadline: 1000,
		};
		let base = permit_batch_digest(&domain, &message, 0);

		let mut reordered = message.clone();
		reordered.tokens.swap(0, 1);
		assert_ne!(base, permit_batch_digest(&domain, &reordered, 0));
	}
}
