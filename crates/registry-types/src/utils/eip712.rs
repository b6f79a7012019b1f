//! Generic EIP-712 utilities shared across the registry.
//!
//! These helpers provide:
//! - The registry's typed-data strings and signing-domain name
//! - Domain hash computation
//! - Final digest computation (0x1901 || domainHash || structHash)
//! - A minimal ABI encoder for the static field types the permit structs use

use alloy_primitives::{aliases::U160, keccak256, Address, B256};

/// EIP-712 domain type. Binds chain identity and the registry's own contract
/// identity into every signed digest.
pub const DOMAIN_TYPE: &str = "EIP712Domain(string name,uint256 chainId,address verifyingContract)";

/// Signing-domain name. Compatibility-relevant: external signing tooling must
/// use the same name or digests will not match.
pub const DOMAIN_NAME: &str = "AllowanceRegistry";

/// Per-token permit terms.
pub const PERMIT_DETAILS_TYPE: &str =
	"PermitDetails(address token,uint160 amount,uint48 expiration)";

/// Single-token permit message.
pub const PERMIT_SINGLE_TYPE: &str =
	"PermitSingle(PermitDetails details,address spender,uint256 nonce,uint256 sigDeadline)";

/// Batch permit message over an array of per-token terms.
pub const PERMIT_BATCH_TYPE: &str =
	"PermitBatch(PermitDetails[] details,address spender,uint256 nonce,uint256 sigDeadline)";

/// Compute the EIP-712 domain hash
/// (keccak256(abi.encode(typeHash, nameHash, chainId, verifyingContract))).
pub fn compute_domain_hash(name: &str, chain_id: u64, verifying_contract: &Address) -> B256 {
	let domain_type_hash = keccak256(DOMAIN_TYPE.as_bytes());
	let name_hash = keccak256(name.as_bytes());
	let mut enc = StructEncoder::new();
	enc.push_b256(&domain_type_hash);
	enc.push_b256(&name_hash);
	enc.push_u64(chain_id);
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for static types used in EIP-712 struct hashing.
///
/// Every push appends one left-padded 32-byte word.
pub struct StructEncoder {
	buf: Vec<u8>,
}

impl Default for StructEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl StructEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u160(&mut self, v: U160) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(&v.to_be_bytes::<20>());
		self.buf.extend_from_slice(&word);
	}

	/// Encode a scalar into the low 8 bytes of a word. Covers the uint48 and
	/// uint256 scalar fields of the permit structs.
	pub fn push_u64(&mut self, v: u64) {
		let mut word = [0u8; 32];
		word[24..].copy_from_slice(&v.to_be_bytes());
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
