//! Utility functions shared across the registry.

/// EIP-712 hashing primitives and the registry's typed-data strings.
pub mod eip712;
/// Small shared helpers (timestamps, log formatting).
pub mod helpers;

pub use eip712::{
	compute_domain_hash, compute_final_digest, StructEncoder, DOMAIN_NAME, DOMAIN_TYPE,
	PERMIT_BATCH_TYPE, PERMIT_DETAILS_TYPE, PERMIT_SINGLE_TYPE,
};
pub use helpers::current_timestamp;
