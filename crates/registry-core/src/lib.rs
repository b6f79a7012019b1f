//! Core state machine for the allowance registry.
//!
//! This module provides the [`AllowanceRegistry`] engine, coordinating the
//! state backend, the signature-verification oracle, and the external
//! token-movement capability to implement the allowance lifecycle:
//!
//! - direct approval and signature-authenticated permits (single and batch)
//! - delegated transfers that consume allowances
//! - owner-initiated lockdown and capped nonce invalidation
//!
//! Every operation either commits as a whole or leaves state untouched;
//! failures are distinguishable by kind so callers can present actionable
//! messages.

use alloy_primitives::aliases::U160;
use registry_state::StateError;
use thiserror::Error;

pub mod builder;
pub mod digest;
mod nonce;
mod permit;
mod registry;
mod transfer;

#[cfg(test)]
pub(crate) mod test_util;

pub use builder::{BuilderError, RegistryBuilder};
pub use nonce::MAX_NONCE_INVALIDATION;
pub use registry::AllowanceRegistry;
pub use transfer::{TokenError, TokenTransfer};

/// Errors that can occur during registry operations.
///
/// Every failure aborts the whole call with no state change.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// The recovered signer is zero or does not match the claimed owner.
	#[error("Invalid signer")]
	InvalidSigner,
	/// The signature deadline has passed.
	#[error("Signature expired at {deadline}")]
	SignatureExpired { deadline: u64 },
	/// The allowance record has passed its expiration.
	#[error("Allowance expired at {expiration}")]
	AllowanceExpired { expiration: u64 },
	/// The requested amount exceeds the remaining allowance.
	#[error("Insufficient allowance: {available} available, {requested} requested")]
	InsufficientAllowance { available: U160, requested: U160 },
	/// A nonce invalidation asked to skip more values than the cap allows.
	#[error("Excessive invalidation: count {count} exceeds cap")]
	ExcessiveInvalidation { count: u64 },
	/// A nonce counter cannot advance without overflowing.
	#[error("Nonce counter overflow")]
	NonceOverflow,
	/// Batch permit arrays disagree in length.
	#[error("Malformed batch: {tokens} tokens, {amounts} amounts, {expirations} expirations")]
	MalformedBatch {
		tokens: usize,
		amounts: usize,
		expirations: usize,
	},
	/// Error from the state backend.
	#[error("State error: {0}")]
	State(#[from] StateError),
	/// Failure reported by the external token capability.
	#[error("Token transfer failed: {0}")]
	Token(#[from] TokenError),
}
