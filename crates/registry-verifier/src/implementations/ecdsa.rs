//! secp256k1 signature recovery.
//!
//! Recovers the signer address from 65-byte r || s || v signatures over a
//! 32-byte prehash, matching what EVM wallets produce for EIP-712 digests.

use crate::{VerifierError, VerifierInterface};
use alloy_primitives::{Address, PrimitiveSignature, B256};
use async_trait::async_trait;
use registry_types::{ConfigSchema, Schema, Signature, ValidationError};

/// ECDSA verifier over the secp256k1 curve.
pub struct EcdsaVerifier;

#[async_trait]
impl VerifierInterface for EcdsaVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(EcdsaVerifierSchema)
	}

	async fn recover(
		&self,
		digest: B256,
		signature: &Signature,
	) -> Result<Address, VerifierError> {
		let parsed = PrimitiveSignature::try_from(signature.as_slice())
			.map_err(|e| VerifierError::MalformedSignature(e.to_string()))?;
		parsed
			.recover_address_from_prehash(&digest)
			.map_err(|e| VerifierError::RecoveryFailed(e.to_string()))
	}
}

/// Configuration schema for EcdsaVerifier.
pub struct EcdsaVerifierSchema;

impl ConfigSchema for EcdsaVerifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// The curve implementation has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create an ECDSA verifier from configuration.
///
/// Configuration parameters:
/// - None required
pub fn create_verifier(
	_config: &toml::Value,
) -> Result<Box<dyn VerifierInterface>, VerifierError> {
	Ok(Box::new(EcdsaVerifier))
}

/// Registry entry for the ECDSA verifier.
pub struct Registry;

impl registry_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "ecdsa";
	type Factory = crate::VerifierFactory;

	fn factory() -> Self::Factory {
		create_verifier
	}
}

impl crate::VerifierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;

	#[tokio::test]
	async fn test_recovers_signer_address() {
		let signer = PrivateKeySigner::random();
		let digest = B256::repeat_byte(0x42);
		let signed = signer.sign_hash_sync(&digest).unwrap();

		let verifier = EcdsaVerifier;
		let recovered = verifier
			.recover(digest, &Signature(signed.as_bytes().to_vec()))
			.await
			.unwrap();
		assert_eq!(recovered, signer.address());
	}

	#[tokio::test]
	async fn test_different_digest_recovers_different_identity() {
		let signer = PrivateKeySigner::random();
		let digest = B256::repeat_byte(0x42);
		let signed = signer.sign_hash_sync(&digest).unwrap();

		let verifier = EcdsaVerifier;
		let other = verifier
			.recover(B256::repeat_byte(0x43), &Signature(signed.as_bytes().to_vec()))
			.await;
		// Recovery over a different digest either fails outright or yields
		// some unrelated address; it must not yield the signer.
		if let Ok(address) = other {
			assert_ne!(address, signer.address());
		}
	}

	#[tokio::test]
	async fn test_malformed_signature_is_rejected() {
		let verifier = EcdsaVerifier;
		let result = verifier
			.recover(B256::repeat_byte(0x42), &Signature(vec![0u8; 10]))
			.await;
		assert!(matches!(result, Err(VerifierError::MalformedSignature(_))));
	}
}
