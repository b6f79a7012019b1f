//! Shared fixtures for registry tests.
//!
//! State-machine tests run against a mock verification oracle so they do
//! not depend on real cryptography; permit round-trip and replay tests use
//! the real secp256k1 verifier with locally generated keys.

use crate::{AllowanceRegistry, TokenError, TokenTransfer};
use alloy_primitives::{aliases::U160, Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use registry_config::DomainConfig;
use registry_state::{implementations::memory::MemoryState, StateService};
use registry_types::{ConfigSchema, Schema, Signature, ValidationError};
use registry_verifier::{
	implementations::ecdsa::EcdsaVerifier, VerifierError, VerifierInterface, VerifierService,
};
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) const OWNER: Address = Address::repeat_byte(0x01);
pub(crate) const SPENDER: Address = Address::repeat_byte(0x02);
pub(crate) const RECIPIENT: Address = Address::repeat_byte(0x03);
pub(crate) const TOKEN_A: Address = Address::repeat_byte(0x10);
pub(crate) const TOKEN_B: Address = Address::repeat_byte(0x11);

fn domain() -> DomainConfig {
	DomainConfig {
		name: registry_types::utils::DOMAIN_NAME.to_string(),
		chain_id: 1,
		verifying_contract: Address::repeat_byte(0xdd),
	}
}

struct EmptySchema;

impl ConfigSchema for EmptySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Oracle that recovers a fixed identity regardless of digest.
pub(crate) struct MockVerifier {
	identity: Address,
}

#[async_trait]
impl VerifierInterface for MockVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(EmptySchema)
	}

	async fn recover(
		&self,
		_digest: B256,
		_signature: &Signature,
	) -> Result<Address, VerifierError> {
		Ok(self.identity)
	}
}

/// Capability that records movements and optionally fails one token.
pub(crate) struct MockToken {
	pub calls: Mutex<Vec<(Address, Address, Address, U160)>>,
	fail_token: Option<Address>,
}

impl MockToken {
	pub(crate) fn new() -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			fail_token: None,
		}
	}
}

#[async_trait]
impl TokenTransfer for MockToken {
	async fn transfer(
		&self,
		token: Address,
		from: Address,
		to: Address,
		amount: U160,
	) -> Result<(), TokenError> {
		if self.fail_token == Some(token) {
			return Err(TokenError::TransferFailed("mock token failure".into()));
		}
		self.calls.lock().await.push((token, from, to, amount));
		Ok(())
	}
}

type Fixture = (AllowanceRegistry, Arc<MockToken>, Arc<StateService>);

fn build(verifier: Box<dyn VerifierInterface>, fail_token: Option<Address>) -> Fixture {
	let token = Arc::new(MockToken {
		fail_token,
		..MockToken::new()
	});
	let state = Arc::new(StateService::new(Box::new(MemoryState::new())));
	let registry = AllowanceRegistry::new(
		domain(),
		state.clone(),
		Arc::new(VerifierService::new(verifier)),
		token.clone(),
	);
	(registry, token, state)
}

/// Registry whose oracle always recovers `identity`.
pub(crate) fn mock_registry(identity: Address) -> Fixture {
	build(Box::new(MockVerifier { identity }), None)
}

/// Registry with real secp256k1 recovery.
pub(crate) fn ecdsa_registry() -> Fixture {
	build(Box::new(EcdsaVerifier), None)
}

/// Registry whose token capability fails movements of `fail_token`.
pub(crate) fn failing_registry(identity: Address, fail_token: Address) -> Fixture {
	build(Box::new(MockVerifier { identity }), Some(fail_token))
}

/// Sign a digest the way EVM wallets sign EIP-712 prehashes.
pub(crate) fn sign_digest(signer: &PrivateKeySigner, digest: B256) -> Signature {
	let signed = signer.sign_hash_sync(&digest).expect("signing succeeds");
	Signature(signed.as_bytes().to_vec())
}
