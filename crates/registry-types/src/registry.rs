//! Registry trait for self-registering implementations.
//!
//! This module provides the base trait that pluggable backends implement to
//! register themselves with their configuration name and factory function.

/// Base trait for implementation registries.
///
/// Each backend module (state, verifier) must provide a Registry struct that
/// implements this trait, so the builder can resolve the implementation
/// named in configuration to a factory without hard-coding the wiring.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "memory" for state.implementations.memory
	/// - "file" for state.implementations.file
	/// - "ecdsa" for verifier.implementations.ecdsa
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	///
	/// Each module defines its own factory type, for example StateFactory
	/// for state backends and VerifierFactory for verifier backends.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
