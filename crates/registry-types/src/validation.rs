//! Configuration validation utilities for the allowance registry.
//!
//! This module provides a small framework for validating the TOML
//! configuration of pluggable backends: a schema of required and optional
//! fields, per-field type checks, and optional custom validators.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}")]
	TypeMismatch { field: String, expected: String },
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional minimum and maximum bounds.
	Integer {
		/// Minimum allowed value (inclusive).
		min: Option<i64>,
		/// Maximum allowed value (inclusive).
		max: Option<i64>,
	},
	/// A nested table with its own schema.
	Table(Schema),
}

/// Type alias for field validator functions.
///
/// Validators perform additional checks beyond type checking. They receive
/// the field's TOML value and return an error message if validation fails.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn validate(&self, value: &toml::Value) -> Result<(), ValidationError> {
		match &self.field_type {
			FieldType::String => {
				if !value.is_str() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "string".into(),
					});
				}
			}
			FieldType::Integer { min, max } => {
				let n = value
					.as_integer()
					.ok_or_else(|| ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "integer".into(),
					})?;
				if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
					return Err(ValidationError::InvalidValue {
						field: self.name.clone(),
						message: format!("{} is out of range", n),
					});
				}
			}
			FieldType::Table(schema) => {
				if !value.is_table() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "table".into(),
					});
				}
				schema.validate(value)?;
			}
		}
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Defines a validation schema for TOML configuration.
///
/// A schema consists of required fields that must be present and optional
/// fields that may be present. Schemas nest through [`FieldType::Table`].
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Checks that all required fields are present, validates field types,
	/// runs custom validators, and recursively validates nested tables.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		for field in &self.required {
			match config.get(&field.name) {
				Some(value) => field.validate(value)?,
				None => return Err(ValidationError::MissingField(field.name.clone())),
			}
		}
		for field in &self.optional {
			if let Some(value) = config.get(&field.name) {
				field.validate(value)?;
			}
		}
		Ok(())
	}
}

/// Trait implemented by backend configuration schemas.
///
/// Each pluggable implementation exposes its own schema so the builder can
/// validate the corresponding TOML section before wiring the backend in.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
