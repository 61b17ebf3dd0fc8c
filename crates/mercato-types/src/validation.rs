//! Configuration validation framework for TOML sections.
//!
//! Infrastructure implementations each declare a schema for their own
//! configuration table; the builder validates the raw `toml::Value` against
//! it before constructing the implementation. Schemas can nest for
//! hierarchical sections.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A float with optional inclusive bounds.
	Float { min: Option<f64>, max: Option<f64> },
	/// A boolean value.
	Boolean,
	/// A nested table with its own schema.
	Table(Schema),
}

/// Custom validator run after type checking.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// One field of a configuration schema.
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
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator that receives the field's value and returns
	/// an error message when it is unacceptable.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// A validation schema: fields that must be present plus fields that may be.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema: presence of required
	/// fields, types of all fields, then custom validators.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(&field.name, value, field)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(&field.name, value, field)?;
			}
		}

		Ok(())
	}
}

fn check_field(name: &str, value: &toml::Value, field: &Field) -> Result<(), ValidationError> {
	validate_field_type(name, value, &field.field_type)?;
	if let Some(validator) = &field.validator {
		validator(value).map_err(|msg| ValidationError::InvalidValue {
			field: name.to_string(),
			message: msg,
		})?;
	}
	Ok(())
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			check_bounds(field_name, int_val as f64, min.map(|m| m as f64), max.map(|m| m as f64))?;
		},
		FieldType::Float { min, max } => {
			// Integers are acceptable where floats are expected.
			let float_val = value
				.as_float()
				.or_else(|| value.as_integer().map(|i| i as f64))
				.ok_or_else(|| mismatch("float"))?;
			check_bounds(field_name, float_val, *min, *max)?;
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		},
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| prefix_field(field_name, e))?;
		},
	}

	Ok(())
}

fn check_bounds(
	field_name: &str,
	value: f64,
	min: Option<f64>,
	max: Option<f64>,
) -> Result<(), ValidationError> {
	if let Some(min_val) = min {
		if value < min_val {
			return Err(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is less than minimum {}", value, min_val),
			});
		}
	}
	if let Some(max_val) = max {
		if value > max_val {
			return Err(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is greater than maximum {}", value, max_val),
			});
		}
	}
	Ok(())
}

fn prefix_field(prefix: &str, e: ValidationError) -> ValidationError {
	match e {
		ValidationError::MissingField(f) => {
			ValidationError::MissingField(format!("{}.{}", prefix, f))
		},
		ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
			field: format!("{}.{}", prefix, field),
			message,
		},
		ValidationError::TypeMismatch {
			field,
			expected,
			actual,
		} => ValidationError::TypeMismatch {
			field: format!("{}.{}", prefix, field),
			expected,
			actual,
		},
	}
}

/// Trait for polymorphic configuration schemas, used by pluggable
/// implementations to expose their own requirements.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
