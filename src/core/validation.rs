//! core::validation
//!
//! Field-level validation that collects every violation instead of failing
//! on the first one.
//!
//! # Design
//!
//! A [`Validator`] is created per top-level struct. Each violation records
//! the struct name, a dot-joined field path, an optional offending value
//! and its [`ErrorKind`]. [`Validator::error`] collapses the violations:
//! none is `Ok(())`, one is returned as-is, several become an
//! [`Error::Multi`].
//!
//! Nested structs implement [`ValidateFields`] and are validated with
//! [`Validator::nested`], which prefixes every field path they record.
//!
//! # Example
//!
//! ```
//! use forgestate::core::errors::ErrorKind;
//! use forgestate::core::validation::Validator;
//!
//! let mut v = Validator::new("DeployKey");
//! v.required(&["info", "name"]);
//! v.invalid("", &["info", "key"]);
//!
//! let err = v.error().unwrap_err();
//! assert!(err.is(ErrorKind::FieldRequired));
//! assert!(err.is(ErrorKind::FieldInvalid));
//! ```

use std::fmt;

use super::errors::{Error, ErrorKind, Result};

/// Implemented by structs that can validate themselves into a parent
/// [`Validator`].
///
/// Implementations record paths relative to themselves; the parent's
/// [`Validator::nested`] call supplies the prefix.
pub trait ValidateFields {
    /// Record every violation of `self` into `v`.
    fn validate_fields(&self, v: &mut Validator);
}

impl<T: ValidateFields + ?Sized> ValidateFields for &T {
    fn validate_fields(&self, v: &mut Validator) {
        (**self).validate_fields(v)
    }
}

/// Accumulates field violations for one top-level struct.
#[derive(Debug, Clone)]
pub struct Validator {
    struct_name: String,
    prefix: Vec<String>,
    errors: Vec<Error>,
}

impl Validator {
    /// Start validating the struct called `struct_name`.
    pub fn new(struct_name: impl Into<String>) -> Self {
        Self {
            struct_name: struct_name.into(),
            prefix: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record a missing required field.
    pub fn required(&mut self, path: &[&str]) {
        self.append(ErrorKind::FieldRequired, None::<&str>, path);
    }

    /// Record an invalid field value.
    pub fn invalid(&mut self, value: impl fmt::Debug, path: &[&str]) {
        self.append(ErrorKind::FieldInvalid, Some(value), path);
    }

    /// Record a value outside the field's enumeration.
    pub fn enum_invalid(&mut self, value: impl fmt::Debug, path: &[&str]) {
        self.append(ErrorKind::FieldEnumInvalid, Some(value), path);
    }

    /// Record a violation of any kind.
    pub fn append<V: fmt::Debug>(&mut self, kind: ErrorKind, value: Option<V>, path: &[&str]) {
        let field = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(path.iter().copied())
            .collect::<Vec<_>>()
            .join(".");

        self.errors.push(Error::Validation {
            kind,
            struct_name: self.struct_name.clone(),
            field,
            value: value.map(|v| format!("{:?}", v)),
        });
    }

    /// Validate a nested struct under `field`.
    pub fn nested<T: ValidateFields + ?Sized>(&mut self, field: &str, target: &T) {
        self.prefix.push(field.to_string());
        target.validate_fields(self);
        self.prefix.pop();
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The struct name this validator reports against.
    pub fn struct_name(&self) -> &str {
        &self.struct_name
    }

    /// `Ok(())` if nothing was recorded, the single error if exactly one,
    /// otherwise a multi-error.
    pub fn error(&self) -> Result<()> {
        match Error::from_errors(self.errors.clone()) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Consume the validator, returning the same as [`Validator::error`].
    pub fn into_result(self) -> Result<()> {
        match Error::from_errors(self.errors) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
