//! Wrap-time validation of dual-mode candidates.
//!
//! A dual-mode wrapper injects the reserved flags as keyword arguments, so a
//! wrapped function must not declare parameters with those names. Candidates
//! are described by [`Candidate`]: a plain function signature, a property
//! descriptor (always valid, never inspected), or a value that is not
//! callable at all.
//!
//! Signatures of real Rust functions can be captured with the
//! [`#[dual_async::signature]`](macro@crate::signature) attribute:
//!
//! ```rust
//! use dual_async::flags::ReservedFlags;
//! use dual_async::signature::{validate_wrapped_fn, Candidate};
//!
//! #[dual_async::signature]
//! fn add(a: u32, b: u32) -> u32 {
//!     a + b
//! }
//!
//! let candidate: Candidate = add_signature().into();
//! assert!(validate_wrapped_fn(&candidate, &ReservedFlags::default()).is_ok());
//! ```

use std::fmt;

use tracing::trace;

use crate::error::ValidationError;
use crate::flags::ReservedFlags;

/// Name and declared parameter names of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSignature {
    name: String,
    params: Vec<String>,
}

impl FnSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn from_params<I>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn declares(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }
}

impl fmt::Display for FnSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}({})", self.name, self.params.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    AsyncProperty,
    AsyncCachedProperty,
}

/// A computed (optionally cached) async property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }
}

/// Something offered for dual-mode wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Function(FnSignature),
    Property(PropertyDescriptor),
    /// A non-callable value, kept as its debug rendering
    Value(String),
}

impl Candidate {
    pub fn value(value: impl fmt::Debug) -> Self {
        Candidate::Value(format!("{:?}", value))
    }

    pub fn name(&self) -> &str {
        match self {
            Candidate::Function(signature) => signature.name(),
            Candidate::Property(property) => property.name(),
            Candidate::Value(value) => value,
        }
    }
}

impl From<FnSignature> for Candidate {
    fn from(signature: FnSignature) -> Self {
        Candidate::Function(signature)
    }
}

impl From<PropertyDescriptor> for Candidate {
    fn from(property: PropertyDescriptor) -> Self {
        Candidate::Property(property)
    }
}

/// Ensures `candidate` can be wrapped in dual mode.
///
/// # Errors
///
/// - [`ValidationError::NotCallable`] for [`Candidate::Value`]
/// - [`ValidationError::ReservedFlag`] when the signature declares a
///   parameter named like any reserved flag
pub fn validate_wrapped_fn(
    candidate: &Candidate,
    flags: &ReservedFlags,
) -> Result<(), ValidationError> {
    let signature = match candidate {
        Candidate::Property(_) => return Ok(()),
        Candidate::Value(value) => {
            return Err(ValidationError::NotCallable {
                value: value.clone(),
            })
        }
        Candidate::Function(signature) => signature,
    };

    for flag in flags.iter() {
        if signature.declares(flag) {
            return Err(ValidationError::ReservedFlag {
                callable: signature.to_string(),
                flags: flags.clone(),
            });
        }
    }

    trace!(function = %signature, "signature accepted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_params_are_valid() {
        let f = FnSignature::new("f").with_param("a").with_param("b");
        assert!(validate_wrapped_fn(&f.into(), &ReservedFlags::default()).is_ok());
    }

    #[test]
    fn test_no_params_are_valid() {
        let f = FnSignature::new("ping");
        assert!(validate_wrapped_fn(&f.into(), &ReservedFlags::default()).is_ok());
    }

    #[test]
    fn test_reserved_param_is_rejected() {
        let flags = ReservedFlags::default();
        let g = FnSignature::from_params("g", ["sync"]);

        let err = validate_wrapped_fn(&g.into(), &flags).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ReservedFlag {
                callable: "fn g(sync)".to_string(),
                flags: flags.clone(),
            }
        );

        let message = err.to_string();
        assert!(message.contains("fn g(sync)"));
        assert!(message.contains("{asynchronous, sync}"));
    }

    #[test]
    fn test_negative_flag_param_is_rejected() {
        let h = FnSignature::from_params("h", ["x", "asynchronous"]);
        assert!(matches!(
            validate_wrapped_fn(&h.into(), &ReservedFlags::default()),
            Err(ValidationError::ReservedFlag { .. })
        ));
    }

    #[test]
    fn test_custom_flag_set() {
        let flags = ReservedFlags::new(["blocking"], ["deferred"]);
        let uses_sync = FnSignature::from_params("f", ["sync"]);
        let uses_blocking = FnSignature::from_params("f", ["blocking"]);

        assert!(validate_wrapped_fn(&uses_sync.into(), &flags).is_ok());
        assert!(validate_wrapped_fn(&uses_blocking.into(), &flags).is_err());
    }

    #[test]
    fn test_non_callable_is_rejected() {
        let err = validate_wrapped_fn(&Candidate::value(42), &ReservedFlags::default())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotCallable {
                value: "42".to_string()
            }
        );
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_property_descriptors_skip_inspection() {
        let flags = ReservedFlags::default();
        // Named like a reserved flag on purpose: properties are never inspected.
        for kind in [PropertyKind::AsyncProperty, PropertyKind::AsyncCachedProperty] {
            let property = PropertyDescriptor::new("sync", kind);
            assert!(validate_wrapped_fn(&property.into(), &flags).is_ok());
        }
    }

    #[test]
    fn test_candidate_names() {
        assert_eq!(Candidate::from(FnSignature::new("f")).name(), "f");
        assert_eq!(
            Candidate::from(PropertyDescriptor::new("total", PropertyKind::AsyncProperty)).name(),
            "total"
        );
        assert_eq!(Candidate::value("text").name(), "\"text\"");
    }
}
