//! Error types for the autowire container.

use thiserror::Error;

/// Errors raised while configuring, registering or resolving components.
///
/// Failures fall into three families that callers usually want to tell
/// apart: registration problems ([`DiError::Registration`]), configuration
/// problems ([`DiError::Configuration`]) and resolution problems (every
/// other variant except [`DiError::Disposed`]).
///
/// # Examples
///
/// ```rust
/// use autowire::{Container, DiError, Resolver};
///
/// let container = Container::strict();
/// match container.resolve::<String>(&[]) {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use autowire::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// assert!(circular.is_resolution());
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// A type or instance could not be registered.
    #[error("Registration of '{type_name}' failed: {message}")]
    Registration {
        type_name: &'static str,
        message: String,
    },
    /// A configuration handle was requested or used in an invalid way.
    #[error("Configuration of '{type_name}' failed: {message}")]
    Configuration {
        type_name: &'static str,
        message: String,
    },
    /// No registration matched the request (strict containers only).
    #[error("The type '{0}' can not be resolved. Maybe constructor arguments are not given as expected?")]
    NotFound(&'static str),
    /// More than one implicit registration matched and none was explicit.
    #[error("{count} possible resolves were found for '{type_name}'")]
    Ambiguous { type_name: &'static str, count: usize },
    /// A nested dependency, member or argument could not be satisfied.
    #[error("Resolution of '{type_name}' failed: {message}")]
    Resolution {
        type_name: &'static str,
        message: String,
    },
    /// A resolved value could not be viewed as the requested type.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// The container was disposed before the operation.
    #[error("The container has already been disposed")]
    Disposed,
}

impl DiError {
    pub(crate) fn registration(type_name: &'static str, message: impl Into<String>) -> Self {
        DiError::Registration {
            type_name,
            message: message.into(),
        }
    }

    pub(crate) fn configuration(type_name: &'static str, message: impl Into<String>) -> Self {
        DiError::Configuration {
            type_name,
            message: message.into(),
        }
    }

    pub(crate) fn resolution(type_name: &'static str, message: impl Into<String>) -> Self {
        DiError::Resolution {
            type_name,
            message: message.into(),
        }
    }

    /// Returns `true` for registration failures.
    pub fn is_registration(&self) -> bool {
        matches!(self, DiError::Registration { .. })
    }

    /// Returns `true` for configuration failures.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DiError::Configuration { .. })
    }

    /// Returns `true` for every failure that happened while resolving.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            DiError::NotFound(_)
                | DiError::Ambiguous { .. }
                | DiError::Resolution { .. }
                | DiError::TypeMismatch(_)
                | DiError::Circular(_)
                | DiError::DepthExceeded(_)
        )
    }
}

/// Result type for container operations
///
/// ```rust
/// use autowire::{DiError, DiResult};
///
/// fn lookup(found: bool) -> DiResult<u32> {
///     if found { Ok(7) } else { Err(DiError::NotFound("u32")) }
/// }
///
/// assert_eq!(lookup(true).unwrap(), 7);
/// assert!(lookup(false).is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
