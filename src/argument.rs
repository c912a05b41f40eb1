//! Configured constructor and method arguments.
//!
//! An [`Argument`] overrides how one named parameter is satisfied. Without
//! one, a parameter is resolved from the container by its declared type.

use std::fmt;
use std::sync::Arc;

use crate::arg::Arg;
use crate::descriptors::{DependencySpec, Param};
use crate::key::TypeTag;

#[derive(Clone)]
pub(crate) enum ArgumentKind {
    Fixed(Arg),
    UserProvided,
    Named(Arc<str>),
    UseType(TypeTag, Arc<str>),
}

/// Override for one named parameter.
///
/// ```rust
/// use autowire::Argument;
///
/// let port = Argument::fixed_value("port", 8080u16);
/// let user = Argument::user_provided("name");
/// let backup = Argument::named("store", "backup");
///
/// assert_eq!(port.name(), "port");
/// assert!(user.is_user_provided());
/// assert!(!backup.is_user_provided());
/// ```
#[derive(Clone)]
pub struct Argument {
    name: String,
    kind: ArgumentKind,
}

impl Argument {
    /// Always pass `value`.
    pub fn fixed(name: impl Into<String>, value: impl Into<Arg>) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Fixed(value.into()),
        }
    }

    /// Always pass a plain `value`.
    pub fn fixed_value<T: Send + Sync + 'static>(name: impl Into<String>, value: T) -> Self {
        Self::fixed(name, Arg::value(value))
    }

    /// Always pass a typed null.
    pub fn null<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::fixed(name, Arg::null::<T>())
    }

    /// The caller supplies this parameter at resolution time.
    pub fn user_provided(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::UserProvided,
        }
    }

    /// Resolve the declared type under a registration name.
    pub fn named(name: impl Into<String>, injected_name: &str) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Named(Arc::from(injected_name)),
        }
    }

    /// Resolve `T` instead of the declared type.
    pub fn use_type<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::use_named_type::<T>(name, "")
    }

    /// Resolve `T` under a registration name instead of the declared type.
    pub fn use_named_type<T: ?Sized + 'static>(name: impl Into<String>, injected_name: &str) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::UseType(TypeTag::of::<T>(), Arc::from(injected_name)),
        }
    }

    /// Name of the parameter this argument applies to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller supplies the value.
    pub fn is_user_provided(&self) -> bool {
        matches!(self.kind, ArgumentKind::UserProvided)
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ArgumentKind::Fixed(_) => "fixed",
            ArgumentKind::UserProvided => "user-provided",
            ArgumentKind::Named(_) => "named",
            ArgumentKind::UseType(..) => "use-type",
        };
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// How a compiled parameter obtains its value.
#[derive(Clone, Debug)]
pub enum ResolutionMode {
    /// A configured constant.
    Fixed(Arg),
    /// The declared type under a registration name.
    Named(Arc<str>),
    /// Another type, optionally named.
    TypeOverride(TypeTag, Arc<str>),
    /// Consumed from the caller's arguments, in order.
    UserProvided,
    /// The declared type, unnamed.
    AutoInjected,
}

/// A parameter bound to its resolution mode at registration time.
#[derive(Clone)]
pub(crate) struct Parameter {
    pub(crate) name: &'static str,
    pub(crate) dependency: DependencySpec,
    pub(crate) mode: ResolutionMode,
}

impl Parameter {
    pub(crate) fn compile(param: &Param, argument: Option<&Argument>) -> Self {
        let mode = match argument.map(|a| &a.kind) {
            None => ResolutionMode::AutoInjected,
            Some(ArgumentKind::Fixed(arg)) => ResolutionMode::Fixed(arg.clone()),
            Some(ArgumentKind::UserProvided) => ResolutionMode::UserProvided,
            Some(ArgumentKind::Named(name)) if name.is_empty() => ResolutionMode::AutoInjected,
            Some(ArgumentKind::Named(name)) => ResolutionMode::Named(name.clone()),
            Some(ArgumentKind::UseType(tag, name)) => ResolutionMode::TypeOverride(*tag, name.clone()),
        };
        Self {
            name: param.name(),
            dependency: param.dependency().clone(),
            mode,
        }
    }

    pub(crate) fn declared(&self) -> TypeTag {
        self.dependency.tag
    }

    pub(crate) fn is_user_provided(&self) -> bool {
        matches!(self.mode, ResolutionMode::UserProvided)
    }
}
