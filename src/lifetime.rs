//! Instance lifetimes.

/// How long a constructed instance is reused.
///
/// - **Transient**: a fresh instance on every resolution (the default)
/// - **Singleton**: one instance per registration, shared by every thread
///   and every child container that resolves through it
/// - **SingletonPerThread**: one instance per registration and thread
///
/// # Examples
///
/// ```rust
/// use autowire::{Component, Container, Resolver, Scope, TypePlan};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Clock;
///
/// impl Component for Clock {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.default_constructor();
///     }
/// }
///
/// let container = Container::new();
/// container.register().type_of::<Clock>().unwrap().with_scope(Scope::Singleton);
///
/// let a = container.resolve_required::<Clock>(&[]).unwrap();
/// let b = container.resolve_required::<Clock>(&[]).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Scope {
    /// New instance per resolution.
    #[default]
    #[cfg_attr(feature = "config", serde(alias = "instance"))]
    Transient,
    /// Single instance per registration.
    Singleton,
    /// Single instance per registration and thread.
    #[cfg_attr(feature = "config", serde(alias = "singleton_per_thread", alias = "perthread"))]
    SingletonPerThread,
}

impl Scope {
    /// Whether instances are cached at all.
    pub fn is_cached(&self) -> bool {
        !matches!(self, Scope::Transient)
    }
}
