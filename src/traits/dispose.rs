//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Components that also call [`TypePlan::disposable`](crate::TypePlan::disposable)
/// have every instance the container builds tracked by the constructor that
/// built it. Disposing the container runs the hooks in LIFO order.
///
/// # Examples
///
/// ```
/// use autowire::{Component, Container, Dispose, Resolver, TypePlan};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// static FLUSHED: AtomicBool = AtomicBool::new(false);
///
/// #[derive(Default)]
/// struct Cache;
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         FLUSHED.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Component for Cache {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.default_constructor().disposable();
///     }
/// }
///
/// let container = Container::new();
/// container.register().type_of::<Cache>().unwrap();
/// container.resolve_required::<Cache>(&[]).unwrap();
///
/// container.dispose();
/// assert!(FLUSHED.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
