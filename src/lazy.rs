//! Deferred resolution handles: [`Func`] and [`TypedResolver`].
//!
//! Both hold a weak reference to the container that built them, so a
//! singleton keeping one alive never keeps its own container alive.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arg::Arg;
use crate::container::{Container, WeakContainer};
use crate::descriptors::{Component, Param, TypePlan};
use crate::error::{DiError, DiResult};
use crate::traits::Resolver;

/// A factory that resolves `T` each time it is called.
///
/// Injected for parameters declared with [`Param::lazy`]. The registration
/// name the parameter was injected under is carried along.
pub struct Func<T: ?Sized> {
    container: WeakContainer,
    name: Arc<str>,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Func<T> {
    pub(crate) fn new(container: WeakContainer, name: Arc<str>) -> Self {
        Self {
            container,
            name,
            _target: PhantomData,
        }
    }

    fn container(&self) -> DiResult<Container> {
        self.container.upgrade().ok_or(DiError::Disposed)
    }

    /// Resolves a `T`.
    pub fn call(&self) -> DiResult<Option<Arc<T>>> {
        self.container()?.resolve_by_name::<T>(&self.name, &[])
    }

    /// Resolves a `T` with one user-provided argument.
    pub fn call_with(&self, arg: Arg) -> DiResult<Option<Arc<T>>> {
        self.container()?.resolve_by_name::<T>(&self.name, &[arg])
    }
}

impl<T: ?Sized> fmt::Debug for Func<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("target", &std::any::type_name::<T>())
            .field("name", &self.name)
            .finish()
    }
}

/// A resolver restricted to `T`, for components that resolve on demand.
///
/// The container registers one as a singleton the first time a component
/// declares it as a dependency.
pub struct TypedResolver<T: ?Sized> {
    container: WeakContainer,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> TypedResolver<T> {
    /// Wraps `container`.
    pub fn new(container: &Container) -> Self {
        Self {
            container: container.downgrade(),
            _target: PhantomData,
        }
    }

    fn container(&self) -> DiResult<Container> {
        self.container.upgrade().ok_or(DiError::Disposed)
    }

    pub fn resolve(&self, args: &[Arg]) -> DiResult<Option<Arc<T>>> {
        self.container()?.resolve::<T>(args)
    }

    pub fn resolve_by_name(&self, name: &str, args: &[Arg]) -> DiResult<Option<Arc<T>>> {
        self.container()?.resolve_by_name::<T>(name, args)
    }

    /// Resolves `U` through the same container, typically a type related to `T`.
    pub fn resolve_as<U: ?Sized + 'static>(&self, args: &[Arg]) -> DiResult<Option<Arc<U>>> {
        self.container()?.resolve::<U>(args)
    }

    pub fn resolve_all(&self, args: &[Arg]) -> DiResult<Vec<Arc<T>>> {
        self.container()?.resolve_all::<T>(args)
    }

    pub fn resolve_all_by_name(&self, name: &str, args: &[Arg]) -> DiResult<Vec<Arc<T>>> {
        self.container()?.resolve_all_by_name::<T>(name, args)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Component for TypedResolver<T> {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![Param::of::<Container>("container")], |values| {
            let container = values.get::<Container>(0)?;
            Ok(TypedResolver::new(&container))
        });
    }
}

impl<T: ?Sized> fmt::Debug for TypedResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedResolver")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}
