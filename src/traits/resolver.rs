//! Resolver traits for component resolution.

use std::any::type_name;
use std::sync::Arc;

use crate::arg::{Arg, Object};
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;

/// Object-safe resolution over type-erased [`Object`]s.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed methods built on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single value of type `ty` registered under `name`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(object))` - The resolved value
    /// * `Ok(None)` - Nothing matched and the container is lenient
    /// * `Err(DiError)` - Nothing matched in a strict container, the match
    ///   was ambiguous, or building the value failed
    fn resolve_object(&self, name: &str, ty: TypeTag, args: &[Arg]) -> DiResult<Option<Object>>;

    /// Builds every provider registered under the exact key, in table order.
    fn resolve_all_objects(&self, name: &str, ty: TypeTag, args: &[Arg]) -> DiResult<Vec<Object>>;
}

/// Typed resolution.
///
/// # Examples
///
/// ```
/// use autowire::{Container, Object, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn hello(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn hello(&self) -> String { "hello".into() } }
///
/// let container = Container::new();
/// container.register().shared::<dyn Greeter>(Arc::new(English)).unwrap();
///
/// let greeter = container.resolve_required::<dyn Greeter>(&[]).unwrap();
/// assert_eq!(greeter.hello(), "hello");
/// assert!(container.resolve::<String>(&[]).unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves an unnamed `T`.
    fn resolve<T: ?Sized + 'static>(&self, args: &[Arg]) -> DiResult<Option<Arc<T>>> {
        self.resolve_by_name::<T>("", args)
    }

    /// Resolves a `T` registered under `name`.
    fn resolve_by_name<T: ?Sized + 'static>(&self, name: &str, args: &[Arg]) -> DiResult<Option<Arc<T>>> {
        match self.resolve_object(name, TypeTag::of::<T>(), args)? {
            Some(object) => object
                .downcast::<T>()
                .map(Some)
                .ok_or(DiError::TypeMismatch(type_name::<T>())),
            None => Ok(None),
        }
    }

    /// Resolves an unnamed `T`, turning a lenient miss into [`DiError::NotFound`].
    fn resolve_required<T: ?Sized + 'static>(&self, args: &[Arg]) -> DiResult<Arc<T>> {
        self.resolve_required_by_name::<T>("", args)
    }

    /// Resolves a named `T`, turning a lenient miss into [`DiError::NotFound`].
    fn resolve_required_by_name<T: ?Sized + 'static>(&self, name: &str, args: &[Arg]) -> DiResult<Arc<T>> {
        self.resolve_by_name::<T>(name, args)?
            .ok_or(DiError::NotFound(type_name::<T>()))
    }

    /// Builds every unnamed registration of `T`.
    fn resolve_all<T: ?Sized + 'static>(&self, args: &[Arg]) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_by_name::<T>("", args)
    }

    /// Builds every registration of `T` under `name`.
    fn resolve_all_by_name<T: ?Sized + 'static>(&self, name: &str, args: &[Arg]) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_objects(name, TypeTag::of::<T>(), args)?
            .iter()
            .map(|object| {
                object
                    .downcast::<T>()
                    .ok_or(DiError::TypeMismatch(type_name::<T>()))
            })
            .collect()
    }
}
