use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arg::{Erased, Object};
use crate::container::WeakContainer;
use crate::descriptors::TypeInfo;
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;
use crate::lazy::{Func, TypedResolver};

pub(crate) type LazyFn = Arc<dyn Fn(WeakContainer, Arc<str>) -> Erased + Send + Sync>;

/// Builds a `Vec<Arc<T>>` object out of resolved elements.
#[derive(Clone, Copy)]
pub(crate) struct CollectionAdapter {
    pub(crate) element: TypeTag,
    pub(crate) build: fn(Vec<Object>) -> DiResult<Object>,
}

impl CollectionAdapter {
    pub(crate) fn of<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            element: TypeTag::of::<T>(),
            build: collect_as::<T>,
        }
    }
}

fn collect_as<T: ?Sized + Send + Sync + 'static>(items: Vec<Object>) -> DiResult<Object> {
    let list = items
        .iter()
        .map(|item| item.downcast::<T>().ok_or(DiError::TypeMismatch(type_name::<T>())))
        .collect::<DiResult<Vec<Arc<T>>>>()?;
    Ok(Object::plain(list))
}

#[derive(Clone)]
pub(crate) enum DependencyKind {
    /// Resolved from the container.
    Service,
    /// A deferred factory bound to the container.
    Lazy(LazyFn),
    /// A typed resolver wrapper, registered on demand as a singleton.
    Resolver(fn() -> TypeInfo),
    /// Every registration of the element type.
    Collection(CollectionAdapter),
}

#[derive(Clone)]
pub(crate) struct DependencySpec {
    pub(crate) tag: TypeTag,
    pub(crate) kind: DependencyKind,
}

/// How a member or parameter of type `V` is satisfied.
///
/// ```rust
/// use autowire::{Dependency, Func, TypedResolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// let _service = Dependency::<dyn Clock>::service();
/// let _factory = Dependency::<Func<dyn Clock>>::lazy();
/// let _resolver = Dependency::<TypedResolver<dyn Clock>>::resolver();
/// let _all = Dependency::<Vec<Arc<dyn Clock>>>::collection();
/// ```
pub struct Dependency<V: ?Sized> {
    spec: DependencySpec,
    _value: PhantomData<fn() -> Arc<V>>,
}

impl<V: ?Sized> Dependency<V> {
    fn from_spec(tag: TypeTag, kind: DependencyKind) -> Self {
        Self {
            spec: DependencySpec { tag, kind },
            _value: PhantomData,
        }
    }

    pub(crate) fn into_spec(self) -> DependencySpec {
        self.spec
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency<T> {
    /// Resolve `T` from the container.
    pub fn service() -> Self {
        Self::from_spec(TypeTag::of::<T>(), DependencyKind::Service)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency<Func<T>> {
    /// Inject a factory that resolves `T` when called.
    pub fn lazy() -> Self {
        let make: LazyFn = Arc::new(|container: WeakContainer, name: Arc<str>| {
            Box::new(Arc::new(Func::<T>::new(container, name))) as Erased
        });
        Self::from_spec(TypeTag::of::<Func<T>>(), DependencyKind::Lazy(make))
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency<TypedResolver<T>> {
    /// Inject a typed resolver over the container.
    pub fn resolver() -> Self {
        Self::from_spec(
            TypeTag::of::<TypedResolver<T>>(),
            DependencyKind::Resolver(TypeInfo::of::<TypedResolver<T>>),
        )
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency<Vec<Arc<T>>> {
    /// Inject every registration of `T`.
    pub fn collection() -> Self {
        Self::from_spec(
            TypeTag::of::<Vec<Arc<T>>>(),
            DependencyKind::Collection(CollectionAdapter::of::<T>()),
        )
    }
}

/// A named constructor or method parameter.
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    dependency: DependencySpec,
}

impl Param {
    /// A parameter resolved as `T` unless configured otherwise.
    pub fn of<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::with(name, Dependency::<T>::service())
    }

    /// A parameter with an explicit dependency kind.
    pub fn with<V: ?Sized>(name: &'static str, dependency: Dependency<V>) -> Self {
        Self {
            name,
            dependency: dependency.into_spec(),
        }
    }

    /// A [`Func<T>`] parameter.
    pub fn lazy<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::with(name, Dependency::<Func<T>>::lazy())
    }

    /// A [`TypedResolver<T>`] parameter.
    pub fn resolver<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::with(name, Dependency::<TypedResolver<T>>::resolver())
    }

    /// A `Vec<Arc<T>>` parameter holding every registration of `T`.
    pub fn collection<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::with(name, Dependency::<Vec<Arc<T>>>::collection())
    }

    /// Parameter name, used to match configured arguments.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameter type.
    pub fn type_tag(&self) -> TypeTag {
        self.dependency.tag
    }

    pub(crate) fn dependency(&self) -> &DependencySpec {
        &self.dependency
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.dependency.tag)
    }
}
