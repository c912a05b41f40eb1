//! Type-erased values and user-provided arguments.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::descriptors::{Component, TypeInfo};
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;

/// Type-erased shared pointer to a concrete value.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed `Arc<T>` for some statically unknown `T`, produced by a view.
pub(crate) type Erased = Box<dyn Any + Send + Sync>;

/// A resolved or user-supplied value together with its type plan.
///
/// The plan knows which types the value can be viewed as, so the same
/// object can be handed out as itself, as any of its bases, or as any of
/// the interfaces it implements.
///
/// ```rust
/// use autowire::{Component, Object, TypePlan};
///
/// trait Named: Send + Sync { fn name(&self) -> &str; }
///
/// #[derive(Default)]
/// struct Widget;
///
/// impl Named for Widget { fn name(&self) -> &str { "widget" } }
///
/// impl Component for Widget {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.implements::<dyn Named>(|w| w).default_constructor();
///     }
/// }
///
/// let object = Object::new(Widget);
/// assert_eq!(object.downcast::<dyn Named>().unwrap().name(), "widget");
/// assert!(object.downcast::<Widget>().is_some());
/// assert!(object.downcast::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Object {
    value: AnyArc,
    info: Arc<TypeInfo>,
}

impl Object {
    /// Wraps a component, keeping its full ancestry.
    pub fn new<C: Component>(value: C) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps a shared component, keeping its full ancestry.
    pub fn from_arc<C: Component>(value: Arc<C>) -> Self {
        Self {
            value,
            info: Arc::new(TypeInfo::of::<C>()),
        }
    }

    /// Wraps any value that only needs to be seen as itself.
    pub fn plain<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            info: Arc::new(TypeInfo::plain::<T>()),
        }
    }

    /// Wraps an already shared, possibly unsized value such as a trait object.
    pub fn shared<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            info: Arc::new(TypeInfo::shared::<T>()),
        }
    }

    pub(crate) fn from_parts(value: AnyArc, info: Arc<TypeInfo>) -> Self {
        Self { value, info }
    }

    /// Tag of the concrete type.
    pub fn type_tag(&self) -> TypeTag {
        self.info.tag()
    }

    /// The type plan this object was built from.
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub(crate) fn value(&self) -> &AnyArc {
        &self.value
    }

    /// Whether this object can be viewed as `tag`.
    pub fn is_assignable_to(&self, tag: TypeTag) -> bool {
        self.info.can_view(tag)
    }

    pub(crate) fn view(&self, tag: TypeTag) -> Option<Erased> {
        self.info.view(&self.value, tag)
    }

    /// Views the object as `T`, if its plan declares `T`.
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.view(TypeTag::of::<T>())?
            .downcast::<Arc<T>>()
            .ok()
            .map(|boxed| *boxed)
    }

    /// Whether both objects share the same underlying allocation.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.value) as *const u8,
            Arc::as_ptr(&other.value) as *const u8,
        )
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("type", &self.info.tag()).finish()
    }
}

/// A user-provided argument to a resolution request.
///
/// Arguments participate in provider selection through their runtime
/// type. A null argument still carries the type it stands for, so an
/// untyped null cannot be expressed.
#[derive(Clone, Debug)]
pub enum Arg {
    /// A concrete value.
    Value(Object),
    /// A null standing in for a value of the given type.
    Null(TypeTag),
}

impl Arg {
    /// A plain value, matched only by its exact type.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Arg::Value(Object::plain(value))
    }

    /// A component, matched by its type, bases and interfaces.
    pub fn component<C: Component>(value: C) -> Self {
        Arg::Value(Object::new(value))
    }

    /// A shared value such as a trait object.
    pub fn shared<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Arg::Value(Object::shared(value))
    }

    /// A typed null.
    pub fn null<T: ?Sized + 'static>() -> Self {
        Arg::Null(TypeTag::of::<T>())
    }

    /// Type the argument contributes to lookup keys.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Arg::Value(object) => object.type_tag(),
            Arg::Null(tag) => *tag,
        }
    }

    /// Whether this is a typed null.
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null(_))
    }

    pub(crate) fn ancestry(&self) -> SmallVec<[TypeTag; 4]> {
        match self {
            Arg::Value(object) => object.info().ancestry().collect(),
            Arg::Null(tag) => SmallVec::from_elem(*tag, 1),
        }
    }

    pub(crate) fn is_assignable_to(&self, tag: TypeTag) -> bool {
        match self {
            Arg::Value(object) => object.is_assignable_to(tag),
            Arg::Null(own) => *own == tag,
        }
    }

    /// The value as `tag`; `None` for a typed null.
    pub(crate) fn view(&self, tag: TypeTag) -> DiResult<Option<Erased>> {
        match self {
            Arg::Value(object) => object
                .view(tag)
                .map(Some)
                .ok_or(DiError::TypeMismatch(tag.name())),
            Arg::Null(_) => Ok(None),
        }
    }
}

impl From<Object> for Arg {
    fn from(object: Object) -> Self {
        Arg::Value(object)
    }
}
