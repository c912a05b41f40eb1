//! Type plans: what a component is, what it can be viewed as, and how it
//! is built and injected.
//!
//! Rust has no runtime reflection, so every injectable type describes
//! itself once through [`Component::describe`]. The resulting [`TypeInfo`]
//! carries the ancestry used for key fan-out, the constructors, the
//! injectable members and the disposal hook.

mod dependency;
mod values;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub use dependency::{Dependency, Param};
pub(crate) use dependency::{CollectionAdapter, DependencyKind, DependencySpec};
pub use values::Values;

use crate::arg::{AnyArc, Erased};
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;
use crate::traits::Dispose;

pub(crate) type CastFn = Arc<dyn Fn(&AnyArc) -> Option<Erased> + Send + Sync>;
pub(crate) type CtorFn = Arc<dyn Fn(&Values) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type SetterFn = Arc<dyn Fn(&AnyArc, Erased) -> DiResult<()> + Send + Sync>;
pub(crate) type MethodFn = Arc<dyn Fn(&AnyArc, &Values) -> DiResult<()> + Send + Sync>;
pub(crate) type GetterFn = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;
pub(crate) type DisposeFn = Arc<dyn Fn(&AnyArc) + Send + Sync>;

/// A type the container can construct and inject.
///
/// # Examples
///
/// ```rust
/// use autowire::{Component, Container, Param, Resolver, TypePlan};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync { fn get(&self) -> u32; }
///
/// #[derive(Default)]
/// struct MemoryStore;
/// impl Store for MemoryStore { fn get(&self) -> u32 { 7 } }
///
/// impl Component for MemoryStore {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.implements::<dyn Store>(|s| s).default_constructor();
///     }
/// }
///
/// struct Service { store: Arc<dyn Store> }
///
/// impl Component for Service {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.constructor(vec![Param::of::<dyn Store>("store")], |v| {
///             Ok(Service { store: v.get::<dyn Store>(0)? })
///         });
///     }
/// }
///
/// let container = Container::new();
/// container.register().type_of::<MemoryStore>().unwrap();
/// container.register().type_of::<Service>().unwrap();
///
/// let service = container.resolve_required::<Service>(&[]).unwrap();
/// assert_eq!(service.store.get(), 7);
/// ```
pub trait Component: Send + Sync + Sized + 'static {
    /// Declares ancestry, constructors and injectable members.
    fn describe(plan: &mut TypePlan<Self>);
}

pub(crate) struct Ancestor {
    tag: TypeTag,
    cast: CastFn,
}

pub(crate) struct ConstructorSpec {
    pub(crate) params: Vec<Param>,
    pub(crate) invoke: CtorFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
    Field,
    Property,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Property => f.write_str("property"),
        }
    }
}

pub(crate) struct SetterSpec {
    pub(crate) name: &'static str,
    pub(crate) kind: MemberKind,
    pub(crate) dependency: DependencySpec,
    pub(crate) set: SetterFn,
}

pub(crate) struct MethodSpec {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<Param>,
    pub(crate) call: MethodFn,
}

pub(crate) struct ComponentSpec {
    pub(crate) name: &'static str,
    pub(crate) tag: TypeTag,
    pub(crate) info: fn() -> TypeInfo,
    pub(crate) get: GetterFn,
}

/// Runtime description of a type.
pub struct TypeInfo {
    tag: TypeTag,
    self_cast: CastFn,
    bases: Vec<Ancestor>,
    interfaces: Vec<Ancestor>,
    generic_definition: Option<TypeTag>,
    constructors: Vec<ConstructorSpec>,
    setters: Vec<SetterSpec>,
    methods: Vec<MethodSpec>,
    components: Vec<ComponentSpec>,
    dispose: Option<DisposeFn>,
    interface: bool,
}

impl TypeInfo {
    fn empty(tag: TypeTag, self_cast: CastFn) -> Self {
        Self {
            tag,
            self_cast,
            bases: Vec::new(),
            interfaces: Vec::new(),
            generic_definition: None,
            constructors: Vec::new(),
            setters: Vec::new(),
            methods: Vec::new(),
            components: Vec::new(),
            dispose: None,
            interface: false,
        }
    }

    /// Full plan of a component.
    pub fn of<C: Component>() -> Self {
        let mut plan = TypePlan::<C>::new();
        C::describe(&mut plan);
        plan.info
    }

    /// A concrete type that is only ever seen as itself.
    pub fn plain<T: Send + Sync + 'static>() -> Self {
        Self::empty(
            TypeTag::of::<T>(),
            Arc::new(|value: &AnyArc| {
                Arc::clone(value)
                    .downcast::<T>()
                    .ok()
                    .map(|typed| Box::new(typed) as Erased)
            }),
        )
    }

    /// An abstract type (typically a trait object) that cannot be
    /// registered but can be configured and listed in an assembly.
    pub fn interface<T: ?Sized + 'static>() -> Self {
        let mut info = Self::empty(TypeTag::of::<T>(), Arc::new(|_: &AnyArc| None));
        info.interface = true;
        info
    }

    pub(crate) fn shared<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self::empty(
            TypeTag::of::<T>(),
            Arc::new(|value: &AnyArc| {
                value
                    .downcast_ref::<Arc<T>>()
                    .map(|typed| Box::new(Arc::clone(typed)) as Erased)
            }),
        )
    }

    /// Tag of the described type.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Fully qualified name of the described type.
    pub fn name(&self) -> &'static str {
        self.tag.name()
    }

    /// Abstract types have no constructor and cannot be registered.
    pub fn is_abstract(&self) -> bool {
        self.interface || self.constructors.is_empty()
    }

    /// Declared bases, nearest first.
    pub fn bases(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.bases.iter().map(|a| a.tag)
    }

    /// Declared interfaces.
    pub fn interfaces(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.interfaces.iter().map(|a| a.tag)
    }

    /// Generic type definition this type is an instantiation of.
    pub fn generic_definition(&self) -> Option<TypeTag> {
        self.generic_definition
    }

    /// The type itself, then its bases, then its interfaces.
    pub fn ancestry(&self) -> impl Iterator<Item = TypeTag> + '_ {
        std::iter::once(self.tag)
            .chain(self.bases())
            .chain(self.interfaces())
    }

    /// Whether a value of this type can be handed out as `tag`.
    pub fn can_view(&self, tag: TypeTag) -> bool {
        self.ancestry().any(|t| t == tag)
    }

    /// Number of declared constructors.
    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    /// Whether instances get a disposal hook.
    pub fn is_disposable(&self) -> bool {
        self.dispose.is_some()
    }

    pub(crate) fn view(&self, value: &AnyArc, tag: TypeTag) -> Option<Erased> {
        if tag == self.tag {
            return (self.self_cast)(value);
        }
        self.bases
            .iter()
            .chain(self.interfaces.iter())
            .find(|a| a.tag == tag)
            .and_then(|a| (a.cast)(value))
    }

    pub(crate) fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub(crate) fn setter(&self, name: &str, kind: MemberKind) -> Option<&SetterSpec> {
        self.setters.iter().find(|s| s.kind == kind && s.name == name)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub(crate) fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    pub(crate) fn dispose(&self, value: &AnyArc) {
        if let Some(dispose) = &self.dispose {
            dispose(value);
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type", &self.tag)
            .field("bases", &self.bases().collect::<Vec<_>>())
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .field("constructors", &self.constructors.len())
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

fn target<C: 'static>(value: &AnyArc) -> DiResult<&C> {
    (**value)
        .downcast_ref::<C>()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<C>()))
}

/// Builder handed to [`Component::describe`].
pub struct TypePlan<C> {
    info: TypeInfo,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> TypePlan<C> {
    fn new() -> Self {
        Self {
            info: TypeInfo::plain::<C>(),
            _component: PhantomData,
        }
    }

    fn ancestor<A>(cast: impl Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static) -> Ancestor
    where
        A: ?Sized + Send + Sync + 'static,
    {
        Ancestor {
            tag: TypeTag::of::<A>(),
            cast: Arc::new(move |value: &AnyArc| {
                let concrete = Arc::clone(value).downcast::<C>().ok()?;
                Some(Box::new(cast(concrete)) as Erased)
            }),
        }
    }

    /// Declares a base type, nearest first.
    pub fn extends<B>(&mut self, cast: impl Fn(Arc<C>) -> Arc<B> + Send + Sync + 'static) -> &mut Self
    where
        B: ?Sized + Send + Sync + 'static,
    {
        self.info.bases.push(Self::ancestor(cast));
        self
    }

    /// Declares an implemented interface.
    pub fn implements<I>(&mut self, cast: impl Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.info.interfaces.push(Self::ancestor(cast));
        self
    }

    /// Marks this type as an instantiation of the generic definition `D`,
    /// whose configuration it inherits.
    pub fn generic_definition<D: ?Sized + 'static>(&mut self) -> &mut Self {
        self.info.generic_definition = Some(TypeTag::of::<D>());
        self
    }

    /// Adds a constructor.
    pub fn constructor<F>(&mut self, params: Vec<Param>, build: F) -> &mut Self
    where
        F: Fn(&Values) -> DiResult<C> + Send + Sync + 'static,
    {
        self.info.constructors.push(ConstructorSpec {
            params,
            invoke: Arc::new(move |values: &Values| build(values).map(|c| Arc::new(c) as AnyArc)),
        });
        self
    }

    /// Adds a parameterless constructor backed by [`Default`].
    pub fn default_constructor(&mut self) -> &mut Self
    where
        C: Default,
    {
        self.constructor(Vec::new(), |_| Ok(C::default()))
    }

    fn setter<V>(
        &mut self,
        name: &'static str,
        kind: MemberKind,
        dependency: Dependency<V>,
        set: impl Fn(&C, Arc<V>) + Send + Sync + 'static,
    ) -> &mut Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.info.setters.push(SetterSpec {
            name,
            kind,
            dependency: dependency.into_spec(),
            set: Arc::new(move |value: &AnyArc, injected: Erased| {
                let component = target::<C>(value)?;
                let injected = injected
                    .downcast::<Arc<V>>()
                    .map_err(|_| DiError::TypeMismatch(std::any::type_name::<V>()))?;
                set(component, *injected);
                Ok(())
            }),
        });
        self
    }

    /// Declares an injectable field holding a `T` service.
    pub fn field<T>(&mut self, name: &'static str, set: impl Fn(&C, Arc<T>) + Send + Sync + 'static) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.setter(name, MemberKind::Field, Dependency::<T>::service(), set)
    }

    /// Declares an injectable field with an explicit dependency kind.
    pub fn field_with<V>(
        &mut self,
        name: &'static str,
        dependency: Dependency<V>,
        set: impl Fn(&C, Arc<V>) + Send + Sync + 'static,
    ) -> &mut Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.setter(name, MemberKind::Field, dependency, set)
    }

    /// Declares an injectable property holding a `T` service.
    pub fn property<T>(&mut self, name: &'static str, set: impl Fn(&C, Arc<T>) + Send + Sync + 'static) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.setter(name, MemberKind::Property, Dependency::<T>::service(), set)
    }

    /// Declares an injectable property with an explicit dependency kind.
    pub fn property_with<V>(
        &mut self,
        name: &'static str,
        dependency: Dependency<V>,
        set: impl Fn(&C, Arc<V>) + Send + Sync + 'static,
    ) -> &mut Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.setter(name, MemberKind::Property, dependency, set)
    }

    /// Declares an injectable method.
    pub fn method<F>(&mut self, name: &'static str, params: Vec<Param>, call: F) -> &mut Self
    where
        F: Fn(&C, &Values) -> DiResult<()> + Send + Sync + 'static,
    {
        self.info.methods.push(MethodSpec {
            name,
            params,
            call: Arc::new(move |value: &AnyArc, values: &Values| call(target::<C>(value)?, values)),
        });
        self
    }

    /// Declares a nested component whose own members can be injected after
    /// the owner is built.
    pub fn component<S: Component>(
        &mut self,
        name: &'static str,
        get: impl Fn(&C) -> Arc<S> + Send + Sync + 'static,
    ) -> &mut Self {
        self.info.components.push(ComponentSpec {
            name,
            tag: TypeTag::of::<S>(),
            info: TypeInfo::of::<S>,
            get: Arc::new(move |value: &AnyArc| {
                (**value)
                    .downcast_ref::<C>()
                    .map(|owner| get(owner) as AnyArc)
            }),
        });
        self
    }

    /// Tracks instances for disposal with their container.
    pub fn disposable(&mut self) -> &mut Self
    where
        C: Dispose,
    {
        self.info.dispose = Some(Arc::new(|value: &AnyArc| {
            if let Some(component) = (**value).downcast_ref::<C>() {
                component.dispose();
            }
        }));
        self
    }
}
