//! The container: provider table, resolution engine and child containers.

mod table;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use smallvec::smallvec;
use tracing::{debug, debug_span, trace, warn};

use crate::arg::{Arg, Object};
use crate::configuration::TypeConfiguration;
use crate::descriptors::CollectionAdapter;
use crate::error::{DiError, DiResult};
use crate::key::{arg_shape, compute_key, lookup_keys, registration_keys, ArgShape, Key, TypeTag};
use crate::provider::{InstanceProvider, Provider, SelfProvider};
use crate::registration::{RegistrarState, Registrator};
use crate::traits::{Resolver, ResolverCore};

use table::{Candidates, ProviderTable};

/// A dependency injection container.
///
/// Cloning is cheap and yields a handle to the same container. Resolution
/// goes through the [`Resolver`] trait.
///
/// A *strict* container reports unresolvable or ambiguous requests as
/// errors; a lenient one (the default) answers them with `Ok(None)`.
/// Failures while building a matched component are errors in both modes.
///
/// # Examples
///
/// ```rust
/// use autowire::{Component, Container, Param, Resolver, Scope, TypePlan};
/// use std::sync::Arc;
///
/// trait Bar: Send + Sync {}
///
/// #[derive(Default)]
/// struct RealBar;
/// impl Bar for RealBar {}
///
/// impl Component for RealBar {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.implements::<dyn Bar>(|b| b).default_constructor();
///     }
/// }
///
/// struct Foo { bar: Arc<dyn Bar> }
///
/// impl Component for Foo {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.constructor(vec![Param::of::<dyn Bar>("bar")], |v| Ok(Foo { bar: v.get(0)? }));
///     }
/// }
///
/// let container = Container::new();
/// container.register().type_of::<RealBar>().unwrap().with_scope(Scope::Singleton);
/// container.register().type_of::<Foo>().unwrap();
///
/// let a = container.resolve_required::<Foo>(&[]).unwrap();
/// let b = container.resolve_required::<Foo>(&[]).unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.bar, &b.bar));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a [`Container`].
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    /// The container, if it is still alive.
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContainer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

pub(crate) struct ContainerInner {
    strict: bool,
    parent: Option<Container>,
    table: RwLock<ProviderTable>,
    resolve_lock: Mutex<()>,
    lookup_cache: RwLock<HashMap<(Key, ArgShape), Arc<[Key]>, ahash::RandomState>>,
    collections: RwLock<HashMap<TypeTag, CollectionAdapter, ahash::RandomState>>,
    registrar: RegistrarState,
    disposed: AtomicBool,
}

impl Container {
    /// A lenient root container.
    pub fn new() -> Self {
        Self::build(false, None)
    }

    /// A strict root container.
    pub fn strict() -> Self {
        Self::build(true, None)
    }

    pub fn with_strict(strict: bool) -> Self {
        Self::build(strict, None)
    }

    fn build(strict: bool, parent: Option<Container>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ContainerInner>| {
            let mut table = ProviderTable::default();
            let own = WeakContainer { inner: weak.clone() };
            table.insert(
                Key::simple("", TypeTag::of::<Container>()),
                Arc::new(SelfProvider::new(own)),
                true,
            );
            ContainerInner {
                strict,
                parent,
                table: RwLock::new(table),
                resolve_lock: Mutex::new(()),
                lookup_cache: RwLock::new(HashMap::default()),
                collections: RwLock::new(HashMap::default()),
                registrar: RegistrarState::default(),
                disposed: AtomicBool::new(false),
            }
        });
        Self { inner }
    }

    /// Whether misses and ambiguities are errors.
    pub fn is_strict(&self) -> bool {
        self.inner.strict
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// A child container with the same strictness.
    ///
    /// Requests the child cannot serve are forwarded to this container;
    /// registrations made on the child are never visible here.
    pub fn create_child(&self) -> Container {
        debug!("Creating child container");
        Self::build(self.inner.strict, Some(self.clone()))
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same container.
    pub fn ptr_eq(a: &Container, b: &Container) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Configuration of the unnamed registration of `T`.
    ///
    /// Fails once `T` has been registered.
    pub fn configure<T: ?Sized + 'static>(&self) -> DiResult<TypeConfiguration> {
        self.configure_tag("", TypeTag::of::<T>())
    }

    /// Configuration of the registration of `T` under `name`.
    pub fn configure_named<T: ?Sized + 'static>(&self, name: &str) -> DiResult<TypeConfiguration> {
        self.configure_tag(name, TypeTag::of::<T>())
    }

    pub fn configure_tag(&self, name: &str, tag: TypeTag) -> DiResult<TypeConfiguration> {
        self.ensure_not_disposed()?;
        let configs = self.inner.registrar.configs();
        let data = configs.lock().get(name, tag)?;
        Ok(TypeConfiguration::new(data, configs.clone()))
    }

    /// Entry point for registrations.
    pub fn register(&self) -> Registrator<'_> {
        Registrator::new(self)
    }

    /// Whether this container itself holds an unnamed registration of `T`.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> DiResult<bool> {
        self.is_registered_named::<T>("")
    }

    /// Whether this container itself holds a registration of `T` under `name`.
    pub fn is_registered_named<T: ?Sized + 'static>(&self, name: &str) -> DiResult<bool> {
        self.ensure_not_disposed()?;
        Ok(self.inner.registrar.is_registered(&Key::simple(name, TypeTag::of::<T>())))
    }

    /// Disposes every provider, most recently registered first. Each one
    /// releases its tracked instances most recent first. Later operations
    /// fail with [`DiError::Disposed`]; calling it again does nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let providers = self.inner.table.read().unique_providers().to_vec();
        debug!(providers = providers.len(), "Disposing container");
        for provider in providers.iter().rev() {
            provider.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_not_disposed(&self) -> DiResult<()> {
        if self.is_disposed() {
            Err(DiError::Disposed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn registrar(&self) -> &RegistrarState {
        &self.inner.registrar
    }

    pub(crate) fn insert_provider(&self, key: Key, provider: Arc<dyn Provider>, front: bool) {
        trace!(key = ?key, front, "Adding provider");
        self.inner.table.write().insert(key, provider, front);
    }

    pub(crate) fn add_collection_adapter(&self, tag: TypeTag, adapter: CollectionAdapter) {
        self.inner.collections.write().entry(tag).or_insert(adapter);
    }

    /// Files `object` as an explicit instance under every key its type
    /// fans out to, ahead of existing providers.
    pub(crate) fn set_as_singleton(&self, name: &str, object: &Object) {
        let provider: Arc<dyn Provider> = Arc::new(InstanceProvider::new(object.clone()));
        let mut table = self.inner.table.write();
        for key in registration_keys(name, object.info(), &[]) {
            table.insert(key, provider.clone(), true);
        }
    }

    fn collection_adapter(&self, tag: TypeTag) -> Option<CollectionAdapter> {
        let own = self.inner.collections.read().get(&tag).copied();
        own.or_else(|| self.inner.parent.as_ref().and_then(|p| p.collection_adapter(tag)))
    }

    /// Lookup keys for `key`, cached per argument shape: a plain value and
    /// a component of the same type share a simple key but not a shape.
    fn lookup_keys(&self, key: &Key, args: &[Arg]) -> Arc<[Key]> {
        let cache_key = (key.clone(), arg_shape(args));
        if let Some(keys) = self.inner.lookup_cache.read().get(&cache_key) {
            return keys.clone();
        }
        let keys: Arc<[Key]> = lookup_keys(key, &cache_key.1).into();
        self.inner
            .lookup_cache
            .write()
            .entry(cache_key)
            .or_insert(keys)
            .clone()
    }

    /// The providers filed under `key` that accept this request.
    fn accepting(&self, key: &Key, args: &[Arg]) -> Option<Candidates> {
        let mut found = self.inner.table.read().candidates(key)?;
        found.retain(|p| p.can_invoke(key.type_tag(), args));
        (!found.is_empty()).then_some(found)
    }

    /// Finds the provider for a request key that has not been seen yet
    /// and files it under that key.
    fn populate(&self, key: &Key, args: &[Arg]) -> Option<Candidates> {
        let _guard = self.inner.resolve_lock.lock();
        if let Some(found) = self.accepting(key, args) {
            return Some(found);
        }

        let keys = self.lookup_keys(key, args);
        let provider = self
            .inner
            .table
            .read()
            .first_match(&keys, |p| p.can_invoke(key.type_tag(), args))?;
        self.inner.table.write().cache(key.clone(), provider.clone());
        trace!(key = ?key, lookups = keys.len(), "Provider selected");
        Some(smallvec![provider])
    }

    fn resolve_in(&self, origin: &Container, key: &Key, args: &[Arg]) -> DiResult<Option<Object>> {
        self.ensure_not_disposed()?;

        let candidates = match self.accepting(key, args) {
            Some(candidates) => candidates,
            None => match self.populate(key, args) {
                Some(candidates) => candidates,
                None => return self.fallback(origin, key, args),
            },
        };

        let first = &candidates[0];
        if candidates.len() == 1 || first.is_user_registered() {
            return first.invoke(origin, key.type_tag(), args).map(Some);
        }

        warn!(count = candidates.len(), "Ambiguous resolution");
        if self.inner.strict {
            Err(DiError::Ambiguous {
                type_name: key.type_tag().name(),
                count: candidates.len(),
            })
        } else {
            Ok(None)
        }
    }

    fn fallback(&self, origin: &Container, key: &Key, args: &[Arg]) -> DiResult<Option<Object>> {
        if let Some(parent) = &self.inner.parent {
            debug!("No provider found, trying parent container");
            return parent.resolve_in(origin, key, args);
        }

        if let Some(adapter) = origin.collection_adapter(key.type_tag()) {
            debug!(element = adapter.element.name(), "Resolving as collection");
            let element = Key::new(key.name(), adapter.element, key.arg_tags().iter().copied());
            let items = origin.resolve_all_in(origin, &element, args)?;
            return (adapter.build)(items).map(Some);
        }

        debug!("No provider found");
        if self.inner.strict {
            Err(DiError::NotFound(key.type_tag().name()))
        } else {
            Ok(None)
        }
    }

    fn resolve_all_in(&self, origin: &Container, key: &Key, args: &[Arg]) -> DiResult<Vec<Object>> {
        self.ensure_not_disposed()?;
        let candidates = self.inner.table.read().candidates(key);
        match (candidates, &self.inner.parent) {
            (Some(candidates), _) => candidates
                .iter()
                .map(|provider| provider.invoke(origin, key.type_tag(), args))
                .collect(),
            (None, Some(parent)) => parent.resolve_all_in(origin, key, args),
            (None, None) => Ok(Vec::new()),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("strict", &self.inner.strict)
            .field("has_parent", &self.inner.parent.is_some())
            .field("keys", &self.inner.table.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl ResolverCore for Container {
    fn resolve_object(&self, name: &str, ty: TypeTag, args: &[Arg]) -> DiResult<Option<Object>> {
        let span = debug_span!("resolve", type_name = ty.name(), registration = name);
        let _guard = span.enter();
        let key = compute_key(name, ty, args);
        self.resolve_in(self, &key, args)
    }

    fn resolve_all_objects(&self, name: &str, ty: TypeTag, args: &[Arg]) -> DiResult<Vec<Object>> {
        let span = debug_span!("resolve_all", type_name = ty.name(), registration = name);
        let _guard = span.enter();
        let key = compute_key(name, ty, args);
        self.resolve_all_in(self, &key, args)
    }
}

impl Resolver for Container {}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if *self.disposed.get_mut() {
            return;
        }
        let pending = self
            .table
            .get_mut()
            .unique_providers()
            .iter()
            .any(|provider| provider.has_pending_disposal());
        if pending {
            warn!("Container dropped with undisposed instances. Call dispose() before dropping.");
        }
    }
}
