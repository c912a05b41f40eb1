//! Registration of types, instances and assemblies.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

use crate::arg::Object;
use crate::argument::Parameter;
use crate::assembly::{Assembly, AssemblyCatalog};
use crate::configuration::{ConfigurationManager, LifetimeConfiguration, LiveSettings, TypeConfiguration};
use crate::container::Container;
use crate::descriptors::{CollectionAdapter, Component, TypeInfo};
use crate::error::{DiError, DiResult};
use crate::injection::{InjectionPlan, Requirements};
use crate::key::{registration_keys, Key, TypeTag};
use crate::lifetime::Scope;
use crate::metadata::TypeMetadata;
use crate::provider::{ConstructorCore, ConstructorProvider, InstanceProvider, Provider};

/// Called for every type registered from an assembly, before its
/// configuration is frozen.
pub type RegistrationHandler<'h> = &'h mut dyn FnMut(&TypeInfo, &TypeConfiguration);

/// Registration bookkeeping owned by each container.
pub(crate) struct RegistrarState {
    lock: ReentrantMutex<()>,
    registered: Mutex<HashSet<Key, ahash::RandomState>>,
    configs: Arc<Mutex<ConfigurationManager>>,
}

impl Default for RegistrarState {
    fn default() -> Self {
        Self {
            lock: ReentrantMutex::new(()),
            registered: Mutex::new(HashSet::default()),
            configs: Arc::new(Mutex::new(ConfigurationManager::default())),
        }
    }
}

impl RegistrarState {
    pub(crate) fn configs(&self) -> &Arc<Mutex<ConfigurationManager>> {
        &self.configs
    }

    pub(crate) fn is_registered(&self, key: &Key) -> bool {
        self.registered.lock().contains(key)
    }

    fn mark(&self, key: Key) -> DiResult<()> {
        let type_name = key.type_tag().name();
        if self.registered.lock().insert(key) {
            Ok(())
        } else {
            Err(DiError::registration(type_name, "Tried to register the type again."))
        }
    }
}

fn no_handler(_: &TypeInfo, _: &TypeConfiguration) {}

/// Registers a concrete type under `name`.
///
/// Every constructor is filed under the type itself and under each of its
/// bases and interfaces. Only the key of the type itself counts as an
/// explicit registration.
pub(crate) fn register_type(
    container: &Container,
    name: &str,
    info: Arc<TypeInfo>,
    handler: RegistrationHandler<'_>,
) -> DiResult<LifetimeConfiguration> {
    container.ensure_not_disposed()?;
    if info.is_abstract() {
        return Err(DiError::registration(
            info.name(),
            "Only concrete types with at least one constructor can be registered.",
        ));
    }

    let state = container.registrar();
    let _guard = state.lock.lock();
    let configs = state.configs().clone();
    let config = TypeConfiguration::new(configs.lock().build(name, &info), configs.clone());
    handler(&info, &config);

    let snapshot = config.snapshot();
    if snapshot.ignored {
        debug!(type_name = info.name(), "Registration ignored by configuration");
        return Ok(LifetimeConfiguration::inert());
    }

    let mut needs = Requirements::default();
    let plan = InjectionPlan::build(&mut configs.lock(), &info, &snapshot, None, &mut needs)?;
    let live = Arc::new(LiveSettings::new(snapshot.scope, snapshot.callback.clone()));
    let metadata = Arc::new(TypeMetadata::new(name, info.clone(), live.clone(), plan));

    let type_key = Key::simple(name, info.tag());
    let mut entries: Vec<(Key, Arc<ConstructorCore>)> = Vec::new();
    for constructor in info.constructors() {
        let parameters: Vec<Parameter> = constructor
            .params
            .iter()
            .map(|p| Parameter::compile(p, snapshot.argument(p.name())))
            .collect();
        for parameter in &parameters {
            needs.note_parameter(parameter);
        }
        let core = Arc::new(ConstructorCore::new(
            container.downgrade(),
            metadata.clone(),
            parameters,
            constructor.invoke.clone(),
        ));
        for key in registration_keys(name, &info, core.user_parameters()) {
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(DiError::registration(
                    info.name(),
                    "The type has several constructors with the same signature.",
                ));
            }
            entries.push((key, core.clone()));
        }
    }

    state.mark(type_key.clone())?;
    for (key, core) in entries {
        let explicit = key == type_key;
        container.insert_provider(key, Arc::new(ConstructorProvider::new(core, explicit)), explicit);
    }
    for (tag, adapter) in needs.collections {
        container.add_collection_adapter(tag, adapter);
    }
    debug!(
        type_name = info.name(),
        registration = name,
        scope = ?snapshot.scope,
        constructors = info.constructor_count(),
        "Registered type"
    );

    for (resolver_name, resolver_info) in needs.resolvers {
        let resolver_info = resolver_info();
        if !state.is_registered(&Key::simple(&resolver_name, resolver_info.tag())) {
            register_type(container, &resolver_name, Arc::new(resolver_info), &mut no_handler)?
                .with_scope(Scope::Singleton);
        }
    }

    Ok(LifetimeConfiguration::live(live))
}

/// Registers a pre-built instance as an explicit registration under every
/// key its type fans out to.
pub(crate) fn register_object(container: &Container, name: &str, object: Object) -> DiResult<()> {
    container.ensure_not_disposed()?;
    let state = container.registrar();
    let _guard = state.lock.lock();
    state.mark(Key::simple(name, object.type_tag()))?;

    let provider: Arc<dyn Provider> = Arc::new(InstanceProvider::new(object.clone()));
    for key in registration_keys(name, object.info(), &[]) {
        container.insert_provider(key, provider.clone(), true);
    }
    debug!(type_name = object.info().name(), registration = name, "Registered instance");
    Ok(())
}

fn register_assembly(container: &Container, assembly: &Assembly, handler: RegistrationHandler<'_>) -> DiResult<()> {
    debug!(assembly = assembly.name(), "Registering assembly");
    for info in assembly.concrete_types() {
        register_type(container, "", info.clone(), &mut *handler)?;
    }
    Ok(())
}

/// Registration entry point returned by [`Container::register`].
///
/// # Examples
///
/// ```rust
/// use autowire::{Component, Container, Resolver, TypePlan};
///
/// #[derive(Default)]
/// struct Engine;
///
/// impl Component for Engine {
///     fn describe(plan: &mut TypePlan<Self>) {
///         plan.default_constructor();
///     }
/// }
///
/// let container = Container::new();
/// container.register().type_of::<Engine>().unwrap();
/// container.register().named_value("port", 8080u16).unwrap();
///
/// assert!(container.is_registered::<Engine>().unwrap());
/// assert!(container.register().type_of::<Engine>().unwrap_err().is_registration());
/// assert_eq!(*container.resolve_required_by_name::<u16>("port", &[]).unwrap(), 8080);
/// ```
pub struct Registrator<'a> {
    container: &'a Container,
}

impl<'a> Registrator<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Registers the component `C` without a name.
    pub fn type_of<C: Component>(&self) -> DiResult<LifetimeConfiguration> {
        self.named_type::<C>("")
    }

    /// Registers the component `C` under `name`.
    pub fn named_type<C: Component>(&self, name: &str) -> DiResult<LifetimeConfiguration> {
        self.type_info(name, TypeInfo::of::<C>())
    }

    /// Registers a type from its runtime description.
    pub fn type_info(&self, name: &str, info: impl Into<Arc<TypeInfo>>) -> DiResult<LifetimeConfiguration> {
        register_type(self.container, name, info.into(), &mut no_handler)
    }

    /// Registers a pre-built component.
    pub fn instance<C: Component>(&self, value: C) -> DiResult<()> {
        self.object("", Object::new(value))
    }

    pub fn named_instance<C: Component>(&self, name: &str, value: C) -> DiResult<()> {
        self.object(name, Object::new(value))
    }

    /// Registers a plain value, visible only as its own type.
    pub fn value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        self.object("", Object::plain(value))
    }

    pub fn named_value<T: Send + Sync + 'static>(&self, name: &str, value: T) -> DiResult<()> {
        self.object(name, Object::plain(value))
    }

    /// Registers a shared value such as a trait object.
    pub fn shared<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) -> DiResult<()> {
        self.object("", Object::shared(value))
    }

    pub fn named_shared<T: ?Sized + Send + Sync + 'static>(&self, name: &str, value: Arc<T>) -> DiResult<()> {
        self.object(name, Object::shared(value))
    }

    /// Registers a pre-built object under `name`.
    pub fn object(&self, name: &str, object: Object) -> DiResult<()> {
        register_object(self.container, name, object)
    }

    /// Lets `Vec<Arc<T>>` be resolved directly, gathering every
    /// registration of `T`.
    pub fn collection<T: ?Sized + Send + Sync + 'static>(&self) -> &Self {
        self.container
            .add_collection_adapter(TypeTag::of::<Vec<Arc<T>>>(), CollectionAdapter::of::<T>());
        self
    }

    /// Registers every concrete type of `assembly`.
    pub fn assembly(&self, assembly: &Assembly) -> DiResult<()> {
        register_assembly(self.container, assembly, &mut no_handler)
    }

    /// Registers every concrete type of `assembly`, letting `handler`
    /// adjust each configuration first.
    pub fn assembly_with<F>(&self, assembly: &Assembly, mut handler: F) -> DiResult<()>
    where
        F: FnMut(&TypeInfo, &TypeConfiguration),
    {
        register_assembly(self.container, assembly, &mut handler)
    }

    /// Registers the assembly called `name` from `catalog`.
    pub fn assembly_by_name(&self, catalog: &AssemblyCatalog, name: &str) -> DiResult<()> {
        self.assembly_by_name_with(catalog, name, no_handler)
    }

    pub fn assembly_by_name_with<F>(&self, catalog: &AssemblyCatalog, name: &str, handler: F) -> DiResult<()>
    where
        F: FnMut(&TypeInfo, &TypeConfiguration),
    {
        if self.try_assembly_by_name_with(catalog, name, handler)? {
            Ok(())
        } else {
            Err(DiError::registration(
                "Assembly",
                format!("The assembly '{}' can not be found.", name),
            ))
        }
    }

    /// Like [`assembly_by_name`](Self::assembly_by_name), but reports a
    /// missing assembly as `Ok(false)`.
    pub fn try_assembly_by_name(&self, catalog: &AssemblyCatalog, name: &str) -> DiResult<bool> {
        self.try_assembly_by_name_with(catalog, name, no_handler)
    }

    pub fn try_assembly_by_name_with<F>(&self, catalog: &AssemblyCatalog, name: &str, handler: F) -> DiResult<bool>
    where
        F: FnMut(&TypeInfo, &TypeConfiguration),
    {
        match catalog.find(name) {
            Some(assembly) => self.assembly_with(assembly, handler).map(|_| true),
            None => Ok(false),
        }
    }
}
