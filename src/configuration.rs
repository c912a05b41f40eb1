//! Per-type configuration and its merge rules.
//!
//! Configuration is collected before a type is registered. At registration
//! time the most specific configuration wins for scope, ignore flag and
//! constructor arguments, while member injections and the first callback
//! are merged in from the generic definition, the bases and the interfaces.
//! Once merged, a configuration is frozen: asking for it again is an error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::arg::Object;
use crate::argument::Argument;
use crate::container::Container;
use crate::descriptors::TypeInfo;
use crate::error::{DiError, DiResult};
use crate::key::{Key, TypeTag};
use crate::lifetime::Scope;

/// Hook run against every instance after it was built and injected.
pub(crate) type Callback = Arc<dyn Fn(&Container, &Object) + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MemberConfig {
    pub(crate) name: String,
    pub(crate) injected_name: Arc<str>,
}

#[derive(Default)]
pub(crate) struct MethodConfig {
    pub(crate) arguments: Vec<Argument>,
}

#[derive(Clone)]
pub(crate) struct TypeConfigData {
    pub(crate) tag: TypeTag,
    pub(crate) scope: Scope,
    pub(crate) ignored: bool,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) fields: Vec<MemberConfig>,
    pub(crate) properties: Vec<MemberConfig>,
    pub(crate) methods: Vec<(String, Arc<Mutex<MethodConfig>>)>,
    pub(crate) components: Vec<(String, TypeTag)>,
    pub(crate) callback: Option<Callback>,
}

impl TypeConfigData {
    fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            scope: Scope::default(),
            ignored: false,
            arguments: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            components: Vec::new(),
            callback: None,
        }
    }

    pub(crate) fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    fn set_argument(&mut self, argument: Argument) {
        match self.arguments.iter_mut().find(|a| a.name() == argument.name()) {
            Some(existing) => *existing = argument,
            None => self.arguments.push(argument),
        }
    }

    /// Merges a less specific configuration into this one.
    ///
    /// Scope, ignore flag and arguments stay as they are.
    fn combine_with(&mut self, other: &TypeConfigData) {
        if self.callback.is_none() {
            self.callback = other.callback.clone();
        }
        union(&mut self.fields, &other.fields);
        union(&mut self.properties, &other.properties);
        for (name, method) in &other.methods {
            if !self.methods.iter().any(|(n, m)| n == name && Arc::ptr_eq(m, method)) {
                self.methods.push((name.clone(), method.clone()));
            }
        }
        union(&mut self.components, &other.components);
    }
}

fn union<T: Clone + PartialEq>(target: &mut Vec<T>, source: &[T]) {
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

type SharedConfig = Arc<Mutex<TypeConfigData>>;

/// Stores the configuration of every `(name, type)` pair of one container.
#[derive(Default)]
pub(crate) struct ConfigurationManager {
    configs: HashMap<Key, SharedConfig, ahash::RandomState>,
    built: HashMap<Key, SharedConfig, ahash::RandomState>,
}

impl ConfigurationManager {
    /// The editable configuration of `(name, tag)`.
    pub(crate) fn get(&mut self, name: &str, tag: TypeTag) -> DiResult<SharedConfig> {
        let key = Key::simple(name, tag);
        if self.built.contains_key(&key) {
            return Err(DiError::configuration(
                tag.name(),
                "This type was already registered and can not be configured anymore.",
            ));
        }
        Ok(self
            .configs
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(TypeConfigData::new(tag))))
            .clone())
    }

    /// The merged configuration of `(name, info)`, frozen from now on.
    pub(crate) fn build(&mut self, name: &str, info: &TypeInfo) -> SharedConfig {
        let key = Key::simple(name, info.tag());
        if let Some(built) = self.built.get(&key) {
            return built.clone();
        }

        let mut order = vec![info.tag()];
        order.extend(info.generic_definition());
        order.extend(info.bases());
        order.extend(info.interfaces());

        let mut merged: Option<TypeConfigData> = None;
        for tag in order {
            let Some(config) = self.configs.get(&Key::simple(name, tag)) else {
                continue;
            };
            let config = config.lock();
            match merged.as_mut() {
                None => {
                    let mut first = config.clone();
                    first.tag = info.tag();
                    merged = Some(first);
                }
                Some(merged) => merged.combine_with(&config),
            }
        }

        let shared = Arc::new(Mutex::new(
            merged.unwrap_or_else(|| TypeConfigData::new(info.tag())),
        ));
        self.built.insert(key.clone(), shared.clone());
        self.configs.insert(key, shared.clone());
        shared
    }
}

/// Editable configuration of one type, obtained from
/// [`Container::configure`](crate::Container::configure).
///
/// Every method returns `&Self` so calls can be chained.
///
/// ```rust
/// use autowire::{Argument, Container, Scope};
///
/// struct Mailer;
///
/// let container = Container::new();
/// container
///     .configure::<Mailer>()
///     .unwrap()
///     .with_scope(Scope::Singleton)
///     .argument(Argument::fixed_value("host", String::from("smtp.local")))
///     .inject_property("logger");
/// ```
#[derive(Clone)]
pub struct TypeConfiguration {
    data: SharedConfig,
    manager: Arc<Mutex<ConfigurationManager>>,
}

impl TypeConfiguration {
    pub(crate) fn new(data: SharedConfig, manager: Arc<Mutex<ConfigurationManager>>) -> Self {
        Self { data, manager }
    }

    /// The configured type.
    pub fn type_tag(&self) -> TypeTag {
        self.data.lock().tag
    }

    /// Skip registration of this type.
    pub fn ignore(&self) -> &Self {
        self.data.lock().ignored = true;
        self
    }

    /// Whether registration of this type is skipped.
    pub fn is_ignored(&self) -> bool {
        self.data.lock().ignored
    }

    pub fn with_scope(&self, scope: Scope) -> &Self {
        self.data.lock().scope = scope;
        self
    }

    pub fn scope(&self) -> Scope {
        self.data.lock().scope
    }

    /// Adds or replaces a constructor argument.
    pub fn argument(&self, argument: Argument) -> &Self {
        self.data.lock().set_argument(argument);
        self
    }

    pub fn arguments(&self, arguments: impl IntoIterator<Item = Argument>) -> &Self {
        let mut data = self.data.lock();
        for argument in arguments {
            data.set_argument(argument);
        }
        drop(data);
        self
    }

    fn member(list: &mut Vec<MemberConfig>, name: &str, injected_name: &str) {
        let member = MemberConfig {
            name: name.to_string(),
            injected_name: Arc::from(injected_name),
        };
        if !list.contains(&member) {
            list.push(member);
        }
    }

    pub fn inject_field(&self, field: &str) -> &Self {
        self.inject_field_named(field, "")
    }

    /// Injects a field from the registration called `injected_name`.
    pub fn inject_field_named(&self, field: &str, injected_name: &str) -> &Self {
        Self::member(&mut self.data.lock().fields, field, injected_name);
        self
    }

    pub fn inject_property(&self, property: &str) -> &Self {
        self.inject_property_named(property, "")
    }

    /// Injects a property from the registration called `injected_name`.
    pub fn inject_property_named(&self, property: &str, injected_name: &str) -> &Self {
        Self::member(&mut self.data.lock().properties, property, injected_name);
        self
    }

    /// Calls a method after construction; its arguments can be configured
    /// on the returned handle.
    pub fn inject_method(&self, method: &str) -> MethodConfiguration {
        let config = Arc::new(Mutex::new(MethodConfig::default()));
        self.data
            .lock()
            .methods
            .push((method.to_string(), config.clone()));
        MethodConfiguration { data: config }
    }

    /// Injects the members of the nested component stored in `field`,
    /// returning the configuration of the component's type `C`.
    pub fn inject_for_component<C: ?Sized + 'static>(&self, field: &str) -> DiResult<TypeConfiguration> {
        let tag = TypeTag::of::<C>();
        let data = self.manager.lock().get("", tag)?;
        union(&mut self.data.lock().components, &[(field.to_string(), tag)]);
        Ok(TypeConfiguration::new(data, self.manager.clone()))
    }

    /// Runs `callback` on every instance after injection.
    ///
    /// Setting a new callback replaces the previous one.
    pub fn after_resolve<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Container, &Object) + Send + Sync + 'static,
    {
        self.data.lock().callback = Some(Arc::new(callback));
        self
    }

    pub(crate) fn snapshot(&self) -> TypeConfigData {
        self.data.lock().clone()
    }
}

impl fmt::Debug for TypeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.lock();
        f.debug_struct("TypeConfiguration")
            .field("type", &data.tag)
            .field("scope", &data.scope)
            .field("ignored", &data.ignored)
            .field("arguments", &data.arguments)
            .finish()
    }
}

/// Arguments of an injected method.
#[derive(Clone)]
pub struct MethodConfiguration {
    data: Arc<Mutex<MethodConfig>>,
}

impl MethodConfiguration {
    /// Adds or replaces a method argument.
    pub fn argument(&self, argument: Argument) -> &Self {
        let mut data = self.data.lock();
        match data.arguments.iter_mut().find(|a| a.name() == argument.name()) {
            Some(existing) => *existing = argument,
            None => data.arguments.push(argument),
        }
        drop(data);
        self
    }
}

/// Live settings of a registered type.
///
/// Unlike [`TypeConfiguration`], these keep working after registration:
/// the scope and the callback are read on every resolution. For an
/// ignored type the handle is inert.
#[derive(Clone)]
pub struct LifetimeConfiguration {
    live: Option<Arc<LiveSettings>>,
}

pub(crate) struct LiveSettings {
    pub(crate) scope: RwLock<Scope>,
    pub(crate) callback: RwLock<Option<Callback>>,
}

impl LiveSettings {
    pub(crate) fn new(scope: Scope, callback: Option<Callback>) -> Self {
        Self {
            scope: RwLock::new(scope),
            callback: RwLock::new(callback),
        }
    }
}

impl fmt::Debug for LifetimeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("LifetimeConfiguration");
        match &self.live {
            Some(live) => out.field("scope", &*live.scope.read()),
            None => out.field("ignored", &true),
        };
        out.finish()
    }
}

impl LifetimeConfiguration {
    pub(crate) fn live(settings: Arc<LiveSettings>) -> Self {
        Self { live: Some(settings) }
    }

    pub(crate) fn inert() -> Self {
        Self { live: None }
    }

    /// Changes the scope of the registration.
    pub fn with_scope(&self, scope: Scope) -> &Self {
        if let Some(live) = &self.live {
            *live.scope.write() = scope;
        }
        self
    }

    /// Replaces the post-injection callback of the registration.
    pub fn after_resolve<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Container, &Object) + Send + Sync + 'static,
    {
        if let Some(live) = &self.live {
            *live.callback.write() = Some(Arc::new(callback));
        }
        self
    }

    /// Whether the type was skipped at registration.
    pub fn is_ignored(&self) -> bool {
        self.live.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{Component, TypePlan};

    trait Shape {}

    #[derive(Default)]
    struct Circle;

    impl Component for Circle {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.default_constructor();
        }
    }

    #[derive(Default)]
    struct Ring;

    impl Component for Ring {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.extends::<Circle>(|_| Arc::new(Circle)).default_constructor();
        }
    }

    #[test]
    fn built_configurations_are_frozen() {
        let mut manager = ConfigurationManager::default();
        manager.get("", TypeTag::of::<Circle>()).unwrap();
        manager.build("", &TypeInfo::of::<Circle>());

        let err = manager.get("", TypeTag::of::<Circle>()).err().unwrap();
        assert!(err.is_configuration());
        assert!(manager.get("other", TypeTag::of::<Circle>()).is_ok());
    }

    #[test]
    fn most_specific_scope_wins_and_members_merge() {
        let mut manager = ConfigurationManager::default();
        {
            let base = manager.get("", TypeTag::of::<Circle>()).unwrap();
            let mut base = base.lock();
            base.scope = Scope::Singleton;
            base.fields.push(MemberConfig {
                name: "radius".into(),
                injected_name: Arc::from(""),
            });
        }
        {
            let own = manager.get("", TypeTag::of::<Ring>()).unwrap();
            own.lock().scope = Scope::SingletonPerThread;
        }

        let merged = manager.build("", &TypeInfo::of::<Ring>());
        let merged = merged.lock();
        assert_eq!(merged.tag, TypeTag::of::<Ring>());
        assert_eq!(merged.scope, Scope::SingletonPerThread);
        assert_eq!(merged.fields.len(), 1);
    }

    #[test]
    fn inherited_scope_applies_without_own_configuration() {
        let mut manager = ConfigurationManager::default();
        manager.get("", TypeTag::of::<Circle>()).unwrap().lock().scope = Scope::Singleton;
        assert_eq!(manager.build("", &TypeInfo::of::<Ring>()).lock().scope, Scope::Singleton);
        assert_eq!(manager.build("", &TypeInfo::interface::<dyn Shape>()).lock().scope, Scope::Transient);
    }
}
