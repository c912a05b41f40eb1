//! Named groups of type descriptions that can be registered in one go.

use std::sync::Arc;

use crate::descriptors::{Component, TypeInfo};

struct Entry {
    info: Arc<TypeInfo>,
    alias: Option<String>,
}

/// A named set of types, the unit of bulk registration.
///
/// # Examples
///
/// ```rust
/// use autowire::{Assembly, Component, TypePlan};
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
/// let assembly = Assembly::new("services").with_alias::<Clock>("app.Clock");
///
/// assert!(assembly.find("app.Clock").is_some());
/// assert!(assembly.find("Clock").is_some());
/// assert_eq!(assembly.concrete_types().count(), 1);
/// ```
pub struct Assembly {
    name: String,
    entries: Vec<Entry>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<C: Component>(mut self) -> Self {
        self.add::<C>();
        self
    }

    /// Builder form of [`add_alias`](Self::add_alias).
    pub fn with_alias<C: Component>(mut self, alias: impl Into<String>) -> Self {
        self.add_alias::<C>(alias);
        self
    }

    /// Builder form of [`add_interface`](Self::add_interface).
    pub fn with_interface<T: ?Sized + 'static>(mut self) -> Self {
        self.add_interface::<T>();
        self
    }

    pub fn add<C: Component>(&mut self) -> &mut Self {
        self.add_info(TypeInfo::of::<C>(), None)
    }

    /// Adds `C`, also findable as `alias`.
    pub fn add_alias<C: Component>(&mut self, alias: impl Into<String>) -> &mut Self {
        self.add_info(TypeInfo::of::<C>(), Some(alias.into()))
    }

    /// Adds an abstract type. It is listed but never registered.
    pub fn add_interface<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.add_info(TypeInfo::interface::<T>(), None)
    }

    pub fn add_info(&mut self, info: impl Into<Arc<TypeInfo>>, alias: Option<String>) -> &mut Self {
        self.entries.push(Entry {
            info: info.into(),
            alias,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every type, in insertion order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeInfo>> + '_ {
        self.entries.iter().map(|e| &e.info)
    }

    /// The types that can be registered: not abstract, with a constructor.
    pub fn concrete_types(&self) -> impl Iterator<Item = &Arc<TypeInfo>> + '_ {
        self.types().filter(|info| !info.is_abstract())
    }

    /// Finds a type by alias, full type name or last path segment.
    pub fn find(&self, type_name: &str) -> Option<&Arc<TypeInfo>> {
        self.entries
            .iter()
            .find(|e| e.alias.as_deref() == Some(type_name))
            .or_else(|| self.entries.iter().find(|e| e.info.name() == type_name))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| short_name(e.info.name()) == type_name)
            })
            .map(|e| &e.info)
    }
}

impl std::fmt::Debug for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembly")
            .field("name", &self.name)
            .field("types", &self.entries.len())
            .finish()
    }
}

/// `a::b::Foo<c::Bar>` becomes `Foo<c::Bar>`.
fn short_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Every assembly known to the application.
#[derive(Debug, Default)]
pub struct AssemblyCatalog {
    assemblies: Vec<Assembly>,
}

impl AssemblyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, assembly: Assembly) -> Self {
        self.add(assembly);
        self
    }

    pub fn add(&mut self, assembly: Assembly) -> &mut Self {
        self.assemblies.push(assembly);
        self
    }

    /// Looks up an assembly by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Assembly> {
        self.assemblies
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assembly> + '_ {
        self.assemblies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::TypePlan;

    #[derive(Default)]
    struct Plain;

    impl Component for Plain {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.default_constructor();
        }
    }

    trait Marker {}

    #[test]
    fn short_names() {
        assert_eq!(short_name("a::b::Foo"), "Foo");
        assert_eq!(short_name("Foo"), "Foo");
        assert_eq!(short_name("a::Foo<b::Bar>"), "Foo<b::Bar>");
    }

    #[test]
    fn interfaces_are_listed_but_not_concrete() {
        let assembly = Assembly::new("a").with::<Plain>().with_interface::<dyn Marker>();
        assert_eq!(assembly.types().count(), 2);
        assert_eq!(assembly.concrete_types().count(), 1);
    }

    #[test]
    fn find_by_alias_and_short_name() {
        let assembly = Assembly::new("a").with_alias::<Plain>("plain");
        assert!(assembly.find("plain").is_some());
        assert!(assembly.find("Plain").is_some());
        assert!(assembly.find(std::any::type_name::<Plain>()).is_some());
        assert!(assembly.find("Other").is_none());
    }

    #[test]
    fn catalog_lookup_ignores_case() {
        let catalog = AssemblyCatalog::new().with(Assembly::new("Services"));
        assert!(catalog.find("SERVICES").is_some());
        assert!(catalog.find("services").is_some());
        assert!(catalog.find("other").is_none());
    }
}
