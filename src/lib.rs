//! # autowire
//!
//! A dependency injection container that builds object graphs from
//! registered components, injecting constructor parameters, fields,
//! properties and methods by type and optional name.
//!
//! ## Features
//!
//! - **Three scopes**: transient, singleton and singleton-per-thread
//! - **Interface resolution**: a component is reachable through every base
//!   and interface it declares
//! - **User-provided arguments**: constructor parameters supplied at resolve
//!   time select the matching constructor
//! - **Member injection**: fields, properties, methods and nested components,
//!   configured per type
//! - **Child containers**: children see their parent's registrations, never
//!   the other way around
//! - **Circular dependency detection**: cycles fail with the offending path
//!   instead of overflowing the stack
//!
//! ## Quick Start
//!
//! ```rust
//! use autowire::{Component, Container, Param, Resolver, Scope, TypePlan};
//! use std::sync::Arc;
//!
//! trait Storage: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//!
//! #[derive(Default)]
//! struct Postgres;
//!
//! impl Storage for Postgres {
//!     fn url(&self) -> &str {
//!         "postgres://localhost"
//!     }
//! }
//!
//! impl Component for Postgres {
//!     fn describe(plan: &mut TypePlan<Self>) {
//!         plan.implements::<dyn Storage>(|p| p).default_constructor();
//!     }
//! }
//!
//! struct Users {
//!     storage: Arc<dyn Storage>,
//! }
//!
//! impl Component for Users {
//!     fn describe(plan: &mut TypePlan<Self>) {
//!         plan.constructor(vec![Param::of::<dyn Storage>("storage")], |v| {
//!             Ok(Users { storage: v.get(0)? })
//!         });
//!     }
//! }
//!
//! let container = Container::new();
//! container.register().type_of::<Postgres>().unwrap().with_scope(Scope::Singleton);
//! container.register().type_of::<Users>().unwrap();
//!
//! let users = container.resolve_required::<Users>(&[]).unwrap();
//! assert_eq!(users.storage.url(), "postgres://localhost");
//! ```
//!
//! ## User-provided arguments
//!
//! ```rust
//! use autowire::{Arg, Argument, Component, Container, Param, Resolver, TypePlan};
//!
//! struct Greeting {
//!     text: String,
//! }
//!
//! impl Component for Greeting {
//!     fn describe(plan: &mut TypePlan<Self>) {
//!         plan.constructor(vec![Param::of::<String>("text")], |v| {
//!             Ok(Greeting { text: v.cloned(0)? })
//!         });
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .configure::<Greeting>()
//!     .unwrap()
//!     .argument(Argument::user_provided("text"));
//! container.register().type_of::<Greeting>().unwrap();
//!
//! let greeting = container
//!     .resolve_required::<Greeting>(&[Arg::value(String::from("hi"))])
//!     .unwrap();
//! assert_eq!(greeting.text, "hi");
//! ```

pub mod arg;
pub mod argument;
pub mod assembly;
#[cfg(feature = "config")]
pub mod config;
pub mod configuration;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lazy;
pub mod lifetime;
pub mod registration;
pub mod traits;

mod injection;
mod internal;
mod metadata;
mod provider;

pub use arg::{Arg, Object};
pub use argument::{Argument, ResolutionMode};
pub use assembly::{Assembly, AssemblyCatalog};
#[cfg(feature = "config")]
pub use config::{ArgumentConfig, ArgumentType, AutowireSection, ContainerConfig, TypeConfig};
pub use configuration::{LifetimeConfiguration, MethodConfiguration, TypeConfiguration};
pub use container::{Container, WeakContainer};
pub use descriptors::{Component, Dependency, Param, TypeInfo, TypePlan, Values};
pub use error::{DiError, DiResult};
pub use key::{compute_key, Key, TypeTag};
pub use lazy::{Func, TypedResolver};
pub use lifetime::Scope;
pub use registration::{RegistrationHandler, Registrator};
pub use traits::{Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    trait Bar: Send + Sync {
        fn id(&self) -> u32;
    }

    #[derive(Default)]
    struct Bar1;

    impl Bar for Bar1 {
        fn id(&self) -> u32 {
            1
        }
    }

    impl Component for Bar1 {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.implements::<dyn Bar>(|b| b).default_constructor();
        }
    }

    #[derive(Default)]
    struct Bar2;

    impl Bar for Bar2 {
        fn id(&self) -> u32 {
            2
        }
    }

    impl Component for Bar2 {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.implements::<dyn Bar>(|b| b).default_constructor();
        }
    }

    #[derive(Default)]
    struct Holder {
        bar: Mutex<Option<Arc<dyn Bar>>>,
    }

    impl Component for Holder {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.default_constructor()
                .field::<dyn Bar>("bar", |h, bar| *h.bar.lock() = Some(bar));
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let container = Container::new();
        container.register().type_of::<Bar1>().unwrap().with_scope(Scope::Singleton);

        let a = container.resolve_required::<Bar1>(&[]).unwrap();
        let b = container.resolve_required::<dyn Bar>(&[]).unwrap();
        assert_eq!(b.id(), 1);
        assert_eq!(Arc::as_ptr(&a) as *const u8, Arc::as_ptr(&b) as *const u8);
    }

    #[test]
    fn test_transient_resolution() {
        let container = Container::new();
        container.register().type_of::<Bar1>().unwrap();

        let a = container.resolve_required::<Bar1>(&[]).unwrap();
        let b = container.resolve_required::<Bar1>(&[]).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_ambiguous_interface() {
        let lenient = Container::new();
        lenient.register().type_of::<Bar1>().unwrap();
        lenient.register().type_of::<Bar2>().unwrap();
        assert!(lenient.resolve::<dyn Bar>(&[]).unwrap().is_none());
        assert_eq!(lenient.resolve_all::<dyn Bar>(&[]).unwrap().len(), 2);

        let strict = Container::strict();
        strict.register().type_of::<Bar1>().unwrap();
        strict.register().type_of::<Bar2>().unwrap();
        assert!(matches!(
            strict.resolve::<dyn Bar>(&[]),
            Err(DiError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn test_field_injection() {
        let container = Container::new();
        container.configure::<Holder>().unwrap().inject_field("bar");
        container.register().type_of::<Holder>().unwrap();
        container.register().type_of::<Bar2>().unwrap();

        let holder = container.resolve_required::<Holder>(&[]).unwrap();
        assert_eq!(holder.bar.lock().as_ref().map(|b| b.id()), Some(2));
    }

    #[test]
    fn test_child_sees_parent() {
        let parent = Container::new();
        parent.register().type_of::<Bar1>().unwrap();
        let child = parent.create_child();
        child.register().type_of::<Bar2>().unwrap();

        assert!(child.resolve::<Bar1>(&[]).unwrap().is_some());
        assert!(parent.resolve::<Bar2>(&[]).unwrap().is_none());
    }
}
