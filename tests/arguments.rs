use autowire::{Arg, Argument, Component, Container, DiError, Param, Resolver, Scope, TypePlan};
use std::sync::Arc;

struct Args1 {
    arg: String,
}

impl Component for Args1 {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![Param::of::<String>("arg")], |v| Ok(Args1 { arg: v.cloned(0)? }));
    }
}

fn args1_container(strict: bool) -> Container {
    let container = Container::with_strict(strict);
    container
        .configure::<Args1>()
        .unwrap()
        .argument(Argument::user_provided("arg"));
    container.register().type_of::<Args1>().unwrap();
    container
}

#[test]
fn test_user_provided_argument() {
    let container = args1_container(true);
    let resolved = container
        .resolve_required::<Args1>(&[Arg::value(String::from("hello"))])
        .unwrap();
    assert_eq!(resolved.arg, "hello");
}

#[test]
fn test_missing_user_argument() {
    let strict = args1_container(true);
    assert!(matches!(strict.resolve::<Args1>(&[]), Err(DiError::NotFound(_))));

    let lenient = args1_container(false);
    assert!(lenient.resolve::<Args1>(&[]).unwrap().is_none());
}

#[test]
fn test_wrong_argument_type() {
    let strict = args1_container(true);
    assert!(strict.resolve::<Args1>(&[Arg::value(42u32)]).is_err());
    assert!(strict
        .resolve::<Args1>(&[Arg::value(String::from("a")), Arg::value(String::from("b"))])
        .is_err());
}

#[test]
fn test_typed_null_argument() {
    struct Maybe {
        value: Option<Arc<String>>,
    }

    impl Component for Maybe {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.constructor(vec![Param::of::<String>("value")], |v| {
                Ok(Maybe { value: v.get_opt(0)? })
            });
        }
    }

    let container = Container::strict();
    container
        .configure::<Maybe>()
        .unwrap()
        .argument(Argument::user_provided("value"));
    container.register().type_of::<Maybe>().unwrap();

    let empty = container.resolve_required::<Maybe>(&[Arg::null::<String>()]).unwrap();
    assert!(empty.value.is_none());
    let full = container
        .resolve_required::<Maybe>(&[Arg::value(String::from("x"))])
        .unwrap();
    assert_eq!(full.value.as_deref().map(String::as_str), Some("x"));
}

#[test]
fn test_fixed_argument() {
    struct Port {
        value: u16,
    }

    impl Component for Port {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.constructor(vec![Param::of::<u16>("value")], |v| Ok(Port { value: v.cloned(0)? }));
        }
    }

    let container = Container::strict();
    container
        .configure::<Port>()
        .unwrap()
        .argument(Argument::fixed_value("value", 8080u16));
    container.register().type_of::<Port>().unwrap();

    assert_eq!(container.resolve_required::<Port>(&[]).unwrap().value, 8080);
}

trait Store: Send + Sync {
    fn label(&self) -> &'static str;
}

#[derive(Default)]
struct Primary;

impl Store for Primary {
    fn label(&self) -> &'static str {
        "primary"
    }
}

impl Component for Primary {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.implements::<dyn Store>(|s| s).default_constructor();
    }
}

#[derive(Default)]
struct Backup;

impl Store for Backup {
    fn label(&self) -> &'static str {
        "backup"
    }
}

impl Component for Backup {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.implements::<dyn Store>(|s| s).default_constructor();
    }
}

struct Repository {
    store: Arc<dyn Store>,
}

impl Component for Repository {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![Param::of::<dyn Store>("store")], |v| {
            Ok(Repository { store: v.get(0)? })
        });
    }
}

#[test]
fn test_named_argument() {
    let container = Container::strict();
    container.register().type_of::<Primary>().unwrap();
    container.register().named_type::<Backup>("backup").unwrap();
    container
        .configure::<Repository>()
        .unwrap()
        .argument(Argument::named("store", "backup"));
    container.register().type_of::<Repository>().unwrap();

    assert_eq!(container.resolve_required::<Repository>(&[]).unwrap().store.label(), "backup");
}

#[test]
fn test_use_type_argument() {
    let container = Container::strict();
    container.register().type_of::<Primary>().unwrap();
    container.register().type_of::<Backup>().unwrap();
    container
        .configure::<Repository>()
        .unwrap()
        .argument(Argument::use_type::<Backup>("store"));
    container.register().type_of::<Repository>().unwrap();

    // Both stores implement the trait, so only the override disambiguates.
    assert!(container.resolve::<dyn Store>(&[]).is_err());
    assert_eq!(container.resolve_required::<Repository>(&[]).unwrap().store.label(), "backup");
}

struct Wrapper {
    store: Arc<dyn Store>,
}

impl Component for Wrapper {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![Param::of::<dyn Store>("store")], |v| {
            Ok(Wrapper { store: v.get(0)? })
        });
    }
}

fn wrapper_container(strict: bool) -> Container {
    let container = Container::with_strict(strict);
    container
        .configure::<Wrapper>()
        .unwrap()
        .argument(Argument::user_provided("store"));
    container.register().type_of::<Wrapper>().unwrap();
    container
}

#[test]
fn test_argument_matched_through_interface() {
    let container = wrapper_container(true);
    let wrapper = container
        .resolve_required::<Wrapper>(&[Arg::component(Backup)])
        .unwrap();
    assert_eq!(wrapper.store.label(), "backup");
}

#[test]
fn test_singleton_with_arguments_becomes_the_default() {
    let container = Container::strict();
    container
        .configure::<Args1>()
        .unwrap()
        .argument(Argument::user_provided("arg"));
    container.register().type_of::<Args1>().unwrap().with_scope(Scope::Singleton);

    let first = container
        .resolve_required::<Args1>(&[Arg::value(String::from("first"))])
        .unwrap();
    let plain = container.resolve_required::<Args1>(&[]).unwrap();
    assert!(Arc::ptr_eq(&first, &plain));
    assert_eq!(plain.arg, "first");
}

#[test]
fn test_constructor_selected_by_arguments() {
    struct Pair {
        label: String,
    }

    impl Component for Pair {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.constructor(Vec::new(), |_| Ok(Pair { label: "none".into() }))
                .constructor(vec![Param::of::<String>("a")], |v| {
                    Ok(Pair { label: format!("one:{}", v.get::<String>(0)?) })
                })
                .constructor(vec![Param::of::<String>("a"), Param::of::<u32>("b")], |v| {
                    Ok(Pair {
                        label: format!("two:{}:{}", v.get::<String>(0)?, v.get::<u32>(1)?),
                    })
                });
        }
    }

    let container = Container::strict();
    container.configure::<Pair>().unwrap().arguments([
        Argument::user_provided("a"),
        Argument::user_provided("b"),
    ]);
    container.register().type_of::<Pair>().unwrap();

    let none = container.resolve_required::<Pair>(&[]).unwrap();
    let one = container
        .resolve_required::<Pair>(&[Arg::value(String::from("x"))])
        .unwrap();
    let two = container
        .resolve_required::<Pair>(&[Arg::value(String::from("x")), Arg::value(7u32)])
        .unwrap();

    assert_eq!(none.label, "none");
    assert_eq!(one.label, "one:x");
    assert_eq!(two.label, "two:x:7");
}

#[test]
fn test_plain_argument_then_component_argument() {
    let container = wrapper_container(false);

    // A plain value exposes no interfaces, so nothing accepts it.
    assert!(container.resolve::<Wrapper>(&[Arg::value(Backup)]).unwrap().is_none());

    let wrapper = container.resolve::<Wrapper>(&[Arg::component(Backup)]).unwrap();
    assert_eq!(wrapper.map(|w| w.store.label()), Some("backup"));
}

#[test]
fn test_component_argument_then_plain_argument() {
    let container = wrapper_container(false);

    let wrapper = container.resolve::<Wrapper>(&[Arg::component(Backup)]).unwrap();
    assert_eq!(wrapper.map(|w| w.store.label()), Some("backup"));

    assert!(container.resolve::<Wrapper>(&[Arg::value(Backup)]).unwrap().is_none());
    let again = container.resolve::<Wrapper>(&[Arg::component(Primary)]).unwrap();
    assert_eq!(again.map(|w| w.store.label()), Some("primary"));
}

#[test]
fn test_rejected_plain_argument_is_not_found_when_strict() {
    let container = wrapper_container(true);
    container.resolve_required::<Wrapper>(&[Arg::component(Backup)]).unwrap();
    assert!(matches!(
        container.resolve::<Wrapper>(&[Arg::value(Backup)]),
        Err(DiError::NotFound(_))
    ));
}
