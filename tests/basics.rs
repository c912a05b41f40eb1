use autowire::{Component, Container, DiError, Object, Param, Resolver, ResolverCore, Scope, TypePlan, TypeTag};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait IBar: Send + Sync {
    fn name(&self) -> &'static str;
}

trait IFoo: Send + Sync {
    fn bar(&self) -> &Arc<dyn IBar>;
}

#[derive(Default)]
struct Bar;

impl IBar for Bar {
    fn name(&self) -> &'static str {
        "bar"
    }
}

impl Component for Bar {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.implements::<dyn IBar>(|b| b).default_constructor();
    }
}

struct Foo {
    bar: Arc<dyn IBar>,
}

impl IFoo for Foo {
    fn bar(&self) -> &Arc<dyn IBar> {
        &self.bar
    }
}

impl Component for Foo {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.implements::<dyn IFoo>(|f| f)
            .constructor(vec![Param::of::<dyn IBar>("bar")], |v| Ok(Foo { bar: v.get(0)? }));
    }
}

fn same<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    Arc::as_ptr(a) as *const u8 == Arc::as_ptr(b) as *const u8
}

#[test]
fn test_transient_foo_shares_singleton_bar() {
    let container = Container::new();
    container.register().type_of::<Bar>().unwrap().with_scope(Scope::Singleton);
    container.register().type_of::<Foo>().unwrap();

    let foo1 = container.resolve_required::<dyn IFoo>(&[]).unwrap();
    let foo2 = container.resolve_required::<dyn IFoo>(&[]).unwrap();

    assert!(!same(&foo1, &foo2));
    assert!(same(foo1.bar(), foo2.bar()));
    assert_eq!(foo1.bar().name(), "bar");
}

#[test]
fn test_resolve_by_own_type_and_interface() {
    let container = Container::new();
    container.register().type_of::<Bar>().unwrap();

    let concrete = container.resolve_required::<Bar>(&[]).unwrap();
    let interface = container.resolve_required::<dyn IBar>(&[]).unwrap();
    assert!(!same(&concrete, &interface));

    let container = Container::new();
    container.register().type_of::<Bar>().unwrap().with_scope(Scope::Singleton);
    let concrete = container.resolve_required::<Bar>(&[]).unwrap();
    let interface = container.resolve_required::<dyn IBar>(&[]).unwrap();
    assert!(same(&concrete, &interface));
}

#[test]
fn test_explicit_registration_beats_implicit() {
    struct Other;
    impl IBar for Other {
        fn name(&self) -> &'static str {
            "other"
        }
    }

    let container = Container::strict();
    container.register().type_of::<Bar>().unwrap();
    container.register().shared::<dyn IBar>(Arc::new(Other)).unwrap();

    assert_eq!(container.resolve_required::<dyn IBar>(&[]).unwrap().name(), "other");
    assert_eq!(container.resolve_required::<Bar>(&[]).unwrap().name(), "bar");
}

trait BarBase: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Default)]
struct BarDerived;

impl BarBase for BarDerived {
    fn id(&self) -> u32 {
        1
    }
}

impl Component for BarDerived {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.extends::<dyn BarBase>(|b| b).default_constructor();
    }
}

#[derive(Default)]
struct BarDerived2;

impl BarBase for BarDerived2 {
    fn id(&self) -> u32 {
        2
    }
}

impl Component for BarDerived2 {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.extends::<dyn BarBase>(|b| b).default_constructor();
    }
}

#[test]
fn test_implicit_matches_are_ambiguous() {
    let strict = Container::strict();
    strict.register().type_of::<BarDerived>().unwrap();
    strict.register().type_of::<BarDerived2>().unwrap();

    match strict.resolve::<dyn BarBase>(&[]) {
        Err(DiError::Ambiguous { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected ambiguity, got {:?}", other.map(|o| o.is_some())),
    }
    assert_eq!(strict.resolve_required::<BarDerived2>(&[]).unwrap().id(), 2);

    let lenient = Container::new();
    lenient.register().type_of::<BarDerived>().unwrap();
    lenient.register().type_of::<BarDerived2>().unwrap();
    assert!(lenient.resolve::<dyn BarBase>(&[]).unwrap().is_none());
}

#[test]
fn test_single_implicit_match_resolves() {
    let container = Container::strict();
    container.register().type_of::<BarDerived>().unwrap();
    assert_eq!(container.resolve_required::<dyn BarBase>(&[]).unwrap().id(), 1);
}

#[test]
fn test_unregistered_type() {
    let lenient = Container::new();
    assert!(lenient.resolve::<Bar>(&[]).unwrap().is_none());
    assert!(matches!(lenient.resolve_required::<Bar>(&[]), Err(DiError::NotFound(_))));

    let strict = Container::strict();
    assert!(matches!(strict.resolve::<Bar>(&[]), Err(DiError::NotFound(_))));
}

#[test]
fn test_missing_dependency_raises_even_when_lenient() {
    let container = Container::new();
    container.register().type_of::<Foo>().unwrap();

    let err = container.resolve::<Foo>(&[]).err().expect("dependency is missing");
    assert!(err.is_resolution());
    assert!(err.to_string().contains("bar"));
}

#[test]
fn test_named_registrations() {
    let container = Container::new();
    container.register().named_value("host", String::from("primary")).unwrap();
    container.register().named_value("backup", String::from("secondary")).unwrap();

    assert_eq!(*container.resolve_required_by_name::<String>("host", &[]).unwrap(), "primary");
    assert_eq!(*container.resolve_required_by_name::<String>("backup", &[]).unwrap(), "secondary");
    assert!(container.resolve::<String>(&[]).unwrap().is_none());
}

#[test]
fn test_container_injects_itself() {
    struct NeedsContainer {
        container: Arc<Container>,
    }

    impl Component for NeedsContainer {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.constructor(vec![Param::of::<Container>("container")], |v| {
                Ok(NeedsContainer { container: v.get(0)? })
            });
        }
    }

    let container = Container::new();
    container.register().type_of::<NeedsContainer>().unwrap();

    let resolved = container.resolve_required::<NeedsContainer>(&[]).unwrap();
    assert!(Container::ptr_eq(&resolved.container, &container));
    let handle = container.resolve_required::<Container>(&[]).unwrap();
    assert!(Container::ptr_eq(&handle, &container));
}

#[test]
fn test_is_registered() {
    let container = Container::new();
    assert!(!container.is_registered::<Bar>().unwrap());
    container.register().type_of::<Bar>().unwrap();
    assert!(container.is_registered::<Bar>().unwrap());
    assert!(!container.is_registered_named::<Bar>("other").unwrap());
    assert!(!container.is_registered::<dyn IBar>().unwrap());
}

#[test]
fn test_dynamic_resolution() {
    let container = Container::new();
    container.register().type_of::<Bar>().unwrap();

    let object: Object = container
        .resolve_object("", TypeTag::of::<dyn IBar>(), &[])
        .unwrap()
        .unwrap();
    assert_eq!(object.type_tag(), TypeTag::of::<Bar>());
    assert_eq!(object.downcast::<dyn IBar>().unwrap().name(), "bar");
}

#[test]
fn test_constructor_runs_per_transient_resolution() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Component for Counted {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.constructor(Vec::new(), |_| {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(Counted)
            });
        }
    }

    let container = Container::new();
    container.register().type_of::<Counted>().unwrap();
    for _ in 0..3 {
        container.resolve_required::<Counted>(&[]).unwrap();
    }
    assert_eq!(BUILT.load(Ordering::SeqCst), 3);
}
