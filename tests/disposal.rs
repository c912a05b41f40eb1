use autowire::{Component, Container, DiError, Dispose, Resolver, Scope, TypePlan};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Connection {
    id: usize,
    log: Log,
}

impl Dispose for Connection {
    fn dispose(&self) {
        self.log.lock().unwrap().push(format!("connection-{}", self.id));
    }
}

impl Component for Connection {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![autowire::Param::of::<Mutex<Vec<String>>>("log")], |v| {
            static NEXT: AtomicUsize = AtomicUsize::new(0);
            Ok(Connection {
                id: NEXT.fetch_add(1, Ordering::SeqCst),
                log: v.get(0)?,
            })
        })
        .disposable();
    }
}

fn container_with_log() -> (Container, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let container = Container::new();
    container.register().shared(log.clone()).unwrap();
    (container, log)
}

#[test]
fn test_singleton_disposed_exactly_once() {
    let (container, log) = container_with_log();
    container.register().type_of::<Connection>().unwrap().with_scope(Scope::Singleton);

    let a = container.resolve_required::<Connection>(&[]).unwrap();
    let b = container.resolve_required::<Connection>(&[]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    container.dispose();
    container.dispose();

    let entries = log.lock().unwrap().clone();
    assert_eq!(entries, vec![format!("connection-{}", a.id)]);
}

#[test]
fn test_transient_instances_disposed_lifo() {
    let (container, log) = container_with_log();
    container.register().type_of::<Connection>().unwrap();

    let first = container.resolve_required::<Connection>(&[]).unwrap();
    let second = container.resolve_required::<Connection>(&[]).unwrap();
    container.dispose();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec![format!("connection-{}", second.id), format!("connection-{}", first.id)]
    );
}

#[test]
fn test_disposed_container_rejects_operations() {
    let (container, _log) = container_with_log();
    container.register().type_of::<Connection>().unwrap();
    container.dispose();

    assert!(container.is_disposed());
    assert!(matches!(container.resolve::<Connection>(&[]), Err(DiError::Disposed)));
    assert!(matches!(container.resolve_all::<Connection>(&[]), Err(DiError::Disposed)));
    assert!(matches!(container.is_registered::<Connection>(), Err(DiError::Disposed)));
    assert!(matches!(container.configure::<String>(), Err(DiError::Disposed)));
    assert!(matches!(container.register().value(1u8), Err(DiError::Disposed)));
}

#[test]
fn test_non_disposable_types_are_not_tracked() {
    #[derive(Default)]
    struct Plain;

    impl Component for Plain {
        fn describe(plan: &mut TypePlan<Self>) {
            plan.default_constructor();
        }
    }

    let (container, log) = container_with_log();
    container.register().type_of::<Plain>().unwrap();
    container.resolve_required::<Plain>(&[]).unwrap();
    container.dispose();

    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_child_disposal_leaves_parent_alone() {
    let (parent, log) = container_with_log();
    parent.register().type_of::<Connection>().unwrap().with_scope(Scope::Singleton);

    let child = parent.create_child();
    let from_child = child.resolve_required::<Connection>(&[]).unwrap();
    child.dispose();

    assert!(log.lock().unwrap().is_empty());
    let from_parent = parent.resolve_required::<Connection>(&[]).unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));

    parent.dispose();
    assert_eq!(log.lock().unwrap().len(), 1);
}
