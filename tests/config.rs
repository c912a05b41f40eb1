#![cfg(feature = "config")]

use autowire::{Arg, Assembly, AutowireSection, Component, Param, Resolver, TypePlan};
use std::sync::Arc;

#[derive(Default)]
struct Foo;

impl Component for Foo {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.default_constructor();
    }
}

#[derive(Default)]
struct Bar;

impl Component for Bar {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.default_constructor();
    }
}

struct Point {
    x: i32,
    y: i32,
}

impl Component for Point {
    fn describe(plan: &mut TypePlan<Self>) {
        plan.constructor(vec![Param::of::<i32>("x"), Param::of::<i32>("y")], |v| {
            Ok(Point {
                x: v.cloned(0)?,
                y: v.cloned(1)?,
            })
        });
    }
}

const YAML: &str = r#"
containers:
  - name: structure
    types:
      - name: Point
        scope: singleton
        ctor:
          - name: x
            type: userprovided
          - name: y
            type: userprovided
  - name: foo_and_bar
    types:
      - name: Foo
        scope: singleton
      - name: app.Bar
"#;

fn assembly() -> Assembly {
    Assembly::new("app").with::<Foo>().with_alias::<Bar>("app.Bar").with::<Point>()
}

#[test]
fn test_section_lists_containers() {
    let section = AutowireSection::from_yaml(YAML).unwrap();
    assert_eq!(section.containers.len(), 2);
    assert!(section.container("structure").is_some());
    assert!(section.container("missing").is_none());
}

#[test]
fn test_scopes_from_configuration() {
    let section = AutowireSection::from_yaml(YAML).unwrap();
    let container = section
        .container("foo_and_bar")
        .unwrap()
        .create(&assembly(), true)
        .unwrap();

    let a = container.resolve_required::<Foo>(&[]).unwrap();
    let b = container.resolve_required::<Foo>(&[]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    container.resolve_required::<Bar>(&[]).unwrap();
    assert!(!container.is_registered::<Point>().unwrap());
}

#[test]
fn test_user_provided_arguments_from_configuration() {
    let section = AutowireSection::from_yaml(YAML).unwrap();
    let container = section
        .container("structure")
        .unwrap()
        .create(&assembly(), false)
        .unwrap();

    let point = container
        .resolve_required::<Point>(&[Arg::value(3i32), Arg::value(4i32)])
        .unwrap();
    assert_eq!((point.x, point.y), (3, 4));

    // A singleton built from arguments becomes the default instance.
    let again = container.resolve_required::<Point>(&[]).unwrap();
    assert!(Arc::ptr_eq(&point, &again));
}

#[test]
fn test_same_document_as_json() {
    let section = AutowireSection::from_json(
        r#"{ "containers": [ { "name": "foo_and_bar", "types": [ { "name": "Foo", "scope": "singleton" } ] } ] }"#,
    )
    .unwrap();
    let yaml = AutowireSection::from_yaml(YAML).unwrap();
    assert_eq!(section.containers[0].types[0], yaml.containers[1].types[0]);
}

#[test]
fn test_unknown_type_is_a_configuration_error() {
    let section = AutowireSection::from_yaml("containers:\n  - name: x\n    types:\n      - name: Missing\n").unwrap();
    let err = section.containers[0].create(&assembly(), false).unwrap_err();
    assert!(err.is_configuration());
}
