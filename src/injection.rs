//! Resolution of parameters and post-construction member injection.

use std::sync::Arc;

use crate::arg::{Arg, Erased, Object};
use crate::argument::{Parameter, ResolutionMode};
use crate::configuration::{Callback, ConfigurationManager, TypeConfigData};
use crate::container::Container;
use crate::descriptors::{
    CollectionAdapter, DependencyKind, DependencySpec, GetterFn, MemberKind, MethodFn, SetterFn, TypeInfo,
    Values,
};
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;
use crate::traits::ResolverCore;

/// Types a registration needs the container to know about.
#[derive(Default)]
pub(crate) struct Requirements {
    pub(crate) resolvers: Vec<(Arc<str>, fn() -> TypeInfo)>,
    pub(crate) collections: Vec<(TypeTag, CollectionAdapter)>,
}

impl Requirements {
    pub(crate) fn note(&mut self, injected_name: &str, dependency: &DependencySpec) {
        match &dependency.kind {
            DependencyKind::Resolver(info) => self.resolvers.push((Arc::from(injected_name), *info)),
            DependencyKind::Collection(adapter) => self.collections.push((dependency.tag, *adapter)),
            DependencyKind::Service | DependencyKind::Lazy(_) => {}
        }
    }

    pub(crate) fn note_parameter(&mut self, parameter: &Parameter) {
        match &parameter.mode {
            ResolutionMode::AutoInjected => self.note("", &parameter.dependency),
            ResolutionMode::Named(name) => self.note(name, &parameter.dependency),
            _ => {}
        }
    }
}

/// Resolves `dependency` under `name`; `None` means nothing matched.
fn resolve_dependency(container: &Container, name: &str, dependency: &DependencySpec) -> DiResult<Option<Erased>> {
    if let DependencyKind::Lazy(make) = &dependency.kind {
        return Ok(Some(make(container.downgrade(), Arc::from(name))));
    }
    view_resolved(container.resolve_object(name, dependency.tag, &[])?, dependency.tag)
}

fn view_resolved(object: Option<Object>, tag: TypeTag) -> DiResult<Option<Erased>> {
    match object {
        Some(object) => object.view(tag).map(Some).ok_or(DiError::TypeMismatch(tag.name())),
        None => Ok(None),
    }
}

/// Turns a miss into a resolution error naming the member.
fn require<T>(
    resolved: DiResult<Option<T>>,
    owner: &'static str,
    describe: impl FnOnce() -> String,
) -> DiResult<T> {
    match resolved {
        Ok(Some(value)) => Ok(value),
        Ok(None) | Err(DiError::NotFound(_)) => Err(DiError::resolution(owner, describe())),
        Err(e) => Err(e),
    }
}

fn unresolved(what: &str, member: &str, tag: TypeTag, injected_name: &str) -> String {
    if injected_name.is_empty() {
        format!("The injected {} '{}' (of type '{}') can not be resolved.", what, member, tag)
    } else {
        format!(
            "The injected {} '{}' (of type '{}', named '{}') can not be resolved.",
            what, member, tag, injected_name
        )
    }
}

/// Produces the value of one constructor or method parameter.
pub(crate) fn resolve_parameter<'a>(
    container: &Container,
    owner: &'static str,
    parameter: &Parameter,
    user_args: &mut impl Iterator<Item = &'a Arg>,
) -> DiResult<Option<Erased>> {
    let declared = parameter.declared();
    match &parameter.mode {
        ResolutionMode::UserProvided => user_args
            .next()
            .ok_or_else(|| {
                DiError::resolution(
                    owner,
                    format!("no user-provided argument for parameter '{}'", parameter.name),
                )
            })?
            .view(declared),
        ResolutionMode::Fixed(arg) => arg.view(declared),
        ResolutionMode::AutoInjected => require(
            resolve_dependency(container, "", &parameter.dependency),
            owner,
            || unresolved("parameter", parameter.name, declared, ""),
        )
        .map(Some),
        ResolutionMode::Named(name) => require(
            resolve_dependency(container, name, &parameter.dependency),
            owner,
            || unresolved("parameter", parameter.name, declared, name),
        )
        .map(Some),
        ResolutionMode::TypeOverride(tag, name) => {
            let object = require(container.resolve_object(name, *tag, &[]), owner, || {
                unresolved("parameter", parameter.name, *tag, name)
            })?;
            object
                .view(declared)
                .map(Some)
                .ok_or(DiError::TypeMismatch(declared.name()))
        }
    }
}

/// Resolves every parameter in order, consuming user arguments as needed.
pub(crate) fn resolve_values(
    container: &Container,
    owner: &'static str,
    parameters: &[Parameter],
    args: &[Arg],
) -> DiResult<Values> {
    let mut user_args = args.iter();
    let mut values = Values::with_capacity(owner, parameters.len());
    for parameter in parameters {
        let value = resolve_parameter(container, owner, parameter, &mut user_args)?;
        values.push(parameter.name, value);
    }
    Ok(values)
}

enum Injector {
    Setter {
        name: &'static str,
        kind: MemberKind,
        dependency: DependencySpec,
        injected_name: Arc<str>,
        set: SetterFn,
    },
    Method {
        params: Vec<Parameter>,
        call: MethodFn,
    },
    Component {
        info: Arc<TypeInfo>,
        get: GetterFn,
        plan: InjectionPlan,
    },
}

impl Injector {
    fn apply(&self, container: &Container, owner: &'static str, object: &Object) -> DiResult<()> {
        match self {
            Injector::Setter {
                name,
                kind,
                dependency,
                injected_name,
                set,
            } => {
                let value = require(
                    resolve_dependency(container, injected_name, dependency),
                    owner,
                    || unresolved(&kind.to_string(), name, dependency.tag, injected_name),
                )?;
                set(object.value(), value)
            }
            Injector::Method { params, call } => {
                let values = resolve_values(container, owner, params, &[])?;
                call(object.value(), &values)
            }
            Injector::Component { info, get, plan } => match get(object.value()) {
                Some(nested) => plan.inject(container, &Object::from_parts(nested, info.clone())),
                None => Ok(()),
            },
        }
    }
}

/// Member injections of one type, in execution order: fields, properties,
/// methods, then nested components.
pub(crate) struct InjectionPlan {
    owner: &'static str,
    injectors: Vec<Injector>,
    callback: Option<Callback>,
}

impl InjectionPlan {
    /// Compiles the configured members of `info`.
    ///
    /// Unknown fields, properties and methods are registration errors;
    /// unknown components are configuration errors.
    pub(crate) fn build(
        configs: &mut ConfigurationManager,
        info: &TypeInfo,
        config: &TypeConfigData,
        callback: Option<Callback>,
        needs: &mut Requirements,
    ) -> DiResult<Self> {
        let mut injectors = Vec::new();

        for (members, kind, label) in [
            (&config.fields, MemberKind::Field, "Field"),
            (&config.properties, MemberKind::Property, "Property"),
        ] {
            for member in members {
                let spec = info.setter(&member.name, kind).ok_or_else(|| {
                    DiError::registration(info.name(), format!("{} '{}' was not found.", label, member.name))
                })?;
                needs.note(&member.injected_name, &spec.dependency);
                injectors.push(Injector::Setter {
                    name: spec.name,
                    kind,
                    dependency: spec.dependency.clone(),
                    injected_name: member.injected_name.clone(),
                    set: spec.set.clone(),
                });
            }
        }

        for (method, method_config) in &config.methods {
            let spec = info.method(method).ok_or_else(|| {
                DiError::registration(info.name(), format!("Method '{}' was not found.", method))
            })?;
            let method_config = method_config.lock();
            let params: Vec<Parameter> = spec
                .params
                .iter()
                .map(|p| Parameter::compile(p, method_config.arguments.iter().find(|a| a.name() == p.name())))
                .collect();
            for parameter in &params {
                needs.note_parameter(parameter);
            }
            injectors.push(Injector::Method {
                params,
                call: spec.call.clone(),
            });
        }

        for (field, tag) in &config.components {
            let spec = info
                .component(field)
                .filter(|c| c.tag == *tag)
                .ok_or_else(|| DiError::configuration(info.name(), format!("The field '{}' was not found.", field)))?;
            let nested_info = (spec.info)();
            let nested_config = configs.build("", &nested_info).lock().clone();
            let nested_callback = nested_config.callback.clone();
            let plan = InjectionPlan::build(configs, &nested_info, &nested_config, nested_callback, needs)?;
            injectors.push(Injector::Component {
                info: Arc::new(nested_info),
                get: spec.get.clone(),
                plan,
            });
        }

        Ok(Self {
            owner: info.name(),
            injectors,
            callback,
        })
    }

    /// Injects every member of `object`, resolving against `container`.
    pub(crate) fn inject(&self, container: &Container, object: &Object) -> DiResult<()> {
        for injector in &self.injectors {
            injector.apply(container, self.owner, object)?;
        }
        if let Some(callback) = &self.callback {
            callback(container, object);
        }
        Ok(())
    }
}
