use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::arg::{Arg, Object};
use crate::argument::Parameter;
use crate::container::{Container, WeakContainer};
use crate::descriptors::CtorFn;
use crate::error::DiResult;
use crate::injection::resolve_values;
use crate::internal::{DisposeBag, StackGuard};
use crate::key::TypeTag;
use crate::lifetime::Scope;
use crate::metadata::TypeMetadata;
use crate::provider::Provider;

/// One constructor of a registered type.
///
/// A core is shared by every key the constructor is filed under, so its
/// tracked instances are disposed exactly once.
pub(crate) struct ConstructorCore {
    owner: WeakContainer,
    metadata: Arc<TypeMetadata>,
    parameters: Vec<Parameter>,
    user_parameters: Vec<TypeTag>,
    invoke: CtorFn,
    tracked: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl ConstructorCore {
    pub(crate) fn new(
        owner: WeakContainer,
        metadata: Arc<TypeMetadata>,
        parameters: Vec<Parameter>,
        invoke: CtorFn,
    ) -> Self {
        let user_parameters = parameters
            .iter()
            .filter(|p| p.is_user_provided())
            .map(Parameter::declared)
            .collect();
        Self {
            owner,
            metadata,
            parameters,
            user_parameters,
            invoke,
            tracked: Mutex::new(DisposeBag::default()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Declared types of the user-provided parameters, in order.
    pub(crate) fn user_parameters(&self) -> &[TypeTag] {
        &self.user_parameters
    }

    fn construct(&self, container: &Container, args: &[Arg]) -> DiResult<Object> {
        let info = &self.metadata.info;
        let values = resolve_values(container, info.name(), &self.parameters, args)?;
        let value = (self.invoke)(&values)?;
        Ok(Object::from_parts(value, info.clone()))
    }

    fn track(&self, object: &Object) {
        if !self.metadata.info.is_disposable() {
            return;
        }
        let info = self.metadata.info.clone();
        let value = object.value().clone();
        self.tracked.lock().push(Box::new(move || info.dispose(&value)));
    }

    /// Marks this constructor as in progress on the current thread until
    /// the instance is built and injected.
    fn enter(&self) -> DiResult<StackGuard> {
        StackGuard::enter(self as *const Self as usize, self.metadata.info.name())
    }

    fn build_transient(&self, container: &Container, args: &[Arg]) -> DiResult<Object> {
        let _frame = self.enter()?;
        let object = self.construct(container, args)?;
        self.metadata.inject(container, &object)?;
        self.track(&object);
        Ok(object)
    }

    fn build_cached(&self, container: &Container, scope: Scope, args: &[Arg]) -> DiResult<Object> {
        let metadata = &self.metadata;
        if let Some(object) = metadata.cached(scope) {
            return Ok(object);
        }

        let _init = metadata.lock_init();
        if let Some(object) = metadata.cached(scope) {
            return Ok(object);
        }
        // Re-entered from our own member injection.
        if let Some(object) = metadata.pending() {
            return Ok(object);
        }

        let _frame = self.enter()?;
        let object = self.construct(container, args)?;
        metadata.begin(&object);
        if let Err(e) = metadata.inject(container, &object) {
            metadata.abandon();
            return Err(e);
        }
        metadata.publish(scope, &object);

        if scope == Scope::Singleton && !self.user_parameters.is_empty() {
            if let Some(owner) = self.owner.upgrade() {
                owner.set_as_singleton(&metadata.name, &object);
            }
        }
        self.track(&object);
        debug!(
            type_name = metadata.info.name(),
            scope = ?scope,
            "Cached new instance"
        );
        Ok(object)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = self.tracked.lock().drain_reverse();
        if !hooks.is_empty() {
            trace!(type_name = self.metadata.info.name(), count = hooks.len(), "Disposing instances");
        }
        for hook in hooks {
            hook();
        }
    }
}

/// A constructor filed under one particular key.
pub(crate) struct ConstructorProvider {
    core: Arc<ConstructorCore>,
    user_registered: bool,
}

impl ConstructorProvider {
    pub(crate) fn new(core: Arc<ConstructorCore>, user_registered: bool) -> Self {
        Self { core, user_registered }
    }
}

impl Provider for ConstructorProvider {
    fn is_user_registered(&self) -> bool {
        self.user_registered
    }

    fn can_invoke(&self, ty: TypeTag, args: &[Arg]) -> bool {
        let user = self.core.user_parameters();
        self.core.metadata.info.can_view(ty)
            && user.len() == args.len()
            && user.iter().zip(args).all(|(tag, arg)| arg.is_assignable_to(*tag))
    }

    fn invoke(&self, container: &Container, _ty: TypeTag, args: &[Arg]) -> DiResult<Object> {
        match self.core.metadata.scope() {
            Scope::Transient => self.core.build_transient(container, args),
            scope => self.core.build_cached(container, scope, args),
        }
    }

    fn dispose(&self) {
        self.core.dispose();
    }

    fn has_pending_disposal(&self) -> bool {
        !self.core.disposed.load(Ordering::SeqCst) && !self.core.tracked.lock().is_empty()
    }
}
