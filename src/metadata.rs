//! Per-registration state shared by every constructor of a type.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};

use crate::arg::Object;
use crate::configuration::LiveSettings;
use crate::container::Container;
use crate::descriptors::TypeInfo;
use crate::error::DiResult;
use crate::injection::InjectionPlan;
use crate::lifetime::Scope;

/// Everything one `(name, type)` registration shares across its
/// constructors: live settings, the injection plan and the cached
/// instances.
///
/// A cached instance is published only once member injection succeeded.
/// While it is being injected it sits in `pending`, which only the thread
/// holding `init` reads, so other threads wait instead of seeing it half
/// built.
///
/// Per-thread instances stay in `per_thread` until the container is
/// dropped, including those of threads that have since exited.
pub(crate) struct TypeMetadata {
    pub(crate) name: Arc<str>,
    pub(crate) info: Arc<TypeInfo>,
    live: Arc<LiveSettings>,
    plan: InjectionPlan,
    singleton: RwLock<Option<Object>>,
    per_thread: RwLock<HashMap<ThreadId, Object, ahash::RandomState>>,
    pending: Mutex<Option<Object>>,
    init: ReentrantMutex<()>,
}

impl TypeMetadata {
    pub(crate) fn new(name: &str, info: Arc<TypeInfo>, live: Arc<LiveSettings>, plan: InjectionPlan) -> Self {
        Self {
            name: Arc::from(name),
            info,
            live,
            plan,
            singleton: RwLock::new(None),
            per_thread: RwLock::new(HashMap::default()),
            pending: Mutex::new(None),
            init: ReentrantMutex::new(()),
        }
    }

    pub(crate) fn scope(&self) -> Scope {
        *self.live.scope.read()
    }

    /// The published instance for `scope` on the calling thread.
    pub(crate) fn cached(&self, scope: Scope) -> Option<Object> {
        match scope {
            Scope::Transient => None,
            Scope::Singleton => self.singleton.read().clone(),
            Scope::SingletonPerThread => self.per_thread.read().get(&thread::current().id()).cloned(),
        }
    }

    /// The instance still being injected. Only meaningful while holding
    /// [`lock_init`](Self::lock_init).
    pub(crate) fn pending(&self) -> Option<Object> {
        self.pending.lock().clone()
    }

    pub(crate) fn begin(&self, object: &Object) {
        *self.pending.lock() = Some(object.clone());
    }

    pub(crate) fn abandon(&self) {
        *self.pending.lock() = None;
    }

    /// Moves the pending instance into the slot for `scope`; an occupied
    /// slot is never overwritten.
    pub(crate) fn publish(&self, scope: Scope, object: &Object) {
        match scope {
            Scope::Transient => {}
            Scope::Singleton => {
                self.singleton.write().get_or_insert_with(|| object.clone());
            }
            Scope::SingletonPerThread => {
                self.per_thread
                    .write()
                    .entry(thread::current().id())
                    .or_insert_with(|| object.clone());
            }
        }
        self.abandon();
    }

    /// Serializes creation of cached instances of this type.
    pub(crate) fn lock_init(&self) -> ReentrantMutexGuard<'_, ()> {
        self.init.lock()
    }

    /// Runs member injection, then the registration's callback.
    pub(crate) fn inject(&self, container: &Container, object: &Object) -> DiResult<()> {
        self.plan.inject(container, object)?;
        let callback = self.live.callback.read().clone();
        if let Some(callback) = callback {
            callback(container, object);
        }
        Ok(())
    }
}
