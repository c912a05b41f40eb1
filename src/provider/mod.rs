//! Providers: the entries of a container's lookup table.
//!
//! A provider knows whether it can serve a request and how to produce the
//! value. The same provider may be filed under several keys.

mod constructor;

use crate::arg::{Arg, Object};
use crate::container::{Container, WeakContainer};
use crate::error::{DiError, DiResult};
use crate::key::TypeTag;

pub(crate) use constructor::{ConstructorCore, ConstructorProvider};

pub(crate) trait Provider: Send + Sync {
    /// Explicit registrations win over implicit ones when several match.
    fn is_user_registered(&self) -> bool;

    /// Whether this provider can produce `ty` from `args`.
    fn can_invoke(&self, ty: TypeTag, args: &[Arg]) -> bool;

    /// Produces the value. Dependencies resolve against `container`, the
    /// container the request was originally made on.
    fn invoke(&self, container: &Container, ty: TypeTag, args: &[Arg]) -> DiResult<Object>;

    /// Releases tracked instances. Idempotent.
    fn dispose(&self) {}

    /// Whether disposing would still release anything.
    fn has_pending_disposal(&self) -> bool {
        false
    }
}

/// Always returns one pre-built instance.
pub(crate) struct InstanceProvider {
    object: Object,
}

impl InstanceProvider {
    pub(crate) fn new(object: Object) -> Self {
        Self { object }
    }
}

impl Provider for InstanceProvider {
    fn is_user_registered(&self) -> bool {
        true
    }

    fn can_invoke(&self, ty: TypeTag, args: &[Arg]) -> bool {
        args.is_empty() && self.object.is_assignable_to(ty)
    }

    fn invoke(&self, _container: &Container, _ty: TypeTag, _args: &[Arg]) -> DiResult<Object> {
        Ok(self.object.clone())
    }
}

/// Returns the container that owns the table this provider sits in.
pub(crate) struct SelfProvider {
    container: WeakContainer,
}

impl SelfProvider {
    pub(crate) fn new(container: WeakContainer) -> Self {
        Self { container }
    }
}

impl Provider for SelfProvider {
    fn is_user_registered(&self) -> bool {
        true
    }

    fn can_invoke(&self, ty: TypeTag, args: &[Arg]) -> bool {
        args.is_empty() && ty == TypeTag::of::<Container>()
    }

    fn invoke(&self, _container: &Container, _ty: TypeTag, _args: &[Arg]) -> DiResult<Object> {
        let owner = self.container.upgrade().ok_or(DiError::Disposed)?;
        Ok(Object::plain(owner))
    }
}
