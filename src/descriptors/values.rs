use std::any::type_name;
use std::sync::Arc;

use crate::arg::Erased;
use crate::error::{DiError, DiResult};

/// Resolved parameter values handed to constructors and methods.
///
/// Values are addressed by the position of the parameter in the list the
/// constructor or method was declared with.
pub struct Values {
    owner: &'static str,
    names: Vec<&'static str>,
    items: Vec<Option<Erased>>,
}

impl Values {
    pub(crate) fn with_capacity(owner: &'static str, capacity: usize) -> Self {
        Self {
            owner,
            names: Vec::with_capacity(capacity),
            items: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: Option<Erased>) {
        self.names.push(name);
        self.items.push(value);
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the value at `index` is a typed null.
    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.items.get(index), Some(None))
    }

    /// The value at `index`, or `None` for a typed null.
    pub fn get_opt<V: ?Sized + 'static>(&self, index: usize) -> DiResult<Option<Arc<V>>> {
        match self.items.get(index) {
            None => Err(DiError::resolution(
                self.owner,
                format!("no parameter at position {}", index),
            )),
            Some(None) => Ok(None),
            Some(Some(value)) => value
                .downcast_ref::<Arc<V>>()
                .cloned()
                .map(Some)
                .ok_or(DiError::TypeMismatch(type_name::<V>())),
        }
    }

    /// The value at `index`; a typed null is an error.
    pub fn get<V: ?Sized + 'static>(&self, index: usize) -> DiResult<Arc<V>> {
        self.get_opt(index)?.ok_or_else(|| {
            DiError::resolution(
                self.owner,
                format!("parameter '{}' is null", self.names.get(index).copied().unwrap_or("?")),
            )
        })
    }

    /// A clone of the value at `index`.
    pub fn cloned<V: Clone + 'static>(&self, index: usize) -> DiResult<V> {
        self.get::<V>(index).map(|value| (*value).clone())
    }
}
