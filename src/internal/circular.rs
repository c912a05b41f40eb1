//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

// Thread-local construction stack
thread_local! {
    static CONSTRUCTION_TLS: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    id: usize,
    name: &'static str,
}

/// Guard marking a constructor as in progress on the current thread.
///
/// Entering a constructor that is already on the stack is a cycle; the
/// error carries the whole path, ending with the repeated type.
pub(crate) struct StackGuard {
    id: usize,
}

impl StackGuard {
    pub(crate) fn enter(id: usize, name: &'static str) -> DiResult<Self> {
        CONSTRUCTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();

            if stack.iter().any(|frame| frame.id == id) {
                let mut path: Vec<&'static str> = stack.iter().map(|frame| frame.name).collect();
                path.push(name);
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(Frame { id, name });
            Ok(Self { id })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        CONSTRUCTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();
            if let Some(last) = stack.pop() {
                debug_assert_eq!(last.id, self.id);
            }
        });
    }
}
