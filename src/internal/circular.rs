//! Construction guard: cycle and depth detection.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::TypeInfo;

/// Default maximum construction depth
pub(crate) const MAX_DEPTH: usize = 1024;

/// Types currently inside their own construction, innermost last.
pub(crate) struct ConstructionStack {
    stack: RefCell<Vec<TypeInfo>>,
    max_depth: usize,
}

impl ConstructionStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            max_depth,
        }
    }

    /// Marks `info` as under construction until the guard drops.
    ///
    /// Entering a type that is already on the stack is a true cycle.
    pub(crate) fn enter(&self, info: TypeInfo) -> DiResult<ConstructionGuard<'_>> {
        let mut stack = self.stack.borrow_mut();

        if stack.contains(&info) {
            let mut path: Vec<&'static str> = stack.iter().map(TypeInfo::name).collect();
            path.push(info.name());
            return Err(DiError::Circular(path));
        }

        if stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        stack.push(info);
        Ok(ConstructionGuard { owner: self, info })
    }

    #[inline]
    pub(crate) fn contains(&self, info: TypeInfo) -> bool {
        self.stack.borrow().contains(&info)
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Removes its type from the stack on every exit path, unwinding included.
pub(crate) struct ConstructionGuard<'a> {
    owner: &'a ConstructionStack,
    info: TypeInfo,
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut stack) = self.owner.stack.try_borrow_mut() {
            if let Some(pos) = stack.iter().rposition(|entry| *entry == self.info) {
                stack.remove(pos);
            }
        }
    }
}
