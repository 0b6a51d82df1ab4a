//! Nesting frames shared by the readers and writers.
//!
//! A [`ContextStack`] is a vector of plain [`Context`] values indexed by depth.
//! The top-level frame is created with the stack and is never popped; entering
//! a container pushes a frame and leaving it truncates the vector, so sibling
//! containers reuse the vector's capacity.

use crate::error::{Error, Result};
use crate::types::ContextType;

/// One nesting frame.
///
/// `S` is the codec's state enum, `X` its per-frame scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<S, X = ()> {
    pub context_type: ContextType,
    pub state: S,
    /// Members read or written so far in this frame.
    pub count: usize,
    pub scratch: X,
}

/// Depth-indexed stack of [`Context`] frames with a recursion ceiling.
///
/// Only `Object` and `Array` frames count towards the ceiling; a header lives
/// inside its container's level.
#[derive(Debug, Clone)]
pub struct ContextStack<S, X = ()> {
    frames: Vec<Context<S, X>>,
    depth: usize,
    limit: usize,
}

impl<S: Copy, X: Default> ContextStack<S, X> {
    pub fn new(initial: S, limit: usize) -> Self {
        ContextStack {
            frames: vec![Context {
                context_type: ContextType::TopLevel,
                state: initial,
                count: 0,
                scratch: X::default(),
            }],
            depth: 0,
            limit,
        }
    }

    #[inline]
    pub fn current(&self) -> &Context<S, X> {
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut Context<S, X> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// The frame enclosing the current one.
    pub fn parent(&self) -> Option<&Context<S, X>> {
        let len = self.frames.len();
        if len < 2 {
            None
        } else {
            self.frames.get(len - 2)
        }
    }

    pub fn parent_mut(&mut self) -> Option<&mut Context<S, X>> {
        let len = self.frames.len();
        if len < 2 {
            None
        } else {
            self.frames.get_mut(len - 2)
        }
    }

    #[inline]
    pub fn context_type(&self) -> ContextType {
        self.current().context_type
    }

    #[inline]
    pub fn state(&self) -> S {
        self.current().state
    }

    #[inline]
    pub fn set_state(&mut self, state: S) {
        self.current_mut().state = state;
    }

    /// Container nesting depth; 0 at the top level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn push(&mut self, context_type: ContextType, state: S, scratch: X) -> Result<()> {
        match context_type {
            ContextType::TopLevel => {
                return Err(Error::protocol("cannot push a top-level context"));
            }
            ContextType::Header => {
                if self.context_type() == ContextType::Header {
                    return Err(Error::protocol("a header cannot be nested in a header"));
                }
            }
            ContextType::Object | ContextType::Array => {
                if self.depth >= self.limit {
                    return Err(Error::RecursionLimit { limit: self.limit });
                }
                self.depth += 1;
            }
        }
        self.frames.push(Context {
            context_type,
            state,
            count: 0,
            scratch,
        });
        Ok(())
    }

    /// Pops the current frame, which must be of `expected` type.
    pub fn pop(&mut self, expected: ContextType) -> Result<Context<S, X>> {
        let actual = self.context_type();
        if actual != expected || actual == ContextType::TopLevel {
            return Err(Error::protocol(format!(
                "cannot end {:?} while in {:?} context",
                expected, actual
            )));
        }
        if actual != ContextType::Header {
            self.depth -= 1;
        }
        self.frames
            .pop()
            .ok_or_else(|| Error::protocol("context stack underflow"))
    }
}
