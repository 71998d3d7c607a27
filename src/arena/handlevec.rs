//! The [`HandleVec`] type and associated definitions.

use super::handle::Handle;

use std::marker::PhantomData;
use std::ops;

/// A [`Vec`] indexed by [`Handle`]s.
///
/// A `HandleVec<T, U>` is a [`Vec<U>`] indexed by values of type `Handle<T>`,
/// rather than `usize`. Entries can only be added at the end, and the handle
/// given to [`insert`] must equal the current length.
///
/// [`insert`]: HandleVec::insert
#[derive(Debug)]
pub(crate) struct HandleVec<T, U> {
    inner: Vec<U>,
    as_keys: PhantomData<T>,
}

impl<T, U> Default for HandleVec<T, U> {
    fn default() -> Self {
        Self {
            inner: vec![],
            as_keys: PhantomData,
        }
    }
}

impl<T, U> HandleVec<T, U> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
            as_keys: PhantomData,
        }
    }

    /// Insert a mapping from `handle` to `value`.
    ///
    /// The index of `handle` must equal the number of entries so far.
    pub(crate) fn insert(&mut self, handle: Handle<T>, value: U) {
        assert_eq!(handle.index(), self.inner.len());
        self.inner.push(value);
    }

    pub(crate) fn get(&self, handle: Handle<T>) -> Option<&U> {
        self.inner.get(handle.index())
    }
}

impl<T, U> ops::Index<Handle<T>> for HandleVec<T, U> {
    type Output = U;

    fn index(&self, handle: Handle<T>) -> &Self::Output {
        &self.inner[handle.index()]
    }
}
