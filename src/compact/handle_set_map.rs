use crate::arena::{Handle, HandleSet};

type Index = crate::non_max_u32::NonMaxU32;

/// A map from old handle indices to new, compressed handle indices.
pub struct HandleMap<T> {
    /// The indices assigned to handles in the compacted arena.
    ///
    /// If `new_index[i]` is `Some(n)`, then `n` is the `Index` of the
    /// compacted `Handle` corresponding to the pre-compacted `Handle`
    /// whose index is `i`.
    new_index: Vec<Option<Index>>,

    /// This type is indexed by values of type `T`.
    as_keys: std::marker::PhantomData<T>,
}

impl<T: 'static> HandleMap<T> {
    pub fn from_set(set: HandleSet<T>) -> Self {
        // Arenas never hold `u32::MAX` elements, so running out of indices
        // can not happen here.
        let mut next_index = Index::new(0);
        Self {
            new_index: set
                .all_possible()
                .map(|handle| {
                    if set.contains(handle) {
                        // Retained, so it takes the next free index.
                        let this = next_index;
                        next_index = next_index.and_then(|index| index.checked_add(1));
                        this
                    } else {
                        None
                    }
                })
                .collect(),
            as_keys: std::marker::PhantomData,
        }
    }

    /// Return true if `old` is used in the compacted arena.
    pub fn used(&self, old: Handle<T>) -> bool {
        self.new_index[old.index()].is_some()
    }

    /// Return the counterpart to `old` in the compacted arena.
    ///
    /// If we thought `old` wouldn't be used in the compacted arena, return
    /// `None`.
    pub fn try_adjust(&self, old: Handle<T>) -> Option<Handle<T>> {
        log::trace!(
            "adjusting {} handle [{}] -> [{:?}]",
            std::any::type_name::<T>(),
            old.index(),
            self.new_index[old.index()]
        );
        self.new_index[old.index()].map(Handle::new)
    }

    /// Return the counterpart to `old` in the compacted arena.
    ///
    /// Tracing marks every handle reachable from a root, so a handle that is
    /// adjusted but was not marked means the tracer missed a root.
    pub fn adjust(&self, handle: &mut Handle<T>) {
        match self.try_adjust(*handle) {
            Some(new) => *handle = new,
            None => unreachable!("{handle:?} was not traced"),
        }
    }

    /// Like `adjust`, but for optional handles.
    pub fn adjust_option(&self, handle: &mut Option<Handle<T>>) {
        if let Some(ref mut handle) = *handle {
            self.adjust(handle);
        }
    }
}
