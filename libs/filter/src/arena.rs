//! Typed, generation-checked node storage.
//!
//! Syntax tree nodes live in one [`Arena`] per node kind and reference each other
//! through [`Idx`] handles. Clearing an arena bumps its generation, so handles
//! kept across a `release` stop resolving instead of pointing at new nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle to a node of type `T` inside an [`Arena<T>`].
pub struct Idx<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Idx<T> {}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({}@{})", self.index, self.generation)
    }
}

pub struct Arena<T> {
    items: Vec<T>,
    generation: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("generation", &self.generation)
            .field("items", &self.items)
            .finish()
    }
}

impl<T> Arena<T> {
    pub fn alloc(&mut self, item: T) -> Idx<T> {
        let index = self.items.len() as u32;
        self.items.push(item);
        Idx {
            index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, idx: Idx<T>) -> Option<&T> {
        if idx.generation != self.generation {
            return None;
        }
        self.items.get(idx.index())
    }

    pub fn get_mut(&mut self, idx: Idx<T>) -> Option<&mut T> {
        if idx.generation != self.generation {
            return None;
        }
        self.items.get_mut(idx.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Drop all nodes, keep the allocation and invalidate outstanding handles.
    pub fn clear(&mut self) {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
