//! Arena storage for IR entities.
//!
//! Every entity of the IR (variables, instructions, effects, controls, blocks
//! and functions) lives in a [BaseArena] owned by the
//! [Context](crate::ir::Context), and is referred to by a `Copy` handle. The
//! graph-shaped parts of the IR (blocks referring to their successors, effects
//! referring to their owning block) are expressed with these handles instead of
//! shared pointers.
//!
//! - [ArenaPtr]: The trait for a handle into an arena.
//! - [ArenaDeref]: Dereferencing a handle.
//! - [ArenaAlloc]: Allocating a value, possibly referring to its own handle.
//!
//! Values are never freed. Entities detached from a function stay alive, so
//! handles still held by other entities or by analysis results remain valid.
//!
//! A container holding several arenas implements the traits once per entity
//! kind with [impl_arena](crate::impl_arena).
//!
//! # Examples
//!
//! ```rust
//! use wasm_ssa::collections::storage::*;
//!
//! struct Node {
//!     this: BaseArenaPtr<Node>,
//!     succs: Vec<BaseArenaPtr<Node>>,
//! }
//!
//! let mut arena = BaseArena::default();
//! let a = arena.alloc_with(|this| Node { this, succs: Vec::new() });
//! let b = arena.alloc_with(|this| Node { this, succs: vec![a] });
//!
//! assert_eq!(arena.try_deref(b).unwrap().succs, vec![a]);
//! assert_eq!(arena.try_deref(a).unwrap().this, a);
//!
//! assert_eq!(arena.len(), 2);
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Indicates that the type can be used to dereference an arena pointer.
pub trait ArenaDeref<T, Ptr>
where
    Ptr: ArenaPtr<T = T, A = Self>,
{
    /// Try to dereference a pointer.
    ///
    /// # Returns
    ///
    /// - `Some(&T)` if the pointer refers to a value of this arena.
    /// - `None` if the pointer is out of bounds.
    fn try_deref(&self, ptr: Ptr) -> Option<&T>;

    /// Try to dereference a pointer mutably.
    ///
    /// # See Also
    ///
    /// - [ArenaDeref::try_deref]
    fn try_deref_mut(&mut self, ptr: Ptr) -> Option<&mut T>;
}

/// Indicates that the type can allocate values.
pub trait ArenaAlloc<T, Ptr>: ArenaDeref<T, Ptr>
where
    Ptr: ArenaPtr<T = T, A = Self>,
{
    /// Allocate a value with a closure accepting the future handle.
    ///
    /// The handle is reserved first, so the value can store its own handle
    /// (every IR entity keeps a `self_ptr`).
    fn alloc_with<F>(&mut self, f: F) -> Ptr
    where
        F: FnOnce(Ptr) -> T;

    /// Allocate a value.
    fn alloc(&mut self, val: T) -> Ptr { self.alloc_with(|_| val) }
}

/// A handle that dereferences through its arena.
pub trait ArenaPtr: Copy + Sized + Eq {
    /// The type of dereferenced value.
    type T;

    /// The type of the corresponding arena.
    type A: ArenaDeref<Self::T, Self>;

    fn try_deref(self, arena: &Self::A) -> Option<&Self::T>;

    fn try_deref_mut(self, arena: &mut Self::A) -> Option<&mut Self::T>;

    /// Dereference the pointer.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another arena.
    fn deref(self, arena: &Self::A) -> &Self::T {
        self.try_deref(arena).expect("the arena pointer is invalid")
    }

    /// Dereference the pointer mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another arena.
    fn deref_mut(self, arena: &mut Self::A) -> &mut Self::T {
        self.try_deref_mut(arena)
            .expect("the arena pointer is invalid")
    }
}

/// A pointer to an object in a [BaseArena].
pub struct BaseArenaPtr<T> {
    id: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for BaseArenaPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaseArenaPtr({})", self.id)
    }
}

impl<T> PartialEq for BaseArenaPtr<T> {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl<T> Eq for BaseArenaPtr<T> {}

impl<T> PartialOrd for BaseArenaPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

impl<T> Ord for BaseArenaPtr<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering { self.id.cmp(&other.id) }
}

impl<T> Hash for BaseArenaPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state); }
}

impl<T> From<usize> for BaseArenaPtr<T> {
    fn from(id: usize) -> Self {
        BaseArenaPtr {
            id,
            _marker: PhantomData,
        }
    }
}

#[allow(clippy::non_canonical_clone_impl)]
impl<T> Clone for BaseArenaPtr<T> {
    fn clone(&self) -> Self {
        // derive would require `T: Clone`
        BaseArenaPtr {
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> Copy for BaseArenaPtr<T> {}

impl<T> BaseArenaPtr<T> {
    /// The slot index of the object in the arena.
    pub fn id(self) -> usize { self.id }
}

impl<T> ArenaPtr for BaseArenaPtr<T> {
    type A = BaseArena<T>;
    type T = T;

    fn try_deref(self, arena: &BaseArena<T>) -> Option<&T> { arena.try_deref(self) }

    fn try_deref_mut(self, arena: &mut BaseArena<T>) -> Option<&mut T> { arena.try_deref_mut(self) }
}

/// An append-only arena backed by a vector.
pub struct BaseArena<T> {
    pool: Vec<T>,
}

impl<T> Default for BaseArena<T> {
    fn default() -> Self { BaseArena { pool: Vec::new() } }
}

impl<T> ArenaAlloc<T, BaseArenaPtr<T>> for BaseArena<T> {
    fn alloc_with<F>(&mut self, f: F) -> BaseArenaPtr<T>
    where
        F: FnOnce(BaseArenaPtr<T>) -> T,
    {
        let ptr = BaseArenaPtr::from(self.pool.len());
        self.pool.push(f(ptr));
        ptr
    }
}

impl<T> ArenaDeref<T, BaseArenaPtr<T>> for BaseArena<T> {
    fn try_deref(&self, ptr: BaseArenaPtr<T>) -> Option<&T> { self.pool.get(ptr.id()) }

    fn try_deref_mut(&mut self, ptr: BaseArenaPtr<T>) -> Option<&mut T> {
        self.pool.get_mut(ptr.id())
    }
}

impl<T> BaseArena<T> {
    /// The number of values allocated so far.
    pub fn len(&self) -> usize { self.pool.len() }

    pub fn is_empty(&self) -> bool { self.pool.is_empty() }
}

/// Implement the arena traits for one entity kind of a container.
///
/// `$ptr` must be a tuple struct wrapping a [BaseArenaPtr] of `$value`, and
/// `$field` the [BaseArena] field of `$arena` storing it.
#[macro_export]
macro_rules! impl_arena {
    ($arena:ty, $value:ty, $ptr:path, $field:ident) => {
        impl $crate::collections::storage::ArenaPtr for $ptr {
            type A = $arena;
            type T = $value;

            fn try_deref(self, arena: &Self::A) -> Option<&Self::T> {
                $crate::collections::storage::ArenaDeref::try_deref(arena, self)
            }

            fn try_deref_mut(self, arena: &mut Self::A) -> Option<&mut Self::T> {
                $crate::collections::storage::ArenaDeref::try_deref_mut(arena, self)
            }
        }

        impl $crate::collections::storage::ArenaAlloc<$value, $ptr> for $arena {
            fn alloc_with<F>(&mut self, f: F) -> $ptr
            where
                F: FnOnce($ptr) -> $value,
            {
                $ptr($crate::collections::storage::ArenaAlloc::alloc_with(
                    &mut self.$field,
                    |ptr| f($ptr(ptr)),
                ))
            }
        }

        impl $crate::collections::storage::ArenaDeref<$value, $ptr> for $arena {
            fn try_deref(&self, ptr: $ptr) -> Option<&$value> {
                $crate::collections::storage::ArenaDeref::try_deref(&self.$field, ptr.0)
            }

            fn try_deref_mut(&mut self, ptr: $ptr) -> Option<&mut $value> {
                $crate::collections::storage::ArenaDeref::try_deref_mut(&mut self.$field, ptr.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        this: BaseArenaPtr<Node>,
        next: Option<BaseArenaPtr<Node>>,
    }

    #[test]
    fn test_alloc_with_own_handle() {
        let mut arena = BaseArena::default();
        let a = arena.alloc_with(|this| Node { this, next: None });
        let b = arena.alloc_with(|this| Node { this, next: Some(a) });
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        assert_eq!(b.deref(&arena).this, b);
        assert_eq!(b.deref(&arena).next, Some(a));
        a.deref_mut(&mut arena).next = Some(b);
        assert_eq!(a.deref(&arena).next, Some(b));
    }

    #[test]
    fn test_foreign_handle_misses() {
        let mut small = BaseArena::default();
        let mut big = BaseArena::default();
        small.alloc(1);
        big.alloc(1);
        let far = big.alloc(2);
        assert_eq!(big.try_deref(far), Some(&2));
        assert_eq!(small.try_deref(far), None);
    }
}
