//! # Extensible Metadata Store
//!
//! Passes attach facts to IR entities without the entity types knowing about
//! every fact in advance. A fact is identified by an [ExtKey], a zero-sized
//! marker type acting as a typed capability token: whoever can name the key
//! can read and write the value, and the value type is fixed by the key.
//!
//! ```rust
//! use wasm_ssa::collections::ext::{ExtKey, ExtMap};
//!
//! struct LoopDepth;
//!
//! impl ExtKey for LoopDepth {
//!     type Value = u32;
//!     const NAME: &'static str = "LOOP_DEPTH";
//! }
//!
//! let mut exts = ExtMap::default();
//! assert!(exts.get::<LoopDepth>().is_none());
//!
//! exts.attach::<LoopDepth>(2);
//! assert_eq!(exts.get::<LoopDepth>(), Some(&2));
//! assert_eq!(exts.remove::<LoopDepth>(), Some(2));
//! assert!(exts.get_or_err::<LoopDepth>().is_err());
//! ```
//!
//! The facts every analysis of this crate produces (dominators, predecessors,
//! frontiers, live sets, uses) are stored in typed fields of the entities
//! instead; the map is for the open-ended extension points.

use std::{
    any::{Any, TypeId},
    fmt,
};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// A typed key for a value in an [ExtMap].
pub trait ExtKey: 'static {
    /// The type of the value associated with the key.
    type Value: 'static;

    /// The name of the key, for diagnostics only.
    const NAME: &'static str;
}

/// The value for a key was demanded but not present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ext {name} not present")]
pub struct MissingExt {
    pub name: &'static str,
}

struct ExtEntry {
    name: &'static str,
    value: Box<dyn Any>,
}

/// A heterogeneous map from [ExtKey]s to their values.
#[derive(Default)]
pub struct ExtMap {
    entries: FxHashMap<TypeId, ExtEntry>,
}

impl ExtMap {
    /// Associate `value` with `K`, returning the previous value if any.
    pub fn attach<K: ExtKey>(&mut self, value: K::Value) -> Option<K::Value> {
        let old = self.entries.insert(
            TypeId::of::<K>(),
            ExtEntry {
                name: K::NAME,
                value: Box::new(value),
            },
        )?;
        old.value.downcast::<K::Value>().ok().map(|b| *b)
    }

    pub fn get<K: ExtKey>(&self) -> Option<&K::Value> {
        self.entries
            .get(&TypeId::of::<K>())
            .and_then(|entry| entry.value.downcast_ref::<K::Value>())
    }

    pub fn get_mut<K: ExtKey>(&mut self) -> Option<&mut K::Value> {
        self.entries
            .get_mut(&TypeId::of::<K>())
            .and_then(|entry| entry.value.downcast_mut::<K::Value>())
    }

    /// Get the value of `K`, failing if it is absent.
    pub fn get_or_err<K: ExtKey>(&self) -> Result<&K::Value, MissingExt> {
        self.get::<K>().ok_or(MissingExt { name: K::NAME })
    }

    pub fn remove<K: ExtKey>(&mut self) -> Option<K::Value> {
        let entry = self.entries.remove(&TypeId::of::<K>())?;
        entry.value.downcast::<K::Value>().ok().map(|b| *b)
    }

    pub fn contains<K: ExtKey>(&self) -> bool { self.entries.contains_key(&TypeId::of::<K>()) }

    /// Look up a value without knowing its key statically.
    ///
    /// This is what delegation between containers goes through.
    pub fn get_erased(&self, key: TypeId) -> Option<&dyn Any> {
        self.entries.get(&key).map(|entry| entry.value.as_ref())
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn clear(&mut self) { self.entries.clear() }
}

impl fmt::Debug for ExtMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.entries.values().map(|e| e.name).collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/// A container of exts that may fall back to another container.
///
/// Lookups first consult the container's own [ExtMap], then the delegate
/// chain. Writes are always local. The arena `A` is passed through because
/// containers refer to their delegates by handle.
pub trait ExtContainer<A>: Copy {
    fn ext_map(self, arena: &A) -> &ExtMap;

    fn ext_map_mut(self, arena: &mut A) -> &mut ExtMap;

    /// Continue a lookup that missed locally.
    fn lookup_delegate(self, _arena: &A, _key: TypeId) -> Option<&dyn Any> { None }

    fn lookup_erased(self, arena: &A, key: TypeId) -> Option<&dyn Any> {
        match self.ext_map(arena).get_erased(key) {
            Some(value) => Some(value),
            None => self.lookup_delegate(arena, key),
        }
    }

    fn get_ext<K: ExtKey>(self, arena: &A) -> Option<&K::Value> {
        self.lookup_erased(arena, TypeId::of::<K>())
            .and_then(|value| value.downcast_ref::<K::Value>())
    }

    fn get_ext_or_err<K: ExtKey>(self, arena: &A) -> Result<&K::Value, MissingExt> {
        self.get_ext::<K>(arena).ok_or(MissingExt { name: K::NAME })
    }

    fn attach_ext<K: ExtKey>(self, arena: &mut A, value: K::Value) -> Option<K::Value> {
        self.ext_map_mut(arena).attach::<K>(value)
    }

    fn remove_ext<K: ExtKey>(self, arena: &mut A) -> Option<K::Value> {
        self.ext_map_mut(arena).remove::<K>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Name;

    impl ExtKey for Name {
        type Value = String;

        const NAME: &'static str = "NAME";
    }

    struct Weight;

    impl ExtKey for Weight {
        type Value = u64;

        const NAME: &'static str = "WEIGHT";
    }

    #[derive(Default)]
    struct Holders {
        maps: Vec<ExtMap>,
        delegates: Vec<Option<usize>>,
    }

    #[derive(Clone, Copy)]
    struct Holder(usize);

    impl ExtContainer<Holders> for Holder {
        fn ext_map(self, arena: &Holders) -> &ExtMap { &arena.maps[self.0] }

        fn ext_map_mut(self, arena: &mut Holders) -> &mut ExtMap { &mut arena.maps[self.0] }

        fn lookup_delegate(self, arena: &Holders, key: TypeId) -> Option<&dyn Any> {
            Holder(arena.delegates[self.0]?).lookup_erased(arena, key)
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let mut exts = ExtMap::default();
        exts.attach::<Name>("block".to_string());
        exts.attach::<Weight>(7);

        assert_eq!(exts.get::<Name>().map(String::as_str), Some("block"));
        assert_eq!(exts.attach::<Weight>(8), Some(7));
        assert_eq!(exts.len(), 2);

        *exts.get_mut::<Weight>().unwrap() += 1;
        assert_eq!(exts.get::<Weight>(), Some(&9));
    }

    #[test]
    fn test_missing_ext_names_key() {
        let exts = ExtMap::default();
        let err = exts.get_or_err::<Weight>().unwrap_err();
        assert_eq!(err.name, "WEIGHT");
        assert_eq!(err.to_string(), "ext WEIGHT not present");
    }

    #[test]
    fn test_delegation_chain() {
        let mut holders = Holders::default();
        // 0 -> 1 -> 2
        for delegate in [Some(1), Some(2), None] {
            holders.maps.push(ExtMap::default());
            holders.delegates.push(delegate);
        }

        Holder(2).attach_ext::<Weight>(&mut holders, 3);
        Holder(1).attach_ext::<Name>(&mut holders, "middle".into());

        assert_eq!(Holder(0).get_ext::<Weight>(&holders), Some(&3));
        assert_eq!(
            Holder(0).get_ext::<Name>(&holders).map(String::as_str),
            Some("middle")
        );

        // local values shadow the delegate
        Holder(0).attach_ext::<Weight>(&mut holders, 10);
        assert_eq!(Holder(0).get_ext::<Weight>(&holders), Some(&10));
        assert_eq!(Holder(1).get_ext::<Weight>(&holders), Some(&3));

        Holder(0).remove_ext::<Weight>(&mut holders);
        assert_eq!(Holder(0).get_ext::<Weight>(&holders), Some(&3));
        assert!(Holder(2).get_ext_or_err::<Name>(&holders).is_err());
    }
}
