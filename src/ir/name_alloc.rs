use rustc_hash::FxHashMap;

/// Per-function allocator of variable name indices.
///
/// Names are debug information only, so the allocator can be dropped at any
/// time with [Func::clear_var_names](super::Func::clear_var_names); indices
/// then start over.
#[derive(Debug, Default)]
pub(super) struct NameAlloc {
    /// The next free index of each name.
    counters: FxHashMap<String, u32>,
}

impl NameAlloc {
    /// Allocate an index for `name` that is at least `hint` and not yet used
    /// for the name.
    pub(super) fn alloc_index(&mut self, name: &str, hint: u32) -> u32 {
        match self.counters.get_mut(name) {
            Some(next) => {
                let index = hint.max(*next);
                *next = index + 1;
                index
            }
            None => {
                self.counters.insert(name.to_string(), hint + 1);
                hint
            }
        }
    }

    pub(super) fn clear(&mut self) { self.counters.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_never_repeat() {
        let mut names = NameAlloc::default();
        assert_eq!(names.alloc_index("x", 0), 0);
        assert_eq!(names.alloc_index("x", 0), 1);
        assert_eq!(names.alloc_index("x", 0), 2);
        // the hint is a lower bound
        assert_eq!(names.alloc_index("x", 7), 7);
        assert_eq!(names.alloc_index("x", 3), 8);
        assert_eq!(names.alloc_index("y", 4), 4);
        assert_eq!(names.alloc_index("y", 0), 5);

        names.clear();
        assert_eq!(names.alloc_index("x", 0), 0);
    }
}
