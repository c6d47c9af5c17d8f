//! # Dominator Computation
//!
//! Thomas Lengauer and Robert Endre Tarjan. A fast algorithm for finding
//! dominators in a flowgraph. ACM Transactions on Programming Languages and
//! Systems, 1(1):121-141, July 1979.
//!
//! This is the sophisticated version with balanced path compression. The
//! recursive `dfs` and `compress` of the paper are run with explicit stacks.

use rustc_hash::FxHashMap;

use super::compute_preds::collect_preds;
use crate::{
    ir::{passman::LocalPassMut, Block, Context, Func, IntegrityError, IrResult, MetaKinds},
    utils::dfs::PreOrder,
};

/// Compute the immediate dominator and the predecessors of every block.
///
/// The blocks of the function are first reordered into DFS pre-order from
/// the entry. Blocks unreachable from the entry are dropped from the function
/// by this, and blocks only reachable through a control are adopted.
///
/// The entry has no dominator and gets an empty predecessor list, even when
/// a back edge targets it.
pub struct ComputeDoms;

/// The arrays of the algorithm, 1-based with 0 as the null vertex.
struct LengauerTarjan {
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
    dom: Vec<usize>,
    parent: Vec<usize>,
    ancestor: Vec<usize>,
    child: Vec<usize>,
    vertex: Vec<usize>,
    label: Vec<usize>,
    semi: Vec<usize>,
    size: Vec<usize>,
    bucket: Vec<Vec<usize>>,
    /// The number of vertices numbered so far.
    n: usize,
}

impl LengauerTarjan {
    fn new(succ: Vec<Vec<usize>>) -> Self {
        let len = succ.len();
        Self {
            succ,
            pred: vec![Vec::new(); len],
            dom: vec![0; len],
            parent: vec![0; len],
            ancestor: vec![0; len],
            child: vec![0; len],
            vertex: vec![0; len],
            label: vec![0; len],
            semi: vec![0; len],
            size: vec![0; len],
            bucket: vec![Vec::new(); len],
            n: 0,
        }
    }

    fn number(&mut self, v: usize) {
        self.n += 1;
        self.semi[v] = self.n;
        self.vertex[self.n] = v;
        self.label[v] = v;
        self.ancestor[v] = 0;
        self.child[v] = 0;
        self.size[v] = 1;
    }

    fn dfs(&mut self, root: usize) {
        self.number(root);
        // (vertex, index of the next successor to visit)
        let mut stack = vec![(root, 0)];
        while let Some((v, i)) = stack.pop() {
            let Some(&w) = self.succ[v].get(i) else {
                continue;
            };
            stack.push((v, i + 1));
            self.pred[w].push(v);
            if self.semi[w] == 0 {
                self.parent[w] = v;
                self.number(w);
                stack.push((w, 0));
            }
        }
    }

    fn compress(&mut self, v: usize) {
        let mut path = Vec::new();
        let mut u = v;
        while self.ancestor[self.ancestor[u]] != 0 {
            path.push(u);
            u = self.ancestor[u];
        }
        // from the top of the path down
        while let Some(u) = path.pop() {
            let a = self.ancestor[u];
            if self.semi[self.label[a]] < self.semi[self.label[u]] {
                self.label[u] = self.label[a];
            }
            self.ancestor[u] = self.ancestor[a];
        }
    }

    fn eval(&mut self, v: usize) -> usize {
        if self.ancestor[v] == 0 {
            return self.label[v];
        }
        self.compress(v);
        let a = self.ancestor[v];
        if self.semi[self.label[a]] >= self.semi[self.label[v]] {
            self.label[v]
        } else {
            self.label[a]
        }
    }

    fn link(&mut self, v: usize, w: usize) {
        let mut s = w;
        while self.semi[self.label[w]] < self.semi[self.label[self.child[s]]] {
            let c = self.child[s];
            if self.size[s] + self.size[self.child[c]] >= 2 * self.size[c] {
                self.ancestor[c] = s;
                self.child[s] = self.child[c];
            } else {
                self.size[c] = self.size[s];
                self.ancestor[s] = c;
                s = c;
            }
        }
        self.label[s] = self.label[w];
        self.size[v] += self.size[w];
        if self.size[v] < 2 * self.size[w] {
            std::mem::swap(&mut s, &mut self.child[v]);
        }
        while s != 0 {
            self.ancestor[s] = v;
            s = self.child[s];
        }
    }

    /// Run the algorithm from vertex 1, returning `dom`.
    fn run(mut self) -> Vec<usize> {
        self.dfs(1);

        for i in (2..=self.n).rev() {
            let w = self.vertex[i];
            for j in 0..self.pred[w].len() {
                let u = self.eval(self.pred[w][j]);
                if self.semi[u] < self.semi[w] {
                    self.semi[w] = self.semi[u];
                }
            }
            let sdom = self.vertex[self.semi[w]];
            self.bucket[sdom].push(w);

            let p = self.parent[w];
            self.link(p, w);
            for v in std::mem::take(&mut self.bucket[p]) {
                let u = self.eval(v);
                self.dom[v] = if self.semi[u] < self.semi[v] { u } else { p };
            }
        }

        for i in 2..=self.n {
            let w = self.vertex[i];
            if self.dom[w] != self.vertex[self.semi[w]] {
                self.dom[w] = self.dom[self.dom[w]];
            }
        }
        self.dom[1] = 0;

        self.dom
    }
}

impl LocalPassMut for ComputeDoms {
    type Output = ();

    fn run(&mut self, ctx: &mut Context, func: Func) -> IrResult<((), bool)> {
        if func.entry(ctx).is_none() {
            return Err(IntegrityError::EmptyFunction {
                func: func.name(ctx).to_string(),
            }
            .into());
        }

        // the graph is read in full before the block list is touched, so a
        // malformed function is left as it was
        let blocks: Vec<Block> = PreOrder::<Block>::new(ctx, func).collect();
        let index: FxHashMap<Block, usize> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (*block, i + 1))
            .collect();

        let mut succ = vec![Vec::new(); blocks.len() + 1];
        for (i, block) in blocks.iter().enumerate() {
            succ[i + 1] = block
                .control_or_err(ctx)?
                .targets(ctx)
                .iter()
                .map(|target| index[target])
                .collect();
        }
        let mut preds = collect_preds(ctx, &blocks)?;

        let old_len = func.blocks(ctx).len();
        let changed = blocks != func.blocks(ctx);
        let dropped = func.replace_blocks(ctx, blocks.clone());
        let new_len = blocks.len();
        if changed {
            log::debug!(
                "reordered {}: {} blocks, {} dropped, {} adopted",
                func.name(ctx),
                new_len,
                dropped.len(),
                (new_len + dropped.len()).saturating_sub(old_len),
            );
        }
        if !dropped.is_empty() || new_len != old_len {
            // the order alone is irrelevant to the other facts
            func.metadata_mut(ctx).graph_changed();
        }

        let dom = LengauerTarjan::new(succ).run();

        for (i, block) in blocks.iter().enumerate() {
            let idom = match dom[i + 1] {
                0 => None,
                d => Some(blocks[d - 1]),
            };
            log::trace!("idom({}) = {:?}", block, idom);
            block.set_idom(ctx, idom);
            let list = match idom {
                Some(_) => preds.remove(block).unwrap_or_default(),
                None => Vec::new(),
            };
            block.set_preds(ctx, list);
        }

        func.metadata_mut(ctx)
            .validate(MetaKinds::DOMS | MetaKinds::PREDS);
        Ok(((), changed))
    }
}
