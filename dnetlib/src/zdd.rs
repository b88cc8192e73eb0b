//! Zero-suppressed binary decision diagrams.
//!
//! A [`Zdd`] represents a family of subsets of the variables `1..=num_vars`. In this crate each
//! variable is a switch (variable `i + 1` is switch `i`) and each subset is the set of closed
//! switches of a configuration.
//!
//! Nodes are stored in an arena in topological order: children always precede their parents.
//! Node `0` is the empty terminal and node `1` is the base terminal.
use crate::HashMap;

use bitvec::prelude::*;
use rand::Rng;
use std::fmt::Write;

mod forests;

pub use forests::forests;

/// Index of a node in the arena of a [`Zdd`].
pub type NodeId = usize;
/// Decision variable, numbered from 1.
pub type Var = usize;

/// The empty family.
pub const EMPTY: NodeId = 0;
/// The family containing only the empty set.
pub const BASE: NodeId = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Node {
    var: Var,
    lo: NodeId,
    hi: NodeId,
}

/// A family of sets over a fixed number of variables.
#[derive(Clone, Debug)]
pub struct Zdd {
    num_vars: usize,
    nodes: Vec<Node>,
    root: NodeId,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Union,
    Intersection,
    Difference,
}

/// Hash-consing node factory. Operands are imported into one arena before an operation.
pub(crate) struct Builder {
    num_vars: usize,
    nodes: Vec<Node>,
    unique: HashMap<Node, NodeId>,
}

impl Builder {
    pub(crate) fn new(num_vars: usize) -> Self {
        let terminal = num_vars + 1;
        Builder {
            num_vars,
            nodes: vec![
                Node {
                    var: terminal,
                    lo: EMPTY,
                    hi: EMPTY,
                },
                Node {
                    var: terminal,
                    lo: BASE,
                    hi: BASE,
                },
            ],
            unique: HashMap::new(),
        }
    }

    /// Returns the node deciding `var`, applying the zero-suppression rule.
    pub(crate) fn mk(&mut self, var: Var, lo: NodeId, hi: NodeId) -> NodeId {
        debug_assert!(var >= 1 && var <= self.num_vars);
        debug_assert!(self.nodes[lo].var > var && self.nodes[hi].var > var);
        if hi == EMPTY {
            return lo;
        }
        let node = Node { var, lo, hi };
        if let Some(&id) = self.unique.get(&node) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        self.unique.insert(node, id);
        id
    }

    fn import(&mut self, zdd: &Zdd) -> NodeId {
        assert_eq!(
            self.num_vars, zdd.num_vars,
            "cannot combine diagrams over different variables"
        );
        let mut map = vec![EMPTY, BASE];
        for node in &zdd.nodes[2..] {
            let id = self.mk(node.var, map[node.lo], map[node.hi]);
            map.push(id);
        }
        map[zdd.root]
    }

    #[inline]
    fn var(&self, id: NodeId) -> Var {
        self.nodes[id].var
    }

    fn apply(
        &mut self,
        op: Op,
        a: NodeId,
        b: NodeId,
        cache: &mut HashMap<(NodeId, NodeId), NodeId>,
    ) -> NodeId {
        match op {
            Op::Union => {
                if a == EMPTY || a == b {
                    return b;
                }
                if b == EMPTY {
                    return a;
                }
            }
            Op::Intersection => {
                if a == EMPTY || b == EMPTY {
                    return EMPTY;
                }
                if a == b {
                    return a;
                }
            }
            Op::Difference => {
                if a == EMPTY || a == b {
                    return EMPTY;
                }
                if b == EMPTY {
                    return a;
                }
            }
        }
        let key = if op != Op::Difference && b < a {
            (b, a)
        } else {
            (a, b)
        };
        if let Some(&id) = cache.get(&key) {
            return id;
        }
        let (va, vb) = (self.var(a), self.var(b));
        let Node {
            lo: alo, hi: ahi, ..
        } = self.nodes[a];
        let Node {
            lo: blo, hi: bhi, ..
        } = self.nodes[b];
        let id = match op {
            Op::Union => {
                if va < vb {
                    let lo = self.apply(op, alo, b, cache);
                    self.mk(va, lo, ahi)
                } else if va > vb {
                    let lo = self.apply(op, a, blo, cache);
                    self.mk(vb, lo, bhi)
                } else {
                    let lo = self.apply(op, alo, blo, cache);
                    let hi = self.apply(op, ahi, bhi, cache);
                    self.mk(va, lo, hi)
                }
            }
            Op::Intersection => {
                if va < vb {
                    self.apply(op, alo, b, cache)
                } else if va > vb {
                    self.apply(op, a, blo, cache)
                } else {
                    let lo = self.apply(op, alo, blo, cache);
                    let hi = self.apply(op, ahi, bhi, cache);
                    self.mk(va, lo, hi)
                }
            }
            Op::Difference => {
                if va < vb {
                    let lo = self.apply(op, alo, b, cache);
                    self.mk(va, lo, ahi)
                } else if va > vb {
                    self.apply(op, a, blo, cache)
                } else {
                    let lo = self.apply(op, alo, blo, cache);
                    let hi = self.apply(op, ahi, bhi, cache);
                    self.mk(va, lo, hi)
                }
            }
        };
        cache.insert(key, id);
        id
    }

    /// Keeps the sets containing `var` (`keep == true`) or the sets without it.
    fn restrict(
        &mut self,
        a: NodeId,
        var: Var,
        keep: bool,
        cache: &mut HashMap<NodeId, NodeId>,
    ) -> NodeId {
        let Node { var: v, lo, hi } = self.nodes[a];
        if v > var {
            return if keep { EMPTY } else { a };
        }
        if v == var {
            return if keep { self.mk(v, EMPTY, hi) } else { lo };
        }
        if let Some(&id) = cache.get(&a) {
            return id;
        }
        let lo = self.restrict(lo, var, keep, cache);
        let hi = self.restrict(hi, var, keep, cache);
        let id = self.mk(v, lo, hi);
        cache.insert(a, id);
        id
    }

    /// Drops the nodes unreachable from `root` and renumbers the rest.
    pub(crate) fn finish(self, root: NodeId) -> Zdd {
        let Builder {
            num_vars, nodes, ..
        } = self;
        let mut reachable = vec![false; nodes.len()];
        reachable[root] = true;
        for id in (2..nodes.len()).rev() {
            if reachable[id] {
                reachable[nodes[id].lo] = true;
                reachable[nodes[id].hi] = true;
            }
        }
        let mut map = vec![EMPTY; nodes.len()];
        map[BASE] = BASE;
        let mut compact = vec![nodes[EMPTY], nodes[BASE]];
        for id in 2..nodes.len() {
            if reachable[id] {
                map[id] = compact.len();
                compact.push(Node {
                    var: nodes[id].var,
                    lo: map[nodes[id].lo],
                    hi: map[nodes[id].hi],
                });
            }
        }
        Zdd {
            num_vars,
            nodes: compact,
            root: map[root],
        }
    }
}

impl Zdd {
    /// The empty family.
    pub fn empty(num_vars: usize) -> Zdd {
        Builder::new(num_vars).finish(EMPTY)
    }

    /// The family containing only the empty set.
    pub fn base(num_vars: usize) -> Zdd {
        Builder::new(num_vars).finish(BASE)
    }

    /// All sets that contain every `include` variable and no `exclude` variable.
    ///
    /// Both slices are indexed by `var - 1`. Variables in neither are free.
    pub fn from_constraints(num_vars: usize, include: &BitSlice, exclude: &BitSlice) -> Zdd {
        assert_eq!(include.len(), num_vars);
        assert_eq!(exclude.len(), num_vars);
        let mut builder = Builder::new(num_vars);
        let mut current = BASE;
        for var in (1..=num_vars).rev() {
            let (inc, exc) = (include[var - 1], exclude[var - 1]);
            current = match (inc, exc) {
                (true, true) => EMPTY,
                (true, false) => builder.mk(var, EMPTY, current),
                (false, true) => current,
                (false, false) => builder.mk(var, current, current),
            };
        }
        builder.finish(current)
    }

    /// The family containing only `set`, indexed by `var - 1`.
    pub fn singleton(num_vars: usize, set: &BitSlice) -> Zdd {
        let exclude = !set.to_bitvec();
        Zdd::from_constraints(num_vars, set, &exclude)
    }

    /// All sets whose size is within `min..=max`.
    fn cardinality(num_vars: usize, min: usize, max: usize) -> Zdd {
        let max = max.min(num_vars);
        if min > max {
            return Zdd::empty(num_vars);
        }
        let mut builder = Builder::new(num_vars);
        // below[c]: sets of the remaining variables given c members so far. c == max + 1 is dead.
        let mut below: Vec<NodeId> = (0..=max + 1)
            .map(|c| if c >= min && c <= max { BASE } else { EMPTY })
            .collect();
        for var in (1..=num_vars).rev() {
            below = (0..=max + 1)
                .map(|c| {
                    if c > max {
                        EMPTY
                    } else {
                        builder.mk(var, below[c], below[c + 1])
                    }
                })
                .collect();
        }
        builder.finish(below[0])
    }

    /// Sets with exactly `size` members.
    pub fn sized(&self, size: usize) -> Zdd {
        self.intersection(&Zdd::cardinality(self.num_vars, size, size))
    }

    /// Sets with fewer than `size` members.
    pub fn smaller(&self, size: usize) -> Zdd {
        match size.checked_sub(1) {
            Some(max) => self.intersection(&Zdd::cardinality(self.num_vars, 0, max)),
            None => Zdd::empty(self.num_vars),
        }
    }

    /// Sets with more than `size` members.
    pub fn larger(&self, size: usize) -> Zdd {
        self.intersection(&Zdd::cardinality(self.num_vars, size + 1, self.num_vars))
    }

    fn binary(&self, other: &Zdd, op: Op) -> Zdd {
        let mut builder = Builder::new(self.num_vars);
        let a = builder.import(self);
        let b = builder.import(other);
        let root = builder.apply(op, a, b, &mut HashMap::new());
        builder.finish(root)
    }

    pub fn union(&self, other: &Zdd) -> Zdd {
        self.binary(other, Op::Union)
    }

    pub fn intersection(&self, other: &Zdd) -> Zdd {
        self.binary(other, Op::Intersection)
    }

    pub fn difference(&self, other: &Zdd) -> Zdd {
        self.binary(other, Op::Difference)
    }

    fn restrict(&self, var: Var, keep: bool) -> Zdd {
        assert!(var >= 1 && var <= self.num_vars, "variable {} out of range", var);
        let mut builder = Builder::new(self.num_vars);
        let a = builder.import(self);
        let root = builder.restrict(a, var, keep, &mut HashMap::new());
        builder.finish(root)
    }

    /// Sets that contain `var`.
    pub fn including(&self, var: Var) -> Zdd {
        self.restrict(var, true)
    }

    /// Sets that do not contain `var`.
    pub fn excluding(&self, var: Var) -> Zdd {
        self.restrict(var, false)
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of nodes including the two terminals.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == EMPTY
    }

    fn counts(&self) -> Vec<u128> {
        let mut counts = vec![0, 1];
        for node in &self.nodes[2..] {
            counts.push(counts[node.lo] + counts[node.hi]);
        }
        counts
    }

    /// Number of sets in the family.
    pub fn count(&self) -> u128 {
        self.counts()[self.root]
    }

    /// Returns true if the set with the given members, indexed by `var - 1`, is in the family.
    pub fn contains(&self, set: &BitSlice) -> bool {
        assert_eq!(set.len(), self.num_vars);
        let mut id = self.root;
        let mut next_var = 1;
        loop {
            let Node { var, lo, hi } = self.nodes[id];
            // Skipped variables must be absent.
            if set[next_var - 1..var - 1].any() {
                return false;
            }
            if id == EMPTY || id == BASE {
                return id == BASE;
            }
            id = if set[var - 1] { hi } else { lo };
            next_var = var + 1;
        }
    }

    /// Iterates over the sets of the family.
    pub fn iter(&self) -> ZddIter<'_> {
        ZddIter {
            zdd: self,
            stack: vec![(self.root, bitvec![0; self.num_vars])],
        }
    }

    /// Draws a set uniformly at random. Returns `None` if the family is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BitVec> {
        let counts = self.counts();
        if counts[self.root] == 0 {
            return None;
        }
        let mut r = rng.gen_range(0..counts[self.root]);
        let mut set = bitvec![0; self.num_vars];
        let mut id = self.root;
        while id != BASE {
            let Node { var, lo, hi } = self.nodes[id];
            if r < counts[lo] {
                id = lo;
            } else {
                r -= counts[lo];
                set.set(var - 1, true);
                id = hi;
            }
        }
        Some(set)
    }

    /// Iterates over the sets in uniformly random order, without repetition.
    pub fn rand_iter<R: Rng>(&self, rng: R) -> RandIter<R> {
        RandIter {
            remaining: self.clone(),
            rng,
        }
    }

    /// Set with the least total weight and that weight. `weights` is indexed by `var - 1`.
    ///
    /// Ties go to the set without the earlier variable.
    fn lightest(&self, weights: &[f64]) -> Option<(f64, BitVec)> {
        if self.is_empty() {
            return None;
        }
        let mut best = vec![f64::INFINITY, 0.0];
        for node in &self.nodes[2..] {
            let with = best[node.hi] + weights[node.var - 1];
            best.push(best[node.lo].min(with));
        }
        let mut set = bitvec![0; self.num_vars];
        let mut id = self.root;
        while id > BASE {
            let Node { var, lo, hi } = self.nodes[id];
            if best[lo] <= best[hi] + weights[var - 1] {
                id = lo;
            } else {
                set.set(var - 1, true);
                id = hi;
            }
        }
        Some((best[self.root], set))
    }

    /// Iterates over the sets in increasing order of total weight.
    pub fn min_iter(&self, weights: Vec<f64>) -> WeightedIter {
        assert_eq!(weights.len(), self.num_vars);
        WeightedIter {
            remaining: self.clone(),
            weights,
            sign: 1.0,
        }
    }

    /// Iterates over the sets in decreasing order of total weight.
    pub fn max_iter(&self, weights: Vec<f64>) -> WeightedIter {
        assert_eq!(weights.len(), self.num_vars);
        WeightedIter {
            remaining: self.clone(),
            weights: weights.into_iter().map(|w| -w).collect(),
            sign: -1.0,
        }
    }

    /// Serializes the diagram as a node list.
    ///
    /// Each line is `id var lo hi`, children before parents and the root last. The terminals are
    /// written as `B` (empty) and `T` (base). A terminal root is written alone. The list ends
    /// with a `.` line.
    pub fn dumps(&self) -> String {
        let name = |id: NodeId| match id {
            EMPTY => "B".to_string(),
            BASE => "T".to_string(),
            _ => id.to_string(),
        };
        let mut out = String::new();
        if self.root == EMPTY || self.root == BASE {
            out.push_str(&name(self.root));
            out.push('\n');
        } else {
            for (id, node) in self.nodes.iter().enumerate().skip(2) {
                // Writing to a String cannot fail.
                let _ = writeln!(
                    out,
                    "{} {} {} {}",
                    id,
                    node.var,
                    name(node.lo),
                    name(node.hi)
                );
            }
        }
        out.push_str(".\n");
        out
    }
}

/// Iterator over the sets of a [`Zdd`].
pub struct ZddIter<'a> {
    zdd: &'a Zdd,
    stack: Vec<(NodeId, BitVec)>,
}

impl<'a> Iterator for ZddIter<'a> {
    type Item = BitVec;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, set)) = self.stack.pop() {
            match id {
                EMPTY => continue,
                BASE => return Some(set),
                _ => {
                    let Node { var, lo, hi } = self.zdd.nodes[id];
                    let mut with = set.clone();
                    with.set(var - 1, true);
                    self.stack.push((hi, with));
                    self.stack.push((lo, set));
                }
            }
        }
        None
    }
}

/// Random order iterator over the sets of a [`Zdd`].
pub struct RandIter<R> {
    remaining: Zdd,
    rng: R,
}

impl<R: Rng> Iterator for RandIter<R> {
    type Item = BitVec;

    fn next(&mut self) -> Option<Self::Item> {
        let set = self.remaining.sample(&mut self.rng)?;
        let drawn = Zdd::singleton(self.remaining.num_vars, &set);
        self.remaining = self.remaining.difference(&drawn);
        Some(set)
    }
}

/// Iterator over the sets of a [`Zdd`] ordered by total weight, with that weight.
pub struct WeightedIter {
    remaining: Zdd,
    /// Weights are negated when iterating from the heaviest set.
    weights: Vec<f64>,
    sign: f64,
}

impl Iterator for WeightedIter {
    type Item = (f64, BitVec);

    fn next(&mut self) -> Option<Self::Item> {
        let (weight, set) = self.remaining.lightest(&self.weights)?;
        let drawn = Zdd::singleton(self.remaining.num_vars, &set);
        self.remaining = self.remaining.difference(&drawn);
        Some((self.sign * weight, set))
    }
}
