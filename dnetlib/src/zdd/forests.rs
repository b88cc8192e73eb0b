//! Rooted spanning forests of a graph.
use super::{Builder, NodeId, Zdd, BASE, EMPTY};
use crate::types::{Edge, Vertex};
use crate::HashMap;

/// Component label and root flag of each frontier vertex, in frontier order.
///
/// Labels are canonical: they are numbered in order of first appearance.
type State = Vec<(u32, bool)>;

#[derive(Clone, Copy, Debug)]
enum Child {
    Pruned,
    Accepted,
    Next(usize),
}

/// Keeps the distinct states of one level, in insertion order.
#[derive(Default)]
struct Level {
    state_to_index: HashMap<State, usize>,
    states: Vec<State>,
}

impl Level {
    fn index_state(&mut self, state: State) -> usize {
        match self.state_to_index.get(&state) {
            Some(i) => *i,
            None => {
                let i = self.states.len();
                self.state_to_index.insert(state.clone(), i);
                self.states.push(state);
                i
            }
        }
    }
}

fn canonicalize(state: &mut State) {
    let mut relabel: Vec<(u32, u32)> = Vec::new();
    for (label, _) in state.iter_mut() {
        let new = match relabel.iter().find(|(old, _)| old == label) {
            Some(&(_, new)) => new,
            None => {
                let new = relabel.len() as u32;
                relabel.push((*label, new));
                new
            }
        };
        *label = new;
    }
}

/// All edge subsets forming a spanning forest where every tree contains exactly one root.
///
/// Variable `i + 1` of the result is `edges[i]`. Vertices are numbered `1..=vertex_count`.
/// The diagram is built breadth first, one edge per level, keeping for each vertex on the
/// frontier its component label and whether that component already contains a root.
pub fn forests(edges: &[Edge], roots: &[Vertex], vertex_count: usize) -> Zdd {
    let num_vars = edges.len();
    let is_root = |v: Vertex| roots.contains(&v);

    let mut first = vec![usize::MAX; vertex_count + 1];
    let mut last = vec![0; vertex_count + 1];
    for (i, &(u, v)) in edges.iter().enumerate() {
        for w in [u, v] {
            first[w] = first[w].min(i);
            last[w] = i;
        }
    }
    if (1..=vertex_count).any(|v| first[v] == usize::MAX && !is_root(v)) {
        log::debug!("Forest family is empty: a non-root vertex has no edge");
        return Zdd::empty(num_vars);
    }
    if num_vars == 0 {
        return Zdd::base(num_vars);
    }

    // frontier[i] lists the vertices present while deciding edge i.
    let mut frontier: Vec<Vec<Vertex>> = Vec::with_capacity(num_vars);
    let mut current: Vec<Vertex> = Vec::new();
    for i in 0..num_vars {
        current.extend((1..=vertex_count).filter(|&v| first[v] == i));
        frontier.push(current.clone());
        current.retain(|&v| last[v] != i);
    }

    let mut levels: Vec<Level> = vec![Level::default()];
    levels[0].index_state(Vec::new());
    let mut children: Vec<Vec<(Child, Child)>> = Vec::with_capacity(num_vars);

    for (i, &(u, v)) in edges.iter().enumerate() {
        let active = &frontier[i];
        let pu = active.iter().position(|&w| w == u);
        let pv = active.iter().position(|&w| w == v);
        let (pu, pv) = match (pu, pv) {
            (Some(pu), Some(pv)) => (pu, pv),
            _ => unreachable!("edge endpoints are always on the frontier"),
        };
        let leaving: Vec<bool> = active.iter().map(|&w| last[w] == i).collect();

        let mut next = Level::default();
        let mut level_children = Vec::with_capacity(levels[i].states.len());
        for state in &levels[i].states {
            let mut extended = state.clone();
            for &w in &active[state.len()..] {
                extended.push((u32::MAX - w as u32, is_root(w)));
            }
            let mut decide = |take: bool| -> Child {
                let mut st = extended.clone();
                if take {
                    let (lu, ru) = st[pu];
                    let (lv, rv) = st[pv];
                    if lu == lv || (ru && rv) {
                        return Child::Pruned;
                    }
                    for entry in st.iter_mut() {
                        if entry.0 == lu || entry.0 == lv {
                            *entry = (lu, ru || rv);
                        }
                    }
                }
                for (p, &(label, rooted)) in st.iter().enumerate() {
                    if leaving[p]
                        && !rooted
                        && !st
                            .iter()
                            .enumerate()
                            .any(|(q, &(l, _))| !leaving[q] && l == label)
                    {
                        return Child::Pruned;
                    }
                }
                let mut remaining: State = st
                    .into_iter()
                    .zip(leaving.iter())
                    .filter(|(_, &gone)| !gone)
                    .map(|(entry, _)| entry)
                    .collect();
                if i + 1 == num_vars {
                    debug_assert!(remaining.is_empty());
                    return Child::Accepted;
                }
                canonicalize(&mut remaining);
                Child::Next(next.index_state(remaining))
            };
            let lo = decide(false);
            let hi = decide(true);
            level_children.push((lo, hi));
        }
        children.push(level_children);
        levels.push(next);
    }

    let mut builder = Builder::new(num_vars);
    let mut below: Vec<NodeId> = Vec::new();
    for i in (0..num_vars).rev() {
        let resolve = |child: Child| match child {
            Child::Pruned => EMPTY,
            Child::Accepted => BASE,
            Child::Next(j) => below[j],
        };
        let pairs: Vec<(NodeId, NodeId)> = children[i]
            .iter()
            .map(|&(lo, hi)| (resolve(lo), resolve(hi)))
            .collect();
        below = pairs
            .into_iter()
            .map(|(lo, hi)| builder.mk(i + 1, lo, hi))
            .collect();
    }
    log::debug!(
        "Forest family built over {} edges with {} states",
        num_vars,
        levels.iter().map(|l| l.states.len()).sum::<usize>()
    );
    builder.finish(below[0])
}
