//! Tree construction and electrical evaluation of a configuration.
use super::{Configuration, Element, Network};
use crate::types::*;
use crate::utils::{add_phases, UnionFind};
use crate::{DnetError, HashMap};

use std::collections::BTreeSet;

/// A (parent section, child section) pair of a tree rooted at a substation.
pub type Branch = (SectionIndex, SectionIndex);

impl Network {
    /// Expands the tree fed by `root` through the closed switches.
    ///
    /// The expansion never enters an element of `barrier` nor an element already on the current
    /// path. Branches are returned in depth first order.
    pub fn build_tree(
        &self,
        root: SectionIndex,
        closed: &Configuration,
        barrier: &BTreeSet<Element>,
    ) -> Result<Vec<Branch>, DnetError> {
        let mut branches = Vec::new();
        let mut stack: Vec<(SectionIndex, BTreeSet<Element>)> = vec![(root, barrier.clone())];
        while let Some((current, processed)) = stack.pop() {
            let cur = Element::Section(current);
            let unvisited: Vec<Element> = self
                .neighbors(cur)
                .iter()
                .copied()
                .filter(|e| !processed.contains(e))
                .collect();
            let switch_count = unvisited
                .iter()
                .filter(|e| matches!(e, Element::Switch(_)))
                .count();
            match (switch_count, unvisited.as_slice()) {
                (_, []) => {}
                (1, &[sw @ Element::Switch(s)]) => {
                    if !closed.is_closed(s) {
                        continue;
                    }
                    let others: Vec<SectionIndex> = self
                        .neighbor_sections(sw)
                        .filter(|&t| t != current)
                        .collect();
                    let next = match others.as_slice() {
                        &[t] => t,
                        _ => {
                            return Err(DnetError::Structural(format!(
                                "switch {} must lead to exactly one section from {}",
                                self.switches()[s],
                                self.section(current).name
                            )))
                        }
                    };
                    branches.push((current, next));
                    let mut path = processed;
                    path.extend([cur, sw, Element::Section(next)]);
                    stack.push((next, path));
                }
                (0, neighbors) => {
                    // Junction: every neighbor is fed from the current section.
                    let mut path = processed;
                    path.insert(cur);
                    path.extend(neighbors.iter().copied());
                    for &t in neighbors {
                        if let Element::Section(t) = t {
                            branches.push((current, t));
                        }
                    }
                    for &t in neighbors.iter().rev() {
                        if let Element::Section(t) = t {
                            stack.push((t, path.clone()));
                        }
                    }
                }
                _ => {
                    return Err(DnetError::Structural(format!(
                        "section {} has an invalid junction",
                        self.section(current).name
                    )))
                }
            }
        }
        Ok(branches)
    }

    /// Returns true if the branches form a connected graph without cycles.
    pub fn is_tree(&self, branches: &[Branch]) -> bool {
        let mut uf = UnionFind::new(self.sections().len());
        for &(s, t) in branches {
            if !uf.union(s, t) {
                return false;
            }
        }
        match branches.first() {
            Some(&(first, _)) => branches
                .iter()
                .all(|&(s, t)| uf.same_set(first, s) && uf.same_set(first, t)),
            None => true,
        }
    }

    /// Current of every section of a tree: its own load plus everything below it.
    ///
    /// The branches must form a tree.
    pub fn calc_current(
        &self,
        root: SectionIndex,
        branches: &[Branch],
    ) -> HashMap<SectionIndex, PhaseValues> {
        let parent: HashMap<SectionIndex, SectionIndex> =
            branches.iter().map(|&(s, t)| (t, s)).collect();
        let mut current: HashMap<SectionIndex, PhaseValues> = HashMap::new();
        current.insert(root, ZERO_PHASES);
        let add = |current: &mut HashMap<SectionIndex, PhaseValues>, s, load: &PhaseValues| {
            add_phases(current.entry(s).or_insert(ZERO_PHASES), load);
        };
        for &(s, t) in branches {
            let load = self.section(t).load;
            add(&mut current, t, &load);
            let mut s = s;
            // Bounded to stay finite if the branches contain a cycle.
            for _ in 0..=branches.len() {
                add(&mut current, s, &load);
                match parent.get(&s) {
                    Some(&p) => s = p,
                    None => break,
                }
            }
        }
        let root_load = self.section(root).load;
        add(&mut current, root, &root_load);
        current
    }

    /// Resistive loss of the tree fed by `root`.
    ///
    /// Substation sections are left out of the sum when `skip_substations` is set.
    pub fn calc_loss(
        &self,
        root: SectionIndex,
        closed: &Configuration,
        barrier: &BTreeSet<Element>,
        skip_substations: bool,
    ) -> Result<Loss, DnetError> {
        let branches = self.build_tree(root, closed, barrier)?;
        if !self.is_tree(&branches) {
            return Err(DnetError::Structural("loop found".to_string()));
        }
        let current = self.calc_current(root, &branches);
        let mut sections: BTreeSet<SectionIndex> = BTreeSet::from([root]);
        sections.extend(branches.iter().flat_map(|&(s, t)| [s, t]));
        let mut loss = 0.0;
        for s in sections {
            let section = self.section(s);
            if skip_substations && section.substation {
                continue;
            }
            for (j, z) in current[&s].iter().zip(section.impedance.iter()) {
                loss += j.norm_sqr() * z.re;
            }
        }
        Ok(loss)
    }

    /// Returns true if the tree fed by `root` respects the current and voltage limits.
    pub fn satisfies_electric_constraints(
        &self,
        root: SectionIndex,
        closed: &Configuration,
    ) -> Result<bool, DnetError> {
        let branches = self.build_tree(root, closed, &BTreeSet::new())?;
        if !self.is_tree(&branches) {
            return Ok(false);
        }

        let config = self.config();
        let current = self.calc_current(root, &branches);
        if current[&root].iter().any(|j| j.norm() > config.max_current) {
            return Ok(false);
        }

        let parent: HashMap<SectionIndex, SectionIndex> =
            branches.iter().map(|&(s, t)| (t, s)).collect();
        let parents: BTreeSet<SectionIndex> = branches.iter().map(|&(s, _)| s).collect();
        let leaves: BTreeSet<SectionIndex> = branches
            .iter()
            .map(|&(_, t)| t)
            .filter(|t| !parents.contains(t))
            .collect();
        for leaf in leaves {
            let mut drop = ZERO_PHASES;
            let section = self.section(leaf);
            for (d, (j, z)) in drop
                .iter_mut()
                .zip(current[&leaf].iter().zip(section.impedance.iter()))
            {
                *d = j * z / 2.0;
            }
            let mut s = leaf;
            while let Some(&p) = parent.get(&s) {
                s = p;
                let section = self.section(s);
                for (d, (j, z)) in drop
                    .iter_mut()
                    .zip(current[&s].iter().zip(section.impedance.iter()))
                {
                    *d += j * z;
                }
            }
            if drop
                .iter()
                .any(|d| !config.is_voltage_acceptable((config.sending_voltage - *d).norm()))
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
