//! Enumeration of feasible configurations.
use super::{Configuration, Network};
use crate::configset::ConfigSet;
use crate::types::*;
use crate::zdd::{self, Zdd};
use crate::DnetError;

use bitvec::prelude::*;
use std::collections::BTreeSet;

impl Network {
    fn switch_bits(&self, switches: &BTreeSet<SwitchIndex>) -> BitVec {
        let mut bits = bitvec![0; self.switches().len()];
        for &s in switches {
            bits.set(s, true);
        }
        bits
    }

    /// Configurations with the given closed switches and every frontier switch open.
    fn find_trees(&self, closed: &Configuration, surrounding: &BTreeSet<SwitchIndex>) -> Zdd {
        Zdd::from_constraints(
            self.switches().len(),
            closed.as_bits(),
            &self.switch_bits(surrounding),
        )
    }

    /// Family of configurations whose tree fed by `root` is electrically feasible.
    ///
    /// Switches outside the tree and its frontier are left free.
    pub fn enumerate_trees(&self, root: SectionIndex) -> Result<Zdd, DnetError> {
        let n = self.switches().len();
        let mut family = Zdd::empty(n);
        let empty = Configuration::all_open(n);
        if self.satisfies_electric_constraints(root, &empty)? {
            family = family.union(&self.find_trees(&empty, &self.surrounding_switches(root, &empty)));
        }

        let mut stack: Vec<(Configuration, BTreeSet<SwitchIndex>)> =
            vec![(empty, self.border_switches(root))];
        let mut visited = 0usize;
        while let Some((mut closed, mut fixed)) = stack.pop() {
            visited += 1;
            let next = self
                .surrounding_switches(root, &closed)
                .into_iter()
                .filter(|s| !fixed.contains(s))
                .min_by(|&a, &b| self.switches()[a].cmp(&self.switches()[b]));
            let s = match next {
                Some(s) => s,
                None => continue,
            };
            fixed.insert(s);
            stack.push((closed.clone(), fixed.clone()));

            closed.close(s);
            if self.satisfies_electric_constraints(root, &closed)? {
                let surrounding = self.surrounding_switches(root, &closed);
                family = family.union(&self.find_trees(&closed, &surrounding));
                stack.push((closed, fixed));
            }
        }
        log::debug!(
            "Root {}: {} search frames, {} feasible trees",
            self.section(root).name,
            visited,
            family.count()
        );
        Ok(family)
    }

    /// Family of rooted spanning forests of the dual graph, ignoring electrical limits.
    pub(crate) fn enumerate_forests(&self) -> Zdd {
        let graph = self.graph();
        zdd::forests(&graph.edges, &graph.roots, graph.vertex_count)
    }

    /// All radial configurations that satisfy the electrical limits at every substation.
    pub fn enumerate(&self) -> Result<ConfigSet<'_>, DnetError> {
        let mut family = self.enumerate_forests();
        log::info!("{} radial configurations", family.count());
        for &root in self.root_sections() {
            family = family.intersection(&self.enumerate_trees(root)?);
        }
        log::info!("{} feasible configurations", family.count());
        Ok(ConfigSet::new(self, family))
    }

    /// All radial configurations, ignoring electrical limits.
    pub fn enumerate_topologies(&self) -> ConfigSet<'_> {
        ConfigSet::new(self, self.enumerate_forests())
    }
}
