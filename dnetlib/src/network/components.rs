//! Decomposition into independent components.
use super::{Element, Network};
use crate::types::*;
use crate::utils::UnionFind;
use crate::{DnetError, HashMap};

use std::collections::BTreeSet;

/// Switches and sections connected to each other without passing through a substation node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Component {
    pub switches: BTreeSet<SwitchIndex>,
    pub sections: BTreeSet<SectionIndex>,
}

impl Component {
    pub fn contains_switch(&self, s: SwitchIndex) -> bool {
        self.switches.contains(&s)
    }

    /// Number of switches and sections.
    pub fn len(&self) -> usize {
        self.switches.len() + self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty() && self.sections.is_empty()
    }
}

impl Network {
    /// Independent components, numbered by their first switch in decision order.
    pub fn find_components(&self) -> Result<Vec<Component>, DnetError> {
        let switch_count = self.switches().len();
        let is_root = |e: &Element| matches!(e, Element::Section(s) if self.section(*s).substation);
        let dense = |e: Element| match e {
            Element::Switch(s) => s,
            Element::Section(s) => switch_count + s,
        };

        let mut uf = UnionFind::new(switch_count + self.sections().len());
        for node in self.nodes() {
            if node.iter().any(is_root) {
                continue;
            }
            if let Some((&first, rest)) = node.split_first() {
                for &e in rest {
                    uf.union(dense(first), dense(e));
                }
            }
        }

        let mut components: Vec<Component> = Vec::new();
        let mut rep_component: HashMap<usize, usize> = HashMap::new();
        for s in 0..switch_count {
            let rep = uf.find(s);
            let c = *rep_component.entry(rep).or_insert_with(|| {
                components.push(Component::default());
                components.len() - 1
            });
            components[c].switches.insert(s);
            components[c]
                .sections
                .extend(self.neighbor_sections(Element::Switch(s)));
        }

        if switch_count > 0 {
            let non_root_sections = self.sections().len() - self.root_sections().len();
            let total: usize = components.iter().map(Component::len).sum();
            if total != switch_count + non_root_sections {
                return Err(DnetError::Structural(format!(
                    "components cover {} of {} switches and sections, every section must touch a switch",
                    total,
                    switch_count + non_root_sections
                )));
            }
        }

        for pair in components.windows(2) {
            let previous_max = pair[0].switches.iter().next_back();
            let next_min = pair[1].switches.iter().next();
            if let (Some(a), Some(b)) = (previous_max, next_min) {
                if a > b {
                    return Err(DnetError::Structural(
                        "switches must be ordered by independent components".to_string(),
                    ));
                }
            }
        }

        log::debug!(
            "{} independent components of sizes {:?}",
            components.len(),
            components.iter().map(|c| c.switches.len()).collect::<Vec<_>>()
        );
        Ok(components)
    }
}
