//! Minimum loss configuration search over a decision diagram.
//!
//! The switches of each independent component are decided together. The search space is a
//! layered graph whose vertices are `(component level, diagram node)` pairs and whose edges are
//! the assignments of one component, weighted by the loss of that component. The optimum is the
//! shortest path from the diagram root to the accepting terminal.
use super::{Component, Configuration, Diagram, DiagramNode, Element, Network, NodeKey};
use crate::configset::ConfigSet;
use crate::types::*;
use crate::{DnetError, HashMap};

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Loss report of the best configuration.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OptimizationResult {
    /// Total loss of the configuration minimizing the non-substation loss.
    pub minimum_loss: Loss,
    /// Loss of the best configuration without the substation sections.
    pub loss_without_root_sections: Loss,
    /// `loss_without_root_sections` plus the least possible loss of the substation sections.
    pub lower_bound_of_minimum_loss: Loss,
    pub open_switches: Vec<String>,
    pub closed_switches: Vec<String>,
    /// Length of the shortest path found in the search space.
    pub search_loss: Loss,
}

#[derive(Clone, Debug)]
struct Transition {
    loss: Loss,
    closed: Vec<SwitchIndex>,
}

#[derive(Default)]
struct SearchSpace {
    graph: DiGraph<(usize, NodeKey), Transition>,
    vertices: HashMap<(usize, NodeKey), NodeIndex>,
}

impl SearchSpace {
    fn vertex(&mut self, key: (usize, NodeKey)) -> NodeIndex {
        match self.vertices.get(&key) {
            Some(&v) => v,
            None => {
                let v = self.graph.add_node(key);
                self.vertices.insert(key, v);
                v
            }
        }
    }

    /// Adds an edge, keeping the cheaper transition if one already exists.
    fn add_transition(
        &mut self,
        from: (usize, NodeKey),
        to: (usize, NodeKey),
        loss: Loss,
        closed: &[SwitchIndex],
    ) {
        let a = self.vertex(from);
        let b = self.vertex(to);
        match self.graph.find_edge(a, b) {
            Some(e) => {
                if loss < self.graph[e].loss {
                    self.graph[e] = Transition {
                        loss,
                        closed: closed.to_vec(),
                    };
                }
            }
            None => {
                self.graph.add_edge(
                    a,
                    b,
                    Transition {
                        loss,
                        closed: closed.to_vec(),
                    },
                );
            }
        }
    }
}

/// A component section next to a substation and the sections it must not expand into.
type SubRoot = (SectionIndex, BTreeSet<Element>);

impl Network {
    /// Total loss of a configuration.
    pub fn loss(&self, config: &Configuration) -> Result<Loss, DnetError> {
        self.sum_root_losses(config, false)
    }

    /// Total loss of a configuration and the lower bound of the minimum loss.
    pub fn loss_report(&self, config: &Configuration) -> Result<(Loss, Loss), DnetError> {
        let loss = self.loss(config)?;
        let lower_bound = self.root_loss_lower_bound()? + self.sum_root_losses(config, true)?;
        Ok((loss, lower_bound))
    }

    fn sum_root_losses(
        &self,
        config: &Configuration,
        skip_substations: bool,
    ) -> Result<Loss, DnetError> {
        let barrier = BTreeSet::new();
        let mut loss = 0.0;
        for &root in self.root_sections() {
            loss += self.calc_loss(root, config, &barrier, skip_substations)?;
        }
        Ok(loss)
    }

    /// Least possible loss of the substation sections.
    ///
    /// The total load is split between substations in proportion to their conductance.
    pub fn root_loss_lower_bound(&self) -> Result<Loss, DnetError> {
        let total = self.total_load();
        let mut bound = 0.0;
        for (i, &load) in total.iter().enumerate() {
            let mut conductance = 0.0;
            for &root in self.root_sections() {
                let r = self.section(root).impedance[i].re;
                if r <= 0.0 {
                    return Err(DnetError::BadInput(format!(
                        "substation {} needs a positive resistance",
                        self.section(root).name
                    )));
                }
                conductance += 1.0 / r;
            }
            for &root in self.root_sections() {
                let r = self.section(root).impedance[i].re;
                let current = load / (r * conductance);
                bound += current.norm_sqr() * r;
            }
        }
        Ok(bound)
    }

    fn sub_roots(&self, component: &Component) -> Vec<SubRoot> {
        component
            .sections
            .iter()
            .filter(|&&s| {
                self.neighbor_sections(Element::Section(s))
                    .any(|t| self.section(t).substation)
            })
            .map(|&s| {
                let barrier: BTreeSet<Element> = self
                    .neighbor_sections(Element::Section(s))
                    .map(Element::Section)
                    .collect();
                (s, barrier)
            })
            .collect()
    }

    fn component_loss(
        &self,
        sub_roots: &[SubRoot],
        closed: &[SwitchIndex],
    ) -> Result<Loss, DnetError> {
        let config = Configuration::from_closed(self.switches().len(), closed.iter().copied());
        let mut loss = 0.0;
        for (root, barrier) in sub_roots {
            loss += self.calc_loss(*root, &config, barrier, false)?;
        }
        Ok(loss)
    }

    /// Assignments of the component's switches reachable from `entry`, with their exit nodes.
    fn find_configs(
        diagram: &Diagram,
        entry: NodeKey,
        component: &Component,
    ) -> Vec<(Vec<SwitchIndex>, NodeKey)> {
        let mut configs = Vec::new();
        let mut stack = vec![(entry, Vec::new())];
        while let Some((key, closed)) = stack.pop() {
            match diagram.node(key) {
                DiagramNode::Decision { switch, low, high } if component.contains_switch(switch) => {
                    let mut with = closed.clone();
                    with.push(switch);
                    stack.push((high, with));
                    if low != NodeKey::Pruned {
                        stack.push((low, closed));
                    }
                }
                _ => configs.push((closed, key)),
            }
        }
        configs
    }

    fn search(&self, diagram: &Diagram) -> Result<(Configuration, Loss), DnetError> {
        let components = self.find_components()?;
        let mut space = SearchSpace::default();
        let mut entries: BTreeSet<NodeKey> = BTreeSet::from([diagram.root()]);

        for (level, component) in components.iter().enumerate() {
            let sub_roots = self.sub_roots(component);
            let mut loss_cache: BTreeMap<Vec<SwitchIndex>, Loss> = BTreeMap::new();
            let mut next_entries = BTreeSet::new();
            for &entry in &entries {
                for (mut closed, exit) in Network::find_configs(diagram, entry, component) {
                    closed.sort_unstable();
                    next_entries.insert(exit);
                    let loss = match loss_cache.get(&closed) {
                        Some(&loss) => loss,
                        None => {
                            let loss = self.component_loss(&sub_roots, &closed)?;
                            loss_cache.insert(closed.clone(), loss);
                            loss
                        }
                    };
                    space.add_transition((level, entry), (level + 1, exit), loss, &closed);
                }
            }
            log::debug!(
                "Component {}: {} switches, {} entries, {} distinct assignments",
                level,
                component.switches.len(),
                entries.len(),
                loss_cache.len()
            );
            entries = next_entries;
        }

        let start = space.vertex((0, diagram.root()));
        let goal = space
            .vertices
            .get(&(components.len(), NodeKey::Accepted))
            .copied()
            .ok_or_else(|| {
                DnetError::Structural("the search space does not reach the accepting node".into())
            })?;
        let (search_loss, path) = astar(
            &space.graph,
            start,
            |v| v == goal,
            |e| e.weight().loss,
            |_| 0.0,
        )
        .ok_or_else(|| DnetError::Structural("no path in the search space".to_string()))?;

        let mut config = Configuration::all_open(self.switches().len());
        for window in path.windows(2) {
            if let Some(e) = space.graph.find_edge(window[0], window[1]) {
                for &s in &space.graph[e].closed {
                    config.close(s);
                }
            }
        }
        log::debug!(
            "Search space has {} vertices and {} edges",
            space.graph.node_count(),
            space.graph.edge_count()
        );
        Ok((config, search_loss))
    }

    /// Finds the minimum loss configuration of a feasible family.
    pub fn optimize(&self, configs: &ConfigSet) -> Result<OptimizationResult, DnetError> {
        if !self.has_same_topology(configs.network()) {
            return Err(DnetError::BadInput(
                "the configuration set belongs to another network".to_string(),
            ));
        }
        let diagram = Diagram::parse(&configs.dumps(), self.switches().len())?;
        self.optimize_diagram(&diagram)
    }

    /// Finds the minimum loss configuration of a family given as a parsed diagram.
    pub fn optimize_diagram(&self, diagram: &Diagram) -> Result<OptimizationResult, DnetError> {
        if diagram.root() == NodeKey::Pruned {
            return Err(DnetError::BadInput(
                "no feasible configuration to optimize".to_string(),
            ));
        }
        let (config, search_loss) = if self.switches().is_empty() {
            (Configuration::all_open(0), None)
        } else {
            let (config, loss) = self.search(diagram)?;
            (config, Some(loss))
        };

        let minimum_loss = self.loss(&config)?;
        let loss_without_root_sections = self.sum_root_losses(&config, true)?;
        let lower_bound = self.root_loss_lower_bound()?;
        let search_loss = search_loss.unwrap_or(loss_without_root_sections);
        let tolerance = 1e-6 * loss_without_root_sections.abs().max(1.0);
        if (search_loss - loss_without_root_sections).abs() > tolerance {
            log::warn!(
                "Search loss {} differs from the recomputed loss {}",
                search_loss,
                loss_without_root_sections
            );
        }

        let result = OptimizationResult {
            minimum_loss,
            loss_without_root_sections,
            lower_bound_of_minimum_loss: lower_bound + loss_without_root_sections,
            open_switches: self.switch_names(config.open_switches()),
            closed_switches: self.switch_names(config.closed_switches()),
            search_loss,
        };
        log::info!(
            "Minimum loss {} with {} open switches",
            result.minimum_loss,
            result.open_switches.len()
        );
        Ok(result)
    }
}
