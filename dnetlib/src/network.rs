//! Distribution network topology model.
//!
//! A [`Network`] is built from a [`NetworkDocument`]. Sections and switches are referred to by
//! index: sections in name order, switches in decision order.
use crate::config::Config;
use crate::io::NetworkDocument;
use crate::types::*;
use crate::utils::add_phases;
use crate::{DnetError, HashMap};

use bitvec::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::path::Path;

mod components;
mod diagram;
mod enumeration;
mod graph;
mod optimization;
mod tree;

#[cfg(test)]
mod tests;

pub use components::Component;
pub use diagram::{Diagram, DiagramNode, NodeKey, Terminal};
pub use graph::DualGraph;
pub use optimization::OptimizationResult;
pub use tree::Branch;

/// A switch or a section of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Switch(SwitchIndex),
    Section(SectionIndex),
}

/// A section with its per-phase electrical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub name: String,
    pub load: PhaseValues,
    pub impedance: PhaseValues,
    pub substation: bool,
}

/// The set of closed switches. Every other switch is open.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    closed: BitVec,
}

impl Configuration {
    /// Configuration of `switch_count` switches, all open.
    pub fn all_open(switch_count: usize) -> Self {
        Configuration {
            closed: bitvec![0; switch_count],
        }
    }

    pub fn from_closed<I: IntoIterator<Item = SwitchIndex>>(switch_count: usize, closed: I) -> Self {
        let mut config = Configuration::all_open(switch_count);
        for s in closed {
            config.close(s);
        }
        config
    }

    pub fn from_bits(closed: BitVec) -> Self {
        Configuration { closed }
    }

    #[inline]
    pub fn is_closed(&self, switch: SwitchIndex) -> bool {
        self.closed[switch]
    }

    #[inline]
    pub fn close(&mut self, switch: SwitchIndex) {
        self.closed.set(switch, true);
    }

    #[inline]
    pub fn open(&mut self, switch: SwitchIndex) {
        self.closed.set(switch, false);
    }

    /// Number of switches.
    #[inline]
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.count_ones()
    }

    pub fn closed_switches(&self) -> impl Iterator<Item = SwitchIndex> + '_ {
        self.closed.iter_ones()
    }

    pub fn open_switches(&self) -> impl Iterator<Item = SwitchIndex> + '_ {
        self.closed.iter_zeros()
    }

    pub fn as_bits(&self) -> &BitSlice {
        &self.closed
    }
}

/// A distribution network and its dual graph.
#[derive(Debug)]
pub struct Network {
    config: Config,
    nodes: Vec<Vec<Element>>,
    switches: Vec<String>,
    sections: Vec<Section>,
    switch_index: HashMap<String, SwitchIndex>,
    section_index: HashMap<String, SectionIndex>,
    root_sections: Vec<SectionIndex>,
    /// Nodes containing each element, indexed by dense element id.
    element_nodes: Vec<Vec<usize>>,
    neighbor_cache: Vec<OnceCell<Vec<Element>>>,
    graph: DualGraph,
}

impl Network {
    /// Build a network with the default operating limits.
    pub fn new(doc: NetworkDocument) -> Result<Network, DnetError> {
        Network::with_config(doc, Config::default())
    }

    pub fn with_config(doc: NetworkDocument, config: Config) -> Result<Network, DnetError> {
        let NetworkDocument {
            nodes: raw_nodes,
            switches,
            sections: raw_sections,
        } = doc;

        let mut switch_index = HashMap::new();
        for (i, name) in switches.iter().enumerate() {
            if raw_sections.contains_key(name) {
                return Err(DnetError::BadInput(format!(
                    "{} is declared both as a switch and as a section",
                    name
                )));
            }
            if switch_index.insert(name.clone(), i).is_some() {
                return Err(DnetError::BadInput(format!("duplicate switch {}", name)));
            }
        }

        let mut section_index = HashMap::new();
        let mut sections = Vec::with_capacity(raw_sections.len());
        for (i, (name, data)) in raw_sections.into_iter().enumerate() {
            section_index.insert(name.clone(), i);
            sections.push(Section {
                name,
                load: data.load_phases(),
                impedance: data.impedance_phases(),
                substation: data.substation,
            });
        }
        if sections
            .iter()
            .any(|s| s.load.iter().any(|l| l.re < 0.0))
        {
            log::warn!("Section loads are assumed to be non-negative");
        }

        let mut nodes = Vec::with_capacity(raw_nodes.len());
        for raw in raw_nodes {
            let mut node = Vec::with_capacity(raw.len());
            for name in raw {
                let element = if let Some(&s) = switch_index.get(&name) {
                    Element::Switch(s)
                } else if let Some(&s) = section_index.get(&name) {
                    Element::Section(s)
                } else {
                    return Err(DnetError::BadInput(format!(
                        "undeclared identifier {} in nodes",
                        name
                    )));
                };
                node.push(element);
            }
            nodes.push(node);
        }

        let element_count = switches.len() + sections.len();
        let mut element_nodes = vec![Vec::new(); element_count];
        let switch_count = switches.len();
        let dense = |e: Element| match e {
            Element::Switch(s) => s,
            Element::Section(s) => switch_count + s,
        };
        for (n, node) in nodes.iter().enumerate() {
            for &e in node {
                element_nodes[dense(e)].push(n);
            }
        }

        let root_sections = (0..sections.len())
            .filter(|&s| sections[s].substation)
            .collect();

        let mut network = Network {
            config,
            nodes,
            switches,
            sections,
            switch_index,
            section_index,
            root_sections,
            element_nodes,
            neighbor_cache: (0..element_count).map(|_| OnceCell::new()).collect(),
            graph: DualGraph::default(),
        };
        network.graph = DualGraph::build(&network)?;
        log::info!(
            "Network has {} sections, {} switches, {} dual graph vertices, {} roots",
            network.sections.len(),
            network.switches.len(),
            network.graph.vertex_count,
            network.graph.roots.len()
        );
        Ok(network)
    }

    /// Read a network from a YAML file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Network> {
        let doc = NetworkDocument::read_from_file(path)?;
        Network::new(doc).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    #[inline]
    pub fn switches(&self) -> &[String] {
        &self.switches
    }

    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[inline]
    pub fn section(&self, s: SectionIndex) -> &Section {
        &self.sections[s]
    }

    #[inline]
    pub fn nodes(&self) -> &[Vec<Element>] {
        &self.nodes
    }

    #[inline]
    pub fn graph(&self) -> &DualGraph {
        &self.graph
    }

    pub fn switch_index(&self, name: &str) -> Result<SwitchIndex, DnetError> {
        self.switch_index
            .get(name)
            .copied()
            .ok_or_else(|| DnetError::BadInput(format!("unknown switch {}", name)))
    }

    pub fn section_index(&self, name: &str) -> Result<SectionIndex, DnetError> {
        self.section_index
            .get(name)
            .copied()
            .ok_or_else(|| DnetError::BadInput(format!("unknown section {}", name)))
    }

    pub fn element_name(&self, e: Element) -> &str {
        match e {
            Element::Switch(s) => &self.switches[s],
            Element::Section(s) => &self.sections[s].name,
        }
    }

    /// Build a configuration from the names of its closed switches.
    pub fn configuration<S: AsRef<str>>(&self, closed: &[S]) -> Result<Configuration, DnetError> {
        let mut config = Configuration::all_open(self.switches.len());
        for name in closed {
            config.close(self.switch_index(name.as_ref())?);
        }
        Ok(config)
    }

    /// Names of the given switches, sorted.
    pub fn switch_names<I: IntoIterator<Item = SwitchIndex>>(&self, switches: I) -> Vec<String> {
        switches
            .into_iter()
            .map(|s| self.switches[s].clone())
            .sorted()
            .collect()
    }

    /// Returns true if both networks have the same nodes and switches.
    pub fn has_same_topology(&self, other: &Network) -> bool {
        self.nodes == other.nodes && self.switches == other.switches
    }

    #[inline]
    fn dense_id(&self, e: Element) -> usize {
        match e {
            Element::Switch(s) => s,
            Element::Section(s) => self.switches.len() + s,
        }
    }

    /// Elements sharing a node with `e`, sorted, excluding `e` itself.
    pub fn neighbors(&self, e: Element) -> &[Element] {
        let id = self.dense_id(e);
        self.neighbor_cache[id].get_or_init(|| {
            self.element_nodes[id]
                .iter()
                .flat_map(|&n| self.nodes[n].iter().copied())
                .filter(|&t| t != e)
                .sorted()
                .dedup()
                .collect()
        })
    }

    /// Sections sharing a node with `e`.
    pub fn neighbor_sections(&self, e: Element) -> impl Iterator<Item = SectionIndex> + '_ {
        self.neighbors(e).iter().filter_map(|t| match t {
            Element::Section(s) => Some(*s),
            Element::Switch(_) => None,
        })
    }

    /// Substation sections in name order.
    #[inline]
    pub fn root_sections(&self) -> &[SectionIndex] {
        &self.root_sections
    }

    #[inline]
    pub fn root_vertices(&self) -> &[Vertex] {
        &self.graph.roots
    }

    #[inline]
    pub fn switch_to_edge(&self, s: SwitchIndex) -> Edge {
        self.graph.edges[s]
    }

    pub fn edge_to_switch(&self, e: Edge) -> Option<SwitchIndex> {
        self.graph.edge_to_switch(e)
    }

    /// Switches bordering the switch-less region(s) around `e`.
    ///
    /// For a section this is every switch incident to its region. For a switch it is every
    /// other switch incident to either of its two regions.
    pub fn neighbor_switches(&self, e: Element) -> BTreeSet<SwitchIndex> {
        match e {
            Element::Section(s) => self.graph.region_switches(s).iter().copied().collect(),
            Element::Switch(sw) => {
                let mut out: BTreeSet<SwitchIndex> = self
                    .neighbor_sections(e)
                    .flat_map(|s| self.graph.region_switches(s).iter().copied())
                    .collect();
                out.remove(&sw);
                out
            }
        }
    }

    /// Frontier switches around the closed switches, or around `root` if none is closed.
    pub fn surrounding_switches(
        &self,
        root: SectionIndex,
        closed: &Configuration,
    ) -> BTreeSet<SwitchIndex> {
        if closed.closed_count() == 0 {
            return self.neighbor_switches(Element::Section(root));
        }
        let mut out = BTreeSet::new();
        for s in closed.closed_switches() {
            out.extend(self.neighbor_switches(Element::Switch(s)));
        }
        out.retain(|&s| !closed.is_closed(s));
        out
    }

    /// Switches on the frontier of every other substation.
    pub fn border_switches(&self, root: SectionIndex) -> BTreeSet<SwitchIndex> {
        debug_assert!(self.sections[root].substation);
        self.root_sections
            .iter()
            .filter(|&&r| r != root)
            .flat_map(|&r| self.neighbor_switches(Element::Section(r)))
            .collect()
    }

    /// Total load of every section for each phase.
    pub fn total_load(&self) -> PhaseValues {
        let mut total = ZERO_PHASES;
        for section in &self.sections {
            add_phases(&mut total, &section.load);
        }
        total
    }
}
