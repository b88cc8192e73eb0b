//! Dual graph: switches are edges, switch-less regions of sections are vertices.
use super::{Element, Network};
use crate::types::*;
use crate::utils::UnionFind;
use crate::{DnetError, HashMap};

use std::collections::BTreeSet;

/// Dual representation of a network.
///
/// A region is a maximal set of sections connected through shared nodes. Each region touched by
/// a switch or containing a substation is a vertex, numbered from 1.
#[derive(Clone, Debug, Default)]
pub struct DualGraph {
    /// Edge of each switch, smaller vertex first.
    pub edges: Vec<Edge>,
    /// Vertices containing a substation, sorted.
    pub roots: Vec<Vertex>,
    pub vertex_count: usize,
    edge_index: HashMap<Edge, SwitchIndex>,
    region_of: Vec<usize>,
    regions: Vec<Vec<SectionIndex>>,
    region_vertex: Vec<Option<Vertex>>,
    vertex_region: Vec<usize>,
    region_switches: Vec<Vec<SwitchIndex>>,
}

impl DualGraph {
    pub(super) fn build(network: &Network) -> Result<DualGraph, DnetError> {
        let section_count = network.sections().len();
        let mut uf = UnionFind::new(section_count);
        for node in network.nodes() {
            let mut sections = node.iter().filter_map(|e| match e {
                Element::Section(s) => Some(*s),
                Element::Switch(_) => None,
            });
            if let Some(first) = sections.next() {
                for s in sections {
                    uf.union(first, s);
                }
            }
        }

        // Regions are numbered by their lowest section, which is also their canonical name.
        let mut region_of = vec![usize::MAX; section_count];
        let mut regions: Vec<Vec<SectionIndex>> = Vec::new();
        let mut rep_region: HashMap<usize, usize> = HashMap::new();
        for s in 0..section_count {
            let rep = uf.find(s);
            let r = *rep_region.entry(rep).or_insert_with(|| {
                regions.push(Vec::new());
                regions.len() - 1
            });
            regions[r].push(s);
            region_of[s] = r;
        }

        let mut region_switches = vec![Vec::new(); regions.len()];
        let mut region_vertex: Vec<Option<Vertex>> = vec![None; regions.len()];
        let mut vertex_region = Vec::new();
        let mut edges = Vec::with_capacity(network.switches().len());
        let mut edge_index = HashMap::new();

        for (sw, name) in network.switches().iter().enumerate() {
            let mut ends = BTreeSet::new();
            for &t in network.neighbors(Element::Switch(sw)) {
                match t {
                    Element::Switch(other) => {
                        return Err(DnetError::Structural(format!(
                            "switch {} is adjacent to switch {}",
                            name,
                            network.switches()[other]
                        )));
                    }
                    Element::Section(s) => {
                        if network.section(s).substation {
                            return Err(DnetError::Structural(format!(
                                "substation {} must be connected to a junction, not to switch {}",
                                network.section(s).name,
                                name
                            )));
                        }
                        ends.insert(region_of[s]);
                    }
                }
            }
            if ends.len() != 2 {
                return Err(DnetError::Structural(format!(
                    "switch {} must connect two distinct regions, found {}",
                    name,
                    ends.len()
                )));
            }
            let mut vertices = Vec::with_capacity(2);
            for &r in &ends {
                region_switches[r].push(sw);
                let v = *region_vertex[r].get_or_insert_with(|| {
                    vertex_region.push(r);
                    vertex_region.len()
                });
                vertices.push(v);
            }
            let edge = (vertices[0].min(vertices[1]), vertices[0].max(vertices[1]));
            if let Some(&other) = edge_index.get(&edge) {
                return Err(DnetError::Structural(format!(
                    "switches {} and {} connect the same regions",
                    network.switches()[other],
                    name
                )));
            }
            edge_index.insert(edge, sw);
            edges.push(edge);
        }

        let mut roots = Vec::new();
        for &s in network.root_sections() {
            let r = region_of[s];
            let v = *region_vertex[r].get_or_insert_with(|| {
                vertex_region.push(r);
                vertex_region.len()
            });
            roots.push(v);
        }
        roots.sort_unstable();
        roots.dedup();
        if roots.len() != network.root_sections().len() {
            return Err(DnetError::Structural(format!(
                "{} substations share {} regions",
                network.root_sections().len(),
                roots.len()
            )));
        }

        for (r, sections) in regions.iter().enumerate() {
            if region_vertex[r].is_none() {
                log::warn!(
                    "Region of section {} is touched by no switch and has no substation",
                    network.section(sections[0]).name
                );
            }
        }

        Ok(DualGraph {
            edges,
            roots,
            vertex_count: vertex_region.len(),
            edge_index,
            region_of,
            regions,
            region_vertex,
            vertex_region,
            region_switches,
        })
    }

    /// Switch represented by `edge`, in either orientation.
    pub fn edge_to_switch(&self, edge: Edge) -> Option<SwitchIndex> {
        let (u, v) = edge;
        self.edge_index.get(&(u.min(v), u.max(v))).copied()
    }

    /// Switches incident to the region of section `s`, in decision order.
    pub fn region_switches(&self, s: SectionIndex) -> &[SwitchIndex] {
        &self.region_switches[self.region_of[s]]
    }

    /// Sections forming the region of section `s`.
    pub fn region(&self, s: SectionIndex) -> &[SectionIndex] {
        &self.regions[self.region_of[s]]
    }

    pub fn section_to_vertex(&self, s: SectionIndex) -> Option<Vertex> {
        self.region_vertex[self.region_of[s]]
    }

    /// Sections contracted into vertex `v`.
    pub fn vertex_sections(&self, v: Vertex) -> &[SectionIndex] {
        &self.regions[self.vertex_region[v - 1]]
    }
}
