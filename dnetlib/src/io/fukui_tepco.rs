//! Converter for the legacy multi-file network format distributed by Fukui University and TEPCO.
//!
//! A network in this format is a directory with five whitespace separated text files:
//! - `sw_list.dat`: switch numbers.
//! - `SWed.dat`: `segment node node _` rows, one per segment.
//! - `LNewSL.dat`: `_ segment _ _ ur ui vr vi wr wi` load rows.
//! - `LNewZ.dat`: `segment phase _ _ ur ui vr vi wr wi` impedance rows, one per phase.
//! - `root.dat`: `_ node lu lv lw r x` rows, each adding a substation section numbered `-node`.
use super::{NetworkDocument, SectionData};
use crate::types::NUM_PHASES;
use crate::utils::UnionFind;
use crate::DnetError;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

/// Contents of the files of a legacy network directory.
#[derive(Clone, Debug, Default)]
pub struct FukuiTepcoFiles {
    pub switches: String,
    pub topology: String,
    pub loads: String,
    pub impedances: String,
    pub roots: String,
}

impl FukuiTepcoFiles {
    /// Read all files from a legacy network directory.
    pub fn read_from_dir<P: AsRef<Path>>(dir: P) -> std::io::Result<FukuiTepcoFiles> {
        let dir = dir.as_ref();
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        Ok(FukuiTepcoFiles {
            switches: read("sw_list.dat")?,
            topology: read("SWed.dat")?,
            loads: read("LNewSL.dat")?,
            impedances: read("LNewZ.dat")?,
            roots: read("root.dat")?,
        })
    }
}

fn switch_name(s: i64) -> String {
    format!("switch_{:04}", s)
}

fn section_name(s: i64) -> String {
    format!("section_{:04}", s)
}

/// Iterates over the non-empty lines of a file, splitting each into exactly `count` fields.
fn rows<'a>(
    file: &'static str,
    content: &'a str,
    count: usize,
) -> impl Iterator<Item = Result<(usize, Vec<&'a str>), DnetError>> + 'a {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(move |(i, line)| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != count {
                Err(DnetError::BadInput(format!(
                    "{}:{}: expected {} fields, found {}",
                    file,
                    i + 1,
                    count,
                    fields.len()
                )))
            } else {
                Ok((i + 1, fields))
            }
        })
}

fn parse<T: std::str::FromStr>(file: &str, line: usize, field: &str) -> Result<T, DnetError> {
    field
        .parse()
        .map_err(|_| DnetError::BadInput(format!("{}:{}: cannot parse '{}'", file, line, field)))
}

/// Raw topology of a legacy network, keyed by segment and node numbers.
struct Legacy {
    switches: BTreeSet<i64>,
    sections: BTreeSet<i64>,
    roots: BTreeSet<i64>,
    nodes: BTreeMap<i64, BTreeSet<i64>>,
    loads: BTreeMap<i64, Vec<f64>>,
    impedances: BTreeMap<i64, Vec<f64>>,
}

impl Legacy {
    fn parse(files: &FukuiTepcoFiles) -> Result<Legacy, DnetError> {
        let mut switch_numbers = BTreeSet::new();
        for (i, line) in files.switches.lines().enumerate() {
            for field in line.split_whitespace() {
                switch_numbers.insert(parse::<i64>("sw_list.dat", i + 1, field)?);
            }
        }

        let mut switches = BTreeSet::new();
        let mut sections = BTreeSet::new();
        let mut nodes: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for row in rows("SWed.dat", &files.topology, 4) {
            let (line, fields) = row?;
            let s: i64 = parse("SWed.dat", line, fields[0])?;
            for field in &fields[1..3] {
                let node: i64 = parse("SWed.dat", line, field)?;
                nodes.entry(node).or_default().insert(s);
            }
            if switch_numbers.contains(&s) {
                switches.insert(s);
            } else {
                sections.insert(s);
            }
        }

        let mut loads = BTreeMap::new();
        for row in rows("LNewSL.dat", &files.loads, 10) {
            let (line, fields) = row?;
            let s: i64 = parse("LNewSL.dat", line, fields[1])?;
            let values = fields[4..]
                .iter()
                .map(|f| parse::<f64>("LNewSL.dat", line, f))
                .collect::<Result<Vec<f64>, DnetError>>()?;
            loads.insert(s, values);
        }

        let mut impedances: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for row in rows("LNewZ.dat", &files.impedances, 10) {
            let (line, fields) = row?;
            let s: i64 = parse("LNewZ.dat", line, fields[0])?;
            let values = fields[4..]
                .iter()
                .map(|f| parse::<f64>("LNewZ.dat", line, f))
                .collect::<Result<Vec<f64>, DnetError>>()?;
            // Each row carries the impedance of its own phase in that phase's columns.
            match fields[1] {
                "0" => {
                    impedances.insert(s, values[0..2].to_vec());
                }
                phase => {
                    let offset = if phase == "1" { 2 } else { 4 };
                    impedances
                        .get_mut(&s)
                        .ok_or_else(|| {
                            DnetError::BadInput(format!(
                                "LNewZ.dat:{}: phase {} of segment {} before phase 0",
                                line, phase, s
                            ))
                        })?
                        .extend_from_slice(&values[offset..offset + 2]);
                }
            }
        }

        let mut roots = BTreeSet::new();
        for row in rows("root.dat", &files.roots, 7) {
            let (line, fields) = row?;
            let n: i64 = parse("root.dat", line, fields[1])?;
            let values = fields[2..]
                .iter()
                .map(|f| parse::<f64>("root.dat", line, f))
                .collect::<Result<Vec<f64>, DnetError>>()?;
            nodes
                .get_mut(&n)
                .ok_or_else(|| {
                    DnetError::BadInput(format!("root.dat:{}: unknown node {}", line, n))
                })?
                .insert(-n);
            sections.insert(-n);
            roots.insert(-n);
            loads.insert(-n, vec![values[0], 0.0, values[1], 0.0, values[2], 0.0]);
            impedances.insert(-n, [values[3], values[4]].repeat(NUM_PHASES));
        }

        Ok(Legacy {
            switches,
            sections,
            roots,
            nodes,
            loads,
            impedances,
        })
    }

    fn neighbors(&self, s: i64) -> BTreeSet<i64> {
        self.nodes
            .values()
            .filter(|node| node.contains(&s))
            .flatten()
            .copied()
            .filter(|&t| t != s)
            .collect()
    }

    /// Switches and non-root sections.
    fn elements(&self) -> BTreeSet<i64> {
        self.switches
            .iter()
            .chain(self.sections.difference(&self.roots))
            .copied()
            .collect()
    }

    /// Breadth-first visit order starting at `start`, restricted to `allowed` and never entering
    /// a root section.
    fn visit(&self, start: i64, allowed: &BTreeSet<i64>) -> Vec<i64> {
        let mut visited = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(s) = queue.pop_front() {
            for t in self.neighbors(s) {
                if allowed.contains(&t) && !self.roots.contains(&t) && seen.insert(t) {
                    visited.push(t);
                    queue.push_back(t);
                }
            }
        }
        visited
    }

    /// Orders the switches component by component, breadth first within each component.
    fn sorted_switches(&self) -> Result<Vec<i64>, DnetError> {
        let elements = self.elements();
        let index: BTreeMap<i64, usize> = elements.iter().enumerate().map(|(i, &s)| (s, i)).collect();
        let mut uf = UnionFind::new(elements.len());
        for node in self.nodes.values() {
            if node.iter().any(|s| self.roots.contains(s)) {
                continue;
            }
            let mut members = node.iter().filter_map(|s| index.get(s));
            if let Some(&first) = members.next() {
                for &other in members {
                    uf.union(first, other);
                }
            }
        }

        let start = match self.sections.difference(&self.roots).next() {
            Some(&s) => s,
            None => return Ok(Vec::new()),
        };
        let visited = self.visit(start, &elements);
        if visited.len() != elements.len() {
            return Err(DnetError::Structural(format!(
                "{} of {} segments are unreachable from section {}",
                elements.len() - visited.len(),
                elements.len(),
                start
            )));
        }

        let mut comps: Vec<BTreeSet<i64>> = Vec::new();
        let mut comp_of_rep: BTreeMap<usize, usize> = BTreeMap::new();
        for s in visited {
            let rep = uf.find(index[&s]);
            let c = *comp_of_rep.entry(rep).or_insert_with(|| {
                comps.push(BTreeSet::new());
                comps.len() - 1
            });
            comps[c].insert(s);
        }

        let mut sorted = Vec::with_capacity(self.switches.len());
        for comp in &comps {
            if let Some(&first) = comp.iter().next() {
                sorted.extend(
                    self.visit(first, comp)
                        .into_iter()
                        .filter(|s| self.switches.contains(s)),
                );
            }
        }
        if sorted.len() != self.switches.len() {
            return Err(DnetError::Structural(
                "switches are not reachable within their components".to_string(),
            ));
        }
        Ok(sorted)
    }

    fn section_data(&self, s: i64) -> Result<SectionData, DnetError> {
        let to_array = |values: Option<&Vec<f64>>, what: &str| {
            values
                .and_then(|v| <[f64; 2 * NUM_PHASES]>::try_from(v.as_slice()).ok())
                .ok_or_else(|| {
                    DnetError::BadInput(format!("incomplete {} of segment {}", what, s))
                })
        };
        Ok(SectionData {
            load: to_array(self.loads.get(&s), "load")?,
            impedance: to_array(self.impedances.get(&s), "impedance")?,
            substation: s < 0,
        })
    }
}

/// Convert a legacy network into a network document.
pub fn convert(files: &FukuiTepcoFiles) -> Result<NetworkDocument, DnetError> {
    let legacy = Legacy::parse(files)?;

    for &root in &legacy.roots {
        if let Some(s) = legacy
            .neighbors(root)
            .into_iter()
            .find(|t| legacy.switches.contains(t))
        {
            return Err(DnetError::Structural(format!(
                "root section {} must be connected to a junction, not to switch {}",
                root, s
            )));
        }
    }

    let sorted_switches = legacy.sorted_switches()?;

    let nodes = legacy
        .nodes
        .values()
        .map(|node| {
            let mut names: Vec<String> = node
                .iter()
                .map(|&s| {
                    if legacy.switches.contains(&s) {
                        switch_name(s)
                    } else {
                        section_name(s)
                    }
                })
                .collect();
            names.sort();
            names
        })
        .collect();

    let sections = legacy
        .sections
        .iter()
        .map(|&s| Ok((section_name(s), legacy.section_data(s)?)))
        .collect::<Result<BTreeMap<String, SectionData>, DnetError>>()?;

    log::info!(
        "Converted legacy network: {} switches, {} sections, {} roots",
        sorted_switches.len(),
        sections.len(),
        legacy.roots.len()
    );

    Ok(NetworkDocument {
        nodes,
        switches: sorted_switches.into_iter().map(switch_name).collect(),
        sections,
    })
}

/// Read and convert a legacy network directory.
pub fn convert_dir<P: AsRef<Path>>(dir: P) -> Result<NetworkDocument, Box<dyn std::error::Error>> {
    let files = FukuiTepcoFiles::read_from_dir(dir)?;
    Ok(convert(&files)?)
}
