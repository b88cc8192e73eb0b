//! Reader for serialized decision diagrams.
//!
//! The text layout is one `id var low high` line per node, children before parents and the root
//! last, terminated by a `.` line. The terminal identifiers are `B` (pruned) and `T` (accepted).
//! A diagram whose root is a terminal is a single `B` or `T` line. Decision nodes are
//! zero-suppressed: their high child is never `B`.
use crate::types::SwitchIndex;
use crate::{DnetError, HashMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Accepted,
    Pruned,
}

/// Identity of a diagram node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Pruned,
    Accepted,
    /// Position of a decision node in the diagram.
    Decision(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DiagramNode {
    Terminal(Terminal),
    Decision {
        switch: SwitchIndex,
        low: NodeKey,
        high: NodeKey,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Decision {
    switch: SwitchIndex,
    low: NodeKey,
    high: NodeKey,
}

/// A decision diagram over switches: high edges close the switch, low edges keep it open.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagram {
    decisions: Vec<Decision>,
    root: NodeKey,
}

impl Diagram {
    /// Parse a node list over `switch_count` switches.
    pub fn parse(text: &str, switch_count: usize) -> Result<Diagram, DnetError> {
        let mut ids: HashMap<&str, NodeKey> = HashMap::new();
        ids.insert("B", NodeKey::Pruned);
        ids.insert("T", NodeKey::Accepted);
        let mut decisions: Vec<Decision> = Vec::new();
        let mut root = None;
        let mut terminated = false;

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "." {
                terminated = true;
                break;
            }
            let bad = |reason: &str| {
                DnetError::BadInput(format!("diagram line {}: {}: '{}'", i + 1, reason, line))
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                &[terminal] if decisions.is_empty() && root.is_none() => {
                    root = Some(*ids.get(terminal).ok_or_else(|| bad("unknown terminal"))?);
                }
                &[id, var, low, high] => {
                    if root.is_some() && decisions.is_empty() {
                        return Err(bad("node after a terminal root"));
                    }
                    let var: usize = var.parse().map_err(|_| bad("invalid variable"))?;
                    if var == 0 || var > switch_count {
                        return Err(bad("variable out of range"));
                    }
                    let switch = var - 1;
                    let child = |name: &str| -> Result<NodeKey, DnetError> {
                        let key = *ids.get(name).ok_or_else(|| bad("undefined child"))?;
                        if let NodeKey::Decision(c) = key {
                            if decisions[c].switch <= switch {
                                return Err(bad("children must decide later switches"));
                            }
                        }
                        Ok(key)
                    };
                    let low = child(low)?;
                    let high = child(high)?;
                    if high == NodeKey::Pruned {
                        if low == NodeKey::Pruned {
                            return Err(DnetError::Structural(format!(
                                "diagram node {} has no successor",
                                id
                            )));
                        }
                        return Err(bad("high child must not be pruned"));
                    }
                    let key = NodeKey::Decision(decisions.len());
                    if ids.insert(id, key).is_some() {
                        return Err(bad("duplicate node id"));
                    }
                    decisions.push(Decision { switch, low, high });
                    root = Some(key);
                }
                _ => return Err(bad("malformed node")),
            }
        }

        if !terminated {
            return Err(DnetError::BadInput(
                "diagram is not terminated by '.'".to_string(),
            ));
        }
        let root = root.ok_or_else(|| DnetError::BadInput("diagram has no nodes".to_string()))?;
        Ok(Diagram { decisions, root })
    }

    #[inline]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of decision nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn node(&self, key: NodeKey) -> DiagramNode {
        match key {
            NodeKey::Pruned => DiagramNode::Terminal(Terminal::Pruned),
            NodeKey::Accepted => DiagramNode::Terminal(Terminal::Accepted),
            NodeKey::Decision(i) => {
                let Decision { switch, low, high } = self.decisions[i];
                DiagramNode::Decision { switch, low, high }
            }
        }
    }
}
