use rand::Rng;

use lw_types::Node;

/// The configured nodes. Never empty.
#[derive(Clone, Debug)]
pub struct NodePool {
    nodes: Vec<Node>,
}

impl NodePool {
    /// Returns `None` for an empty list.
    pub fn new(nodes: Vec<Node>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        Some(Self { nodes })
    }

    /// The sole node, or a uniformly random one. Calls are independent, so a
    /// failing node may be picked again.
    pub fn pick(&self) -> &Node {
        if self.nodes.len() == 1 {
            return &self.nodes[0];
        }
        let index = rand::thread_rng().gen_range(0..self.nodes.len());
        &self.nodes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
