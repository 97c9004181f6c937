use crate::{
    animation::AnimLayer,
    node::{Node, NodeId, NodeKind},
};

/// A scene: one root node tree and one active animation layer.
///
/// Node ids are allocated here so that curves in the layer stay
/// unambiguous even when node names repeat (a reconstructed skeleton
/// reuses the source joint names).
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    root: Node,
    layer: AnimLayer,
    next_id: u32,
}

impl Scene {
    pub fn new(name: impl Into<String>, take_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Node::new(NodeId(0), "RootNode", NodeKind::Other),
            layer: AnimLayer::new(take_name),
            next_id: 1,
        }
    }

    /// Allocate a node with a fresh id. The caller attaches it to the
    /// tree.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> Node {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Node::new(id, name, kind)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn layer(&self) -> &AnimLayer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut AnimLayer {
        &mut self.layer
    }

    /// Split borrow for passes that walk the tree while editing
    /// curves.
    pub fn parts_mut(&mut self) -> (&Node, &mut AnimLayer) {
        (&self.root, &mut self.layer)
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.root.find_by_name(name)
    }
}
