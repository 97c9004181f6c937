use std::fmt::{self, Display, Formatter};

use glam::Vec3;

/// Scene-unique node handle, allocated by the owning scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type tag, decided once when the node is constructed or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Skeleton,
    Marker,
    Other,
}

/// A named node in the scene tree.
///
/// `translation` and `rotation` hold the bind-pose local transform;
/// rotation is euler XYZ in degrees. Animated values live in the
/// scene's animation layer, keyed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub translation: Vec3,
    pub rotation: Vec3,
    children: Vec<Node>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by_name(name))
    }

    /// Depth-first visit, parent before children.
    pub fn visit<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}
