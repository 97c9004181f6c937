use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    fs, io,
    path::Path,
};

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    animation::{AnimLayer, ChannelSet, Curve, Key},
    node::{Node, NodeKind},
    scene::Scene,
};

#[derive(Debug)]
pub enum TakeLoadError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl Display for TakeLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TakeLoadError::Io(err) => Display::fmt(err, f),
            TakeLoadError::Parse(err) => write!(f, "Invalid take file: {}", err),
        }
    }
}

impl Error for TakeLoadError {}

impl From<io::Error> for TakeLoadError {
    fn from(value: io::Error) -> Self {
        TakeLoadError::Io(value)
    }
}

#[derive(Debug)]
pub enum TakeSaveError {
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl Display for TakeSaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TakeSaveError::Io(err) => Display::fmt(err, f),
            TakeSaveError::Serialize(err) => write!(f, "Failed to serialize take: {}", err),
        }
    }
}

impl Error for TakeSaveError {}

impl From<io::Error> for TakeSaveError {
    fn from(value: io::Error) -> Self {
        TakeSaveError::Io(value)
    }
}

/// Output layout of a saved take file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TakeFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Serialize, Deserialize)]
struct TakeDocument {
    scene: String,
    take: String,
    nodes: Vec<NodeDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channels: Option<ChannelsDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChannelsDocument {
    #[serde(default, skip_serializing_if = "ComponentDocument::is_empty")]
    translation: ComponentDocument,
    #[serde(default, skip_serializing_if = "ComponentDocument::is_empty")]
    rotation: ComponentDocument,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ComponentDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    x: Vec<(f32, f32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    y: Vec<(f32, f32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    z: Vec<(f32, f32)>,
}

impl ComponentDocument {
    fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }
}

fn kind_from_tag(tag: &str) -> NodeKind {
    match tag {
        "skeleton" => NodeKind::Skeleton,
        "marker" => NodeKind::Marker,
        _ => NodeKind::Other,
    }
}

fn kind_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Skeleton => "skeleton",
        NodeKind::Marker => "marker",
        NodeKind::Other => "null",
    }
}

fn curve_from_pairs(pairs: Vec<(f32, f32)>) -> Curve {
    Curve::from_keys(
        pairs
            .into_iter()
            .map(|(time, value)| Key { time, value })
            .collect(),
    )
}

fn channel_set_from_document(doc: ComponentDocument) -> ChannelSet {
    ChannelSet {
        x: curve_from_pairs(doc.x),
        y: curve_from_pairs(doc.y),
        z: curve_from_pairs(doc.z),
    }
}

fn curve_to_pairs(curve: &Curve) -> Vec<(f32, f32)> {
    curve.keys().iter().map(|key| (key.time, key.value)).collect()
}

fn channel_set_to_document(set: &ChannelSet) -> ComponentDocument {
    ComponentDocument {
        x: curve_to_pairs(&set.x),
        y: curve_to_pairs(&set.y),
        z: curve_to_pairs(&set.z),
    }
}

fn node_from_document(scene: &mut Scene, doc: NodeDocument) -> Option<Node> {
    let Some(tag) = doc.kind else {
        warn!("Node {} carries no kind attribute, skipping it", doc.name);
        return None;
    };
    let mut node = scene.create_node(doc.name, kind_from_tag(&tag));
    node.translation = Vec3::from(doc.translation);
    node.rotation = Vec3::from(doc.rotation);
    if let Some(channels) = doc.channels {
        let node_channels = scene.layer_mut().channels_mut(node.id());
        node_channels.translation = channel_set_from_document(channels.translation);
        node_channels.rotation = channel_set_from_document(channels.rotation);
    }
    for child_doc in doc.children {
        if let Some(child) = node_from_document(scene, child_doc) {
            node.add_child(child);
        }
    }
    Some(node)
}

fn node_to_document(node: &Node, layer: &AnimLayer) -> NodeDocument {
    let channels = layer
        .channels(node.id())
        .filter(|channels| !channels.is_empty())
        .map(|channels| ChannelsDocument {
            translation: channel_set_to_document(&channels.translation),
            rotation: channel_set_to_document(&channels.rotation),
        });
    NodeDocument {
        name: node.name.clone(),
        kind: Some(kind_tag(node.kind).to_string()),
        translation: node.translation.to_array(),
        rotation: node.rotation.to_array(),
        channels,
        children: node
            .children()
            .iter()
            .map(|child| node_to_document(child, layer))
            .collect(),
    }
}

pub fn scene_from_str(text: &str) -> Result<Scene, TakeLoadError> {
    let document: TakeDocument = serde_json::from_str(text).map_err(TakeLoadError::Parse)?;
    let mut scene = Scene::new(document.scene, document.take);
    for node_doc in document.nodes {
        if let Some(node) = node_from_document(&mut scene, node_doc) {
            scene.root_mut().add_child(node);
        }
    }
    Ok(scene)
}

pub fn scene_to_string(scene: &Scene, format: TakeFormat) -> Result<String, TakeSaveError> {
    let document = TakeDocument {
        scene: scene.name.clone(),
        take: scene.layer().name().to_string(),
        nodes: scene
            .root()
            .children()
            .iter()
            .map(|node| node_to_document(node, scene.layer()))
            .collect(),
    };
    match format {
        TakeFormat::Pretty => serde_json::to_string_pretty(&document),
        TakeFormat::Compact => serde_json::to_string(&document),
    }
    .map_err(TakeSaveError::Serialize)
}

pub fn load_take(path: &Path) -> Result<Scene, TakeLoadError> {
    let text = fs::read_to_string(path)?;
    scene_from_str(&text)
}

pub fn save_take(scene: &Scene, path: &Path, format: TakeFormat) -> Result<(), TakeSaveError> {
    let text = scene_to_string(scene, format)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use crate::{
        node::NodeKind,
        scene::Scene,
    };

    use super::{scene_from_str, scene_to_string, TakeFormat};

    fn sample_scene() -> Scene {
        let mut scene = Scene::new("walk", "Take 001");
        let mut hips = scene.create_node("Hips", NodeKind::Skeleton);
        hips.translation = Vec3::new(0.0, 1.0, 0.0);
        let spine = scene.create_node("Spine", NodeKind::Skeleton);
        {
            let channels = scene.layer_mut().channels_mut(hips.id());
            channels.translation.x.add_key(0.0, 0.0);
            channels.translation.x.add_key(1.0, 0.5);
            channels.rotation.z.add_key(0.0, 0.0);
            channels.rotation.z.add_key(1.0, 45.0);
        }
        hips.add_child(spine);
        scene.root_mut().add_child(hips);
        scene
    }

    #[test]
    fn test_round_trip_preserves_structure_and_keys() {
        let scene = sample_scene();
        let text = scene_to_string(&scene, TakeFormat::Compact).unwrap();
        let reloaded = scene_from_str(&text).unwrap();

        assert_eq!(reloaded.name, "walk");
        assert_eq!(reloaded.layer().name(), "Take 001");
        let hips = reloaded.find_by_name("Hips").unwrap();
        assert_eq!(hips.kind, NodeKind::Skeleton);
        assert_eq!(hips.translation, Vec3::new(0.0, 1.0, 0.0));
        assert!(hips.find_by_name("Spine").is_some());

        let channels = reloaded.layer().channels(hips.id()).unwrap();
        assert_eq!(channels.translation.x.key_times(), [0.0, 1.0]);
        assert_eq!(channels.rotation.z.keys()[1].value, 45.0);
    }

    #[test]
    fn test_node_without_kind_is_skipped() {
        let text = r#"{
            "scene": "s",
            "take": "t",
            "nodes": [
                { "name": "NoKind" },
                { "name": "Hips", "kind": "skeleton" }
            ]
        }"#;
        let scene = scene_from_str(text).unwrap();

        assert!(scene.find_by_name("NoKind").is_none());
        assert!(scene.find_by_name("Hips").is_some());
    }

    #[test]
    fn test_unknown_kind_maps_to_other() {
        let text = r#"{
            "scene": "s",
            "take": "t",
            "nodes": [ { "name": "Prop", "kind": "camera" } ]
        }"#;
        let scene = scene_from_str(text).unwrap();

        assert_eq!(scene.find_by_name("Prop").unwrap().kind, NodeKind::Other);
    }
}
