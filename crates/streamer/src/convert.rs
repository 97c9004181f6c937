use std::collections::HashMap;

use glam::{Affine3A, EulerRot, Quat, Vec3};
use log::warn;

use streamer_asset::{
    animation::{AnimLayer, Curve, NodeChannels},
    node::{Node, NodeId, NodeKind},
    scene::Scene,
};

/// Name of the marker generated for a joint.
pub fn marker_name(joint: &str) -> String {
    format!("{}_Marker", joint)
}

/// Name of the marker-set container for a skeleton root.
pub fn marker_set_name(root: &str) -> String {
    format!("{}_MarkerSet", root)
}

/// Ordered list of key timestamps of a curve, reused as the sampling
/// grid for the inverse conversion.
pub fn extract_key_times(curve: &Curve) -> Vec<f32> {
    curve.key_times()
}

fn euler_deg_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        euler.x.to_radians(),
        euler.y.to_radians(),
        euler.z.to_radians(),
    )
}

fn quat_to_euler_deg(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

fn local_transform(node: &Node, layer: &AnimLayer, time: f32) -> Affine3A {
    let (translation, rotation) = match layer.channels(node.id()) {
        Some(channels) => (
            channels.translation.evaluate_vec3(time, node.translation),
            channels.rotation.evaluate_vec3(time, node.rotation),
        ),
        None => (node.translation, node.rotation),
    };
    Affine3A::from_rotation_translation(euler_deg_to_quat(rotation), translation)
}

fn bind_transform(node: &Node) -> Affine3A {
    Affine3A::from_rotation_translation(euler_deg_to_quat(node.rotation), node.translation)
}

fn world_position(chain: &[&Node], node: &Node, layer: &AnimLayer, time: f32) -> Vec3 {
    let mut global = Affine3A::IDENTITY;
    for ancestor in chain {
        global = global * local_transform(ancestor, layer, time);
    }
    (global * local_transform(node, layer, time)).translation.into()
}

fn bind_world_position(chain: &[&Node], node: &Node) -> Vec3 {
    let mut global = Affine3A::IDENTITY;
    for ancestor in chain {
        global = global * bind_transform(ancestor);
    }
    (global * bind_transform(node)).translation.into()
}

struct MarkerSamples {
    joint: String,
    bind_world: Vec3,
    samples: Vec<(f32, Vec3)>,
}

/// Joints without rotation keys of their own are sampled on the
/// subtree root's grid.
fn sample_times(node: &Node, layer: &AnimLayer, fallback: &[f32]) -> Vec<f32> {
    let own = layer
        .channels(node.id())
        .map(|channels| channels.rotation.x.key_times())
        .unwrap_or_default();
    if own.is_empty() {
        fallback.to_vec()
    } else {
        own
    }
}

fn collect_markers<'a>(
    node: &'a Node,
    layer: &AnimLayer,
    chain: &mut Vec<&'a Node>,
    fallback_times: &[f32],
    out: &mut Vec<MarkerSamples>,
) {
    let times = sample_times(node, layer, fallback_times);
    out.push(MarkerSamples {
        joint: node.name.clone(),
        bind_world: bind_world_position(chain, node),
        samples: times
            .iter()
            .map(|&time| (time, world_position(chain, node, layer, time)))
            .collect(),
    });
    chain.push(node);
    for child in node.children() {
        collect_markers(child, layer, chain, fallback_times, out);
    }
    chain.pop();
}

/// Forward conversion: build one world-space positional marker per
/// joint of the skeleton rooted at `root_id` and attach the marker set
/// to the scene root, alongside the skeleton it was derived from.
///
/// Each marker carries translation-only channels sampled at the source
/// joint's rotation key times, holding the joint's absolute position
/// accumulated through the parent chain. Returns the id of the
/// marker-set container, or `None` when the root is missing or not a
/// skeleton node.
pub fn to_absolute_markers(scene: &mut Scene, root_id: NodeId) -> Option<NodeId> {
    let (root_name, samples) = {
        let root = scene.find(root_id)?;
        if root.kind != NodeKind::Skeleton {
            return None;
        }
        let fallback = scene
            .layer()
            .channels(root_id)
            .map(|channels| channels.rotation.x.key_times())
            .unwrap_or_default();
        let mut out = Vec::new();
        let mut chain = Vec::new();
        collect_markers(root, scene.layer(), &mut chain, &fallback, &mut out);
        (root.name.clone(), out)
    };

    let mut set = scene.create_node(marker_set_name(&root_name), NodeKind::Other);
    for marker_samples in samples {
        let mut marker = scene.create_node(marker_name(&marker_samples.joint), NodeKind::Marker);
        marker.translation = marker_samples.bind_world;
        if !marker_samples.samples.is_empty() {
            let channels = scene.layer_mut().channels_mut(marker.id());
            for (time, position) in marker_samples.samples {
                channels.translation.add_vec3_key(time, position);
            }
        }
        set.add_child(marker);
    }
    let set_id = set.id();
    scene.root_mut().add_child(set);
    Some(set_id)
}

struct RebuildContext<'a> {
    times: &'a [f32],
    positions: &'a HashMap<String, Vec<Vec3>>,
}

/// The arc from the bind-pose child offset to the observed child
/// direction, expressed in the parent frame. The twist component is
/// unobservable from positional markers and stays at zero.
fn solve_local_rotation(parent_rotation: Quat, joint: Vec3, child: Vec3, bind_offset: Vec3) -> Quat {
    let observed = (parent_rotation.inverse() * (child - joint)).normalize_or_zero();
    let bind = bind_offset.normalize_or_zero();
    if observed == Vec3::ZERO || bind == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(bind, observed)
}

fn rebuild_joint(
    scene: &mut Scene,
    source: &Node,
    rename: Option<&str>,
    is_root: bool,
    parent_rotation: &[Quat],
    ctx: &RebuildContext,
    out: &mut Vec<(NodeId, NodeChannels)>,
) -> Option<Node> {
    let Some(track) = ctx.positions.get(&source.name) else {
        warn!("No marker trajectory for joint {}, skipping it", source.name);
        return None;
    };
    let name = rename.unwrap_or(&source.name);
    let mut node = scene.create_node(name, NodeKind::Skeleton);
    node.translation = source.translation;
    node.rotation = source.rotation;

    // The first child with a marker trajectory drives the solve;
    // leaves keep identity rotation.
    let aim = source.children().iter().find_map(|child| {
        ctx.positions
            .get(&child.name)
            .map(|child_track| (child.translation, child_track))
    });

    let mut channels = NodeChannels::default();
    let mut world_rotation = Vec::with_capacity(ctx.times.len());
    for (index, &time) in ctx.times.iter().enumerate() {
        let local = match aim {
            Some((bind_offset, child_track)) => solve_local_rotation(
                parent_rotation[index],
                track[index],
                child_track[index],
                bind_offset,
            ),
            None => Quat::IDENTITY,
        };
        channels.rotation.add_vec3_key(time, quat_to_euler_deg(local));
        if is_root {
            channels.translation.add_vec3_key(time, track[index]);
        }
        world_rotation.push(parent_rotation[index] * local);
    }

    for child in source.children() {
        if let Some(rebuilt_child) =
            rebuild_joint(scene, child, None, false, &world_rotation, ctx, out)
        {
            node.add_child(rebuilt_child);
        }
    }
    if !channels.is_empty() {
        out.push((node.id(), channels));
    }
    Some(node)
}

/// Inverse conversion: rebuild a joint subtree with the topology of
/// the skeleton at `source_root`, its rotations re-derived from the
/// corresponding markers' absolute positions at exactly the provided
/// timestamps. The list is the authoritative sampling grid; no other
/// times are invented. The rebuilt subtree is attached to the scene
/// root, its root node renamed to `target_root_name`, and its root
/// additionally receives translation channels from the root marker.
pub fn from_absolute_markers(
    scene: &mut Scene,
    source_root: NodeId,
    target_root_name: &str,
    times: &[f32],
) -> Option<NodeId> {
    let source = scene.find(source_root)?.clone();
    if source.kind != NodeKind::Skeleton {
        return None;
    }

    // Resolve every joint's marker trajectory on the grid before any
    // mutation.
    let mut positions: HashMap<String, Vec<Vec3>> = HashMap::new();
    {
        let layer = scene.layer();
        let root = scene.root();
        source.visit(&mut |joint| {
            let Some(marker) = root.find_by_name(&marker_name(&joint.name)) else {
                return;
            };
            let Some(channels) = layer.channels(marker.id()) else {
                return;
            };
            let track = times
                .iter()
                .map(|&time| channels.translation.evaluate_vec3(time, marker.translation))
                .collect();
            positions.insert(joint.name.clone(), track);
        });
    }

    let parent_rotation = vec![Quat::IDENTITY; times.len()];
    let ctx = RebuildContext {
        times,
        positions: &positions,
    };
    let mut new_channels = Vec::new();
    let rebuilt = rebuild_joint(
        scene,
        &source,
        Some(target_root_name),
        true,
        &parent_rotation,
        &ctx,
        &mut new_channels,
    )?;
    let rebuilt_id = rebuilt.id();
    scene.root_mut().add_child(rebuilt);
    for (id, channels) in new_channels {
        *scene.layer_mut().channels_mut(id) = channels;
    }
    Some(rebuilt_id)
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use streamer_asset::{
        node::{Node, NodeId, NodeKind},
        scene::Scene,
    };

    use super::{
        euler_deg_to_quat, extract_key_times, from_absolute_markers, to_absolute_markers,
    };

    const TIMES: [f32; 4] = [0.0, 1.0, 2.0, 3.0];

    fn sample_skeleton() -> (Scene, NodeId) {
        let mut scene = Scene::new("test", "Take 001");
        let mut hips = scene.create_node("Hips", NodeKind::Skeleton);
        let mut spine = scene.create_node("Spine", NodeKind::Skeleton);
        spine.translation = Vec3::new(0.0, 1.0, 0.0);
        let mut head = scene.create_node("Head", NodeKind::Skeleton);
        head.translation = Vec3::new(0.0, 0.5, 0.0);
        let hips_id = hips.id();
        {
            let channels = scene.layer_mut().channels_mut(hips_id);
            for (i, &time) in TIMES.iter().enumerate() {
                channels
                    .translation
                    .add_vec3_key(time, Vec3::new(0.1 * i as f32, 0.0, 0.0));
                channels
                    .rotation
                    .add_vec3_key(time, Vec3::new(0.0, 0.0, 30.0 * i as f32));
            }
        }
        {
            let channels = scene.layer_mut().channels_mut(spine.id());
            for &time in &TIMES {
                channels.rotation.add_vec3_key(time, Vec3::ZERO);
            }
        }
        spine.add_child(head);
        hips.add_child(spine);
        scene.root_mut().add_child(hips);
        (scene, hips_id)
    }

    fn assert_same_shape(a: &Node, b: &Node) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.children().len(), b.children().len());
        for (left, right) in a.children().iter().zip(b.children()) {
            assert_same_shape(left, right);
        }
    }

    #[test]
    fn test_one_marker_per_joint() {
        let (mut scene, hips_id) = sample_skeleton();
        let set_id = to_absolute_markers(&mut scene, hips_id).unwrap();

        let set = scene.find(set_id).unwrap();
        assert_eq!(set.name, "Hips_MarkerSet");
        assert_eq!(set.children().len(), 3);
        for name in ["Hips_Marker", "Spine_Marker", "Head_Marker"] {
            let marker = set.find_by_name(name).unwrap();
            assert_eq!(marker.kind, NodeKind::Marker);
        }
    }

    #[test]
    fn test_non_skeleton_root_is_not_eligible() {
        let mut scene = Scene::new("test", "Take 001");
        let prop = scene.create_node("Prop", NodeKind::Other);
        let prop_id = prop.id();
        scene.root_mut().add_child(prop);

        assert!(to_absolute_markers(&mut scene, prop_id).is_none());
    }

    #[test]
    fn test_marker_positions_accumulate_parent_chain() {
        let (mut scene, hips_id) = sample_skeleton();
        let set_id = to_absolute_markers(&mut scene, hips_id).unwrap();

        let marker = scene.find(set_id).unwrap().find_by_name("Spine_Marker").unwrap();
        let channels = scene.layer().channels(marker.id()).unwrap();

        // Time 0: no rotation, no offset.
        let at_start = channels.translation.evaluate_vec3(0.0, Vec3::ZERO);
        assert!(at_start.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-4));

        // Time 1: hips at (0.1, 0, 0), rotated 30 degrees about Z.
        let at_one = channels.translation.evaluate_vec3(1.0, Vec3::ZERO);
        let expected = Vec3::new(0.1 - 0.5, 30f32.to_radians().cos(), 0.0);
        assert!(at_one.abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn test_inverse_preserves_topology() {
        let (mut scene, hips_id) = sample_skeleton();
        to_absolute_markers(&mut scene, hips_id).unwrap();
        let grid = scene
            .layer()
            .channels(hips_id)
            .map(|channels| extract_key_times(&channels.translation.x))
            .unwrap();

        let rebuilt_id = from_absolute_markers(&mut scene, hips_id, "Hips", &grid).unwrap();
        let source = scene.find(hips_id).unwrap().clone();
        let rebuilt = scene.find(rebuilt_id).unwrap();
        assert_same_shape(&source, rebuilt);
    }

    #[test]
    fn test_inverse_samples_exactly_on_the_grid() {
        let (mut scene, hips_id) = sample_skeleton();
        to_absolute_markers(&mut scene, hips_id).unwrap();
        let grid = scene
            .layer()
            .channels(hips_id)
            .map(|channels| extract_key_times(&channels.translation.x))
            .unwrap();
        assert_eq!(grid, TIMES);

        let rebuilt_id = from_absolute_markers(&mut scene, hips_id, "Hips", &grid).unwrap();
        let rebuilt = scene.find(rebuilt_id).unwrap();
        let root_channels = scene.layer().channels(rebuilt.id()).unwrap();
        assert_eq!(root_channels.rotation.x.key_times(), grid);
        assert_eq!(root_channels.translation.x.key_times(), grid);
        let spine_channels = scene.layer().channels(rebuilt.children()[0].id()).unwrap();
        assert_eq!(spine_channels.rotation.x.key_times(), grid);
    }

    #[test]
    fn test_reconstruction_matches_marker_trajectory() {
        let (mut scene, hips_id) = sample_skeleton();
        let set_id = to_absolute_markers(&mut scene, hips_id).unwrap();
        let grid = scene
            .layer()
            .channels(hips_id)
            .map(|channels| extract_key_times(&channels.translation.x))
            .unwrap();
        let rebuilt_id = from_absolute_markers(&mut scene, hips_id, "Hips", &grid).unwrap();

        let rebuilt = scene.find(rebuilt_id).unwrap();
        let spine = &rebuilt.children()[0];
        let root_channels = scene.layer().channels(rebuilt.id()).unwrap();
        let marker = scene.find(set_id).unwrap().find_by_name("Spine_Marker").unwrap();
        let marker_channels = scene.layer().channels(marker.id()).unwrap();

        for &time in &grid {
            let root_position = root_channels.translation.evaluate_vec3(time, Vec3::ZERO);
            let root_rotation =
                euler_deg_to_quat(root_channels.rotation.evaluate_vec3(time, Vec3::ZERO));
            let spine_world = root_position + root_rotation * spine.translation;
            let observed = marker_channels.translation.evaluate_vec3(time, Vec3::ZERO);
            assert!(
                spine_world.abs_diff_eq(observed, 1e-3),
                "time {}: {:?} vs {:?}",
                time,
                spine_world,
                observed
            );
        }
    }
}
