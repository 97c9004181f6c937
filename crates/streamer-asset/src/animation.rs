use std::collections::HashMap;

use glam::Vec3;

use crate::node::NodeId;

/// One time-value sample in an animation curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    pub time: f32,
    pub value: f32,
}

/// One scalar axis's sequence of keys, ordered by time.
///
/// A curve with one key or none is static; evaluation still returns
/// the single value when present.
#[derive(Debug, Clone, Default)]
pub struct Curve {
    keys: Vec<Key>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(mut keys: Vec<Key>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Mutable key access. Callers may rewrite values but must keep
    /// times ordered.
    pub fn keys_mut(&mut self) -> &mut [Key] {
        &mut self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_animated(&self) -> bool {
        self.keys.len() > 1
    }

    pub fn key_times(&self) -> Vec<f32> {
        self.keys.iter().map(|key| key.time).collect()
    }

    /// Insert a key keeping time order; a key at the exact same time
    /// is replaced.
    pub fn add_key(&mut self, time: f32, value: f32) {
        let index = self.keys.partition_point(|key| key.time < time);
        if let Some(existing) = self.keys.get_mut(index) {
            if existing.time == time {
                existing.value = value;
                return;
            }
        }
        self.keys.insert(index, Key { time, value });
    }

    pub fn remove_key(&mut self, index: usize) -> Option<Key> {
        if index < self.keys.len() {
            Some(self.keys.remove(index))
        } else {
            None
        }
    }

    /// Linear interpolation between the surrounding keys, clamped at
    /// the curve's ends. `None` when the curve has no keys at all.
    pub fn evaluate(&self, time: f32) -> Option<f32> {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return None,
        };
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        let index = self.keys.partition_point(|key| key.time < time);
        let after = self.keys[index];
        let before = self.keys[index - 1];
        let span = after.time - before.time;
        if span <= 0.0 {
            return Some(after.value);
        }
        let t = (time - before.time) / span;
        Some(before.value * (1.0 - t) + after.value * t)
    }
}

/// X/Y/Z curve triple for one transform component.
#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    pub x: Curve,
    pub y: Curve,
    pub z: Curve,
}

impl ChannelSet {
    pub fn is_empty(&self) -> bool {
        self.x.key_count() == 0 && self.y.key_count() == 0 && self.z.key_count() == 0
    }

    pub fn axes_mut(&mut self) -> [&mut Curve; 3] {
        [&mut self.x, &mut self.y, &mut self.z]
    }

    pub fn add_vec3_key(&mut self, time: f32, value: Vec3) {
        self.x.add_key(time, value.x);
        self.y.add_key(time, value.y);
        self.z.add_key(time, value.z);
    }

    /// Evaluate all three axes, falling back per axis when a curve is
    /// empty.
    pub fn evaluate_vec3(&self, time: f32, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.evaluate(time).unwrap_or(fallback.x),
            self.y.evaluate(time).unwrap_or(fallback.y),
            self.z.evaluate(time).unwrap_or(fallback.z),
        )
    }
}

/// Translation and rotation channels for one node.
#[derive(Debug, Clone, Default)]
pub struct NodeChannels {
    pub translation: ChannelSet,
    pub rotation: ChannelSet,
}

impl NodeChannels {
    pub fn is_empty(&self) -> bool {
        self.translation.is_empty() && self.rotation.is_empty()
    }
}

/// The active animation layer: a named container of curves bound to
/// scene nodes by id.
#[derive(Debug, Clone)]
pub struct AnimLayer {
    name: String,
    channels: HashMap<NodeId, NodeChannels>,
}

impl AnimLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self, id: NodeId) -> Option<&NodeChannels> {
        self.channels.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeChannels> {
        self.channels.get_mut(&id)
    }

    /// Channel set for a node, created empty when absent.
    pub fn channels_mut(&mut self, id: NodeId) -> &mut NodeChannels {
        self.channels.entry(id).or_default()
    }
}

#[cfg(test)]
mod test {
    use super::{Curve, Key};

    #[test]
    fn test_add_key_keeps_time_order() {
        let mut curve = Curve::new();
        curve.add_key(2.0, 20.0);
        curve.add_key(0.0, 0.0);
        curve.add_key(1.0, 10.0);

        let times: Vec<f32> = curve.key_times();
        assert_eq!(times, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_add_key_replaces_same_time() {
        let mut curve = Curve::new();
        curve.add_key(1.0, 10.0);
        curve.add_key(1.0, 15.0);

        assert_eq!(curve.key_count(), 1);
        assert_eq!(curve.keys()[0].value, 15.0);
    }

    #[test]
    fn test_evaluate_interpolates_and_clamps() {
        let curve = Curve::from_keys(vec![
            Key {
                time: 0.0,
                value: 0.0,
            },
            Key {
                time: 2.0,
                value: 4.0,
            },
        ]);

        assert_eq!(curve.evaluate(1.0), Some(2.0));
        assert_eq!(curve.evaluate(-1.0), Some(0.0));
        assert_eq!(curve.evaluate(5.0), Some(4.0));
        assert_eq!(Curve::new().evaluate(0.0), None);
    }

    #[test]
    fn test_remove_key_keeps_order() {
        let mut curve = Curve::from_keys(vec![
            Key {
                time: 0.0,
                value: 0.0,
            },
            Key {
                time: 1.0,
                value: 1.0,
            },
            Key {
                time: 2.0,
                value: 2.0,
            },
        ]);

        assert!(curve.remove_key(1).is_some());
        assert_eq!(curve.key_times(), [0.0, 2.0]);
        assert!(curve.remove_key(5).is_none());
    }
}
