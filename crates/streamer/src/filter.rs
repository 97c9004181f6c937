use streamer_asset::{
    animation::{AnimLayer, Curve},
    node::Node,
};

/// Removes rotation wraparound introduced when euler angles are
/// sampled from quaternions: each key is shifted by whole turns until
/// it sits within the threshold of its predecessor.
#[derive(Debug, Clone, Copy)]
pub struct UnrollFilter {
    pub threshold: f32,
}

impl Default for UnrollFilter {
    fn default() -> Self {
        Self { threshold: 180.0 }
    }
}

impl UnrollFilter {
    /// Unroll the rotation channels of `node` and of every descendant.
    pub fn apply_hierarchically(&self, node: &Node, layer: &mut AnimLayer) {
        if let Some(channels) = layer.get_mut(node.id()) {
            for curve in channels.rotation.axes_mut() {
                self.unroll(curve);
            }
        }
        for child in node.children() {
            self.apply_hierarchically(child, layer);
        }
    }

    fn unroll(&self, curve: &mut Curve) {
        let keys = curve.keys_mut();
        for index in 1..keys.len() {
            let previous = keys[index - 1].value;
            let mut value = keys[index].value;
            while value - previous > self.threshold {
                value -= 360.0;
            }
            while previous - value > self.threshold {
                value += 360.0;
            }
            keys[index].value = value;
        }
    }
}
