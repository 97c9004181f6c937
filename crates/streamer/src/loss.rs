use rand::Rng;

use streamer_asset::{
    animation::{AnimLayer, ChannelSet},
    node::Node,
};

/// Default drop threshold, out of ten.
pub const DEFAULT_DROP_THRESHOLD: u32 = 9;

/// Per-key stochastic drop model approximating unreliable delivery.
///
/// The threshold T is out of ten: a uniform draw in [0, 10) strictly
/// below it removes a key. The first key of every curve anchors the
/// animation start and is never eligible. Channels with fewer than two
/// keys are left untouched.
#[derive(Debug, Clone, Copy)]
pub struct KeyDropper {
    threshold: u32,
}

impl KeyDropper {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.min(9),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Apply the drop model to `node`'s translation and rotation
    /// channels, then to every descendant, depth-first. The walk is
    /// topology-driven and ignores node kind.
    pub fn degrade_hierarchy<R: Rng>(&self, node: &Node, layer: &mut AnimLayer, rng: &mut R) {
        if let Some(channels) = layer.get_mut(node.id()) {
            self.degrade_channel_set(&mut channels.translation, rng);
            self.degrade_channel_set(&mut channels.rotation, rng);
        }
        for child in node.children() {
            self.degrade_hierarchy(child, layer, rng);
        }
    }

    /// One pass over a channel set.
    ///
    /// Iterates the original index range of the X curve while removing
    /// from the live, shrinking curves, so a decision at index j can
    /// land on a key that has already shifted down. Each axis draws
    /// its own random number; X, Y and Z are not guaranteed to drop
    /// the same index. Both behaviors model per-packet loss of
    /// independently transported axis streams and are part of the
    /// contract, not re-indexing bugs.
    pub fn degrade_channel_set<R: Rng>(&self, set: &mut ChannelSet, rng: &mut R) {
        let original_count = if set.x.key_count() > 1 {
            set.x.key_count()
        } else {
            0
        };
        for index in 1..original_count {
            for curve in set.axes_mut() {
                let draw = rng.gen_range(0..10);
                if draw < self.threshold {
                    curve.remove_key(index);
                }
            }
        }
    }
}
