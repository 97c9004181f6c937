//! Scene and animation data for the mocap streamer.
//!
//! This library provides the node hierarchy and per-axis animation
//! curve structures the simulation pipeline operates on, along with a
//! reader and writer for the JSON take-file format. One animation
//! layer is active per scene; curves are addressed by node id through
//! that layer rather than being fetched from ambient scene state.
pub mod animation;
/// Take-file reader and writer
pub mod loader;
pub mod node;
pub mod scene;
