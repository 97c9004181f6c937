//! Lossy-transmission simulation for streamed skeletal motion
//! capture.
//!
//! A loaded scene's joint hierarchies are flattened into world-space
//! positional markers so every marker axis can be treated as an
//! independent data stream, a joint animation is re-derived from the
//! marker trajectories on the original sampling grid, and a seeded
//! per-key drop model then thins the reconstruction the way an
//! unreliable link would. The output deliberately does not round-trip
//! losslessly.
pub mod convert;
pub mod filter;
pub mod loss;
pub mod transmit;
