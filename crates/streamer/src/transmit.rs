use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};

use streamer_asset::{
    loader::{self, TakeFormat, TakeLoadError, TakeSaveError},
    node::{NodeId, NodeKind},
};

use crate::{
    convert,
    filter::UnrollFilter,
    loss::{KeyDropper, DEFAULT_DROP_THRESHOLD},
};

/// Fixed per-run seed; identical input degrades identically across
/// runs. Not suitable for anything needing unpredictability.
pub const DEFAULT_SEED: u64 = 1000;

#[derive(Debug, Clone)]
pub struct TransmitConfig {
    /// Drop threshold out of ten.
    pub drop_threshold: u32,
    pub seed: u64,
    /// Name for the reconstructed root joint; the source root's name
    /// is reused when unset.
    pub receiver_root: Option<String>,
    /// Peer a client-mode sender would target.
    pub client_host: String,
    pub format: TakeFormat,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            seed: DEFAULT_SEED,
            receiver_root: None,
            client_host: String::from("localhost"),
            format: TakeFormat::Pretty,
        }
    }
}

#[derive(Debug)]
pub enum TransmitError {
    Load(TakeLoadError),
    Save(TakeSaveError),
}

impl Display for TransmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::Load(err) => write!(f, "Failed to load scene: {}", err),
            TransmitError::Save(err) => write!(f, "Failed to save scene: {}", err),
        }
    }
}

impl Error for TransmitError {}

impl From<TakeLoadError> for TransmitError {
    fn from(value: TakeLoadError) -> Self {
        TransmitError::Load(value)
    }
}

impl From<TakeSaveError> for TransmitError {
    fn from(value: TakeSaveError) -> Self {
        TransmitError::Save(value)
    }
}

/// Owns the top-level pipeline: load a take, convert each skeleton to
/// markers, reconstruct a joint animation from the markers and degrade
/// it, then save the result.
#[derive(Debug)]
pub struct Transmitter {
    pub config: TransmitConfig,
    server_mode: bool,
}

impl Transmitter {
    pub fn new(config: TransmitConfig) -> Self {
        Self {
            config,
            server_mode: false,
        }
    }

    /// Once enabled, client-mode transmission stays disabled for the
    /// remainder of the process.
    pub fn enable_server_mode(&mut self) {
        self.server_mode = true;
    }

    pub fn server_mode(&self) -> bool {
        self.server_mode
    }

    /// Run the pipeline on one take file. A load failure aborts the
    /// run; a save failure is reported without rolling back the
    /// in-memory result. Non-skeleton children of the scene root are
    /// skipped, not treated as errors.
    pub fn transmit(&self, input: &Path, output: &Path) -> Result<(), TransmitError> {
        if self.server_mode {
            warn!("Server mode has been enabled, client mode is disabled");
            return Ok(());
        }
        debug!("Client target host is {}", self.config.client_host);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut scene = match loader::load_take(input) {
            Ok(scene) => scene,
            Err(err) => {
                error!(
                    "Problem found when trying to load the scene. Make sure {} is a valid take file: {}",
                    input.display(),
                    err
                );
                return Err(TransmitError::Load(err));
            }
        };
        info!("File {} has been successfully loaded", input.display());

        let roots: Vec<(NodeId, String, NodeKind)> = scene
            .root()
            .children()
            .iter()
            .map(|node| (node.id(), node.name.clone(), node.kind))
            .collect();
        let dropper = KeyDropper::new(self.config.drop_threshold);

        for (id, name, kind) in roots {
            if kind != NodeKind::Skeleton {
                info!("Skipping non-skeleton child {}", name);
                continue;
            }
            let Some(set_id) = convert::to_absolute_markers(&mut scene, id) else {
                warn!("Could not convert {} to markers", name);
                continue;
            };
            {
                let (root, layer) = scene.parts_mut();
                if let Some(set) = root.find(set_id) {
                    UnrollFilter::default().apply_hierarchically(set, layer);
                    info!("Ready to drop keys for {}", set.name);
                }
            }
            let grid = scene
                .layer()
                .channels(id)
                .map(|channels| convert::extract_key_times(&channels.translation.x))
                .unwrap_or_default();
            let target = self
                .config
                .receiver_root
                .clone()
                .unwrap_or_else(|| name.clone());
            let Some(rebuilt_id) = convert::from_absolute_markers(&mut scene, id, &target, &grid)
            else {
                warn!("Could not reconstruct joints for {}", name);
                continue;
            };
            let (root, layer) = scene.parts_mut();
            if let Some(rebuilt) = root.find(rebuilt_id) {
                dropper.degrade_hierarchy(rebuilt, layer, &mut rng);
            }
        }

        if let Err(err) = loader::save_take(&scene, output, self.config.format) {
            error!("Problem when trying to save scene: {}", err);
            return Err(TransmitError::Save(err));
        }
        info!("Degraded scene written to {}", output.display());
        Ok(())
    }
}
