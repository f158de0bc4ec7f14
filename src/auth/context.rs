use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::Device;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calibration::{CalibrationMethod, Calibrator};
use crate::config::Config;
use crate::constants::{DimConfig, NEUTRAL_PROBABILITY};
use crate::decision::{DecisionInput, DecisionPolicy};
use crate::embedding::{Encoder, Matrix, Trial};
use crate::prototypes::{EnrollmentReport, PrototypeConfig, PrototypeStore, UserId};
use crate::scoring::SimilarityScorer;
use crate::spoof::{SpoofDetector, SpoofError};

use super::error::{AuthError, AuthResult};
use super::event::{AuthenticationEvent, EventParts, ReducedMode};

/// Everything authentication reads. Replaced wholesale, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    pub prototypes: PrototypeStore,
    pub calibrator: Option<Arc<Calibrator>>,
    pub spoof_detector: Option<Arc<SpoofDetector>>,
}

impl ModelState {
    pub fn new(prototypes: PrototypeStore) -> Self {
        Self {
            prototypes,
            ..Self::default()
        }
    }

    pub fn with_calibrator(mut self, calibrator: Calibrator) -> Self {
        self.calibrator = Some(Arc::new(calibrator));
        self
    }

    pub fn with_spoof_detector(mut self, detector: SpoofDetector) -> Self {
        self.spoof_detector = Some(Arc::new(detector));
        self
    }

    /// The spoof model must accept the same width as the stored prototypes.
    pub fn validate(&self) -> AuthResult<()> {
        if let Some(dim) = self.prototypes.dim()
            && let Some(detector) = &self.spoof_detector
            && detector.architecture().input_dim != dim
        {
            return Err(SpoofError::DimensionMismatch {
                expected: dim,
                actual: detector.architecture().input_dim,
            }
            .into());
        }
        Ok(())
    }

    /// Every loaded model must have the configured embedding width.
    pub fn check_dims(&self, dims: DimConfig) -> AuthResult<()> {
        if let Some(dim) = self.prototypes.dim() {
            dims.check(dim)?;
        }
        if let Some(detector) = &self.spoof_detector {
            dims.check(detector.architecture().input_dim)?;
        }
        Ok(())
    }
}

/// Where each artifact lives. `None` means that component is memory-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub prototypes: Option<PathBuf>,
    pub calibrator: Option<PathBuf>,
    pub spoof_detector: Option<PathBuf>,
}

impl ArtifactPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prototypes: Some(config.prototypes_artifact()),
            calibrator: Some(config.calibrator_artifact()),
            spoof_detector: Some(config.spoof_artifact()),
        }
    }

    /// Loads every artifact that exists. Missing files yield an empty store or
    /// an absent model; unreadable files are errors.
    pub fn load(&self, device: &Device) -> AuthResult<ModelState> {
        let prototypes = match existing(&self.prototypes) {
            Some(path) => PrototypeStore::load(path)?,
            None => {
                warn!("No prototype store on disk, starting empty");
                PrototypeStore::new()
            }
        };
        let calibrator = match existing(&self.calibrator) {
            Some(path) => Some(Arc::new(Calibrator::load(path)?)),
            None => {
                warn!("No calibrator on disk, probabilities fall back to 0.5");
                None
            }
        };
        let spoof_detector = match existing(&self.spoof_detector) {
            Some(path) => Some(Arc::new(SpoofDetector::load(path, device)?)),
            None => {
                warn!("No spoof detector on disk, spoof screening disabled");
                None
            }
        };

        let state = ModelState {
            prototypes,
            calibrator,
            spoof_detector,
        };
        state.validate()?;
        Ok(state)
    }
}

fn existing(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| p.exists())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStatus {
    pub users: usize,
    pub embedding_dim: Option<usize>,
    pub calibrator: Option<CalibrationMethod>,
    pub spoof_detector_loaded: bool,
    pub spoof_threshold: Option<f64>,
}

/// Shared authentication state.
///
/// Readers take a cheap `Arc` snapshot. Writers (enrollment, component swaps,
/// reloads) hold `writer` for the whole read-modify-persist-publish sequence
/// so concurrent enrollments cannot lose each other's updates.
pub struct AuthContext {
    state: RwLock<Arc<ModelState>>,
    writer: Mutex<()>,
    scorer: SimilarityScorer,
    policy: DecisionPolicy,
    prototype_config: PrototypeConfig,
    paths: ArtifactPaths,
    device: Device,
    dims: Option<DimConfig>,
}

impl AuthContext {
    pub fn new(
        state: ModelState,
        scorer: SimilarityScorer,
        policy: DecisionPolicy,
        prototype_config: PrototypeConfig,
    ) -> AuthResult<Self> {
        state.validate()?;
        prototype_config.validate()?;
        Ok(Self {
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            scorer,
            policy,
            prototype_config,
            paths: ArtifactPaths::default(),
            device: Device::Cpu,
            dims: None,
        })
    }

    /// Enrollments are persisted to `paths.prototypes` when set.
    pub fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Pins the embedding width. The current state and every later publish must match it.
    pub fn with_dims(mut self, dims: DimConfig) -> AuthResult<Self> {
        dims.validate()?;
        self.snapshot().check_dims(dims)?;
        self.dims = Some(dims);
        Ok(self)
    }

    /// Builds a context from configuration and whatever artifacts exist on disk.
    pub fn from_config(config: &Config, device: Device) -> AuthResult<Self> {
        let paths = ArtifactPaths::from_config(config);
        let state = paths.load(&device)?;
        let policy = DecisionPolicy::new(config.decision_config())?;
        let context = Self::new(
            state,
            SimilarityScorer::new(config.aggregation),
            policy,
            config.prototype_config(),
        )?
        .with_dims(config.dim_config())?;
        let status = context.status();
        info!(
            users = status.users,
            calibrator = status.calibrator.is_some(),
            spoof_detector = status.spoof_detector_loaded,
            "Authentication context ready"
        );
        Ok(context.with_paths(paths).with_device(device))
    }

    /// Current model state. Holds no lock after returning.
    pub fn snapshot(&self) -> Arc<ModelState> {
        Arc::clone(&self.state.read())
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn authenticate(&self, user_id: UserId, probe: &[f32]) -> AuthResult<AuthenticationEvent> {
        let state = self.snapshot();
        let prototypes = state.prototypes.get(user_id)?;
        let breakdown = self.scorer.breakdown(probe, prototypes)?;

        let mut reduced_mode = ReducedMode::default();
        let probability = match &state.calibrator {
            Some(calibrator) => calibrator.apply_one(breakdown.score)?,
            None => {
                reduced_mode.calibrator_missing = true;
                NEUTRAL_PROBABILITY
            }
        };

        let (reconstruction_error, spoof_threshold, spoof_flag) = match &state.spoof_detector {
            Some(detector) => {
                let assessment = detector.assess(probe)?;
                (
                    Some(assessment.reconstruction_error),
                    Some(assessment.threshold),
                    assessment.is_spoof,
                )
            }
            None => {
                reduced_mode.spoof_detector_missing = true;
                (None, None, false)
            }
        };

        if reduced_mode.any() {
            warn!(
                user_id,
                calibrator_missing = reduced_mode.calibrator_missing,
                spoof_detector_missing = reduced_mode.spoof_detector_missing,
                "Authenticating in reduced mode"
            );
        }

        let decision = self.policy.decide(&DecisionInput {
            similarity: breakdown.score,
            probability,
            spoof_flag,
            spoof_score: reconstruction_error,
        });
        debug!(
            user_id,
            similarity = breakdown.score,
            probability,
            spoof = spoof_flag,
            authenticated = decision.authenticated,
            "Authentication decided"
        );

        Ok(AuthenticationEvent::new(
            EventParts {
                user_id,
                probe: probe.to_vec(),
                similarity: breakdown.score,
                best_prototype: breakdown.best_prototype,
                probability,
                reconstruction_error,
                spoof_threshold,
                spoof_flag,
                reduced_mode,
            },
            decision,
        ))
    }

    /// Recomputes `user_id`'s prototypes, persists the whole store, then publishes it.
    ///
    /// On any failure the published state is unchanged.
    pub fn enroll(&self, user_id: UserId, embeddings: &Matrix) -> AuthResult<EnrollmentReport> {
        let _guard = self.writer.lock();
        let current = self.snapshot();

        let mut prototypes = current.prototypes.clone();
        let report = prototypes.add_or_update(user_id, embeddings, &self.prototype_config)?;
        if report.degraded {
            warn!(
                user_id,
                trials = report.num_trials,
                k = report.k,
                "Degraded enrollment"
            );
        }
        let next = ModelState {
            prototypes,
            calibrator: current.calibrator.clone(),
            spoof_detector: current.spoof_detector.clone(),
        };
        self.accept(&next)?;
        if let Some(path) = &self.paths.prototypes {
            next.prototypes.save(path)?;
        }

        self.publish(next)?;
        Ok(report)
    }

    pub fn replace_calibrator(&self, calibrator: Option<Calibrator>) -> AuthResult<()> {
        let _guard = self.writer.lock();
        let current = self.snapshot();
        info!(
            method = ?calibrator.as_ref().map(|c| c.method()),
            "Replacing calibrator"
        );
        self.publish(ModelState {
            calibrator: calibrator.map(Arc::new),
            ..(*current).clone()
        })
    }

    pub fn replace_spoof_detector(&self, detector: Option<SpoofDetector>) -> AuthResult<()> {
        let _guard = self.writer.lock();
        let current = self.snapshot();
        info!(
            threshold = ?detector.as_ref().map(|d| d.threshold()),
            "Replacing spoof detector"
        );
        self.publish(ModelState {
            spoof_detector: detector.map(Arc::new),
            ..(*current).clone()
        })
    }

    /// Re-reads every configured artifact. A load failure leaves the current state in place.
    pub fn reload_from_disk(&self) -> AuthResult<()> {
        if self.paths == ArtifactPaths::default() {
            return Err(AuthError::NoArtifactPaths);
        }
        let _guard = self.writer.lock();
        let loaded = self.paths.load(&self.device)?;
        let current = self.snapshot();
        // Components without a configured path keep their in-memory value.
        let state = ModelState {
            prototypes: match self.paths.prototypes {
                Some(_) => loaded.prototypes,
                None => current.prototypes.clone(),
            },
            calibrator: match self.paths.calibrator {
                Some(_) => loaded.calibrator,
                None => current.calibrator.clone(),
            },
            spoof_detector: match self.paths.spoof_detector {
                Some(_) => loaded.spoof_detector,
                None => current.spoof_detector.clone(),
            },
        };
        self.publish(state)?;
        info!("Reloaded model state from disk");
        Ok(())
    }

    pub fn status(&self) -> ContextStatus {
        let state = self.snapshot();
        ContextStatus {
            users: state.prototypes.len(),
            embedding_dim: state.prototypes.dim(),
            calibrator: state.calibrator.as_ref().map(|c| c.method()),
            spoof_detector_loaded: state.spoof_detector.is_some(),
            spoof_threshold: state.spoof_detector.as_ref().map(|d| d.threshold()),
        }
    }

    pub fn authenticate_trial(
        &self,
        user_id: UserId,
        trial: &Trial,
        encoder: &dyn Encoder,
    ) -> AuthResult<AuthenticationEvent> {
        self.check_encoder(encoder)?;
        let probe = encoder.embed(trial)?;
        self.authenticate(user_id, &probe)
    }

    pub fn enroll_trials(
        &self,
        user_id: UserId,
        trials: &[Trial],
        encoder: &dyn Encoder,
    ) -> AuthResult<EnrollmentReport> {
        self.check_encoder(encoder)?;
        let embeddings = Matrix::from_rows(encoder.embed_batch(trials)?)?;
        self.enroll(user_id, &embeddings)
    }

    /// Without pinned dims, an empty store accepts any encoder width.
    fn check_encoder(&self, encoder: &dyn Encoder) -> AuthResult<()> {
        let expected = self.dims.or_else(|| self.snapshot().prototypes.dim().map(DimConfig::new));
        if let Some(dims) = expected {
            dims.check(encoder.embedding_dim())?;
        }
        Ok(())
    }

    fn accept(&self, state: &ModelState) -> AuthResult<()> {
        state.validate()?;
        if let Some(dims) = self.dims {
            state.check_dims(dims)?;
        }
        Ok(())
    }

    /// Caller must hold `writer`.
    fn publish(&self, state: ModelState) -> AuthResult<()> {
        self.accept(&state)?;
        *self.state.write() = Arc::new(state);
        Ok(())
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("status", &self.status())
            .field("paths", &self.paths)
            .finish()
    }
}
