use super::*;
use crate::calibration::Calibrator;
use crate::config::Config;
use crate::constants::{DimConfig, DimValidationError};
use crate::decision::{ConfidenceTier, DecisionPolicy, ImpostorKind};
use crate::embedding::{Matrix, StubEncoder, Trial};
use crate::prototypes::{PrototypeConfig, PrototypeError, PrototypeStore};
use crate::scoring::SimilarityScorer;
use crate::spoof::{AutoencoderConfig, EmbeddingAutoencoder, SpoofDetector};
use candle_core::Device;
use std::sync::Arc;
use tempfile::TempDir;

const DIM: usize = 16;

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

fn store_with_user(user_id: u64) -> PrototypeStore {
    let mut store = PrototypeStore::new();
    store
        .insert(user_id, Matrix::from_rows(vec![axis(0), axis(1)]).unwrap())
        .unwrap();
    store
}

fn detector(threshold: f64) -> SpoofDetector {
    let (model, _) =
        EmbeddingAutoencoder::init(AutoencoderConfig::new(DIM, 8, 4), 3, &Device::Cpu).unwrap();
    SpoofDetector::new(model, threshold, 99.0).unwrap()
}

fn context(state: ModelState) -> AuthContext {
    AuthContext::new(
        state,
        SimilarityScorer::default(),
        DecisionPolicy::default(),
        PrototypeConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_reduced_mode_uses_neutral_fallbacks() {
    let ctx = context(ModelState::new(store_with_user(1)));
    let event = ctx.authenticate(1, &axis(0)).unwrap();

    assert_eq!(event.probability, 0.5);
    assert!(!event.spoof_flag);
    assert!(event.reconstruction_error.is_none());
    assert!(event.reduced_mode.calibrator_missing);
    assert!(event.reduced_mode.spoof_detector_missing);
    // 0.5 meets the default threshold of 0.5.
    assert!(event.authenticated);
    assert_eq!(event.tier, ConfidenceTier::Low);
    assert!(event.impostor_profile.is_none());
}

#[test]
fn test_matching_probe_is_authenticated_with_high_confidence() {
    let state = ModelState::new(store_with_user(1))
        .with_calibrator(Calibrator::parametric(20.0, -10.0))
        .with_spoof_detector(detector(1e9));
    let event = context(state).authenticate(1, &axis(1)).unwrap();

    assert!((event.similarity - 1.0).abs() < 1e-6);
    assert_eq!(event.best_prototype, 1);
    assert!(event.probability > 0.99);
    assert!(event.authenticated);
    assert_eq!(event.tier, ConfidenceTier::High);
    assert!(!event.reduced_mode.any());
    assert_eq!(event.probe_fingerprint.len(), 16);
}

#[test]
fn test_orthogonal_probe_is_rejected_and_profiled() {
    let state =
        ModelState::new(store_with_user(1)).with_calibrator(Calibrator::parametric(20.0, -10.0));
    let event = context(state).authenticate(1, &axis(5)).unwrap();

    assert!(event.similarity.abs() < 1e-6);
    assert!(!event.authenticated);
    assert!(event.reason.contains("impostor"));
    let profile = event.impostor_profile.unwrap();
    assert_eq!(profile.kind, ImpostorKind::Random);
}

#[test]
fn test_spoof_flag_vetoes_match() {
    let state = ModelState::new(store_with_user(1))
        .with_calibrator(Calibrator::parametric(20.0, -10.0))
        .with_spoof_detector(detector(0.0));
    let event = context(state).authenticate(1, &axis(0)).unwrap();

    assert!(event.probability > 0.99);
    assert!(event.spoof_flag);
    assert!(!event.authenticated);
    assert_eq!(event.tier, ConfidenceTier::High);
    assert_eq!(event.spoof_threshold, Some(0.0));
    assert_eq!(
        event.impostor_profile.map(|p| p.kind),
        Some(ImpostorKind::ReplayAttack)
    );
}

#[test]
fn test_unknown_user_is_not_found() {
    let ctx = context(ModelState::new(store_with_user(1)));
    assert!(matches!(
        ctx.authenticate(99, &axis(0)),
        Err(AuthError::Prototype(PrototypeError::NotFound { user_id: 99 }))
    ));
}

#[test]
fn test_wrong_width_probe_is_rejected() {
    let ctx = context(ModelState::new(store_with_user(1)));
    assert!(matches!(
        ctx.authenticate(1, &[1.0; 4]),
        Err(AuthError::Scoring(_))
    ));
}

#[test]
fn test_detector_width_must_match_store() {
    let (model, _) =
        EmbeddingAutoencoder::init(AutoencoderConfig::new(32, 8, 4), 1, &Device::Cpu).unwrap();
    let wide = SpoofDetector::new(model, 1.0, 99.0).unwrap();
    let state = ModelState::new(store_with_user(1)).with_spoof_detector(wide);

    assert!(matches!(state.validate(), Err(AuthError::Spoof(_))));
}

#[test]
fn test_enroll_persists_then_publishes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prototypes.nkaf");
    let ctx = context(ModelState::default()).with_paths(ArtifactPaths {
        prototypes: Some(path.clone()),
        ..ArtifactPaths::default()
    });

    let embeddings = Matrix::from_rows(vec![axis(2), axis(3), axis(2), axis(3)]).unwrap();
    let report = ctx.enroll(7, &embeddings).unwrap();
    assert_eq!(report.num_trials, 4);
    assert!(!report.degraded);

    let on_disk = PrototypeStore::load(&path).unwrap();
    assert_eq!(on_disk, ctx.snapshot().prototypes);
    assert_eq!(ctx.status().users, 1);
    assert!(ctx.authenticate(7, &axis(2)).unwrap().similarity > 0.999);
}

#[test]
fn test_degraded_enrollment_is_reported_not_rejected() {
    let ctx = context(ModelState::default());
    let report = ctx
        .enroll(3, &Matrix::from_rows(vec![axis(4)]).unwrap())
        .unwrap();

    assert!(report.degraded);
    assert_eq!(ctx.snapshot().prototypes.get(3).unwrap().rows(), 2);
}

#[test]
fn test_failed_enrollment_leaves_state_unchanged() {
    let ctx = context(ModelState::new(store_with_user(1)));
    let before = ctx.snapshot();

    let narrow = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0]]).unwrap();
    assert!(ctx.enroll(2, &narrow).is_err());
    assert!(Arc::ptr_eq(&before, &ctx.snapshot()));
}

#[test]
fn test_snapshots_survive_swaps() {
    let ctx = context(ModelState::new(store_with_user(1)));
    let old = ctx.snapshot();

    ctx.replace_calibrator(Some(Calibrator::parametric(1.0, 0.0)))
        .unwrap();
    assert!(old.calibrator.is_none());
    assert!(ctx.snapshot().calibrator.is_some());

    ctx.replace_spoof_detector(Some(detector(2.0))).unwrap();
    let status = ctx.status();
    assert!(status.spoof_detector_loaded);
    assert_eq!(status.spoof_threshold, Some(2.0));

    ctx.replace_calibrator(None).unwrap();
    assert!(ctx.status().calibrator.is_none());
}

#[test]
fn test_concurrent_enrollments_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prototypes.nkaf");
    let ctx = context(ModelState::default()).with_paths(ArtifactPaths {
        prototypes: Some(path.clone()),
        ..ArtifactPaths::default()
    });

    std::thread::scope(|s| {
        for user_id in 0..8u64 {
            let ctx = &ctx;
            s.spawn(move || {
                let rows = vec![axis(user_id as usize), axis(user_id as usize + 1)];
                ctx.enroll(user_id, &Matrix::from_rows(rows).unwrap())
                    .unwrap();
            });
        }
    });

    assert_eq!(ctx.status().users, 8);
    assert_eq!(PrototypeStore::load(&path).unwrap().len(), 8);
}

#[test]
fn test_reload_from_disk() {
    let ctx = context(ModelState::default());
    assert!(matches!(
        ctx.reload_from_disk(),
        Err(AuthError::NoArtifactPaths)
    ));

    let dir = TempDir::new().unwrap();
    let paths = ArtifactPaths {
        prototypes: Some(dir.path().join("p.nkaf")),
        calibrator: Some(dir.path().join("c.nkaf")),
        spoof_detector: Some(dir.path().join("s.nkaf")),
    };
    store_with_user(5)
        .save(paths.prototypes.as_deref().unwrap())
        .unwrap();
    Calibrator::parametric(20.0, -10.0)
        .save(paths.calibrator.as_deref().unwrap())
        .unwrap();

    let ctx = ctx.with_paths(paths);
    ctx.reload_from_disk().unwrap();
    let status = ctx.status();
    assert_eq!(status.users, 1);
    assert!(status.calibrator.is_some());
    assert!(!status.spoof_detector_loaded);
}

#[test]
fn test_corrupt_artifact_fails_reload_and_keeps_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("c.nkaf");
    std::fs::write(&path, b"not an artifact at all, just bytes").unwrap();

    let ctx = context(ModelState::new(store_with_user(1))).with_paths(ArtifactPaths {
        calibrator: Some(path),
        ..ArtifactPaths::default()
    });
    let before = ctx.snapshot();

    let err = ctx.reload_from_disk().unwrap_err();
    assert!(err.is_corruption(), "{}", err);
    assert!(Arc::ptr_eq(&before, &ctx.snapshot()));
}

#[test]
fn test_trials_flow_through_encoder() {
    let encoder = StubEncoder::new(DIM);
    let ctx = context(ModelState::default());
    let trials: Vec<Trial> = (0..3)
        .map(|i| Trial::new(2, 4, (0..8).map(|j| (i * 8 + j) as f32).collect()).unwrap())
        .collect();

    let report = ctx.enroll_trials(11, &trials, &encoder).unwrap();
    assert_eq!(report.num_trials, 3);

    let event = ctx.authenticate_trial(11, &trials[0], &encoder).unwrap();
    assert!(event.similarity > 0.0);
    assert_eq!(event.user_id, 11);
}

#[test]
fn test_encoder_width_must_match_enrolled_store() {
    let ctx = context(ModelState::new(store_with_user(1)));
    let trial = Trial::new(1, 4, vec![0.5, 1.0, 1.5, 2.0]).unwrap();

    let err = ctx
        .authenticate_trial(1, &trial, &StubEncoder::new(DIM * 2))
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Dimension(DimValidationError::DimensionMismatch {
            expected: DIM,
            actual,
        }) if actual == DIM * 2
    ));
}

#[test]
fn test_pinned_dims_reject_mismatched_state_and_enrollment() {
    let err = context(ModelState::new(store_with_user(1)))
        .with_dims(DimConfig::new(DIM * 2))
        .unwrap_err();
    assert!(matches!(err, AuthError::Dimension(_)));

    let ctx = context(ModelState::default())
        .with_dims(DimConfig::new(DIM))
        .unwrap();
    let narrow = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0, 0.0]]).unwrap();
    assert!(matches!(
        ctx.enroll(3, &narrow),
        Err(AuthError::Dimension(_))
    ));
    assert_eq!(ctx.status().users, 0);
}

#[test]
fn test_from_config_rejects_artifacts_of_another_width() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        embedding_dim: 128,
        artifact_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let mut store = PrototypeStore::new();
    store
        .insert(1, Matrix::from_rows(vec![vec![1.0, 0.0, 0.0, 0.0]]).unwrap())
        .unwrap();
    store.save(&config.prototypes_artifact()).unwrap();

    let err = AuthContext::from_config(&config, Device::Cpu).unwrap_err();
    assert!(matches!(
        err,
        AuthError::Dimension(DimValidationError::DimensionMismatch {
            expected: 128,
            actual: 4,
        })
    ));

    let matching = Config {
        embedding_dim: 4,
        ..config
    };
    assert!(AuthContext::from_config(&matching, Device::Cpu).is_ok());
}

#[test]
fn test_event_serializes_for_audit() {
    let ctx = context(ModelState::new(store_with_user(1)));
    let event = ctx.authenticate(1, &axis(0)).unwrap();
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["user_id"], 1);
    assert_eq!(json["tier"], "LOW");
    assert!(json["id"].is_string());
    assert!(json["timestamp"].is_string());
    assert_eq!(json["reduced_mode"]["calibrator_missing"], true);
}
