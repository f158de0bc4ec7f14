//! End-to-end authentication scenarios.

mod common;

use common::fixtures::{DIM, axis, centre, random_units, samples};
use neurokey::auth::{AuthContext, ModelState};
use neurokey::calibration::Calibrator;
use neurokey::decision::{ConfidenceTier, DecisionOutcome, DecisionPolicy, decide};
use neurokey::embedding::Matrix;
use neurokey::evaluation::equal_error_rate;
use neurokey::prototypes::{PrototypeConfig, PrototypeMethod, PrototypeStore};
use neurokey::scoring::{Aggregation, ScoringError, SimilarityScorer, score, score_vs_prototypes};
use neurokey::spoof::{AutoencoderConfig, SpoofDetector, TrainingConfig};

const USERS: usize = 5;

fn enrolled_store() -> PrototypeStore {
    let mut store = PrototypeStore::new();
    let config = PrototypeConfig::default();
    for user in 0..USERS {
        store
            .add_or_update(user as u64, &samples(user, 20, 1), &config)
            .unwrap();
    }
    store
}

/// Genuine scores (own prototypes) and impostor scores (every other user's).
fn score_sets(store: &PrototypeStore, seed: u64) -> (Vec<f32>, Vec<f32>) {
    let mut genuine = Vec::new();
    let mut impostor = Vec::new();
    for probe_user in 0..USERS {
        let probes = samples(probe_user, 10, seed);
        for claimed in 0..USERS {
            let prototypes = store.get(claimed as u64).unwrap();
            for probe in probes.iter_rows() {
                let s = score(probe, prototypes, Aggregation::Max).unwrap();
                if claimed == probe_user {
                    genuine.push(s);
                } else {
                    impostor.push(s);
                }
            }
        }
    }
    (genuine, impostor)
}

#[test]
fn identical_probe_is_accepted_with_high_confidence() {
    let store = enrolled_store();
    let prototypes = store.get(2).unwrap();
    let probe = prototypes.row(0).to_vec();

    let raw = score(&probe, prototypes, Aggregation::Max).unwrap();
    assert!((raw - 1.0).abs() < 1e-5);

    let calibrator = Calibrator::parametric(20.0, -10.0);
    let probability = calibrator.apply_one(raw).unwrap();
    assert!(probability > 0.99);

    let decision = decide(raw, probability, false, 0.5);
    assert!(decision.authenticated);
    assert_eq!(decision.tier, ConfidenceTier::High);
}

#[test]
fn orthogonal_probe_is_rejected_as_impostor() {
    let prototypes = Matrix::from_rows(vec![axis(0), axis(1)]).unwrap();
    let raw = score(&axis(7), &prototypes, Aggregation::Max).unwrap();
    assert!(raw.abs() < 1e-6);

    let probability = Calibrator::parametric(20.0, -10.0).apply_one(raw).unwrap();
    let decision = decide(raw, probability, false, 0.5);

    assert!(!decision.authenticated);
    assert!(decision.reason.contains("poor match") || decision.reason.contains("impostor"));
}

#[test]
fn spoof_flag_overrides_high_probability() {
    let decision = decide(0.97, 0.95, true, 0.5);

    assert!(!decision.authenticated);
    assert_eq!(decision.tier, ConfidenceTier::High);
    assert_eq!(decision.outcome, DecisionOutcome::Spoofed);
    assert!(decision.reason.to_lowercase().contains("spoof"));
}

#[test]
fn single_enrollment_embedding_yields_k_identical_rows() {
    let mut store = PrototypeStore::new();
    let single = Matrix::from_rows(vec![centre(1)]).unwrap();

    for method in [
        PrototypeMethod::KMeans,
        PrototypeMethod::Mean,
        PrototypeMethod::Median,
    ] {
        let report = store
            .add_or_update(9, &single, &PrototypeConfig::new(2, method))
            .unwrap();
        assert!(report.degraded);

        let prototypes = store.get(9).unwrap();
        assert_eq!(prototypes.rows(), 2);
        for (a, b) in prototypes.row(0).iter().zip(prototypes.row(1)) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[test]
fn unknown_aggregation_is_rejected() {
    let prototypes = Matrix::from_rows(vec![axis(0)]).unwrap();
    let result = score_vs_prototypes(&axis(0), &prototypes, "median");

    assert!(matches!(result, Err(ScoringError::InvalidInput { .. })));
}

#[test]
fn aggregation_ordering_holds_on_enrolled_users() {
    let store = enrolled_store();
    for probe in random_units(20, 3).iter_rows() {
        let prototypes = store.get(0).unwrap();
        let max = score(probe, prototypes, Aggregation::Max).unwrap();
        let mean = score(probe, prototypes, Aggregation::Mean).unwrap();
        let min = score(probe, prototypes, Aggregation::Min).unwrap();
        assert!(max >= mean && mean >= min, "{} {} {}", max, mean, min);
    }
}

#[test]
fn full_pipeline_separates_genuine_from_impostor() {
    let store = enrolled_store();

    let (genuine, impostor) = score_sets(&store, 10);
    let eer = equal_error_rate(&genuine, &impostor).unwrap();
    assert!(eer.eer < 0.01, "EER {}", eer.eer);

    let scores: Vec<f32> = genuine.iter().chain(&impostor).copied().collect();
    let labels: Vec<bool> = std::iter::repeat_n(true, genuine.len())
        .chain(std::iter::repeat_n(false, impostor.len()))
        .collect();
    let calibrator = Calibrator::fit_parametric(&scores, &labels).unwrap();

    let mut enrollment = samples(0, 40, 20);
    for user in 1..USERS {
        enrollment.append(&samples(user, 40, 20)).unwrap();
    }
    let training = TrainingConfig {
        epochs: 40,
        batch_size: 32,
        learning_rate: 1e-2,
        ..TrainingConfig::default()
    };
    let (detector, _) = SpoofDetector::fit(
        &enrollment,
        AutoencoderConfig::new(DIM, 16, 8),
        &training,
        &candle_core::Device::Cpu,
    )
    .unwrap();

    let context = AuthContext::new(
        ModelState::new(store)
            .with_calibrator(calibrator)
            .with_spoof_detector(detector),
        SimilarityScorer::new(Aggregation::Max),
        DecisionPolicy::default(),
        PrototypeConfig::default(),
    )
    .unwrap();

    let probes = samples(3, 50, 30);
    let accepted = probes
        .iter_rows()
        .filter(|p| context.authenticate(3, p).unwrap().authenticated)
        .count();
    assert!(accepted >= 45, "only {} of 50 genuine probes accepted", accepted);

    for probe in probes.iter_rows() {
        let event = context.authenticate(4, probe).unwrap();
        assert!(!event.authenticated);
        assert!(event.impostor_profile.is_some());
        assert!(!event.reduced_mode.any());
    }
}
