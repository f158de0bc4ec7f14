use super::*;

fn policy() -> DecisionPolicy {
    DecisionPolicy::default()
}

fn input(similarity: f32, probability: f32, spoof_flag: bool) -> DecisionInput {
    DecisionInput {
        similarity,
        probability,
        spoof_flag,
        spoof_score: None,
    }
}

#[test]
fn test_spoof_vetoes_certain_match() {
    let d = policy().decide(&DecisionInput {
        spoof_score: Some(0.0123456),
        ..input(1.0, 1.0, true)
    });

    assert!(!d.authenticated);
    assert_eq!(d.tier, ConfidenceTier::High);
    assert_eq!(d.outcome, DecisionOutcome::Spoofed);
    assert!(d.reason.contains("Spoof"));
    assert!(d.reason.contains("spoof_score=0.012346"));
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let d = decide(0.6, 0.5, false, 0.5);
    assert!(d.authenticated);
    assert_eq!(d.outcome, DecisionOutcome::WeakMatch);

    let d = decide(0.6, 0.4999, false, 0.5);
    assert!(!d.authenticated);
}

#[test]
fn test_tiers_are_symmetric() {
    let p = policy();
    assert_eq!(p.tier(0.95, false), ConfidenceTier::High);
    assert_eq!(p.tier(0.05, false), ConfidenceTier::High);
    assert_eq!(p.tier(0.7, false), ConfidenceTier::Medium);
    assert_eq!(p.tier(0.3, false), ConfidenceTier::Medium);
    assert_eq!(p.tier(0.5, false), ConfidenceTier::Low);
    assert_eq!(p.tier(0.55, false), ConfidenceTier::Low);
    assert_eq!(p.tier(0.5, true), ConfidenceTier::High);
    // Boundaries are exclusive.
    assert_eq!(p.tier(0.8, false), ConfidenceTier::Medium);
    assert_eq!(p.tier(0.6, false), ConfidenceTier::Low);
    assert_eq!(p.tier(0.2, false), ConfidenceTier::Medium);
    assert_eq!(p.tier(0.4, false), ConfidenceTier::Low);
}

#[test]
fn test_low_side_tier_boundaries_are_exact() {
    let p = policy();
    let below_high = f32::from_bits(0.2f32.to_bits() - 1);
    let below_medium = f32::from_bits(0.4f32.to_bits() - 1);

    assert_eq!(p.tier(below_high, false), ConfidenceTier::High);
    assert_eq!(p.tier(below_medium, false), ConfidenceTier::Medium);
    assert_eq!(decide(0.1, below_high, false, 0.5).tier, ConfidenceTier::High);

    let wide = DecisionPolicy::new(DecisionConfig {
        tier_high: 0.9,
        tier_medium: 0.7,
        ..DecisionConfig::default()
    })
    .unwrap();
    assert_eq!(wide.tier(0.1, false), ConfidenceTier::Medium);
    assert_eq!(wide.tier(f32::from_bits(0.1f32.to_bits() - 1), false), ConfidenceTier::High);
    assert_eq!(wide.tier(0.3, false), ConfidenceTier::Low);
    assert_eq!(wide.tier(f32::from_bits(0.3f32.to_bits() - 1), false), ConfidenceTier::Medium);
}

#[test]
fn test_authenticated_buckets() {
    let cases = [
        (0.95, DecisionOutcome::ExcellentMatch, "Excellent match"),
        (0.8, DecisionOutcome::GoodMatch, "Good match"),
        (0.6, DecisionOutcome::AcceptableMatch, "Acceptable match"),
        (0.5, DecisionOutcome::WeakMatch, "re-enrollment"),
    ];
    for (prob, outcome, text) in cases {
        let d = policy().decide(&input(0.77, prob, false));
        assert!(d.authenticated, "{}", prob);
        assert_eq!(d.outcome, outcome);
        assert!(d.reason.contains(text), "{}", d.reason);
        assert!(d.reason.starts_with("AUTHENTICATED"));
    }
}

#[test]
fn test_rejected_buckets() {
    let cases = [
        (0.05, DecisionOutcome::VeryPoorMatch, "likely impostor"),
        (0.2, DecisionOutcome::PoorMatch, "possible impostor"),
        (0.4, DecisionOutcome::BelowThreshold, "Below threshold"),
    ];
    for (prob, outcome, text) in cases {
        let d = policy().decide(&input(0.1, prob, false));
        assert!(!d.authenticated);
        assert_eq!(d.outcome, outcome);
        assert!(d.reason.contains(text), "{}", d.reason);
    }

    let strict = DecisionPolicy::new(DecisionConfig {
        auth_threshold: 0.7,
        ..DecisionConfig::default()
    })
    .unwrap();
    let d = strict.decide(&input(0.5, 0.65, false));
    assert!(!d.authenticated);
    assert_eq!(d.outcome, DecisionOutcome::UncertainIdentity);
}

#[test]
fn test_reason_quotes_scores_to_three_decimals() {
    let d = policy().decide(&input(0.123456, 0.987654, false));
    assert!(d.reason.contains("prob=0.988"));
    assert!(d.reason.contains("sim=0.123"));
}

#[test]
fn test_decision_is_deterministic() {
    let a = policy().decide(&input(0.4, 0.33, false));
    let b = policy().decide(&input(0.4, 0.33, false));
    assert_eq!(a, b);
}

#[test]
fn test_config_validation() {
    assert!(DecisionConfig::default().validate().is_ok());
    assert!(
        DecisionConfig {
            auth_threshold: 1.5,
            ..DecisionConfig::default()
        }
        .validate()
        .is_err()
    );
    assert!(
        DecisionConfig {
            tier_high: 0.6,
            tier_medium: 0.8,
            ..DecisionConfig::default()
        }
        .validate()
        .is_err()
    );
}

#[test]
fn test_impostor_profiles() {
    let replay = ImpostorProfile::analyze(0.9, 0.99, true);
    assert_eq!(replay.kind, ImpostorKind::ReplayAttack);
    assert_eq!(replay.detection_confidence, 0.95);
    assert_eq!(replay.anomalies, vec!["Synthetic signal detected".to_string()]);

    let random = ImpostorProfile::analyze(0.1, 0.01, false);
    assert_eq!(random.kind, ImpostorKind::Random);
    assert!(random.anomalies.iter().any(|a| a.contains("neural patterns")));

    assert_eq!(
        ImpostorProfile::analyze(0.5, 0.1, false).kind,
        ImpostorKind::Targeted
    );
    let sophisticated = ImpostorProfile::analyze(0.6, 0.45, false);
    assert_eq!(sophisticated.kind, ImpostorKind::Sophisticated);
    assert_eq!(sophisticated.detection_confidence, 0.65);
    assert!(sophisticated.anomalies.is_empty());
    assert!(
        sophisticated
            .analysis
            .contains("Similarity: 0.600, Probability: 0.450")
    );
}

#[test]
fn test_tier_serializes_uppercase() {
    assert_eq!(
        serde_json::to_string(&ConfidenceTier::Medium).unwrap(),
        "\"MEDIUM\""
    );
    assert_eq!(ImpostorKind::ReplayAttack.to_string(), "REPLAY_ATTACK");
}
