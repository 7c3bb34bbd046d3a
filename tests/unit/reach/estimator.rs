//! Unit tests for unique reach estimation

use reachplan::models::{
    DemographicFilter, Generation, GeographyFilter, IncomeGroup, Persona, PersonaCategory, Race,
};
use reachplan::reach::{PersonaTable, ReachEstimator, ReachRequest};
use std::collections::BTreeMap;

fn table() -> PersonaTable {
    PersonaTable::new(vec![
        Persona::new("Comedy Lover", PersonaCategory::Entertainment, 1_000_000),
        Persona::new("Horror Fan", PersonaCategory::Entertainment, 500_000),
        Persona::new("Football Fanatic", PersonaCategory::Sports, 500_000),
        Persona::new("Tech Enthusiast", PersonaCategory::Technology, 2_000_000).with_state_breakdown(
            BTreeMap::from([
                ("Selangor".to_string(), 1_200_000),
                ("Johor".to_string(), 800_000),
            ]),
        ),
    ])
}

fn request(personas: &[&str]) -> ReachRequest {
    ReachRequest {
        personas: personas.iter().map(|p| p.to_string()).collect(),
        ..ReachRequest::default()
    }
}

#[test]
fn same_category_pair_discounts_sixty_percent() {
    let estimate = ReachEstimator::default().estimate(&table(), &request(&["Comedy Lover", "Horror Fan"]));

    assert_eq!(estimate.total_raw, 1_500_000);
    assert_eq!(estimate.estimated_overlap, 900_000);
    assert_eq!(estimate.unique_reach, 600_000);
    assert_eq!(estimate.overlap_percent, 60);
    assert!(!estimate.is_mass_targeting);
}

#[test]
fn single_persona_reach_is_its_adjusted_size() {
    let estimate = ReachEstimator::default().estimate(&table(), &request(&["Comedy Lover"]));

    assert_eq!(estimate.total_raw, 1_000_000);
    assert_eq!(estimate.unique_reach, estimate.total_raw);
    assert_eq!(estimate.estimated_overlap, 0);
    assert_eq!(estimate.overlap_percent, 0);
}

#[test]
fn cross_category_pair_keeps_more_reach_than_same_category() {
    let estimator = ReachEstimator::default();
    let same = estimator.estimate(&table(), &request(&["Comedy Lover", "Horror Fan"]));
    let cross = estimator.estimate(&table(), &request(&["Comedy Lover", "Football Fanatic"]));

    assert_eq!(same.total_raw, cross.total_raw);
    assert!(same.unique_reach < cross.unique_reach);
    assert_eq!(cross.overlap_percent, 25);
}

#[test]
fn unique_reach_never_exceeds_total_raw() {
    let estimator = ReachEstimator::default();
    let selections: [&[&str]; 4] = [
        &[],
        &["Comedy Lover", "Horror Fan", "Football Fanatic"],
        &["Tech Enthusiast", "Comedy Lover"],
        &["Horror Fan", "Horror Fan"],
    ];
    for names in selections {
        let estimate = estimator.estimate(&table(), &request(names));
        assert!(estimate.unique_reach <= estimate.total_raw, "{:?}", names);
    }
}

#[test]
fn unresolved_names_contribute_nothing_and_are_reported() {
    let estimate =
        ReachEstimator::default().estimate(&table(), &request(&["Comedy Lover", "Knitting Club"]));

    assert_eq!(estimate.total_raw, 1_000_000);
    assert_eq!(estimate.personas.len(), 1);
    assert_eq!(estimate.unresolved, vec!["Knitting Club".to_string()]);
}

#[test]
fn fuzzy_names_resolve_case_insensitively() {
    let estimate = ReachEstimator::default().estimate(&table(), &request(&["horror"]));

    assert_eq!(estimate.personas.len(), 1);
    assert_eq!(estimate.personas[0].name, "Horror Fan");
    assert!(estimate.unresolved.is_empty());
}

#[test]
fn demographic_filter_multiplies_selected_shares() {
    let mut req = request(&["Comedy Lover"]);
    req.demographics = DemographicFilter {
        race: [Race::Malay, Race::Chinese].into_iter().collect(),
        generation: [Generation::GenZ].into_iter().collect(),
        ..DemographicFilter::default()
    };

    let estimate = ReachEstimator::default().estimate(&table(), &req);
    let expected = (0.697 + 0.228) * 0.254;

    assert!((estimate.demographic_multiplier - expected).abs() < 1e-9);
    assert_eq!(estimate.total_raw, (1_000_000.0 * expected).round() as u64);
}

#[test]
fn geography_filter_uses_state_share_of_sample_breakdown() {
    let mut req = request(&["Comedy Lover"]);
    req.geography = GeographyFilter::states(["Selangor"]);

    let estimate = ReachEstimator::default().estimate(&table(), &req);

    assert!((estimate.geography_multiplier - 0.6).abs() < 1e-9);
    assert_eq!(estimate.total_raw, 600_000);
}

#[test]
fn nationwide_geography_is_neutral() {
    let mut req = request(&["Comedy Lover"]);
    req.geography = GeographyFilter::states(["All States"]);

    let estimate = ReachEstimator::default().estimate(&table(), &req);
    assert_eq!(estimate.geography_multiplier, 1.0);
}

#[test]
fn mass_targeting_ignores_persona_selection() {
    let estimator = ReachEstimator::default();
    let mut with_personas = request(&["Comedy Lover", "Horror Fan"]);
    with_personas.mass_targeting = true;
    let mut without_personas = request(&[]);
    without_personas.mass_targeting = true;

    let a = estimator.estimate(&table(), &with_personas);
    let b = estimator.estimate(&table(), &without_personas);

    assert_eq!(a, b);
    assert!(a.is_mass_targeting);
    assert!(a.personas.is_empty());
    assert_eq!(a.total_raw, 86_375_180);
    assert_eq!(a.unique_reach, 16_150_000);
    assert_eq!(a.overlap_percent, 81);
}

#[test]
fn mass_targeting_scales_with_demographics() {
    let mut req = request(&[]);
    req.mass_targeting = true;
    req.demographics.race = [Race::Malay].into_iter().collect();

    let estimate = ReachEstimator::default().estimate(&table(), &req);
    assert_eq!(estimate.unique_reach, (16_150_000.0_f64 * 0.697).round() as u64);
}

#[test]
fn request_accepts_planner_field_names() {
    let req: ReachRequest = serde_json::from_value(serde_json::json!({
        "selectedPersonaNames": ["Comedy Lover"],
        "demographicFilters": { "race": ["Malay"] },
        "geographyFilter": { "selectedStates": ["Selangor"] },
        "massTargeting": false
    }))
    .unwrap();

    assert_eq!(req.personas, vec!["Comedy Lover".to_string()]);
    assert!(req.demographics.race.contains(&Race::Malay));
    assert!(req.geography.selected_states.contains("Selangor"));
}

#[test]
fn unknown_demographic_labels_are_accepted_with_zero_share() {
    let req: ReachRequest = serde_json::from_value(serde_json::json!({
        "selectedPersonaNames": ["Comedy Lover"],
        "demographicFilters": {
            "race": ["Malay", "Others"],
            "generation": ["Millennial"],
            "income": ["T20", "Top 1%"]
        }
    }))
    .unwrap();

    assert!(req.demographics.race.contains(&Race::Other));
    assert!(req.demographics.generation.contains(&Generation::Other));
    assert!(req.demographics.income.contains(&IncomeGroup::Other));

    let estimate = ReachEstimator::default().estimate(&table(), &req);
    // Unknown generation is the only generation bucket, so nothing survives it
    assert_eq!(estimate.demographic_multiplier, 0.0);
    assert_eq!(estimate.total_raw, 0);

    let mut known_only = req.clone();
    known_only.demographics.generation.clear();
    let estimate = ReachEstimator::default().estimate(&table(), &known_only);
    assert!((estimate.demographic_multiplier - 0.697 * 0.20).abs() < 1e-9);
}
