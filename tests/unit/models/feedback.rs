//! Unit tests for lenient feedback parsing

use chrono::{DateTime, Utc};
use reachplan::models::{normalize_key, FeedbackRecord, RatingDimension};
use serde_json::json;

fn parse(value: serde_json::Value) -> FeedbackRecord {
    serde_json::from_value(value).expect("feedback parses")
}

#[test]
fn full_record_parses() {
    let record = parse(json!({
        "id": "fb-1",
        "timestamp": "2026-03-01T10:00:00Z",
        "plan_id": "plan-9",
        "plan_data": {
            "audiences": [{ "persona": "Comedy Lover" }, { "name": "Gamer" }],
            "lineItems": [{ "platform": "Meta", "budget": "1,500" }],
            "formats": [{ "name": "Masthead" }, { "Ad format": "MREC" }],
            "vertical_key": "Automotive"
        },
        "overall_rating": 4,
        "dimensional_feedback": { "audience_rating": 5, "wrong_audience": true },
        "edits": { "audiences_added": ["Foodie"], "audiences_removed": [] },
        "approved": true
    }));

    assert_eq!(record.id, "fb-1");
    assert_eq!(record.plan_id, "plan-9");
    assert_eq!(record.overall_rating, Some(4.0));
    assert!(record.approved);
    assert_eq!(record.plan_data.audiences.len(), 2);
    assert_eq!(record.plan_data.audiences[1].key().as_deref(), Some("gamer"));
    assert_eq!(record.plan_data.line_items[0].budget, Some(1500.0));
    assert_eq!(record.plan_data.formats[1].key().as_deref(), Some("mrec"));
    assert_eq!(record.vertical_key().as_deref(), Some("automotive"));
    assert_eq!(record.dimensional_feedback.flagged_issues(), vec!["wrong_audience"]);
    assert_eq!(record.rating_for(RatingDimension::Audience, 3.0), 5.0);
    assert_eq!(record.rating_for(RatingDimension::Budget, 3.0), 4.0);
}

#[test]
fn out_of_range_rating_is_absent() {
    let record = parse(json!({
        "plan_id": "p",
        "overall_rating": 7,
        "dimensional_feedback": { "platform_rating": "not a number" }
    }));

    assert_eq!(record.overall_rating, None);
    assert_eq!(record.dimensional_feedback.platform_rating, None);
    assert_eq!(record.rating_for(RatingDimension::Platform, 3.0), 3.0);
}

#[test]
fn approval_accepts_strings_and_numbers() {
    assert!(parse(json!({ "plan_id": "p", "approved": "true" })).approved);
    assert!(parse(json!({ "plan_id": "p", "approved": 1 })).approved);
    assert!(!parse(json!({ "plan_id": "p", "approved": "nope" })).approved);
    assert!(!parse(json!({ "plan_id": "p" })).approved);
}

#[test]
fn malformed_elements_are_dropped() {
    let record = parse(json!({
        "plan_id": "p",
        "plan_data": {
            "audiences": [42, "loose", { "persona": "Kept" }],
            "lineItems": "not a list",
            "formats": null
        },
        "edits": "garbage"
    }));

    assert_eq!(record.plan_data.audiences.len(), 1);
    assert_eq!(record.plan_data.audiences[0].key().as_deref(), Some("kept"));
    assert!(record.plan_data.line_items.is_empty());
    assert!(record.plan_data.formats.is_empty());
    assert!(record.edits.audiences_added.is_empty());
}

#[test]
fn edit_lists_accept_objects() {
    let record = parse(json!({
        "plan_id": "p",
        "edits": {
            "audiences_added": [{ "persona": "A" }, { "name": "B" }, "C", {}],
            "audiences_removed": [{ "persona": "D" }]
        }
    }));

    assert_eq!(record.edits.audiences_added, vec!["A", "B", "C"]);
    assert_eq!(record.edits.audiences_removed, vec!["D"]);
}

#[test]
fn bad_timestamp_falls_back_to_epoch() {
    let record = parse(json!({ "plan_id": "p", "timestamp": "yesterday" }));
    assert_eq!(record.timestamp, DateTime::<Utc>::default());
}

#[test]
fn normalize_key_collapses_whitespace() {
    assert_eq!(normalize_key("  Comedy \t Lover  "), "comedy lover");
    assert_eq!(normalize_key("   "), "");
}
