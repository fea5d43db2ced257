//! End-to-end tests for the `dpdp` binary.

mod common;

use common::TestContext;
use predicates::prelude::*;

#[test]
fn test_create_and_show() {
    let ctx = TestContext::new();

    let created = ctx.json(&["create", "client-1"]);
    assert_eq!(created["client_id"], "client-1");
    assert_eq!(created["compliance_score"], 70);
    assert_eq!(created["consent_status"]["consent_given"], false);

    ctx.command()
        .args(["show", "client-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compliance score:"))
        .stdout(predicate::str::contains("70/100"));
}

#[test]
fn test_duplicate_create_is_a_conflict() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command()
        .args(["create", "client-1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_missing_client_is_not_found() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["report", "ghost"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("dpdp create ghost"));
}

#[test]
fn test_consent_raises_score_and_clears_issues() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();

    let record = ctx.json(&["consent", "client-1", "--consent-version", "2.1"]);
    assert_eq!(record["compliance_score"], 100);
    assert_eq!(record["consent_status"]["consent_version"], "2.1");

    let report = ctx.json(&["report", "client-1"]);
    assert_eq!(report["audit_summary"]["total_events"], 2);
    assert_eq!(report["audit_summary"]["compliance_issues"], serde_json::json!([]));
}

#[test]
fn test_refused_consent() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    let record = ctx.json(&["consent", "client-1", "--refuse"]);
    assert_eq!(record["consent_status"]["consent_given"], false);
    assert_eq!(record["compliance_score"], 70);
}

#[test]
fn test_erasure_blocked_by_default_purposes() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();

    let outcome = ctx.json(&["exercise", "client-1", "erasure"]);
    assert_eq!(outcome["request"]["status"], "rejected");
    let reason = outcome["request"]["reason"].as_str().unwrap();
    assert!(reason.starts_with("Erasure blocked by processing purposes"));
}

#[test]
fn test_correction_is_fulfilled_once_logged() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();

    let outcome = ctx.json(&[
        "exercise",
        "client-1",
        "correction",
        "--details",
        r#"{"email":"new@example.com"}"#,
    ]);
    assert_eq!(outcome["request"]["status"], "fulfilled");
    let request_id = outcome["request"]["request_id"].as_str().unwrap().to_string();

    let trail = ctx.json(&["audit", "client-1", "--limit", "1"]);
    assert_eq!(trail["entries"][0]["action"], "CORRECTION_REQUEST_PROCESSED");
    assert_eq!(trail["entries"][0]["details"]["corrections"]["email"], "new@example.com");

    ctx.command()
        .args(["resolve", "client-1", &request_id, "--fulfill"])
        .assert()
        .code(4);
}

#[test]
fn test_reviewed_correction_stays_pending_until_resolved() {
    let ctx = TestContext::new()
        .with_config("engine:\n  rights:\n    manual_correction_review: true\n");
    ctx.command().args(["create", "client-1"]).assert().success();

    let outcome = ctx.json(&[
        "exercise",
        "client-1",
        "correction",
        "--details",
        r#"{"corrections":{"email":"new@example.com"}}"#,
    ]);
    assert_eq!(outcome["request"]["status"], "pending");
    let request_id = outcome["request"]["request_id"].as_str().unwrap().to_string();

    let resolved = ctx.json(&["resolve", "client-1", &request_id, "--fulfill"]);
    assert_eq!(resolved["request"]["status"], "fulfilled");
    assert!(resolved["request"]["fulfillment_date"].is_string());

    ctx.command()
        .args(["resolve", "client-1", &request_id, "--reject", "too late"])
        .assert()
        .code(4);
}

#[test]
fn test_resolve_needs_an_outcome() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["resolve", "client-1", "dsr_00000000-0000-0000-0000-000000000000"])
        .assert()
        .code(6);
}

#[test]
fn test_unknown_right_is_invalid_input() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["exercise", "client-1", "forget-me"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("withdraw_consent"));
}

#[test]
fn test_withdraw_consent() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command().args(["consent", "client-1"]).assert().success();

    let outcome = ctx.json(&["exercise", "client-1", "withdraw-consent"]);
    assert_eq!(outcome["request"]["status"], "fulfilled");

    let record = ctx.json(&["show", "client-1"]);
    assert_eq!(record["consent_status"]["consent_given"], false);
    assert!(record["consent_status"]["withdrawal_date"].is_string());
}

#[test]
fn test_empty_fleet() {
    let ctx = TestContext::new();
    let report = ctx.json(&["fleet"]);
    assert_eq!(report["total_clients"], 0);
    assert_eq!(report["compliance_rate"], 0.0);
}

#[test]
fn test_fleet_counts_issues() {
    let ctx = TestContext::new();
    for client in ["a", "b", "c"] {
        ctx.command().args(["create", client]).assert().success();
    }
    ctx.command().args(["consent", "a"]).assert().success();

    let report = ctx.json(&["fleet"]);
    assert_eq!(report["total_clients"], 3);
    assert_eq!(report["compliant_clients"], 1);
    assert_eq!(report["common_issues"][0]["issue"], "Missing Consent");
    assert_eq!(report["common_issues"][0]["count"], 2);
}

#[test]
fn test_audit_trail_order_and_limit() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command().args(["consent", "client-1"]).assert().success();
    ctx.command().args(["create", "client-2"]).assert().success();

    let trail = ctx.json(&["audit", "client-1", "--oldest-first"]);
    assert_eq!(trail["total"], 2);
    assert_eq!(trail["entries"][0]["action"], "COMPLIANCE_RECORD_CREATED");
    assert_eq!(trail["entries"][1]["action"], "CONSENT_UPDATED");

    let log = ctx.json(&["log", "--limit", "1"]);
    assert_eq!(log["total"], 3);
    assert_eq!(log["entries"].as_array().unwrap().len(), 1);
    assert_eq!(log["entries"][0]["client_id"], "client-2");
}

#[test]
fn test_external_event() {
    let ctx = TestContext::new();
    let entry = ctx.json(&[
        "event",
        "client-1",
        "SESSION_RECORDING_CONSENT_GIVEN",
        "--actor",
        "Client",
        "--details",
        r#"{"data_category":"Health Information"}"#,
        "--impact",
        "medium",
    ]);
    assert_eq!(entry["action"], "SESSION_RECORDING_CONSENT_GIVEN");
    assert_eq!(entry["user_id"], "Client");
    assert_eq!(entry["data_category"], "Health Information");
    assert_eq!(entry["compliance_impact"], "medium");
}

#[test]
fn test_event_details_must_be_object() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["event", "client-1", "NOTE", "--details", "[1]"])
        .assert()
        .code(6);
}

#[test]
fn test_renewal_sweep() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command().args(["consent", "client-1"]).assert().success();

    let none = ctx.json(&["renewals"]);
    assert_eq!(none["flagged_clients"], serde_json::json!([]));

    let flagged = ctx.json(&["renewals", "--as-of", "2999-01-01"]);
    assert_eq!(flagged["flagged_clients"], serde_json::json!(["client-1"]));

    let again = ctx.json(&["renewals", "--as-of", "2999-01-01"]);
    assert_eq!(again["flagged_clients"], serde_json::json!([]));
}

#[test]
fn test_portable_export_to_file() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    let target = ctx.path().join("export.json");

    ctx.command()
        .args(["export", "client-1", "--portable", "--output"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported"));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(document["format"], "json");
    assert_eq!(document["schema_version"], "1.0");
    assert_eq!(document["subject_id"], "client-1");
}

#[test]
fn test_access_export_to_stdout() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    let export = ctx.json(&["export", "client-1"]);
    assert_eq!(export["personal_data"].as_array().unwrap().len(), 5);
    assert!(export["consent_history"]["current"].is_object());
}

#[test]
fn test_verify_intact_chain() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command().args(["consent", "client-1"]).assert().success();

    ctx.command()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("audit chain intact (2 entries)"));
}

#[test]
fn test_state_persists_between_runs() {
    let ctx = TestContext::new();
    ctx.command().args(["create", "client-1"]).assert().success();
    ctx.command().args(["exercise", "client-1", "access"]).assert().success();

    let record = ctx.json(&["show", "client-1"]);
    let rights = record["data_subject_rights"]["exercised_rights"].as_array().unwrap();
    assert_eq!(rights.len(), 1);
    assert_eq!(rights[0]["status"], "fulfilled");
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let ctx = TestContext::new().with_config("engine:\n  compliance_threshold: 150\n");
    ctx.command()
        .arg("fleet")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_config_threshold_is_applied() {
    let ctx = TestContext::new().with_config("engine:\n  compliance_threshold: 60\n");
    ctx.command().args(["create", "client-1"]).assert().success();
    let report = ctx.json(&["fleet"]);
    assert_eq!(report["compliant_clients"], 1);
}

#[test]
fn test_missing_explicit_config() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["--config", "nope.yaml", "fleet"])
        .assert()
        .code(2);
}

#[test]
fn test_malformed_dotenv_is_a_config_error() {
    let ctx = TestContext::new();
    std::fs::write(ctx.path().join(".env"), "NOT A VALID LINE\n").unwrap();
    ctx.command()
        .arg("fleet")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("environment error"));
}

#[test]
fn test_out_of_range_period_is_rejected_by_config() {
    let ctx = TestContext::new()
        .with_config("engine:\n  retention:\n    review_interval_days: 9999999999\n");
    ctx.command()
        .args(["create", "client-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("review_interval_days"));
}
