//! Output Validation Tests
//!
//! Validates the JSON contract of CLI envelopes and record serialization:
//! - Success and error envelopes have exactly the documented fields
//! - Records use camelCase keys and stored enum strings
//! - Every error code is stable
//!
//! Uses `insta` inline snapshots to detect unintended output changes.

use getpet::api::Response;
use getpet::{
    Animal, Cage, Color, ErrorEnvelope, ErrorInfo, Gender, Metadata, ShelterError, Size, Species,
    SuccessEnvelope,
};

// ============================================================================
// Envelope Structure Tests
// ============================================================================

#[test]
fn test_success_envelope_structure() {
    let data = serde_json::to_value(Response::Deleted { deleted: true }).unwrap();
    let envelope = SuccessEnvelope::new("delete", data, Metadata::new(3));

    let json_value = serde_json::to_value(&envelope).expect("Should serialize");

    assert_eq!(json_value["ok"], true);
    assert_eq!(json_value["command"], "delete");
    assert_eq!(json_value["data"]["deleted"], true);
    assert_eq!(json_value["meta"]["execution_ms"], 3);

    let mut keys: Vec<&str> = json_value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["command", "data", "meta", "ok"]);
}

#[test]
fn test_error_envelope_structure() {
    let envelope = ErrorEnvelope::from_error("get", &ShelterError::connection_failed("disk gone"));
    let json_value = serde_json::to_value(&envelope).expect("Should serialize");

    assert_eq!(json_value["ok"], false);
    assert_eq!(json_value["command"], "get");
    assert_eq!(json_value["error"]["code"], "CONNECTION_FAILED");

    let mut keys: Vec<&str> = json_value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["command", "error", "ok"]);
}

#[test]
fn test_all_error_codes_are_stable() {
    let errors = [
        ShelterError::connection_failed("test"),
        ShelterError::persistence("test", rusqlite::Error::QueryReturnedNoRows),
        ShelterError::unknown_enum_value("size", "huge"),
        ShelterError::MissingField("name"),
        ShelterError::invalid_field("weight", "negative"),
        ShelterError::write_failed("test"),
        ShelterError::invalid_input("test"),
        ShelterError::config_error("test"),
        ShelterError::ServiceUnavailable,
    ];

    let codes: Vec<&str> = errors.iter().map(ShelterError::error_code).collect();
    assert_eq!(
        codes,
        vec![
            "CONNECTION_FAILED",
            "PERSISTENCE_ERROR",
            "UNKNOWN_ENUM_VALUE",
            "MISSING_FIELD",
            "INVALID_FIELD",
            "WRITE_FAILED",
            "INVALID_INPUT",
            "CONFIG_ERROR",
            "SERVICE_UNAVAILABLE",
        ]
    );
}

// ============================================================================
// Snapshot Tests (using insta)
// ============================================================================

#[test]
fn test_search_envelope_snapshot() {
    let animal = Animal::builder()
        .intake_number(1)
        .cage_number(2)
        .species(Species::Dog)
        .breed("Shiba Inu")
        .size(Size::Medium)
        .colors([Color::Gold])
        .gender(Gender::Male)
        .weight(23.5)
        .vaccinated(true)
        .spay_neuter(true)
        .name("Doge")
        .missing(false)
        .build()
        .unwrap();
    let envelope = SuccessEnvelope::new(
        "search",
        Response::Results {
            results: vec![animal],
        },
        Metadata::new(1).with_records(1),
    );

    insta::assert_snapshot!(serde_json::to_string(&envelope).unwrap(), @r#"{"ok":true,"command":"search","data":{"results":[{"intakeNumber":1,"cageNumber":2,"species":"dog","breed":"Shiba Inu","size":"medium","colors":["gold"],"gender":"m","weight":23.5,"vaccinated":true,"spayNeuter":true,"name":"Doge","missing":false}]},"meta":{"execution_ms":1,"records_returned":1}}"#);
}

#[test]
fn test_cages_envelope_snapshot() {
    let envelope = SuccessEnvelope::new(
        "cages",
        Response::Cages {
            cages: vec![Cage::new(0, 1, 0), Cage::new(2, 2, 2)],
        },
        Metadata::new(0).with_records(2),
    );

    insta::assert_snapshot!(serde_json::to_string(&envelope).unwrap(), @r#"{"ok":true,"command":"cages","data":{"cages":[{"cageNumber":0,"dogCount":1,"catCount":0},{"cageNumber":2,"dogCount":2,"catCount":2}]},"meta":{"execution_ms":0,"records_returned":2}}"#);
}

#[test]
fn test_error_envelope_snapshot() {
    let envelope =
        ErrorEnvelope::new("new", ErrorInfo::new("MISSING_FIELD", "Missing required field: breed"));

    insta::assert_snapshot!(serde_json::to_string(&envelope).unwrap(), @r#"{"ok":false,"command":"new","error":{"code":"MISSING_FIELD","message":"Missing required field: breed"}}"#);
}
