use bookrunner::{ApiResponse, ContractValidator, ValidationError};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn booking_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["firstname", "lastname", "totalprice", "bookingdates"],
        "properties": {
            "firstname": {"type": "string", "minLength": 1},
            "lastname": {"type": "string"},
            "totalprice": {"type": "integer", "minimum": 0},
            "depositpaid": {"type": "boolean"},
            "bookingdates": {
                "type": "object",
                "required": ["checkin", "checkout"],
                "properties": {
                    "checkin": {"type": "string"},
                    "checkout": {"type": "string"}
                }
            }
        }
    })
}

fn setup() -> (TempDir, ContractValidator) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("booking.schema.json"),
        serde_json::to_string_pretty(&booking_schema()).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("create_booking.contract.json"),
        json!({
            "bookingid": "type:integer",
            "booking": {
                "firstname": "required",
                "totalprice": "type:number",
                "bookingdates": {"checkin": "required"}
            }
        })
        .to_string(),
    )
    .unwrap();

    let validator = ContractValidator::new(dir.path());
    (dir, validator)
}

fn response(body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(200, body.to_string())
}

#[test]
fn test_valid_booking_matches_schema() {
    let (_dir, validator) = setup();
    let body = json!({
        "firstname": "Prasad",
        "lastname": "Valiv",
        "totalprice": 143,
        "depositpaid": true,
        "bookingdates": {"checkin": "2024-02-01", "checkout": "2024-02-05"}
    });

    validator.assert_schema(&response(body), "booking.schema.json").unwrap();
}

#[test]
fn test_schema_violations_are_collected() {
    let (_dir, validator) = setup();
    let body = json!({
        "firstname": "",
        "lastname": "Valiv",
        "totalprice": "143",
        "bookingdates": {"checkin": "2024-02-01"}
    });

    match validator.assert_schema(&response(body), "booking.schema.json") {
        Err(ValidationError::SchemaViolations(errors)) => {
            assert!(errors.contains(&"$.firstname: length 0 is shorter than minLength 1".to_string()));
            assert!(errors.contains(&"$.totalprice: expected type integer, got string".to_string()));
            assert!(errors.contains(&"$.bookingdates: required property 'checkout' is missing".to_string()));
            assert_eq!(errors.len(), 3);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_schemas_are_cached_per_path() {
    let (dir, validator) = setup();
    assert_eq!(validator.cached_schemas(), 0);

    let first = validator.load_schema("booking.schema.json").unwrap();
    let second = validator.load_schema(dir.path().join("booking.schema.json")).unwrap();

    assert_eq!(validator.cached_schemas(), 1);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_contract_violations_name_the_path() {
    let (_dir, validator) = setup();
    let body = json!({
        "bookingid": "1",
        "booking": {
            "totalprice": 143,
            "bookingdates": "2024-02-01"
        }
    });

    let err = validator
        .assert_contract(&response(body), "create_booking.contract.json")
        .unwrap_err();
    match err {
        ValidationError::ContractViolations(errors) => {
            assert!(errors.contains(&"Type mismatch for field bookingid. Expected: integer".to_string()));
            assert!(errors.contains(&"Required field missing: booking.firstname".to_string()));
            assert!(errors.contains(&"Missing or invalid object at path: booking.bookingdates".to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_contract_satisfied_by_created_booking() {
    let (_dir, validator) = setup();
    let body = json!({
        "bookingid": 7,
        "booking": {
            "firstname": "Prasad",
            "totalprice": 143.5,
            "bookingdates": {"checkin": "2024-02-01", "checkout": "2024-02-05"}
        }
    });

    validator
        .assert_contract(&response(body), "create_booking.contract.json")
        .unwrap();
}

#[test]
fn test_missing_files_and_bad_bodies() {
    let (dir, validator) = setup();

    assert!(!validator.schema_exists("missing.json"));
    assert!(validator.schema_exists("booking.schema.json"));
    assert!(matches!(
        validator.load_schema("missing.json"),
        Err(ValidationError::ResourceNotFound(_))
    ));

    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    assert!(matches!(
        validator.load_contract("broken.json"),
        Err(ValidationError::InvalidJson(_))
    ));

    let html = ApiResponse::new(200, "<html></html>");
    assert!(matches!(
        validator.assert_schema(&html, "booking.schema.json"),
        Err(ValidationError::InvalidJson(_))
    ));
}

#[test]
fn test_required_fields_on_response() {
    let body = json!({"bookingid": 1, "booking": {"firstname": "Prasad"}});
    ContractValidator::assert_required_fields(&response(body.clone()), &["bookingid", "booking.firstname"]).unwrap();

    match ContractValidator::assert_required_fields(&response(body), &["booking.lastname", "bookingid"]) {
        Err(ValidationError::MissingFields(missing)) => assert_eq!(missing, vec!["booking.lastname".to_string()]),
        other => panic!("unexpected result: {:?}", other),
    }
}
