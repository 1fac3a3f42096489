use memora_audit::events::ANONYMOUS;
use memora_audit::{Action, AuditEvent, ResourceType};
use serde_json::json;

#[test]
fn serializes_with_snake_case_tags() {
    let event = AuditEvent::new(Action::EditItem, ResourceType::TestResult, "r-1", "sub-1")
        .with_details(json!({ "item": "a/1" }));

    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "action": "edit_item",
            "resource_type": "test_result",
            "resource_id": "r-1",
            "user_sub": "sub-1",
            "details": { "item": "a/1" },
        })
    );
}

#[test]
fn details_are_omitted_when_absent() {
    let event = AuditEvent::new(Action::Upload, ResourceType::Audio, "audios/x.m4a", ANONYMOUS);
    let value = serde_json::to_value(&event).unwrap();
    assert!(value.get("details").is_none());
    assert_eq!(value["user_sub"], "anonymous");
    assert_eq!(event.action.to_string(), "upload");
    assert_eq!(event.resource_type.to_string(), "audio");
}

#[test]
fn emitting_without_a_subscriber_is_harmless() {
    AuditEvent::new(Action::Approve, ResourceType::TestResult, "r-1", "sub-1").emit();
}
