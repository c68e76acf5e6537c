use dtcl_core::{
    decide_after_slot, CartType, FailurePolicy, Outcome, PerformanceResult, RunSummary, SessionId, SlotClass,
    SlotDecision, SlotInfo, StepResult, DTCL_MISSING_HEADER, DTCL_NO_RESPONSE,
};

#[test]
fn test_slot_info_creation() {
    let slot = SlotInfo::new(3);
    assert_eq!(slot.slot_number, 3);
    assert_eq!(slot.detected_cart_type, CartType::Unknown);
    assert!(!slot.is_cart_detected);
    assert!(slot.report_file_path.is_none());
}

#[test]
fn test_slot_info_redetection() {
    let mut slot = SlotInfo::new(1);
    slot.cart_detected(CartType::Darin2);
    assert!(slot.is_cart_detected);
    assert_eq!(slot.detected_cart_type, CartType::Darin2);
    slot.cart_removed();
    assert!(!slot.is_cart_detected);
    assert_eq!(slot.detected_cart_type, CartType::Unknown);
}

#[test]
fn test_session_id_new() {
    assert_ne!(SessionId::new(), SessionId::new());
}

#[test]
fn test_uniform_performance_result() {
    let r = PerformanceResult::uniform(Outcome::Fail, "05-03-2024 14-22-01");
    assert_eq!(r.read, StepResult { outcome: "FAIL".into(), timestamp: "05-03-2024 14-22-01".into() });
    assert_eq!(r.loop_back, r.erase);
}

#[test]
fn test_no_response_is_failure_but_never_stops_last_slot() {
    let class = SlotClass::from_code(DTCL_NO_RESPONSE);
    assert_eq!(class, SlotClass::Failure);
    let v = decide_after_slot(4, class, DTCL_NO_RESPONSE, true, FailurePolicy::AbortSlots);
    assert_eq!(v.decision, SlotDecision::Continue);
}

#[test]
fn test_missing_header_message() {
    let v = decide_after_slot(2, SlotClass::from_code(DTCL_MISSING_HEADER), DTCL_MISSING_HEADER, true, FailurePolicy::Continue);
    assert_eq!(v.message, "Slot 2: cartridge header missing");
}

#[test]
fn test_summary_counts_add_up() {
    let mut s = RunSummary::default();
    for i in 0..10 {
        s.record(i % 3 != 0);
    }
    assert_eq!(s.success_count + s.failure_count, s.total);
    assert_eq!(s.total, 10);
}
