//! Production code must never block a runtime thread on a timer.
//!
//! Timeouts go through `tokio::time::timeout`, deadlines through
//! `tokio::time::timeout_at`. Test helpers may sleep.

use architectural_enforcement::find_violations;

#[test]
fn no_sleep_in_production_code() {
    let violations = find_violations(&["thread::sleep", "time::sleep("]);
    assert!(
        violations.is_empty(),
        "sleep() in production code:\n{}",
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
}
