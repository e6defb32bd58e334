//! Concurrency stays on the tokio runtime and errors are propagated.

use architectural_enforcement::find_violations;

fn report(violations: &[architectural_enforcement::Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn no_os_threads_in_production_code() {
    let violations = find_violations(&["std::thread::spawn", "thread::Builder"]);
    assert!(violations.is_empty(), "OS threads spawned:\n{}", report(&violations));
}

#[test]
fn no_unwrap_in_production_code() {
    let violations = find_violations(&[".unwrap()"]);
    assert!(violations.is_empty(), "unwrap() in production code:\n{}", report(&violations));
}

#[test]
fn no_blocking_http_client() {
    let violations = find_violations(&["reqwest::blocking"]);
    assert!(violations.is_empty(), "blocking HTTP client:\n{}", report(&violations));
}
