use chrono::{DateTime, Duration, TimeZone, Utc};
use sitewatch_core::metrics::METRICS;
use sitewatch_core::rules::{
    BUILD_TIMEOUT, DEPENDENCY_CONFLICT, FRAMEWORK_BUILD, MEMORY_LIMIT, TYPESCRIPT_ERROR,
};
use sitewatch_core::{
    recurring_failures, summarize_logs, DeployState, DeploymentRecord, DiagnosticsEngine,
    EngineConfig, LogLevel, LogLine, Severity,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 18, 12, 0, 0).unwrap()
}

fn deploy(id: &str, state: DeployState, minutes_ago: i64) -> DeploymentRecord {
    DeploymentRecord::new(id, "site-blog", state, now() - Duration::minutes(minutes_ago))
}

/// A month of healthy deploys with one recent failure.
fn healthy_window(failing_message: &str) -> Vec<DeploymentRecord> {
    let mut records: Vec<DeploymentRecord> = (1..10)
        .map(|i| {
            let created = now() - Duration::hours(i * 6);
            DeploymentRecord::new(format!("ok-{i}"), "site-blog", DeployState::Ready, created)
                .with_published_at(created + Duration::seconds(90))
                .with_deploy_time(90)
                .with_title("New blog post")
        })
        .collect();
    records.insert(
        0,
        deploy("bad-1", DeployState::Error, 5)
            .with_error(failing_message)
            .with_branch("main"),
    );
    records
}

// ── Classification ──────────────────────────────────────────────────────

#[test]
fn dependency_conflict_scenario_recommends_retry() {
    let engine = DiagnosticsEngine::default();
    let window = healthy_window("npm ERR! peer dep conflict with react@18");

    let c = engine.classify_error(&window[0]);
    assert_eq!(c.category_name(), DEPENDENCY_CONFLICT);
    assert_eq!(c.severity(), Severity::High);

    let metrics = engine.aggregate_metrics_at(&window, now());
    assert_eq!(metrics.failure_rate, 10);

    let verdict = engine.decide_retry(Some(&c), &metrics);
    assert!(verdict.recommended, "reasons: {:?}", verdict.reasons);
}

#[test]
fn typescript_scenario_requires_code_change() {
    let engine = DiagnosticsEngine::default();
    let window = healthy_window("src/index.ts(4,7): error TS2322: Type 'string' is not assignable");

    let c = engine.classify_error(&window[0]);
    assert_eq!(c.category_name(), TYPESCRIPT_ERROR);

    let metrics = engine.aggregate_metrics_at(&window, now());
    let verdict = engine.decide_retry(Some(&c), &metrics);
    assert!(!verdict.recommended);
    assert!(verdict.reasons.iter().any(|r| r.contains("code change")));
}

#[test]
fn stopped_deploy_is_a_timeout() {
    let engine = DiagnosticsEngine::default();
    let rec = deploy("stop-1", DeployState::Stopped, 1).with_error("JavaScript heap out of memory");
    let c = engine.classify_error(&rec);
    assert_eq!(c.category_name(), BUILD_TIMEOUT);
    assert_ne!(c.category_name(), MEMORY_LIMIT);
}

#[test]
fn log_line_drives_classification_when_record_is_silent() {
    let engine = DiagnosticsEngine::default();
    let rec = deploy("silent-1", DeployState::Error, 2);
    let logs = vec![
        LogLine::new(now(), LogLevel::Info, "Installing dependencies"),
        LogLine::new(now(), LogLevel::Info, "Building site with next build"),
        LogLine::new(
            now(),
            LogLevel::Error,
            "Failed to compile: error occurred prerendering page \"/about\"",
        ),
    ];
    let summary = summarize_logs(&logs);

    let c = engine.classify_error_with_message(&rec, summary.best_error_text());
    assert_eq!(c.category_name(), FRAMEWORK_BUILD);
    assert!(c.prompt.contains("prerendering"));
}

#[test]
fn classifications_are_counted() {
    let before = METRICS.classifications();
    let engine = DiagnosticsEngine::default();
    engine.classify_error(&deploy("m-1", DeployState::Error, 1).with_error("ECONNRESET"));
    assert!(METRICS.classifications() > before);
}

// ── Usage and retry ─────────────────────────────────────────────────────

#[test]
fn empty_site_has_zeroed_metrics_and_no_retry_without_classification() {
    let engine = DiagnosticsEngine::default();
    let metrics = engine.aggregate_metrics_at(&[], now());
    assert_eq!(metrics.minutes_used, 0);
    assert_eq!(metrics.failure_rate, 0);
    assert_eq!(metrics.average_build_minutes, 0.0);

    let verdict = engine.decide_retry(None, &metrics);
    assert!(!verdict.recommended);
}

#[test]
fn exhausted_quota_blocks_every_retry() {
    let engine = DiagnosticsEngine::new(EngineConfig {
        monthly_quota_minutes: 20,
        ..Default::default()
    });
    let window = healthy_window("ETIMEDOUT while fetching registry");
    let c = engine.classify_error(&window[0]);
    let metrics = engine.aggregate_metrics_at(&window, now());
    assert!(metrics.minutes_remaining < 30);

    let verdict = engine.decide_retry(Some(&c), &metrics);
    assert!(!verdict.recommended);
    assert!(verdict.reasons[0].contains("quota critically low"));
}

#[test]
fn flaky_site_is_not_retried() {
    let engine = DiagnosticsEngine::default();
    let records: Vec<DeploymentRecord> = (0..10)
        .map(|i| {
            let state = if i % 2 == 0 { DeployState::Error } else { DeployState::Ready };
            deploy(&format!("f-{i}"), state, i).with_error("npm ERR! peer dep conflict")
        })
        .collect();
    let c = engine.classify_error(&records[0]);
    let metrics = engine.aggregate_metrics_at(&records, now());
    assert_eq!(metrics.failure_rate, 50);

    let verdict = engine.decide_retry(Some(&c), &metrics);
    assert!(!verdict.recommended);
    assert!(verdict
        .reasons
        .last()
        .is_some_and(|r| r.contains("recurring pattern")));

    let recurring = recurring_failures(&records);
    assert_eq!(recurring.len(), 1);
    assert_eq!(recurring[0].occurrences, 5);
}

// ── Content impact ──────────────────────────────────────────────────────

#[test]
fn content_estimates_follow_commit_labels() {
    let engine = DiagnosticsEngine::default();
    let window = healthy_window("anything");
    let m = engine.estimate_content_impact(&window);
    assert_eq!(m.estimated_post_count, 9);
    // 90s × 2.5 KB/s
    assert_eq!(m.estimated_avg_post_size_kb, 225.0);
    assert_eq!(m.estimated_image_opportunities, 0);
    assert_eq!(m.avg_build_minutes_per_post, 2.0);
    assert!(!m.incremental_builds_likely);
}
