//! Markdown rendering of tool results.
//!
//! Every tool answers with human-readable text; these functions turn engine
//! outputs into that text. They never fail.

use sitewatch_core::{
    Classification, ContentMetrics, DeploymentRecord, LogSummary, RecurringFailure, RetryVerdict,
    Site, UsageMetrics,
};

pub fn render_sites(sites: &[Site]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Sites ({})\n\n", sites.len()));
    if sites.is_empty() {
        out.push_str("No sites are visible to this token.\n");
        return out;
    }
    for site in sites {
        out.push_str(&format!("- **{}** (`{}`)", site.name, site.id));
        if !site.url.is_empty() {
            out.push_str(&format!(" {}", site.url));
        }
        if let Some(domain) = &site.custom_domain {
            out.push_str(&format!(" [custom domain: {}]", domain));
        }
        out.push('\n');
    }
    out
}

pub fn render_deployments(site_id: &str, deploys: &[DeploymentRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Recent deployments for `{}`\n\n", site_id));
    if deploys.is_empty() {
        out.push_str("No deployments found.\n");
        return out;
    }
    out.push_str("| id | state | branch | created | duration |\n");
    out.push_str("|----|-------|--------|---------|----------|\n");
    for d in deploys {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            d.id,
            d.state,
            d.branch.as_deref().unwrap_or("n/a"),
            d.created_at.format("%Y-%m-%d %H:%M UTC"),
            format_duration(d.deploy_time),
        ));
    }
    out
}

/// Diagnosis of one deploy. `log_error` is set when the log could not be
/// fetched; the diagnosis then rests on the record alone.
pub fn render_diagnosis(
    record: &DeploymentRecord,
    logs: &LogSummary,
    log_error: Option<&str>,
    classification: &Classification,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Diagnosis for deploy `{}`\n\n", record.id));
    push_deploy_facts(&mut out, record);

    out.push_str("\n## Build log\n");
    match log_error {
        Some(err) => out.push_str(&format!("- unavailable: {}\n", err)),
        None => {
            out.push_str(&format!(
                "- lines: {} (errors: {}, warnings: {})\n",
                logs.total_lines, logs.error_count, logs.warn_count
            ));
            if !logs.error_excerpts.is_empty() {
                out.push_str("\n```\n");
                for line in &logs.error_excerpts {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str("```\n");
            }
        }
    }

    push_classification(&mut out, classification);

    out.push_str("\n## AI analysis prompt\n\n```\n");
    out.push_str(&classification.prompt);
    if !classification.prompt.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n");
    out
}

pub fn render_ready_deploy(record: &DeploymentRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Deploy `{}` succeeded\n\n", record.id));
    push_deploy_facts(&mut out, record);
    out.push_str("\nThe deploy is ready; there is no failure to diagnose.\n");
    out
}

pub fn render_usage(
    site_id: &str,
    metrics: &UsageMetrics,
    recurring: &[RecurringFailure],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Build usage for `{}`\n\n", site_id));
    out.push_str(&format!(
        "- deploys analyzed: {} ({} with timing)\n",
        metrics.window_size, metrics.timed_deploys
    ));
    out.push_str(&format!(
        "- average build: {:.1} min\n",
        metrics.average_build_minutes
    ));
    out.push_str(&format!(
        "- minutes used this month: {} of {}\n",
        metrics.minutes_used, metrics.monthly_quota
    ));
    out.push_str(&format!("- minutes remaining: {}\n", metrics.minutes_remaining));
    out.push_str(&format!("- failure rate: {}%\n", metrics.failure_rate));
    if metrics.is_over_quota() {
        out.push_str("\n**Over quota:** further builds this month are billed as overage.\n");
    }

    out.push_str("\n## Recurring failures\n");
    if recurring.is_empty() {
        out.push_str("None detected.\n");
    } else {
        for r in recurring {
            out.push_str(&format!(
                "- {}× `{}` (deploys: {})\n",
                r.occurrences,
                r.sample_message,
                r.deploy_ids.join(", ")
            ));
        }
    }
    out
}

pub fn render_retry(
    record: &DeploymentRecord,
    classification: &Classification,
    metrics: &UsageMetrics,
    verdict: &RetryVerdict,
) -> String {
    let mut out = String::new();
    let headline = if verdict.recommended {
        "Retry recommended"
    } else {
        "Retry not recommended"
    };
    out.push_str(&format!("# {} for deploy `{}`\n\n", headline, record.id));
    push_deploy_facts(&mut out, record);
    out.push_str(&format!(
        "- category: {} (severity: {}, est. {} min per attempt)\n",
        classification.category_name(),
        classification.severity(),
        classification.category.estimated_cost_minutes
    ));
    out.push_str(&format!(
        "- minutes remaining: {}, failure rate: {}%\n",
        metrics.minutes_remaining, metrics.failure_rate
    ));

    out.push_str("\n## Reasons\n");
    for reason in &verdict.reasons {
        out.push_str(&format!("- {}\n", reason));
    }
    if !verdict.recommended && !classification.category.quick_fixes.is_empty() {
        out.push_str("\n## Fix before retrying\n");
        for fix in classification.category.quick_fixes {
            out.push_str(&format!("- {}\n", fix));
        }
    }
    out
}

/// Retry advice for a deploy that is not in a failed state.
pub fn render_retry_not_applicable(record: &DeploymentRecord, reason: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# No retry needed for deploy `{}`\n\n", record.id));
    push_deploy_facts(&mut out, record);
    out.push_str(&format!("\n{}\n", reason));
    out
}

pub fn render_content(site_id: &str, metrics: &ContentMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Content optimization report for `{}`\n\n", site_id));
    out.push_str("_All figures are heuristic estimates from build history._\n\n");
    out.push_str(&format!(
        "- estimated content deploys: {}\n",
        metrics.estimated_post_count
    ));
    out.push_str(&format!(
        "- estimated average post size: {:.0} KB\n",
        metrics.estimated_avg_post_size_kb
    ));
    out.push_str(&format!(
        "- estimated image optimization opportunities: {}\n",
        metrics.estimated_image_opportunities
    ));
    out.push_str(&format!(
        "- estimated build minutes per post: {:.1}\n",
        metrics.avg_build_minutes_per_post
    ));
    out.push_str(&format!(
        "- incremental builds likely: {}\n",
        if metrics.incremental_builds_likely { "yes" } else { "no" }
    ));

    out.push_str("\n## Recommendations\n");
    if metrics.recommendations.is_empty() {
        out.push_str("No changes suggested.\n");
    } else {
        for rec in &metrics.recommendations {
            out.push_str(&format!("- {}\n", rec));
        }
    }
    out
}

fn push_deploy_facts(out: &mut String, record: &DeploymentRecord) {
    out.push_str(&format!("- site: `{}`\n", record.site_id));
    out.push_str(&format!("- state: {}\n", record.state));
    if let Some(branch) = &record.branch {
        out.push_str(&format!("- branch: {}\n", branch));
    }
    if let Some(commit) = &record.commit_ref {
        out.push_str(&format!("- commit: {}\n", commit));
    }
    if let Some(title) = &record.title {
        out.push_str(&format!("- title: {}\n", title));
    }
    out.push_str(&format!(
        "- created: {}\n",
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(minutes) = record.build_duration_minutes() {
        out.push_str(&format!("- build time: {:.1} min\n", minutes));
    }
}

fn push_classification(out: &mut String, c: &Classification) {
    out.push_str(&format!(
        "\n## Classification: {} (severity: {})\n\n",
        c.category_name(),
        c.severity()
    ));
    out.push_str(c.category.description);
    out.push('\n');
    if c.requires_manual_investigation() {
        out.push_str("\nNo known pattern matched; manual investigation required.\n");
    }
    if let Some(message) = &c.error_message {
        out.push_str(&format!("\nError: `{}`\n", message));
    }

    push_list(out, "Likely causes", c.category.causes);
    push_list(out, "Quick fixes", c.category.quick_fixes);
    push_list(out, "Prevention", c.category.prevention_tips);
}

fn push_list(out: &mut String, title: &str, items: &[&str]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n### {}\n", title));
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
}

fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) if s >= 60 => format!("{}m {}s", s / 60, s % 60),
        Some(s) => format!("{}s", s),
        None => "n/a".to_string(),
    }
}
