//! Error fingerprinting for spotting the same failure across deploys.
//!
//! Normalization strips what varies between runs of the same failure
//! (numbers, absolute paths, hashes, whitespace) before hashing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::DeploymentRecord;

static HEX_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-f]{7,64}\b").ok());
static NUMERIC_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());
static PATH_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/[A-Za-z0-9_.@/-]+").ok());

fn replace(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Normalize error text for fingerprinting: paths, hashes and numbers
/// become placeholders and whitespace collapses.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let text = replace(&PATH_REGEX, &lowered, "PATH");
    let text = replace(&HEX_REGEX, &text, "HASH");
    let text = replace(&NUMERIC_REGEX, &text, "N");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fingerprint of the normalized text (first 16 bytes of SHA-256, hex).
pub fn fingerprint(text: &str) -> String {
    let hash = Sha256::digest(normalize(text).as_bytes());
    hex::encode(&hash[..16])
}

/// A failure seen on more than one deploy in the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringFailure {
    pub fingerprint: String,
    /// First message seen with this fingerprint.
    pub sample_message: String,
    pub occurrences: usize,
    pub deploy_ids: Vec<String>,
}

/// Group failed deploys by error fingerprint.
///
/// Only fingerprints seen at least twice are returned, most frequent first;
/// ties keep the order in which they first appeared in `records`.
pub fn recurring_failures(records: &[DeploymentRecord]) -> Vec<RecurringFailure> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, RecurringFailure> = HashMap::new();

    for record in records.iter().filter(|r| r.state.is_failure()) {
        let Some(message) = record.meaningful_error() else {
            continue;
        };
        let fp = fingerprint(message);
        let entry = groups.entry(fp.clone()).or_insert_with(|| {
            order.push(fp.clone());
            RecurringFailure {
                fingerprint: fp,
                sample_message: message.to_string(),
                occurrences: 0,
                deploy_ids: Vec::new(),
            }
        });
        entry.occurrences += 1;
        entry.deploy_ids.push(record.id.clone());
    }

    let mut result: Vec<RecurringFailure> = order
        .into_iter()
        .filter_map(|fp| groups.remove(&fp))
        .filter(|g| g.occurrences >= 2)
        .collect();
    // stable sort keeps first-seen order among equal counts
    result.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeployState;
    use chrono::{TimeZone, Utc};

    fn failed(id: &str, message: &str) -> DeploymentRecord {
        DeploymentRecord::new(
            id,
            "site",
            DeployState::Error,
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
        .with_error(message)
    }

    #[test]
    fn test_normalize_strips_volatile_parts() {
        let a = normalize("Error at /opt/build/repo/src/a.js:12:5 after 340ms");
        let b = normalize("Error at /opt/build/repo/src/b.js:99:1   after 12ms");
        assert_eq!(a, b);
        assert!(a.contains("PATH"));
    }

    #[test]
    fn test_fingerprint_stable_and_short() {
        let fp = fingerprint("Command failed with exit code 2");
        assert_eq!(fp.len(), 32);
        assert_eq!(fp, fingerprint("command   failed with exit code 137"));
        assert_ne!(fp, fingerprint("ETIMEDOUT"));
    }

    #[test]
    fn test_recurring_failures_groups_and_orders() {
        let records = vec![
            failed("d1", "ETIMEDOUT after 3000ms"),
            failed("d2", "Command failed with exit code 2"),
            failed("d3", "ETIMEDOUT after 1200ms"),
            failed("d4", "Command failed with exit code 1"),
            failed("d5", "ETIMEDOUT after 10ms"),
            failed("d6", "a one-off problem"),
        ];
        let groups = recurring_failures(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrences, 3);
        assert_eq!(groups[0].deploy_ids, vec!["d1", "d3", "d5"]);
        assert_eq!(groups[0].sample_message, "ETIMEDOUT after 3000ms");
        assert_eq!(groups[1].occurrences, 2);
    }

    #[test]
    fn test_recurring_failures_ignores_ready_deploys() {
        let ready = DeploymentRecord::new(
            "d9",
            "site",
            DeployState::Ready,
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
        .with_error("ETIMEDOUT");
        let records = vec![ready.clone(), ready, failed("d1", "ETIMEDOUT")];
        assert!(recurring_failures(&records).is_empty());
    }
}
