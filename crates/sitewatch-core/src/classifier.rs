//! Error classifier for deployment failures.
//!
//! State-based pre-classification comes first (a `stopped` deploy is a
//! timeout whatever its text says); otherwise the error text runs through
//! the ordered [`crate::rules`] table, with fallbacks for unmatched and
//! missing messages.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::domain::{DeployState, DeploymentRecord, Severity};
use crate::fingerprint::fingerprint;
use crate::rules::{
    first_match, Category, BUILD_ERROR_CATEGORY, BUILD_TIMEOUT_CATEGORY, UNKNOWN_ERROR_CATEGORY,
};

/// Why a classification landed where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBasis {
    /// The deploy was stopped; the text was not consulted.
    StoppedState,
    /// A rule in the table matched.
    Rule,
    /// A message exists but no rule matched.
    UnmatchedMessage,
    /// There was no usable message.
    NoMessage,
}

/// Result of classifying one deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub deploy_id: String,
    pub category: Category,
    pub basis: ClassificationBasis,
    /// Id of the matched rule, when `basis == Rule`.
    pub rule_id: Option<&'static str>,
    /// The text that was classified, if any.
    pub error_message: Option<String>,
    /// Fingerprint of `error_message` for cross-deploy grouping.
    pub fingerprint: Option<String>,
    /// Ready-to-send prompt for an external reasoning system.
    pub prompt: String,
}

impl Classification {
    pub fn category_name(&self) -> &'static str {
        self.category.name
    }

    pub fn severity(&self) -> Severity {
        self.category.severity
    }

    pub fn is_transient(&self) -> bool {
        self.category.transient
    }

    /// Fallback classifications that a human should look at.
    pub fn requires_manual_investigation(&self) -> bool {
        matches!(
            self.basis,
            ClassificationBasis::UnmatchedMessage | ClassificationBasis::NoMessage
        )
    }
}

/// Pick a category for `(message, state)`.
///
/// Pure: the same inputs always yield the same category, basis and rule.
/// Messages on `ready` deploys are stale and treated as absent.
pub fn categorize(
    message: Option<&str>,
    state: DeployState,
) -> (Category, ClassificationBasis, Option<&'static str>) {
    if state == DeployState::Stopped {
        return (BUILD_TIMEOUT_CATEGORY, ClassificationBasis::StoppedState, None);
    }

    let message = if state == DeployState::Ready {
        None
    } else {
        message.map(str::trim).filter(|m| !m.is_empty())
    };

    match message {
        Some(text) => match first_match(text) {
            Some(rule) => (rule.category, ClassificationBasis::Rule, Some(rule.id)),
            None => (BUILD_ERROR_CATEGORY, ClassificationBasis::UnmatchedMessage, None),
        },
        None => (UNKNOWN_ERROR_CATEGORY, ClassificationBasis::NoMessage, None),
    }
}

/// Classifies deployments against the static rule table.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    max_prompt_message_chars: usize,
}

impl ErrorClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_prompt_message_chars: config.max_prompt_message_chars,
        }
    }

    /// Classify a deployment using its own error message.
    pub fn classify(&self, record: &DeploymentRecord) -> Classification {
        self.classify_with_message(record, record.error_message.as_deref())
    }

    /// Classify a deployment using `message` in place of the record's own
    /// (e.g. an error line pulled from the build log).
    pub fn classify_with_message(
        &self,
        record: &DeploymentRecord,
        message: Option<&str>,
    ) -> Classification {
        let (category, basis, rule_id) = categorize(message, record.state);
        let error_message = match basis {
            ClassificationBasis::Rule | ClassificationBasis::UnmatchedMessage => {
                message.map(|m| m.trim().to_string())
            }
            // stopped deploys keep whatever text they had for display
            ClassificationBasis::StoppedState => message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            ClassificationBasis::NoMessage => None,
        };
        let fp = error_message.as_deref().map(fingerprint);
        let prompt = self.render_prompt(record, &category, error_message.as_deref());

        Classification {
            deploy_id: record.id.clone(),
            category,
            basis,
            rule_id,
            error_message,
            fingerprint: fp,
            prompt,
        }
    }

    fn render_prompt(
        &self,
        record: &DeploymentRecord,
        category: &Category,
        message: Option<&str>,
    ) -> String {
        let message = match message {
            Some(m) => truncate_chars(m, self.max_prompt_message_chars),
            None => "(no error message reported)".to_string(),
        };

        let mut out = String::new();
        out.push_str("You are diagnosing a failed static-site deployment.\n\n");
        out.push_str(&format!("Deploy ID: {}\n", record.id));
        out.push_str(&format!("Site ID: {}\n", record.site_id));
        out.push_str(&format!("State: {}\n", record.state));
        out.push_str(&format!(
            "Branch: {}\n",
            record.branch.as_deref().unwrap_or("unknown")
        ));
        out.push_str(&format!(
            "Commit: {}\n",
            record.commit_ref.as_deref().unwrap_or("unknown")
        ));
        out.push_str(&format!(
            "Preliminary category: {} (severity: {})\n\n",
            category.name, category.severity
        ));
        out.push_str("Error message:\n");
        out.push_str(&message);
        out.push_str("\n\nExplain the most likely root cause, then list concrete steps to fix it ");
        out.push_str("and to keep it from recurring.\n");
        out
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}… [truncated]", &text[..idx]),
        None => text.to_string(),
    }
}
