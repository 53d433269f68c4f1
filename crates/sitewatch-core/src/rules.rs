//! Ordered error-classification rule table.
//!
//! # Ordering
//!
//! Rules are evaluated top to bottom and the **first match wins**. There is
//! no scoring and no overlap resolution beyond position: when realistic error
//! text could satisfy two rules, the earlier rule is the answer. The families
//! are ordered
//!
//! 1. dependency / package-manager failures
//! 2. build command not found
//! 3. runtime version mismatch
//! 4. filesystem / path errors (including case sensitivity)
//! 5. memory-limit exhaustion
//! 6. network / timeout failures
//! 7. type-checking failures
//! 8. framework build failures
//! 9. lint failures
//!
//! so that root causes (a broken install, a missing binary) win over the
//! symptoms they produce further down the log. Reordering this table changes
//! classifications; the ordering tests below pin it.
//!
//! Fallback categories (timeout on `stopped`, generic build error, unknown
//! error) are not rules; they live here as [`Category`] constants and are
//! applied by the classifier.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::warn;

use crate::domain::Severity;

pub const DEPENDENCY_CONFLICT: &str = "Dependency Conflict";
pub const DEPENDENCY_INSTALL: &str = "Dependency Installation Failed";
pub const BUILD_COMMAND_NOT_FOUND: &str = "Build Command Not Found";
pub const NODE_VERSION_MISMATCH: &str = "Node Version Mismatch";
pub const FILE_PATH_ERROR: &str = "File Path Error";
pub const MEMORY_LIMIT: &str = "Memory Limit Exceeded";
pub const NETWORK_ISSUES: &str = "Network Issues";
pub const TYPESCRIPT_ERROR: &str = "TypeScript Error";
pub const FRAMEWORK_BUILD: &str = "Framework Build Failed";
pub const LINT_ERRORS: &str = "Lint Errors";
pub const BUILD_TIMEOUT: &str = "Build Timeout";
pub const BUILD_ERROR: &str = "Build Error";
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Static description of an error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub severity: Severity,
    /// Build minutes a retry is expected to consume.
    pub estimated_cost_minutes: u64,
    /// Expected to resolve without a code change.
    pub transient: bool,
    pub description: &'static str,
    pub causes: &'static [&'static str],
    pub quick_fixes: &'static [&'static str],
    pub prevention_tips: &'static [&'static str],
}

/// Match predicate of a rule.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Matches when the lowercased text contains any of these lowercase needles.
    Contains(&'static [&'static str]),
    /// Case-insensitive regular expression.
    Pattern(Regex),
}

impl Trigger {
    /// `lowered` must be `text.to_lowercase()`; it is passed in so callers
    /// lowercase once per classification rather than once per rule.
    fn matches(&self, text: &str, lowered: &str) -> bool {
        match self {
            Self::Contains(needles) => needles.iter().any(|n| lowered.contains(n)),
            Self::Pattern(re) => re.is_match(text),
        }
    }
}

/// One classification rule: a trigger and the category it assigns.
#[derive(Debug, Clone)]
pub struct ErrorRule {
    pub id: &'static str,
    pub trigger: Trigger,
    pub category: Category,
}

impl ErrorRule {
    pub fn matches(&self, text: &str, lowered: &str) -> bool {
        self.trigger.matches(text, lowered)
    }
}

/// The rule table, built once per process.
pub static RULES: LazyLock<Vec<ErrorRule>> = LazyLock::new(build_rules);

/// The rule table in priority order.
pub fn rules() -> &'static [ErrorRule] {
    &RULES
}

/// Find the first rule matching `text`.
pub fn first_match(text: &str) -> Option<&'static ErrorRule> {
    let lowered = text.to_lowercase();
    rules().iter().find(|rule| rule.matches(text, &lowered))
}

/// Compile a case-insensitive pattern.
///
/// A pattern that fails to compile degrades to a trigger that never matches;
/// `test_all_patterns_compile` keeps that from shipping.
fn pattern(src: &str) -> Trigger {
    match RegexBuilder::new(src).case_insensitive(true).build() {
        Ok(re) => Trigger::Pattern(re),
        Err(e) => {
            warn!(pattern = src, error = %e, "invalid classification pattern disabled");
            Trigger::Contains(&[])
        }
    }
}

fn build_rules() -> Vec<ErrorRule> {
    vec![
        // -- 1. dependency / package manager ---------------------------------
        ErrorRule {
            id: "dependency-conflict",
            trigger: Trigger::Contains(&[
                "peer dep",
                "eresolve",
                "could not resolve dependency",
                "unable to resolve dependency tree",
                "conflicting peer",
            ]),
            category: Category {
                name: DEPENDENCY_CONFLICT,
                severity: Severity::High,
                estimated_cost_minutes: 4,
                transient: true,
                description: "The package manager could not resolve a consistent dependency tree.",
                causes: &[
                    "Peer dependency ranges that no published version satisfies",
                    "A transitive dependency released a breaking version",
                    "Lockfile generated by a different package manager version",
                ],
                quick_fixes: &[
                    "Set NPM_FLAGS=--legacy-peer-deps in the build environment",
                    "Clear the build cache and retry the deploy",
                    "Regenerate the lockfile locally and commit it",
                ],
                prevention_tips: &[
                    "Commit the lockfile and pin the package manager version",
                    "Let a dependency bot raise upgrades as reviewed PRs",
                ],
            },
        },
        ErrorRule {
            id: "dependency-install",
            trigger: Trigger::Contains(&[
                "install dependencies",
                "dependency_installation",
                "error installing dependencies",
                "npm err! code e404",
                "npm err! 404",
                "eintegrity",
                "integrity checksum failed",
                "lockfile",
            ]),
            category: Category {
                name: DEPENDENCY_INSTALL,
                severity: Severity::Medium,
                estimated_cost_minutes: 4,
                transient: false,
                description: "Dependencies failed to install before the build command ran.",
                causes: &[
                    "A package or version in package.json does not exist in the registry",
                    "Lockfile out of sync with package.json",
                    "Private registry credentials missing from the build environment",
                ],
                quick_fixes: &[
                    "Run a clean install locally and commit the updated lockfile",
                    "Check package names and versions for typos",
                    "Add registry auth tokens as build environment variables",
                ],
                prevention_tips: &[
                    "Use `npm ci` locally before pushing to catch lockfile drift",
                    "Keep exactly one lockfile in the repository",
                ],
            },
        },
        // -- 2. build command not found --------------------------------------
        ErrorRule {
            id: "build-command-not-found",
            trigger: Trigger::Contains(&[
                "command not found",
                "missing script",
                "is not recognized as an internal or external command",
                "no such command",
                "build command not found",
            ]),
            category: Category {
                name: BUILD_COMMAND_NOT_FOUND,
                severity: Severity::High,
                estimated_cost_minutes: 1,
                transient: false,
                description: "The configured build command does not exist in the build image.",
                causes: &[
                    "Build command references a script missing from package.json",
                    "CLI tool installed only as a global dependency on the developer machine",
                    "Wrong base directory, so package.json is not found",
                ],
                quick_fixes: &[
                    "Check the build command in the site's build settings",
                    "Add the CLI tool to devDependencies and call it through npx",
                    "Set the correct base directory for monorepos",
                ],
                prevention_tips: &[
                    "Keep the build command in a versioned config file next to the code",
                    "Run the exact build command in a clean container before pushing",
                ],
            },
        },
        // -- 3. runtime version mismatch -------------------------------------
        ErrorRule {
            id: "node-version-mismatch",
            trigger: pattern(
                r#"unsupported engine|engine "node" is incompatible|requires node(\.js)?\s*(version\s*)?[><=^~v]*\s*\d+|node(\.js)? (version )?v?\d+(\.\d+)*\s+is not supported|expected version "?[><=^~]*\d+"#,
            ),
            category: Category {
                name: NODE_VERSION_MISMATCH,
                severity: Severity::Medium,
                estimated_cost_minutes: 3,
                transient: false,
                description: "The build runtime version does not satisfy the project's requirements.",
                causes: &[
                    "The build image default Node.js version differs from local development",
                    "A dependency raised its minimum engine version",
                ],
                quick_fixes: &[
                    "Set NODE_VERSION in the build environment",
                    "Add an .nvmrc or .node-version file to the repository root",
                ],
                prevention_tips: &[
                    "Declare the engines field in package.json",
                    "Keep local, CI and hosting runtimes on the same major version",
                ],
            },
        },
        // -- 4. filesystem / path --------------------------------------------
        ErrorRule {
            id: "file-path",
            trigger: Trigger::Contains(&[
                "module not found",
                "cannot find module",
                "can't resolve",
                "enoent",
                "no such file or directory",
                "file not found",
            ]),
            category: Category {
                name: FILE_PATH_ERROR,
                severity: Severity::High,
                estimated_cost_minutes: 2,
                transient: false,
                description: "A file or module referenced by the build could not be found.",
                causes: &[
                    "Import path casing differs from the file on disk (the build runs on a case-sensitive filesystem)",
                    "File ignored by git and therefore missing from the deploy",
                    "Relative path resolved from the wrong base directory",
                ],
                quick_fixes: &[
                    "Match import paths to the exact file name casing",
                    "Rename via `git mv` so git records case-only renames",
                    "Check .gitignore for the missing file",
                ],
                prevention_tips: &[
                    "Enable case-sensitive path checks in your bundler or linter",
                    "Build from a fresh clone before pushing",
                ],
            },
        },
        // -- 5. memory -------------------------------------------------------
        ErrorRule {
            id: "memory-limit",
            trigger: Trigger::Contains(&[
                "javascript heap out of memory",
                "out of memory",
                "heap limit",
                "allocation failed",
                "enomem",
                "exit code 137",
            ]),
            category: Category {
                name: MEMORY_LIMIT,
                severity: Severity::Critical,
                estimated_cost_minutes: 8,
                transient: false,
                description: "The build exhausted the memory available in the build container.",
                causes: &[
                    "Large image processing during the build",
                    "Bundling very large dependency graphs in a single pass",
                    "Memory leak in a build plugin",
                ],
                quick_fixes: &[
                    "Set NODE_OPTIONS=--max_old_space_size=4096",
                    "Move image optimization out of the build step",
                ],
                prevention_tips: &[
                    "Track build memory as the site grows",
                    "Split large pages and lazily generate rarely visited ones",
                ],
            },
        },
        // -- 6. network ------------------------------------------------------
        ErrorRule {
            id: "network",
            trigger: Trigger::Contains(&[
                "etimedout",
                "econnreset",
                "econnrefused",
                "enotfound",
                "eai_again",
                "getaddrinfo",
                "socket hang up",
                "network error",
                "network timeout",
                "timed out",
                "503 service unavailable",
                "rate limit",
            ]),
            category: Category {
                name: NETWORK_ISSUES,
                severity: Severity::High,
                estimated_cost_minutes: 3,
                transient: true,
                description: "A network request made during the build failed or timed out.",
                causes: &[
                    "Registry or CDN outage",
                    "Upstream API rate limiting requests from the build",
                    "DNS resolution failure inside the build container",
                ],
                quick_fixes: &[
                    "Retry the deploy",
                    "Check the status pages of the package registry and any APIs fetched at build time",
                ],
                prevention_tips: &[
                    "Cache fetched data between builds",
                    "Add retries with backoff around build-time API calls",
                ],
            },
        },
        // -- 7. type checking ------------------------------------------------
        ErrorRule {
            id: "typescript",
            trigger: pattern(
                r"\bts\d{4,5}\b|typescript error|is not assignable to type|type-?check(ing)? failed|tsc exited",
            ),
            category: Category {
                name: TYPESCRIPT_ERROR,
                severity: Severity::High,
                estimated_cost_minutes: 4,
                transient: false,
                description: "Type checking failed during the build.",
                causes: &[
                    "Code merged without running the type checker",
                    "Dependency upgrade changed exported types",
                    "Stricter compiler options in the build than in the editor",
                ],
                quick_fixes: &[
                    "Run `tsc --noEmit` locally and fix the reported errors",
                    "Pin the dependency whose types changed",
                ],
                prevention_tips: &[
                    "Run the type checker in a pre-push hook or CI",
                    "Share one tsconfig between editor and build",
                ],
            },
        },
        // -- 8. framework build ----------------------------------------------
        ErrorRule {
            id: "framework-build",
            trigger: Trigger::Contains(&[
                "next build",
                "gatsby build",
                "astro build",
                "vite build",
                "nuxt build",
                "hugo",
                "jekyll",
                "webpack",
                "rollup failed",
                "failed to compile",
                "build failed",
                "error building site",
            ]),
            category: Category {
                name: FRAMEWORK_BUILD,
                severity: Severity::High,
                estimated_cost_minutes: 5,
                transient: false,
                description: "The site generator or bundler failed while building pages.",
                causes: &[
                    "Runtime error while pre-rendering a page",
                    "Invalid front matter or content in a source file",
                    "Framework plugin incompatible with the installed framework version",
                ],
                quick_fixes: &[
                    "Reproduce with the production build command locally",
                    "Check the first error in the build log, later errors are often follow-ons",
                ],
                prevention_tips: &[
                    "Run a production build in CI for every pull request",
                    "Validate content front matter with a schema",
                ],
            },
        },
        // -- 9. lint ---------------------------------------------------------
        ErrorRule {
            id: "lint",
            trigger: Trigger::Contains(&[
                "eslint",
                "stylelint",
                "prettier",
                "lint error",
                "linting",
                "run lint",
            ]),
            category: Category {
                name: LINT_ERRORS,
                severity: Severity::Medium,
                estimated_cost_minutes: 2,
                transient: false,
                description: "Lint checks run as part of the build reported errors.",
                causes: &[
                    "Lint runs during the build and treats warnings as errors (CI=true)",
                    "New lint rules introduced by a config upgrade",
                ],
                quick_fixes: &[
                    "Run the linter locally with --fix",
                    "Move linting out of the production build command",
                ],
                prevention_tips: &[
                    "Lint in a pre-commit hook",
                    "Pin lint plugin versions",
                ],
            },
        },
    ]
}

/// Applied to `stopped` deploys regardless of their message.
pub const BUILD_TIMEOUT_CATEGORY: Category = Category {
    name: BUILD_TIMEOUT,
    severity: Severity::Medium,
    estimated_cost_minutes: 15,
    transient: false,
    description: "The build was stopped before finishing, usually by the build time limit.",
    causes: &[
        "Build exceeded the provider's maximum build time",
        "A build step waited on input or a hung network request",
        "The deploy was cancelled manually",
    ],
    quick_fixes: &[
        "Check the last log lines for the step that stalled",
        "Enable build caching to shorten repeat builds",
    ],
    prevention_tips: &[
        "Keep build-time data fetching bounded with timeouts",
        "Watch average build duration as content grows",
    ],
};

/// Applied when a message exists but no rule matched.
pub const BUILD_ERROR_CATEGORY: Category = Category {
    name: BUILD_ERROR,
    severity: Severity::Medium,
    estimated_cost_minutes: 5,
    transient: false,
    description: "The build failed with an unrecognized error; manual investigation required.",
    causes: &["Error text did not match any known failure pattern"],
    quick_fixes: &["Read the full build log around the first error line"],
    prevention_tips: &[],
};

/// Applied when there is no message and the deploy was not stopped.
pub const UNKNOWN_ERROR_CATEGORY: Category = Category {
    name: UNKNOWN_ERROR,
    severity: Severity::Medium,
    estimated_cost_minutes: 5,
    transient: false,
    description: "No error details were reported for this deployment.",
    causes: &["The provider reported no error message"],
    quick_fixes: &["Open the deploy log in the hosting dashboard"],
    prevention_tips: &[],
};
