//! Structural invariant checker.
//!
//! Walks one scope and reports every violation of the nested-set
//! invariants: boundaries must number 1..2n without gaps or duplicates,
//! intervals must nest or be disjoint (never partially overlap), the
//! adjacency column must agree with the interval containment, and tracked
//! levels must equal the ancestor count.

use serde::Serialize;

use crate::error::Result;
use crate::store::{NodeRow, TreeStore};

const MAX_FINDINGS: usize = 32;

/// How serious a finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Suspicious but not structurally corrupting.
    Warning,
    /// An invariant violation.
    Error,
}

/// One detected problem.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// Severity of the problem.
    pub severity: VerifySeverity,
    /// Human-readable description.
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Warning,
            message: message.into(),
        }
    }
}

/// Summary counters for the checked scope.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Rows in scope.
    pub nodes: u64,
    /// Highest right boundary found.
    pub max_right: i64,
}

/// Outcome of a verification pass over one scope.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// True when no error-severity finding was recorded.
    pub success: bool,
    /// Individual findings, capped at a fixed maximum.
    pub findings: Vec<VerifyFinding>,
    /// Summary counters.
    pub counts: VerifyCounts,
}

/// Checks every structural invariant of the store's current scope.
pub fn verify_scope<S: TreeStore>(store: &mut S) -> Result<VerifyReport> {
    let level_tracked = store.config().level.is_some();
    let rows = store.all_rows()?;
    let mut findings = Vec::new();

    let node_count = rows.len() as i64;
    let max_right = rows.iter().map(|row| row.rght).max().unwrap_or(0);
    let counts = VerifyCounts {
        nodes: rows.len() as u64,
        max_right,
    };

    for row in &rows {
        if row.lft >= row.rght {
            findings.push(VerifyFinding::error(format!(
                "node {} has an inverted interval ({}, {})",
                row.id, row.lft, row.rght
            )));
        } else if (row.rght - row.lft) % 2 == 0 {
            findings.push(VerifyFinding::error(format!(
                "node {} has even interval width {}",
                row.id,
                row.rght - row.lft
            )));
        }
    }

    if max_right != 2 * node_count {
        findings.push(VerifyFinding::error(format!(
            "scope holds {node_count} nodes but the highest right boundary is {max_right}",
        )));
    }

    // Each node contributes one left and one right boundary; together they
    // must cover 1..2n exactly.
    let mut boundaries: Vec<i64> = rows
        .iter()
        .flat_map(|row| [row.lft, row.rght])
        .collect();
    boundaries.sort_unstable();
    for (index, value) in boundaries.iter().enumerate() {
        let expected = index as i64 + 1;
        if *value != expected {
            findings.push(VerifyFinding::error(format!(
                "boundary numbering breaks at {value}, expected {expected}",
            )));
            break;
        }
    }

    // One stack scan over left-ordered rows checks nesting, adjacency and
    // levels at once: the stack top is always the tightest open interval.
    let mut stack: Vec<&NodeRow> = Vec::new();
    for row in &rows {
        while stack.last().is_some_and(|top| top.rght < row.lft) {
            stack.pop();
        }
        if let Some(top) = stack.last() {
            if row.rght > top.rght {
                findings.push(VerifyFinding::error(format!(
                    "node {} ({}, {}) partially overlaps node {} ({}, {})",
                    row.id, row.lft, row.rght, top.id, top.lft, top.rght
                )));
            }
        }
        let implied_parent = stack.last().map(|top| top.id);
        if row.parent != implied_parent {
            findings.push(VerifyFinding::error(format!(
                "node {} stores parent {:?} but the intervals imply {:?}",
                row.id, row.parent, implied_parent
            )));
        }
        if level_tracked {
            match row.level {
                Some(level) if level != stack.len() as i64 => {
                    findings.push(VerifyFinding::error(format!(
                        "node {} stores level {} but has {} ancestors",
                        row.id,
                        level,
                        stack.len()
                    )));
                }
                None => {
                    findings.push(VerifyFinding::warning(format!(
                        "node {} has no level value",
                        row.id
                    )));
                }
                _ => {}
            }
        }
        stack.push(row);
    }

    findings.truncate(MAX_FINDINGS);
    let success = findings
        .iter()
        .all(|finding| finding.severity != VerifySeverity::Error);
    Ok(VerifyReport {
        success,
        findings,
        counts,
    })
}
