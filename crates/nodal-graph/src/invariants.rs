//! Structural invariant checks.
//!
//! The report lists every violation instead of stopping at the first one so a
//! rejected commit can explain everything that went wrong.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::ids::AreaId;
use crate::model::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantSeverity {
    Error,
    Warning,
}

/// Stable discriminator for invariant issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    AreaDataMissing,
    DanglingEdgeEndpoint,
    OrderOnNormalEdge,
    StaleFocus,
    StaleSelection,
    StaleCollapsedRoot,
    UnknownAreaMember,
    NodeWithoutArea,
    NodeInMultipleAreas,
    EmptyArea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub severity: InvariantSeverity,
    /// Id of the offending entity, when there is one.
    pub subject: Option<String>,
    pub message: String,
}

impl fmt::Display for InvariantIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{:?} [{subject}]: {}", self.code, self.message),
            None => write!(f, "{:?}: {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == InvariantSeverity::Error)
    }

    #[must_use]
    pub fn contains(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    fn push(
        &mut self,
        code: InvariantCode,
        severity: InvariantSeverity,
        subject: Option<String>,
        message: String,
    ) {
        self.issues.push(InvariantIssue {
            code,
            severity,
            subject,
            message,
        });
    }
}

impl Graph {
    /// Collect every invariant violation in the snapshot.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut report = InvariantReport::default();

        if !self.nodes.is_empty() && self.areas.is_empty() {
            report.push(
                InvariantCode::AreaDataMissing,
                InvariantSeverity::Error,
                None,
                format!("{} nodes exist but no area data", self.nodes.len()),
            );
        }

        for edge in self.edges.values() {
            for endpoint in [&edge.from, &edge.to] {
                if !self.nodes.contains_key(endpoint) {
                    report.push(
                        InvariantCode::DanglingEdgeEndpoint,
                        InvariantSeverity::Error,
                        Some(edge.id.to_string()),
                        format!("endpoint {endpoint} does not exist"),
                    );
                }
            }
            if !edge.is_parent_child() && edge.parent_child_order.is_some() {
                report.push(
                    InvariantCode::OrderOnNormalEdge,
                    InvariantSeverity::Error,
                    Some(edge.id.to_string()),
                    "normal edge carries a sibling order".to_string(),
                );
            }
        }

        if let Some(focused) = &self.focused_node_id
            && !self.nodes.contains_key(focused)
        {
            report.push(
                InvariantCode::StaleFocus,
                InvariantSeverity::Error,
                Some(focused.to_string()),
                "focused node does not exist".to_string(),
            );
        }

        for selected in &self.selected_node_ids {
            if !self.nodes.contains_key(selected) {
                report.push(
                    InvariantCode::StaleSelection,
                    InvariantSeverity::Error,
                    Some(selected.to_string()),
                    "selected node does not exist".to_string(),
                );
            }
        }

        for collapsed in &self.collapsed_root_node_ids {
            if !self.nodes.contains_key(collapsed) {
                report.push(
                    InvariantCode::StaleCollapsedRoot,
                    InvariantSeverity::Warning,
                    Some(collapsed.to_string()),
                    "collapsed root does not exist".to_string(),
                );
            }
        }

        let mut owners: BTreeMap<_, Vec<&AreaId>> = BTreeMap::new();
        for area in self.areas.values() {
            if area.node_ids.is_empty() {
                report.push(
                    InvariantCode::EmptyArea,
                    InvariantSeverity::Warning,
                    Some(area.id.to_string()),
                    "area has no members".to_string(),
                );
            }
            for member in &area.node_ids {
                if self.nodes.contains_key(member) {
                    owners.entry(member).or_default().push(&area.id);
                } else {
                    report.push(
                        InvariantCode::UnknownAreaMember,
                        InvariantSeverity::Error,
                        Some(area.id.to_string()),
                        format!("member {member} does not exist"),
                    );
                }
            }
        }

        if !self.areas.is_empty() {
            for node_id in self.nodes.keys() {
                match owners.get(node_id).map(Vec::len).unwrap_or(0) {
                    0 => report.push(
                        InvariantCode::NodeWithoutArea,
                        InvariantSeverity::Error,
                        Some(node_id.to_string()),
                        "node belongs to no area".to_string(),
                    ),
                    1 => {}
                    count => report.push(
                        InvariantCode::NodeInMultipleAreas,
                        InvariantSeverity::Error,
                        Some(node_id.to_string()),
                        format!("node belongs to {count} areas"),
                    ),
                }
            }
        }

        report
    }

    /// Fail with [`GraphError::Invariant`] when the report has errors.
    pub fn validate(&self) -> Result<(), GraphError> {
        let report = self.invariant_report();
        if report.has_errors() {
            return Err(GraphError::Invariant(report));
        }
        Ok(())
    }
}
