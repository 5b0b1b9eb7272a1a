//! Blocking structural validation.
//!
//! These checks gate every save attempt: any finding sets the save
//! status to `Error` and the payload never reaches the server. Disabled
//! nodes are out of scope here but remain in the payload.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::graph::Graph;
use crate::types::NodeKind;

/// A blocking validation finding.
///
/// Each variant names the offending node(s); the session maps findings
/// to localized user messages.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    /// A node's parameter text failed to parse as JSON.
    #[error("node {slug}: parameters do not parse: {detail}")]
    #[diagnostic(
        code(draftloom::validate::parameter_parse),
        help("Fix the node's parameter JSON before the workflow can be saved.")
    )]
    ParameterParse { slug: String, detail: String },

    /// A condition node needs at least two enabled outgoing edges.
    #[error("condition node {slug} has {outgoing} enabled outgoing edge(s), needs at least 2")]
    #[diagnostic(code(draftloom::validate::condition_fan_out))]
    ConditionFanOut { slug: String, outgoing: usize },

    /// More than one outgoing edge claims the default branch.
    #[error("condition node {slug} has more than one default branch")]
    #[diagnostic(code(draftloom::validate::duplicate_default))]
    DuplicateDefaultBranch { slug: String },

    /// Two sibling edges share a normalized condition string.
    #[error("condition node {slug} has duplicate branch condition {condition:?}")]
    #[diagnostic(code(draftloom::validate::duplicate_branch))]
    DuplicateBranchCondition { slug: String, condition: String },

    /// A parallel split must name an existing join.
    #[error("parallel split {split} does not reference a valid join")]
    #[diagnostic(
        code(draftloom::validate::split_missing_join),
        help("Set the split's join parameter to the slug of a parallel_join node.")
    )]
    SplitMissingJoin { split: String },

    /// The referenced join slug resolves to a node of another kind.
    #[error("parallel split {split} references {join}, which is not a parallel_join")]
    #[diagnostic(code(draftloom::validate::split_join_kind))]
    SplitJoinWrongKind { split: String, join: String },

    /// A join needs at least two active incoming edges.
    #[error("parallel join {join} has {incoming} active incoming edge(s), needs at least 2")]
    #[diagnostic(code(draftloom::validate::join_fan_in))]
    JoinUnderSubscribed { join: String, incoming: usize },

    /// Each join may be referenced by exactly one split.
    #[error("parallel join {join} is referenced by more than one split")]
    #[diagnostic(code(draftloom::validate::join_shared))]
    JoinSharedBySplits { join: String },

    /// A split's declared branch list must match its enabled fan-out.
    #[error("parallel split {split} declares {branches} branch(es) but has {outgoing} enabled outgoing edge(s)")]
    #[diagnostic(code(draftloom::validate::branch_cardinality))]
    SplitBranchCardinality {
        split: String,
        branches: usize,
        outgoing: usize,
    },
}

/// Run all structural checks against the graph.
///
/// Returns every finding rather than the first, so the editor can
/// surface them inline per node. An empty vec means the graph may be
/// saved (parameter parse errors are tracked separately by the session,
/// since they live in staged form-field text rather than in the graph).
#[must_use]
pub fn validate_graph(graph: &Graph) -> Vec<ValidationError> {
    let mut findings = Vec::new();
    validate_condition_nodes(graph, &mut findings);
    validate_parallel_pairs(graph, &mut findings);
    findings
}

fn validate_condition_nodes(graph: &Graph, findings: &mut Vec<ValidationError>) {
    for node in graph.nodes.iter().filter(|n| n.is_enabled) {
        if node.kind != NodeKind::Condition {
            continue;
        }
        let outgoing: Vec<_> = graph.outgoing_active_edges(&node.slug).collect();
        if outgoing.len() < 2 {
            findings.push(ValidationError::ConditionFanOut {
                slug: node.slug.clone(),
                outgoing: outgoing.len(),
            });
        }

        let defaults = outgoing.iter().filter(|e| e.is_default_branch()).count();
        if defaults > 1 {
            findings.push(ValidationError::DuplicateDefaultBranch {
                slug: node.slug.clone(),
            });
        }

        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for edge in outgoing.iter().filter(|e| !e.is_default_branch()) {
            *seen.entry(edge.normalized_condition()).or_default() += 1;
        }
        let mut duplicates: Vec<_> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(condition, _)| condition)
            .collect();
        duplicates.sort();
        for condition in duplicates {
            findings.push(ValidationError::DuplicateBranchCondition {
                slug: node.slug.clone(),
                condition,
            });
        }
    }
}

fn validate_parallel_pairs(graph: &Graph, findings: &mut Vec<ValidationError>) {
    // join slug -> number of enabled splits referencing it
    let mut join_refs: FxHashMap<String, usize> = FxHashMap::default();

    for node in graph.nodes.iter().filter(|n| n.is_enabled) {
        if node.kind != NodeKind::ParallelSplit {
            continue;
        }
        let split = node.slug.clone();
        let Some(join_slug) = node.parameters.get("join").and_then(|v| v.as_str()) else {
            findings.push(ValidationError::SplitMissingJoin { split });
            continue;
        };
        if let Some(count) = join_refs.get_mut(join_slug) {
            *count += 1;
        } else {
            join_refs.insert(join_slug.to_string(), 1);
        }

        match graph.node(join_slug) {
            None => {
                findings.push(ValidationError::SplitMissingJoin { split });
                continue;
            }
            Some(join) if join.kind != NodeKind::ParallelJoin => {
                findings.push(ValidationError::SplitJoinWrongKind {
                    split,
                    join: join_slug.to_string(),
                });
                continue;
            }
            Some(_) => {}
        }

        let incoming = graph.incoming_active_edges(join_slug).count();
        if incoming < 2 {
            findings.push(ValidationError::JoinUnderSubscribed {
                join: join_slug.to_string(),
                incoming,
            });
        }

        let branches = node
            .parameters
            .get("branches")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);
        let outgoing = graph.outgoing_active_edges(&node.slug).count();
        if branches != outgoing {
            findings.push(ValidationError::SplitBranchCardinality {
                split: node.slug.clone(),
                branches,
                outgoing,
            });
        }
    }

    let mut shared: Vec<_> = join_refs
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(join, _)| join)
        .collect();
    shared.sort();
    for join in shared {
        findings.push(ValidationError::JoinSharedBySplits { join });
    }
}
