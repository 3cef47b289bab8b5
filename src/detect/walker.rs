use super::tree::{MetricNode, MetricTree};
use super::Severity;

/// Result of walking a metric tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutcome {
    /// Highest severity seen, `None` when the tree has no leaves.
    pub max: Option<Severity>,
    pub leaves: usize,
    /// One entry per leaf at or above the incident threshold, in traversal order.
    pub symptoms: Vec<String>,
}

/// Depth-first walk in document order.
pub fn walk(tree: &MetricTree) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut path = Vec::new();
    walk_into(tree, &mut path, &mut outcome);
    outcome
}

fn walk_into<'a>(tree: &'a MetricTree, path: &mut Vec<&'a str>, outcome: &mut WalkOutcome) {
    for (key, node) in tree.entries() {
        path.push(key.as_str());
        match node {
            MetricNode::Leaf(leaf) => {
                outcome.leaves += 1;
                outcome.max = outcome.max.max(Some(leaf.severity));
                if leaf.severity.is_incident() {
                    outcome
                        .symptoms
                        .push(format!("{} is {}", readable_path(path), leaf.severity));
                }
            }
            MetricNode::Group(inner) => walk_into(inner, path, outcome),
            MetricNode::Scalar => {}
        }
        path.pop();
    }
}

/// `["latency", "latency_ms_p95"]` becomes `"Latency Latency Ms P95"`.
pub fn readable_path(path: &[&str]) -> String {
    title_case(&path.join(" ").replace('_', " "))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
