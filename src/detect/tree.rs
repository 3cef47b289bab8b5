//! Typed view of a nested metrics document.
//!
//! A JSON object holding both `value` and `severity` is a leaf. Any other
//! object is a group of named children. Strings, numbers and arrays are kept
//! as opaque scalars and carry no severity.

use serde_json::{Map, Value};

use super::{DetectError, Severity};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricLeaf {
    pub value: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricNode {
    Group(MetricTree),
    Leaf(MetricLeaf),
    Scalar,
}

/// Named children in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTree {
    entries: Vec<(String, MetricNode)>,
}

impl MetricTree {
    pub fn parse(map: &Map<String, Value>) -> Result<Self, DetectError> {
        let mut path = Vec::new();
        Self::parse_at(map, &mut path)
    }

    fn parse_at(map: &Map<String, Value>, path: &mut Vec<String>) -> Result<Self, DetectError> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            path.push(key.clone());
            let node = parse_node(value, path)?;
            path.pop();
            entries.push((key.clone(), node));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, MetricNode)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&MetricNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Follow `path` through nested groups to a leaf.
    pub fn leaf(&self, path: &[&str]) -> Option<&MetricLeaf> {
        let (last, groups) = path.split_last()?;
        let mut tree = self;
        for key in groups {
            match tree.get(key)? {
                MetricNode::Group(inner) => tree = inner,
                _ => return None,
            }
        }
        match tree.get(last)? {
            MetricNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

fn parse_node(value: &Value, path: &mut Vec<String>) -> Result<MetricNode, DetectError> {
    let Value::Object(map) = value else {
        return Ok(MetricNode::Scalar);
    };

    let Some(raw_severity) = map.get("severity") else {
        return MetricTree::parse_at(map, path).map(MetricNode::Group);
    };

    let severity = match raw_severity.as_str() {
        Some(label) => label.parse::<Severity>().map_err(|_| DetectError::UnknownSeverity {
            path: path.join("."),
            label: label.to_string(),
        })?,
        None => {
            return Err(DetectError::UnknownSeverity {
                path: path.join("."),
                label: raw_severity.to_string(),
            })
        }
    };

    match map.get("value") {
        Some(raw_value) => {
            let value = raw_value.as_f64().ok_or_else(|| DetectError::MalformedLeaf {
                path: path.join("."),
                reason: format!("`value` is not a number: {}", raw_value),
            })?;
            Ok(MetricNode::Leaf(MetricLeaf { value, severity }))
        }
        // A labelled object without a value is still a group.
        None => MetricTree::parse_at(map, path).map(MetricNode::Group),
    }
}

/// A validated metrics document for one service.
#[derive(Debug, Clone)]
pub struct MetricsDocument {
    pub service: String,
    pub tree: MetricTree,
    /// The document exactly as it was read.
    pub raw: Value,
}

impl MetricsDocument {
    pub fn from_value(raw: Value) -> Result<Self, DetectError> {
        let map = raw.as_object().ok_or(DetectError::NotAnObject)?;
        let service = map
            .get("service")
            .and_then(Value::as_str)
            .ok_or(DetectError::MissingService)?
            .to_string();
        let tree = MetricTree::parse(map)?;
        Ok(Self { service, tree, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_and_group_classification() {
        let doc = MetricsDocument::from_value(json!({
            "service": "auth-service",
            "compute": {
                "cpu_percent": { "value": 93.5, "severity": "CRITICAL" },
                "memory": { "rss_mb": { "value": 512, "severity": "LOW" } }
            }
        }))
        .unwrap();

        assert_eq!(doc.service, "auth-service");
        assert!(matches!(doc.tree.get("service"), Some(MetricNode::Scalar)));
        let cpu = doc.tree.leaf(&["compute", "cpu_percent"]).unwrap();
        assert_eq!(cpu.value, 93.5);
        assert_eq!(cpu.severity, Severity::Critical);
        let rss = doc.tree.leaf(&["compute", "memory", "rss_mb"]).unwrap();
        assert_eq!(rss.severity, Severity::Low);
        assert!(doc.tree.leaf(&["compute"]).is_none());
        assert!(doc.tree.leaf(&["compute", "missing"]).is_none());
    }

    #[test]
    fn test_document_order_is_preserved() {
        let doc = MetricsDocument::from_value(json!({
            "service": "svc",
            "zeta": { "value": 1, "severity": "LOW" },
            "alpha": { "value": 2, "severity": "LOW" }
        }))
        .unwrap();
        let keys: Vec<&str> = doc.tree.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["service", "zeta", "alpha"]);
    }

    #[test]
    fn test_unknown_severity_is_rejected_with_path() {
        let err = MetricsDocument::from_value(json!({
            "service": "svc",
            "traffic": { "rps": { "value": 10, "severity": "SEVERE" } }
        }))
        .unwrap_err();
        match err {
            DetectError::UnknownSeverity { path, label } => {
                assert_eq!(path, "traffic.rps");
                assert_eq!(label, "SEVERE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_severity_without_value_is_rejected() {
        let err = MetricsDocument::from_value(json!({
            "service": "svc",
            "disk": { "severity": "BAD" }
        }))
        .unwrap_err();
        assert!(matches!(err, DetectError::UnknownSeverity { .. }));
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        let err = MetricsDocument::from_value(json!({
            "service": "svc",
            "cpu": { "value": "high", "severity": "HIGH" }
        }))
        .unwrap_err();
        assert!(matches!(err, DetectError::MalformedLeaf { .. }));
    }

    #[test]
    fn test_missing_service_and_non_object_root() {
        assert!(matches!(
            MetricsDocument::from_value(json!({ "cpu": { "value": 1, "severity": "LOW" } })),
            Err(DetectError::MissingService)
        ));
        assert!(matches!(
            MetricsDocument::from_value(json!([1, 2, 3])),
            Err(DetectError::NotAnObject)
        ));
    }
}
