//! Series identifiers and tag derivation.
//!
//! # Responsibilities
//! - Build the series id for a flattened key
//! - Derive the tag set (entity, entity attributes, key, metric)
//! - Apply actuator-check rules: drop healthy `health.*.200` points, extract
//!   status code (`sc`), status group (`sg`) and `path`

use std::collections::{BTreeMap, HashSet};

use crate::config::TagConfig;
use crate::transform::sanitize::sanitize;

/// Prefix of every series id.
pub const SERIES_PREFIX: &str = "zmon.check.";

/// Entity attributes copied into tags when none are configured.
pub const DEFAULT_ENTITY_TAG_FIELDS: [&str; 10] = [
    "application_id",
    "application_version",
    "stack_name",
    "stack_version",
    "application",
    "version",
    "account_alias",
    "cluster_alias",
    "alias",
    "namespace",
];

/// Series id and tags for one flattened key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSeries {
    pub id: String,
    pub tags: BTreeMap<String, String>,
}

/// Tag derivation rules, fixed at startup.
#[derive(Debug, Clone)]
pub struct TagRules {
    entity_tag_fields: Vec<String>,
    actuator_checks: HashSet<i64>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl TagRules {
    /// An empty field list falls back to [`DEFAULT_ENTITY_TAG_FIELDS`].
    pub fn new(entity_tag_fields: Vec<String>, actuator_checks: Vec<i64>) -> Self {
        let entity_tag_fields = if entity_tag_fields.is_empty() {
            DEFAULT_ENTITY_TAG_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            entity_tag_fields
        };
        Self {
            entity_tag_fields,
            actuator_checks: actuator_checks.into_iter().collect(),
        }
    }

    pub fn from_config(config: &TagConfig) -> Self {
        Self::new(
            config.entity_tag_fields.clone(),
            config.actuator_metric_checks.clone(),
        )
    }

    pub fn is_actuator_check(&self, check_id: i64) -> bool {
        self.actuator_checks.contains(&check_id)
    }

    /// Derive series id and tags for `key`.
    ///
    /// Returns `None` when the point is suppressed.
    pub fn derive(
        &self,
        check_id: i64,
        key: &str,
        entity_id: &str,
        entity: &BTreeMap<String, String>,
    ) -> Option<DerivedSeries> {
        let actuator = self.is_actuator_check(check_id);
        let segments = key_segments(key);
        if actuator && is_healthy_endpoint(&segments) {
            return None;
        }

        let mut tags = BTreeMap::new();
        tags.insert("entity".to_string(), sanitize(entity_id));

        for field in &self.entity_tag_fields {
            if let Some(value) = entity.get(field).filter(|v| !v.is_empty()) {
                tags.insert(field.clone(), value.clone());
            }
        }

        if !key.is_empty() {
            tags.insert("key".to_string(), sanitize(key));
        }
        if let Some(metric) = metric_name(key) {
            tags.insert("metric".to_string(), sanitize(metric));
        }
        if actuator {
            add_actuator_tags(&segments, &mut tags);
        }

        Some(DerivedSeries {
            id: series_id(check_id, key),
            tags,
        })
    }
}

/// `zmon.check.<id>` or `zmon.check.<id>.<key>`.
pub fn series_id(check_id: i64, key: &str) -> String {
    if key.is_empty() {
        format!("{SERIES_PREFIX}{check_id}")
    } else {
        format!("{SERIES_PREFIX}{check_id}.{}", sanitize(key))
    }
}

/// Last non-empty dot segment of `key`.
pub fn metric_name(key: &str) -> Option<&str> {
    key.split('.').rev().find(|s| !s.is_empty())
}

/// Dot segments with trailing empty segments removed.
fn key_segments(key: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = key.split('.').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

/// `health.<anything>.200[...]`
fn is_healthy_endpoint(segments: &[&str]) -> bool {
    segments.len() >= 3 && segments[0] == "health" && segments[2] == "200"
}

fn add_actuator_tags(segments: &[&str], tags: &mut BTreeMap<String, String>) {
    let len = segments.len();
    if len < 3 {
        return;
    }

    let status_code = segments[len - 2];
    if let Some(group) = status_code.chars().next() {
        tags.insert("sc".to_string(), sanitize(status_code));
        tags.insert("sg".to_string(), sanitize(&group.to_string()));
    }

    if len >= 4 {
        tags.insert("path".to_string(), sanitize(&segments[..len - 2].join(".")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_series_id() {
        assert_eq!(series_id(42, ""), "zmon.check.42");
        assert_eq!(series_id(42, "cpu.p99"), "zmon.check.42.cpu.p99");
        assert_eq!(series_id(42, "db[0]"), "zmon.check.42.db_0_");
    }

    #[test]
    fn test_metric_name() {
        assert_eq!(metric_name(""), None);
        assert_eq!(metric_name("latency"), Some("latency"));
        assert_eq!(metric_name("a.b.count"), Some("count"));
        assert_eq!(metric_name("a.b."), Some("b"));
        assert_eq!(metric_name("..."), None);
    }

    #[test]
    fn test_basic_tags() {
        let rules = TagRules::default();
        let attrs = entity(&[
            ("application_id", "shop"),
            ("stack_name", ""),
            ("team", "ignored"),
        ]);
        let series = rules.derive(1, "mem.used", "host:8080", &attrs).unwrap();

        assert_eq!(series.id, "zmon.check.1.mem.used");
        assert_eq!(
            series.tags,
            entity(&[
                ("entity", "host_8080"),
                ("application_id", "shop"),
                ("key", "mem.used"),
                ("metric", "used"),
            ])
        );
    }

    #[test]
    fn test_empty_key_has_no_key_or_metric() {
        let series = TagRules::default()
            .derive(5, "", "e", &BTreeMap::new())
            .unwrap();
        assert_eq!(series.id, "zmon.check.5");
        assert_eq!(series.tags, entity(&[("entity", "e")]));
    }

    #[test]
    fn test_configured_fields_replace_defaults() {
        let rules = TagRules::new(vec!["team".into()], vec![]);
        let attrs = entity(&[("team", "zmon"), ("application_id", "shop")]);
        let series = rules.derive(1, "x", "e", &attrs).unwrap();
        assert_eq!(series.tags.get("team").map(String::as_str), Some("zmon"));
        assert!(!series.tags.contains_key("application_id"));
    }

    #[test]
    fn test_attribute_values_copied_unchanged() {
        let attrs = entity(&[("alias", "a=b")]);
        let series = TagRules::default().derive(1, "x", "e", &attrs).unwrap();
        assert_eq!(series.tags["alias"], "a=b");
    }

    #[test]
    fn test_healthy_endpoints_suppressed_for_actuator_checks() {
        let rules = TagRules::new(vec![], vec![7]);
        let attrs = BTreeMap::new();
        for key in ["health.GET.200.count", "health.x.200", "health..200.m1_rate"] {
            assert!(rules.derive(7, key, "e", &attrs).is_none(), "{key}");
        }
        assert!(rules.derive(7, "health.GET.503.count", "e", &attrs).is_some());
        // Not on the allow-list: kept.
        assert!(rules.derive(8, "health.GET.200.count", "e", &attrs).is_some());
    }

    #[test]
    fn test_status_code_extraction() {
        let rules = TagRules::new(vec![], vec![7]);
        let series = rules
            .derive(7, "api.orders.GET.404.count", "e", &BTreeMap::new())
            .unwrap();
        assert_eq!(series.tags["sc"], "404");
        assert_eq!(series.tags["sg"], "4");
        assert_eq!(series.tags["path"], "api.orders.GET");

        let short = rules.derive(7, "GET.500.count", "e", &BTreeMap::new()).unwrap();
        assert_eq!(short.tags["sc"], "500");
        assert_eq!(short.tags["sg"], "5");
        assert!(!short.tags.contains_key("path"));

        let two = rules.derive(7, "500.count", "e", &BTreeMap::new()).unwrap();
        assert!(!two.tags.contains_key("sc"));
    }

    #[test]
    fn test_status_group_is_first_char_of_status_code() {
        let rules = TagRules::new(vec![], vec![3]);
        let keys = [
            "a.b.c",
            "x.y.201.m1",
            "p.q.r.s.t.u",
            "root.GET.302.p99.",
            "health.GET.500.count",
        ];
        for key in keys {
            let series = rules.derive(3, key, "e", &BTreeMap::new()).unwrap();
            let sc = &series.tags["sc"];
            let sg = &series.tags["sg"];
            assert_eq!(sc.chars().next().map(String::from).as_ref(), Some(sg), "{key}");
        }
    }

    #[test]
    fn test_actuator_tags_not_added_for_other_checks() {
        let series = TagRules::new(vec![], vec![3])
            .derive(4, "a.GET.200.count", "e", &BTreeMap::new())
            .unwrap();
        assert!(!series.tags.contains_key("sc"));
        assert!(!series.tags.contains_key("sg"));
        assert!(!series.tags.contains_key("path"));
    }
}
