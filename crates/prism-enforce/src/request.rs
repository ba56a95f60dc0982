//! The outbound query model and its GraphQL rendering.
//!
//! A [`QueryRequest`] is constructed per call, passed through the enforcer,
//! and consumed once by the executor. The create-query document only declares
//! the argument kinds the request actually uses, so the backend never sees
//! null placeholders for absent inputs.

use serde::{Deserialize, Serialize};

use crate::clause::FilterClause;

/// A metric by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricInput {
    pub name: String,
}

impl MetricInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Time interval represented by a single point of a time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeGrain {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    /// Lowercase label used when suffixing dimension names.
    pub fn label(&self) -> &'static str {
        match self {
            TimeGrain::Hour => "hour",
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        }
    }
}

/// A grouping dimension, with a grain when it is a time dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByInput {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<TimeGrain>,
}

impl GroupByInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grain: None,
        }
    }

    pub fn with_grain(name: impl Into<String>, grain: TimeGrain) -> Self {
        Self {
            name: name.into(),
            grain: Some(grain),
        }
    }

    /// `name__grain` when a grain is set, otherwise the bare name.
    pub fn qualified_name(&self) -> String {
        match self.grain {
            Some(grain) => format!("{}__{}", self.name, grain.label()),
            None => self.name.clone(),
        }
    }
}

/// An ordering over exactly one metric or one grouping.
///
/// The one-of constraint is enforced by the constructors and re-checked on
/// deserialization; there is no way to obtain an `OrderByInput` with both or
/// neither set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderByInputWire")]
pub struct OrderByInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    metric: Option<MetricInput>,

    #[serde(rename = "groupBy", skip_serializing_if = "Option::is_none")]
    group_by: Option<GroupByInput>,

    #[serde(skip_serializing_if = "is_false")]
    descending: bool,
}

/// Unvalidated wire form of [`OrderByInput`].
#[derive(Deserialize)]
struct OrderByInputWire {
    #[serde(default)]
    metric: Option<MetricInput>,

    #[serde(default, rename = "groupBy")]
    group_by: Option<GroupByInput>,

    #[serde(default)]
    descending: bool,
}

impl TryFrom<OrderByInputWire> for OrderByInput {
    type Error = String;

    fn try_from(wire: OrderByInputWire) -> Result<Self, Self::Error> {
        match (&wire.metric, &wire.group_by) {
            (Some(_), Some(_)) => Err("only one of metric or groupBy is allowed".to_string()),
            (None, None) => Err("either metric or groupBy is required".to_string()),
            _ => Ok(Self {
                metric: wire.metric,
                group_by: wire.group_by,
                descending: wire.descending,
            }),
        }
    }
}

impl OrderByInput {
    pub fn metric(name: impl Into<String>) -> Self {
        Self {
            metric: Some(MetricInput::new(name)),
            group_by: None,
            descending: false,
        }
    }

    pub fn group_by(input: GroupByInput) -> Self {
        Self {
            metric: None,
            group_by: Some(input),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Sort key rendering, `-` prefixed when descending.
    pub fn sort_key(&self) -> String {
        let name = match (&self.metric, &self.group_by) {
            (Some(metric), _) => metric.name.clone(),
            (None, Some(group)) => group.qualified_name(),
            (None, None) => unreachable!("constructors guarantee one of metric/group_by"),
        };
        if self.descending {
            format!("-{name}")
        } else {
            name
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A complete outbound query: metrics, groupings, filters, ordering, limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub metrics: Vec<MetricInput>,

    #[serde(default)]
    pub group_by: Vec<GroupByInput>,

    #[serde(default)]
    pub filters: Vec<FilterClause>,

    #[serde(default)]
    pub order_by: Vec<OrderByInput>,

    #[serde(default)]
    pub limit: Option<u64>,
}

/// GraphQL argument declarations per input kind: (variables key, declaration).
const GQL_INPUTS: &[(&str, &str)] = &[
    ("metrics", "[MetricInput!]!"),
    ("groupBy", "[GroupByInput!]"),
    ("where", "[WhereInput!]"),
    ("orderBy", "[OrderByInput!]"),
    ("limit", "Int"),
];

impl QueryRequest {
    pub fn new(metrics: impl IntoIterator<Item = MetricInput>) -> Self {
        Self {
            metrics: metrics.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_group_by(mut self, group_by: impl IntoIterator<Item = GroupByInput>) -> Self {
        self.group_by = group_by.into_iter().collect();
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterClause>) -> Self {
        self.filters = filters.into_iter().collect();
        self
    }

    pub fn with_order_by(mut self, order_by: impl IntoIterator<Item = OrderByInput>) -> Self {
        self.order_by = order_by.into_iter().collect();
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name.as_str()).collect()
    }

    /// Grouping names with grain suffixes applied.
    pub fn dimension_names(&self) -> Vec<String> {
        self.group_by.iter().map(GroupByInput::qualified_name).collect()
    }

    /// Which GraphQL input kinds this request uses.
    fn used_inputs(&self) -> Vec<&'static str> {
        GQL_INPUTS
            .iter()
            .map(|(key, _)| *key)
            .filter(|key| match *key {
                "metrics" => !self.metrics.is_empty(),
                "groupBy" => !self.group_by.is_empty(),
                "where" => !self.filters.is_empty(),
                "orderBy" => !self.order_by.is_empty(),
                "limit" => self.limit.is_some(),
                _ => false,
            })
            .collect()
    }

    /// Assemble the create-query document for this request.
    ///
    /// The argument list always carries `$environmentId` plus the inputs the
    /// request uses, nothing else.
    pub fn document(&self) -> String {
        let used = self.used_inputs();

        let mut arguments = vec!["$environmentId: BigInt!".to_string()];
        let mut bindings = vec!["environmentId: $environmentId".to_string()];
        for (key, declaration) in GQL_INPUTS {
            if used.contains(key) {
                arguments.push(format!("${key}: {declaration}"));
                bindings.push(format!("{key}: ${key}"));
            }
        }

        format!(
            "mutation CreateQuery({}) {{\n  createQuery({}) {{\n    queryId\n  }}\n}}",
            arguments.join(", "),
            bindings.join(", "),
        )
    }

    /// The variables object matching [`document`](Self::document).
    ///
    /// `environmentId` is merged in later by the executor from the active
    /// connection descriptor.
    pub fn variables(&self) -> serde_json::Value {
        let mut variables = serde_json::Map::new();
        for key in self.used_inputs() {
            let value = match key {
                "metrics" => serde_json::to_value(&self.metrics),
                "groupBy" => serde_json::to_value(&self.group_by),
                "where" => serde_json::to_value(&self.filters),
                "orderBy" => serde_json::to_value(&self.order_by),
                "limit" => serde_json::to_value(self.limit),
                _ => continue,
            };
            // All request fields are plain data; serialization cannot fail.
            if let Ok(value) = value {
                variables.insert(key.to_string(), value);
            }
        }
        serde_json::Value::Object(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> QueryRequest {
        QueryRequest::new([MetricInput::new("total_claim_amount")])
            .with_group_by([GroupByInput::with_grain("metric_time", TimeGrain::Month)])
            .with_filters([FilterClause::identity("alice@acme.com")])
            .with_order_by([OrderByInput::group_by(GroupByInput::with_grain(
                "metric_time",
                TimeGrain::Month,
            ))
            .descending()])
            .with_limit(12)
    }

    #[test]
    fn document_declares_only_used_inputs() {
        let doc = QueryRequest::new([MetricInput::new("total_claims")]).document();
        assert!(doc.contains("$environmentId: BigInt!"));
        assert!(doc.contains("$metrics: [MetricInput!]!"));
        assert!(!doc.contains("$groupBy"));
        assert!(!doc.contains("$where"));
        assert!(!doc.contains("$orderBy"));
        assert!(!doc.contains("$limit"));
    }

    #[test]
    fn document_declares_all_used_inputs() {
        let doc = request().document();
        for declaration in [
            "$metrics: [MetricInput!]!",
            "$groupBy: [GroupByInput!]",
            "$where: [WhereInput!]",
            "$orderBy: [OrderByInput!]",
            "$limit: Int",
        ] {
            assert!(doc.contains(declaration), "missing {declaration} in {doc}");
        }
        assert!(doc.contains("where: $where"));
    }

    #[test]
    fn variables_match_wire_shape() {
        let variables = request().variables();
        assert_eq!(
            variables,
            json!({
                "metrics": [{ "name": "total_claim_amount" }],
                "groupBy": [{ "name": "metric_time", "grain": "MONTH" }],
                "where": [{ "sql": "{{ Dimension('member__email') }} = 'alice@acme.com'" }],
                "orderBy": [{ "groupBy": { "name": "metric_time", "grain": "MONTH" }, "descending": true }],
                "limit": 12,
            })
        );
    }

    #[test]
    fn ascending_order_omits_descending_flag() {
        let order = OrderByInput::metric("total_claims");
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value, json!({ "metric": { "name": "total_claims" } }));
        assert_eq!(order.sort_key(), "total_claims");
    }

    #[test]
    fn dimension_names_carry_grain_suffix() {
        assert_eq!(request().dimension_names(), vec!["metric_time__month"]);
        assert_eq!(
            GroupByInput::new("member__state").qualified_name(),
            "member__state"
        );
    }

    #[test]
    fn order_by_rejects_both_and_neither() {
        let both = json!({
            "metric": { "name": "total_claims" },
            "groupBy": { "name": "metric_time" }
        });
        assert!(serde_json::from_value::<OrderByInput>(both).is_err());

        let neither = json!({ "descending": true });
        assert!(serde_json::from_value::<OrderByInput>(neither).is_err());

        let valid = json!({ "metric": { "name": "total_claims" }, "descending": true });
        let parsed: OrderByInput = serde_json::from_value(valid).unwrap();
        assert_eq!(parsed.sort_key(), "-total_claims");
    }

    #[test]
    fn sort_key_prefixes_descending() {
        let order = OrderByInput::group_by(GroupByInput::with_grain(
            "metric_time",
            TimeGrain::Day,
        ))
        .descending();
        assert_eq!(order.sort_key(), "-metric_time__day");
    }
}
