use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// NodeMetric tells koordlet how to collect and report node and pod usage.
/// The status part is owned by koordlet and never written from here.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(group = "slo.koordinator.sh", version = "v1alpha1", kind = "NodeMetric")]
#[serde(rename_all = "camelCase")]
pub struct NodeMetricSpec {
    /// CollectPolicy defines the Metric collection policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_collect_policy: Option<NodeMetricCollectPolicy>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetricCollectPolicy {
    /// AggregateDurationSeconds represents the aggregation period in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_duration_seconds: Option<i64>,
    /// ReportIntervalSeconds represents the report period in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_interval_seconds: Option<i64>,
    /// NodeAggregatePolicy represents the target grain of node aggregated usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_aggregate_policy: Option<AggregatePolicy>,
    /// NodeMemoryPolicy represents apply which method collect memory info
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_memory_collect_policy: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePolicy {
    /// Durations such as `5m`, `10m`, `30m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<String>>,
}
