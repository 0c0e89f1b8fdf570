use super::CrdKind;
use crate::api::v1alpha1::nodemetric_api::NodeMetric;
use crate::framework::{Attribute, ElementType, Validator};

impl CrdKind for NodeMetric {
    const TYPE_NAME: &'static str = "slo_koordinator_sh_node_metric_v1alpha1";
    const NAMESPACED: bool = false;
    const DESCRIPTION: &'static str = "NodeMetric is the Schema for the nodemetrics API";

    fn spec_attributes() -> Vec<Attribute> {
        vec![Attribute::single_nested(
            "metric_collect_policy",
            vec![
                Attribute::int64("aggregate_duration_seconds")
                    .optional()
                    .validator(Validator::Int64AtLeast(0))
                    .describe("AggregateDurationSeconds represents the aggregation period in seconds"),
                Attribute::int64("report_interval_seconds")
                    .optional()
                    .validator(Validator::Int64AtLeast(0))
                    .describe("ReportIntervalSeconds represents the report period in seconds"),
                Attribute::single_nested(
                    "node_aggregate_policy",
                    vec![Attribute::list("durations", ElementType::String).optional()],
                )
                .optional()
                .describe("NodeAggregatePolicy represents the target grain of node aggregated usage"),
                Attribute::string("node_memory_collect_policy")
                    .optional()
                    .validator(Validator::StringOneOf(vec![
                        "usageWithHotPageCache",
                        "usageWithoutPageCache",
                        "usageWithPageCache",
                    ]))
                    .describe("NodeMemoryPolicy represents apply which method collect memory info"),
            ],
        )
        .optional()
        .describe("CollectPolicy defines the Metric collection policy")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::convert::validate_config;
    use crate::framework::Diagnostics;
    use crate::kinds::testing::assert_matches_crd;
    use serde_json::json;

    #[test]
    fn attributes_match_the_crd() {
        assert_matches_crd::<NodeMetric>();
    }

    #[test]
    fn memory_collect_policy_is_an_enum() {
        let attrs = NodeMetric::spec_attributes();
        let mut diags = Diagnostics::new();
        validate_config(
            &attrs,
            &json!({"metric_collect_policy": {"node_memory_collect_policy": "usageWithPageCache"}}),
            &mut diags,
        );
        assert!(diags.is_empty());

        validate_config(
            &attrs,
            &json!({"metric_collect_policy": {"node_memory_collect_policy": "rss", "report_interval_seconds": -1}}),
            &mut diags,
        );
        assert_eq!(diags.len(), 2);
    }
}
