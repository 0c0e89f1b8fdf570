use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::gen::SchemaGenerator;
use schemars::schema::{Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// NodeSLO is the koordinator per-node service level objective: resource
/// thresholds, QoS knobs per class and burst settings applied by koordlet.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(group = "slo.koordinator.sh", version = "v1alpha1", kind = "NodeSLO")]
#[serde(rename_all = "camelCase")]
pub struct NodeSLOSpec {
    /// BE pods will be limited if node resource usage overload
    #[serde(rename = "resourceUsedThresholdWithBE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_used_threshold_with_be: Option<ResourceThresholdStrategy>,
    /// QoS config strategy for pods of different qos-class
    #[serde(rename = "resourceQOSStrategy")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_qos_strategy: Option<ResourceQOSStrategy>,
    /// CPU Burst Strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_burst_strategy: Option<CPUBurstStrategy>,
    /// node global system config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_strategy: Option<SystemStrategy>,
    /// Third party extensions for NodeSLO
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<BTreeMap<String, Value>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceThresholdStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// upper: cpu suppress threshold percentage (0,100), default = 65
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_suppress_threshold_percent: Option<i64>,
    /// cpuset (default) or cfsQuota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_suppress_policy: Option<String>,
    /// upper: memory evict threshold percentage (0,100), default = 70
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_evict_threshold_percent: Option<i64>,
    /// lower: memory release util usage under MemoryEvictLowerPercent, default = MemoryEvictThresholdPercent - 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_evict_lower_percent: Option<i64>,
    #[serde(rename = "cpuEvictBESatisfactionUpperPercent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_evict_be_satisfaction_upper_percent: Option<i64>,
    #[serde(rename = "cpuEvictBESatisfactionLowerPercent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_evict_be_satisfaction_lower_percent: Option<i64>,
    #[serde(rename = "cpuEvictBEUsageThresholdPercent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_evict_be_usage_threshold_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_evict_time_window_seconds: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQOSStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<ResourceQOSPolicies>,
    /// ResourceQOS for LSR pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsr_class: Option<ResourceQOS>,
    /// ResourceQOS for LS pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ls_class: Option<ResourceQOS>,
    /// ResourceQOS for BE pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub be_class: Option<ResourceQOS>,
    /// ResourceQOS for system pods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_class: Option<ResourceQOS>,
    /// ResourceQOS for root cgroup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_root: Option<ResourceQOS>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQOSPolicies {
    /// groupIdentity (default) or coreSched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_policy: Option<String>,
    /// tc or terway-qos
    #[serde(rename = "netQOSPolicy")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_qos_policy: Option<String>,
}

/// The same set of knobs exists once per QoS class.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct ResourceQOS {
    #[serde(rename = "cpuQOS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_qos: Option<CPUQOSCfg>,
    #[serde(rename = "memoryQOS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_qos: Option<MemoryQOSCfg>,
    #[serde(rename = "blkioQOS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blkio_qos: Option<BlkioQOSCfg>,
    #[serde(rename = "resctrlQOS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resctrl_qos: Option<ResctrlQOSCfg>,
    #[serde(rename = "networkQOS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_qos: Option<NetworkQOSCfg>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CPUQOSCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// group identity value for pods, default = 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_identity: Option<i64>,
    /// cpu.idle value for pods, default = 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sched_idle: Option<i64>,
    /// whether pods of the QoS class can expel the cgroup idle pods at the SMT-level. default = false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_expeller: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryQOSCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_limit_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_limit_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttling_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmark_ratio: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmark_scale_permill: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmark_min_adj: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_enable: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oom_kill_group: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlkioQOSCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<BlockCfg>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// device, podvolume or volumegroup
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_cfg: Option<IOCfg>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IOCfg {
    /// Throttling of weight, unit: percentage, 1 ~ 100, default = 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_weight_percent: Option<i64>,
    #[serde(rename = "readIOPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_iops: Option<i64>,
    #[serde(rename = "writeIOPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_iops: Option<i64>,
    #[serde(rename = "readBPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_bps: Option<i64>,
    #[serde(rename = "writeBPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_bps: Option<i64>,
    /// Configure the weight-based throttling target latency, in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_latency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_latency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_user_model: Option<bool>,
    #[serde(rename = "modelReadBPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_read_bps: Option<i64>,
    #[serde(rename = "modelWriteBPS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_write_bps: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResctrlQOSCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// LLC available range start for pods by percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat_range_start_percent: Option<i64>,
    /// LLC available range end for pods by percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat_range_end_percent: Option<i64>,
    /// MBA percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mba_percent: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQOSCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[schemars(schema_with = "int_or_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_request: Option<IntOrString>,
    #[schemars(schema_with = "int_or_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_limit: Option<IntOrString>,
    #[schemars(schema_with = "int_or_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_request: Option<IntOrString>,
    #[schemars(schema_with = "int_or_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_limit: Option<IntOrString>,
}

/// Bandwidth given either as a plain number or a quantity string such as `100M`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

fn int_or_string(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject::default();
    schema
        .extensions
        .insert("x-kubernetes-int-or-string".to_string(), Value::Bool(true));
    Schema::Object(schema)
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CPUBurstStrategy {
    /// none, cpuBurstOnly, cfsQuotaBurstOnly or auto
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// cpu burst percentage for setting cpu.cfs_burst_us, legal range: [0, +inf), default = 1000
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_burst_percent: Option<i64>,
    /// pod cfs quota scale up ceil percentage, default = 300 (300%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfs_quota_burst_percent: Option<i64>,
    /// specifies a period of time for pod can use at burst, default = -1 (unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfs_quota_burst_period_seconds: Option<i64>,
    /// scale down cfs quota if node cpu overload, default = 50
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_pool_threshold_percent: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStrategy {
    /// for /proc/sys/vm/min_free_kbytes, min_free_kbytes = minFreeKbytesFactor * nodeTotalMemory / 10000
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_free_kbytes_factor: Option<i64>,
    /// /proc/sys/vm/watermark_scale_factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark_scale_factor: Option<i64>,
    /// /sys/kernel/mm/memcg_reaper/reap_background
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memcg_reap_back_ground: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;
    use serde_json::json;

    #[test]
    fn cluster_scoped_identity() {
        assert_eq!(NodeSLO::api_version(&()), "slo.koordinator.sh/v1alpha1");
        assert_eq!(NodeSLO::plural(&()), "nodeslos");
    }

    #[test]
    fn decodes_upstream_field_names() {
        let slo: NodeSLO = serde_json::from_value(json!({
            "apiVersion": "slo.koordinator.sh/v1alpha1",
            "kind": "NodeSLO",
            "metadata": {"name": "node-a"},
            "spec": {
                "resourceUsedThresholdWithBE": {"enable": true, "cpuSuppressThresholdPercent": 65},
                "resourceQOSStrategy": {
                    "beClass": {
                        "cpuQOS": {"groupIdentity": -1},
                        "blkioQOS": {"blocks": [{"type": "device", "ioCfg": {"readIOPS": 512}}]},
                        "networkQOS": {"ingressLimit": "100M", "egressLimit": 50}
                    }
                }
            }
        }))
        .unwrap();

        let threshold = slo.spec.resource_used_threshold_with_be.unwrap();
        assert_eq!(threshold.cpu_suppress_threshold_percent, Some(65));
        let be = slo.spec.resource_qos_strategy.unwrap().be_class.unwrap();
        assert_eq!(be.cpu_qos.unwrap().group_identity, Some(-1));
        let block = &be.blkio_qos.unwrap().blocks.unwrap()[0];
        assert_eq!(block.type_.as_deref(), Some("device"));
        assert_eq!(block.io_cfg.as_ref().unwrap().read_iops, Some(512));
        let net = be.network_qos.unwrap();
        assert_eq!(net.ingress_limit, Some(IntOrString::String("100M".to_string())));
        assert_eq!(net.egress_limit, Some(IntOrString::Int(50)));
    }
}
