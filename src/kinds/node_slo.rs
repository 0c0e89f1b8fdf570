use super::CrdKind;
use crate::api::v1alpha1::nodeslo_api::NodeSLO;
use crate::framework::validators::int64_between;
use crate::framework::{Attribute, Validator};

impl CrdKind for NodeSLO {
    const TYPE_NAME: &'static str = "slo_koordinator_sh_node_slo_v1alpha1";
    const NAMESPACED: bool = false;
    const DESCRIPTION: &'static str = "NodeSLO is the Schema for the nodeslos API";

    fn spec_attributes() -> Vec<Attribute> {
        vec![
            resource_threshold_strategy(),
            resource_qos_strategy(),
            cpu_burst_strategy(),
            system_strategy(),
            Attribute::dynamic("extensions")
                .optional()
                .describe("Third party extensions for NodeSLO"),
        ]
    }
}

fn percent(name: &'static str) -> Attribute {
    Attribute::int64(name).optional().validators(int64_between(0, 100))
}

fn resource_threshold_strategy() -> Attribute {
    Attribute::single_nested(
        "resource_used_threshold_with_be",
        vec![
            Attribute::bool("enable").optional().describe("whether the strategy is enabled, default = false"),
            percent("cpu_suppress_threshold_percent")
                .describe("cpu suppress threshold percentage (0,100), default = 65"),
            Attribute::string("cpu_suppress_policy")
                .optional()
                .validator(Validator::StringOneOf(vec!["cpuset", "cfsQuota"]))
                .describe("CPUSuppressPolicy"),
            percent("memory_evict_threshold_percent")
                .describe("upper: memory evict threshold percentage (0,100), default = 70"),
            percent("memory_evict_lower_percent")
                .describe("lower: memory release util usage under MemoryEvictLowerPercent, default = MemoryEvictThresholdPercent - 2"),
            Attribute::int64("cpu_evict_be_satisfaction_upper_percent")
                .json("cpuEvictBESatisfactionUpperPercent")
                .optional()
                .validators(int64_between(0, 60))
                .describe("be.satisfactionRate = be.CPURealLimit/be.CPURequest; be.cpuUsage = be.CPUUsed/be.CPURealLimit if be.satisfactionRate > CPUEvictBESatisfactionUpperPercent/100, then stop to evict."),
            Attribute::int64("cpu_evict_be_satisfaction_lower_percent")
                .json("cpuEvictBESatisfactionLowerPercent")
                .optional()
                .validators(int64_between(0, 60))
                .describe("if be.satisfactionRate < CPUEvictBESatisfactionLowerPercent/100 && be.usage >= CPUEvictBEUsageThresholdPercent/100, then start to evict pod, and will evict to ${CPUEvictBESatisfactionUpperPercent}"),
            percent("cpu_evict_be_usage_threshold_percent")
                .json("cpuEvictBEUsageThresholdPercent")
                .describe("if be.cpuUsage >= CPUEvictBEUsageThresholdPercent/100, then start to calculate the resources need to be released."),
            Attribute::int64("cpu_evict_time_window_seconds")
                .optional()
                .validator(Validator::Int64AtLeast(0))
                .describe("when avg(cpuusage) > CPUEvictThresholdPercent, will start to evict pod by cpu, and avg(cpuusage) is calculated based on the most recent CPUEvictTimeWindowSeconds data"),
        ],
    )
    .json("resourceUsedThresholdWithBE")
    .optional()
    .describe("BE pods will be limited if node resource usage overload")
}

fn resource_qos_strategy() -> Attribute {
    Attribute::single_nested(
        "resource_qos_strategy",
        vec![
            Attribute::single_nested(
                "policies",
                vec![
                    Attribute::string("cpu_policy")
                        .optional()
                        .validator(Validator::StringOneOf(vec!["groupIdentity", "coreSched"]))
                        .describe("applied policy for the CPU QoS, default = 'groupIdentity'"),
                    Attribute::string("net_qos_policy")
                        .json("netQOSPolicy")
                        .optional()
                        .validator(Validator::StringOneOf(vec!["tc", "terway-qos"]))
                        .describe("applied policy for the Net QoS, default = 'tc'"),
                ],
            )
            .optional()
            .describe("Policies of pod QoS."),
            resource_qos("lsr_class", "ResourceQOS for LSR pods."),
            resource_qos("ls_class", "ResourceQOS for LS pods."),
            resource_qos("be_class", "ResourceQOS for BE pods."),
            resource_qos("system_class", "ResourceQOS for system pods"),
            resource_qos("cgroup_root", "ResourceQOS for root cgroup."),
        ],
    )
    .json("resourceQOSStrategy")
    .optional()
    .describe("QoS config strategy for pods of different qos-class")
}

/// Every QoS class carries the same set of knobs.
fn resource_qos(name: &'static str, description: &str) -> Attribute {
    Attribute::single_nested(
        name,
        vec![cpu_qos(), memory_qos(), blkio_qos(), resctrl_qos(), network_qos()],
    )
    .optional()
    .describe(description)
}

fn cpu_qos() -> Attribute {
    Attribute::single_nested(
        "cpu_qos",
        vec![
            Attribute::bool("enable").optional().describe("Enable indicates whether the cpu qos is enabled."),
            Attribute::int64("group_identity")
                .optional()
                .validators(int64_between(-1, 2))
                .describe("group identity value for pods, default = 0"),
            Attribute::int64("sched_idle")
                .optional()
                .validators(int64_between(0, 1))
                .describe("cpu.idle value for pods, default = 0. '1' means using SCHED_IDLE. CGroup Idle (introduced since mainline Linux 5.15): https://lore.kernel.org/lkml/162971078674.25758.15464079371945307825.tip-bot2@tip-bot2/#r"),
            Attribute::bool("core_expeller")
                .optional()
                .describe("whether pods of the QoS class can expel the cgroup idle pods at the SMT-level. default = false If set to true, pods of this QoS will use a dedicated core sched group for noise clean with the SchedIdle pods. NOTE: It takes effect if cpuPolicy = 'coreSched'."),
        ],
    )
    .json("cpuQOS")
    .optional()
    .describe("CPUQOSCfg stores node-level config of cpu qos")
}

fn memory_qos() -> Attribute {
    Attribute::single_nested(
        "memory_qos",
        vec![
            Attribute::bool("enable").optional().describe("Enable indicates whether the memory qos is enabled (default: false)."),
            percent("min_limit_percent")
                .describe("memcg qos If enabled, memcg qos will be set by the agent, where some fields are implicitly calculated from pod spec. 1. memory.min := spec.requests.memory * minLimitFactor / 100 (use 0 if requests.memory is not set) 2. memory.low := spec.requests.memory * lowLimitFactor / 100 (use 0 if requests.memory is not set) 3. memory.limit_in_bytes := spec.limits.memory (set $total if spec.limits.memory is not set) 4. memory.high := floor[(spec.requests.memory + throttlingFactor / 100 * (memory.limit_in_bytes or node allocatable memory - spec.requests.memory))/pageSize] * pageSize MinLimitPercent specifies the minLimitFactor percentage to calculate 'memory.min', which protects memory from global reclamation when memory usage does not exceed the min limit. Close: 0."),
            percent("low_limit_percent")
                .describe("LowLimitPercent specifies the lowLimitFactor percentage to calculate 'memory.low', which TRIES BEST protecting memory from global reclamation when memory usage does not exceed the low limit unless no unprotected memcg can be reclaimed. NOTE: 'memory.low' should be larger than 'memory.min'. If spec.requests.memory == spec.limits.memory, pod 'memory.low' and 'memory.high' become invalid, while 'memory.wmark_ratio' is still in effect. Close: 0."),
            percent("throttling_percent")
                .describe("ThrottlingPercent specifies the throttlingFactor percentage to calculate 'memory.high' with pod memory.limits or node allocatable memory, which triggers memcg direct reclamation when memory usage exceeds. Lower the factor brings more heavier reclaim pressure. Close: 0."),
            percent("wmark_ratio")
                .describe("wmark_ratio (Anolis OS required) Async memory reclamation is triggered when cgroup memory usage exceeds 'memory.wmark_high' and the reclamation stops when usage is below 'memory.wmark_low'. Basically, 'memory.wmark_high' := min(memory.high, memory.limit_in_bytes) * memory.memory.wmark_ratio 'memory.wmark_low' := min(memory.high, memory.limit_in_bytes) * (memory.wmark_ratio - memory.wmark_scale_factor) WmarkRatio specifies 'memory.wmark_ratio' that help calculate 'memory.wmark_high', which triggers async memory reclamation when memory usage exceeds. Close: 0. Recommended: 95."),
            Attribute::int64("wmark_scale_permill")
                .optional()
                .validators(int64_between(1, 1000))
                .describe("WmarkScalePermill specifies 'memory.wmark_scale_factor' that helps calculate 'memory.wmark_low', which stops async memory reclamation when memory usage belows. Close: 50. Recommended: 20."),
            Attribute::int64("wmark_min_adj")
                .optional()
                .validators(int64_between(-25, 50))
                .describe("wmark_min_adj (Anolis OS required) WmarkMinAdj specifies 'memory.wmark_min_adj' which adjusts per-memcg threshold for global memory reclamation. Lower the factor brings later reclamation. The adjustment uses different formula for different value range. [-25, 0):global_wmark_min' = global_wmark_min + (global_wmark_min - 0) * wmarkMinAdj (0, 50]:global_wmark_min' = global_wmark_min + (global_wmark_low - global_wmark_min) * wmarkMinAdj Close: [LSR:0, LS:0, BE:0]. Recommended: [LSR:-25, LS:-25, BE:50]."),
            Attribute::int64("priority_enable")
                .optional()
                .validators(int64_between(0, 1))
                .describe("PriorityEnable enables the memcg priority. Close: 0."),
            Attribute::int64("priority")
                .optional()
                .validators(int64_between(0, 12))
                .describe("Priority specifies the memcg priority which affects the oom kill order. Close: 0."),
            Attribute::int64("oom_kill_group")
                .optional()
                .validators(int64_between(0, 1))
                .describe("OomKillGroup specifies whether memcg oom kills the whole group. Close: 0."),
        ],
    )
    .json("memoryQOS")
    .optional()
    .describe("MemoryQOSCfg stores node-level config of memory qos")
}

fn blkio_qos() -> Attribute {
    Attribute::single_nested(
        "blkio_qos",
        vec![
            Attribute::bool("enable").optional().describe("Enable indicates whether the blkio qos is enabled."),
            Attribute::list_nested(
                "blocks",
                vec![
                    Attribute::string("name").optional().describe("Name of the block device, pod volume or volume group."),
                    Attribute::string("type")
                        .optional()
                        .validator(Validator::StringOneOf(vec!["device", "podvolume", "volumegroup"]))
                        .describe("Type of the block."),
                    io_cfg(),
                ],
            )
            .optional()
            .describe("Blocks the qos is applied to."),
        ],
    )
    .json("blkioQOS")
    .optional()
    .describe("BlkioQOSCfg stores node-level config of blkio qos")
}

fn io_cfg() -> Attribute {
    fn at_least_zero(name: &'static str, json: &str) -> Attribute {
        Attribute::int64(name).json(json).optional().validator(Validator::Int64AtLeast(0))
    }

    Attribute::single_nested(
        "io_cfg",
        vec![
            Attribute::int64("io_weight_percent")
                .optional()
                .validators(int64_between(1, 100))
                .describe("This field is used to set the weight of a sub-group. Default value: 100. Valid values: 1 to 100."),
            at_least_zero("read_iops", "readIOPS")
                .describe("Throttling of IOPS The value is set to 0, which indicates that the feature is disabled."),
            at_least_zero("write_iops", "writeIOPS"),
            at_least_zero("read_bps", "readBPS").describe("Throttling of throughput The value is set to 0, which indicates that the feature is disabled."),
            at_least_zero("write_bps", "writeBPS"),
            at_least_zero("read_latency", "readLatency")
                .describe("Configure the weight-based throttling feature of blk-iocost Only used for RootClass After blk-iocost is enabled, the kernel calculates the proportion of requests that exceed the read or write latency threshold out of all requests. When the proportion is greater than the read or write latency percentile (95%), the kernel considers the disk to be saturated and reduces the rate at which requests are sent to the disk. the read latency threshold. Unit: microseconds."),
            at_least_zero("write_latency", "writeLatency").describe("the write latency threshold. Unit: microseconds."),
            Attribute::bool("enable_user_model")
                .optional()
                .describe("configure the cost model of blkio-cost manually whether the user model is enabled. Default value: false"),
            at_least_zero("model_read_bps", "modelReadBPS").describe("the read BPS of user model"),
            at_least_zero("model_write_bps", "modelWriteBPS").describe("the write BPS of user model"),
        ],
    )
    .optional()
}

fn resctrl_qos() -> Attribute {
    Attribute::single_nested(
        "resctrl_qos",
        vec![
            Attribute::bool("enable").optional().describe("Enable indicates whether the rdt qos is enabled."),
            percent("cat_range_start_percent").describe("LLC available range start for pods by percentage"),
            percent("cat_range_end_percent").describe("LLC available range end for pods by percentage"),
            percent("mba_percent").describe("MBA percent"),
        ],
    )
    .json("resctrlQOS")
    .optional()
    .describe("ResctrlQOSCfg stores node-level config of resctrl qos")
}

fn network_qos() -> Attribute {
    Attribute::single_nested(
        "network_qos",
        vec![
            Attribute::bool("enable").optional().describe("Enable indicates whether the network qos is enabled."),
            Attribute::int_or_string("ingress_request").optional().describe("IngressRequest describes the minimum network bandwidth guaranteed in the ingress direction. unit: bps(bytes per second), two expressions are supported，int and string, int: percentage based on total bandwidth，valid in 0-100 string: a specific network bandwidth value, eg: 50M."),
            Attribute::int_or_string("ingress_limit").optional().describe("IngressLimit describes the maximum network bandwidth can be used in the ingress direction, unit: bps(bytes per second), two expressions are supported，int and string, int: percentage based on total bandwidth，valid in 0-100 string: a specific network bandwidth value, eg: 50M."),
            Attribute::int_or_string("egress_request").optional().describe("EgressRequest describes the minimum network bandwidth guaranteed in the egress direction. unit: bps(bytes per second), two expressions are supported，int and string, int: percentage based on total bandwidth，valid in 0-100 string: a specific network bandwidth value, eg: 50M."),
            Attribute::int_or_string("egress_limit").optional().describe("EgressLimit describes the maximum network bandwidth can be used in the egress direction, unit: bps(bytes per second), two expressions are supported，int and string, int: percentage based on total bandwidth，valid in 0-100 string: a specific network bandwidth value, eg: 50M."),
        ],
    )
    .json("networkQOS")
    .optional()
    .describe("NetworkQOSCfg stores node-level config of network qos")
}

fn cpu_burst_strategy() -> Attribute {
    Attribute::single_nested(
        "cpu_burst_strategy",
        vec![
            Attribute::string("policy")
                .optional()
                .validator(Validator::StringOneOf(vec!["none", "cpuBurstOnly", "cfsQuotaBurstOnly", "auto"]))
                .describe("CPUBurstPolicy"),
            Attribute::int64("cpu_burst_percent")
                .optional()
                .validator(Validator::Int64AtLeast(0))
                .describe("cpu burst percentage for setting cpu.cfs_burst_us, legal range: [0, +inf), default = 1000"),
            Attribute::int64("cfs_quota_burst_percent")
                .optional()
                .validator(Validator::Int64AtLeast(100))
                .describe("pod cfs quota scale up ceil percentage, default = 300 (300%)"),
            Attribute::int64("cfs_quota_burst_period_seconds")
                .optional()
                .validator(Validator::Int64AtLeast(-1))
                .describe("specifies a period of time for pod can use at burst, default = -1 (unlimited)"),
            percent("share_pool_threshold_percent")
                .describe("scale down cfs quota if node cpu overload, default = 50"),
        ],
    )
    .optional()
    .describe("CPU Burst Strategy")
}

fn system_strategy() -> Attribute {
    Attribute::single_nested(
        "system_strategy",
        vec![
            Attribute::int64("min_free_kbytes_factor")
                .optional()
                .validator(Validator::Int64AtLeast(0))
                .describe("for /proc/sys/vm/min_free_kbytes, min_free_kbytes = minFreeKbytesFactor * nodeTotalMemory /10000"),
            Attribute::int64("watermark_scale_factor")
                .optional()
                .validators(int64_between(10, 400))
                .describe("/proc/sys/vm/watermark_scale_factor"),
            Attribute::int64("memcg_reap_back_ground")
                .optional()
                .validators(int64_between(0, 1))
                .describe("/sys/kernel/mm/memcg_reaper/reap_background"),
        ],
    )
    .optional()
    .describe("node global system config")
}
