use super::CrdKind;
use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
use crate::framework::{Attribute, Validator};

impl CrdKind for SpiceDBCluster {
    const TYPE_NAME: &'static str = "authzed_com_spice_db_cluster_v1alpha1";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "SpiceDBCluster defines all options for a full SpiceDB cluster.";

    fn spec_attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("version")
                .optional()
                .describe("Version is the name of the version of SpiceDB that will be run. The version is usually a simple version string like 'v1.13.0', but the operator is configured with a data source that tells it what versions are allowed, and they may have other names. If omitted, the newest version in the head of the channel will be used. Note that the cluster will not be updated if a new version is added to the channel, it will only update when the version is changed."),
            Attribute::string("channel")
                .optional()
                .describe("Channel is a defined series of updates that operator should follow. The operator is configured with a datasource that configures available channels and update paths. If 'version' is not specified, then the operator will keep SpiceDB up-to-date with the current head of the channel. If 'version' is specified, then the operator will write available updates in the status."),
            Attribute::dynamic("config")
                .optional()
                .describe("Config values to be passed to the cluster"),
            Attribute::string("secret_name")
                .optional()
                .validator(Validator::StringLengthAtLeast(1))
                .describe("SecretName points to a secret (in the same namespace) that holds the config for the cluster like passwords, credentials, etc. If the secret is omitted, one will be generated"),
            Attribute::list_nested(
                "patches",
                vec![
                    Attribute::string("kind")
                        .required()
                        .validator(Validator::StringLengthAtLeast(1))
                        .describe("Kind targets an object by its kubernetes Kind name."),
                    Attribute::dynamic("patch")
                        .required()
                        .describe("Patch is an inlined representation of a structured merge patch (one that just specifies the structure and fields to be modified) or a an explicit JSON6902 patch operation."),
                ],
            )
            .optional()
            .describe("Patches is a list of patches to apply to generated resources. If multiple patches apply to the same object and field, later patches in the list take precedence over earlier ones."),
        ]
    }
}
