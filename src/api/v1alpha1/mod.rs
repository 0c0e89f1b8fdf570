pub mod nodemetric_api;
pub mod nodeslo_api;
pub mod spicedbcluster_api;
