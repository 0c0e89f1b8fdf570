pub mod manifests;
pub mod wait;
