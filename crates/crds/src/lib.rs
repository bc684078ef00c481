//! Network add-ons CRD definitions
//!
//! Kubernetes Custom Resource Definitions for the network add-ons operator.

pub mod conditions;
pub mod network_addons;
pub mod placement;

pub use conditions::*;
pub use network_addons::*;
pub use placement::*;

/// API group of every resource owned by this operator.
pub const GROUP: &str = "networkaddons.microscaler.io";

/// The only NetworkAddonsConfig name the controller acts on.
pub const CLUSTER_CONFIG_NAME: &str = "cluster";

/// Objects carrying this annotation with value "true" never fail an apply;
/// errors against them are logged and swallowed.
pub const IGNORE_ERRORS_ANNOTATION: &str = "networkaddons.microscaler.io/ignore-errors";
