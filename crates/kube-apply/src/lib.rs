//! Apply/Merge Engine
//!
//! A library for converging schema-less Kubernetes objects. Every resource
//! the operator renders or inspects is handled uniformly as a
//! [`kube::api::DynamicObject`]; this crate supplies the cluster client
//! abstraction, per-kind merge policies and the create/update/delete
//! sequencing around them.
//!
//! # Example
//!
//! ```no_run
//! use kube_apply::{apply_object, KubeObjectClient};
//!
//! # async fn example(desired: kube::api::DynamicObject) -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeObjectClient::new(kube::Client::try_default().await?);
//! let outcome = apply_object(&client, &desired).await?;
//! tracing::info!(?outcome, "object converged");
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod client;
pub mod error;
pub mod merge;
pub mod object;
pub mod owner;
pub mod paths;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use apply::{apply_object, delete_owned, ApplyOutcome};
pub use client::{KubeObjectClient, ObjectClient};
pub use error::ApplyError;
pub use merge::{merge_for_update, semantically_equal};
pub use object::{api_version_of, display_name, gvk_of, has_annotation, name_of, ObjectKey};
pub use owner::{is_owned_by, owner_reference, set_owner};
pub use paths::PathError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockFault, MockObjectClient};
