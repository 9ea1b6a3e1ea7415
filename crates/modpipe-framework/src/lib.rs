//! # Modpipe Framework
//!
//! Engine operations that act on a live component tree.
//!
//! Every function here takes an already resolved, read-only
//! [`ResolvedConfiguration`](modpipe_core::ResolvedConfiguration):
//!
//! - [`apply_params`]: runtime parameters and run modes onto a [`Controller`](modpipe_core::Controller)
//! - [`merge_doc_features`]: document features into a [`FeatureMap`](modpipe_core::FeatureMap)
//! - [`propagate_inheritance`]: the inherited source onto nested pipelines
//! - [`init_overrides`] / [`apply_init_params`]: init parameters for a host loader
//!
//! [`SerialController`] is a stock controller for hosts that do not bring their own.

pub mod applicator;
pub mod controller;
pub mod features;
pub mod inheritance;
pub mod init;

#[cfg(test)]
mod test_support;

pub use applicator::apply_params;
pub use controller::SerialController;
pub use features::merge_doc_features;
pub use inheritance::propagate_inheritance;
pub use init::{apply_init_params, init_overrides};
