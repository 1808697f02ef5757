//! # Custom Resource Definitions
//!
//! CRD types for the GSM Secret Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - GSMSecret specification (target and entries)
//! - `status.rs` - Status and `Ready` condition handling
//! - `annotations.rs` - Recognized override annotations

mod annotations;
mod spec;
mod status;

pub use annotations::{
    annotation_value, ANNOTATION_GSA, ANNOTATION_KSA, ANNOTATION_RELEASE,
    ANNOTATION_WIF_AUDIENCE, RECOGNIZED_ANNOTATIONS,
};
pub use spec::{GsmSecret, GsmSecretSpec, KeyMapping, SecretEntry, TargetRef};
pub use status::{
    Condition, ConditionStatus, GsmSecretStatus, CONDITION_READY, REASON_APPLY_FAILED,
    REASON_BUILD_FAILED, REASON_FETCH_FAILED, REASON_SYNCED,
};
