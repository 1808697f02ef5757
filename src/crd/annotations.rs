//! # Override Annotations
//!
//! Annotations on a GSMSecret that tune the identity broker or force a
//! reconcile. Only these keys are considered by the change filter; any other
//! annotation churn (e.g. `kubectl.kubernetes.io/last-applied-configuration`)
//! is ignored.

use std::collections::BTreeMap;

/// Kubernetes ServiceAccount whose token is exchanged
pub const ANNOTATION_KSA: &str = "secrets.pize.com/ksa";

/// Google service account email to impersonate after federation
pub const ANNOTATION_GSA: &str = "secrets.pize.com/gsa";

/// Workload Identity Federation provider audience
pub const ANNOTATION_WIF_AUDIENCE: &str = "secrets.pize.com/wif-audience";

/// Opaque marker; changing it forces a reconcile
pub const ANNOTATION_RELEASE: &str = "secrets.pize.com/release";

/// Every annotation whose value change warrants a reconcile
pub const RECOGNIZED_ANNOTATIONS: [&str; 4] = [
    ANNOTATION_KSA,
    ANNOTATION_GSA,
    ANNOTATION_WIF_AUDIENCE,
    ANNOTATION_RELEASE,
];

/// Trimmed, non-empty annotation value
#[must_use]
pub fn annotation_value<'a>(
    annotations: Option<&'a BTreeMap<String, String>>,
    key: &str,
) -> Option<&'a str> {
    annotations
        .and_then(|a| a.get(key))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
