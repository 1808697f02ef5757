//! # GSM Secret Controller
//!
//! Kubernetes controller that materializes Google Secret Manager secrets into
//! Kubernetes Secrets.
//!
//! ## Overview
//!
//! For every `GSMSecret` resource the controller:
//!
//! 1. **Authenticates** - Mints a ServiceAccount token and federates it into a
//!    Google credential (optionally impersonating a Google service account), or
//!    uses the pod's own identity in trusted-subsystem mode
//! 2. **Fetches** - Reads each listed Secret Manager version
//! 3. **Builds** - Maps payloads to keys, literally or via JSON pointers
//! 4. **Applies** - Creates, updates or adopts the target Secret, owned by the `GSMSecret`
//! 5. **Reports** - Writes a `Ready` condition and resyncs periodically
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for detailed usage instructions and examples.

use anyhow::Result;
use gsm_secret_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.client,
        init_result.reconciler,
        init_result.server_state,
    )
    .await
}
