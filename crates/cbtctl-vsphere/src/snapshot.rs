//! Transient snapshot lifecycle via the vSphere REST API.
//!
//! cbtctl only ever creates a snapshot to force the reconfigured setting to
//! commit, then deletes that exact snapshot again. Nothing here is meant
//! for retention.

use crate::error::VsphereResult;
use crate::types::{CreateSnapshotSpec, SnapshotSummary};
use crate::client::VsphereClient;

/// Snapshot operations on a VM.
pub struct SnapshotManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> SnapshotManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    /// Create a snapshot. Returns the snapshot's managed-object ID, which
    /// is the handle to delete exactly this snapshot later.
    pub async fn create_snapshot(
        &self,
        vm_id: &str,
        spec: &CreateSnapshotSpec,
    ) -> VsphereResult<String> {
        #[derive(serde::Deserialize)]
        struct Created {
            value: String,
        }
        let path = format!("/api/vcenter/vm/{vm_id}/snapshots");
        let resp: Created = self.client.post(&path, spec).await?;
        Ok(resp.value)
    }

    /// Delete a specific snapshot by ID, never "whichever is newest".
    pub async fn delete_snapshot(&self, vm_id: &str, snapshot_id: &str) -> VsphereResult<()> {
        let path = format!("/api/vcenter/vm/{vm_id}/snapshots/{snapshot_id}");
        self.client.delete(&path).await
    }

    /// List all snapshots for a VM as a flat list.
    pub async fn list_snapshots(&self, vm_id: &str) -> VsphereResult<Vec<SnapshotSummary>> {
        let path = format!("/api/vcenter/vm/{vm_id}/snapshots");
        // The API may return 404 if no snapshots exist; treat that as empty
        match self.client.get::<Vec<SnapshotSummary>>(&path).await {
            Ok(snaps) => Ok(snaps),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
