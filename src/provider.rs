//! Collaborator seam between the applier and the vSphere service.
//!
//! The applier only ever talks to this trait, so the batch workflow can be
//! exercised against a recording fake in tests while production wires in
//! `VsphereService`.

use async_trait::async_trait;
use chrono::Utc;

use cbtctl_vsphere::error::{VsphereError, VsphereResult};
use cbtctl_vsphere::service::VsphereService;
use cbtctl_vsphere::types::{ChangeTrackingSpec, CreateSnapshotSpec, VmSummary};

/// The five collaborator operations the applier consumes, plus the
/// all-or-nothing preflight gate.
#[async_trait]
pub trait ChangeTrackingProvider: Send + Sync {
    /// Availability check run once before any per-target work.
    async fn preflight(&self) -> VsphereResult<()>;

    /// Resolve a target identifier (name or glob) to zero or more VMs.
    /// Zero matches is a value, not an error.
    async fn resolve(&self, target: &str) -> VsphereResult<Vec<VmSummary>>;

    /// Submit the shared reconfiguration request against one VM.
    async fn reconfigure(&self, vm: &VmSummary, spec: &ChangeTrackingSpec) -> VsphereResult<()>;

    /// Create a snapshot with the given name; returns the snapshot ID.
    async fn create_snapshot(&self, vm: &VmSummary, name: &str) -> VsphereResult<String>;

    /// Delete exactly the snapshot identified by `snapshot_id`.
    async fn delete_snapshot(&self, vm: &VmSummary, snapshot_id: &str) -> VsphereResult<()>;

    /// Read the VM's current change-tracking flag.
    async fn change_tracking_enabled(&self, vm: &VmSummary) -> VsphereResult<bool>;
}

#[async_trait]
impl ChangeTrackingProvider for VsphereService {
    async fn preflight(&self) -> VsphereResult<()> {
        if VsphereService::check_session(self).await? {
            Ok(())
        } else {
            Err(VsphereError::connection("vSphere session is not active"))
        }
    }

    async fn resolve(&self, target: &str) -> VsphereResult<Vec<VmSummary>> {
        self.resolve_targets(target).await
    }

    async fn reconfigure(&self, vm: &VmSummary, spec: &ChangeTrackingSpec) -> VsphereResult<()> {
        self.set_change_tracking(&vm.vm, spec).await
    }

    async fn create_snapshot(&self, vm: &VmSummary, name: &str) -> VsphereResult<String> {
        let spec = CreateSnapshotSpec {
            name: name.to_string(),
            description: Some(format!(
                "cbtctl transient snapshot, created {} — safe to delete",
                Utc::now().to_rfc3339()
            )),
            memory: Some(false),
            quiesce: Some(false),
        };
        VsphereService::create_snapshot(self, &vm.vm, &spec).await
    }

    async fn delete_snapshot(&self, vm: &VmSummary, snapshot_id: &str) -> VsphereResult<()> {
        VsphereService::delete_snapshot(self, &vm.vm, snapshot_id).await
    }

    async fn change_tracking_enabled(&self, vm: &VmSummary) -> VsphereResult<bool> {
        VsphereService::change_tracking_enabled(self, &vm.vm).await
    }
}
