//! Aggregate service façade for the vSphere collaborator.
//!
//! `VsphereService` owns the (optional) `VsphereClient` and exposes every
//! operation cbtctl needs. Each domain call is gated on an active session;
//! calling before `connect` yields a `ConnectionError`.

use crate::client::VsphereClient;
use crate::error::{VsphereError, VsphereResult};
use crate::snapshot::SnapshotManager;
use crate::types::*;
use crate::vm::VmManager;

/// Top-level service aggregating VM and snapshot operations.
pub struct VsphereService {
    client: Option<VsphereClient>,
    config: Option<VsphereConfig>,
}

impl VsphereService {
    /// Create a new (disconnected) service.
    pub fn new() -> Self {
        Self { client: None, config: None }
    }

    /// Whether we have an active vSphere session.
    pub fn is_connected(&self) -> bool {
        self.client.as_ref().map(|c| c.is_connected()).unwrap_or(false)
    }

    fn require_client(&self) -> VsphereResult<&VsphereClient> {
        self.client
            .as_ref()
            .filter(|c| c.is_connected())
            .ok_or_else(|| VsphereError::connection("Not connected to vSphere"))
    }

    // ── Connection ──────────────────────────────────────────────────

    /// Connect to a vCenter / ESXi host.
    pub async fn connect(&mut self, config: VsphereConfig) -> VsphereResult<String> {
        let mut client = VsphereClient::new(&config)?;
        client.login().await?;
        log::info!("connected to {}:{} as {}", config.host, config.port, config.username);
        let session = client.session_id().unwrap_or_default().to_string();
        self.config = Some(config);
        self.client = Some(client);
        Ok(session)
    }

    /// Disconnect from vSphere.
    pub async fn disconnect(&mut self) {
        if let Some(ref mut client) = self.client {
            client.logout().await;
        }
        self.client = None;
        self.config = None;
    }

    /// Check if the session is still valid.
    pub async fn check_session(&self) -> VsphereResult<bool> {
        match self.client {
            Some(ref client) => client.check_session().await,
            None => Ok(false),
        }
    }

    /// Get current config (without password).
    pub fn get_config(&self) -> Option<VsphereConfigSafe> {
        self.config.as_ref().map(|c| VsphereConfigSafe {
            host: c.host.clone(),
            port: c.port,
            username: c.username.clone(),
            insecure: c.insecure,
        })
    }

    // ── VM operations ───────────────────────────────────────────────

    pub async fn resolve_targets(&self, target: &str) -> VsphereResult<Vec<VmSummary>> {
        let c = self.require_client()?;
        VmManager::new(c).resolve_targets(target).await
    }

    pub async fn change_tracking_enabled(&self, vm_id: &str) -> VsphereResult<bool> {
        let c = self.require_client()?;
        VmManager::new(c).change_tracking_enabled(vm_id).await
    }

    pub async fn set_change_tracking(
        &self,
        vm_id: &str,
        spec: &ChangeTrackingSpec,
    ) -> VsphereResult<()> {
        let c = self.require_client()?;
        VmManager::new(c).set_change_tracking(vm_id, spec).await
    }

    // ── Snapshot operations ─────────────────────────────────────────

    pub async fn create_snapshot(
        &self,
        vm_id: &str,
        spec: &CreateSnapshotSpec,
    ) -> VsphereResult<String> {
        let c = self.require_client()?;
        SnapshotManager::new(c).create_snapshot(vm_id, spec).await
    }

    pub async fn delete_snapshot(&self, vm_id: &str, snapshot_id: &str) -> VsphereResult<()> {
        let c = self.require_client()?;
        SnapshotManager::new(c).delete_snapshot(vm_id, snapshot_id).await
    }

    pub async fn list_snapshots(&self, vm_id: &str) -> VsphereResult<Vec<SnapshotSummary>> {
        let c = self.require_client()?;
        SnapshotManager::new(c).list_snapshots(vm_id).await
    }
}

impl Default for VsphereService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_service_rejects_domain_calls() {
        let svc = VsphereService::new();
        assert!(!svc.is_connected());
        assert!(svc.require_client().is_err());
        assert!(svc.get_config().is_none());
    }
}
