//! Shared types for the vSphere collaborator.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection / Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Top-level configuration for connecting to a vCenter / ESXi host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfig {
    /// vCenter or ESXi hostname / IP (e.g. "vcenter.lab.local")
    pub host: String,
    /// Port (default 443)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username (e.g. "administrator@vsphere.local")
    pub username: String,
    /// Password
    pub password: String,
    /// Skip TLS certificate verification (self-signed labs)
    #[serde(default)]
    pub insecure: bool,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 { 443 }
fn default_timeout() -> u64 { 30 }

impl Default for VsphereConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            port: 443,
            insecure: false,
            timeout_secs: 30,
        }
    }
}

/// Config without the password, safe to print or log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfigSafe {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub insecure: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmPowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    #[serde(other)]
    Unknown,
}

impl Default for VmPowerState {
    fn default() -> Self { Self::Unknown }
}

/// Concise VM summary (from the list endpoint). Doubles as the resolved
/// VM handle everywhere in cbtctl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSummary {
    /// vSphere managed-object ID (e.g. "vm-42")
    pub vm: String,
    pub name: String,
    #[serde(default)]
    pub power_state: VmPowerState,
}

/// Subset of the VM hardware document we care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmHardwareInfo {
    #[serde(default)]
    pub version: Option<String>,
    /// Change-block-tracking flag. Older endpoints omit it; treat missing
    /// as disabled.
    #[serde(default)]
    pub change_tracking_enabled: Option<bool>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Reconfiguration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The reconfiguration payload: built once per invocation and shared
/// read-only across every target in the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTrackingSpec {
    pub change_tracking_enabled: bool,
}

impl ChangeTrackingSpec {
    pub fn new(enabled: bool) -> Self {
        Self { change_tracking_enabled: enabled }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Snapshots
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Request body for snapshot creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Snapshot the VM's memory state
    #[serde(default)]
    pub memory: Option<bool>,
    /// Quiesce the guest file system
    #[serde(default)]
    pub quiesce: Option<bool>,
}

/// Snapshot summary (from the list endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Snapshot managed-object ID
    pub snapshot: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_in() {
        let cfg: VsphereConfig = serde_json::from_str(
            r#"{"host":"vc.lab","username":"admin","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 443);
        assert_eq!(cfg.timeout_secs, 30);
        assert!(!cfg.insecure);
    }

    #[test]
    fn change_tracking_spec_wire_shape() {
        let spec = ChangeTrackingSpec::new(true);
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"{"changeTrackingEnabled":true}"#
        );
    }

    #[test]
    fn unknown_power_state_tolerated() {
        let vm: VmSummary = serde_json::from_str(
            r#"{"vm":"vm-1","name":"srv1","powerState":"SOMETHING_NEW"}"#,
        )
        .unwrap();
        assert_eq!(vm.power_state, VmPowerState::Unknown);
    }
}
