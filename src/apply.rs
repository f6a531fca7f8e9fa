//! The per-VM apply-and-verify workflow.
//!
//! For each target, in input order: resolve, reconfigure, force the setting
//! to commit with a create-then-delete snapshot pair, then (for enable runs
//! only) re-read the flag. One target's failure never stops the rest of the
//! batch; everything the collaborator throws is normalized into a per-target
//! outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use uuid::Uuid;

use crate::provider::ChangeTrackingProvider;
use cbtctl_vsphere::error::VsphereError;
use cbtctl_vsphere::types::{ChangeTrackingSpec, VmSummary};

/// Fixed tag on every transient snapshot name so operators can recognise
/// (and clean up) orphaned ones out-of-band.
pub const SNAPSHOT_PREFIX: &str = "cbtctl";

/// Generate a collision-resistant snapshot name.
pub fn transient_snapshot_name() -> String {
    format!("{SNAPSHOT_PREFIX}-{}", Uuid::new_v4())
}

/// The collaborator was unreachable before any per-target work started.
/// Unlike per-target outcomes this aborts the whole invocation.
#[derive(Debug, Error)]
#[error("vSphere collaborator unavailable: {0}")]
pub struct PreflightError(#[source] pub VsphereError);

/// Batch-wide options. The desired setting is shared across all targets.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Desired change-tracking setting (true = enable).
    pub enable: bool,
    /// Resolve and report only; no mutating calls.
    pub dry_run: bool,
    /// Enable runs only: read the flag first and skip VMs already in sync.
    pub skip_in_sync: bool,
}

/// Per-VM outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum Outcome {
    /// Reconfigured, committed, and (for enable runs) verified.
    Applied,
    /// Reconfigure and snapshot cycle ran, but the flag did not read back
    /// as enabled. Re-running the command usually completes the commit.
    AppliedButUnverified,
    /// The target resolved to no VM.
    TargetNotFound,
    /// Pre-check found the flag already matching; nothing was done.
    SkippedInSync,
    /// Dry run: this VM would have been reconfigured.
    WouldApply,
    /// Collaborator error, normalized at the per-target boundary.
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::AppliedButUnverified => write!(f, "applied but unverified — re-run to complete"),
            Outcome::TargetNotFound => write!(f, "not found"),
            Outcome::SkippedInSync => write!(f, "already in sync, skipped"),
            Outcome::WouldApply => write!(f, "would apply"),
            Outcome::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// One line of the machine-readable batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    /// The target identifier as given on the command line.
    pub target: String,
    /// Resolved VM ID, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<String>,
    /// Resolved VM name, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl fmt::Display for TargetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.vm) {
            (Some(name), Some(vm)) => write!(f, "{name} ({vm}): {}", self.outcome),
            _ => write!(f, "{}: {}", self.target, self.outcome),
        }
    }
}

/// Applies one desired setting to a batch of targets, strictly sequentially.
pub struct ChangeTrackingApplier<'a, P: ChangeTrackingProvider> {
    provider: &'a P,
    // Built once per invocation, shared read-only across all targets.
    spec: ChangeTrackingSpec,
    opts: ApplyOptions,
}

impl<'a, P: ChangeTrackingProvider> ChangeTrackingApplier<'a, P> {
    pub fn new(provider: &'a P, opts: ApplyOptions) -> Self {
        Self {
            provider,
            spec: ChangeTrackingSpec::new(opts.enable),
            opts,
        }
    }

    /// Process every target in input order. Returns one report per resolved
    /// VM (or per unresolvable target). Only a failed preflight aborts.
    ///
    /// `cancel` is checked before starting each new target; a target already
    /// in flight is finished, partially-applied state is left for a re-run.
    pub async fn apply(
        &self,
        targets: &[String],
        cancel: &AtomicBool,
    ) -> Result<Vec<TargetReport>, PreflightError> {
        self.provider.preflight().await.map_err(PreflightError)?;

        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            if cancel.load(Ordering::Relaxed) {
                log::warn!(
                    "interrupted — stopping before target {target:?} ({} of {} targets processed)",
                    reports.len(),
                    targets.len()
                );
                break;
            }
            self.apply_target(target, &mut reports).await;
        }
        Ok(reports)
    }

    async fn apply_target(&self, target: &str, reports: &mut Vec<TargetReport>) {
        let vms = match self.provider.resolve(target).await {
            Ok(vms) => vms,
            Err(e) if e.is_not_found() => {
                log::warn!("target {target:?}: {e}");
                reports.push(TargetReport {
                    target: target.to_string(),
                    vm: None,
                    name: None,
                    outcome: Outcome::TargetNotFound,
                });
                return;
            }
            Err(e) => {
                log::warn!("target {target:?}: resolution failed: {e}");
                reports.push(TargetReport {
                    target: target.to_string(),
                    vm: None,
                    name: None,
                    outcome: Outcome::Failed(e.to_string()),
                });
                return;
            }
        };

        if vms.is_empty() {
            log::warn!("target {target:?} did not match any VM");
            reports.push(TargetReport {
                target: target.to_string(),
                vm: None,
                name: None,
                outcome: Outcome::TargetNotFound,
            });
            return;
        }

        // Overlapping patterns may resolve the same VM more than once;
        // each resolution is processed (at-least-once semantics).
        for vm in vms {
            let outcome = if self.opts.dry_run {
                Outcome::WouldApply
            } else {
                self.apply_vm(&vm).await
            };

            match &outcome {
                Outcome::Applied | Outcome::SkippedInSync => {
                    log::debug!("{}: {outcome}", vm.name);
                }
                Outcome::WouldApply => {
                    log::info!(
                        "dry run: would set changeTrackingEnabled={} on {} ({})",
                        self.spec.change_tracking_enabled,
                        vm.name,
                        vm.vm
                    );
                }
                other => log::warn!("{}: {other}", vm.name),
            }

            reports.push(TargetReport {
                target: target.to_string(),
                vm: Some(vm.vm),
                name: Some(vm.name),
                outcome,
            });
        }
    }

    async fn apply_vm(&self, vm: &VmSummary) -> Outcome {
        if self.opts.skip_in_sync && self.spec.change_tracking_enabled {
            match self.provider.change_tracking_enabled(vm).await {
                Ok(true) => return Outcome::SkippedInSync,
                Ok(false) => {}
                // Pre-check is an optimisation; apply anyway if it fails
                Err(e) => log::debug!("{}: pre-check failed ({e}), applying anyway", vm.name),
            }
        }

        if let Err(e) = self.provider.reconfigure(vm, &self.spec).await {
            return Outcome::Failed(e.to_string());
        }

        // The snapshot pair is the commit mechanism. If create fails there
        // is nothing to delete; if create succeeds the delete runs before
        // verification so the transient snapshot never outlives this step.
        let snap_name = transient_snapshot_name();
        let snap_id = match self.provider.create_snapshot(vm, &snap_name).await {
            Ok(id) => id,
            Err(e) => return Outcome::Failed(format!("snapshot create failed: {e}")),
        };
        if let Err(e) = self.provider.delete_snapshot(vm, &snap_id).await {
            log::warn!(
                "{}: transient snapshot {snap_name} ({snap_id}) was left behind: {e}",
                vm.name
            );
            return Outcome::Failed(format!("snapshot delete failed: {e}"));
        }

        // Disabling is best-effort only, never verified.
        if !self.spec.change_tracking_enabled {
            return Outcome::Applied;
        }

        match self.provider.change_tracking_enabled(vm).await {
            Ok(true) => Outcome::Applied,
            Ok(false) => Outcome::AppliedButUnverified,
            Err(e) => {
                // The change went through; only confirmation is missing.
                log::warn!("{}: could not verify change tracking flag: {e}", vm.name);
                Outcome::AppliedButUnverified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names_carry_the_audit_prefix() {
        let name = transient_snapshot_name();
        assert!(name.starts_with("cbtctl-"));
    }

    #[test]
    fn snapshot_names_do_not_collide() {
        let a = transient_snapshot_name();
        let b = transient_snapshot_name();
        assert_ne!(a, b);
    }

    #[test]
    fn report_serialises_flat() {
        let report = TargetReport {
            target: "web-*".into(),
            vm: Some("vm-7".into()),
            name: Some("web-01".into()),
            outcome: Outcome::Failed("boom".into()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target"], "web-*");
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["detail"], "boom");

        let back: TargetReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn not_found_report_omits_vm_fields() {
        let report = TargetReport {
            target: "ghost".into(),
            vm: None,
            name: None,
            outcome: Outcome::TargetNotFound,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("vm").is_none());
        assert_eq!(json["outcome"], "targetNotFound");
    }
}
