//! VM resolution and change-tracking configuration.
//!
//! Targets given on the command line are either literal VM names (resolved
//! server-side through the inventory `names` filter) or glob patterns
//! (`*` / `?`), which are expanded client-side against the full inventory.

use crate::client::VsphereClient;
use crate::error::{VsphereError, VsphereResult};
use crate::types::{ChangeTrackingSpec, VmHardwareInfo, VmSummary};

use regex::Regex;

/// VM operations backed by `VsphereClient`.
pub struct VmManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> VmManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    // ── Inventory ───────────────────────────────────────────────────

    /// List VMs, optionally filtered by exact names.
    pub async fn list_vms(&self, names: Option<&[&str]>) -> VsphereResult<Vec<VmSummary>> {
        match names {
            Some(names) if !names.is_empty() => {
                let params: Vec<(String, String)> = names
                    .iter()
                    .map(|n| ("names".to_string(), n.to_string()))
                    .collect();
                self.client
                    .get_with_params::<Vec<VmSummary>>("/api/vcenter/vm", &params)
                    .await
            }
            _ => self.client.get::<Vec<VmSummary>>("/api/vcenter/vm").await,
        }
    }

    /// List all VMs (no filter).
    pub async fn list_all_vms(&self) -> VsphereResult<Vec<VmSummary>> {
        self.list_vms(None).await
    }

    /// Resolve one target identifier to zero or more VMs.
    ///
    /// Literal names go through the server-side `names` filter; patterns
    /// are matched case-insensitively against the full inventory. Zero
    /// matches is not an error at this layer, and VMs matched by several
    /// overlapping patterns are deliberately not deduplicated.
    pub async fn resolve_targets(&self, target: &str) -> VsphereResult<Vec<VmSummary>> {
        if !is_pattern(target) {
            return self.list_vms(Some(&[target])).await;
        }

        let re = glob_to_regex(target)?;
        let all = self.list_all_vms().await?;
        let matched: Vec<VmSummary> =
            all.into_iter().filter(|vm| re.is_match(&vm.name)).collect();
        log::debug!("pattern {target:?} matched {} VM(s)", matched.len());
        Ok(matched)
    }

    // ── Change tracking ─────────────────────────────────────────────

    /// Read the current change-tracking flag from the VM's hardware config.
    pub async fn change_tracking_enabled(&self, vm_id: &str) -> VsphereResult<bool> {
        let path = format!("/api/vcenter/vm/{vm_id}/hardware");
        let hw: VmHardwareInfo = self.client.get(&path).await?;
        Ok(hw.change_tracking_enabled.unwrap_or(false))
    }

    /// Reconfigure the change-tracking flag. Synchronous from the caller's
    /// perspective; the control plane runs the backing task itself.
    pub async fn set_change_tracking(
        &self,
        vm_id: &str,
        spec: &ChangeTrackingSpec,
    ) -> VsphereResult<()> {
        let path = format!("/api/vcenter/vm/{vm_id}/hardware");
        self.client.patch(&path, spec).await
    }
}

/// Whether a target string is a glob pattern rather than a literal name.
pub fn is_pattern(target: &str) -> bool {
    target.contains('*') || target.contains('?')
}

/// Compile a glob pattern (`*`, `?`) into an anchored case-insensitive regex.
pub fn glob_to_regex(pattern: &str) -> VsphereResult<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
        .map_err(|e| VsphereError::parse(format!("Invalid target pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_names_are_not_patterns() {
        assert!(!is_pattern("web-01"));
        assert!(is_pattern("web-*"));
        assert!(is_pattern("db-0?"));
    }

    #[test]
    fn glob_star_matches_any_run() {
        let re = glob_to_regex("web-*").unwrap();
        assert!(re.is_match("web-01"));
        assert!(re.is_match("WEB-PROD"));
        assert!(!re.is_match("db-web-01"));
    }

    #[test]
    fn glob_question_mark_matches_one_char() {
        let re = glob_to_regex("srv?").unwrap();
        assert!(re.is_match("srv1"));
        assert!(!re.is_match("srv12"));
        assert!(!re.is_match("srv"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let re = glob_to_regex("app.prod+1*").unwrap();
        assert!(re.is_match("app.prod+1-web"));
        assert!(!re.is_match("appxprod+1-web"));
    }

    #[test]
    fn glob_is_anchored() {
        let re = glob_to_regex("prod").unwrap();
        assert!(re.is_match("prod"));
        assert!(!re.is_match("preprod"));
        assert!(!re.is_match("prod-2"));
    }
}
