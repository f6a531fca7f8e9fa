//! Command-line surface.

use clap::Parser;

use cbtctl_vsphere::types::VsphereConfig;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "cbtctl")]
#[command(about = "Toggle change block tracking on vSphere VMs, committed via a transient snapshot cycle")]
#[command(version)]
pub struct Args {
    /// VM names or glob patterns (e.g. "web-01" or "web-*") to apply the
    /// setting to, processed in the given order.
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Disable change block tracking instead of enabling it (best-effort,
    /// not verified).
    #[arg(long)]
    pub disable: bool,

    /// Resolve targets and print the intended action per VM without
    /// mutating anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Skip VMs whose flag already matches the desired setting
    /// (enable runs only; the default is to always run the full cycle).
    #[arg(long)]
    pub skip_in_sync: bool,

    /// Print the outcome list as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// vCenter / ESXi host.
    #[arg(long, env = "VSPHERE_HOST")]
    pub host: String,

    /// API port.
    #[arg(long, env = "VSPHERE_PORT", default_value_t = 443)]
    pub port: u16,

    /// Username (e.g. "administrator@vsphere.local").
    #[arg(short, long, env = "VSPHERE_USERNAME")]
    pub username: String,

    /// Password.
    #[arg(long, env = "VSPHERE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Skip TLS certificate verification (self-signed labs).
    #[arg(long, env = "VSPHERE_INSECURE")]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "VSPHERE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log level.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn vsphere_config(&self) -> VsphereConfig {
        VsphereConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            insecure: self.insecure,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_is_the_default_setting() {
        let args = Args::parse_from([
            "cbtctl", "srv1", "--host", "vc.lab", "-u", "admin", "--password", "pw",
        ]);
        assert!(!args.disable);
        assert!(!args.dry_run);
        assert_eq!(args.targets, vec!["srv1"]);
    }

    #[test]
    fn multiple_targets_keep_order() {
        let args = Args::parse_from([
            "cbtctl", "srv1", "srv2", "ghost", "--host", "vc.lab", "-u", "a", "--password", "p",
        ]);
        assert_eq!(args.targets, vec!["srv1", "srv2", "ghost"]);
    }

    #[test]
    fn at_least_one_target_required() {
        let res = Args::try_parse_from([
            "cbtctl", "--host", "vc.lab", "-u", "a", "--password", "p",
        ]);
        assert!(res.is_err());
    }
}
