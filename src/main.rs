//! cbtctl — entry point.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cbtctl::apply::{ApplyOptions, ChangeTrackingApplier};
use cbtctl::cli::Args;
use cbtctl_vsphere::service::VsphereService;

/// Distinct exit status for the all-or-nothing preflight gate.
const EXIT_PREFLIGHT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut opts = ApplyOptions {
        enable: !args.disable,
        dry_run: args.dry_run,
        skip_in_sync: args.skip_in_sync,
    };

    // Declining the confirmation degrades to a dry run: resolution only,
    // intended actions printed, nothing mutated.
    if !opts.dry_run && !args.yes && !confirm(&args) {
        tracing::info!("not confirmed — reporting intended actions only");
        opts.dry_run = true;
    }

    let mut service = VsphereService::new();
    if let Err(e) = service.connect(args.vsphere_config()).await {
        tracing::error!("preflight failed, no targets were touched: {e}");
        return ExitCode::from(EXIT_PREFLIGHT);
    }
    if let Some(cfg) = service.get_config() {
        tracing::debug!(
            "session established against {}:{} as {} (insecure={})",
            cfg.host,
            cfg.port,
            cfg.username,
            cfg.insecure
        );
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let applier = ChangeTrackingApplier::new(&service, opts);
    let reports = match applier.apply(&args.targets, &cancel).await {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("{e}");
            service.disconnect().await;
            return ExitCode::from(EXIT_PREFLIGHT);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("could not serialise report: {e}"),
        }
    } else {
        for report in &reports {
            println!("{report}");
        }
    }

    service.disconnect().await;

    // Per-target problems are report entries, not process failures.
    ExitCode::SUCCESS
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn confirm(args: &Args) -> bool {
    let action = if args.disable { "disable" } else { "enable" };
    print!(
        "About to {action} change block tracking on {} target(s): {}.\nProceed? [y/N] ",
        args.targets.len(),
        args.targets.join(", ")
    );
    let _ = io::stdout().flush();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
