//! Run command implementation

use serde::Serialize;
use std::collections::HashSet;
use testsync_core::Coordinator;

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Output, OutputFormat};
use crate::process::{self, CommandSpec, WorkerReport, SEED_VAR};

#[derive(Serialize)]
struct RunSummary<'a> {
    seed: u64,
    tags: &'a [String],
    workers: &'a [WorkerReport],
}

pub fn execute(args: RunArgs, config: Config, output: &Output) -> Result<()> {
    if args.command.is_empty() {
        return Err(CliError::MissingCommand);
    }

    let tags = collect_tags(&config.sync.tags, &args.tags)?;
    let workers = args.workers.unwrap_or(config.run.workers).max(1);
    let fail_fast = args.fail_fast || config.run.fail_fast;
    let settings = config.sync.settings();

    // Sync files live exactly as long as this coordinator
    let coordinator = Coordinator::new(&settings)?;
    let property = coordinator.request_sync_property(tags.as_slice())?;

    // Guard only: a request for real tags yields a payload or an error today
    if property.is_empty() && !tags.is_empty() && config.verbose.configuration {
        log::error!(
            "No sync file created for tags {:?} and seed [{}]",
            tags,
            property.seed()
        );
    }
    log::info!(
        "Running {} worker(s) with seed [{}] and sync property [{}]",
        workers,
        property.seed(),
        property.payload()
    );

    let mut spec = CommandSpec::from_argv(&args.command)
        .map_err(|e| CliError::Spawn(e.to_string()))?
        .env(SEED_VAR, property.seed().to_string());
    if !property.is_empty() {
        spec = spec.env(settings.property_name.clone(), property.payload());
    }

    let result = process::run_workers(&spec, workers, fail_fast);
    coordinator.close();
    let reports = result.map_err(|e| CliError::Spawn(format!("{:#}", e)))?;

    let failed = reports.iter().filter(|r| !r.success).count();
    report(output, &tags, property.seed(), &reports, failed);

    if failed > 0 {
        return Err(CliError::WorkersFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

/// Configured tags followed by command-line tags; each may appear once
fn collect_tags(configured: &[String], requested: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(configured.len() + requested.len());
    for tag in configured.iter().chain(requested) {
        if !seen.insert(tag.as_str()) {
            return Err(CliError::DuplicateTag(tag.clone()));
        }
        tags.push(tag.clone());
    }
    Ok(tags)
}

fn report(output: &Output, tags: &[String], seed: u64, reports: &[WorkerReport], failed: usize) {
    match output.format() {
        OutputFormat::Json => output.data(&RunSummary {
            seed,
            tags,
            workers: reports,
        }),
        _ => {
            for r in reports.iter().filter(|r| !r.success) {
                let status = match (r.killed, r.code) {
                    (true, _) => "stopped after another worker failed".to_string(),
                    (false, Some(code)) => format!("exited with status {}", code),
                    (false, None) => "terminated by signal".to_string(),
                };
                output.warning(&format!("Worker {} {}", r.index, status));
            }
            if failed == 0 {
                output.success(&format!("{} worker(s) finished", reports.len()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_collect_tags_keeps_order() {
        let tags = collect_tags(&strings(&["db"]), &strings(&["cache", "net"])).unwrap();
        assert_eq!(tags, strings(&["db", "cache", "net"]));
    }

    #[test]
    fn test_collect_tags_rejects_duplicates() {
        let err = collect_tags(&strings(&["db"]), &strings(&["db"])).unwrap_err();
        assert!(matches!(err, CliError::DuplicateTag(tag) if tag == "db"));

        assert!(collect_tags(&[], &strings(&["a", "a"])).is_err());
    }

    #[test]
    fn test_missing_command() {
        let args = RunArgs {
            tags: Vec::new(),
            workers: None,
            fail_fast: false,
            command: Vec::new(),
        };
        let output = Output::new(OutputFormat::None);
        assert!(matches!(
            execute(args, Config::default(), &output),
            Err(CliError::MissingCommand)
        ));
    }
}
