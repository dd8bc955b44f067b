//! Check command implementation

use serde::Serialize;
use testsync_core::SyncListener;

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Output, OutputFormat};

#[derive(Serialize)]
struct CheckReport {
    property_name: String,
    enabled: bool,
    tags: Vec<TagReport>,
}

#[derive(Serialize)]
struct TagReport {
    tag: String,
    path: String,
}

pub fn execute(args: CheckArgs, config: Config, output: &Output) -> Result<()> {
    let settings = config.sync.settings();
    let listener = SyncListener::from_env(&settings);

    let report = CheckReport {
        property_name: settings.property_name.clone(),
        enabled: listener.is_enabled(),
        tags: listener
            .tags()
            .iter()
            .map(|t| TagReport {
                tag: t.tag().to_string(),
                path: t.path().display().to_string(),
            })
            .collect(),
    };

    match output.format() {
        OutputFormat::Json => output.data(&report),
        OutputFormat::Text if report.enabled => {
            output.success(&format!(
                "Synchronization enabled for {} tag(s)",
                report.tags.len()
            ));
            for tag in &report.tags {
                println!("  {} -> {}", tag.tag, tag.path);
            }
        }
        OutputFormat::Text => output.info(&format!(
            "Synchronization disabled: [{}] is unset or invalid",
            report.property_name
        )),
        OutputFormat::None => {}
    }

    if args.require && !report.enabled {
        return Err(CliError::SyncDisabled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_fails_without_property() {
        let mut config = Config::default();
        config.sync.property_name = "TESTSYNC_CHECK_UNIT_TEST_UNSET".to_string();
        let output = Output::new(OutputFormat::None);

        assert!(execute(CheckArgs { require: false }, config.clone(), &output).is_ok());
        assert!(matches!(
            execute(CheckArgs { require: true }, config, &output),
            Err(CliError::SyncDisabled)
        ));
    }
}
