//! CLI entry point for stylestack.

mod cli;

use clap::Parser;
use std::sync::Arc;
use stylestack::config::{load_config_with_diagnostics, Config, StorageDriverKind};
use stylestack::logging::init_logging;
use stylestack::mode::ViewerMode;
use stylestack::persist::{
    FileDriver, LoadStatus, MemoryDriver, MigrationOutcome, PersistenceGateway, SaveStatus,
    StorageDriver,
};
use stylestack::render::Renderer;
use stylestack::runtime::{open_runtime, RuntimeHandle, StartupReport};
use stylestack::settings::Category;
use stylestack::store::{MutationOutcome, SettingsCommand};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let renderer = Renderer::new(!args.no_color);

    let loaded = match load_config_with_diagnostics(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };
    let config = loaded
        .config
        .with_cli_overrides(args.storage_dir.clone(), args.memory);
    init_logging(&config.logging);
    tracing::debug!(source = %loaded.source, "configuration loaded");
    for warning in loaded.diagnostics.warnings.iter().chain(&binary_warnings(&config)) {
        renderer.warn(warning);
    }

    let driver = match open_driver(&config) {
        Ok(driver) => driver,
        Err(msg) => {
            renderer.error(&msg);
            std::process::exit(1);
        }
    };
    // One runtime per process: a sync bus would have no other subscriber.
    let (handle, report) = open_runtime(
        PersistenceGateway::new(driver),
        config.persistence.debounce(),
        None,
    )
    .await;

    let result = run_command(&renderer, &handle, &report, args.command).await;
    let flushed = finish(&handle).await;
    if let Err(msg) = result.and(flushed) {
        renderer.error(&msg);
        std::process::exit(1);
    }
}

/// Config settings that have no effect in a single CLI process.
fn binary_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.sync.cross_instance {
        warnings.push(
            "`sync.cross_instance` links runtimes inside one process; the CLI runs a single runtime and ignores it"
                .to_string(),
        );
    }
    warnings
}

fn open_driver(config: &Config) -> Result<Arc<dyn StorageDriver>, String> {
    match config.storage.driver {
        StorageDriverKind::Memory => Ok(Arc::new(MemoryDriver::new())),
        StorageDriverKind::File => FileDriver::open(&config.storage.dir)
            .map(|driver| Arc::new(driver) as Arc<dyn StorageDriver>)
            .map_err(|e| e.to_string()),
    }
}

async fn run_command(
    renderer: &Renderer,
    handle: &RuntimeHandle,
    report: &StartupReport,
    command: cli::Command,
) -> Result<(), String> {
    if !matches!(command, cli::Command::Migrate) {
        warn_about_loads(renderer, report);
    }
    match command {
        cli::Command::Show { category, mode } => {
            show(renderer, handle, category, mode);
            Ok(())
        }
        cli::Command::Apply { command } => {
            let command: SettingsCommand = serde_json::from_str(&command)
                .map_err(|e| format!("invalid settings command: {e}"))?;
            let outcome = handle.dispatch(command).await.map_err(|e| e.to_string())?;
            report_outcome(renderer, outcome);
            Ok(())
        }
        cli::Command::Templates { category } => {
            renderer.section(&format!("{category} templates"));
            let active = handle
                .snapshot()
                .state(category)
                .active_template()
                .map(str::to_string);
            for name in handle.templates().names(category) {
                if active.as_deref() == Some(name) {
                    renderer.detail(&format!("{name} (active)"));
                } else {
                    renderer.detail(name);
                }
            }
            Ok(())
        }
        cli::Command::Template { category, name } => {
            let outcome = handle
                .apply_template(category, &name)
                .await
                .map_err(|e| e.to_string())?;
            report_outcome(renderer, outcome);
            Ok(())
        }
        cli::Command::Reset { category, mode } => {
            let command = match mode {
                Some(mode) => SettingsCommand::ResetMode { category, mode },
                None => SettingsCommand::ResetToFactory { category },
            };
            let outcome = handle.dispatch(command).await.map_err(|e| e.to_string())?;
            report_outcome(renderer, outcome);
            Ok(())
        }
        cli::Command::Migrate => {
            print_startup_report(renderer, report);
            Ok(())
        }
    }
}

fn show(renderer: &Renderer, handle: &RuntimeHandle, category: Category, mode: Option<ViewerMode>) {
    let modes: Vec<ViewerMode> = match mode {
        Some(mode) => vec![mode],
        None => ViewerMode::ALL.to_vec(),
    };
    for mode in modes {
        let effective = handle.get_effective(category, mode);
        renderer.record(&format!("{category} ({mode})"), &effective.to_json());
    }
}

fn report_outcome(renderer: &Renderer, outcome: MutationOutcome) {
    if outcome.changed {
        renderer.activity(&format!(
            "{}: updated (revision {})",
            outcome.category, outcome.revision
        ));
    } else {
        renderer.activity(&format!("{}: unchanged", outcome.category));
    }
}

fn warn_about_loads(renderer: &Renderer, report: &StartupReport) {
    for load in &report.loads {
        if !matches!(load.status, LoadStatus::Defaults | LoadStatus::Loaded) {
            renderer.warn(&format!("{}: {}", load.category, load.status));
        }
    }
}

fn print_startup_report(renderer: &Renderer, report: &StartupReport) {
    renderer.section("legacy keys");
    for migration in &report.migrations {
        let detail = match &migration.outcome {
            MigrationOutcome::MigratedLegacyRetained(msg) | MigrationOutcome::Failed(msg) => {
                format!(" ({msg})")
            }
            _ => String::new(),
        };
        renderer.detail(&format!(
            "{} {}: {}{detail}",
            migration.category,
            migration.legacy_key,
            migration.outcome.label()
        ));
    }
    renderer.section("records");
    for load in &report.loads {
        renderer.detail(&format!("{}: {}", load.category, load.status));
    }
}

/// Stop the runtime and surface a failed final write.
async fn finish(handle: &RuntimeHandle) -> Result<(), String> {
    handle.shutdown().await.map_err(|e| e.to_string())?;
    match handle.save_status() {
        Some(status) => match &*status.borrow() {
            SaveStatus::Error(msg) => Err(format!("failed to save settings: {msg}")),
            _ => Ok(()),
        },
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_instance_sync_is_reported_as_ignored() {
        let mut config = Config::defaults_with_root(None);
        assert!(binary_warnings(&config).is_empty());

        config.sync.cross_instance = true;
        let warnings = binary_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sync.cross_instance"));
    }
}
