//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stylestack::mode::ViewerMode;
use stylestack::settings::Category;

/// Inspect and edit layered viewer style settings.
#[derive(Debug, Parser)]
#[command(name = "stylestack", version)]
pub struct Args {
    /// Path to config file (default: ./stylestack.toml or ~/.config/stylestack/stylestack.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Store settings records in this directory.
    #[arg(long = "storage-dir", conflicts_with = "memory")]
    pub storage_dir: Option<PathBuf>,

    /// Keep settings in memory only; nothing is read or written on disk.
    #[arg(long = "memory")]
    pub memory: bool,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Print effective settings for a category.
    Show {
        category: Category,
        /// Viewer mode to resolve. Without it every mode is printed.
        mode: Option<ViewerMode>,
    },
    /// Apply one JSON-encoded settings command.
    ///
    /// Example: '{"updateGeneral":{"line":{"opacity":0.5}}}'
    Apply { command: String },
    /// List template names for a category.
    Templates { category: Category },
    /// Apply a named template to a category.
    Template { category: Category, name: String },
    /// Reset a category to factory defaults, or only one mode's layers.
    Reset {
        category: Category,
        #[arg(short = 'm', long = "mode")]
        mode: Option<ViewerMode>,
    },
    /// Move legacy records to the current keys and report what was found.
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;
    use stylestack::mode::ViewerMode;
    use stylestack::settings::Category;

    #[test]
    fn show_parses_category_and_optional_mode() {
        let args = Args::parse_from(["stylestack", "show", "line", "preview"]);
        assert_eq!(
            args.command,
            Command::Show {
                category: Category::Line,
                mode: Some(ViewerMode::Preview),
            }
        );

        let args = Args::parse_from(["stylestack", "show", "GRID"]);
        assert_eq!(
            args.command,
            Command::Show {
                category: Category::Grid,
                mode: None,
            }
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Args::try_parse_from(["stylestack", "show", "hatch"]).is_err());
    }

    #[test]
    fn memory_conflicts_with_storage_dir() {
        assert!(
            Args::try_parse_from(["stylestack", "--memory", "--storage-dir", "/tmp/s", "migrate"])
                .is_err()
        );
        let args = Args::parse_from(["stylestack", "--storage-dir", "/tmp/s", "migrate"]);
        assert_eq!(args.storage_dir.as_deref(), Some(std::path::Path::new("/tmp/s")));
        assert!(!args.memory);
    }

    #[test]
    fn template_takes_category_and_name() {
        let args = Args::parse_from(["stylestack", "-c", "x.toml", "template", "line", "cad"]);
        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert_eq!(
            args.command,
            Command::Template {
                category: Category::Line,
                name: "cad".to_string(),
            }
        );
    }
}
