//! kitodo-metadata - Inspect and normalise process metadata against a ruleset
//!
//! Subcommands:
//! - `table`: show the fielded metadata table of a division
//! - `preserve`: rebuild a division's metadata from its table and write it out
//! - `positions`: list where a new division may be linked into a logical structure

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use kitodo_common::config::{ConfigResolver, TomlConfig};
use kitodo_common::logging::init_logging;
use kitodo_metadata::process::{NoProcesses, ProcessDirectory, ProcessLookup};
use kitodo_metadata::ruleset::declared::DeclaredRuleset;
use kitodo_metadata::ruleset::Ruleset;
use kitodo_metadata::{Division, FieldedMetadataNode, InsertionPositionResolver, LeadingFields, Row};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kitodo-metadata", version)]
#[command(about = "Inspect and normalise process metadata against a ruleset")]
struct Cli {
    /// Configuration file (default: $KITODO_CONFIG, then the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Metadata language priority list, e.g. "de, en;q=0.8"
    #[arg(long, global = true, env = "KITODO_METADATA_LANGUAGE")]
    language: Option<String>,

    /// Acquisition stage passed to the ruleset
    #[arg(long, global = true, env = "KITODO_ACQUISITION_STAGE")]
    stage: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the metadata table of a division
    Table {
        /// Ruleset file (TOML)
        #[arg(long, value_name = "FILE")]
        ruleset: Option<PathBuf>,

        /// Division document (JSON)
        #[arg(long, value_name = "FILE")]
        division: PathBuf,

        /// Additionally show this field, even without data
        #[arg(long = "show", value_name = "KEY")]
        show: Vec<String>,
    },

    /// Preserve the metadata table and write the normalised division
    Preserve {
        #[arg(long, value_name = "FILE")]
        ruleset: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        division: PathBuf,

        /// Output file (default: stdout)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List insertion positions for a new division
    Positions {
        #[arg(long, value_name = "FILE")]
        ruleset: Option<PathBuf>,

        /// Logical structure of the parent process (JSON)
        #[arg(long, value_name = "FILE")]
        logical: PathBuf,

        /// Division type of the new process
        #[arg(long)]
        doc_type: String,

        /// Directory with linked process documents (`<id>.json`)
        #[arg(long, value_name = "DIR")]
        processes: Option<PathBuf>,
    },
}

/// Settings from configuration file and command line
struct Settings {
    config: TomlConfig,
    priority: Vec<String>,
    stage: String,
}

impl Settings {
    fn ruleset(&self, cli_arg: Option<PathBuf>) -> Result<DeclaredRuleset> {
        let path = cli_arg
            .or_else(|| self.config.ruleset.clone())
            .ok_or_else(|| anyhow!("no ruleset given (use --ruleset or set `ruleset` in config.toml)"))?;
        info!("Ruleset: {}", path.display());
        DeclaredRuleset::load(&path).with_context(|| format!("Failed to load ruleset {}", path.display()))
    }

    fn root_node(&self, ruleset: &DeclaredRuleset, division: Division) -> Result<FieldedMetadataNode> {
        let division_type = division.division_type.clone().unwrap_or_default();
        let view = ruleset.structural_element_view(&division_type, &self.stage, &self.priority);
        FieldedMetadataNode::root(division, view)
            .with_context(|| format!("Failed to build metadata table for \"{}\"", division_type))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigResolver::new("kitodo-metadata").resolve(cli.config.as_deref());
    init_logging(&config.logging);

    info!(
        "Starting kitodo-metadata v{}",
        env!("CARGO_PKG_VERSION")
    );

    let priority = match cli.language.as_deref() {
        Some(languages) => kitodo_common::config::language_priority(languages),
        None => config.language_priority(),
    };
    let stage = cli
        .stage
        .clone()
        .unwrap_or_else(|| config.acquisition_stage().to_string());
    let settings = Settings {
        config,
        priority,
        stage,
    };

    match cli.command {
        Command::Table {
            ruleset,
            division,
            show,
        } => table(&settings, ruleset, &division, &show),
        Command::Preserve {
            ruleset,
            division,
            output,
        } => preserve(&settings, ruleset, &division, output.as_deref()),
        Command::Positions {
            ruleset,
            logical,
            doc_type,
            processes,
        } => positions(&settings, ruleset, &logical, &doc_type, processes),
    }
}

fn load_division(path: &Path) -> Result<Division> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn table(settings: &Settings, ruleset: Option<PathBuf>, division: &Path, show: &[String]) -> Result<()> {
    let ruleset = settings.ruleset(ruleset)?;
    let mut node = settings.root_node(&ruleset, load_division(division)?)?;
    for key in show {
        node.add_additionally_selected_field(key, &[])
            .with_context(|| format!("Failed to show field \"{}\"", key))?;
    }

    println!("{} ({})", node.label(), node.metadata_id());
    print_rows(&node, &[], 1)?;
    if !node.is_valid(&[]) {
        println!("Table contains invalid values");
    }
    Ok(())
}

/// Markers: `*` required, `!` invalid, `?` not defined by the ruleset,
/// `~` read-only
fn print_rows(node: &FieldedMetadataNode, outer: &[LeadingFields], depth: usize) -> Result<()> {
    let leading = node.leading_levels(outer);
    let indent = "  ".repeat(depth);
    for (index, row) in node.rows().iter().enumerate() {
        let mut markers = String::new();
        if node.is_row_required(index)? {
            markers.push('*');
        }
        if !row.is_valid(&leading) {
            markers.push('!');
        }
        if row.is_undefined() {
            markers.push('?');
        }
        if !row.is_editable() {
            markers.push('~');
        }
        let markers = if markers.is_empty() {
            markers
        } else {
            format!(" [{}]", markers)
        };

        match row {
            Row::Group(group) => {
                println!("{}{}{}", indent, row.label(), markers);
                print_rows(group, &leading, depth + 1)?;
            }
            _ => println!("{}{} = {}{}", indent, row.label(), row.display_value(), markers),
        }
    }
    if !node.hidden_metadata().is_empty() {
        println!("{}({} hidden)", indent, node.hidden_metadata().len());
    }
    Ok(())
}

fn preserve(settings: &Settings, ruleset: Option<PathBuf>, division: &Path, output: Option<&Path>) -> Result<()> {
    let ruleset = settings.ruleset(ruleset)?;
    let mut node = settings.root_node(&ruleset, load_division(division)?)?;
    node.preserve().context("Failed to preserve metadata")?;
    let division = node
        .into_division()
        .ok_or_else(|| anyhow!("root node without division"))?;
    let json = serde_json::to_string_pretty(&division).context("Failed to serialize division")?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn positions(
    settings: &Settings,
    ruleset: Option<PathBuf>,
    logical: &Path,
    doc_type: &str,
    processes: Option<PathBuf>,
) -> Result<()> {
    let ruleset = settings.ruleset(ruleset)?;
    let logical = load_division(logical)?;
    let processes: Box<dyn ProcessLookup> = match processes.or_else(|| settings.config.process_directory.clone()) {
        Some(dir) => Box::new(ProcessDirectory::new(dir)),
        None => Box::new(NoProcesses),
    };

    let positions = InsertionPositionResolver::new(&ruleset, processes.as_ref())
        .with_acquisition_stage(&settings.stage)
        .with_priority(&settings.priority)
        .resolve(&logical, doc_type)?
        .require_any()?;

    let default = positions.default_selection().map(|p| p.path.clone());
    for position in &positions.positions {
        let marker = if Some(&position.path) == default.as_ref() { "*" } else { " " };
        println!(
            "{} {}\t{}\t{}",
            marker,
            position.path,
            position.label,
            position.tooltip.join("; ")
        );
    }
    Ok(())
}
