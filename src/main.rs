use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use hwpdoc::document::hwpx::apply_edits_to_file;
use hwpdoc::document::{
    TableGrid, export_csv_dir, load_document, load_tables_json, save_tables_json, set_cell,
    tables_to_json,
};
use hwpdoc::{Config, ExportFormat, TierPreference};

/// Extract text and tables from HWP/HWPX documents and edit HWPX tables in place
#[derive(Parser, Debug)]
#[command(name = "hwpdoc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flat text of a document
    Text {
        file: PathBuf,
    },

    /// Extract every table of a document
    Tables {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (json) or directory (csv); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write edited tables back into a copy of an HWPX archive
    Apply {
        file: PathBuf,

        /// JSON list of table grids, matched to the document's tables by position
        #[arg(short, long)]
        tables: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Only use the raw-text splicing editor
        #[arg(long)]
        splice_only: bool,
    },

    /// Set one cell in a JSON table list
    SetCell {
        json: PathBuf,
        table: usize,
        row: usize,
        col: usize,
        value: String,

        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    match cli.command {
        Command::Text { file } => run_text(&config, &file),
        Command::Tables {
            file,
            format,
            output,
        } => run_tables(&config, &file, format, output.as_deref()),
        Command::Apply {
            file,
            tables,
            output,
            splice_only,
        } => {
            let tier = if splice_only {
                TierPreference::Splice
            } else {
                config.editor.tier
            };
            run_apply(&file, &tables, &output, tier)
        }
        Command::SetCell {
            json,
            table,
            row,
            col,
            value,
            output,
        } => {
            let mut tables = load_tables_json(&json)
                .with_context(|| format!("failed to read {}", json.display()))?;
            set_cell(&mut tables, table, row, col, value)?;
            let target = output.unwrap_or(json);
            save_tables_json(&tables, &target, config.export.json_pretty)?;
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_text(config: &Config, file: &Path) -> Result<()> {
    let decoder = config.decoder();
    let loaded = load_document(file, decoder.as_ref())
        .with_context(|| format!("failed to load {}", file.display()))?;

    for (unit, reason) in &loaded.reasons {
        log::warn!("{unit}: {reason:?}");
    }
    match loaded.text {
        Some(text) => {
            print!("{text}");
            Ok(())
        }
        None => bail!("no text could be extracted from {}", file.display()),
    }
}

fn run_tables(
    config: &Config,
    file: &Path,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let decoder = config.decoder();
    let loaded = load_document(file, decoder.as_ref())
        .with_context(|| format!("failed to load {}", file.display()))?;
    for (unit, reason) in &loaded.reasons {
        log::warn!("{unit}: {reason:?}");
    }

    match format {
        ExportFormat::Json => {
            let json = tables_to_json(&loaded.tables, config.export.json_pretty)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        ExportFormat::Csv => {
            let dir = output.unwrap_or_else(|| Path::new("."));
            let written = export_csv_dir(&loaded.tables, dir, config.export.csv_bom)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        ExportFormat::Text => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_tables_text(&mut out, &loaded.tables)?;
        }
    }
    Ok(())
}

fn write_tables_text<W: Write>(out: &mut W, tables: &[TableGrid]) -> Result<()> {
    for (index, table) in tables.iter().enumerate() {
        writeln!(
            out,
            "# table {} ({}x{})",
            index + 1,
            table.row_count,
            table.col_count
        )?;
        for row in &table.rows {
            writeln!(out, "{}", row.join("\t"))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn run_apply(file: &Path, tables: &Path, output: &Path, tier: TierPreference) -> Result<()> {
    if file == output {
        bail!("refusing to overwrite the input archive; choose another --output");
    }
    let targets = load_tables_json(tables)
        .with_context(|| format!("failed to read {}", tables.display()))?;
    let report = apply_edits_to_file(file, &targets, output, tier)
        .with_context(|| format!("failed to edit {}", file.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
