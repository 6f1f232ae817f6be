use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use treequill::command::{parse_script, run_script, SessionOutcome};
use treequill::config::Config;
use treequill::editor::flat::FlatEditor;
use treequill::editor::tree::TreeEditor;
use treequill::fields::{FieldSet, NoValidator, RecordValidation};
use treequill::file::loader::{load_collection_file, load_collection_from_stdin, load_field_set};
use treequill::file::saver::{save_collection_file, serialize_collection};
use treequill::file::{CollectionDocument, CollectionKind, DocumentFormat};
use treequill::logging::{init_logging, LogConfig};

/// treequill - edit ordered and hierarchical record collections
#[derive(Parser)]
#[command(name = "treequill")]
#[command(version)]
#[command(about = "Edit ordered and hierarchical record collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Collection shape (detected from the content when omitted)
    #[arg(long, global = true, value_enum)]
    kind: Option<KindArg>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print a collection the way the editor would save it
    Show {
        /// Collection file, or - for stdin
        file: String,
    },
    /// Replay an edit script against a collection
    Apply {
        /// Collection file, or - for stdin
        file: String,
        /// YAML or JSON list of edit commands
        script: PathBuf,
        /// Where to write the saved collection (defaults to FILE)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Field descriptors used to validate records
        #[arg(long)]
        fields: Option<PathBuf>,
    },
    /// Validate every record against a field set
    Check {
        /// Collection file, or - for stdin
        file: String,
        /// Field descriptors used to validate records
        #[arg(long)]
        fields: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Flat,
    Tree,
}

impl From<KindArg> for CollectionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Flat => CollectionKind::Flat,
            KindArg::Tree => CollectionKind::Tree,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config =
        LogConfig::from_flags(cli.verbose, cli.quiet).with_ansi(io::stderr().is_terminal());
    init_logging(&log_config)?;

    let config = Config::load();
    let kind = cli.kind.map(CollectionKind::from);

    match cli.command {
        Command::Show { file } => show(&file, kind, &config),
        Command::Apply {
            file,
            script,
            output,
            fields,
        } => apply(&file, &script, output.as_deref(), fields.as_deref(), kind, &config),
        Command::Check { file, fields } => {
            let invalid = check(&file, &fields, kind, &config)?;
            if invalid > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load(file: &str, kind: Option<CollectionKind>) -> Result<CollectionDocument> {
    if file == "-" {
        load_collection_from_stdin(kind)
    } else {
        load_collection_file(file, kind)
    }
}

fn output_format(file: &str) -> DocumentFormat {
    if file == "-" {
        DocumentFormat::Yaml
    } else {
        DocumentFormat::from_path(file)
    }
}

fn show(file: &str, kind: Option<CollectionKind>, config: &Config) -> Result<()> {
    let doc = match load(file, kind)? {
        CollectionDocument::Flat(items) => {
            CollectionDocument::Flat(FlatEditor::open(items, config.editor_options()).to_items())
        }
        CollectionDocument::Tree(root) => {
            let editor = TreeEditor::open(Some(root), config.editor_options());
            CollectionDocument::Tree(editor.tree().to_item())
        }
    };

    let text = serialize_collection(&doc, output_format(file), config.indent_size)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn apply(
    file: &str,
    script: &Path,
    output: Option<&Path>,
    fields: Option<&Path>,
    kind: Option<CollectionKind>,
    config: &Config,
) -> Result<()> {
    let doc = load(file, kind)?;
    let script_text = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let commands = parse_script(&script_text)?;
    let fields = fields.map(load_field_set).transpose()?;

    let report = run_script(doc, &commands, config.editor_options(), fields.as_ref())?;
    eprintln!(
        "{} command(s) applied, {} skipped",
        report.applied, report.skipped
    );

    match report.outcome {
        SessionOutcome::Saved(saved) => {
            let target = match (output, file) {
                (Some(path), _) => path.to_path_buf(),
                (None, "-") => anyhow::bail!("Reading from stdin requires --output"),
                (None, path) => PathBuf::from(path),
            };
            save_collection_file(&target, &saved, config)?;
            eprintln!("Saved {}", target.display());
        }
        SessionOutcome::Cancelled => eprintln!("Cancelled; nothing written"),
        SessionOutcome::Open => eprintln!("Script did not save; nothing written"),
    }
    Ok(())
}

/// Prints every validation error and returns the number of invalid records.
fn check(
    file: &str,
    fields_path: &Path,
    kind: Option<CollectionKind>,
    config: &Config,
) -> Result<usize> {
    let fields = load_field_set(fields_path)?;
    let mut invalid = 0;
    let mut report = |label: String, result: RecordValidation| {
        if !result.is_valid() {
            invalid += 1;
            for (field, message) in result.errors() {
                println!("{}: {}: {}", label, field, message);
            }
        }
    };

    match load(file, kind)? {
        CollectionDocument::Flat(items) => {
            let mut editor = FlatEditor::open(items, config.editor_options());
            for index in 0..editor.len() {
                let result = editor.validate_with(index, &fields, &NoValidator)?;
                report(format!("item {}", index + 1), result);
            }
        }
        CollectionDocument::Tree(root) => {
            check_tree(root, &fields, config, &mut report);
        }
    }

    if invalid == 0 {
        eprintln!("All records are valid");
    }
    Ok(invalid)
}

fn check_tree(
    root: treequill::document::node::TreeItem<serde_json::Value>,
    fields: &FieldSet,
    config: &Config,
    report: &mut impl FnMut(String, RecordValidation),
) {
    let mut editor = TreeEditor::open(Some(root), config.editor_options());
    let root_key = editor.root_key();
    let keys = editor.tree().root().subtree_keys();
    for key in keys {
        if key == root_key {
            continue;
        }
        let label = match editor.tree().path_of(key) {
            Some(path) => format!("node {:?}", path),
            None => format!("node {}", key),
        };
        if let Some(result) = editor.validate_with(key, fields, &NoValidator) {
            report(label, result);
        }
    }
}
