use anyhow::{Context, Result};
use chunk_patcher::{
    apply_changes, preview_changes, ChangeList, Diagnostic, FileStatus, LocalStore, Operation,
    PlannedAction,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Operation-format guide for prompting a model (versioned template).
const OPERATION_GUIDE: &str = include_str!("../templates/operation-guide.md");

/// Files without a code extension that still belong in model context.
const CONTEXT_CONFIG_FILES: &[&str] = &[
    "Procfile",
    "Dockerfile",
    "Makefile",
    ".gitignore",
    "requirements.txt",
];

const CONTEXT_EXTENSIONS: &[&str] = &[
    "py", "md", "txt", "js", "html", "css", "json", "rs", "toml",
];

#[derive(Parser)]
#[command(name = "chunk-patcher")]
#[command(about = "Apply LLM-proposed chunk edits to a workspace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a change list to a workspace
    Apply {
        /// Path to the change list (response JSON or bare operation array)
        changes: PathBuf,

        /// Path to workspace root (defaults to CHUNK_WORKSPACE or the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Dry run - show what would change without touching files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Parse a change list and report malformed operations
    Validate {
        /// Path to the change list
        changes: PathBuf,
    },

    /// Render workspace files with line numbers for model context
    Context {
        /// Path to workspace root (defaults to CHUNK_WORKSPACE or the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Print the operation-format guide for prompting a model
    Guide,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            changes,
            workspace,
            dry_run,
            diff,
        } => cmd_apply(changes, workspace, dry_run, diff),

        Commands::Validate { changes } => cmd_validate(changes),

        Commands::Context { workspace } => cmd_context(workspace),

        Commands::Guide => {
            print!("{OPERATION_GUIDE}");
            Ok(())
        }
    }
}

/// Resolve workspace path: explicit flag, CHUNK_WORKSPACE, then the current
/// directory.
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace not found: {}", path.display()));
    }

    if let Ok(env_path) = env::var("CHUNK_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: CHUNK_WORKSPACE is set but path doesn't exist: {env_path}").yellow()
        );
    }

    Ok(env::current_dir()?)
}

fn load_change_list(path: &Path) -> Result<ChangeList> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read change list from {}", path.display()))?;
    ChangeList::from_llm_text(&text)
        .with_context(|| format!("failed to parse change list from {}", path.display()))
}

/// Show unified diff between original and planned content.
fn display_diff(file: &str, original: &str, modified: &str) {
    println!("\n{}", format!("--- {file} (original)").dimmed());
    println!("{}", format!("+++ {file} (patched)").dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        for line in diagnostic.to_string().lines() {
            eprintln!("    {}", line.yellow());
        }
    }
}

fn cmd_apply(
    changes_path: PathBuf,
    workspace: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let list = load_change_list(&changes_path)?;

    println!("Workspace: {}", workspace.display());
    if let Some(message) = &list.message {
        println!("{}", message.dimmed());
    }
    println!();

    if list.changes.is_empty() {
        println!("{}", "No changes in list".yellow());
        return Ok(());
    }

    let mut store = LocalStore::new(&workspace);

    let mut total_updated = 0;
    let mut total_deleted = 0;
    let mut total_skipped = 0;
    let mut total_failed = 0;
    let mut total_diagnostics = 0;

    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
        let plans = preview_changes(&store, &list.changes);
        for plan in plans {
            total_diagnostics += plan.diagnostics.len();
            match &plan.action {
                PlannedAction::Update { content } => {
                    println!("{} Would update {}", "✓".green(), plan.file);
                    total_updated += 1;
                    if show_diff {
                        let original = plan.original.as_deref().unwrap_or("");
                        if original != content {
                            display_diff(&plan.file, original, content);
                        }
                    }
                }
                PlannedAction::Delete => {
                    println!("{} Would delete {}", "✓".green(), plan.file);
                    total_deleted += 1;
                }
                PlannedAction::SkipDelete => {
                    println!(
                        "{} Would skip delete {} (file not found)",
                        "⊘".cyan(),
                        plan.file
                    );
                    total_skipped += 1;
                }
                PlannedAction::Fail { error } => {
                    eprintln!("{} {}: {}", "✗".red(), plan.file, error);
                    total_failed += 1;
                }
            }
            print_diagnostics(&plan.diagnostics);
        }
    } else {
        // Capture originals before applying so --diff can render them.
        let originals = if show_diff {
            preview_changes(&store, &list.changes)
                .into_iter()
                .map(|plan| (plan.file.clone(), plan.original.unwrap_or_default()))
                .collect()
        } else {
            Vec::new()
        };

        let reports = apply_changes(&mut store, &list.changes);
        for report in reports {
            total_diagnostics += report.diagnostics.len();
            match &report.status {
                FileStatus::Updated { .. } => {
                    println!("{} {}", "✓".green(), report);
                    total_updated += 1;
                    if show_diff {
                        if let Some((_, before)) =
                            originals.iter().find(|(file, _)| *file == report.file)
                        {
                            if let Ok(after) =
                                fs::read_to_string(workspace.join(&report.file))
                            {
                                if *before != after {
                                    display_diff(&report.file, before, &after);
                                }
                            }
                        }
                    }
                }
                FileStatus::Deleted => {
                    println!("{} {}", "✓".green(), report);
                    total_deleted += 1;
                }
                FileStatus::SkippedDelete => {
                    println!("{} {}", "⊘".cyan(), report);
                    total_skipped += 1;
                }
                FileStatus::Failed { .. } => {
                    eprintln!("{} {}", "✗".red(), report);
                    total_failed += 1;
                }
            }
            print_diagnostics(&report.diagnostics);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} updated", format!("{total_updated}").green());
    println!("  {} deleted", format!("{total_deleted}").green());
    println!("  {} skipped", format!("{total_skipped}").cyan());
    println!("  {} failed", format!("{total_failed}").red());
    if total_diagnostics > 0 {
        println!(
            "  {} operations skipped with diagnostics",
            format!("{total_diagnostics}").yellow()
        );
    }

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_validate(changes_path: PathBuf) -> Result<()> {
    let list = load_change_list(&changes_path)?;

    let mut malformed = 0;
    for (idx, raw) in list.changes.iter().enumerate() {
        match Operation::from_raw(raw) {
            Ok(_) => {
                println!(
                    "{} [{}] {} {}",
                    "✓".green(),
                    idx,
                    raw.action,
                    raw.file.dimmed()
                );
            }
            Err(err) => {
                eprintln!("{} [{}] {}", "✗".red(), idx, err);
                malformed += 1;
            }
        }
    }

    println!();
    if malformed > 0 {
        anyhow::bail!("{malformed} of {} operations malformed", list.changes.len());
    }
    println!("{} operations OK", list.changes.len());
    Ok(())
}

/// Render workspace files with line numbers, the format the engine expects
/// model-proposed line references against.
fn cmd_context(workspace: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;

    for entry in WalkDir::new(&workspace)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name().to_str() != Some(".git"))
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_context_file(entry.path()) {
            continue;
        }

        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(&workspace)
            .unwrap_or(entry.path());

        println!("--- FILE: {} ---", relative.display());
        for (idx, line) in content.split('\n').enumerate() {
            println!("{} | {}", idx + 1, line);
        }
    }

    Ok(())
}

fn is_context_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if CONTEXT_CONFIG_FILES.contains(&name) {
            return true;
        }
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONTEXT_EXTENSIONS.contains(&ext))
}
