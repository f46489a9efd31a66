use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atelier_agent::{Agent, TurnGate};
use atelier_common::{ChangeSet, Config, SessionEvent};
use atelier_diff::{compute_diff, diff_stats, DiffKind};
use atelier_workspace::{load_dir, save_dir, PendingChanges, Workspace};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "atelier", version, about = "Atelier CLI - AI change review for a project directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// One agent turn: propose, review, apply or discard
    Chat {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
        /// What to ask the assistant (e.g., "add a dark mode toggle")
        #[arg(short, long)]
        goal: String,
        /// Auto-approve (no prompt)
        #[arg(long)]
        yes: bool,
        /// Wait for the full reply instead of streaming a live preview
        #[arg(long)]
        no_stream: bool,
        /// Emit session events as JSONL on stdout
        #[arg(long)]
        json: bool,
        /// Print the full line diff for every proposed file
        #[arg(long)]
        show_diff: bool,
    },

    /// Print the line diff between two files
    Diff {
        old: PathBuf,
        new: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat {
            path,
            goal,
            yes,
            no_stream,
            json,
            show_diff,
        } => {
            let cfg: Config = load_cfg("atelier.toml").context("load config")?;
            chat(&cfg, &path, &goal, yes, no_stream, json, show_diff).await?;
        }
        Commands::Diff { old, new } => {
            let old_text =
                fs::read_to_string(&old).with_context(|| format!("read {}", old.display()))?;
            let new_text =
                fs::read_to_string(&new).with_context(|| format!("read {}", new.display()))?;
            print_diff(&old_text, &new_text);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn chat(
    cfg: &Config,
    path: &Path,
    goal: &str,
    yes: bool,
    no_stream: bool,
    json: bool,
    show_diff: bool,
) -> Result<()> {
    let mut workspace = load_dir(path)?;
    if workspace.is_empty() {
        workspace = Workspace::with_default_project(&cfg.project.entry_point);
    }
    let files = workspace.entries();

    let agent = Agent::new(cfg.clone());
    let gate = TurnGate::new();
    let turn = gate.begin();

    let change_set: ChangeSet = if no_stream {
        agent.chat(goal, &files).await?
    } else {
        let mut last_len = 0usize;
        agent
            .chat_stream(goal, &files, &mut |preview| {
                if json {
                    emit(&SessionEvent::StreamText {
                        text: preview.to_string(),
                    });
                } else {
                    // Grow-only progress line; full text is printed at the end.
                    let shown = preview.lines().next().unwrap_or("");
                    if shown.len() != last_len {
                        last_len = shown.len();
                        eprint!("\r{shown}");
                        std::io::stderr().flush().ok();
                    }
                }
            })
            .await?
    };
    if !no_stream && !json {
        eprintln!();
    }

    // A completion for a superseded turn never reaches the store. The CLI
    // runs one turn per invocation, so this check cannot fire here; it
    // shows where a long-lived host (REPL, editor) must consult the gate
    // before staging.
    if !gate.is_current(turn) {
        tracing::info!("dropping completion for a stale turn");
        return Ok(());
    }

    if json {
        emit(&SessionEvent::Info {
            message: change_set.message.clone(),
        });
    } else {
        println!("{}", change_set.message);
    }

    if !change_set.has_code_change() {
        return Ok(());
    }

    let mut pending = PendingChanges::new();
    pending.stage(change_set);
    let (rows, totals) = pending.summaries(&workspace);

    if json {
        emit(&SessionEvent::Staged {
            files: rows.len(),
            additions: totals.additions,
            deletions: totals.deletions,
        });
    } else {
        eprintln!(
            "Proposed: {} file(s), +{}, -{}",
            rows.len(),
            totals.additions,
            totals.deletions
        );
        for row in &rows {
            eprintln!(
                "  {} {} (+{}, -{})",
                row.label, row.path, row.stats.additions, row.stats.deletions
            );
            if show_diff {
                if let Some(diff) = pending.preview(&workspace, &row.path) {
                    for line in diff {
                        eprintln!("    {}{}", prefix(line.kind), line.content);
                    }
                }
            }
        }
    }

    if !yes && !ask_approval()? {
        pending.discard();
        if json {
            emit(&SessionEvent::Discarded);
        } else {
            eprintln!("Discarded.");
        }
        return Ok(());
    }

    let touched = pending.apply(&mut workspace);
    save_dir(&workspace, path)?;
    // Deleted files are gone from the map; mirror that on disk.
    for rel in &touched {
        if workspace.get_file(rel).is_none() {
            let target = path.join(rel);
            if target.exists() {
                fs::remove_file(&target)
                    .with_context(|| format!("remove {}", target.display()))?;
            }
        }
    }
    if json {
        emit(&SessionEvent::Applied { files: touched });
    } else {
        println!("Applied {} change(s).", touched.len());
    }
    Ok(())
}

fn load_cfg(path: &str) -> Result<Config> {
    // Allow an override through the environment
    let cfg_path = std::env::var("ATELIER_CONFIG").unwrap_or_else(|_| path.to_string());
    let s = fs::read_to_string(&cfg_path)
        .with_context(|| format!("unable to read config at {}", cfg_path))?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

fn emit(event: &SessionEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(%err, "failed to serialize event"),
    }
}

fn prefix(kind: DiffKind) -> char {
    match kind {
        DiffKind::Added => '+',
        DiffKind::Removed => '-',
        DiffKind::Unchanged => ' ',
    }
}

fn print_diff(old_text: &str, new_text: &str) {
    let diff = compute_diff(old_text, new_text);
    for line in &diff {
        println!("{}{}", prefix(line.kind), line.content);
    }
    let stats = diff_stats(&diff);
    println!("+{}, -{}", stats.additions, stats.deletions);
}

fn ask_approval() -> Result<bool> {
    use std::io::{self, Write};
    eprint!("Apply these changes? [y/N] ");
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    let ans = buf.trim().to_lowercase();
    Ok(ans == "y" || ans == "yes")
}
