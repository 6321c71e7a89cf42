use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tasktrack::config::Config;
use tasktrack::{LabelId, Store, Task, TaskId, UserId, now_secs};

#[derive(Parser)]
#[command(name = "tasktrack")]
#[command(about = "tasktrack CLI - Task records with label associations on SQLite")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Database connection string (path, :memory: or file: URI); overrides the config file
    #[arg(short, long)]
    database: Option<String>,

    /// Path to the config file (default: <config dir>/tasktrack/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new task
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short = 'b', long, default_value = "")]
        content: String,

        #[arg(short, long, default_value_t = 0)]
        author: UserId,

        #[arg(long, default_value_t = 0)]
        assignee: UserId,

        /// Label id to attach (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<LabelId>,
    },

    /// List tasks, optionally filtered by author or label
    List {
        #[arg(short, long, conflicts_with = "label")]
        author: Option<UserId>,

        #[arg(short, long)]
        label: Option<LabelId>,
    },

    /// Show one task
    Show { id: TaskId },

    /// Edit a task; unspecified fields keep their current values
    Update {
        id: TaskId,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'b', long)]
        content: Option<String>,

        #[arg(short, long)]
        author: Option<UserId>,

        #[arg(long)]
        assignee: Option<UserId>,

        /// Replace the label set (comma separated)
        #[arg(short, long, value_delimiter = ',', conflicts_with = "clear_labels")]
        labels: Option<Vec<LabelId>>,

        /// Remove every label
        #[arg(long)]
        clear_labels: bool,

        /// Mark the task closed now
        #[arg(long, conflicts_with = "reopen")]
        close: bool,

        /// Mark the task open again
        #[arg(long)]
        reopen: bool,
    },

    /// Delete a task and its label associations
    Delete { id: TaskId },
}

fn main() -> Result<()> {
    // Setup tracing; stdout is reserved for command output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let database = cli.database.unwrap_or(config.database);
    ensure_parent_dir(&database)?;

    let mut store = Store::open(&database).context("Failed to open task store")?;

    match cli.command {
        Commands::Add {
            title,
            content,
            author,
            assignee,
            labels,
        } => {
            let task = Task {
                author_id: author,
                assigned_id: assignee,
                title,
                content,
                label_ids: labels,
                ..Default::default()
            };
            let id = store.create_task(&task).context("Failed to create task")?;
            if cli.json {
                println!("{}", serde_json::json!({ "id": id }));
            } else {
                println!("Created task {}", format!("#{}", id).cyan().bold());
            }
        }
        Commands::List { author, label } => {
            let tasks = match (author, label) {
                (Some(author), _) => store.tasks_by_author(author)?,
                (None, Some(label)) => store.tasks_by_label(label)?,
                (None, None) => store.tasks()?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks");
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        Commands::Show { id } => {
            let task = store.task(id).context(format!("Failed to load task {}", id))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print_task(&task);
            }
        }
        Commands::Update {
            id,
            title,
            content,
            author,
            assignee,
            labels,
            clear_labels,
            close,
            reopen,
        } => {
            // Updates are whole-record: fetch, edit, write back
            let mut task = store.task(id).context(format!("Failed to load task {}", id))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(content) = content {
                task.content = content;
            }
            if let Some(author) = author {
                task.author_id = author;
            }
            if let Some(assignee) = assignee {
                task.assigned_id = assignee;
            }
            if let Some(labels) = labels {
                task.label_ids = labels;
            }
            if clear_labels {
                task.label_ids.clear();
            }
            if close {
                task.closed = now_secs();
            }
            if reopen {
                task.closed = 0;
            }

            store.update_task(&task).context(format!("Failed to update task {}", id))?;
            let task = store.task(id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print_task(&task);
            }
        }
        Commands::Delete { id } => {
            store.delete_task(id).context(format!("Failed to delete task {}", id))?;
            if cli.json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted task {}", format!("#{}", id).cyan().bold());
            }
        }
    }

    Ok(())
}

/// Create the directory holding a file-backed database
fn ensure_parent_dir(database: &str) -> Result<()> {
    if database == ":memory:" || database.starts_with("file:") {
        return Ok(());
    }

    match Path::new(database).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        _ => {}
    }
    Ok(())
}

fn print_task(task: &Task) {
    let status = if task.is_closed() {
        "closed".red()
    } else {
        "open".green()
    };
    println!(
        "{} {} [{}]",
        format!("#{}", task.id).cyan().bold(),
        task.title.bold(),
        status
    );
    println!("    opened:   {}", format_timestamp(task.opened));
    if task.is_closed() {
        println!("    closed:   {}", format_timestamp(task.closed));
    }
    println!("    author:   {}", task.author_id);
    println!("    assignee: {}", task.assigned_id);
    if !task.label_ids.is_empty() {
        let labels: Vec<String> = task.label_ids.iter().map(|l| l.to_string()).collect();
        println!("    labels:   {}", labels.join(", ").yellow());
    }
    if !task.content.is_empty() {
        println!("    {}", task.content.dimmed());
    }
}

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
