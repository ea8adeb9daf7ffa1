use clap::{Parser, Subcommand};
use trellis::output::Format;
use trellis::task_id::TaskId;

#[derive(Parser)]
#[command(
    name = "trellis",
    version,
    about = "Hierarchical task tracker with dependency-aware scheduling"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .trellis/ directory in the current directory
    Init,
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long, short)]
        description: Option<String>,
        /// Parent task ID (creates a child)
        #[arg(long)]
        parent: Option<String>,
        /// Task IDs this task depends on (comma-separated)
        #[arg(long, value_delimiter = ',')]
        depends_on: Vec<String>,
        /// Custom field as key=value (repeatable)
        #[arg(long = "field")]
        field: Vec<String>,
        /// Initial status (default from config)
        #[arg(long)]
        status: Option<String>,
    },
    /// Display a single task
    Show {
        /// Task ID to show
        id: String,
    },
    /// List tasks
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Show only ready tasks (not done, all dependencies done)
        #[arg(long)]
        ready: bool,
    },
    /// Edit task fields
    Edit {
        /// Task ID to edit
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Replace description
        #[arg(long, short)]
        description: Option<String>,
        /// Custom field as key=value (repeatable)
        #[arg(long = "field")]
        field: Vec<String>,
    },
    /// Append a line to a task's description
    Append {
        /// Task ID
        id: String,
        /// Text to append
        text: String,
    },
    /// Set a task's status
    Status {
        /// Task ID
        id: String,
        /// New status (must be in the configured vocabulary)
        status: String,
    },
    /// Add dependency edges (task is not ready until deps are done)
    Depend {
        /// Task ID that will gain dependencies
        id: String,
        /// IDs of tasks it depends on (comma-separated)
        #[arg(long, required = true, value_delimiter = ',')]
        on: Vec<String>,
    },
    /// Remove dependency edges
    Undepend {
        /// Task ID to remove dependencies from
        id: String,
        /// IDs of dependencies to remove (comma-separated)
        #[arg(long, required = true, value_delimiter = ',')]
        on: Vec<String>,
    },
    /// Delete a task by ID
    Delete {
        /// Task ID to delete
        id: String,
        /// Also delete the task's entire subtree
        #[arg(long)]
        recursive: bool,
    },
    /// Move a leaf task under a new top-level parent
    Move {
        /// Task ID to move
        id: String,
        /// New parent task ID (must be top-level)
        #[arg(long, required = true)]
        to: String,
    },
    /// Show the next ready task
    Next {
        /// Show every ready task instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Display the parent-child task hierarchy
    Tree {
        /// Root task ID (omit for the full forest)
        id: Option<String>,
    },
    /// Reconcile the content store against the index
    Check {
        /// Repair what can be repaired
        #[arg(long)]
        fix: bool,
    },
}

fn parse_id(input: String) -> trellis::error::Result<TaskId> {
    TaskId::parse(&input)
}

fn parse_ids(inputs: Vec<String>) -> trellis::error::Result<Vec<TaskId>> {
    inputs.into_iter().map(parse_id).collect()
}

fn run(cli: Cli, format: Format) -> trellis::error::Result<()> {
    if let Commands::Init = cli.command {
        let cwd = std::env::current_dir()?;
        return trellis::commands::init::run(&cwd);
    }

    let root = trellis::store::repo::find_repo_root()?;

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Create {
            title,
            description,
            parent,
            depends_on,
            field,
            status,
        } => trellis::commands::create::run(
            &root,
            title,
            description,
            parent.map(parse_id).transpose()?,
            parse_ids(depends_on)?,
            field,
            status,
            format,
        ),
        Commands::Show { id } => trellis::commands::show::run(&root, &parse_id(id)?, format),
        Commands::List { status, ready } => {
            trellis::commands::list::run(&root, status, ready, format)
        }
        Commands::Edit {
            id,
            title,
            description,
            field,
        } => trellis::commands::edit::run(&root, &parse_id(id)?, title, description, field, format),
        Commands::Append { id, text } => {
            trellis::commands::append::run(&root, &parse_id(id)?, &text, format)
        }
        Commands::Status { id, status } => {
            trellis::commands::status::run(&root, &parse_id(id)?, status, format)
        }
        Commands::Depend { id, on } => {
            trellis::commands::deps::depend(&root, &parse_id(id)?, parse_ids(on)?, format)
        }
        Commands::Undepend { id, on } => {
            trellis::commands::deps::undepend(&root, &parse_id(id)?, parse_ids(on)?, format)
        }
        Commands::Delete { id, recursive } => {
            trellis::commands::delete::run(&root, &parse_id(id)?, recursive, format)
        }
        Commands::Move { id, to } => {
            trellis::commands::move_task::run(&root, &parse_id(id)?, &parse_id(to)?, format)
        }
        Commands::Next { all } => trellis::commands::next::run(&root, all, format),
        Commands::Tree { id } => {
            trellis::commands::tree::run(&root, id.map(parse_id).transpose()?, format)
        }
        Commands::Check { fix } => trellis::commands::check::run(&root, fix, format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
