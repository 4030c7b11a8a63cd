mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hazid",
    version,
    about = "Draft and export CMS safety hazard identification reports"
)]
struct Cli {
    /// Configuration file (default: <root>/hazid.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Application root holding the data/, src/assets/ and public/ folders
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List hazards grouped by category
    Hazards {
        /// Only show this category (any spelling)
        #[arg(short, long)]
        category: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List hazard category definitions with their template sections
    Definitions {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List known buildings
    Buildings,
    /// List the rooms of a building
    Rooms {
        building: String,
    },
    /// List useful web and email contacts
    Contacts {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List the sheets of a workbook
    Sheets {
        workbook: PathBuf,
    },
    /// Create and edit a draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Attach a file to a draft
    Upload {
        /// Draft JSON file
        draft: PathBuf,
        /// File to attach
        file: PathBuf,
    },
    /// List the files kept in the uploads directory
    Uploads,
    /// Export a draft as a Word report
    Export {
        /// Draft JSON file
        draft: PathBuf,

        /// Report path (default: the draft path with a .docx extension)
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Export even when required fields are missing
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Create an empty draft
    New { file: PathBuf },
    /// Print a draft
    Show {
        file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Set a text field (camelCase name, e.g. creatorName)
    Set {
        file: PathBuf,
        field: String,
        value: String,
    },
    /// Select a hazard category
    Select { file: PathBuf, category: String },
    /// Deselect a hazard category (its details are kept)
    Deselect { file: PathBuf, category: String },
    /// Select and edit a specific hazard of a category
    Detail {
        file: PathBuf,
        category: String,
        /// Sub-hazard identifier
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        details: Option<String>,

        #[arg(long)]
        recommendations: Option<String>,

        /// Mark the sub-hazard as not selected
        #[arg(long)]
        unselect: bool,
    },
    /// Show which required fields are still missing
    Status { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = commands::resolve_config(cli.config.as_deref(), cli.root);

    let result = config.and_then(|config| match cli.command {
        Commands::Hazards { category, output } => {
            commands::lookup::hazards(&config, category.as_deref(), &output)
        }
        Commands::Definitions { output } => commands::lookup::definitions(&config, &output),
        Commands::Buildings => commands::lookup::buildings(&config),
        Commands::Rooms { building } => commands::lookup::rooms(&config, &building),
        Commands::Contacts { output } => commands::lookup::contacts(&config, &output),
        Commands::Sheets { workbook } => commands::lookup::sheets(&workbook),
        Commands::Draft { action } => match action {
            DraftAction::New { file } => commands::draft::new(&file),
            DraftAction::Show { file, output } => commands::draft::show(&file, &output),
            DraftAction::Set { file, field, value } => commands::draft::set(&file, &field, &value),
            DraftAction::Select { file, category } => commands::draft::select(&file, &category),
            DraftAction::Deselect { file, category } => {
                commands::draft::deselect(&file, &category)
            }
            DraftAction::Detail {
                file,
                category,
                id,
                name,
                details,
                recommendations,
                unselect,
            } => commands::draft::detail(
                &config,
                &file,
                &category,
                &id,
                commands::draft::DetailEdits {
                    name,
                    details,
                    recommendations,
                    unselect,
                },
            ),
            DraftAction::Status { file } => commands::draft::status(&file),
        },
        Commands::Upload { draft, file } => commands::upload::run(&config, &draft, &file),
        Commands::Uploads => commands::upload::list(&config),
        Commands::Export { draft, out, force } => {
            commands::export::run(&config, &draft, out, force)
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
