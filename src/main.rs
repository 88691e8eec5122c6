use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

mod api;
mod cart;
mod database;
mod image;
mod import;
mod query;
mod resolve;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,

    /// Overrides the default on-disk database location.
    #[arg(long)]
    database: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        address: String,
        /// Where uploaded recipe images are written.
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Seed the ingredient reference table from a name,unit CSV.
    ImportIngredients { path: PathBuf },
    /// Create a tag.
    AddTag {
        name: String,
        color: String,
        slug: String,
    },
}

/// This is where the database and uploaded media live on-disk. On Linux it
/// should be like: `~/.local/share/kitchenlog/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("kitchenlog");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();
    let database_path = match args.database {
        Some(path) => path,
        None => data_path()?.join("data.sqlite"),
    };
    let conn = database::establish_connection(&database_path)?;

    match args.commands {
        Commands::Serve { address, media } => {
            let media_dir = match media {
                Some(dir) => dir,
                None => data_path()?.join("media"),
            };
            let state = api::AppState::new(conn, media_dir);
            api::serve(&address, state).await?;
        }
        Commands::ImportIngredients { path } => import::import_ingredients(conn, path)?,
        Commands::AddTag { name, color, slug } => {
            let mut conn = conn;
            let tag = query::insert_tag(&mut conn, &name, &color, &slug)?;
            log::info!("created tag {} ({})", tag.name, tag.slug);
        }
    }
    Ok(())
}
