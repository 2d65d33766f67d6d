use clap::{Parser, Subcommand};
use guidebook::{config, site};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "guidebook")]
#[command(about = "Static site generator for game mod field guides")]
#[command(long_about = "\
Static site generator for game mod field guides

Converts a mod's in-game guide book (JSON categories, entries, and pages with
inline markup) into a static multi-language HTML site.

Book structure:

  book/
  ├── guidebook.toml               # Site config (optional)
  ├── en_us/
  │   ├── categories/
  │   │   └── stone_age.json       # { name, description, sortnum }
  │   └── entries/
  │       └── stone_age/
  │           └── knapping.json    # { name, category, sortnum, pages }
  └── ja_jp/                       # One directory per configured language
      └── ...

Recipe references resolve against the mod data tree (--data-dir) and image
references against the asset tree (--assets-dir). Output lands one directory
per language plus a shared _images/ directory.

Run 'guidebook gen-config' to generate a documented guidebook.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Book directory (contains guidebook.toml and language subdirectories)
    #[arg(long, default_value = "book", global = true)]
    book_dir: PathBuf,

    /// Mod asset directory, for image references
    #[arg(long, default_value = "assets", global = true)]
    assets_dir: PathBuf,

    /// Mod data directory, for recipe references
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Output directory
    #[arg(long, default_value = "out", global = true)]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the full site
    Build,
    /// Parse the book and report problems without writing anything
    Check,
    /// Print a stock guidebook.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let request = site::BuildRequest {
        book_dir: cli.book_dir.clone(),
        assets_dir: cli.assets_dir,
        data_dir: cli.data_dir,
        output_dir: cli.output.clone(),
    };

    match cli.command {
        Command::Build => {
            let config = config::load_config(&cli.book_dir)?;
            let summary = site::build(&config, &request)?;
            println!(
                "Generated {} page(s) across {} language(s) at {}",
                summary.categories + summary.entries + summary.languages,
                summary.languages,
                cli.output.display()
            );
            report(summary.warnings, summary.errors);
        }
        Command::Check => {
            let config = config::load_config(&cli.book_dir)?;
            let summary = site::check(&config, &request)?;
            println!(
                "Checked {} categor(ies), {} entr(ies) across {} language(s)",
                summary.categories, summary.entries, summary.languages
            );
            report(summary.warnings, summary.errors);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Print the diagnostic tally; a run with errors exits nonzero so CI catches
/// broken books.
fn report(warnings: usize, errors: usize) {
    if warnings > 0 {
        println!("{warnings} warning(s)");
    }
    if errors > 0 {
        println!("{errors} error(s)");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
