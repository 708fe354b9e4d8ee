//! # Report CLI
//!
//! Command-line interface for report templates.
//!
//! ## Usage
//!
//! ```bash
//! # Render a filled report; the format follows the output extension
//! report render --template lab_report.json --data patient.json --output report.pdf
//!
//! # PNG at 300 dpi with fonts from a config file
//! report render --template lab_report.json --data patient.json --output report.png \
//!     --config engine.json --dpi 300
//!
//! # Check a template without rendering it
//! report validate --template lab_report.json
//!
//! # Dump the designer surface as JSON
//! report surface --template lab_report.json --data patient.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report_template::{serializer, EngineConfig, RenderEngine};
use std::path::{Path, PathBuf};

/// Report - fixed-layout report template renderer
#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template with data to PDF or PNG
    Render {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Data JSON file
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Output file (.pdf or .png)
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// PNG sampling resolution
        #[arg(long)]
        dpi: Option<f64>,
    },

    /// Validate a template
    Validate {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,
    },

    /// Print the interactive surface as JSON
    Surface {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Data JSON file
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            config,
            dpi,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dpi) = dpi {
                config.raster_dpi = dpi;
            }
            let engine = RenderEngine::new(config).context("Failed to start render engine")?;
            let document = load_template(&template)?;
            let data = load_data(data.as_deref())?;
            engine
                .render_to_file(&document, data.as_ref(), &output)
                .with_context(|| format!("Failed to render {}", output.display()))?;
            println!("Rendered {}", output.display());
        }
        Commands::Validate { template } => {
            let document = load_template(&template)?;
            serializer::validate_detailed(&document)
                .with_context(|| format!("{} is not valid", template.display()))?;
            println!(
                "{} is valid ({} elements)",
                template.display(),
                document.elements.len()
            );
        }
        Commands::Surface {
            template,
            data,
            config,
        } => {
            let engine = RenderEngine::new(load_config(config.as_deref())?)
                .context("Failed to start render engine")?;
            let document = load_template(&template)?;
            let data = load_data(data.as_deref())?;
            let surface = engine.render_template(&document, data.as_ref())?;
            for diagnostic in surface.all_diagnostics() {
                log::warn!("{:?}", diagnostic);
            }
            println!("{}", serde_json::to_string_pretty(&*surface)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_template(path: &Path) -> Result<report_template::TemplateDocument> {
    serializer::load_from_file(path)
        .with_context(|| format!("Failed to load template {}", path.display()))
}

fn load_data(path: Option<&Path>) -> Result<Option<serde_json::Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data {}", path.display()))?;
    let value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse data {}", path.display()))?;
    Ok(Some(value))
}
