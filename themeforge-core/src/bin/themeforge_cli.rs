//! ThemeForge CLI - Bridge interface for theme tooling
//!
//! Commands: schema, compose, asset
//! Outputs JSON (or processed asset text) to stdout, logs to stderr
//! Returns 2 when a composed page carries error-severity issues

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use themeforge_core::{
    extract_schema, EngineConfig, PageRequest, SchemaRegistry, SettingsData, ThemeEngine,
    ThemeError, ThemeSettingsSchema,
};

#[derive(Parser)]
#[command(name = "themeforge-cli")]
#[command(about = "ThemeForge CLI - Theme Schema & Template Composition Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sections directory, overrides the config file
    #[arg(short, long)]
    sections_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema embedded in a section source
    Schema {
        /// Section source file
        file: PathBuf,
    },

    /// Compose a page from a template and optional section groups
    Compose {
        /// Template document (JSON)
        #[arg(short, long)]
        template: PathBuf,

        /// Header section group (JSON)
        #[arg(long)]
        header: Option<PathBuf>,

        /// Footer section group (JSON)
        #[arg(long)]
        footer: Option<PathBuf>,

        /// Template name for placement checks; defaults to the file stem
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Resolve directives in a CSS/JS asset
    Asset {
        /// Asset source file
        file: PathBuf,

        /// settings_data.json
        #[arg(long)]
        settings: PathBuf,

        /// settings_schema.json, supplies defaults for unset values
        #[arg(long)]
        settings_schema: Option<PathBuf>,

        /// Base URL for asset_url, overrides the config file
        #[arg(long)]
        asset_base: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(c) => c,
            Err(e) => return fail(&format!("Failed to load config: {}", e)),
        },
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.sections_dir {
        config.sections_dir = dir;
    }

    match cli.command {
        Commands::Schema { file } => {
            let source = match fs::read_to_string(&file) {
                Ok(s) => s,
                Err(e) => return fail(&format!("Failed to read {}: {}", file.display(), e)),
            };
            match extract_schema(&source) {
                Ok(schema) => print_json(&serde_json::json!({ "schema": schema })),
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Compose { template, header, footer, name } => {
            let registry = match SchemaRegistry::load_from_dir(&config.sections_dir) {
                Ok(r) => r,
                Err(e) => return fail(&format!("Failed to load sections: {}", e)),
            };

            let request = match build_request(&template, header.as_deref(), footer.as_deref(), name) {
                Ok(r) => r,
                Err(e) => return fail(&e.to_string()),
            };

            let engine = ThemeEngine::new(registry, config);
            match engine.render_page(&request) {
                Ok(render) => {
                    let code = print_json(&render);
                    if render.validation.valid { code } else { ExitCode::from(2) }
                }
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Asset { file, settings, settings_schema, asset_base } => {
            if let Some(base) = asset_base {
                config.asset_base_url = base;
            }
            let resolved = load_settings(&settings, settings_schema.as_deref());
            let (text, settings) = match (fs::read_to_string(&file), resolved) {
                (Ok(text), Ok(settings)) => (text, settings),
                (Err(e), _) => return fail(&format!("Failed to read {}: {}", file.display(), e)),
                (_, Err(e)) => return fail(&e.to_string()),
            };

            let engine = ThemeEngine::new(SchemaRegistry::new(), config);
            print!("{}", engine.process_asset(&text, &settings));
            ExitCode::SUCCESS
        }
    }
}

fn build_request(
    template: &Path,
    header: Option<&Path>,
    footer: Option<&Path>,
    name: Option<String>,
) -> Result<PageRequest, ThemeError> {
    let template_name = name.unwrap_or_else(|| {
        template
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(PageRequest {
        template_name,
        template: Some(read_json(template)?),
        header: header.map(read_json).transpose()?,
        footer: footer.map(read_json).transpose()?,
    })
}

fn load_settings(
    data: &Path,
    schema: Option<&Path>,
) -> Result<serde_json::Map<String, serde_json::Value>, ThemeError> {
    let data: SettingsData = read_json(data)?;
    match schema {
        Some(path) => {
            let schema: ThemeSettingsSchema = read_json(path)?;
            data.resolve_with_defaults(&schema)
        }
        None => data.resolve(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ThemeError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn fail(message: &str) -> ExitCode {
    println!("{}", serde_json::json!({ "success": false, "error": message }));
    ExitCode::FAILURE
}
