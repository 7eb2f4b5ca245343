// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! tagwire operator CLI
//!
//! # Usage
//!
//! ```bash
//! # Binary payload to JSON using the schema in tagwire.toml
//! tagwirectl convert --schema tagwire.toml --from binary --to json req.bin -o req.json
//!
//! # Show what a binary payload contains
//! tagwirectl inspect --schema tagwire.toml req.bin
//!
//! # Cache assignments for a plugin manifest
//! tagwirectl assign --config plugins.toml
//!
//! # Sample configuration files
//! tagwirectl gen-config schema -o tagwire.toml
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagwire::serialization::JsonStrategy;
use tagwire::{TagwireConfig, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE};
use tagwire_plugins::{PluginRegistry, RouterConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tagwirectl")]
#[command(about = "Convert and inspect tagwire payloads, compute plugin cache assignments")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-encode a payload in another format
    Convert {
        /// Schema configuration (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(long, value_enum, default_value = "binary")]
        from: Format,

        #[arg(long, value_enum, default_value = "json")]
        to: Format,

        /// Input file, `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a binary payload and print it as JSON
    Inspect {
        /// Schema configuration (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input file, `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,
    },

    /// Register a plugin manifest and print the resulting cache assignments
    Assign {
        /// Router configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Do not update the configured registry file
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate an example configuration file
    GenConfig {
        #[arg(value_enum)]
        kind: ConfigKind,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Binary,
    Json,
}

impl Format {
    fn content_type(self) -> &'static str {
        match self {
            Self::Binary => BINARY_CONTENT_TYPE,
            Self::Json => JSON_CONTENT_TYPE,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKind {
    /// Type schema and codec limits
    Schema,
    /// Cache router and plugin manifest
    Router,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            schema,
            from,
            to,
            input,
            output,
        } => cmd_convert(&schema, from, to, &input, output.as_deref()),
        Commands::Inspect { schema, input } => cmd_inspect(&schema, &input),
        Commands::Assign { config, dry_run } => cmd_assign(&config, dry_run),
        Commands::GenConfig { kind, output } => cmd_gen_config(kind, output.as_deref()),
    }
}

fn cmd_convert(
    schema: &Path,
    from: Format,
    to: Format,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_schema(schema)?;
    let manager = config.build_manager(config.build_registry()?);
    let bytes = read_input(input)?;

    let envelope = manager
        .deserialize(&bytes, from.content_type())
        .with_context(|| format!("decoding {} as {:?}", input.display(), from))?;
    let converted = manager
        .serialize(&envelope, to.content_type())
        .with_context(|| format!("encoding {} as {:?}", envelope.type_name, to))?;
    tracing::info!(
        "converted {} ({} bytes -> {} bytes)",
        envelope.type_name,
        bytes.len(),
        converted.len()
    );
    write_output(output, &converted)
}

fn cmd_inspect(schema: &Path, input: &Path) -> anyhow::Result<()> {
    let config = load_schema(schema)?;
    let registry = config.build_registry()?;
    let manager = config.build_manager(Arc::clone(&registry));
    let bytes = read_input(input)?;

    let envelope = manager
        .deserialize(&bytes, BINARY_CONTENT_TYPE)
        .with_context(|| format!("decoding {}", input.display()))?;
    let json = JsonStrategy::new(registry, config.codec.limits()).to_json(&envelope)?;

    println!("type:   {}", envelope.type_name);
    println!("fields: {}", envelope.len());
    println!("size:   {} bytes", bytes.len());
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_assign(path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let config = RouterConfig::from_file(path)
        .with_context(|| format!("loading router config {}", path.display()))?;
    let router = Arc::new(config.build_router()?);
    if let Some(file) = &config.registry_file {
        router.load(file)?;
    }

    let registry = PluginRegistry::new();
    registry.add_listener(router.clone());
    for descriptor in config.descriptors() {
        registry.register(descriptor)?;
    }

    for plugin in registry.plugins() {
        println!(
            "{:<24} {:<12} {}",
            plugin.name(),
            plugin.capabilities().to_string(),
            router.cache_name_for(plugin.name())
        );
    }
    let stale: Vec<_> = router
        .assignments()
        .keys()
        .filter(|name| registry.get(name).is_none())
        .cloned()
        .collect();
    for name in stale {
        println!("{:<24} {:<12} {}", name, "(stored)", router.cache_name_for(&name));
    }

    match (&config.registry_file, dry_run) {
        (Some(file), false) => {
            if router.save(file)? {
                println!("saved assignments to {}", file.display());
            }
        }
        (Some(_), true) => tracing::info!("dry run, registry file left untouched"),
        (None, _) => {}
    }
    Ok(())
}

fn cmd_gen_config(kind: ConfigKind, output: Option<&Path>) -> anyhow::Result<()> {
    let text = match kind {
        ConfigKind::Schema => toml::to_string_pretty(&TagwireConfig::sample())?,
        ConfigKind::Router => toml::to_string_pretty(&RouterConfig::sample())?,
    };
    write_output(output, text.as_bytes())?;
    if let Some(path) = output {
        println!("Generated configuration: {}", path.display());
    }
    Ok(())
}

fn load_schema(path: &Path) -> anyhow::Result<TagwireConfig> {
    let config = TagwireConfig::from_file(path)
        .with_context(|| format!("loading schema {}", path.display()))?;
    if config.types.is_empty() {
        bail!("schema {} declares no types", path.display());
    }
    Ok(config)
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if path.as_os_str() == "-" {
        std::io::stdin().read_to_end(&mut bytes)?;
    } else {
        bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    }
    Ok(bytes)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
