//! textdav binary
//!
//! Loads a manifest into the in-memory filesystem and inspects it.
//!
//! ## Usage
//!
//! ```bash
//! textdav check files.txt
//! textdav tree --manifest files.txt /docs
//! textdav stat --manifest files.txt /docs/readme.txt --json
//! textdav props --manifest files.txt /docs/readme.txt
//! textdav --config textdav.ron auth alice secret
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use textdav_cli::ServerConfig;
use textdav_cli::constants::DEFAULT_LOG_FILTER;
use textdav_vfs::{DavFs, PropValue, VirtualFs, http_date};

/// Inspect a manifest-backed virtual filesystem.
#[derive(Parser, Debug)]
#[command(name = "textdav")]
#[command(about = "In-memory virtual filesystem for a WebDAV-style server")]
struct Args {
    /// RON config file (default: ./textdav.ron if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and load a manifest, then report what was built
    Check {
        manifest: PathBuf,
    },
    /// Print the hierarchy below a path
    Tree {
        /// Manifest to load (overrides the config)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print the attributes of one path
    Stat {
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        path: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print every property of one path
    Props {
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        path: String,
    },
    /// Evaluate the credential gate
    Auth {
        user: Option<String>,
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ServerConfig::discover(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("textdav: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args.command, &config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &ServerConfig) -> Result<ExitCode> {
    match command {
        Command::Check { manifest } => cmd_check(&manifest, config),
        Command::Tree { manifest, path } => {
            let fs = build_fs(manifest.as_deref(), config)?;
            cmd_tree(&fs, &path)
        }
        Command::Stat {
            manifest,
            path,
            json,
        } => {
            let fs = build_fs(manifest.as_deref(), config)?;
            cmd_stat(&fs, &path, json)
        }
        Command::Props { manifest, path } => {
            let fs = build_fs(manifest.as_deref(), config)?;
            cmd_props(&fs, &path)
        }
        Command::Auth { user, password } => Ok(cmd_auth(
            config,
            user.as_deref(),
            password.as_deref(),
        )),
    }
}

/// Build the filesystem from the explicit manifest, else the configured one.
fn build_fs(manifest: Option<&Path>, config: &ServerConfig) -> Result<VirtualFs> {
    let fs = VirtualFs::new(config.vfs_config());
    let Some(path) = manifest.or(config.manifest.as_deref()) else {
        bail!("no manifest given and none configured");
    };
    fs.load_path(path)
        .with_context(|| format!("loading manifest {}", path.display()))?;
    Ok(fs)
}

fn cmd_check(manifest: &Path, config: &ServerConfig) -> Result<ExitCode> {
    let fs = VirtualFs::new(config.vfs_config());
    let summary = fs
        .load_path(manifest)
        .with_context(|| format!("loading manifest {}", manifest.display()))?;
    println!(
        "{}: {} files, {} directories, {} entries",
        manifest.display(),
        summary.files,
        summary.directories,
        fs.store().len()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_tree(fs: &VirtualFs, path: &str) -> Result<ExitCode> {
    let root = fs.stat(path)?;
    println!("{}", root.path);
    if root.is_dir() {
        print_tree(fs, &root.path, 1)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tree(fs: &VirtualFs, dir: &str, depth: usize) -> Result<()> {
    for entry in fs.list_children(dir)? {
        let indent = "  ".repeat(depth);
        if entry.is_dir() {
            println!("{}{}/", indent, entry.name);
            print_tree(fs, &entry.path, depth + 1)?;
        } else if entry.display_name != entry.name {
            println!(
                "{}{} ({} bytes) \"{}\"",
                indent, entry.name, entry.size, entry.display_name
            );
        } else {
            println!("{}{} ({} bytes)", indent, entry.name, entry.size);
        }
    }
    Ok(())
}

fn cmd_stat(fs: &VirtualFs, path: &str, json: bool) -> Result<ExitCode> {
    let attr = fs.stat(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&attr)?);
    } else {
        println!("path:     {}", attr.path);
        println!("name:     {}", attr.name);
        println!("kind:     {:?}", attr.kind);
        println!("size:     {}", attr.size);
        println!("perm:     {:o}", attr.perm);
        println!("modified: {}", http_date(attr.mtime));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_props(fs: &VirtualFs, path: &str) -> Result<ExitCode> {
    for prop in fs.read_properties(path)? {
        match &prop.value {
            PropValue::Text(text) => println!("{} = {}", prop.name, text),
            PropValue::Bytes(bytes) => println!("{} = <{} bytes>", prop.name, bytes.len()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_auth(config: &ServerConfig, user: Option<&str>, password: Option<&str>) -> ExitCode {
    let gate = config.gate();
    let outcome = gate.check(user, password);
    println!("{}", outcome);
    if outcome.is_granted() {
        ExitCode::SUCCESS
    } else {
        println!("WWW-Authenticate: {}", gate.challenge());
        ExitCode::FAILURE
    }
}
