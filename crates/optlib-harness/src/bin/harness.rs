//! CLI entrypoint for the optlib diagnostics harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use optlib_core::{LibraryDescriptor, parse_so_version};
use optlib_harness::{LogFormat, LookupReport, ProbeReport, logging};
use optlib_loader::{Registry, SystemLoader};

/// Diagnostics for optional shared libraries.
#[derive(Debug, Parser)]
#[command(name = "optlib-harness")]
#[command(about = "Probe optional shared libraries through the dynamic loader")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, global = true)]
    debug: bool,
    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a library table and emit a JSON report of what was found.
    Probe {
        /// Library to probe instead of the built-in table (repeatable).
        #[arg(long = "library")]
        libraries: Vec<String>,
        /// Require a `.so.X.Y.Z` version for every `--library`.
        #[arg(long)]
        require_version: bool,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the version triple encoded in a shared-object filename.
    ParseVersion {
        /// Filename or path, e.g. `libfoo.so.1.2.3`.
        path: String,
    },
    /// Load one library and check whether a symbol resolves.
    Lookup {
        /// Library name or path handed to the dynamic loader.
        #[arg(long)]
        library: String,
        /// Symbol to resolve.
        symbol: String,
    },
}

fn probe_registry(libraries: Vec<String>, require_version: bool) -> Registry {
    if libraries.is_empty() {
        return Registry::builtin();
    }
    let descriptors = libraries.into_iter().map(|name| {
        let descriptor = LibraryDescriptor::owned(name);
        if require_version {
            descriptor.requiring_version()
        } else {
            descriptor
        }
    });
    Registry::new(SystemLoader, descriptors)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.log_format)?;

    match cli.command {
        Command::Probe {
            libraries,
            require_version,
            output,
        } => {
            let mut registry = probe_registry(libraries, require_version);
            let report = ProbeReport::probe(&mut registry);
            registry.unload();

            eprintln!(
                "Probe complete: total={}, loaded={}, degraded={}",
                report.libraries.len(),
                report.loaded_count(),
                report.degraded
            );
            match output {
                Some(path) => report.write_to(&path)?,
                None => println!("{}", report.to_json()?),
            }
        }
        Command::ParseVersion { path } => {
            let version = parse_so_version(&path)?;
            println!("{version}");
        }
        Command::Lookup { library, symbol } => {
            let mut registry = Registry::new(SystemLoader, [LibraryDescriptor::owned(library)]);
            let report = LookupReport::run(&mut registry, &symbol)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            report.require_resolved()?;
        }
    }

    Ok(())
}
