//! # CLI Layer
//!
//! The only place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a tracing subscriber
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: clap, see `setup.rs`
//! 2. **Context Setup**: `imagery::init::initialize` with the global flags
//! 3. **Dispatch**: one handler per subcommand
//! 4. **Output**: text or JSON via `render.rs`

use super::render::{self, Artifact, DeleteOutput, IdentifyOutput, ListOutput, SaveOutput};
use super::setup::{Cli, Commands, SaveArgs};
use clap::Parser;
use imagery::converter::{read_source, Converter};
use imagery::error::{ImageryError, Result};
use imagery::init::{initialize, ImageryContext, Overrides};
use imagery::resource::generate_identity;
use imagery::store::Storage;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `IMAGERY_LOG=imagery=debug`.
pub const LOG_VAR: &str = "IMAGERY_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let ctx = initialize(
        &cwd,
        Overrides {
            config_file: cli.config.clone(),
            root: cli.root.clone(),
            fake: cli.fake,
        },
    )?;
    debug!(
        root = %ctx.store.root().display(),
        mode = ?ctx.gate.mode(),
        remote = ctx.config.remote_config().is_some(),
        "resolved context"
    );

    let output = match &cli.command {
        Commands::Save(args) => handle_save(&ctx, args, cli.json)?,
        Commands::Delete { prefix, id } => handle_delete(&ctx, prefix, id, cli.json)?,
        Commands::Url {
            prefix,
            id,
            variant,
        } => handle_url(&ctx, prefix, id.as_deref(), variant, cli.json)?,
        Commands::Ls { prefix, id } => handle_ls(&ctx, prefix, id, cli.json)?,
        Commands::Identify { file } => handle_identify(&ctx, &cwd, file, cli.json)?,
    };

    print!("{}", output);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_save(ctx: &ImageryContext, args: &SaveArgs, json: bool) -> Result<String> {
    let new_identity = if args.fresh {
        Some(generate_identity())
    } else {
        args.id.clone()
    };

    let mut file = File::open(&args.file)?;
    let raw = read_source(&mut file)?;

    let mut storage = ctx.resource(&args.prefix, args.current.as_deref())?;
    let report = storage.save(&raw, new_identity.as_deref())?;

    let identity = report.identity.as_deref();
    let artifacts = report
        .produced()
        .into_iter()
        .map(|variant| {
            Ok(Artifact {
                variant: variant.to_string(),
                url: ctx.public_url(&args.prefix, identity, variant)?,
                path: identity.map(|id| {
                    ctx.store
                        .path_for(&args.prefix, id, variant)
                        .display()
                        .to_string()
                }),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let out = SaveOutput {
        prefix: args.prefix.clone(),
        identity: report.identity.clone(),
        faked: report.faked,
        artifacts,
        failures: report.failures.clone(),
    };
    Ok(if json { render::json(&out) + "\n" } else { render::save(&out) })
}

fn handle_delete(ctx: &ImageryContext, prefix: &str, id: &str, json: bool) -> Result<String> {
    let mut storage = ctx.resource(prefix, Some(id))?;
    storage.delete()?;

    let out = DeleteOutput {
        prefix: prefix.to_string(),
        identity: id.to_string(),
        faked: ctx.gate.is_fake(),
    };
    Ok(if json { render::json(&out) + "\n" } else { render::delete(&out) })
}

fn handle_url(
    ctx: &ImageryContext,
    prefix: &str,
    id: Option<&str>,
    variant: &str,
    json: bool,
) -> Result<String> {
    let url = ctx.public_url(prefix, id, variant)?;
    if json {
        let out = Artifact {
            variant: variant.to_string(),
            url,
            path: None,
        };
        return Ok(render::json(&out) + "\n");
    }
    Ok(format!("{}\n", url))
}

fn handle_ls(ctx: &ImageryContext, prefix: &str, id: &str, json: bool) -> Result<String> {
    let resource = ctx.local_resource(prefix, Some(id))?;
    let artifacts = ctx
        .store
        .artifact_names(prefix, id)?
        .into_iter()
        .map(|variant| Artifact {
            url: resource.url_path(&variant),
            path: Some(ctx.store.path_for(prefix, id, &variant).display().to_string()),
            variant,
        })
        .collect();

    let out = ListOutput {
        prefix: prefix.to_string(),
        identity: id.to_string(),
        artifacts,
    };
    Ok(if json { render::json(&out) + "\n" } else { render::list(&out) })
}

fn handle_identify(ctx: &ImageryContext, cwd: &Path, file: &Path, json: bool) -> Result<String> {
    let path = if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    };
    let raw = std::fs::read(&path)?;

    let valid = ctx.converter.identify(&raw)?;
    let (width, height) = if valid {
        match ctx.converter.resolution(&path)? {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    let out = IdentifyOutput {
        file: file.display().to_string(),
        valid,
        width,
        height,
    };
    let text = if json { render::json(&out) + "\n" } else { render::identify(&out) };
    if !valid {
        eprint!("{}", text);
        return Err(ImageryError::InvalidImage);
    }
    Ok(text)
}
