//! Application orchestrator.
//! Loads/merges config, initializes logging, wires Ctrl-C to cancellation,
//! and dispatches the requested command.

use anyhow::{Context, Result};
use tracing::{debug, error};

use fs_lifecycle::cli::{Args, Command};
use fs_lifecycle::config::load_config;
use fs_lifecycle::output as out;
use fs_lifecycle::{
    CancellationToken, Config, FsError, Platform, delete_directory, delete_file,
    delete_path_with_retry, ensure_ancestors_readable, make_relative, move_directory,
    parent_directory_name, resolve_path,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // CLI args override config values.
    let mut cfg = load_config(args.config.as_deref())?;
    args.apply_overrides(&mut cfg);

    // Hold the guard until we return so buffered file logs are flushed.
    let _guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json)
        .context("initialize logging")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
            out::print_warn("Received interrupt; cancelling...");
        })
        .context("install signal handler")?;
    }

    debug!(?args, ?cfg, "starting fs_lifecycle");

    let result = execute(&args.command, &cfg, &cancel);
    if let Err(e) = &result {
        match e.downcast_ref::<FsError>() {
            Some(fe) => match fe.path() {
                Some(p) => {
                    error!(kind = fe.kind(), path = %p.display(), error = %fe, "command failed")
                }
                None => error!(kind = fe.kind(), error = %fe, "command failed"),
            },
            None => error!(error = ?e, "command failed"),
        }
    }
    result
}

fn execute(command: &Command, cfg: &Config, cancel: &CancellationToken) -> Result<()> {
    let platform = Platform::current();
    match command {
        Command::Delete {
            path,
            contents_only,
            no_retry,
            check_permissions,
            ..
        } => {
            if *check_permissions {
                ensure_ancestors_readable(path)?;
            }
            let opts = cfg.delete_options(*contents_only);
            if *no_retry {
                delete_directory(path, &opts, cancel)?;
                if !contents_only {
                    delete_file(path, cancel)?;
                }
            } else {
                delete_path_with_retry(path, &opts, &cfg.retry_policy(), cancel)?;
            }
            let verb = if *contents_only { "Cleared" } else { "Deleted" };
            out::print_success(&format!("{verb} {}", path.display()));
        }
        Command::Move {
            source,
            target,
            staging,
        } => {
            move_directory(source, target, staging, cancel)?;
            out::print_success(&format!(
                "Moved {} -> {}",
                source.display(),
                target.display()
            ));
        }
        Command::Resolve { root, relative } => {
            out::print_user(&resolve_path(platform, root, relative)?);
        }
        Command::Relative { path, folder } => {
            out::print_user(make_relative(platform, path, folder));
        }
        Command::Parent { path } => {
            out::print_user(&parent_directory_name(path, platform));
        }
    }
    Ok(())
}
