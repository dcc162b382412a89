use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use simdb::{Catalog, CatalogConfig, ParamSet};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{CatalogArgs, Command, ParamsArgs, RootArgs};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    let config = resolve_config(&args.catalog)?;
    let catalog = Catalog::open(config).context("open catalog")?;
    run(catalog, args.command)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("SIMDB_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("simdb={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn resolve_config(args: &CatalogArgs) -> Result<CatalogConfig> {
    let base = match &args.config {
        Some(path) => Some(
            CatalogConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
        ),
        None => None,
    };
    let directory = args
        .directory
        .clone()
        .or_else(|| base.as_ref().map(|config| config.directory.clone()))
        .ok_or_else(|| anyhow!("--directory is required without --config"))?;
    let filetype = args
        .filetype
        .clone()
        .or_else(|| base.as_ref().map(|config| config.filetype.clone()))
        .ok_or_else(|| anyhow!("--filetype is required without --config"))?;
    let executable = args
        .executable
        .clone()
        .or_else(|| base.as_ref().map(|config| config.executable.clone()))
        .ok_or_else(|| anyhow!("--executable is required without --config"))?;
    Ok(CatalogConfig::new(directory, filetype, executable))
}

fn run(catalog: Catalog, command: Command) -> Result<ExitCode> {
    match command {
        Command::Create(args) => {
            let params = read_params(&args.params)?;
            print_json(&catalog.create(&params, args.index)?)?;
        }
        Command::Recreate(args) => {
            let params = read_params(&args.params)?;
            print_json(&catalog.recreate(&params, args.index)?)?;
        }
        Command::Select(args) => {
            let params = read_params(&args.params)?;
            let selected = catalog.select(&params, args.index)?;
            print_json(&selected)?;
            if selected.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Exists(args) => {
            let params = read_params(&args.params)?;
            print_json(&catalog.exists(&params, args.index)?)?;
        }
        Command::Count(args) => {
            let params = read_params(&args)?;
            print_json(&catalog.count(&params)?)?;
        }
        Command::Fingerprint(args) => {
            let params = read_params(&args)?;
            print_json(&catalog.fingerprint(&params)?)?;
        }
        Command::Table(args) => {
            let filter = match &args.filter {
                Some(raw) => read_params_text(raw)?,
                None => ParamSet::new(),
            };
            let scan = catalog.scan()?;
            let rows: Vec<&ParamSet> = scan
                .entries
                .iter()
                .map(|entry| &entry.params)
                .filter(|params| params.matches(&filter))
                .collect();
            if args.inconsistent {
                print_json(&TableReport {
                    table: rows,
                    inconsistent: &scan.inconsistent,
                })?;
            } else {
                print_json(&rows)?;
            }
        }
        Command::Files => print_json(&catalog.files()?)?,
        Command::Delete(args) => {
            let params = read_params(&args.params)?;
            catalog.delete(&params, args.index)?;
        }
        Command::DeleteAll => {
            let catalog = catalog.delete_all()?;
            tracing::debug!(directory = %catalog.directory().display(), "catalog reset");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct TableReport<'a> {
    table: Vec<&'a ParamSet>,
    inconsistent: &'a [std::path::PathBuf],
}

fn read_params(args: &ParamsArgs) -> Result<ParamSet> {
    read_params_text(&args.params)
}

fn read_params_text(raw: &str) -> Result<ParamSet> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("read {path}"))?;
            ParamSet::from_json_slice(&bytes).with_context(|| format!("parse {path}"))
        }
        None => ParamSet::from_json_str(raw).context("parse parameter set"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
