// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod project;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use project::ProjectFile;
use runtime::{ProposalRuntime, build_state, city_listing, panel_listing};
use solcalc_app::Catalog;
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }
    init_tracing(options.verbose);

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example_config {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    if options.print_example_input {
        print!("{}", ProjectFile::example());
        return Ok(());
    }

    if options.list_panels {
        print!("{}", panel_listing(&Catalog::builtin()));
        return Ok(());
    }

    if options.list_cities {
        print!("{}", city_listing(&Catalog::builtin()));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `solcalc --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let project = options
        .input
        .as_deref()
        .map(ProjectFile::load)
        .transpose()?;
    let state = build_state(&config, project.as_ref())?;

    let llm_client = if config.llm_enabled() {
        Some(
            solcalc_llm::Client::new(
                config.llm_base_url(),
                config.llm_model(),
                config.llm_timeout()?,
            )
            .with_context(|| {
                format!(
                    "invalid [llm] config in {}; fix base_url/model/timeout values",
                    options.config_path.display()
                )
            })?
            .with_api_key(config.llm_api_key()),
        )
    } else {
        None
    };
    if options.narrative && llm_client.is_none() {
        return Err(anyhow!(
            "--narrative needs the AI assistant -- set enabled = true under [llm] in {}",
            options.config_path.display()
        ));
    }

    let export_dir = match &options.export_dir {
        Some(dir) => dir.clone(),
        None => config.export_dir()?,
    };
    if options.check_only {
        if let Some(client) = &llm_client {
            client.ping().with_context(|| {
                format!(
                    "check [llm] in {}; set enabled = false to skip the AI assistant",
                    options.config_path.display()
                )
            })?;
        }
        return Ok(());
    }

    let mut runtime = ProposalRuntime::new(state, export_dir)
        .with_llm_client(llm_client, config.llm_extra_context());
    if options.narrative {
        runtime.request_narrative()?;
    }
    print!("{}", runtime.summary()?);

    let generated_at = OffsetDateTime::now_utc();
    if options.json {
        let path = runtime.export_json(options.json_path.as_deref(), generated_at)?;
        println!("JSON export: {}", path.display());
    }
    if options.report {
        let path = runtime.export_report(options.report_path.as_deref(), generated_at)?;
        println!("Proposal: {}", path.display());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SOLCALC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    input: Option<PathBuf>,
    json: bool,
    json_path: Option<PathBuf>,
    report: bool,
    report_path: Option<PathBuf>,
    narrative: bool,
    export_dir: Option<PathBuf>,
    list_panels: bool,
    list_cities: bool,
    print_config_path: bool,
    print_example_config: bool,
    print_example_input: bool,
    check_only: bool,
    verbose: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        input: None,
        json: false,
        json_path: None,
        report: false,
        report_path: None,
        narrative: false,
        export_dir: None,
        list_panels: false,
        list_cities: false,
        print_config_path: false,
        print_example_config: false,
        print_example_input: false,
        check_only: false,
        verbose: false,
        show_help: false,
    };

    let mut iter = args.into_iter().peekable();
    // `--json` and `--report` take a path only when the next word is not a flag.
    let optional_path = |iter: &mut std::iter::Peekable<I::IntoIter>| {
        iter.next_if(|next| !next.as_ref().starts_with('-'))
            .map(|value| PathBuf::from(value.as_ref()))
    };

    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--input" | "-i" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--input requires a file path"))?;
                options.input = Some(PathBuf::from(value.as_ref()));
            }
            "--export-dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export-dir requires a directory"))?;
                options.export_dir = Some(PathBuf::from(value.as_ref()));
            }
            "--json" => {
                options.json = true;
                options.json_path = optional_path(&mut iter);
            }
            "--report" => {
                options.report = true;
                options.report_path = optional_path(&mut iter);
            }
            "--narrative" => {
                options.narrative = true;
            }
            "--list-panels" => {
                options.list_panels = true;
            }
            "--list-cities" => {
                options.list_cities = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example_config = true;
            }
            "--print-example-input" => {
                options.print_example_input = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("solcalc - photovoltaic sizing and quoting");
    println!("  --config <path>          Use a specific config path");
    println!("  --input, -i <path>       Read proposal inputs from a TOML file");
    println!("  --json [path]            Write the JSON export");
    println!("  --report [path]          Write the printable proposal");
    println!("  --narrative              Ask the AI assistant for a technical analysis");
    println!("  --export-dir <dir>       Override [export].dir");
    println!("  --list-panels            Print the panel catalog");
    println!("  --list-cities            Print cities and their peak sun hours");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --print-example-input    Print an example input file");
    println!("  --check                  Validate config, input, calculation and the AI endpoint");
    println!("  --verbose, -v            Log progress to stderr (SOLCALC_LOG overrides)");
    println!("  --help                   Show this help");
}
