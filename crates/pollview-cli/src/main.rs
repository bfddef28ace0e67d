// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use demo::DemoBackend;
use pollview_api::{Client, PollBackend};
use pollview_app::PollState;
use runtime::BackendRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

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

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `pollview --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_path = config.log_path()?;
    if options.print_log_path {
        println!("{}", log_path.display());
        return Ok(());
    }

    if options.demo {
        let backend = DemoBackend::seeded();
        if options.check_only {
            return check(&backend, "demo");
        }
        logging::init(config.log_level(), &log_path)?;
        return launch(BackendRuntime::new(backend, "demo"));
    }

    let base_url = config.base_url(options.base_url.as_deref());
    let client = Client::new(base_url, config.timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout or pass --base-url",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return check(&client, client.base_url());
    }

    logging::init(config.log_level(), &log_path)?;
    let label = client.base_url().to_owned();
    launch(BackendRuntime::new(client, label))
}

fn launch<B>(mut runtime: BackendRuntime<B>) -> Result<()>
where
    B: PollBackend + Clone + Send + 'static,
{
    let mut state = PollState::default();
    info!("starting pollview");
    pollview_tui::run_app(&mut state, &mut runtime)
}

fn check(backend: &impl PollBackend, source: &str) -> Result<()> {
    let polls = backend
        .list_polls()
        .with_context(|| format!("fetch poll list from {source}"))?;
    println!("{}", check_summary(source, polls.len()));
    Ok(())
}

fn check_summary(source: &str, count: usize) -> String {
    let noun = if count == 1 { "poll" } else { "polls" };
    format!("ok: {count} {noun} from {source}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    print_config_path: bool,
    print_log_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        base_url: None,
        print_config_path: false,
        print_log_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--base-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--base-url requires a URL such as http://localhost:3001")
                })?;
                options.base_url = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-log-path" => {
                options.print_log_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("pollview");
    println!("  --config <path>          Use a specific config path");
    println!("  --base-url <url>         Override [api].base_url");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-log-path         Print resolved log file path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch against seeded in-memory polls");
    println!("  --check                  Validate config and fetch the poll list once");
    println!("  --help                   Show this help");
}
