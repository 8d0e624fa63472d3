// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use irea_app::PageState;
use irea_geo::ProviderHandle;
use runtime::ServiceRuntime;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
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
        print!("{HELP}");
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
            "load config {}; run `irea --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = irea_api::Client::new(
        &config.api_base_url(),
        config.api_timeout()?,
        config.api_health_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values or set IREA_API_BASE",
            options.config_path.display()
        )
    })?;
    let provider = ProviderHandle::new(config.provider_config()?);

    if options.check_only {
        return run_checks(&client, &provider, &mut io::stdout().lock());
    }

    let log_path = config.log_path()?;
    logging::init(config.log_level(), &log_path)?;
    info!(
        api = client.base_url(),
        region = %config.region().name,
        "starting page"
    );

    let mut state = PageState::new(config.region(), config.trend_policy());
    let mut runtime = ServiceRuntime::new(Arc::new(provider), Arc::new(client));
    irea_tui::run_app(&mut state, &mut runtime)
}

/// Backend health is required; a missing maps key only degrades the page.
fn run_checks(
    client: &irea_api::Client,
    provider: &ProviderHandle,
    out: &mut impl Write,
) -> Result<()> {
    client
        .health()
        .with_context(|| format!("backend health check failed at {}", client.health_url()))?;
    writeln!(out, "backend: ok ({})", client.base_url()).context("write check report")?;

    let written = match provider.acquire() {
        Ok(_) => writeln!(out, "maps: ready ({})", provider.config().base_url),
        Err(_) => writeln!(
            out,
            "maps: unavailable ({}); address search is disabled",
            provider.last_error().unwrap_or_default()
        ),
    };
    written.context("write check report")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
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
        print_config_path: false,
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
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
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

const HELP: &str = "\
irea: Boston house price estimates in the terminal
  --config <path>          Use a specific config path
  --print-config-path      Print resolved config path
  --print-example-config   Print a v1 config template
  --check                  Validate config, ping the backend, load the maps provider
  --help                   Show this help
";

#[cfg(test)]
mod tests {
    use super::{CliOptions, HELP, parse_cli_args, run_checks};
    use anyhow::{Result, anyhow};
    use irea_geo::{ProviderConfig, ProviderHandle};
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    /// Answers one request with `status` and returns the path it was asked for.
    fn serve_health_once(status: u16) -> Result<(String, thread::JoinHandle<String>)> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let url = request.url().to_owned();
            let response = Response::from_string(r#"{"STATUS":"OK"}"#)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
            url
        });
        Ok((base_url, handle))
    }

    fn client_for(base_url: &str) -> Result<irea_api::Client> {
        irea_api::Client::new(base_url, Duration::from_secs(2), Duration::from_secs(2))
    }

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/irea-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--demo"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn check_reports_backend_and_missing_maps_key() -> Result<()> {
        let (base_url, handle) = serve_health_once(200)?;
        let client = client_for(&base_url)?;
        let provider = ProviderHandle::new(ProviderConfig {
            api_key: None,
            ..ProviderConfig::default()
        });

        let mut out = Vec::new();
        run_checks(&client, &provider, &mut out)?;
        let report = String::from_utf8(out)?;
        assert!(report.contains(&format!("backend: ok ({base_url})")), "{report}");
        assert!(report.contains("maps: unavailable ("), "{report}");
        assert!(report.contains("address search is disabled"), "{report}");
        assert_eq!(handle.join().expect("server thread should join"), "/health");
        Ok(())
    }

    #[test]
    fn check_reports_ready_maps_provider() -> Result<()> {
        let (base_url, handle) = serve_health_once(200)?;
        let client = client_for(&base_url)?;
        let provider = ProviderHandle::new(ProviderConfig {
            api_key: Some("test-key".to_owned()),
            base_url: "https://maps.example.test/maps/api".to_owned(),
            ..ProviderConfig::default()
        });

        let mut out = Vec::new();
        run_checks(&client, &provider, &mut out)?;
        let report = String::from_utf8(out)?;
        assert_eq!(report.lines().count(), 2, "{report}");
        assert!(
            report.contains("maps: ready (https://maps.example.test/maps/api)"),
            "{report}"
        );
        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn check_fails_when_backend_is_unhealthy() -> Result<()> {
        let (base_url, handle) = serve_health_once(503)?;
        let client = client_for(&base_url)?;
        let provider = ProviderHandle::new(ProviderConfig::default());

        let mut out = Vec::new();
        let error = run_checks(&client, &provider, &mut out).expect_err("503 should fail");
        let message = format!("{error:#}");
        assert!(message.contains("backend health check failed at"), "{message}");
        assert!(message.contains("/health"), "{message}");
        assert!(out.is_empty());
        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn help_lists_every_accepted_flag() -> Result<()> {
        for flag in [
            "--config <path>",
            "--print-config-path",
            "--print-example-config",
            "--check",
            "--help",
        ] {
            assert!(HELP.contains(flag), "{flag}");
            let arg = flag.split_whitespace().next().unwrap_or(flag);
            if arg != "--config" {
                parse_cli_args(vec![arg], default_options_path())?;
            }
        }
        Ok(())
    }
}
