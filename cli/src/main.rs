use std::net::SocketAddr;
use std::process;
use std::time::Duration;

use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};
use is_terminal::IsTerminal;
use kubescout_cli::output::Format;
use kubescout_cli::{commands, watch, Error, Result};
use kubescout_core::config::ScanConfig;
use kubescout_core::reader::ClusterReader;
use kubescout_remedy::executor::Registry;
use kubescout_remedy::executors::{ConfigFixExecutor, DeleteResourceExecutor, RestartExecutor, TriggerActionExecutor};
use kubescout_remedy::options::ExecuteOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

fn main() {
    let cmd = Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .subcommand_required(true)
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .value_parser(["json", "yaml"])
                .default_value("json"),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .short('n')
                .global(true)
                .help("restrict the scan to one namespace"),
        )
        .arg(
            Arg::new("introspection_address")
                .long("introspection-bind-address")
                .global(true)
                .help("address to bind for the HTTP introspection (metrics) server")
                .default_value("[::]:8089"),
        )
        .subcommand(
            Command::new("entries")
                .about("enumerate MapEntries, optionally filtered by a query expression")
                .arg(Arg::new("query").long("query").default_value(""))
                .arg(Arg::new("relations").long("relations").action(ArgAction::SetTrue))
                .arg(Arg::new("drift").long("drift").action(ArgAction::SetTrue))
                .arg(Arg::new("watch").long("watch").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("trace")
                .about("trace a target resource forward or reverse")
                .arg(Arg::new("target").long("target").required(true))
                .arg(Arg::new("reverse").long("reverse").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("drift")
                .about("detect drift on a single target resource")
                .arg(Arg::new("target").long("target").required(true)),
        )
        .subcommand(
            Command::new("dangling")
                .about("list dangling references in scope"),
        )
        .subcommand(
            Command::new("gsf")
                .about("emit a GSF document for the configured scope")
                .arg(Arg::new("relations").long("relations").action(ArgAction::SetTrue))
                .arg(Arg::new("drift").long("drift").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("remedy")
                .about("execute remedy commands for a file of Findings")
                .arg(Arg::new("findings").long("findings").required(true).help("path to a JSON array of Finding"))
                .arg(Arg::new("apply").long("apply").action(ArgAction::SetTrue).help("without this flag, runs dry-run only"))
                .arg(Arg::new("force").long("force").action(ArgAction::SetTrue))
                .arg(Arg::new("rollback").long("rollback").action(ArgAction::SetTrue))
                .arg(Arg::new("timeout_secs").long("timeout-secs").default_value("30")),
        );

    if let Err(e) = run(cmd) {
        error!("{e}");
        process::exit(e.exit_code());
    }
}

fn run(cmd: Command) -> Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tokio::runtime;
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")).map_err(|e| Error::Usage(e.to_string()))?;
    let collector = tracing_subscriber::Registry::default().with(env_filter).with(
        if std::io::stdout().is_terminal() {
            None
        } else {
            Some(tracing_subscriber::fmt::layer().json())
        },
    );
    let _ = tracing::subscriber::set_global_default(collector);

    let matches = cmd.get_matches();
    let introspection_address: SocketAddr = matches
        .get_one::<String>("introspection_address")
        .unwrap()
        .parse()
        .map_err(|e: std::net::AddrParseError| Error::Usage(e.to_string()))?;

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let token = CancellationToken::new();
    let prom_token = token.clone();
    rt.handle().spawn(async move {
        let prom = PrometheusBuilder::new().with_http_listener(introspection_address);
        tokio::select! {
            res = prom.install() => if let Err(e) = res {
                error!("error setting up prometheus endpoint: {e}");
            },
            _ = prom_token.cancelled() => {}
        }
    });
    let sig_token = token.clone();
    rt.handle().spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("error reading SIGTERM: {err}");
        }
        sig_token.cancel();
    });
    rt.block_on(dispatch(matches, token))
}

async fn dispatch(matches: clap::ArgMatches, token: CancellationToken) -> Result<()> {
    let config = kube::Config::infer().await?;
    let client = kube::client::ClientBuilder::try_from(config)?.build();
    let cluster_name = ScanConfig::cluster_name("default");
    let reader = ClusterReader::new(client.clone(), cluster_name);

    let format: Format = matches.get_one::<String>("format").unwrap().parse()?;
    let namespace = matches.get_one::<String>("namespace").cloned();

    match matches.subcommand() {
        Some(("entries", m)) => {
            let mut scan_config = ScanConfig::new(reader.cluster_name().to_string())
                .with_drift(m.get_flag("drift"))
                .with_relations(m.get_flag("relations"));
            if let Some(ns) = namespace {
                scan_config = scan_config.with_namespace(ns);
            }
            let query = m.get_one::<String>("query").unwrap().clone();

            if m.get_flag("watch") {
                watch::run(client, &scan_config, token, || async {
                    let entries = commands::list_entries(&reader, &scan_config, &query).await?;
                    info!(count = entries.len(), "rescan complete");
                    kubescout_cli::output::render(&entries, format)
                })
                .await?;
                Ok(())
            } else {
                let entries = commands::list_entries(&reader, &scan_config, &query).await?;
                kubescout_cli::output::render(&entries, format)
            }
        }
        Some(("trace", m)) => {
            let target: commands::TargetRef = m.get_one::<String>("target").unwrap().parse()?;
            let trace = commands::trace(&reader, &target, m.get_flag("reverse")).await?;
            kubescout_cli::output::render(&trace, format)
        }
        Some(("drift", m)) => {
            let target: commands::TargetRef = m.get_one::<String>("target").unwrap().parse()?;
            let drift = commands::drift(&reader, &target).await?;
            kubescout_cli::output::render(&drift, format)
        }
        Some(("dangling", _m)) => {
            let mut scan_config = ScanConfig::new(reader.cluster_name().to_string());
            if let Some(ns) = namespace {
                scan_config = scan_config.with_namespace(ns);
            }
            let dangling = commands::dangling(&reader, &scan_config).await?;
            kubescout_cli::output::render(&dangling, format)
        }
        Some(("gsf", m)) => {
            let mut scan_config = ScanConfig::new(reader.cluster_name().to_string())
                .with_drift(m.get_flag("drift"))
                .with_relations(m.get_flag("relations"));
            if let Some(ns) = namespace {
                scan_config = scan_config.with_namespace(ns);
            }
            let generated_at = chrono::Utc::now().to_rfc3339();
            let doc = commands::gsf(&reader, &scan_config, generated_at).await?;
            kubescout_cli::output::render(&doc, format)
        }
        Some(("remedy", m)) => {
            let path = m.get_one::<String>("findings").unwrap();
            let raw = std::fs::read_to_string(path)?;
            let findings: Vec<kubescout_core::ccve::Finding> = serde_json::from_str(&raw)?;
            let timeout_secs: u64 = m
                .get_one::<String>("timeout_secs")
                .unwrap()
                .parse()
                .map_err(|_| Error::Usage("--timeout-secs must be an integer".to_string()))?;
            let options = ExecuteOptions {
                dry_run: !m.get_flag("apply"),
                force: m.get_flag("force"),
                rollback: m.get_flag("rollback"),
                timeout: Duration::from_secs(timeout_secs),
            };
            let registry = default_registry(client);
            let results = commands::remedy(&registry, &findings, &options).await?;
            kubescout_cli::output::render(&results, format)
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Default_registry wires the four auto-executable `RemedyType`s (§4.9); the remaining three
/// are advice-only and deliberately have no entry (`kubescout_remedy::executors`'s doc comment).
fn default_registry(client: kube::Client) -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(ConfigFixExecutor::new(client.clone())));
    registry.register(Box::new(TriggerActionExecutor::new(client.clone())));
    registry.register(Box::new(RestartExecutor::new(client.clone())));
    registry.register(Box::new(DeleteResourceExecutor::new(client)));
    registry
}
