//! `envreg` command line
//!
//! Thin front end over `envreg-registry`: parses flags, sets up logging and
//! prints results.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use envreg_registry::{format_report, AddRequest, FsRegistry, RegistryConfig, SetRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ENVREG_LOG";

fn build_cli() -> Command {
    Command::new("envreg")
        .version(envreg_registry::VERSION)
        .about("Manage the deployment environments of an application")
        .arg(
            Arg::new("app-root")
                .long("app-root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Application root holding the environments directory [default: .]"),
        )
        .arg(
            Arg::new("kubeconfig")
                .long("kubeconfig")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Kubeconfig file used to resolve contexts"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log verbosity (repeatable)"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("env")
                .about("Manage environments")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("add")
                        .about("Add an environment")
                        .arg(
                            Arg::new("name")
                                .required(true)
                                .help("Environment name, e.g. us-west/staging"),
                        )
                        .arg(
                            Arg::new("uri")
                                .long("uri")
                                .help("Cluster URI; defaults to the context's server"),
                        )
                        .arg(
                            Arg::new("namespace")
                                .long("namespace")
                                .help("Namespace; defaults to the context's namespace"),
                        )
                        .arg(
                            Arg::new("context")
                                .long("context")
                                .help("Kubeconfig context to read the cluster from"),
                        )
                        .arg(
                            Arg::new("api-spec")
                                .long("api-spec")
                                .help("API spec the environment's libraries are generated from"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Remove an environment")
                        .arg(Arg::new("name").required(true).help("Environment name")),
                )
                .subcommand(
                    Command::new("list").about("List environments").arg(
                        Arg::new("json")
                            .long("json")
                            .action(ArgAction::SetTrue)
                            .help("Output as JSON"),
                    ),
                )
                .subcommand(
                    Command::new("set")
                        .about("Rename an environment or change its cluster")
                        .arg(
                            Arg::new("name")
                                .required(true)
                                .help("Current environment name"),
                        )
                        .arg(
                            Arg::new("new-name")
                                .long("name")
                                .help("New environment name"),
                        )
                        .arg(Arg::new("uri").long("uri").help("New cluster URI"))
                        .arg(Arg::new("namespace").long("namespace").help("New namespace"))
                        .arg(
                            Arg::new("context")
                                .long("context")
                                .help("Kubeconfig context whose server becomes the URI"),
                        ),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(matches: &ArgMatches) -> RegistryConfig {
    let mut config = RegistryConfig::from_env();
    if let Some(root) = matches.get_one::<PathBuf>("app-root") {
        config = config.with_app_root(root);
    }
    if let Some(path) = matches.get_one::<PathBuf>("kubeconfig") {
        config = config.with_kubeconfig(path);
    }
    config
}

fn string_arg(args: &ArgMatches, id: &str) -> Option<String> {
    args.get_one::<String>(id).cloned()
}

fn required_arg(args: &ArgMatches, id: &str) -> anyhow::Result<String> {
    string_arg(args, id).with_context(|| format!("missing argument <{id}>"))
}

fn add_request(args: &ArgMatches) -> anyhow::Result<AddRequest> {
    Ok(AddRequest {
        name: required_arg(args, "name")?,
        uri: string_arg(args, "uri"),
        namespace: string_arg(args, "namespace"),
        context: string_arg(args, "context"),
        api_spec: string_arg(args, "api-spec"),
    })
}

fn set_request(args: &ArgMatches) -> anyhow::Result<SetRequest> {
    Ok(SetRequest {
        name: required_arg(args, "name")?,
        new_name: string_arg(args, "new-name"),
        uri: string_arg(args, "uri"),
        namespace: string_arg(args, "namespace"),
        context: string_arg(args, "context"),
    })
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = config_from(matches);
    tracing::debug!("Using application root {}", config.app_root.display());
    let registry = FsRegistry::open(&config);

    let Some(("env", env)) = matches.subcommand() else {
        anyhow::bail!("unknown command");
    };

    match env.subcommand() {
        Some(("add", args)) => registry.add(&add_request(args)?)?,
        Some(("rm", args)) => registry.remove(&required_arg(args, "name")?)?,
        Some(("list", args)) => {
            let rows = registry.list()?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", format_report(&rows));
            }
        }
        Some(("set", args)) => registry.set(&set_request(args)?)?,
        _ => anyhow::bail!("unknown env command"),
    }

    Ok(())
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
