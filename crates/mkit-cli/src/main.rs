use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mkit_core::domain::{Inputless, TaskDescriptor, WithInput};
use mkit_core::impls::ScriptedEngine;
use mkit_core::{Scalar, TaskBuilder, TaskKind, TaskProfile};

#[derive(Debug, Parser)]
#[command(name = "mkit", about = "Run measurement tasks and print their progress")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the task catalogue.
    List,
    /// Run one task against a replayed event script.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Task name, e.g. `Ndt` or `WebConnectivity`.
    task: TaskKind,

    /// Newline-delimited serialized events to replay.
    #[arg(long)]
    replay: PathBuf,

    /// JSON task profile applied before the flags below.
    #[arg(long)]
    profile: Option<PathBuf>,

    #[arg(long = "input")]
    inputs: Vec<String>,

    #[arg(long = "input-file")]
    input_files: Vec<String>,

    /// key=value
    #[arg(long = "annotation", value_parser = parse_key_value)]
    annotations: Vec<(String, Scalar)>,

    /// key=value
    #[arg(long = "option", value_parser = parse_key_value)]
    options: Vec<(String, Scalar)>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    log_file: Option<String>,

    /// Raise task verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Lower task verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    quiet: u8,
}

fn parse_key_value(s: &str) -> Result<(String, Scalar), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    let value = if let Ok(i) = v.parse::<i64>() {
        Scalar::Integer(i)
    } else if let Ok(f) = v.parse::<f64>() {
        Scalar::Float(f)
    } else {
        Scalar::from(v)
    };
    Ok((k.to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::List => {
            for kind in TaskKind::ALL {
                let input = if kind.accepts_input() { "inputs" } else { "-" };
                println!("{:<28} {input}", kind.name());
            }
            Ok(())
        }
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let engine = ScriptedEngine::from_path(&args.replay)
        .with_context(|| format!("cannot read replay script {}", args.replay.display()))?;

    match args.task {
        TaskKind::Dash => run_inputless::<mkit_core::Dash>(engine, args).await,
        TaskKind::CaptivePortal => run_inputless::<mkit_core::CaptivePortal>(engine, args).await,
        TaskKind::DnsInjection => run_with_input::<mkit_core::DnsInjection>(engine, args).await,
        TaskKind::FacebookMessenger => {
            run_inputless::<mkit_core::FacebookMessenger>(engine, args).await
        }
        TaskKind::HttpHeaderFieldManipulation => {
            run_inputless::<mkit_core::HttpHeaderFieldManipulation>(engine, args).await
        }
        TaskKind::HttpInvalidRequestLine => {
            run_inputless::<mkit_core::HttpInvalidRequestLine>(engine, args).await
        }
        TaskKind::MeekFrontedRequests => {
            run_with_input::<mkit_core::MeekFrontedRequests>(engine, args).await
        }
        TaskKind::MultiNdt => run_inputless::<mkit_core::MultiNdt>(engine, args).await,
        TaskKind::Ndt => run_inputless::<mkit_core::Ndt>(engine, args).await,
        TaskKind::TcpConnect => run_with_input::<mkit_core::TcpConnect>(engine, args).await,
        TaskKind::Telegram => run_inputless::<mkit_core::Telegram>(engine, args).await,
        TaskKind::WebConnectivity => {
            run_with_input::<mkit_core::WebConnectivity>(engine, args).await
        }
        TaskKind::Whatsapp => run_inputless::<mkit_core::Whatsapp>(engine, args).await,
    }
}

async fn run_inputless<D>(engine: ScriptedEngine, args: RunArgs) -> anyhow::Result<()>
where
    D: TaskDescriptor<Input = Inputless>,
{
    if !args.inputs.is_empty() || !args.input_files.is_empty() {
        bail!("task `{}` does not take inputs", D::KIND);
    }
    let builder = configure(TaskBuilder::<D, _>::new(engine), &args)?;
    execute(builder).await
}

async fn run_with_input<D>(engine: ScriptedEngine, args: RunArgs) -> anyhow::Result<()>
where
    D: TaskDescriptor<Input = WithInput>,
{
    let mut builder = configure(TaskBuilder::<D, _>::new(engine), &args)?;
    for input in &args.inputs {
        builder = builder.add_input(input.clone());
    }
    for path in &args.input_files {
        builder = builder.add_input_filepath(path.clone());
    }
    execute(builder).await
}

fn configure<D: TaskDescriptor>(
    mut builder: TaskBuilder<D, ScriptedEngine>,
    args: &RunArgs,
) -> anyhow::Result<TaskBuilder<D, ScriptedEngine>> {
    builder = builder.set_verbosity(2);
    if let Some(path) = &args.profile {
        let profile = TaskProfile::from_path(path)?;
        builder = builder.apply_profile(&profile)?;
    }
    for _ in 0..args.verbose {
        builder = builder.increase_verbosity();
    }
    for _ in 0..args.quiet {
        builder = builder.decrease_verbosity();
    }
    if let Some(path) = &args.output {
        builder = builder.set_output_filepath(path.clone());
    }
    if let Some(path) = &args.log_file {
        builder = builder.set_log_filepath(path.clone());
    }
    for (k, v) in &args.options {
        builder = builder.set_option(k.clone(), v.clone());
    }
    for (k, v) in &args.annotations {
        builder = builder.add_annotation(k.clone(), v.clone());
    }
    debug!(task = %D::KIND, verbosity = ?builder.verbosity(), "task configured");
    Ok(builder)
}

async fn execute<D: TaskDescriptor>(builder: TaskBuilder<D, ScriptedEngine>) -> anyhow::Result<()> {
    let mut builder = builder
        .on_log(|entry| info!(engine_level = %entry.log_level, "{}", entry.message))
        .on_failure_startup(|f| warn!(failure = %f.failure, "task could not start"))
        .on_failure_measurement(|f| warn!(failure = %f.failure, "measurement failed"))
        .on_failure_measurement_submission(|f| {
            warn!(idx = f.idx, failure = %f.failure, "measurement submission failed")
        })
        .on_status_update_performance(|p| {
            eprintln!(
                "{}: after {} s speed {} kbit/s with {} flows",
                p.direction, p.elapsed, p.speed_kbps, p.num_streams
            )
        })
        .on_status_update_websites(|w| eprintln!("{}: {}", w.url, w.status))
        .on_status_end(|end| {
            info!(
                downloaded_kb = end.downloaded_kb,
                uploaded_kb = end.uploaded_kb,
                "task finished"
            )
        })
        .on_unhandled_event(|raw| debug!(event = raw, "unhandled event"));
    builder.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_scalars() {
        assert_eq!(
            parse_key_value("port=3001").unwrap(),
            ("port".to_string(), Scalar::Integer(3001))
        );
        assert_eq!(
            parse_key_value("ratio=0.5").unwrap(),
            ("ratio".to_string(), Scalar::Float(0.5))
        );
        assert_eq!(
            parse_key_value("scope=a=b").unwrap(),
            ("scope".to_string(), Scalar::from("a=b"))
        );
        assert!(parse_key_value("scope").is_err());
    }

    #[test]
    fn cli_parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "mkit",
            "run",
            "WebConnectivity",
            "--replay",
            "events.jsonl",
            "--input",
            "https://a.example/",
            "--annotation",
            "scope=example",
            "-vv",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.task, TaskKind::WebConnectivity);
        assert_eq!(args.inputs, vec!["https://a.example/"]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.annotations[0].0, "scope");
    }

    #[test]
    fn cli_rejects_unknown_task() {
        assert!(Cli::try_parse_from(["mkit", "run", "Nope", "--replay", "x"]).is_err());
    }
}
