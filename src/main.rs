//! PwnBox CLI - provision and log in to a PwnBox container

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pwnbox::cli::{Args, Command};
use pwnbox::commands::{self, RunOptions, Session};
use pwnbox::config;
use pwnbox::connect::{ExecHandoff, WaitPolicy};
use pwnbox::engine::{DockerEngine, Engine};
use pwnbox::output::{banner, write_interrupt_notice, ConsoleSink, OutputSink, Tone};
use pwnbox::update;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    install_interrupt_handler();

    let sink = ConsoleSink::new(args.verbose);
    if let Err(e) = run(args, &sink).await {
        sink.clear_status();
        sink.line(Tone::Error, &format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,pwnbox=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        let _ = write_interrupt_notice(&mut std::io::stdout());
        std::process::exit(0);
    });
    if let Err(e) = result {
        debug!(error = %e, "Could not install Ctrl-C handler");
    }
}

async fn run(args: Args, sink: &ConsoleSink) -> pwnbox::Result<()> {
    if !args.no_banner {
        banner::print_banner(update::VERSION);
    }

    if args.command == Command::Generate {
        return commands::generate(&config::resolve_path(&args.config), sink);
    }

    let (path, created) = config::ensure_exists(&args.config)?;
    if created {
        sink.line(
            Tone::Detail,
            &format!("Creating default config at {}", path.display()),
        );
    }
    let settings = config::load(&path)?;
    debug!(config = %path.display(), "Loaded config");
    if let Ok(json) = serde_json::to_string_pretty(&settings) {
        sink.verbose(&format!("Settings: {}", json));
    }

    if !args.no_update {
        check_for_release(sink).await;
    }

    let engine = DockerEngine::connect()?;
    engine.ping().await?;

    let options = RunOptions {
        check_updates: !args.no_update,
        ssh: !args.no_ssh,
        wait: WaitPolicy::from_timeout(args.timeout),
        ..RunOptions::default()
    };
    let session = Session::new(&engine, sink, &ExecHandoff, options);

    match args.command {
        Command::Up => session.up(&settings).await,
        Command::Down => session.down(&settings).await,
        Command::Pull => session.pull(&settings).await,
        Command::Generate => Ok(()),
    }
}

/// Tell the user about a newer CLI release. Never fatal.
async fn check_for_release(sink: &dyn OutputSink) {
    match update::check(update::VERSION_URL, update::VERSION).await {
        Ok(Some(latest)) => sink.line(
            Tone::Detail,
            &format!(
                "A new version of PwnBox CLI ({}) has been released. Upgrade to get the latest features and fixes.",
                latest
            ),
        ),
        Ok(None) => {}
        Err(e) => {
            debug!(error = %e, "Release check failed");
            sink.line(
                Tone::Error,
                "Error: There was an error trying to check GitHub for the latest version.",
            );
        }
    }
}
