//! CLI entry point for trustgate.
//!
//! This module is intentionally thin: it handles argument parsing, output, logging setup
//! and exit codes. All business logic lives in the `trustgate-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use trustgate_app::{
    AttestInput, ExplainOutput, ProjectInput, VerifyInput, VerifyOutput, format_explanation,
    format_last_decision, format_not_found, render_annotations, render_markdown, render_text,
    run_attest, run_explain, run_explain_last, run_keys_ensure, run_keys_id, run_promote,
    run_verify, to_renderable,
};
use trustgate_settings::Overrides;

const LOG_ENV: &str = "TRUSTGATE_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "trustgate",
    version,
    about = "Trust verification gate for build artifacts"
)]
struct Cli {
    /// Project root (directory containing trustgate.toml and the evidence files).
    #[arg(long, default_value = ".", global = true)]
    project_root: Utf8PathBuf,

    /// Path to the trustgate config TOML (default: <project-root>/trustgate.toml if present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Override policy mode (enforce|warn).
    #[arg(long, global = true)]
    mode: Option<String>,

    /// Override profile (a preset name, a name under .trustgate/profiles, or a path).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Disable colored terminal output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging on stderr (overridden by TRUSTGATE_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug)]
struct ArtifactArgs {
    /// Artifact reference: name[:tag][@sha256:<hex>].
    artifact: String,

    /// Digest for a reference that does not carry one.
    #[arg(long)]
    digest: Option<String>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Print the decision as JSON instead of the text summary.
    #[arg(long)]
    json: bool,

    /// Also write a Markdown report to this path.
    #[arg(long)]
    write_markdown: Option<Utf8PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify an artifact: SBOM, waivers, policy.
    Verify {
        #[command(flatten)]
        artifact: ArtifactArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Verify an artifact for promotion; valid attestations are required.
    Promote {
        #[command(flatten)]
        artifact: ArtifactArgs,
        /// Target environment.
        #[arg(long)]
        to: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Verify an artifact and, unless it fails, write a signed attestation for it.
    Attest {
        #[command(flatten)]
        artifact: ArtifactArgs,
    },

    /// Explain a rule or gate, or the last recorded decision when no identifier is given.
    Explain {
        /// Rule ID (e.g. "sbom-required") or gate name (e.g. "attestation").
        identifier: Option<String>,
    },

    /// Print GitHub Actions annotations for the last recorded decision.
    Annotations {
        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Manage the attestation signing key.
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a signing key pair unless one already exists.
    Ensure,
    /// Print the key ID of the key `attest` would sign with.
    Id,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("trustgate error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.cmd {
        Commands::Verify { artifact, output } => cmd_verify(cli, artifact, output, None),
        Commands::Promote {
            artifact,
            to,
            output,
        } => cmd_verify(cli, artifact, output, Some(to)),
        Commands::Attest { artifact } => cmd_attest(cli, artifact),
        Commands::Explain { identifier } => cmd_explain(cli, identifier.as_deref()),
        Commands::Annotations { max } => cmd_annotations(cli, *max),
        Commands::Keys { cmd } => cmd_keys(cli, cmd),
    }
}

fn project_input(cli: &Cli) -> ProjectInput<'_> {
    ProjectInput {
        root: &cli.project_root,
        config: cli.config.as_deref(),
        overrides: Overrides {
            mode: cli.mode.clone(),
            profile: cli.profile.clone(),
            color: cli.no_color.then_some(false),
        },
    }
}

fn cmd_verify(
    cli: &Cli,
    artifact: &ArtifactArgs,
    output: &OutputArgs,
    target: Option<&str>,
) -> anyhow::Result<i32> {
    let input = VerifyInput {
        project: project_input(cli),
        artifact: &artifact.artifact,
        digest: artifact.digest.as_deref(),
        now: OffsetDateTime::now_utc(),
    };
    let out = match target {
        Some(target) => run_promote(&input, target)?,
        None => run_verify(&input)?,
    };

    report(&out, output)?;
    Ok(out.exit_code())
}

fn report(out: &VerifyOutput, output: &OutputArgs) -> anyhow::Result<()> {
    let renderable = to_renderable(&out.decision, out.artifact.as_str());

    if output.json {
        let json = serde_json::to_string_pretty(&out.decision).context("serialize decision")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&renderable, out.color));
    }

    if let Some(cause) = &out.rejection {
        eprintln!("trustgate: {} gate rejected {}: {cause}", cause.gate(), out.artifact);
    }

    if let Some(path) = &output.write_markdown {
        write_text_file(path, &render_markdown(&renderable)).context("write markdown")?;
    }
    Ok(())
}

fn cmd_attest(cli: &Cli, artifact: &ArtifactArgs) -> anyhow::Result<i32> {
    let out = run_attest(&AttestInput {
        project: project_input(cli),
        artifact: &artifact.artifact,
        digest: artifact.digest.as_deref(),
        now: OffsetDateTime::now_utc(),
    })?;

    match &out.written {
        Some(w) => {
            println!("attestation written: {}", w.path);
            println!("  key: {} ({})", w.key_id, w.key_source);
            println!("  results: {}", w.results_hash);
            Ok(0)
        }
        None => {
            let renderable = to_renderable(&out.verify.decision, out.verify.artifact.as_str());
            print!("{}", render_text(&renderable, out.verify.color));
            eprintln!("trustgate: verification failed, no attestation written");
            Ok(out.verify.exit_code())
        }
    }
}

fn cmd_explain(cli: &Cli, identifier: Option<&str>) -> anyhow::Result<i32> {
    let Some(identifier) = identifier else {
        return match run_explain_last(&project_input(cli))? {
            Some(snapshot) => {
                print!("{}", format_last_decision(&snapshot));
                Ok(0)
            }
            None => {
                eprintln!("trustgate: no recorded decision; run `trustgate verify` first");
                Ok(1)
            }
        };
    };

    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", format_explanation(&exp));
            Ok(0)
        }
        ExplainOutput::NotFound {
            identifier,
            available_rules,
            available_gates,
        } => {
            eprint!(
                "{}",
                format_not_found(&identifier, available_rules, available_gates)
            );
            Ok(1)
        }
    }
}

fn cmd_annotations(cli: &Cli, max: usize) -> anyhow::Result<i32> {
    let Some(snapshot) = run_explain_last(&project_input(cli))? else {
        anyhow::bail!("no recorded decision; run `trustgate verify` first");
    };
    let renderable = to_renderable(&snapshot.result, &snapshot.image_ref);
    for annotation in render_annotations(&renderable, max) {
        println!("{annotation}");
    }
    Ok(0)
}

fn cmd_keys(cli: &Cli, cmd: &KeysCommand) -> anyhow::Result<i32> {
    let input = project_input(cli);
    match cmd {
        KeysCommand::Ensure => {
            let out = run_keys_ensure(&input)?;
            let verb = if out.created { "created" } else { "existing" };
            println!("{verb} signing key {} at {}", out.key_id, out.path);
        }
        KeysCommand::Id => {
            let out = run_keys_id(&input)?;
            tracing::debug!(source = %out.source, "resolved signing key");
            println!("{}", out.key_id);
        }
    }
    Ok(0)
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}
