//! Developer tasks (schema generation, explain coverage, conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    // If we're in the xtask directory, go up one level
    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .context("xtask has no parent")
    } else {
        Ok(manifest_dir)
    }
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(trustgate_settings::TrustConfigV1)
}

fn generate_profile_schema() -> schemars::Schema {
    schema_for!(trustgate_settings::ProfileFileV1)
}

fn generate_waivers_schema() -> schemars::Schema {
    schema_for!(trustgate_types::WaiverFile)
}

fn generate_snapshot_schema() -> schemars::Schema {
    schema_for!(trustgate_types::DecisionSnapshot)
}

fn generate_envelope_schema() -> schemars::Schema {
    schema_for!(trustgate_types::AttestationEnvelope)
}

fn generate_payload_schema() -> schemars::Schema {
    schema_for!(trustgate_types::AttestationPayload)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "trustgate.config.v1.json",
            generate: generate_config_schema,
        },
        SchemaSpec {
            filename: "trustgate.profile.v1.json",
            generate: generate_profile_schema,
        },
        SchemaSpec {
            filename: "trustgate.waivers.v1.json",
            generate: generate_waivers_schema,
        },
        SchemaSpec {
            filename: "trustgate.decision-snapshot.v1.json",
            generate: generate_snapshot_schema,
        },
        SchemaSpec {
            filename: "trustgate.attestation.v1.json",
            generate: generate_envelope_schema,
        },
        SchemaSpec {
            filename: "trustgate.attestation-payload.v1.json",
            generate: generate_payload_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Run the trustgate binary and validate its files against the schemas");
    eprintln!("  explain-coverage  Validate all rule IDs and gates have explanations");
}

/// Every rule ID and gate name must resolve to a non-empty explanation.
fn explain_coverage() -> anyhow::Result<()> {
    let rules = trustgate_types::explain::all_rule_ids();
    let gates = trustgate_types::explain::all_gates();
    let mut errors = Vec::new();

    for (kind, id) in rules
        .iter()
        .map(|r| ("Rule", r))
        .chain(gates.iter().map(|g| ("Gate", g)))
    {
        match trustgate_types::lookup_explanation(id) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty title"));
                }
                if exp.description.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty description"));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty remediation"));
                }
            }
            None => errors.push(format!("{kind} '{id}' has no explanation")),
        }
    }

    if errors.is_empty() {
        println!("✓ {} rule IDs have explanations", rules.len());
        println!("✓ {} gates have explanations", gates.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!("Explain coverage validation failed with {} errors", errors.len())
    }
}

fn compile(schema: &schemars::Schema) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value(schema).context("Failed to serialize schema")?;
    jsonschema::validator_for(&value).map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))
}

fn check_instance(
    validator: &jsonschema::Validator,
    label: &str,
    instance: &Value,
    errors: &mut Vec<String>,
) {
    for err in validator.iter_errors(instance) {
        errors.push(format!("{label}: {err}"));
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Run the built binary against a scratch project and validate everything it writes.
///
/// Covers the persisted decision snapshot for a failing and a passing run and the attestation
/// envelope (plus its payload) produced by `attest`.
fn conform() -> anyhow::Result<()> {
    let root = project_root()?;
    let bin = root.join("target").join("debug").join("trustgate");

    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");

    if !bin.exists() {
        bail!(
            "trustgate binary not found at {}.\n\
            Run `cargo build -p trustgate-cli` first.",
            bin.display()
        );
    }

    let snapshot_schema = compile(&generate_snapshot_schema())?;
    let envelope_schema = compile(&generate_envelope_schema())?;
    let payload_schema = compile(&generate_payload_schema())?;
    println!("✓ schemas compile");

    let temp = tempfile::tempdir().context("Failed to create temp dir")?;
    let project = temp.path();
    let digest = format!("sha256:{}", "a".repeat(64));
    let run = |args: &[&str]| -> anyhow::Result<std::process::Output> {
        std::process::Command::new(&bin)
            .arg("--project-root")
            .arg(project)
            .args(args)
            .env_remove("TRUSTGATE_SIGNING_KEY")
            .env_remove("TRUSTGATE_SIGNING_KEY_FILE")
            .output()
            .context("Failed to run trustgate")
    };

    let mut errors = Vec::new();
    let snapshot_path = project.join(".trustgate/state/last-decision.json");

    // No SBOM: fails and still records a snapshot.
    let out = run(&["verify", "conform/app:1", "--digest", &digest])?;
    if out.status.code() != Some(1) {
        errors.push(format!("verify without SBOM exited {:?}", out.status.code()));
    }
    check_instance(&snapshot_schema, "fail snapshot", &read_json(&snapshot_path)?, &mut errors);

    fs::write(project.join("sbom.json"), "{}").context("Failed to write sbom.json")?;
    trustgate_test_util::keys::install_project_key(project).context("Failed to install key")?;

    let out = run(&["attest", "conform/app:1", "--digest", &digest])?;
    if !out.status.success() {
        errors.push(format!(
            "attest failed: {}",
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    check_instance(&snapshot_schema, "pass snapshot", &read_json(&snapshot_path)?, &mut errors);

    let att_dir = project.join(".trustgate/attestations");
    let mut envelopes = 0;
    for entry in fs::read_dir(&att_dir)
        .with_context(|| format!("Failed to read {}", att_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        envelopes += 1;
        let envelope = read_json(&path)?;
        let label = path.display().to_string();
        check_instance(&envelope_schema, &label, &envelope, &mut errors);
        check_instance(&payload_schema, &label, &envelope["payload"], &mut errors);

        let normalized = trustgate_test_util::normalize_nondeterministic(envelope);
        if normalized["payload"]["subject"]["digest"] != digest.as_str() {
            errors.push(format!("{label}: subject digest not bound"));
        }
    }
    if envelopes == 0 {
        errors.push("attest wrote no envelope".to_string());
    }

    let out = run(&["promote", "conform/app:1", "--digest", &digest, "--to", "prod"])?;
    if !out.status.success() {
        errors.push(format!(
            "promote after attest failed: {}",
            String::from_utf8_lossy(&out.stdout)
        ));
    }

    if errors.is_empty() {
        println!("✓ decision snapshots conform");
        println!("✓ {envelopes} attestation envelope(s) conform");
        println!("\n✓ Conformance passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!("Conformance failed with {} errors", errors.len())
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            println!("{}", trustgate_types::SCHEMA_DECISION_SNAPSHOT_V1);
            println!("{}", trustgate_types::SCHEMA_ATTESTATION_V1);
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
