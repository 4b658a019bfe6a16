//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BuilderConfig, ClientConfig, ComplexFieldStrategy, PutBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    scheme: String,
    batch_size: usize,
    builder: &'static str,
    destination: String,
    client: &'static str,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    scheme: blueprint.dispatcher.scheme.clone(),
                    batch_size: blueprint.dispatcher.batch_size,
                    builder: blueprint.builder.kind(),
                    destination: blueprint.builder.destination().to_string(),
                    client: blueprint.client.kind(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &PutBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    match &blueprint.client {
        ClientConfig::Memory { fail_destinations } => {
            warnings.push("Memory client keeps rows in process - nothing is persisted".to_string());
            if !fail_destinations.is_empty() {
                warnings.push(format!(
                    "Memory client fails every put to {:?}",
                    fail_destinations
                ));
            }
        }
        ClientConfig::Log => {
            warnings.push("Log client only logs bulk puts - nothing is persisted".to_string());
        }
        ClientConfig::File { .. } => {}
    }

    if let BuilderConfig::Json(json) = &blueprint.builder {
        if json.complex_fields == ComplexFieldStrategy::Fail {
            warnings.push(
                "builder.complex_fields = \"fail\" - records with nested values will be routed to failure"
                    .to_string(),
            );
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Scheme: {}", summary.scheme);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Builder: {} -> {}", summary.builder, summary.destination);
            println!("  Client: {}", summary.client);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::path::PathBuf;

    const JSON_FAIL_MEMORY: &str = r#"
[builder]
kind = "json"
destination = "events"
key_field = "id"
family = "cf"
complex_fields = "fail"

[client]
kind = "memory"
fail_destinations = ["events"]
"#;

    #[test]
    fn test_collect_warnings() {
        let bp = ConfigLoader::load_from_str(JSON_FAIL_MEMORY, ConfigFormat::Toml).unwrap();
        let warnings = collect_warnings(&bp);

        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("Memory client"));
        assert!(warnings[2].contains("complex_fields"));
    }

    #[test]
    fn test_validate_missing_file() {
        let args = ValidateArgs {
            config: PathBuf::from("/nonexistent/put.toml"),
            json: true,
        };
        let result = validate_config(&args);

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("put.toml");
        std::fs::write(&path, JSON_FAIL_MEMORY).unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: false,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.builder, "json");
        assert_eq!(summary.client, "memory");
        assert_eq!(summary.batch_size, 25);
    }
}
