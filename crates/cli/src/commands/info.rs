//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BuilderConfig, ClientConfig, PutBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Debug, Serialize)]
struct ConfigInfo {
    version: String,
    dispatcher: DispatcherInfo,
    builder: BuilderInfo,
    client: ClientInfo,
}

#[derive(Debug, Serialize)]
struct DispatcherInfo {
    scheme: String,
    batch_size: usize,
}

#[derive(Debug, Serialize)]
struct BuilderInfo {
    kind: &'static str,
    destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_field: Option<String>,
    family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    qualifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    complex_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClientInfo {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fail_destinations: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &PutBlueprint) -> ConfigInfo {
    let builder = match &blueprint.builder {
        BuilderConfig::Cell(cell) => BuilderInfo {
            kind: "cell",
            destination: cell.destination.clone(),
            key: Some(cell.key.clone()),
            key_field: None,
            family: cell.family.clone(),
            qualifier: Some(cell.qualifier.clone()),
            complex_fields: None,
            timestamp: cell.timestamp.clone(),
        },
        BuilderConfig::Json(json) => BuilderInfo {
            kind: "json",
            destination: json.destination.clone(),
            key: json.key.clone(),
            key_field: json.key_field.clone(),
            family: json.family.clone(),
            qualifier: None,
            complex_fields: Some(format!("{:?}", json.complex_fields).to_lowercase()),
            timestamp: json.timestamp.clone(),
        },
    };

    let client = match &blueprint.client {
        ClientConfig::Log => ClientInfo {
            kind: "log",
            base_path: None,
            fail_destinations: Vec::new(),
        },
        ClientConfig::File { base_path } => ClientInfo {
            kind: "file",
            base_path: Some(base_path.clone()),
            fail_destinations: Vec::new(),
        },
        ClientConfig::Memory { fail_destinations } => ClientInfo {
            kind: "memory",
            base_path: None,
            fail_destinations: fail_destinations.clone(),
        },
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatcher: DispatcherInfo {
            scheme: blueprint.dispatcher.scheme.clone(),
            batch_size: blueprint.dispatcher.batch_size,
        },
        builder,
        client,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Batch Put Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Dispatcher");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Scheme: {}", info.dispatcher.scheme);
    println!("   └─ Batch size: {}", info.dispatcher.batch_size);

    let builder = &info.builder;
    println!("\n🧱 Builder ({})", builder.kind);
    println!("   ├─ Destination: {}", builder.destination);
    if let Some(ref key_field) = builder.key_field {
        println!("   ├─ Key field: {}", key_field);
    }
    if let Some(ref key) = builder.key {
        println!("   ├─ Key: {}", key);
    }
    if let Some(ref qualifier) = builder.qualifier {
        println!("   ├─ Qualifier: {}", qualifier);
    }
    if let Some(ref complex) = builder.complex_fields {
        println!("   ├─ Complex fields: {}", complex);
    }
    if let Some(ref timestamp) = builder.timestamp {
        println!("   ├─ Timestamp: {}", timestamp);
    }
    println!("   └─ Family: {}", builder.family);

    let client = &info.client;
    println!("\n📤 Client ({})", client.kind);
    match (&client.base_path, client.fail_destinations.is_empty()) {
        (Some(base_path), _) => println!("   └─ Base path: {}", base_path),
        (None, false) => println!("   └─ Failing destinations: {:?}", client.fail_destinations),
        (None, true) => println!("   └─ (no options)"),
    }

    println!();
}
