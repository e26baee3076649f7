//! # shadow-cli
//!
//! `shadowctl`, a command-line client for device shadows kept in a local
//! directory.
//!
//! ## Usage
//!
//! ```bash
//! # Ask the thermostat for 22 degrees, print what it still has to do
//! shadowctl desire default thermostat '{"temp": 22}'
//!
//! # The device reports back
//! shadowctl report default thermostat '{"temp": 22}'
//!
//! # Inspect
//! shadowctl get default thermostat
//! shadowctl delta default thermostat
//! ```
//!
//! `desire` and `report` create the shadow on first use; `get` and `delta`
//! fail on a shadow that was never created.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use device_shadow::{
    Shadow, ShadowConfig, ShadowError, ShadowId, ShadowStore, DEFAULT_BUCKET,
};
use shadow_document::{Document, DocumentError};
use shadow_kv_store::{KvError, LocalDiskKv};

/// Name of the directory under the platform data dir.
const DATA_DIR_NAME: &str = "edge-shadow";

/// shadowctl - inspect and update device shadows
#[derive(Parser, Debug)]
#[command(name = "shadowctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the shadow store [default: <data dir>/edge-shadow]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Bucket holding the shadow records
    #[arg(long, value_name = "NAME", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Refuse patches that put an object where a scalar or list lives
    #[arg(long)]
    pub strict: bool,

    /// Maximum nesting depth of merged documents
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the whole shadow record
    Get(Target),
    /// Merge a JSON patch into the desired state and print the delta
    Desire {
        #[command(flatten)]
        target: Target,
        /// JSON object; null values delete fields
        patch: String,
    },
    /// Merge a JSON patch into the reported state and print the delta
    Report {
        #[command(flatten)]
        target: Target,
        /// JSON object; null values delete fields
        patch: String,
    },
    /// Print the desired fields not yet reported
    Delta(Target),
}

/// The shadow a command applies to.
#[derive(Args, Debug)]
pub struct Target {
    pub namespace: String,
    pub name: String,
}

impl Target {
    fn id(&self) -> ShadowId {
        ShadowId::new(self.namespace.clone(), self.name.clone())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("no platform data directory; pass --data-dir")]
    NoDataDir,

    #[error("invalid patch: {0}")]
    Patch(#[source] DocumentError),

    #[error(transparent)]
    Shadow(#[from] ShadowError),

    #[error(transparent)]
    Store(#[from] KvError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Cli {
    /// Shadow store settings from the command-line flags.
    pub fn config(&self) -> ShadowConfig {
        ShadowConfig::new()
            .with_bucket(self.bucket.clone())
            .with_strict_merge(self.strict)
            .with_max_depth(self.max_depth)
    }

    /// The store directory: `--data-dir`, or the platform default.
    pub fn data_dir(&self) -> Result<PathBuf, CliError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir().ok_or(CliError::NoDataDir),
        }
    }
}

/// `<platform data dir>/edge-shadow`, if the platform has one.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(DATA_DIR_NAME))
}

/// Run one command and return what should be printed.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let data_dir = cli.data_dir()?;
    log::debug!("Opening shadow store at {}", data_dir.display());
    let kv = LocalDiskKv::create(data_dir)?;
    let store = ShadowStore::with_config(Arc::new(kv), &cli.config());

    let output = match &cli.command {
        Command::Get(target) => serde_json::to_string_pretty(&store.load(&target.id())?)?,
        Command::Delta(target) => serde_json::to_string_pretty(&store.delta(&target.id())?)?,
        Command::Desire { target, patch } => {
            let patch = parse_patch(patch)?;
            let shadow = Shadow::new(target.namespace.clone(), target.name.clone(), store)?;
            serde_json::to_string_pretty(&shadow.desire(&patch)?)?
        }
        Command::Report { target, patch } => {
            let patch = parse_patch(patch)?;
            let shadow = Shadow::new(target.namespace.clone(), target.name.clone(), store)?;
            serde_json::to_string_pretty(&shadow.report(&patch)?)?
        }
    };
    Ok(output)
}

fn parse_patch(text: &str) -> Result<Document, CliError> {
    Document::from_json_str(text).map_err(CliError::Patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "shadowctl",
            "--data-dir",
            "/tmp/shadows",
            "--strict",
            "desire",
            "default",
            "thermostat",
            r#"{"temp": 22}"#,
        ])
        .unwrap();

        assert_eq!(cli.data_dir().unwrap(), PathBuf::from("/tmp/shadows"));
        assert_eq!(cli.bucket, DEFAULT_BUCKET);
        let config = cli.config();
        assert!(config.strict_merge);
        assert_eq!(config.max_depth, None);

        match cli.command {
            Command::Desire { target, patch } => {
                assert_eq!(target.id(), ShadowId::new("default", "thermostat"));
                assert_eq!(patch, r#"{"temp": 22}"#);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn desire_requires_a_patch() {
        assert!(Cli::try_parse_from(["shadowctl", "desire", "default", "thermostat"]).is_err());
        assert!(Cli::try_parse_from(["shadowctl", "get", "default", "thermostat"]).is_ok());
    }

    #[test]
    fn non_object_patch_is_rejected() {
        assert!(matches!(
            parse_patch("[1, 2]"),
            Err(CliError::Patch(DocumentError::NotAMap { found: "list" }))
        ));
        assert!(matches!(parse_patch("{"), Err(CliError::Patch(DocumentError::Json(_)))));
    }
}
