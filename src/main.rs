//! Prints the signature and side effects of serialized descriptions.
//!
//! Usage: `callguard <description.json>...`
//!
//! Guard settings are read from `callguard.toml` (if present) and `CALLGUARD_*`
//! environment variables and echoed, so a deployment can verify what its guards
//! will enforce. Set `RUST_LOG=debug` for more detail.

use std::fs;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use callguard::{CheckerRegistry, Description, GuardConfig, TypeEnv};

const SETTINGS_FILE: &str = "callguard.toml";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match GuardConfig::load(SETTINGS_FILE) {
        Ok(config) => info!(?config, "guard settings"),
        Err(e) => warn!(error = %e, "could not read guard settings, defaults apply"),
    }

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        error!("usage: callguard <description.json>...");
        return ExitCode::FAILURE;
    }

    let env = TypeEnv::from_registry(&CheckerRegistry::global());
    let mut failed = false;
    for path in &paths {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!(%path, error = %e, "could not read description");
                failed = true;
                continue;
            }
        };
        match Description::from_json(&text, Some(&env)) {
            Ok(decoded) => {
                if !decoded.warnings.is_empty() {
                    warn!(%path, count = decoded.warnings.len(), "description refers to unknown types");
                }
                let description = decoded.description;
                let name = description.name.as_deref().unwrap_or(path);
                println!("{}{}", name, description.compose_signature());
                for effect in description.side_effect_descriptions() {
                    println!("    side effect: {}", effect);
                }
            }
            Err(e) => {
                error!(%path, error = %e, "could not decode description");
                failed = true;
            }
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
