//! Command-line front end: resolve one key, or list the keys of a locale.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use i18n_engine::config::{
    self,
    ConfigError,
    I18nSettings,
};
use i18n_engine::{
    Engine,
    ParamValue,
    Params,
};
use tracing_subscriber::EnvFilter;

/// Resolve translation keys from the command line
#[derive(Parser, Debug)]
#[command(name = "i18n-engine")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to `.i18n.json` in the working directory)
    #[arg(short, long, env = "I18N_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Bundle to load before resolving, as LOCALE=URL (repeatable)
    #[arg(short, long = "bundle", value_parser = parse_pair)]
    bundles: Vec<(String, String)>,

    /// Locale to switch to
    #[arg(short, long)]
    locale: Option<String>,

    /// Interpolation parameter, as NAME=VALUE (repeatable)
    #[arg(short, long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// List every key of the current locale instead of resolving one
    #[arg(long, conflicts_with = "key")]
    keys: bool,

    /// Dotted key to resolve
    #[arg(required_unless_present = "keys")]
    key: Option<String>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

fn load_settings(path: Option<&PathBuf>) -> Result<I18nSettings, ConfigError> {
    if let Some(path) = path {
        return config::load_from_file(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(config::load_from_dir(&cwd)?.unwrap_or_default())
}

fn to_params(pairs: Vec<(String, String)>) -> Option<Params> {
    if pairs.is_empty() {
        return None;
    }
    let params = pairs
        .into_iter()
        .map(|(name, value)| {
            let value = value.parse::<i64>().map_or_else(|_| ParamValue::from(value), ParamValue::from);
            (name, value)
        })
        .collect();
    Some(params)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };
    let engine = Arc::new(Engine::new(settings));

    let mut failed = false;
    for ((locale, url), result) in cli.bundles.iter().zip(engine.load_translations_many(&cli.bundles).await) {
        if let Err(error) = result {
            tracing::error!(locale = %locale, url = %url, %error, "Failed to load bundle");
            failed = true;
        }
    }

    if let Some(locale) = &cli.locale
        && !engine.set_locale(locale)
    {
        tracing::error!(locale = %locale, available = ?engine.available_locales(), "Unknown locale");
        return ExitCode::FAILURE;
    }

    if cli.keys {
        for key in engine.keys(&engine.current_locale()) {
            println!("{key}");
        }
    } else if let Some(key) = &cli.key {
        let params = to_params(cli.params);
        println!("{}", engine.translate(key, params.as_ref()));
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
