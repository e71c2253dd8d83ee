use std::env;
use std::path::PathBuf;

use eyre::Result;
use tracing::debug;

use crate::gemini_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::portfolio::Portfolio;

const CONFIG_DIR_NAME: &str = "portfolio-assistant";
const PORTFOLIO_FILE_NAME: &str = "portfolio.json";

/// Settings resolved from command-line flags, then the environment, then defaults.
#[derive(Clone, Default)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub portfolio_path: Option<PathBuf>,
}

/// Values given on the command line, which win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub portfolio: Option<PathBuf>,
}

impl AssistantConfig {
    pub fn resolve(overrides: Overrides) -> Self {
        Self::resolve_with(overrides, |key| env::var(key).ok())
    }

    fn resolve_with(overrides: Overrides, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = overrides
            .api_key
            .or_else(|| non_empty("GEMINI_API_KEY"))
            .or_else(|| non_empty("API_KEY"));

        let model = overrides
            .model
            .or_else(|| non_empty("GEMINI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = non_empty("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let portfolio_path = overrides
            .portfolio
            .or_else(|| non_empty("PORTFOLIO_PATH").map(PathBuf::from))
            .or_else(default_portfolio_path);

        Self {
            api_key,
            model,
            base_url,
            portfolio_path,
        }
    }

    pub fn load_portfolio(&self) -> Result<Portfolio> {
        let portfolio = match &self.portfolio_path {
            Some(path) => Portfolio::from_path(path)?,
            None => Portfolio::embedded()?,
        };
        Ok(portfolio)
    }
}

// Keeps the credential out of debug logs.
impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("portfolio_path", &self.portfolio_path)
            .finish()
    }
}

fn default_portfolio_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?
        .join(CONFIG_DIR_NAME)
        .join(PORTFOLIO_FILE_NAME);
    if path.is_file() {
        debug!("Found portfolio in config directory: {}", path.display());
        Some(path)
    } else {
        None
    }
}
