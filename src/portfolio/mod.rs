pub mod context;
pub mod variant;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PortfolioError;

pub use context::PortfolioContext;
pub use variant::SceneVariant;

const EMBEDDED_PORTFOLIO: &str = include_str!("../../data/portfolio.json");

/// Static content of the portfolio site.
///
/// Keys follow the camelCase naming used by the site's content files so the
/// same JSON can be dropped in with `--portfolio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub profile: Profile,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skill_categories: Vec<SkillCategory>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Accent color used by the project's card and scene, e.g. `#3b82f6`.
    pub color: String,
}

impl Project {
    pub fn variant(&self) -> SceneVariant {
        SceneVariant::for_title(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub duration: String,
    pub score: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub title: String,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Self-assessed proficiency, 0-100.
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    pub description: String,
}

impl Portfolio {
    /// The portfolio bundled with the binary.
    pub fn embedded() -> Result<Self, PortfolioError> {
        Self::from_json(EMBEDDED_PORTFOLIO, "<embedded>")
    }

    pub fn from_path(path: &Path) -> Result<Self, PortfolioError> {
        debug!("Loading portfolio from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|source| PortfolioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, &path.display().to_string())
    }

    pub fn from_json(raw: &str, origin: &str) -> Result<Self, PortfolioError> {
        let portfolio: Portfolio =
            serde_json::from_str(raw).map_err(|source| PortfolioError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        portfolio.validate()?;
        Ok(portfolio)
    }

    pub fn validate(&self) -> Result<(), PortfolioError> {
        if self.profile.name.trim().is_empty() {
            return Err(PortfolioError::Invalid("profile name is empty".to_string()));
        }

        if let Some(index) = self.projects.iter().position(|p| p.title.trim().is_empty()) {
            return Err(PortfolioError::Invalid(format!(
                "project #{} has an empty title",
                index + 1
            )));
        }

        Ok(())
    }
}
