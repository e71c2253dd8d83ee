use std::fmt;

use serde::Serialize;

use super::{Achievement, Education, Portfolio, Profile, SkillCategory};

/// Serialized snapshot of the portfolio used to ground the assistant.
///
/// Built once from a [`Portfolio`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioContext {
    subject: String,
    serialized: String,
}

// Field order here is the key order of the serialized document.
#[derive(Serialize)]
struct ContextDocument<'a> {
    profile: &'a Profile,
    projects: Vec<ProjectSummary<'a>>,
    skills: &'a [SkillCategory],
    education: &'a [Education],
    achievements: &'a [Achievement],
    certifications: &'a [String],
}

#[derive(Serialize)]
struct ProjectSummary<'a> {
    title: &'a str,
    description: &'a str,
    tech: &'a [String],
    #[serde(rename = "type")]
    kind: &'a str,
}

impl PortfolioContext {
    pub fn build(portfolio: &Portfolio) -> Self {
        let document = ContextDocument {
            profile: &portfolio.profile,
            projects: portfolio
                .projects
                .iter()
                .map(|p| ProjectSummary {
                    title: &p.title,
                    description: &p.description,
                    tech: &p.tech_stack,
                    kind: &p.kind,
                })
                .collect(),
            skills: &portfolio.skill_categories,
            education: &portfolio.education,
            achievements: &portfolio.achievements,
            certifications: &portfolio.certifications,
        };

        // Only plain strings, numbers and sequences reach the serializer.
        let serialized = serde_json::to_string_pretty(&document).unwrap_or_default();

        Self {
            subject: portfolio.profile.name.clone(),
            serialized,
        }
    }

    /// Name of the person the portfolio describes.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn as_str(&self) -> &str {
        &self.serialized
    }
}

impl fmt::Display for PortfolioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}
