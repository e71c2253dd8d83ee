use std::fmt;

/// 3D scene shown on a project card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneVariant {
    Network,
    Brain,
    Scales,
    Journal,
    Garden,
    Orb,
}

const VARIANTS: &[(&str, SceneVariant)] = &[
    ("Echo", SceneVariant::Network),
    ("QueryVerse", SceneVariant::Brain),
    ("LegalMind", SceneVariant::Scales),
    ("DearDiary", SceneVariant::Journal),
    ("Herbiverse", SceneVariant::Garden),
];

impl SceneVariant {
    /// Looks up the scene for a project title, falling back to [`SceneVariant::Orb`].
    pub fn for_title(title: &str) -> Self {
        VARIANTS
            .iter()
            .find(|(name, _)| *name == title)
            .map(|(_, variant)| *variant)
            .unwrap_or(SceneVariant::Orb)
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneVariant::Network => "network",
            SceneVariant::Brain => "brain",
            SceneVariant::Scales => "scales",
            SceneVariant::Journal => "journal",
            SceneVariant::Garden => "garden",
            SceneVariant::Orb => "orb",
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
