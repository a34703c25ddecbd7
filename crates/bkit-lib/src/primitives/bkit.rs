use serde::{Deserialize, Serialize};
use std::fmt;

/// The two pack flavours an add-on project is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    /// Game logic, data and (optionally) a script module
    Behavior,
    /// Textures, models, sounds
    Resource,
}

impl PackKind {
    pub const ALL: [PackKind; 2] = [PackKind::Behavior, PackKind::Resource];

    /// Manifest module type generated for this kind of pack
    pub fn module_type(&self) -> ModuleType {
        match self {
            PackKind::Behavior => ModuleType::Data,
            PackKind::Resource => ModuleType::Resources,
        }
    }

    /// Fixed directory name inside the combined `.mcaddon` archive
    pub fn archive_dir(&self) -> &'static str {
        match self {
            PackKind::Behavior => "behavior_pack",
            PackKind::Resource => "resource_pack",
        }
    }

    /// Convention subdirectory under a game installation root
    pub fn development_dir(&self) -> &'static str {
        match self {
            PackKind::Behavior => "development_behavior_packs",
            PackKind::Resource => "development_resource_packs",
        }
    }

    pub fn other(&self) -> PackKind {
        match self {
            PackKind::Behavior => PackKind::Resource,
            PackKind::Resource => PackKind::Behavior,
        }
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackKind::Behavior => write!(f, "behavior"),
            PackKind::Resource => write!(f, "resource"),
        }
    }
}

/// Manifest module types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Data,
    Resources,
    Script,
}

/// Game products a convention-based sync target can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    BedrockUWP,
    PreviewUWP,
    BedrockGDK,
    PreviewGDK,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::BedrockUWP,
        Product::PreviewUWP,
        Product::BedrockGDK,
        Product::PreviewGDK,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::BedrockUWP => "BedrockUWP",
            Product::PreviewUWP => "PreviewUWP",
            Product::BedrockGDK => "BedrockGDK",
            Product::PreviewGDK => "PreviewGDK",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Invalid product '{}' (expected one of: {})",
                    s,
                    Product::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

/// Source language of a pack's script module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    Javascript,
    Typescript,
}

impl ScriptLanguage {
    /// Whether sources must go through the bundler before the game can load them
    pub fn requires_compilation(&self) -> bool {
        matches!(self, ScriptLanguage::Typescript)
    }

    /// Extension of authored entry files
    pub fn source_extension(&self) -> &'static str {
        match self {
            ScriptLanguage::Javascript => "js",
            ScriptLanguage::Typescript => "ts",
        }
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLanguage::Javascript => write!(f, "javascript"),
            ScriptLanguage::Typescript => write!(f, "typescript"),
        }
    }
}

/// Semantic version bump levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
}

impl std::str::FromStr for BumpLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(BumpLevel::Major),
            "minor" => Ok(BumpLevel::Minor),
            "patch" => Ok(BumpLevel::Patch),
            _ => Err(format!("Invalid bump level: {}", s)),
        }
    }
}

/// `[major, minor, patch]` as written in manifests
///
/// Ordering is lexicographic over the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTuple(pub [u32; 3]);

impl VersionTuple {
    pub const INITIAL: VersionTuple = VersionTuple([1, 0, 0]);
    pub const DEFAULT_MIN_ENGINE: VersionTuple = VersionTuple([1, 21, 2]);

    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self([major, minor, patch])
    }

    pub fn major(&self) -> u32 {
        self.0[0]
    }

    pub fn minor(&self) -> u32 {
        self.0[1]
    }

    pub fn patch(&self) -> u32 {
        self.0[2]
    }

    /// Apply a semantic bump; subordinate components reset to zero
    pub fn bump(&self, level: BumpLevel) -> Self {
        let [major, minor, patch] = self.0;
        match level {
            BumpLevel::Major => Self([major + 1, 0, 0]),
            BumpLevel::Minor => Self([major, minor + 1, 0]),
            BumpLevel::Patch => Self([major, minor, patch + 1]),
        }
    }

    /// Parse `"x.y.z"` (semver syntax, pre-release and build metadata dropped)
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let trimmed = text.trim().trim_start_matches('v');
        let version = semver::Version::parse(trimmed).map_err(|e| VersionParseError {
            input: text.to_string(),
            reason: e.to_string(),
        })?;

        let component = |value: u64| {
            u32::try_from(value).map_err(|_| VersionParseError {
                input: text.to_string(),
                reason: "component out of range".to_string(),
            })
        };

        Ok(Self([
            component(version.major)?,
            component(version.minor)?,
            component(version.patch)?,
        ]))
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

impl std::str::FromStr for VersionTuple {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A version string that is not `major.minor.patch`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid version '{input}': {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}
