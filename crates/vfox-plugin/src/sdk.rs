//! SDK domain types produced by plugin hooks.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Environment variables an SDK version needs, by name.
pub type Envs = BTreeMap<String, String>;

/// An SDK version string, as the plugin spells it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash algorithm of a [`Checksum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    Sha256,
    Md5,
    Sha1,
    Sha512,
    /// No integrity metadata was provided.
    None,
}

impl ChecksumKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumKind::Sha256 => "sha256",
            ChecksumKind::Md5 => "md5",
            ChecksumKind::Sha1 => "sha1",
            ChecksumKind::Sha512 => "sha512",
            ChecksumKind::None => "none",
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integrity metadata for a downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub kind: ChecksumKind,
    pub value: String,
}

impl Checksum {
    pub fn new(kind: ChecksumKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The "no checksum" sentinel.
    pub fn none() -> Self {
        Self {
            kind: ChecksumKind::None,
            value: String::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == ChecksumKind::None
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::none()
    }
}

/// One installable artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub name: String,
    pub version: Version,
    /// Download URL or install location, depending on the hook.
    pub path: String,
    pub note: String,
    pub checksum: Checksum,
}

impl Info {
    /// The name under which this artifact is shown, e.g. `java@21`.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// An installable unit: the SDK itself plus the files shipped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    pub main: Info,
    pub additions: Vec<Info>,
}

/// Where a `use` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UseScope {
    Global,
    Project,
    Session,
}

impl UseScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseScope::Global => "global",
            UseScope::Project => "project",
            UseScope::Session => "session",
        }
    }
}

impl fmt::Display for UseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
