//! Artifact references
//!
//! Text form: `namespace/artifact_name:qualifier`. The namespace may itself
//! contain `/` (e.g. `entity/project`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ContractError;

/// Selects which version of an artifact a reference points to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionQualifier {
    Latest,
    Reference,
    Prod,
    /// Explicit version tag such as `v3`
    Tag(String),
}

impl VersionQualifier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => "latest",
            Self::Reference => "reference",
            Self::Prod => "prod",
            Self::Tag(tag) => tag,
        }
    }
}

impl fmt::Display for VersionQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionQualifier {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ContractError::invalid_reference(s, "empty version qualifier")),
            "latest" => Ok(Self::Latest),
            "reference" => Ok(Self::Reference),
            "prod" => Ok(Self::Prod),
            tag => Ok(Self::Tag(tag.to_string())),
        }
    }
}

/// Concrete, versioned artifact identifier handed verbatim to a stage.
///
/// Constructing one never touches the artifact store; existence is only
/// checked by the stage that fetches it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    pub namespace: String,
    pub name: String,
    pub qualifier: VersionQualifier,
}

impl ArtifactReference {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        qualifier: VersionQualifier,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            qualifier,
        }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}:{}", self.name, self.qualifier)
        } else {
            write!(f, "{}/{}:{}", self.namespace, self.name, self.qualifier)
        }
    }
}

impl FromStr for ArtifactReference {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, qualifier) = s
            .rsplit_once(':')
            .ok_or_else(|| ContractError::invalid_reference(s, "missing ':<qualifier>'"))?;
        let qualifier = qualifier
            .parse()
            .map_err(|_| ContractError::invalid_reference(s, "empty version qualifier"))?;

        let (namespace, name) = match path.rsplit_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => ("", path),
        };
        if name.is_empty() {
            return Err(ContractError::invalid_reference(s, "empty artifact name"));
        }

        Ok(Self::new(namespace, name, qualifier))
    }
}

impl Serialize for ArtifactReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtifactReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
