//! Artifact reference resolution

use contracts::{ArtifactReference, InputBinding};

/// Turns a stage's declared inputs into concrete artifact references.
///
/// Resolution is a pure function of the namespace and the binding; the
/// artifact store is never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResolver {
    namespace: String,
}

impl ArtifactResolver {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn resolve(&self, binding: &InputBinding) -> ArtifactReference {
        ArtifactReference::new(
            self.namespace.clone(),
            binding.artifact,
            binding.qualifier.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Stage, VersionQualifier};

    #[test]
    fn test_resolves_declared_inputs() {
        let resolver = ArtifactResolver::new("nyc_airbnb");
        let inputs = Stage::DataCheck.definition().inputs;

        let csv = resolver.resolve(&inputs[0]);
        assert_eq!(csv.to_string(), "nyc_airbnb/clean_sample.csv:latest");

        let reference = resolver.resolve(&inputs[1]);
        assert_eq!(reference.qualifier, VersionQualifier::Reference);
        assert_eq!(reference.to_string(), "nyc_airbnb/clean_sample.csv:reference");
    }

    #[test]
    fn test_prod_model() {
        let resolver = ArtifactResolver::new("team/nyc_airbnb");
        let model = resolver.resolve(&Stage::TestRegressionModel.definition().inputs[0]);
        assert_eq!(model.to_string(), "team/nyc_airbnb/random_forest_export:prod");
    }

    #[test]
    fn test_idempotent() {
        let resolver = ArtifactResolver::new("nyc_airbnb");
        let binding = &Stage::BasicCleaning.definition().inputs[0];
        assert_eq!(resolver.resolve(binding), resolver.resolve(binding));
    }
}
