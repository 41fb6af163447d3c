// ABOUTME: Static adapter table for compile-time-known variant selection.
// ABOUTME: Descriptors declare build features; construct fails with the missing set.

use crate::adapters::echo::EchoAdapter;
use crate::adapters::passthrough::PassthroughAdapter;
use crate::traits::Adapter;

/// Errors from adapter lookup and construction.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("unknown adapter '{name}' (available: {known})")]
    Unknown { name: String, known: String },

    #[error("adapter '{adapter}' requires build features that are not enabled: {}", missing.join(", "))]
    MissingDependencies {
        adapter: String,
        missing: Vec<String>,
    },

    #[error("required environment variable '{var}' is not set")]
    MissingEnv { var: String },
}

/// Configuration passed to an adapter factory.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    /// Model override (adapters with no model ignore it)
    pub model: Option<String>,
    /// Passthrough output as plain text instead of JSON lines
    pub plain_output: bool,
}

/// Compile-time description of one adapter variant.
#[derive(Debug, Clone, Copy)]
pub struct AdapterDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Cargo features that must be compiled in for this variant
    pub required_features: &'static [&'static str],
    pub default_model: Option<&'static str>,
    /// Environment variables the adapter reads at construction
    pub required_env: &'static [&'static str],
}

impl AdapterDescriptor {
    /// Whether the variant is compiled into this binary
    pub fn available(&self) -> bool {
        self.missing_features().is_empty()
    }

    /// Required features absent from this build, in declaration order
    pub fn missing_features(&self) -> Vec<String> {
        self.required_features
            .iter()
            .filter(|f| !feature_compiled(f))
            .map(|f| f.to_string())
            .collect()
    }
}

// Declaration order is the display order; passthrough stays first.
const DESCRIPTORS: &[AdapterDescriptor] = &[
    AdapterDescriptor {
        name: "passthrough",
        description: "Output messages to stdout without LLM processing",
        required_features: &[],
        default_model: None,
        required_env: &[],
    },
    AdapterDescriptor {
        name: "echo",
        description: "Reply to every message with its own text",
        required_features: &[],
        default_model: None,
        required_env: &[],
    },
    AdapterDescriptor {
        name: "anthropic",
        description: "Forward messages to the Anthropic messages API",
        required_features: &["anthropic"],
        default_model: Some("claude-sonnet-4-5"),
        required_env: &["ANTHROPIC_API_KEY"],
    },
];

fn feature_compiled(feature: &str) -> bool {
    match feature {
        "anthropic" => cfg!(feature = "anthropic"),
        _ => false,
    }
}

/// All adapter descriptors in declaration order.
pub fn descriptors() -> &'static [AdapterDescriptor] {
    DESCRIPTORS
}

/// Look up a descriptor by name.
pub fn get(name: &str) -> Result<&'static AdapterDescriptor, AdapterError> {
    DESCRIPTORS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| AdapterError::Unknown {
            name: name.to_string(),
            known: DESCRIPTORS
                .iter()
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Construct an adapter by name.
///
/// Fails with [`AdapterError::MissingDependencies`] listing exactly the
/// build features absent from this binary. Probing is a cfg check with
/// no side effects.
pub fn construct(name: &str, config: &AdapterConfig) -> Result<Box<dyn Adapter>, AdapterError> {
    let desc = get(name)?;
    let missing = desc.missing_features();
    if !missing.is_empty() {
        return Err(AdapterError::MissingDependencies {
            adapter: desc.name.to_string(),
            missing,
        });
    }

    match desc.name {
        "passthrough" => Ok(Box::new(PassthroughAdapter::new(config.plain_output))),
        "echo" => Ok(Box::new(EchoAdapter::new())),
        #[cfg(feature = "anthropic")]
        "anthropic" => {
            use crate::adapters::anthropic::AnthropicAdapter;
            let model = config
                .model
                .clone()
                .or_else(|| desc.default_model.map(str::to_string))
                .unwrap_or_default();
            Ok(Box::new(AnthropicAdapter::from_env(model)?))
        }
        other => Err(AdapterError::Unknown {
            name: other.to_string(),
            known: DESCRIPTORS
                .iter()
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_passthrough_first() {
        let names: Vec<&str> = descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names[0], "passthrough");
        assert!(names.contains(&"echo"));
        assert!(names.contains(&"anthropic"));
    }

    #[test]
    fn test_passthrough_always_available() {
        let desc = get("passthrough").unwrap();
        assert!(desc.available());
        assert!(desc.missing_features().is_empty());
    }

    #[test]
    fn test_get_unknown_adapter_lists_known() {
        let err = get("nonexistent").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nonexistent"));
        assert!(msg.contains("passthrough"));
    }

    #[test]
    fn test_construct_passthrough_succeeds() {
        let adapter = construct("passthrough", &AdapterConfig::default()).unwrap();
        assert_eq!(adapter.name(), "passthrough");
    }

    #[cfg(not(feature = "anthropic"))]
    #[test]
    fn test_construct_anthropic_without_feature_lists_missing() {
        let err = construct("anthropic", &AdapterConfig::default()).unwrap_err();
        match err {
            AdapterError::MissingDependencies { adapter, missing } => {
                assert_eq!(adapter, "anthropic");
                assert_eq!(missing, vec!["anthropic".to_string()]);
            }
            other => panic!("Expected MissingDependencies, got {:?}", other),
        }
    }

    #[test]
    fn test_availability_matches_build_features() {
        let desc = get("anthropic").unwrap();
        assert_eq!(desc.available(), cfg!(feature = "anthropic"));
    }
}
