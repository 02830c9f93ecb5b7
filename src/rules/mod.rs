//! Declarative conversion rule sets.
//!
//! A rule set is data, not code: per provider, an ordered list of
//! `{sourcePath, destinationPath, customiser?}` entries plus optional
//! whole-payload post-processing customisers. The crate embeds its default
//! table; callers may supply their own. Loading is fail-fast — a rule naming
//! an unregistered customiser is rejected at deserialization time, before
//! any message is built.

use std::collections::HashMap;

use serde::Deserialize;

use crate::customise::{Customiser, PostCustomiser};
use crate::errors::{MailerError, MailerResult};
use crate::transport::Provider;

/// The embedded default rule table.
const EMBEDDED_RULES: &str = include_str!("rules.json");

/// A single field-mapping rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Rule {
    /// Dotted path read from the canonical message.
    pub source_path: String,
    /// Dotted path written into the provider payload.
    pub destination_path: String,
    /// Optional reshaping customiser.
    #[serde(default)]
    pub customiser: Option<Customiser>,
}

/// A whole-payload post-processing rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRule {
    /// The post customiser to apply.
    pub customiser: PostCustomiser,
}

/// Ordered rules for one provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderRules {
    /// Per-field mapping rules, applied in order.
    #[serde(default)]
    pub prerules: Vec<Rule>,
    /// Whole-payload rules, applied in order after the prerules.
    #[serde(default)]
    pub postrules: Vec<PostRule>,
}

/// Provider-keyed conversion rule table.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    providers: HashMap<String, ProviderRules>,
}

impl RuleSet {
    /// Loads the embedded default rule table.
    pub fn embedded() -> MailerResult<Self> {
        Self::from_json(EMBEDDED_RULES)
    }

    /// Parses and validates a rule table from JSON.
    pub fn from_json(json: &str) -> MailerResult<Self> {
        let rule_set: Self = serde_json::from_str(json)
            .map_err(|error| MailerError::rule_set("cannot parse rule set").with_cause(error))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Returns the rules registered for a provider, if any.
    pub fn for_provider(&self, provider: Provider) -> Option<&ProviderRules> {
        self.providers.get(provider.key())
    }

    /// Validates every rule's paths.
    ///
    /// Customiser names are already resolved against the registries during
    /// deserialization; this guards the remaining shape constraints.
    fn validate(&self) -> MailerResult<()> {
        for (provider, rules) in &self.providers {
            for rule in &rules.prerules {
                if rule.source_path.is_empty() || rule.destination_path.is_empty() {
                    return Err(MailerError::rule_set(format!(
                        "provider [{provider}] has a rule with an empty path"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_rules_load() {
        let rules = RuleSet::embedded().unwrap();

        let mandrill = rules.for_provider(Provider::Mandrill).unwrap();
        assert!(!mandrill.prerules.is_empty());
        assert!(mandrill.postrules.is_empty());

        let mailjet = rules.for_provider(Provider::Mailjet).unwrap();
        assert!(!mailjet.prerules.is_empty());
        assert_eq!(mailjet.postrules.len(), 1);

        // The pass-through provider has no rules by design.
        assert!(rules.for_provider(Provider::Smtp).is_none());
    }

    #[test]
    fn test_unknown_customiser_fails_fast() {
        let result = RuleSet::from_json(
            r#"{ "mandrill": { "prerules": [
                { "sourcePath": "to", "destinationPath": "to", "customiser": "doesNotExist" }
            ] } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_path_fails_fast() {
        let result = RuleSet::from_json(
            r#"{ "mandrill": { "prerules": [
                { "sourcePath": "", "destinationPath": "to" }
            ] } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mandrill_folds_recipients_into_to() {
        let rules = RuleSet::embedded().unwrap();
        let mandrill = rules.for_provider(Provider::Mandrill).unwrap();

        let to_targets: Vec<&str> = mandrill
            .prerules
            .iter()
            .filter(|rule| rule.destination_path == "to")
            .map(|rule| rule.source_path.as_str())
            .collect();
        assert_eq!(to_targets, vec!["to", "cc", "bcc"]);
    }
}
