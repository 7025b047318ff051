//! The validated catalog of properties, evaluations and interpretations.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interpreter::ConfigurationError;
use crate::interpreter::normalizer::normalize;
use crate::types::{
    Evaluation, EvaluationDefinition, InterpretationId, InterpretationTree, Property,
    RuleDefinition,
};

/// Raw catalog contents as produced by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogData {
    pub properties: Vec<Property>,
    pub evaluations: Vec<EvaluationDefinition>,
    pub rules: Vec<RuleDefinition>,
}

/// An immutable, validated catalog snapshot.
///
/// The catalog supports lookup of interpretations by both name and
/// [`InterpretationId`] hash, and of evaluations and properties by name or id.
/// Every reference in every tree resolves, and sub-rule references are free
/// of cycles.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Properties indexed by name, in catalog order.
    properties: IndexMap<String, Property>,
    /// Maps property id to property name.
    property_ids: HashMap<String, String>,
    /// Compiled evaluations indexed by name, in catalog order.
    evaluations: IndexMap<String, Evaluation>,
    /// Maps evaluation id to evaluation name.
    evaluation_ids: HashMap<String, String>,
    /// Interpretation trees indexed by name, in catalog order.
    interpretations: IndexMap<String, InterpretationTree>,
    /// Maps InterpretationId hash to interpretation name for id-based lookup.
    id_to_name: HashMap<u64, String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

impl Catalog {
    /// Validate raw catalog data and compile it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if:
    /// - Two properties, evaluations or rules share a name
    /// - An evaluation's curve or crisp expression is invalid
    /// - An evaluation names an unknown property
    /// - A rule fails to normalize or references something unknown
    /// - Interpretations reference each other in a cycle
    pub fn build(data: CatalogData) -> Result<Self, ConfigurationError> {
        let mut catalog = Catalog::default();

        for property in data.properties {
            if catalog.properties.contains_key(&property.name) {
                return Err(duplicate("property", &property.name));
            }
            catalog
                .property_ids
                .insert(property.id.clone(), property.name.clone());
            catalog.properties.insert(property.name.clone(), property);
        }

        for definition in &data.evaluations {
            let evaluation = Evaluation::from_definition(definition)?;
            if catalog.evaluations.contains_key(&evaluation.name) {
                return Err(duplicate("evaluation", &evaluation.name));
            }
            if catalog.property(&evaluation.property_name).is_none() {
                return Err(ConfigurationError::UnresolvedReference {
                    owner: evaluation.name.clone(),
                    reference: evaluation.property_name.clone(),
                });
            }
            catalog
                .evaluation_ids
                .insert(evaluation.id.clone(), evaluation.name.clone());
            catalog
                .evaluations
                .insert(evaluation.name.clone(), evaluation);
        }

        for rule in data.rules {
            let root = normalize(&rule.name, &rule.nodes)?;
            catalog.insert_tree(InterpretationTree {
                interpretation_id: InterpretationId::from_name(&rule.name),
                id: rule.id,
                name: rule.name,
                root,
                required_properties: Vec::new(),
            })?;
        }

        catalog.check_references()?;
        catalog.check_cycles()?;

        let required: Vec<Vec<Property>> = catalog
            .interpretations
            .keys()
            .map(|name| catalog.collect_properties(name))
            .collect();
        for (tree, properties) in catalog.interpretations.values_mut().zip(required) {
            tree.required_properties = properties;
        }

        debug!(
            properties = catalog.properties.len(),
            evaluations = catalog.evaluations.len(),
            interpretations = catalog.interpretations.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    /// Insert a tree, checking for duplicate names and id hash collisions.
    fn insert_tree(&mut self, tree: InterpretationTree) -> Result<(), ConfigurationError> {
        let name = tree.name.clone();
        if self.interpretations.contains_key(&name) {
            return Err(duplicate("rule", &name));
        }

        // Check for hash collision (different name but same hash)
        let hash = tree.interpretation_id.as_u64();
        if let Some(existing_name) = self.id_to_name.get(&hash) {
            return Err(duplicate(
                "interpretation id",
                &format!("{existing_name}' and '{name}"),
            ));
        }

        self.id_to_name.insert(hash, name.clone());
        self.interpretations.insert(name, tree);
        Ok(())
    }

    fn check_references(&self) -> Result<(), ConfigurationError> {
        for (name, tree) in &self.interpretations {
            if let Some(reference) = tree
                .leaf_refs()
                .into_iter()
                .find(|r| self.evaluation(r).is_none() && self.interpretation(r).is_none())
            {
                return Err(ConfigurationError::UnresolvedReference {
                    owner: name.clone(),
                    reference: reference.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Leaf references of `name` that expand another interpretation.
    fn sub_rules(&self, name: &str) -> Vec<&str> {
        self.interpretation(name)
            .map(|tree| {
                tree.leaf_refs()
                    .into_iter()
                    .filter(|r| self.evaluation(r).is_none() && self.interpretation(r).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_cycles(&self) -> Result<(), ConfigurationError> {
        let mut visits = HashMap::new();
        for name in self.interpretations.keys() {
            let mut path = Vec::new();
            self.visit(name, &mut visits, &mut path)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visits: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
    ) -> Result<(), ConfigurationError> {
        match visits.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::Active) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut chain: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
                chain.push(name.to_string());
                return Err(ConfigurationError::ReferenceCycle { chain });
            }
            None => {}
        }

        visits.insert(name, Visit::Active);
        path.push(name);
        for child in self.sub_rules(name) {
            self.visit(child, visits, path)?;
        }
        path.pop();
        visits.insert(name, Visit::Done);
        Ok(())
    }

    /// Properties consumed by `name` and its sub-rules, in evaluation order.
    fn collect_properties(&self, name: &str) -> Vec<Property> {
        let mut properties = Vec::new();
        let mut seen_rules = HashSet::new();
        self.collect_into(name, &mut seen_rules, &mut properties);
        properties
    }

    fn collect_into<'a>(
        &'a self,
        rule: &'a str,
        seen_rules: &mut HashSet<&'a str>,
        properties: &mut Vec<Property>,
    ) {
        if !seen_rules.insert(rule) {
            return;
        }
        let Some(tree) = self.interpretation(rule) else {
            return;
        };
        for reference in tree.leaf_refs() {
            match self.evaluation(reference) {
                Some(evaluation) => {
                    let unseen = self
                        .property(&evaluation.property_name)
                        .filter(|p| !properties.iter().any(|seen| seen.name == p.name));
                    if let Some(property) = unseen {
                        properties.push(property.clone());
                    }
                }
                None => self.collect_into(reference, seen_rules, properties),
            }
        }
    }

    /// Get an interpretation by name.
    pub fn interpretation(&self, name: &str) -> Option<&InterpretationTree> {
        self.interpretations.get(name)
    }

    /// Get an interpretation by InterpretationId hash.
    pub fn interpretation_by_id(&self, id: InterpretationId) -> Option<&InterpretationTree> {
        self.id_to_name
            .get(&id.as_u64())
            .and_then(|name| self.interpretations.get(name))
    }

    /// Get an evaluation by name, or by id.
    pub fn evaluation(&self, key: &str) -> Option<&Evaluation> {
        self.evaluations.get(key).or_else(|| {
            self.evaluation_ids
                .get(key)
                .and_then(|name| self.evaluations.get(name))
        })
    }

    /// Get a property by name, or by id.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key).or_else(|| {
            self.property_ids
                .get(key)
                .and_then(|name| self.properties.get(name))
        })
    }

    /// Interpretation names in catalog order.
    pub fn interpretation_names(&self) -> Vec<&str> {
        self.interpretations.keys().map(String::as_str).collect()
    }

    pub fn interpretations(&self) -> impl Iterator<Item = &InterpretationTree> {
        self.interpretations.values()
    }

    pub fn evaluations(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.values()
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Names a rule leaf may reference, for suggestions.
    pub fn reference_names(&self) -> Vec<&str> {
        self.evaluations
            .keys()
            .chain(self.interpretations.keys())
            .map(String::as_str)
            .collect()
    }
}

fn duplicate(kind: &'static str, name: &str) -> ConfigurationError {
    ConfigurationError::DuplicateName {
        kind,
        name: name.to_string(),
    }
}
