//! Table formatting utilities for CLI output.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use comfy_table::{presets, ContentArrangement, Table};
use fuzzy_interp::{
    EngineError, HierarchicalRuleNode, InterpretationResult, InterpretationTree, Property,
    PropertyValue,
};

use crate::output::{format_rating, paint_class};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Index the nodes of a rule tree by key.
pub fn node_labels(tree: &[HierarchicalRuleNode]) -> HashMap<&str, &HierarchicalRuleNode> {
    let mut labels = HashMap::new();
    for root in tree {
        root.walk(&mut |node| {
            labels.insert(node.key.as_str(), node);
        });
    }
    labels
}

/// Per-node ratings, in key order.
///
/// Nodes expanded from a sub-rule are keyed `<leaf>/<node>` and shown
/// without a name.
pub fn format_node_table(
    result: &InterpretationResult,
    labels: &HashMap<&str, &HierarchicalRuleNode>,
) -> Table {
    let mut table = new_table(vec!["Node", "Name", "Kind", "Rating"]);

    for (key, rating) in &result.evaluation_results {
        let (name, kind) = match labels.get(key.as_str()) {
            Some(node) => (
                format!("{}{}", "  ".repeat(node.depth), node.name),
                node.kind_name(),
            ),
            None => (String::new(), "sub-rule"),
        };
        table.add_row(vec![key.clone(), name, kind.to_string(), format_rating(*rating)]);
    }

    table
}

/// The property values an evaluation consumed.
pub fn format_property_table(values: &BTreeMap<String, PropertyValue>) -> Table {
    let mut table = new_table(vec!["Property", "Value"]);
    for (name, value) in values {
        table.add_row(vec![name.clone(), value.to_string()]);
    }
    table
}

/// One record of a batch run.
pub struct BatchRow<'a> {
    pub index: usize,
    pub result: &'a Result<Arc<InterpretationResult>, EngineError>,
}

/// Batch results, one row per record.
pub fn format_batch_table(rows: &[BatchRow<'_>]) -> Table {
    let mut table = new_table(vec!["#", "Rating", "Class", "Error"]);
    for row in rows {
        let cells = match row.result {
            Ok(result) => vec![
                row.index.to_string(),
                format_rating(result.rating),
                paint_class(result.rating_class),
                String::new(),
            ],
            Err(e) => vec![
                row.index.to_string(),
                String::new(),
                String::new(),
                e.to_string(),
            ],
        };
        table.add_row(cells);
    }
    table
}

/// All interpretations of a catalog.
pub fn format_interpretation_table<'a>(
    trees: impl Iterator<Item = &'a InterpretationTree>,
) -> Table {
    let mut table = new_table(vec!["Interpretation", "Id", "Nodes", "Properties"]);
    for tree in trees {
        let mut nodes = 0;
        for root in &tree.root {
            root.walk(&mut |_| nodes += 1);
        }
        table.add_row(vec![
            tree.name.clone(),
            format!("{:016x}", tree.interpretation_id.as_u64()),
            nodes.to_string(),
            tree.required_properties.len().to_string(),
        ]);
    }
    table
}

/// Properties an interpretation reads.
pub fn format_required_table(properties: &[Property]) -> Table {
    let mut table = new_table(vec!["Property", "Id", "Unit", "Modifier"]);
    for property in properties {
        table.add_row(vec![
            property.name.clone(),
            property.id.clone(),
            property.unit_of_measure.clone().unwrap_or_default(),
            property.modifier.clone(),
        ]);
    }
    table
}
