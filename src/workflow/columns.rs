use crate::workflow::WorkflowConfig;
use std::collections::HashSet;

/// A preprocessing column that is not part of the dataset schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnIssue {
    UnknownInputColumn(String),
    UnknownGroundtruthColumn(String),
}

/// Check the preprocessing selection against the dataset's columns.
///
/// These are data-entry problems for the editor to show, not errors.
/// An empty groundtruth column is not reported.
pub fn validate_columns(config: &WorkflowConfig, dataset_columns: &[String]) -> Vec<ColumnIssue> {
    let known: HashSet<&str> = dataset_columns.iter().map(String::as_str).collect();
    let input = &config.steps.preprocessing.input;

    let mut issues: Vec<ColumnIssue> = input
        .input_columns
        .iter()
        .filter(|c| !known.contains(c.as_str()))
        .map(|c| ColumnIssue::UnknownInputColumn(c.clone()))
        .collect();

    let groundtruth = &input.groundtruth_column;
    if !groundtruth.is_empty() && !known.contains(groundtruth.as_str()) {
        issues.push(ColumnIssue::UnknownGroundtruthColumn(groundtruth.clone()));
    }

    issues
}
