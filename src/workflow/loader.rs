use anyhow::{Result, Context as AnyhowContext};
use std::fs;
use crate::workflow::{WorkflowConfig, WorkflowDocument};

pub fn load_config_from_json(file_path: &str) -> Result<WorkflowConfig> {
    let json_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read config file from {}", file_path))?;

    let document: WorkflowDocument = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to deserialize workflow document from {}", file_path))?;

    Ok(document.workflow)
}

pub fn write_config_to_json(file_path: &str, config: &WorkflowConfig) -> Result<()> {
    let document = config.clone().into_document();
    let json_content = serde_json::to_string_pretty(&document)?;

    fs::write(file_path, json_content)
        .with_context(|| format!("Failed to write config file to {}", file_path))?;

    Ok(())
}
