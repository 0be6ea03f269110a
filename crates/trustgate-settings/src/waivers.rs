use anyhow::Context;
use trustgate_types::{Waiver, WaiverFile};

/// Parse the waiver file. An empty document means no waivers.
pub fn parse_waivers_yaml(input: &str) -> anyhow::Result<Vec<Waiver>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: WaiverFile = serde_yaml::from_str(input).context("parse waiver file")?;
    for (i, w) in file.waivers.iter().enumerate() {
        if w.rule_id.trim().is_empty() {
            anyhow::bail!("waiver #{} has an empty ruleId", i + 1);
        }
    }
    Ok(file.waivers)
}
