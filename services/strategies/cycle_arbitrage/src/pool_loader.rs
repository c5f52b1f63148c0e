use anyhow::{Context, Result};
use pool_graph::PoolUpdate;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load initial pool states from a JSON array of `PoolUpdate`
pub fn load_pool_updates(path: &Path) -> Result<Vec<PoolUpdate>> {
    info!("📂 Loading pool states from {:?}", path);

    let json_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool file {}", path.display()))?;
    let updates: Vec<PoolUpdate> = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to parse pool file {}", path.display()))?;

    info!("Found {} pool states", updates.len());
    Ok(updates)
}

/// Parse one newline-delimited update; blank lines yield `None`
pub fn parse_update_line(line: &str) -> Result<Option<PoolUpdate>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let update = serde_json::from_str(line).context("Failed to parse pool update")?;
    Ok(Some(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::CurveState;
    use std::io::Write;

    const LINE: &str = r#"{"pool_id":"A","assets":[{"id":"ETH","decimals":18},{"id":"USDC","decimals":6}],"fee":3000,"curve":{"constant_product":{"reserve0":100000,"reserve1":200000}},"timestamp":7}"#;

    #[test]
    fn test_parse_line() {
        let update = parse_update_line(LINE).unwrap().unwrap();
        assert_eq!(update.pool_id.as_str(), "A");
        assert_eq!(update.timestamp, 7);
        assert!(matches!(update.curve, CurveState::ConstantProduct(_)));
        assert!(parse_update_line("   ").unwrap().is_none());
        assert!(parse_update_line("{not json").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{}, {}]", LINE, LINE.replace(r#""A""#, r#""B""#)).unwrap();
        let updates = load_pool_updates(file.path()).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].pool_id.as_str(), "B");
    }
}
