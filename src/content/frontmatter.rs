//! Front-matter parsing for importable markdown files

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Front-matter of an article or bureau source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    /// Article title
    pub title: Option<String>,
    /// Bureau display name
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Articles stay drafts unless this is set
    pub published: bool,
    /// Slug of the bureau an article belongs to
    pub bureau: Option<String>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if let Some(rest) = content.strip_prefix(";;;") {
            return Self::parse_json(rest);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str)> {
        let rest = &content[3..];
        let rest = rest.trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A thematic break followed by prose is markdown, not front-matter
        if !yaml_content.lines().any(looks_like_yaml_key) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((fm, remaining))
    }

    fn parse_json(rest: &str) -> Result<(Self, &str)> {
        let end_pos = rest
            .find(";;;")
            .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
        let fm: FrontMatter = serde_json::from_str(&rest[..end_pos])
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
        let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
        Ok((fm, remaining))
    }
}

/// `key: value` or `key:` with a plain identifier key
fn looks_like_yaml_key(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }
    let Some(colon_pos) = trimmed.find(':') else {
        return false;
    };
    let key = &trimmed[..colon_pos];
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp");
    let after_colon = &trimmed[colon_pos + 1..];
    is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
}
