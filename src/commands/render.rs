//! Render a markdown file through the sanitizing renderer

use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::content::MarkdownRenderer;

/// Render `input`, or stdin when it is `-`
pub fn run(input: &Path) -> Result<()> {
    let markdown = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {:?}", input))?
    };
    println!("{}", MarkdownRenderer::new().render(&markdown));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("missing.md")).is_err());
    }

    #[test]
    fn test_render_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "# 見出し\n").unwrap();
        assert!(run(&path).is_ok());
    }
}
