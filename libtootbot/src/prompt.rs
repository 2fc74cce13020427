//! Static instruction text fed to the completion service

use std::path::Path;

use crate::error::{PromptError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSource {
    text: String,
}

impl PromptSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read the prompt file as UTF-8
    ///
    /// A file with nothing but whitespace is rejected.
    pub fn from_path(path: impl AsRef<Path>, normalize_whitespace: bool) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| PromptError::Read {
            path: display.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Err(PromptError::Empty(display).into());
        }

        let text = if normalize_whitespace {
            normalize(&raw)
        } else {
            raw
        };

        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Replace each run of line breaks with a single space and trim the ends
pub fn normalize(raw: &str) -> String {
    raw.split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TootbotError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn prompt_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_from_path_reads_verbatim() {
        let file = prompt_file("Écris un pouet.\nSois bref.\n");
        let prompt = PromptSource::from_path(file.path(), false).unwrap();
        assert_eq!(prompt.as_str(), "Écris un pouet.\nSois bref.\n");
    }

    #[test]
    fn test_from_path_normalizes_newlines() {
        let file = prompt_file("Line one\n\nLine two\r\nLine three\n");
        let prompt = PromptSource::from_path(file.path(), true).unwrap();
        assert_eq!(prompt.as_str(), "Line one Line two Line three");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = PromptSource::from_path("/nonexistent/prompt.txt", false);
        match result {
            Err(TootbotError::Prompt(PromptError::Read { path, .. })) => {
                assert!(path.contains("prompt.txt"));
            }
            other => panic!("Expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_path_blank_file() {
        let file = prompt_file("  \n\t\n");
        let result = PromptSource::from_path(file.path(), false);
        assert!(matches!(
            result,
            Err(TootbotError::Prompt(PromptError::Empty(_)))
        ));
    }

    #[test]
    fn test_normalize_single_line_unchanged() {
        assert_eq!(normalize("Write one sentence."), "Write one sentence.");
    }
}
