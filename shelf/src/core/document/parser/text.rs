use super::ParseConfig;
use crate::error::ShelfError;
use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parses anything readable as text. Text elements are lines.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextParser {
    config: ParseConfig,
}

impl TextParser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl TextParser {
    /// Invalid UTF-8 sequences are replaced instead of failing the whole document.
    pub fn parse(&self, input: &[u8]) -> Result<String, ShelfError> {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        let text = String::from_utf8_lossy(input);

        if self.config.is_noop() {
            return Ok(text.to_string());
        }

        let lines = self
            .config
            .select(text.lines().collect())
            .into_iter()
            .filter(|line| !self.config.is_filtered(line))
            .collect::<Vec<_>>();

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text() {
        let parser = TextParser::default();
        assert_eq!("Hello\n\nworld", parser.parse(b"Hello\n\nworld").unwrap());
    }

    #[test]
    fn strips_bom_and_replaces_invalid() {
        let parser = TextParser::default();
        let input = [UTF8_BOM, b"caf", &[0xE9], b"!"].concat();
        assert_eq!("caf\u{FFFD}!", parser.parse(&input).unwrap());
    }

    #[test]
    fn applies_config_to_lines() {
        let config = ParseConfig::new(1, 1).with_filter("^#").unwrap();
        let parser = TextParser::new(config);
        let input = b"title\n# comment\nkeep me\nalso me\nfooter";
        assert_eq!("keep me\nalso me\n", parser.parse(input).unwrap());
    }
}
