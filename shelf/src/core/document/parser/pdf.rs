use super::ParseConfig;
use crate::{error::ShelfError, map_err};
use pdfium_render::prelude::Pdfium;
use serde::{Deserialize, Serialize};
use std::{fmt::Write, time::Instant};
use tracing::debug;

/// Parses PDFs using the pdfium library. Text elements are pages, filters
/// are applied to individual lines.
///
/// The library is looked up in the working directory first, then in the
/// system library paths.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PdfParser {
    config: ParseConfig,
}

impl PdfParser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl PdfParser {
    pub fn parse(&self, input: &[u8]) -> Result<String, ShelfError> {
        let start = Instant::now();

        let bindings = map_err!(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
        );
        let pdfium = Pdfium::new(bindings);

        let document = map_err!(pdfium.load_pdf_from_byte_slice(input, None));

        let mut pages = vec![];
        for page in document.pages().iter() {
            let text = map_err!(page.text()).all();
            pages.push(text);
        }

        let mut out = String::new();

        for page in self.config.select(pages) {
            let mut page_out = String::new();

            for line in page.lines() {
                if self.config.is_filtered(line.trim()) {
                    continue;
                }
                map_err!(writeln!(page_out, "{line}"));
            }

            // Pages without text are skipped entirely
            if page_out.trim().is_empty() {
                continue;
            }

            map_err!(writeln!(out, "{}", page_out.trim_end()));
        }

        debug!(
            "Finished processing PDF, took {}ms",
            Instant::now().duration_since(start).as_millis()
        );

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_is_an_error() {
        // Fails on binding when pdfium is missing, on loading otherwise
        assert!(PdfParser::default().parse(b"not a pdf").is_err());
    }

    #[test]
    fn configured_invalid_pdf_is_an_error() {
        let parser = PdfParser::new(ParseConfig::new(1, 0));
        assert!(parser.parse(&[]).is_err());
    }
}
