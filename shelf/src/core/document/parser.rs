use crate::{core::document::DocumentType, error::ShelfError, map_err};
use docx::DocxParser;
use pdf::PdfParser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use text::TextParser;
use validify::{schema_err, schema_validation, Validate, ValidationErrors};

pub mod docx;
pub mod pdf;
pub mod text;

/// General parsing configuration for documents.
/// A text element is parser specific, it could be PDF pages,
/// DOCX paragraphs, lines of a text file, etc.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(Self::validate_schema)]
pub struct ParseConfig {
    /// Skip the first amount of text elements.
    pub start: usize,

    /// Skip the last amount of text elements.
    pub end: usize,

    /// If true, parsers should treat the (start)[Self::start]
    /// and (end)[Self::end] parameters as a 1-based inclusive range
    /// instead of just skipping the elements.
    pub range: bool,

    /// Filter specific patterns in text elements. Parser specific.
    #[serde(with = "serde_regex")]
    pub filters: Vec<Regex>,
}

impl ParseConfig {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Default::default()
        }
    }

    /// Set the parser to use a range of elements instead of just skipping.
    pub fn use_range(mut self) -> Self {
        self.range = true;
        self
    }

    /// Add a filter to the parser.
    /// Each text element (depending on the parser implementation)
    /// will be checked for the regex and will be omitted if it matches.
    ///
    /// * `re`: The expression to match for.
    pub fn with_filter(mut self, re: &str) -> Result<Self, ShelfError> {
        self.filters.push(map_err!(Regex::new(re)));
        Ok(self)
    }

    /// Whether this configuration leaves the input untouched.
    pub fn is_noop(&self) -> bool {
        self.start == 0 && self.end == 0 && !self.range && self.filters.is_empty()
    }

    /// Returns the elements selected by [start][Self::start], [end][Self::end]
    /// and [range][Self::range], in order.
    pub fn select<T>(&self, elements: Vec<T>) -> Vec<T> {
        let total = elements.len();

        let (skip, take) = if self.range {
            let from = self.start.saturating_sub(1);
            let to = self.end.min(total);
            (from, to.saturating_sub(from))
        } else {
            (self.start, total.saturating_sub(self.start.saturating_add(self.end)))
        };

        elements.into_iter().skip(skip).take(take).collect()
    }

    /// Returns `true` if `element` matches any of the filters.
    pub fn is_filtered(&self, element: &str) -> bool {
        self.filters.iter().any(|re| re.is_match(element))
    }

    #[schema_validation]
    fn validate_schema(&self) -> Result<(), ValidationErrors> {
        if self.range && self.end <= self.start {
            schema_err!(
                "range=true;start>=end",
                "end must be greater than start when using range"
            );
        }
        if self.range && self.start == 0 {
            schema_err!("range=true;start=0", "start cannot be 0 when using range");
        }
    }
}

/// Enumeration of all supported parser types.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parser {
    Text(TextParser),
    Pdf(PdfParser),
    Docx(DocxParser),
}

impl Parser {
    /// Returns the default parser for a document.
    pub fn new(ty: DocumentType) -> Self {
        match ty {
            DocumentType::Text => Self::Text(TextParser::default()),
            DocumentType::Docx => Self::Docx(DocxParser::default()),
            DocumentType::Pdf => Self::Pdf(PdfParser::default()),
        }
    }

    /// Returns a configured parser for a document.
    /// Errors if the configuration is invalid.
    pub fn new_from(ty: DocumentType, config: ParseConfig) -> Result<Self, ShelfError> {
        map_err!(Validate::validate(&config));
        Ok(match ty {
            DocumentType::Text => Self::Text(TextParser::new(config)),
            DocumentType::Docx => Self::Docx(DocxParser::new(config)),
            DocumentType::Pdf => Self::Pdf(PdfParser::new(config)),
        })
    }

    pub fn parse(&self, input: &[u8]) -> Result<String, ShelfError> {
        match self {
            Self::Text(p) => p.parse(input),
            Self::Pdf(p) => p.parse(input),
            Self::Docx(p) => p.parse(input),
        }
    }
}
