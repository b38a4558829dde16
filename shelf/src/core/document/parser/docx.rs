use super::ParseConfig;
use crate::error::ShelfError;
use crate::map_err;
use docx_rs::read_docx;
use docx_rs::{Paragraph, ParagraphChild, RunChild, Table};
use serde::{Deserialize, Serialize};
use std::{fmt::Write, time::Instant};
use tracing::debug;

/// Parses DOCX files. Text elements are top level paragraphs and tables.
///
/// Every paragraph is written on its own line, tables are rendered as Markdown.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocxParser {
    config: ParseConfig,
}

impl DocxParser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl DocxParser {
    pub fn parse(&self, input: &[u8]) -> Result<String, ShelfError> {
        let start = Instant::now();

        let input = map_err!(read_docx(input));
        let mut elements = vec![];

        for el in input.document.children {
            match el {
                docx_rs::DocumentChild::Paragraph(ref el) => {
                    elements.push(extract_paragraph(el).concat());
                }
                docx_rs::DocumentChild::Table(el) => {
                    let table = map_err!(extract_table(&el));
                    elements.push(table);
                }
                _ => {}
            }
        }

        let mut out = String::new();

        for el in self.config.select(elements) {
            if self.config.is_filtered(&el) {
                continue;
            }
            map_err!(writeln!(out, "{el}"));
        }

        debug!(
            "Finished processing DOCX, took {}ms",
            Instant::now().duration_since(start).as_millis()
        );

        Ok(out)
    }
}

/// Given a DOCX table, create the equivalent table in Markdown style.
///
/// * `table`: The table to process.
fn extract_table(table: &Table) -> Result<String, std::fmt::Error> {
    let mut table_out = String::new();

    for (i, row) in table.rows.iter().enumerate() {
        #[allow(irrefutable_let_patterns)]
        let docx_rs::TableChild::TableRow(docx_rs::TableRow { cells, .. }) = row
        else {
            continue;
        };

        let mut row_buf: Vec<String> = vec![];

        for cell in cells.iter() {
            #[allow(irrefutable_let_patterns)]
            let docx_rs::TableRowChild::TableCell(cell) = cell
            else {
                continue;
            };

            let mut cell_buf = String::new();

            for child in cell.children.iter() {
                match child {
                    docx_rs::TableCellContent::Paragraph(ref p) => {
                        write!(cell_buf, " {} ", extract_paragraph(p).concat())?;
                    }
                    c => debug!("Unrecognized child in table cell: {:?}", c),
                }
            }

            row_buf.push(cell_buf);
        }

        writeln!(table_out, "|{}|", row_buf.join("|").replace("  ", " "))?;

        // Header separator
        if i == 0 {
            write!(table_out, "|")?;
            for cell in row_buf.iter() {
                write!(table_out, "{}|", "-".repeat(cell.len().max(3)))?;
            }
            writeln!(table_out)?;
        }
    }

    Ok(table_out.trim_end().to_string())
}

fn extract_paragraph(p: &Paragraph) -> Vec<&str> {
    let mut out = vec![];

    for child in p.children.iter() {
        match child {
            ParagraphChild::Run(run) => {
                for rchild in run.children.iter() {
                    let RunChild::Text(t) = rchild else { continue };
                    out.push(t.text.as_str());
                }
            }
            ParagraphChild::Hyperlink(hl) => {
                for rchild in hl.children.iter() {
                    let ParagraphChild::Run(run) = rchild else {
                        continue;
                    };
                    for rchild in run.children.iter() {
                        let RunChild::Text(t) = rchild else { continue };
                        out.push(t.text.as_str());
                    }
                }
            }
            _el => {}
        }
    }

    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use docx_rs::{Docx, Run};

    /// Build an in-memory DOCX file with one paragraph per element of `paragraphs`.
    pub(crate) fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buf = std::io::Cursor::new(vec![]);
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn parses_paragraphs_into_lines() {
        let input = docx_bytes(&["Civic education", "Chapter one", "Rights and duties"]);
        let out = DocxParser::default().parse(&input).unwrap();
        assert_eq!("Civic education\nChapter one\nRights and duties\n", out);
    }

    #[test]
    fn applies_config_to_paragraphs() {
        let input = docx_bytes(&["Cover", "Body one", "Draft note", "Body two", "Index"]);
        let config = ParseConfig::new(1, 1).with_filter("^Draft").unwrap();
        let out = DocxParser::new(config).parse(&input).unwrap();
        assert_eq!("Body one\nBody two\n", out);
    }

    #[test]
    fn rejects_garbage() {
        assert!(DocxParser::default().parse(b"not a zip").is_err());
    }
}
