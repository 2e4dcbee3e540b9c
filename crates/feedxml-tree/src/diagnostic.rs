//! Diagnostic rendering for build errors.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::BuildError;

impl BuildError {
    /// Render this error with ariadne.
    ///
    /// Scanner errors are labelled at the byte offset where the reader gave
    /// up; structural errors point at the end of the input.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename, source);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        source: &str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let (message, help) = match self {
            BuildError::Malformed {
                source: Some(scan), ..
            } => {
                let range = char_range(source, scan.offset as usize);
                return Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message("malformed XML")
                    .with_label(
                        Label::new((filename, range))
                            .with_message(&scan.message)
                            .with_color(Color::Red),
                    );
            }
            BuildError::Malformed { .. } => (self.to_string(), None),
            BuildError::Unclosed { .. } => (
                self.to_string(),
                Some("every opened element needs a matching close tag".to_string()),
            ),
            BuildError::TooDeep { limit } => (
                self.to_string(),
                Some(format!("flatten the document to at most {limit} levels")),
            ),
            BuildError::EmptyDocument => (
                self.to_string(),
                Some("a document needs exactly one root element".to_string()),
            ),
        };

        let range = char_range(source, source.len());
        let report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(message)
            .with_label(
                Label::new((filename, range))
                    .with_message("input ends here")
                    .with_color(Color::Red),
            );
        match help {
            Some(help) => report.with_help(help),
            None => report,
        }
    }
}

/// A one-character range at `offset`, clamped to the source.
///
/// ariadne counts characters, not bytes.
fn char_range(source: &str, offset: usize) -> std::ops::Range<usize> {
    let mut byte = offset.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    let start = source[..byte].chars().count();
    let end = if byte < source.len() { start + 1 } else { start };
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        let err = crate::parse(source).expect_err("document should be rejected");
        let rendered = err.render("feed.xml", source);
        String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap()
    }

    #[test]
    fn test_scanner_error_diagnostic() {
        let source = "<rss>\n  <item></rss>";
        let rendered = render(source);
        assert!(rendered.contains("malformed XML"), "{rendered}");
        assert!(rendered.contains("feed.xml"), "{rendered}");
    }

    #[test]
    fn test_unclosed_diagnostic() {
        use feedxml_sax::SaxEvent;

        let source = "<rss><channel>";
        let err = crate::TreeBuilder::build([SaxEvent::start("rss"), SaxEvent::start("channel")])
            .expect_err("unclosed elements should be rejected");
        let rendered = err.render("feed.xml", source);
        let rendered = String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap();
        assert!(rendered.contains("2 element(s) still open"), "{rendered}");
        assert!(rendered.contains("input ends here"), "{rendered}");
    }

    #[test]
    fn test_empty_document_diagnostic() {
        let source = "<?xml version=\"1.0\"?>";
        let rendered = render(source);
        assert!(rendered.contains("no root element"), "{rendered}");
        assert!(rendered.contains("exactly one root element"), "{rendered}");
        assert!(!rendered.contains("matching close tag"), "{rendered}");
    }

    #[test]
    fn test_too_deep_diagnostic() {
        let source = "<a><a><a></a></a></a>";
        let err = crate::parse_with_max_depth(source, 2).expect_err("nesting should be rejected");
        let rendered = String::from_utf8(strip_ansi_escapes::strip(err.render("feed.xml", source)))
            .unwrap();
        assert!(rendered.contains("deeper than 2 levels"), "{rendered}");
        assert!(!rendered.contains("matching close tag"), "{rendered}");
    }

    #[test]
    fn test_char_range_clamps() {
        assert_eq!(char_range("abc", 1), 1..2);
        assert_eq!(char_range("abc", 10), 3..3);
        assert_eq!(char_range("é<", 1), 0..1);
    }
}
