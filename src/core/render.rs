//! XML document renderer
//!
//! Renders the text files of an `AggregateResult` as:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <files>
//!   <file path="src/main.rs"><![CDATA[
//!     fn main() {}
//!     ]]></file>
//! </files>
//! ```
//!
//! Content is indented by four spaces and wrapped in CDATA sections. A `]]>`
//! inside the content closes the current section right after `]]` and the `>`
//! opens the next one, so the data can never end a section early.
//!
//! Content is written byte for byte, `\r\n` included. XML parsers normalize
//! line endings to `\n` when reading, so CRLF files come back with LF endings.

use crate::core::model::{AggregateResult, TextFileRecord};

/// XML declaration emitted at the top of every document
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Indentation applied to every content line
pub const CONTENT_INDENT: &str = "    ";

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Render the aggregate as an XML document. Binary files and errors are omitted.
pub fn serialize(result: &AggregateResult) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str("<files>\n");

    for file in &result.text_files {
        render_file(&mut xml, file);
    }

    xml.push_str("</files>\n");
    xml
}

fn render_file(xml: &mut String, file: &TextFileRecord) {
    xml.push_str(&format!("  <file path=\"{}\">", escape_attr(&file.path)));
    xml.push_str(&render_cdata(&indent(&file.content)));
    xml.push_str("</file>\n");
}

/// Escape text for use inside a double-quoted attribute.
///
/// `&` goes first so the entities produced afterwards are not escaped again.
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Prefix every line, including the first and a trailing empty one, with the indent
pub fn indent(content: &str) -> String {
    content
        .split('\n')
        .map(|line| format!("{}{}", CONTENT_INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a payload into segments that are each safe inside one CDATA section.
///
/// Every `]]>` is cut between `]]` and `>`: the `]]` ends one segment and the
/// `>` starts the next. Concatenating the segments yields the payload again.
pub fn cdata_segments(payload: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = payload;

    while let Some(idx) = rest.find(CDATA_END) {
        let cut = idx + 2;
        segments.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    segments.push(rest);
    segments
}

/// Wrap a payload in one or more adjacent CDATA sections
pub fn render_cdata(payload: &str) -> String {
    let joiner = format!("{}{}", CDATA_END, CDATA_OPEN);
    format!(
        "{}\n{}\n{}{}",
        CDATA_OPEN,
        cdata_segments(payload).join(&joiner),
        CONTENT_INDENT,
        CDATA_END
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{BinaryFileRecord, ErrorRecord, FileOutcome};
    use std::path::PathBuf;

    /// Parse a document with a real XML parser and return (path, content)
    /// pairs with CDATA sections joined and the indentation removed.
    fn decode_document(xml: &str) -> Vec<(String, String)> {
        let doc = roxmltree::Document::parse(xml).expect("well-formed document");
        let root = doc.root_element();
        assert!(root.has_tag_name("files"));

        root.children()
            .filter(|n| n.has_tag_name("file"))
            .map(|file| {
                let path = file.attribute("path").expect("path attribute").to_string();
                let raw: String = file
                    .children()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect();

                let raw = raw
                    .strip_prefix('\n')
                    .and_then(|r| r.strip_suffix(&format!("\n{}", CONTENT_INDENT)))
                    .expect("block framing");
                let content = raw
                    .split('\n')
                    .map(|line| line.strip_prefix(CONTENT_INDENT).expect("indented line"))
                    .collect::<Vec<_>>()
                    .join("\n");

                (path, content)
            })
            .collect()
    }

    fn result_with(files: &[(&str, &str)]) -> AggregateResult {
        let mut result = AggregateResult::new(files.len());
        for (path, content) in files {
            result.push(FileOutcome::Text(TextFileRecord::new(
                *path,
                content.to_string(),
            )));
        }
        result
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"a&b<c>d"e'f"#),
            "a&amp;b&lt;c&gt;d&quot;e&apos;f"
        );
    }

    #[test]
    fn test_escape_attr_no_double_escape() {
        assert_eq!(escape_attr("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\nb"), "    a\n    b");
        assert_eq!(indent("a\n"), "    a\n    ");
        assert_eq!(indent(""), "    ");
    }

    #[test]
    fn test_cdata_segments_without_delimiter() {
        assert_eq!(cdata_segments("plain <b>text</b>"), vec!["plain <b>text</b>"]);
    }

    #[test]
    fn test_cdata_segments_split_delimiter() {
        assert_eq!(cdata_segments("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_segments("]]>]]>"), vec!["]]", ">]]", ">"]);
        assert_eq!(cdata_segments("x]]]>y"), vec!["x]]]", ">y"]);
    }

    #[test]
    fn test_cdata_segments_never_contain_delimiter() {
        for payload in ["]]>", "a]]>b]]>c", "]]]]>>", "]]>>]]"] {
            let segments = cdata_segments(payload);
            assert!(segments.iter().all(|s| !s.contains(CDATA_END)));
            assert_eq!(segments.concat(), payload);
        }
    }

    #[test]
    fn test_render_cdata_reopens_section() {
        assert_eq!(
            render_cdata("    a]]>b"),
            "<![CDATA[\n    a]]]]><![CDATA[>b\n    ]]>"
        );
    }

    #[test]
    fn test_serialize_document_shape() {
        let xml = serialize(&result_with(&[("src/main.rs", "fn main() {}")]));
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <files>\n  \
             <file path=\"src/main.rs\"><![CDATA[\n    fn main() {}\n    ]]></file>\n\
             </files>\n"
        );
    }

    #[test]
    fn test_serialize_delimiter_round_trip() {
        let xml = serialize(&result_with(&[("weird.txt", "a]]>b")]));
        let files = decode_document(&xml);
        assert_eq!(files, vec![("weird.txt".to_string(), "a]]>b".to_string())]);
    }

    #[test]
    fn test_serialize_multiline_delimiter_round_trip() {
        let content = "<![CDATA[\nx = y[z[0]]>1\n]]>\n";
        let xml = serialize(&result_with(&[("gen.xml", content)]));
        let files = decode_document(&xml);
        assert_eq!(files[0].1, content);
    }

    #[test]
    fn test_serialize_attribute_round_trip() {
        let path = r#"dir/a&b<c"d'.txt"#;
        let xml = serialize(&result_with(&[(path, "x")]));
        assert!(xml.contains(r#"path="dir/a&amp;b&lt;c&quot;d&apos;.txt""#));
        let files = decode_document(&xml);
        assert_eq!(files[0].0, path);
    }

    #[test]
    fn test_serialize_empty_file_keeps_block() {
        let xml = serialize(&result_with(&[("empty.txt", "")]));
        assert!(xml.contains("<file path=\"empty.txt\"><![CDATA[\n    \n    ]]></file>"));
        let files = decode_document(&xml);
        assert_eq!(files, vec![("empty.txt".to_string(), String::new())]);
    }

    #[test]
    fn test_serialize_whitespace_only_file_keeps_block() {
        let xml = serialize(&result_with(&[("blank.txt", "  \n\t")]));
        let files = decode_document(&xml);
        assert_eq!(files[0].1, "  \n\t");
    }

    #[test]
    fn test_serialize_keeps_crlf_bytes() {
        let xml = serialize(&result_with(&[("win.txt", "a\r\nb")]));
        assert!(xml.contains("    a\r\n    b"));

        // Parsers normalize line endings on read
        let files = decode_document(&xml);
        assert_eq!(files[0].1, "a\nb");
    }

    #[test]
    fn test_serialize_omits_binary_and_errors() {
        let mut result = result_with(&[("a.txt", "hello")]);
        result.push(FileOutcome::Binary(BinaryFileRecord {
            path: "img.png".into(),
            absolute_path: PathBuf::from("/r/img.png"),
            size: 42,
        }));
        result.push(FileOutcome::Error(ErrorRecord {
            path: "locked.txt".into(),
            absolute_path: PathBuf::from("/r/locked.txt"),
            error: "permission denied".into(),
        }));

        let xml = serialize(&result);
        assert_eq!(xml.matches("<file ").count(), 1);
        assert!(!xml.contains("img.png"));
        assert!(!xml.contains("locked.txt"));
    }

    #[test]
    fn test_serialize_preserves_order_and_is_deterministic() {
        let result = result_with(&[("b.rs", "2"), ("a.rs", "1")]);
        let first = serialize(&result);
        assert_eq!(first, serialize(&result));

        let files = decode_document(&first);
        assert_eq!(files[0].0, "b.rs");
        assert_eq!(files[1].0, "a.rs");
    }

    #[test]
    fn test_serialize_no_files() {
        let xml = serialize(&AggregateResult::default());
        assert_eq!(xml, format!("{}\n<files>\n</files>\n", XML_DECLARATION));
    }
}
