//! Structured doc comment parsing.
//!
//! The first non-empty line is the action description. `:param <name>: <text>`
//! documents an argument and `:return <name>: <text>` names and documents the
//! return value. Any other line is ignored.

use std::collections::HashMap;

/// Parsed `:return` tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnDoc {
    /// Field name for the synthesized response, if given.
    pub name: Option<String>,
    /// Description of the returned value.
    pub description: String,
}

/// Parsed doc comment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Docstring {
    /// First line.
    pub header: String,
    /// Per-argument descriptions keyed by argument name.
    pub params: HashMap<String, String>,
    /// Return value documentation.
    pub returns: Option<ReturnDoc>,
}

impl Docstring {
    /// Parses a doc comment. Returns `None` when there is no description line.
    #[must_use]
    pub fn parse(doc: &str) -> Option<Self> {
        let mut lines = doc.lines().map(str::trim).filter(|line| !line.is_empty());
        let header = lines.next()?;
        if header.starts_with(":param") || header.starts_with(":return") {
            return None;
        }

        let mut parsed = Self {
            header: header.to_owned(),
            ..Self::default()
        };

        for line in lines {
            if let Some(rest) = line.strip_prefix(":param ") {
                if let Some((name, description)) = rest.split_once(':') {
                    parsed
                        .params
                        .insert(name.trim().to_owned(), description.trim().to_owned());
                }
            } else if let Some(rest) = line
                .strip_prefix(":return")
                .filter(|rest| rest.starts_with([' ', ':']))
            {
                if let Some((name, description)) = rest.split_once(':') {
                    let name = name.trim();
                    parsed.returns = Some(ReturnDoc {
                        name: (!name.is_empty()).then(|| name.to_owned()),
                        description: description.trim().to_owned(),
                    });
                }
            }
        }

        Some(parsed)
    }

    /// Description for an argument, if documented.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|description| !description.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_params_and_return() {
        let doc = Docstring::parse(
            "Move view.\n:param line_number: target line\n  some prose\n:return output: command output",
        )
        .unwrap();

        assert_eq!(doc.header, "Move view.");
        assert_eq!(doc.param("line_number"), Some("target line"));
        assert_eq!(
            doc.returns,
            Some(ReturnDoc {
                name: Some("output".into()),
                description: "command output".into(),
            })
        );
    }

    #[test]
    fn unnamed_return_keeps_description() {
        let doc = Docstring::parse("Count files.\n:return: number of files").unwrap();
        let returns = doc.returns.unwrap();
        assert_eq!(returns.name, None);
        assert_eq!(returns.description, "number of files");
    }

    #[test]
    fn empty_or_tag_only_docs_have_no_description() {
        assert!(Docstring::parse("").is_none());
        assert!(Docstring::parse("   \n  ").is_none());
        assert!(Docstring::parse(":param x: value").is_none());
    }

    #[test]
    fn malformed_tags_are_ignored() {
        let doc = Docstring::parse("Header\n:param missing colon\n:paramx y: z").unwrap();
        assert!(doc.params.is_empty());
    }

    #[test]
    fn return_tag_needs_a_separator() {
        let doc = Docstring::parse("List files.\n:returns x: files\n:returnfoo: bar").unwrap();
        assert_eq!(doc.returns, None);
    }
}
