//! Parser for directive bodies and directive discovery in templates

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::{parse_directive, parse_directive_at, parse_expr};

/// A `{% tag ... %}` block found in a template source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub tag: String,
    /// From `{%` through `%}`, or to the end of the source if unterminated
    pub span: Span,
}

/// Find blocks in `source` whose tag is one of `tags`
///
/// Comments (`{# ... #}`) are skipped and `%}` inside quoted strings does not
/// end a block. Whitespace-control markers (`{%-`, `{%~`) are allowed before
/// the tag. Blocks with other tags are left to the host.
pub fn find_directives(source: &str, tags: &[&str]) -> Vec<DirectiveMatch> {
    let bytes = source.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;

    while pos + 1 < bytes.len() {
        match (bytes[pos], bytes[pos + 1]) {
            (b'{', b'#') => {
                pos = match source[pos + 2..].find("#}") {
                    Some(rel) => pos + 2 + rel + 2,
                    None => bytes.len(),
                };
            }
            (b'{', b'%') => {
                let start = pos;
                let end = block_end(bytes, start + 2);
                if let Some(tag) = leading_word(&source[start + 2..end]) {
                    if tags.contains(&tag) {
                        found.push(DirectiveMatch {
                            tag: tag.to_string(),
                            span: start..end,
                        });
                    }
                }
                pos = end;
            }
            _ => pos += 1,
        }
    }
    found
}

/// Position just past the `%}` closing a block opened before `from`
fn block_end(bytes: &[u8], from: usize) -> usize {
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'%' && bytes.get(i + 1) == Some(&b'}') => return i + 2,
            None => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Tag word of a block body that starts right after `{%`
fn leading_word(body: &str) -> Option<&str> {
    let body = body.strip_prefix(['-', '~']).unwrap_or(body).trim_start();
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    (end > 0).then(|| &body[..end])
}
