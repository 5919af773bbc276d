use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::KiwiError;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r"(?s)(/\*.*?\*/|//[^\n]*|(?:-|\b)\d+\b|[=;{}():]|\[\]|\[deprecated\]|\b[A-Za-z_][A-Za-z0-9_]*\b|\s+)"
    ).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^\s+$").unwrap();
}

pub const DOC_COMMENT_POSITION: &str = "a documentation comment should be on a line on its own";

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    /// `///` starts a documentation comment; `//`, `////` and `//<` do not.
    pub fn is_doc_comment(&self) -> bool {
        self.text.starts_with("///") && !self.text.starts_with("////")
    }

    /// The comment text after the `///` marker, trailing whitespace removed.
    pub fn doc_text(&self) -> Option<&str> {
        if self.is_doc_comment() {
            Some(self.text[3..].trim_end())
        } else {
            None
        }
    }
}

/// Splits schema text into tokens. Whitespace, `//` comments and `/* */`
/// blocks are dropped; `///` documentation comments are kept as tokens so the
/// parser can attach them. The last token is always an empty EOF marker.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, KiwiError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;
    // Whether the current line already holds something besides whitespace.
    let mut line_has_content = false;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        let is_comment = part.starts_with("//") || part.starts_with("/*");
        let is_whitespace = WHITESPACE_RX.is_match(part);
        let is_doc = part.starts_with("///") && !part.starts_with("////");
        if is_doc && line_has_content {
            return Err(error(DOC_COMMENT_POSITION, line, column));
        }
        if is_doc || (!is_comment && !is_whitespace) {
            tokens.push(Token {
                text:   part.trim_end_matches('\r').to_string(),
                line,
                column,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        if !is_whitespace {
            line_has_content = true;
        } else if newline_count > 0 {
            line_has_content = false;
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}
