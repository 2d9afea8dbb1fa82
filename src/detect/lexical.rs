//! Line-level lexical helpers shared by the detectors.
//!
//! This is not a tokenizer. It only knows enough about quotes, comments and
//! Python triple-quoted strings to separate the code part of a line from its
//! comment part, so that rules matching code don't fire on commented-out
//! text and the TODO rule only looks at comments.

use crate::source::{Language, SourceUnit};

/// One source line split into code and comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine<'a> {
    /// 1-based line number.
    pub number: usize,
    pub raw: &'a str,
    /// Code outside comments and multi-line docstrings. String literals are kept.
    pub code: String,
    /// Comment bodies found on this line, without their markers.
    pub comments: Vec<&'a str>,
}

impl CodeLine<'_> {
    /// True when the line has comment text but no code.
    pub fn is_comment_only(&self) -> bool {
        self.code.trim().is_empty() && !self.comments.is_empty()
    }

    /// True when the line has any code at all.
    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }

    /// Leading whitespace width of the raw line (tabs count as 4).
    pub fn indent(&self) -> usize {
        self.raw
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum()
    }
}

/// Multi-line construct still open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    /// Inside `/* ... */`.
    Comment,
    /// Inside a Python `"""` or `'''` string opened on an earlier line.
    TripleString(u8),
}

/// Split every scannable line of the source into code and comments.
///
/// Returns an empty vector for binary content.
pub fn code_lines(source: &SourceUnit) -> Vec<CodeLine<'_>> {
    let mut block = Block::None;
    source
        .scan_lines()
        .map(|(number, line)| split_line(number, line, source.language(), &mut block))
        .collect()
}

fn split_line<'a>(number: usize, line: &'a str, language: Language, block: &mut Block) -> CodeLine<'a> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let js = language.is_js_family();

    let mut code = String::new();
    let mut comments = Vec::new();
    let mut quote: Option<u8> = None;
    let mut seg = 0;
    let mut i = 0;

    while i < len {
        match *block {
            Block::Comment => {
                match line[i..].find("*/") {
                    Some(off) => {
                        comments.push(&line[i..i + off]);
                        i += off + 2;
                        *block = Block::None;
                    }
                    None => {
                        comments.push(&line[i..]);
                        i = len;
                    }
                }
                seg = i;
                continue;
            }
            Block::TripleString(q) => {
                let delim = if q == b'"' { "\"\"\"" } else { "'''" };
                match line[i..].find(delim) {
                    Some(off) => {
                        i += off + 3;
                        *block = Block::None;
                    }
                    None => i = len,
                }
                seg = i;
                continue;
            }
            Block::None => {}
        }

        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'#' if !js => {
                code.push_str(&line[seg..i]);
                comments.push(&line[i + 1..]);
                seg = len;
                i = len;
            }
            b'/' if js && bytes.get(i + 1) == Some(&b'/') => {
                code.push_str(&line[seg..i]);
                comments.push(&line[i + 2..]);
                seg = len;
                i = len;
            }
            b'/' if js && bytes.get(i + 1) == Some(&b'*') => {
                code.push_str(&line[seg..i]);
                *block = Block::Comment;
                i += 2;
                seg = i;
            }
            b'"' | b'\'' if !js && is_triple_quote(&line[i..], b) => {
                let delim = &line[i..i + 3];
                match line[i + 3..].find(delim) {
                    // Closed on the same line: an ordinary string, keep it as code.
                    Some(off) => i += 3 + off + 3,
                    None => {
                        code.push_str(&line[seg..i]);
                        *block = Block::TripleString(b);
                        i = len;
                        seg = len;
                    }
                }
            }
            b'"' | b'\'' => {
                quote = Some(b);
                i += 1;
            }
            b'`' if js => {
                quote = Some(b);
                i += 1;
            }
            _ => i += 1,
        }
    }

    if seg < len {
        code.push_str(&line[seg..]);
    }

    CodeLine {
        number,
        raw: line,
        code,
        comments,
    }
}

fn is_triple_quote(rest: &str, q: u8) -> bool {
    let b = rest.as_bytes();
    b.len() >= 3 && b[1] == q && b[2] == q
}

/// Whether an expression is a single string literal with no interpolation.
///
/// `"Welcome"` and `'<b>hi</b>'` are literals; `"Hi " + name`, `` `Hi ${name}` ``
/// and `name` are not.
pub fn is_string_literal(expr: &str) -> bool {
    let expr = expr.trim().trim_end_matches(';').trim_end();
    let bytes = expr.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    let q = bytes[0];
    if !matches!(q, b'"' | b'\'' | b'`') || bytes[bytes.len() - 1] != q {
        return false;
    }

    let inner = &bytes[1..bytes.len() - 1];
    let mut escaped = false;
    for (i, &b) in inner.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b if b == q => return false,
            b'$' if q == b'`' && inner.get(i + 1) == Some(&b'{') => return false,
            _ => {}
        }
    }
    !escaped
}
