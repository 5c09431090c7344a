//! Tokenization and operator splitting.
//!
//! Both passes run the same four-state scanner: single-quote, double-quote,
//! backslash-escape, token accumulator. Backslashes inside single quotes are
//! literal; elsewhere the next character is taken verbatim. A `'` inside
//! `"…"` is literal and vice versa. Only the unquoted ASCII space terminates
//! a token — tabs are content for this shell subset.

use super::ast::Operator;

/// Split a command segment into tokens, honouring quotes and escapes.
/// Quote characters are stripped; their content is preserved exactly.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => {
                escaped = true;
                has_token = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                has_token = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                has_token = true;
            }
            ' ' if !in_single && !in_double => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    // A trailing backslash stands for itself.
    if escaped {
        current.push('\\');
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

/// Split a raw line on the operators `||`, `&&`, `|`, `;` outside quotes.
/// Two-character operators are matched before single. Empty segments are
/// kept — the executor collapses them to no-ops.
pub fn split_operators(input: &str) -> (Vec<String>, Vec<Operator>) {
    let mut segments = Vec::new();
    let mut operators = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if escaped {
            current.push(ch);
            escaped = false;
            i += 1;
            continue;
        }
        match ch {
            '\\' if !in_single => {
                // Keep the backslash for the tokenizer pass.
                current.push(ch);
                escaped = true;
                i += 1;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(ch);
                i += 1;
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(ch);
                i += 1;
            }
            '|' if !in_single && !in_double => {
                let op = if chars.get(i + 1) == Some(&'|') {
                    i += 2;
                    Operator::Or
                } else {
                    i += 1;
                    Operator::Pipe
                };
                segments.push(std::mem::take(&mut current));
                operators.push(op);
            }
            '&' if !in_single && !in_double && chars.get(i + 1) == Some(&'&') => {
                i += 2;
                segments.push(std::mem::take(&mut current));
                operators.push(Operator::And);
            }
            ';' if !in_single && !in_double => {
                i += 1;
                segments.push(std::mem::take(&mut current));
                operators.push(Operator::Seq);
            }
            c => {
                current.push(c);
                i += 1;
            }
        }
    }
    segments.push(current);
    (segments, operators)
}
