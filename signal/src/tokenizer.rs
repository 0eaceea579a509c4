//! Splits a single AT response line into its raw fields.
//!
//! A response line looks like `+QENG: "LTE","FDD",222,01,328261F,...`. Field
//! positions carry meaning, so empty fields are kept and quoted fields may
//! contain commas.

/// Returns the fields following `prefix:` on `line`.
///
/// `None` for blank lines, the bare `OK` / `ERROR` terminators and lines that
/// start with a different prefix. An unterminated quote ends the field list at
/// the offending field instead of failing.
pub fn tokenize(line: &str, prefix: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.is_empty() || line == "OK" || line == "ERROR" {
        return None;
    }
    let content = line.strip_prefix(prefix)?.strip_prefix(':')?;

    Some(split_fields(content))
}

/// Tokenizes every line of `response` that carries `prefix`, in order.
pub fn rows<'a>(
    response: &'a str,
    prefix: &'a str,
) -> impl Iterator<Item = Vec<String>> + 'a {
    response.lines().filter_map(move |line| tokenize(line, prefix))
}

fn split_fields(content: &str) -> Vec<String> {
    let mut fields = Vec::new();
    if content.trim().is_empty() {
        return fields;
    }

    let mut rest = content;
    loop {
        let trimmed = rest.trim_start();
        if let Some(quoted) = trimmed.strip_prefix('"') {
            let Some(end) = closing_quote(quoted) else {
                break;
            };
            fields.push(quoted[..end].to_owned());

            // Anything between the closing quote and the next comma is noise.
            match quoted[end + 1..].find(',') {
                Some(comma) => rest = &quoted[end + 1 + comma + 1..],
                None => break,
            }
        } else {
            match rest.find(',') {
                Some(comma) => {
                    fields.push(rest[..comma].trim().to_owned());
                    rest = &rest[comma + 1..];
                }
                None => {
                    fields.push(rest.trim().to_owned());
                    break;
                }
            }
        }
    }

    fields
}

/// Byte offset of the first `"` in `s` that is not preceded by a backslash.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(idx),
            _ => escaped = false,
        }
    }

    None
}
