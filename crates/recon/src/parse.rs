// Line-oriented comma splitting for hand-exported inventory sheets.
//
// Rows are split into lines before fields, and a quote only toggles the
// "inside quotes" state. Malformed quoting never fails.

/// Split text into lines on `\n` / `\r\n`, dropping blank and whitespace-only lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Split one line into fields.
///
/// A `"` toggles quoted mode and is not copied into the field; a comma inside
/// quotes is literal. An unterminated quote runs to the end of the line.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}
