//! Layout helpers for generated declarations and doc comments.

/// Pad `s` with spaces to `width`, growing the width in steps of 4 while the
/// string is longer than it.
pub fn append_ws(s: &str, width: usize) -> String {
    let mut w = width;
    while s.len() > w {
        w += 4;
    }
    format!("{:<w$}", s, w = w)
}

/// Word-wrap `line` so each piece has at most `width` characters. Embedded
/// newlines force a break. An empty line yields one empty piece.
pub fn split_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    let mut len = 0;

    for word in line.split(' ') {
        if let Some((head, tail)) = word.split_once('\n') {
            words.push(head);
            lines.push(words.join(" "));
            words.clear();
            len = 0;
            if !tail.is_empty() {
                len = tail.len();
                words.push(tail);
            }
        } else if len + words.len() + word.len() <= width {
            len += word.len();
            words.push(word);
        } else {
            lines.push(words.join(" "));
            words = vec![word];
            len = word.len();
        }
    }
    if !words.is_empty() {
        lines.push(words.join(" "));
    }
    lines
}

/// Lines of `prologue ///< description`, with the description wrapped and
/// continuation lines aligned under the first comment.
pub fn commented(prologue: &str, desc: &str) -> Vec<String> {
    let mut first = Some(prologue);
    split_line(desc, 70)
        .into_iter()
        .map(|piece| {
            let head = first.take().unwrap_or("");
            format!("{}///< {}", append_ws(head, 48), piece).trim_end().to_string()
        })
        .collect()
}
