//! Terminal display width helpers.

/// Display width of `text` in terminal cells, ignoring ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Cut `text` so it occupies at most `width` cells.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let cell = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cell > width {
            break;
        }
        used += cell;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_do_not_count() {
        assert_eq!(display_width("\u{1b}[1mbold\u{1b}[0m"), 4);
    }

    #[test]
    fn wide_glyphs_are_not_split() {
        assert_eq!(display_width("█░"), 2);
        assert_eq!(truncate_to_width("漢字ab", 3), "漢");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }
}
