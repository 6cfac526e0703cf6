//! Whitespace canonicalization for fuzzy anchor matching.
//!
//! Normalization maps `\r\n` to `\n` and tabs to four spaces. It is used
//! only to *locate* a match; output text is always spliced from the
//! original, un-normalized buffer.

/// Canonicalize whitespace for comparison.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\t', "    ")
}

/// Location of a fuzzy anchor match, expressed against the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit {
    /// Character offset of the match start in the original text.
    pub char_start: usize,
    /// Occurrences of the normalized search in the normalized content.
    pub occurrences: usize,
}

/// Locate the first occurrence of `search` in `content`, comparing both
/// sides in normalized form.
///
/// The normalized match start is mapped back to the original text by
/// taking the character length of the normalized prefix. The mapping is
/// exact only when no length-changing characters (tabs, CRLF) precede the
/// match in the original; otherwise it is an approximation.
pub fn locate(content: &str, search: &str) -> Option<AnchorHit> {
    let norm_search = normalize(search);
    if norm_search.is_empty() {
        return None;
    }
    let norm_content = normalize(content);
    let byte_start = norm_content.find(&norm_search)?;
    let char_start = norm_content[..byte_start].chars().count();
    let occurrences = norm_content.matches(norm_search.as_str()).count();
    Some(AnchorHit {
        char_start,
        occurrences,
    })
}

/// Byte index of the `char_idx`-th character of `s`, saturating at the end
/// of the string.
pub fn byte_of_char(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_crlf_and_tabs() {
        assert_eq!(normalize("a\r\nb\tc"), "a\nb    c");
    }

    #[test]
    fn locate_exact_text() {
        let hit = locate("def f():\n    pass", "    pass").unwrap();
        assert_eq!(hit.char_start, 9);
        assert_eq!(hit.occurrences, 1);
    }

    #[test]
    fn locate_tab_indented_target_with_space_search() {
        // The buffer uses a tab; the search uses four spaces. Normalization
        // makes them comparable.
        let hit = locate("def f():\n\tpass", "    pass");
        assert!(hit.is_some());
    }

    #[test]
    fn locate_crlf_content_with_lf_search() {
        let hit = locate("a\r\nb\r\nc", "b\nc").unwrap();
        assert_eq!(hit.char_start, 2);
    }

    #[test]
    fn locate_missing_anchor() {
        assert_eq!(locate("a\nb", "zzz"), None);
    }

    #[test]
    fn locate_empty_search_is_not_a_match() {
        assert_eq!(locate("a\nb", ""), None);
    }

    #[test]
    fn locate_counts_occurrences() {
        let hit = locate("x = 1\nx = 1\n", "x = 1").unwrap();
        assert_eq!(hit.char_start, 0);
        assert_eq!(hit.occurrences, 2);
    }

    #[test]
    fn byte_of_char_multibyte() {
        let s = "héllo";
        assert_eq!(byte_of_char(s, 0), 0);
        assert_eq!(byte_of_char(s, 1), 1);
        assert_eq!(byte_of_char(s, 2), 3);
        assert_eq!(byte_of_char(s, 99), s.len());
    }
}
