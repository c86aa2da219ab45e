//! Sentence segmentation shared by the summarizer and entity heuristics.

/// Whether `c` ends a sentence.
fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text on whitespace runs that directly follow `.`, `!` or `?`.
///
/// Fragments are trimmed and empty fragments dropped. The position of a
/// sentence in the returned vector is its order in the original text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && prev.is_some_and(is_terminal) {
            let s = text[start..i].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            // Swallow the rest of the whitespace run.
            let mut end = i + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if !d.is_whitespace() {
                    break;
                }
                end = j + d.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(c);
    }

    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_terminal_punctuation() {
        let s = split_sentences("The cat sat. The cat sat on the mat!  Dogs bark?\nYes");
        assert_eq!(
            s,
            vec!["The cat sat.", "The cat sat on the mat!", "Dogs bark?", "Yes"]
        );
    }

    #[test]
    fn test_punctuation_without_whitespace_does_not_split() {
        assert_eq!(split_sentences("v1.2 is out"), vec!["v1.2 is out"]);
        assert_eq!(split_sentences("Wait...what"), vec!["Wait...what"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let s = split_sentences("Café ouvert. Très bien… Merci!");
        assert_eq!(s, vec!["Café ouvert.", "Très bien… Merci!"]);
    }
}
