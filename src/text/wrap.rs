use alloc::{string::String, vec::Vec};

/// Word-wrap `text` into lines of at most `max_chars` characters.
///
/// Newlines and carriage returns in `text` are dropped first. Words are packed
/// greedily, each counted with the space that precedes it, so the first line
/// holds at most `max_chars - 1` characters. A word longer than `max_chars`
/// goes on its own line and is never split. Joining the result with single
/// spaces gives back the newline-free text.
///
/// ```rust
/// use matrix_portal::text::wrap_nicely;
///
/// assert_eq!(
///     wrap_nicely("the quick brown fox", 10),
///     ["the quick", "brown fox"]
/// );
/// ```
#[must_use]
pub fn wrap_nicely(text: &str, max_chars: usize) -> Vec<String> {
    let text: String = text.chars().filter(|ch| !matches!(ch, '\n' | '\r')).collect();
    let mut lines: Vec<String> = Vec::new();
    // The line being filled and its length in characters, leading space included.
    let mut current: Option<(String, usize)> = None;
    for word in text.split(' ') {
        let word_chars = word.chars().count();
        match current.as_mut() {
            Some((line, line_chars)) if *line_chars + 1 + word_chars <= max_chars => {
                line.push(' ');
                line.push_str(word);
                *line_chars += 1 + word_chars;
            }
            Some(_) => {
                if let Some((line, _)) = current.replace((String::from(word), word_chars)) {
                    lines.push(line);
                }
            }
            None => current = Some((String::from(word), 1 + word_chars)),
        }
    }
    if let Some((line, _)) = current {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn words(text: &str) -> Vec<&str> {
        text.split(' ').filter(|word| !word.is_empty()).collect()
    }

    #[test]
    fn packs_words_greedily() {
        assert_eq!(
            wrap_nicely("Hello world, this is a test", 11),
            vec!["Hello", "world, this", "is a test"]
        );
    }

    #[test]
    fn line_bound_holds_except_for_long_words() {
        let text = "a bb ccc dddd eeeee ffffff ggggggg";
        for max_chars in 1..12 {
            for line in wrap_nicely(text, max_chars) {
                let len = line.chars().count();
                assert!(
                    len <= max_chars || !line.contains(' '),
                    "line {line:?} exceeds {max_chars}"
                );
            }
        }
    }

    #[test]
    fn round_trip_reproduces_words() {
        let text = "Nine hundred ninety nine bottles of root beer on the wall";
        for max_chars in 5..30 {
            let joined = wrap_nicely(text, max_chars).join(" ");
            assert_eq!(words(&joined), words(text), "max_chars {max_chars}");
        }
    }

    #[test]
    fn first_line_counts_its_leading_space() {
        assert_eq!(wrap_nicely("ab cd", 5), vec!["ab", "cd"]);
        assert_eq!(wrap_nicely("ab cd", 6), vec!["ab cd"]);
        assert_eq!(wrap_nicely("abcde fg", 5), vec!["abcde", "fg"]);
    }

    #[test]
    fn over_long_word_sits_alone() {
        assert_eq!(
            wrap_nicely("supercalifragilistic is long", 8),
            vec!["supercalifragilistic", "is long"]
        );
        assert_eq!(
            wrap_nicely("a supercalifragilistic b", 8),
            vec!["a", "supercalifragilistic", "b"]
        );
    }

    #[test]
    fn embedded_newlines_are_ignored() {
        assert_eq!(wrap_nicely("one\r\n two\nthree", 20), vec!["one twothree"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(wrap_nicely("café crème brûlée", 11), vec!["café crème", "brûlée"]);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(wrap_nicely("", 10), vec![""]);
        assert_eq!(wrap_nicely("", 0), vec![""]);
    }

    #[test]
    fn deterministic() {
        let text = "the same input gives the same lines";
        assert_eq!(wrap_nicely(text, 9), wrap_nicely(text, 9));
    }
}
