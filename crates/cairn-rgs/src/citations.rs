//! Citation marker parsing
//!
//! A small deterministic scanner over generated text, recognizing exactly
//! the marker shape issued to the prompt: `[S<digits>]`. Anything else
//! inside brackets is prose. Labels are returned in first-occurrence order
//! without duplicates; validity against the packed context is the
//! synthesizer's job, not the parser's.

/// Extract citation labels (`S1`, `S2`, …) from generated text
pub fn parse_citations(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut labels: Vec<String> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }

        // candidate marker: '[' 'S' digit+ ']'
        let start = i + 1;
        if start >= bytes.len() || bytes[start] != b'S' {
            i += 1;
            continue;
        }

        let mut j = start + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }

        let has_digits = j > start + 1;
        if has_digits && j < bytes.len() && bytes[j] == b']' {
            let label = &text[start..j];
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_markers_in_first_occurrence_order() {
        let text = "Beta holds [S2]. Alpha holds [S1], see also [S2].";
        assert_eq!(parse_citations(text), vec!["S2", "S1"]);
    }

    #[test]
    fn ignores_malformed_brackets() {
        assert!(parse_citations("no markers here").is_empty());
        assert!(parse_citations("[S] [s1] [X1] [S1x] [ S1]").is_empty());
        assert!(parse_citations("unclosed [S12").is_empty());
        assert!(parse_citations("[]").is_empty());
    }

    #[test]
    fn adjacent_and_multidigit_markers() {
        assert_eq!(parse_citations("[S1][S10][S2]"), vec!["S1", "S10", "S2"]);
    }

    #[test]
    fn marker_shape_is_exact() {
        // bracket prose that merely resembles a marker
        assert_eq!(parse_citations("array[S1] and [note: S2]"), vec!["S1"]);
    }

    #[test]
    fn handles_non_ascii_text_around_markers() {
        assert_eq!(parse_citations("café [S3] naïve"), vec!["S3"]);
    }
}
