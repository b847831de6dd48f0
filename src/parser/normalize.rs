/// Collapse runs of whitespace (including NBSP) to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Canonical form of a matched fragment: whitespace collapsed and any of
/// `labels` stripped from the front, e.g. "Acceptance Rate: 18%" -> "18%".
///
/// Stripping repeats until nothing changes, so the result is a fixed point
/// and `normalize_field(normalize_field(x, l), l) == normalize_field(x, l)`.
pub fn normalize_field(raw: &str, labels: &[&str]) -> String {
    let mut current = collapse_ws(raw);
    loop {
        let next = collapse_ws(strip_label_once(&current, labels));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Drop a leading label: the first label in `labels` found (case-insensitive,
/// word-bounded) before any digit, everything ahead of it, and a trailing colon.
fn strip_label_once<'a>(value: &'a str, labels: &[&str]) -> &'a str {
    // ASCII lowercasing keeps byte offsets aligned with `value`
    let lower = value.to_ascii_lowercase();
    for label in labels {
        if let Some(end) = leading_label_end(&lower, label) {
            let rest = value[end..].trim_start();
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            return rest.trim_start();
        }
    }
    value
}

/// Labels only count while no value text (digits) precedes them.
fn leading_label_end(lower: &str, label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    lower
        .match_indices(label)
        .take_while(|(i, _)| !lower[..*i].bytes().any(|b| b.is_ascii_digit()))
        .find(|(i, _)| {
            let end = i + label.len();
            let before = lower[..*i].chars().next_back();
            let after = lower[end..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .map(|(i, _)| i + label.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPT: &[&str] = &["acceptance rate"];
    const SAT: &[&str] = &["sat range", "sat"];

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_ws("  a \n\t b\u{a0} c  "), "a b c");
        assert_eq!(collapse_ws(""), "");
    }

    #[test]
    fn strips_label_prefix() {
        assert_eq!(normalize_field("Acceptance Rate: 18%", ACCEPT), "18%");
        assert_eq!(normalize_field("ACCEPTANCE RATE 18%", ACCEPT), "18%");
        assert_eq!(normalize_field("Overall acceptance rate:  7.5%", ACCEPT), "7.5%");
        assert_eq!(normalize_field("SAT Range: 1200-1400", SAT), "1200-1400");
        assert_eq!(normalize_field("SAT: 1200-1400", SAT), "1200-1400");
    }

    #[test]
    fn respects_word_boundaries() {
        // "sat" inside "Saturday" is not a label
        assert_eq!(normalize_field("Saturday tours", SAT), "Saturday tours");
        assert_eq!(normalize_field("18%", ACCEPT), "18%");
    }

    #[test]
    fn labels_after_the_value_are_kept() {
        assert_eq!(
            normalize_field("SAT Range: 1200-1400 (SAT)", SAT),
            "1200-1400 (SAT)"
        );
        assert_eq!(normalize_field("18% acceptance rate", ACCEPT), "18% acceptance rate");
        assert_eq!(normalize_field("sat  range sat: 1300", SAT), "1300");
    }

    #[test]
    fn no_labels_is_trim_only() {
        assert_eq!(normalize_field("  $12,000 / yr ", &[]), "$12,000 / yr");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Acceptance Rate: 18%",
            "SAT Range: 1200-1400 sat",
            "sat  range sat: 1300",
            "  plain   text ",
            "acceptance rate",
            "",
        ];
        for s in samples {
            for labels in [ACCEPT, SAT, &[][..]] {
                let once = normalize_field(s, labels);
                assert_eq!(normalize_field(&once, labels), once, "input {:?}", s);
            }
        }
    }
}
