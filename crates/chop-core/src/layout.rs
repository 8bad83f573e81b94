//! Go reference-layout translation.
//!
//! Date formats written against the reference time `Mon Jan 2 15:04:05 MST 2006`
//! are rewritten into the equivalent strftime pattern for chrono.

/// Layout elements, longest first so that `2006` wins over `2` and `15` over `1`.
///
/// Zero-padded elements map to zero-padded specifiers and unpadded ones to `%-`,
/// so a parser can tell which numbers must have their full width.
const ELEMENTS: &[(&str, &str)] = &[
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    ("January", "%B"),
    ("Monday", "%A"),
    ("-07:00", "%:z"),
    ("Z07:00", "%:z"),
    ("-0700", "%z"),
    ("Z0700", "%z"),
    ("2006", "%Y"),
    (".000", "%.3f"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Translate a Go layout into a strftime pattern.
///
/// Anything that is not a layout element is copied literally, with `%` escaped.
pub fn to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'scan: while let Some(c) = rest.chars().next() {
        for (element, strftime) in ELEMENTS {
            if let Some(tail) = rest.strip_prefix(element) {
                out.push_str(strftime);
                rest = tail;
                continue 'scan;
            }
        }

        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::to_strftime;

    #[test]
    fn translates_common_layouts() {
        assert_eq!(to_strftime("20060102"), "%Y%m%d");
        assert_eq!(to_strftime("2006-01-02"), "%Y-%m-%d");
        assert_eq!(to_strftime("2006/1/2 15:04:05"), "%Y/%-m/%-d %H:%M:%S");
        assert_eq!(to_strftime("02 Jan 06 15:04 MST"), "%d %b %y %H:%M %Z");
        assert_eq!(to_strftime("2006-01-02T15:04:05.000-07:00"), "%Y-%m-%dT%H:%M:%S%.3f%:z");
        assert_eq!(to_strftime("Monday, January _2"), "%A, %B %e");
    }

    #[test]
    fn literals_are_copied_and_percent_escaped() {
        assert_eq!(to_strftime("day 2006 年"), "day %Y 年");
        assert_eq!(to_strftime("100%"), "%-m00%%");
    }
}
