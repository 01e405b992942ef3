use crate::error::ValidationError;
use crate::models::{MAX_OPTIONS, OrderedMap, Poll};

pub const DEFAULT_SECTION: &str = "General";
pub const DEFAULT_DURATION_DAYS: u32 = 2;
pub const MIN_DURATION_DAYS: u32 = 1;
pub const MAX_DURATION_DAYS: u32 = 30;

/// Sections and keyed options parsed from the creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOptions {
    pub sections: OrderedMap<Vec<String>>,
    /// Option key -> text, over the flattened section order, capped at [`MAX_OPTIONS`].
    pub options: OrderedMap<String>,
}

/// Parse the free-text sections block.
///
/// A line wrapped in `[...]` opens a section; any other non-blank line is an
/// option of the current section (`General` until the first header). Lines are
/// trimmed and blank lines ignored. A repeated header continues the earlier
/// section. Keys run over the merged sections in display order, and only the
/// first [`MAX_OPTIONS`] options get one; sections keep their full text.
pub fn parse_sections(text: &str) -> Result<ParsedOptions, ValidationError> {
    let mut sections: OrderedMap<Vec<String>> = OrderedMap::new();
    let mut current = DEFAULT_SECTION.to_string();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
            current = line[1..line.len() - 1].trim().to_string();
            sections.entry_or_default(&current);
        } else {
            sections.entry_or_default(&current).push(line.to_string());
        }
    }

    let flattened: Vec<String> = sections.values().flatten().take(MAX_OPTIONS).cloned().collect();
    if flattened.len() < 2 {
        return Err(ValidationError::TooFewOptions {
            found: flattened.len(),
        });
    }

    let options = flattened
        .into_iter()
        .enumerate()
        .map(|(index, text)| (Poll::option_key(index), text))
        .collect();

    Ok(ParsedOptions { sections, options })
}

/// Parse the optional duration field. Blank means the default; integers are
/// clamped to the allowed range.
pub fn parse_duration_days(text: Option<&str>) -> Result<u32, ValidationError> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(DEFAULT_DURATION_DAYS);
    }
    let days: i64 = text
        .parse()
        .map_err(|_| ValidationError::MalformedDuration(text.to_string()))?;
    Ok(days.clamp(MIN_DURATION_DAYS as i64, MAX_DURATION_DAYS as i64) as u32)
}

/// Parse a comma-separated role list: trimmed, lower-cased, blanks dropped.
pub fn parse_role_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|role| role.trim().to_lowercase())
        .filter(|role| !role.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(parsed: &ParsedOptions, name: &str) -> Vec<String> {
        parsed.sections.get(name).cloned().unwrap_or_default()
    }

    #[test]
    fn sections_and_keys_follow_encounter_order() {
        let parsed = parse_sections("[A]\nx\ny\n[B]\nz").unwrap();
        assert_eq!(parsed.sections.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(section(&parsed, "A"), vec!["x", "y"]);
        assert_eq!(section(&parsed, "B"), vec!["z"]);
        assert_eq!(
            parsed.options.iter().collect::<Vec<_>>(),
            vec![
                ("option0", &"x".to_string()),
                ("option1", &"y".to_string()),
                ("option2", &"z".to_string()),
            ]
        );
    }

    #[test]
    fn options_before_any_header_land_in_general() {
        let parsed = parse_sections("  uno \n\n   \ndos\n[Otra]\ntres").unwrap();
        assert_eq!(section(&parsed, "General"), vec!["uno", "dos"]);
        assert_eq!(section(&parsed, "Otra"), vec!["tres"]);
    }

    #[test]
    fn header_names_are_trimmed_and_repeated_headers_merge() {
        let parsed = parse_sections("[ A ]\nx\n[B]\ny\n[A]\nz").unwrap();
        assert_eq!(parsed.sections.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(section(&parsed, "A"), vec!["x", "z"]);
        assert_eq!(
            parsed.options.values().map(String::as_str).collect::<Vec<_>>(),
            vec!["x", "z", "y"]
        );
    }

    #[test]
    fn option_cap_follows_merged_section_order() {
        let first: String = (0..30).map(|i| format!("a{}\n", i)).collect();
        let second: String = (0..30).map(|i| format!("b{}\n", i)).collect();
        let text = format!("[A]\n{}[B]\n{}[A]\nlate\n", first, second);
        let parsed = parse_sections(&text).unwrap();
        assert_eq!(parsed.options.len(), MAX_OPTIONS);
        assert_eq!(parsed.options.get("option30").map(String::as_str), Some("late"));
        assert_eq!(parsed.options.get("option49").map(String::as_str), Some("b18"));
    }

    #[test]
    fn fewer_than_two_options_is_rejected() {
        assert_eq!(
            parse_sections("[A]\nonly"),
            Err(ValidationError::TooFewOptions { found: 1 })
        );
        assert_eq!(
            parse_sections("[A]\n[B]"),
            Err(ValidationError::TooFewOptions { found: 0 })
        );
    }

    #[test]
    fn options_past_the_cap_get_no_key() {
        let text: String = (0..60).map(|i| format!("opt {}\n", i)).collect();
        let parsed = parse_sections(&text).unwrap();
        assert_eq!(parsed.options.len(), MAX_OPTIONS);
        assert_eq!(parsed.options.get("option49").map(String::as_str), Some("opt 49"));
        assert!(!parsed.options.contains_key("option50"));
        assert_eq!(section(&parsed, DEFAULT_SECTION).len(), 60);
    }

    #[test]
    fn duration_defaults_and_clamps() {
        assert_eq!(parse_duration_days(None), Ok(DEFAULT_DURATION_DAYS));
        assert_eq!(parse_duration_days(Some("  ")), Ok(DEFAULT_DURATION_DAYS));
        assert_eq!(parse_duration_days(Some("5")), Ok(5));
        assert_eq!(parse_duration_days(Some("0")), Ok(1));
        assert_eq!(parse_duration_days(Some("-3")), Ok(1));
        assert_eq!(parse_duration_days(Some("90")), Ok(30));
    }

    #[test]
    fn malformed_duration_is_rejected() {
        assert_eq!(
            parse_duration_days(Some("two")),
            Err(ValidationError::MalformedDuration("two".into()))
        );
    }

    #[test]
    fn role_list_is_normalized() {
        assert_eq!(parse_role_list(" Miembro, RAIDER ,, "), vec!["miembro", "raider"]);
        assert!(parse_role_list("").is_empty());
    }
}
