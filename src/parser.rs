//! Feature line classifier
//!
//! Classifies one line of a feature document:
//! - `Feature:`, `Scenario:`, `Scenario Outline:`, `Examples:` and
//!   `Background:` headings, optionally indented; the text after the colon
//!   is kept as a display label
//! - step lines starting with `Given`, `When`, `Then`, `And`, `But` or `*`
//!   followed by whitespace; the keyword is stripped for matching while the
//!   trimmed original line is kept for reporting
//! - `|`-delimited table rows, split into trimmed cells
//!
//! Anything else is [`LineKind::Unrecognized`] and ignored by the assembler.

use std::sync::OnceLock;

use regex::Regex;

/// The classification of a single feature line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `Feature: <label>`
    Feature(String),
    /// `Scenario: <label>`
    Scenario(String),
    /// `Scenario Outline: <label>`
    ScenarioOutline(String),
    /// `Examples: <label>`
    Examples(String),
    /// `Background: <label>`
    Background(String),
    /// A keyword-prefixed step
    Step(StepLine),
    /// A `|`-delimited table row
    TableRow(Vec<String>),
    /// Blank, free text, or anything this grammar does not cover
    Unrecognized,
}

/// A step line with its keyword stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    /// The keyword that introduced the step (`Given`, `*`, ...)
    pub keyword: String,
    /// Step body, used for matching against step definitions
    pub text: String,
    /// The whole trimmed line, used for reporting
    pub orig: String,
}

fn step_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(Given|When|Then|And|But|\*)\s+(.*?)\s*$").expect("step regex")
    })
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\|.*\|\s*$").expect("table regex"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Alternation order matters: "Scenario Outline" must win over "Scenario".
    RE.get_or_init(|| {
        Regex::new(r"^\s*(Scenario Outline|Scenario|Feature|Background|Examples):\s*(.*?)\s*$")
            .expect("heading regex")
    })
}

/// Classify a single line.
///
/// Step detection runs first, so a keyword-prefixed line is always a step.
pub fn classify_line(line: &str) -> LineKind {
    if let Some(step) = parse_step(line) {
        return LineKind::Step(step);
    }

    if let Some(caps) = heading_re().captures(line) {
        let label = caps[2].to_string();
        return match &caps[1] {
            "Scenario Outline" => LineKind::ScenarioOutline(label),
            "Scenario" => LineKind::Scenario(label),
            "Feature" => LineKind::Feature(label),
            "Background" => LineKind::Background(label),
            _ => LineKind::Examples(label),
        };
    }

    match parse_table_row(line) {
        Some(cells) => LineKind::TableRow(cells),
        None => LineKind::Unrecognized,
    }
}

/// Parse a step line, returning `None` if the line has no step keyword.
pub fn parse_step(line: &str) -> Option<StepLine> {
    let caps = step_re().captures(line)?;
    Some(StepLine {
        keyword: caps[1].to_string(),
        text: caps[2].to_string(),
        orig: line.trim().to_string(),
    })
}

/// Split a `|a|b|` table row into trimmed cells.
///
/// Returns `None` if the line is not framed by a leading and trailing `|`.
pub fn parse_table_row(line: &str) -> Option<Vec<String>> {
    if !table_re().is_match(line) {
        return None;
    }
    let inner = line.trim();
    let inner = &inner[1..inner.len() - 1];
    let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();
    if cells.is_empty() {
        return None;
    }
    Some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn step(line: &str) -> StepLine {
        match classify_line(line) {
            LineKind::Step(s) => s,
            other => panic!("expected step, got {:?}", other),
        }
    }

    #[rstest]
    #[case("Given the first setup", "Given", "the first setup")]
    #[case("    When the first action", "When", "the first action")]
    #[case("Then the first result", "Then", "the first result")]
    #[case("And the other second result", "And", "the other second result")]
    #[case("But not the other first result", "But", "not the other first result")]
    #[case("* the third setup", "*", "the third setup")]
    #[case("When     the third action has leading spaces", "When", "the third action has leading spaces")]
    #[case("When trailing spaces      ", "When", "trailing spaces")]
    fn test_step_keyword_stripped(#[case] line: &str, #[case] keyword: &str, #[case] text: &str) {
        let s = step(line);
        assert_eq!(s.keyword, keyword);
        assert_eq!(s.text, text);
        assert_eq!(s.orig, line.trim());
    }

    #[rstest]
    #[case("Givenno space")]
    #[case("Given")]
    #[case("given lowercase")]
    #[case("This is ignored")]
    fn test_not_a_step(#[case] line: &str) {
        assert!(parse_step(line).is_none());
    }

    #[rstest]
    #[case("Feature: My Feature", LineKind::Feature("My Feature".into()))]
    #[case("  Scenario: Scenario 1", LineKind::Scenario("Scenario 1".into()))]
    #[case("Scenario Outline: eating", LineKind::ScenarioOutline("eating".into()))]
    #[case("\tExamples:", LineKind::Examples(String::new()))]
    #[case("Background:  shared  ", LineKind::Background("shared".into()))]
    #[case("Scenario:", LineKind::Scenario(String::new()))]
    fn test_headings(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(classify_line(line), expected);
    }

    #[test]
    fn test_table_row_cells_trimmed() {
        assert_eq!(
            classify_line("        |Bob |bob@bob.com|"),
            LineKind::TableRow(vec!["Bob".into(), "bob@bob.com".into()])
        );
    }

    #[test]
    fn test_table_row_requires_both_pipes() {
        assert_eq!(classify_line("|name|email"), LineKind::Unrecognized);
        assert_eq!(classify_line("name|email|"), LineKind::Unrecognized);
        assert_eq!(classify_line("|"), LineKind::Unrecognized);
    }

    #[test]
    fn test_table_row_keeps_empty_cells() {
        assert_eq!(
            parse_table_row("| a || c |"),
            Some(vec!["a".into(), String::new(), "c".into()])
        );
    }

    #[test]
    fn test_blank_and_free_text_unrecognized() {
        assert_eq!(classify_line(""), LineKind::Unrecognized);
        assert_eq!(classify_line("   "), LineKind::Unrecognized);
        assert_eq!(classify_line("As a user I want things"), LineKind::Unrecognized);
    }

    #[test]
    fn test_step_wins_over_heading_words() {
        let s = step("Given Scenario: is just text here");
        assert_eq!(s.text, "Scenario: is just text here");
    }
}
