//! Scenario model
//!
//! Builds a [`Feature`] from raw text in one forward pass. The pass keeps a
//! [`ParseContext`] holding the current scenario node, the collection mode
//! and the growing scenario list. Scenario outlines are expanded into
//! ordinary scenarios as each example row is read, so the execution engine
//! only ever sees [`Scenario`] values.

use std::fmt;

use indexmap::IndexMap;

use crate::error::FeatureError;
use crate::parser::{classify_line, LineKind, StepLine};

/// One row of a step table: column name to cell value, in column order.
pub type TableRow = IndexMap<String, String>;

/// Outcome recorded on a step once it has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Failed,
    Pending,
    Skipped,
    Undefined,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Pending => "pending",
            StepStatus::Skipped => "skipped",
            StepStatus::Undefined => "undefined",
        };
        f.write_str(s)
    }
}

/// A single step of a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Step body with the keyword stripped, used for matching
    pub text: String,
    /// Trimmed original line, used for reporting
    pub orig: String,
    /// 1-based line number in the document, 0 if not parsed from text
    pub line: usize,
    /// Header row of the attached table, empty if none
    pub keys: Vec<String>,
    /// Data rows of the attached table
    pub table: Vec<TableRow>,
    /// Outcome of the last run, if any
    pub status: Option<StepStatus>,
    /// Diagnostics written while the step ran
    pub errors: String,
}

impl Step {
    pub fn new(text: impl Into<String>, orig: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            orig: orig.into(),
            ..Default::default()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(StepStatus::Pending)
    }

    fn from_line(parsed: StepLine, line: usize) -> Self {
        Self {
            line,
            ..Self::new(parsed.text, parsed.orig)
        }
    }

    /// Attach one raw table row: the first becomes the header, later rows
    /// must match its width.
    fn add_table_row(&mut self, cells: Vec<String>, raw: &str) -> Result<(), FeatureError> {
        if self.keys.is_empty() {
            self.keys = cells;
            return Ok(());
        }
        let row = table_row(&self.keys, cells, raw)?;
        self.table.push(row);
        Ok(())
    }
}

/// An ordinary, executable scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    /// Trimmed heading line, e.g. `Scenario: login`
    pub heading: String,
    pub steps: Vec<Step>,
    pub is_background: bool,
    /// The example row this scenario was expanded from, if any
    pub example: Option<TableRow>,
}

impl Scenario {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            ..Default::default()
        }
    }

    pub fn background(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            is_background: true,
            ..Default::default()
        }
    }

    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn last_step_mut(&mut self) -> Option<&mut Step> {
        self.steps.last_mut()
    }
}

/// A templated scenario, expanded once per example row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioOutline {
    pub heading: String,
    /// Template steps; text may contain `<placeholder>` tokens
    pub steps: Vec<Step>,
    /// Column names from the current `Examples:` block
    pub keys: Option<Vec<String>>,
}

impl ScenarioOutline {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            ..Default::default()
        }
    }

    /// Build one concrete scenario by substituting `<key>` tokens with the
    /// row's values. Unknown placeholders are left as written.
    pub fn expand(&self, example: &TableRow) -> Scenario {
        let steps = self
            .steps
            .iter()
            .map(|template| {
                let table: Vec<TableRow> = template
                    .table
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|(k, v)| (k.clone(), substitute(v, example)))
                            .collect::<TableRow>()
                    })
                    .collect();
                Step {
                    text: substitute(&template.text, example),
                    orig: substitute(&template.orig, example),
                    line: template.line,
                    keys: template.keys.clone(),
                    table,
                    ..Default::default()
                }
            })
            .collect();

        Scenario {
            heading: self.heading.clone(),
            steps,
            is_background: false,
            example: Some(example.clone()),
        }
    }
}

/// Replace each `<key>` token in `template` with `values[key]`.
///
/// Single pass: substituted text is not scanned again.
pub fn substitute(template: &str, values: &TableRow) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['<', '>']) {
            Some(close) if after.as_bytes()[close] == b'>' => {
                let key = &after[..close];
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('<');
                        out.push_str(key);
                        out.push('>');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Tagged scenario variant produced while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioNode {
    Ordinary(Scenario),
    Outline(ScenarioOutline),
}

impl ScenarioNode {
    fn add_step(&mut self, step: Step) {
        match self {
            ScenarioNode::Ordinary(s) => s.add_step(step),
            ScenarioNode::Outline(o) => o.steps.push(step),
        }
    }

    fn last_step_mut(&mut self) -> Option<&mut Step> {
        match self {
            ScenarioNode::Ordinary(s) => s.last_step_mut(),
            ScenarioNode::Outline(o) => o.steps.last_mut(),
        }
    }
}

/// A parsed feature document, ready to execute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feature {
    /// Label from the `Feature:` heading, if present
    pub label: Option<String>,
    /// The document's background, replayed before each scenario
    pub background: Option<Scenario>,
    /// Ordinary scenarios in document order, outlines already expanded
    pub scenarios: Vec<Scenario>,
}

/// Which structure subsequent lines feed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Examples,
}

/// Where the "current scenario" pointer is aimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    Background,
    /// Index into `ParseContext::nodes`
    Node(usize),
}

/// State threaded through the line-by-line assembly loop
struct ParseContext {
    label: Option<String>,
    background: Option<Scenario>,
    /// Ordinary scenarios and expansions, in the order they were produced.
    /// Outlines stay in the list as templates and are dropped at the end.
    nodes: Vec<ScenarioNode>,
    current: Current,
    mode: Mode,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            label: None,
            background: None,
            nodes: Vec::new(),
            current: Current::None,
            mode: Mode::Normal,
        }
    }

    fn start(&mut self, node: ScenarioNode) {
        self.nodes.push(node);
        self.current = Current::Node(self.nodes.len() - 1);
        self.mode = Mode::Normal;
    }

    fn current_outline_mut(&mut self) -> Option<&mut ScenarioOutline> {
        match self.current {
            Current::Node(i) => match self.nodes.get_mut(i) {
                Some(ScenarioNode::Outline(o)) => Some(o),
                _ => None,
            },
            _ => None,
        }
    }

    fn current_step_mut(&mut self) -> Option<&mut Step> {
        match self.current {
            Current::None => None,
            Current::Background => self.background.as_mut().and_then(|b| b.last_step_mut()),
            Current::Node(i) => self.nodes.get_mut(i).and_then(|n| n.last_step_mut()),
        }
    }

    fn add_step(&mut self, step: Step) {
        match self.current {
            Current::None => {}
            Current::Background => {
                if let Some(bg) = self.background.as_mut() {
                    bg.add_step(step);
                }
            }
            Current::Node(i) => {
                if let Some(node) = self.nodes.get_mut(i) {
                    node.add_step(step);
                }
            }
        }
    }

    fn line(&mut self, raw: &str, line_number: usize) -> Result<(), FeatureError> {
        match classify_line(raw) {
            LineKind::Step(step) if self.current != Current::None => {
                self.add_step(Step::from_line(step, line_number));
            }
            LineKind::Step(step) => {
                tracing::debug!(line = line_number, step = %step.orig, "step outside any scenario ignored");
            }
            LineKind::ScenarioOutline(_) => {
                self.start(ScenarioNode::Outline(ScenarioOutline::new(raw.trim())));
            }
            LineKind::Scenario(_) => {
                self.start(ScenarioNode::Ordinary(Scenario::new(raw.trim())));
            }
            LineKind::Feature(label) => {
                self.label = Some(label);
            }
            LineKind::Background(_) => {
                if self.background.is_some() {
                    tracing::debug!(line = line_number, "background replaced by a later Background:");
                }
                self.background = Some(Scenario::background(raw.trim()));
                self.current = Current::Background;
                self.mode = Mode::Normal;
            }
            LineKind::Examples(_) => {
                self.mode = Mode::Examples;
                match self.current_outline_mut() {
                    Some(outline) => outline.keys = None,
                    None => {
                        tracing::warn!(line = line_number, "Examples: outside a Scenario Outline")
                    }
                }
            }
            LineKind::TableRow(cells) if self.mode == Mode::Examples => {
                self.example_row(cells, raw, line_number)?;
            }
            LineKind::TableRow(cells) => {
                if let Some(step) = self.current_step_mut() {
                    step.add_table_row(cells, raw)
                        .map_err(|e| e.with_line(line_number))?;
                }
            }
            LineKind::Unrecognized => {}
        }
        Ok(())
    }

    fn example_row(
        &mut self,
        cells: Vec<String>,
        raw: &str,
        line_number: usize,
    ) -> Result<(), FeatureError> {
        let Some(outline) = self.current_outline_mut() else {
            tracing::warn!(line = line_number, "example row ignored, no current Scenario Outline");
            return Ok(());
        };
        let keys = match outline.keys {
            Some(ref keys) => keys,
            None => {
                outline.keys = Some(cells);
                return Ok(());
            }
        };
        let example = table_row(keys, cells, raw).map_err(|e| e.with_line(line_number))?;
        let scenario = outline.expand(&example);
        tracing::debug!(line = line_number, heading = %scenario.heading, "expanded outline example");
        self.nodes.push(ScenarioNode::Ordinary(scenario));
        Ok(())
    }

    fn finish(self) -> Feature {
        let scenarios = self
            .nodes
            .into_iter()
            .filter_map(|node| match node {
                ScenarioNode::Ordinary(s) => Some(s),
                ScenarioNode::Outline(_) => None,
            })
            .collect();
        Feature {
            label: self.label,
            background: self.background,
            scenarios,
        }
    }
}

/// Zip header cells with row cells, failing on a width mismatch.
fn table_row(keys: &[String], cells: Vec<String>, raw: &str) -> Result<TableRow, FeatureError> {
    if cells.len() != keys.len() {
        return Err(FeatureError::malformed_table(keys.len(), cells.len(), raw));
    }
    Ok(keys.iter().cloned().zip(cells).collect())
}

/// Parse a feature document into its model.
///
/// Malformed tables are fatal and reported with their line number.
pub fn parse_feature(text: &str) -> Result<Feature, FeatureError> {
    let mut ctx = ParseContext::new();
    for (i, line) in text.lines().enumerate() {
        ctx.line(line, i + 1)?;
    }
    Ok(ctx.finish())
}
