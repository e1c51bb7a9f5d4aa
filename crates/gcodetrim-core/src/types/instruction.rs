//! Instruction model
//!
//! One [`Instruction`] per program line. Instructions are immutable once
//! built: the optimizer never edits one in place, a split produces new ones.

use serde::{Deserialize, Serialize};

use super::params::{Axis, AxisSet, Param, ParamSet};

/// Decimal places kept when writing computed coordinates
pub const OUTPUT_DECIMALS: i32 = 4;

/// Round a value to [`OUTPUT_DECIMALS`] places
pub fn round_output(value: f64) -> f64 {
    let multiplier = 10_f64.powi(OUTPUT_DECIMALS);
    (value * multiplier).round() / multiplier
}

/// Format a number in its shortest form with at most four decimals
///
/// `-0` is written as `0`.
pub fn format_number(value: f64) -> String {
    let mut text = format!("{:.*}", OUTPUT_DECIMALS as usize, value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Letter of an operation word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpLetter {
    /// Preparatory (motion, modes)
    G,
    /// Machine control
    M,
    /// Tool select
    T,
}

impl OpLetter {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'G' => Some(Self::G),
            'M' => Some(Self::M),
            'T' => Some(Self::T),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::G => 'G',
            Self::M => 'M',
            Self::T => 'T',
        }
    }
}

/// An operation word such as `G1`, `G38.2` or `M3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub letter: OpLetter,
    pub code: u16,
    pub subcode: Option<u16>,
}

impl Operation {
    pub const fn new(letter: OpLetter, code: u16) -> Self {
        Self {
            letter,
            code,
            subcode: None,
        }
    }

    /// `G<code>`
    pub const fn g(code: u16) -> Self {
        Self::new(OpLetter::G, code)
    }

    /// `M<code>`
    pub const fn m(code: u16) -> Self {
        Self::new(OpLetter::M, code)
    }

    fn is_g(&self, code: u16) -> bool {
        self.letter == OpLetter::G && self.code == code && self.subcode.is_none()
    }

    /// G0 rapid positioning
    pub fn is_rapid(&self) -> bool {
        self.is_g(0)
    }

    /// G1 linear feed move
    pub fn is_linear(&self) -> bool {
        self.is_g(1)
    }

    /// G0-G3 motion word
    pub fn is_motion(&self) -> bool {
        self.letter == OpLetter::G && self.code <= 3 && self.subcode.is_none()
    }

    /// Straight-line move that can change depth (G0 or G1)
    pub fn is_depth_motion(&self) -> bool {
        self.is_rapid() || self.is_linear()
    }

    pub fn is_machine_code(&self) -> bool {
        self.letter == OpLetter::M
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.subcode {
            Some(sub) => write!(f, "{}{}.{}", self.letter.letter(), self.code, sub),
            None => write!(f, "{}{}", self.letter.letter(), self.code),
        }
    }
}

/// Kind of straight-line move, distinguished by whether a feed rate applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionKind {
    /// G0, no feed rate
    Rapid,
    /// G1, moves at the active feed rate
    Linear,
}

impl MotionKind {
    pub fn of(operation: &Operation) -> Option<Self> {
        if operation.is_rapid() {
            Some(Self::Rapid)
        } else if operation.is_linear() {
            Some(Self::Linear)
        } else {
            None
        }
    }

    pub fn uses_feed(self) -> bool {
        matches!(self, Self::Linear)
    }

    pub fn operation(self) -> Operation {
        match self {
            Self::Rapid => Operation::g(0),
            Self::Linear => Operation::g(1),
        }
    }
}

/// One line of a machine program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Primary operation (the motion word when present)
    pub operation: Option<Operation>,
    /// Further G/M words on the same line
    pub extra_codes: Vec<Operation>,
    /// Parameter words
    pub params: ParamSet,
    /// Trailing annotation, including its delimiter (`; text` or `(text)`)
    pub comment: Option<String>,
    /// Line number in the source program (1-based)
    pub line_number: Option<usize>,
    /// Raw source text for parsed lines; `None` for synthesized instructions
    pub source: Option<String>,
}

impl Instruction {
    /// Create a synthesized instruction
    pub fn new(operation: Option<Operation>, params: ParamSet) -> Self {
        Self {
            operation,
            params,
            ..Self::default()
        }
    }

    /// Blank line
    pub fn blank() -> Self {
        Self::default()
    }

    /// Comment-only line
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            comment: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// No operation, no words and no annotation
    pub fn is_blank(&self) -> bool {
        self.operation.is_none() && self.params.is_empty() && self.comment.is_none()
    }

    /// Annotation only
    pub fn is_comment_only(&self) -> bool {
        self.operation.is_none() && self.params.is_empty() && self.comment.is_some()
    }

    /// Explicit G0 or G1
    pub fn is_depth_motion(&self) -> bool {
        self.operation.is_some_and(|op| op.is_depth_motion())
    }

    /// Explicit G1
    pub fn is_linear(&self) -> bool {
        self.operation.is_some_and(|op| op.is_linear())
    }

    pub fn motion_kind(&self) -> Option<MotionKind> {
        self.operation.as_ref().and_then(MotionKind::of)
    }

    pub fn param(&self, param: Param) -> Option<f64> {
        self.params.get(param)
    }

    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.params.axis(axis)
    }

    /// Axes explicitly written on this line
    pub fn axes(&self) -> AxisSet {
        self.params.axes()
    }

    pub fn feed_rate(&self) -> Option<f64> {
        self.params.get(Param::F)
    }
}

/// Canonical text form, used for synthesized instructions
impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut words: Vec<String> = Vec::new();
        if let Some(n) = self.params.get(Param::N) {
            words.push(format!("N{}", format_number(n)));
        }
        if let Some(op) = &self.operation {
            words.push(op.to_string());
        }
        words.extend(self.extra_codes.iter().map(Operation::to_string));
        words.extend(
            self.params
                .iter()
                .filter(|(param, _)| *param != Param::N)
                .map(|(param, value)| format!("{}{}", param.letter(), format_number(value))),
        );
        if let Some(comment) = &self.comment {
            words.push(comment.clone());
        }
        write!(f, "{}", words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_trims_zeros() {
        assert_eq!(format_number(-9.0), "-9");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(0.123456), "0.1235");
        assert_eq!(format_number(-0.00001), "0");
        assert_eq!(format_number(800.0), "800");
    }

    #[test]
    fn test_round_output() {
        assert_eq!(round_output(1.23456), 1.2346);
        assert_eq!(round_output(-9.0), -9.0);
    }

    #[test]
    fn test_operation_predicates() {
        assert!(Operation::g(0).is_rapid());
        assert!(Operation::g(1).is_linear());
        assert!(Operation::g(1).is_depth_motion());
        assert!(!Operation::g(2).is_depth_motion());
        assert!(Operation::g(2).is_motion());
        assert!(Operation::m(3).is_machine_code());

        let subcoded = Operation {
            letter: OpLetter::G,
            code: 38,
            subcode: Some(2),
        };
        assert_eq!(subcoded.to_string(), "G38.2");
        assert!(!subcoded.is_motion());
    }

    #[test]
    fn test_display_canonical_order() {
        let params = ParamSet::new()
            .with(Param::F, 800.0)
            .with(Param::Z, -9.0)
            .with(Param::X, 1.23456);
        let instruction =
            Instruction::new(Some(Operation::g(1)), params).with_comment("; finish");
        assert_eq!(instruction.to_string(), "G1 X1.2346 Z-9 F800 ; finish");
    }

    #[test]
    fn test_blank_and_comment() {
        assert!(Instruction::blank().is_blank());
        assert_eq!(Instruction::blank().to_string(), "");

        let comment = Instruction::comment(";header");
        assert!(comment.is_comment_only());
        assert!(!comment.is_blank());
        assert!(!comment.is_depth_motion());
    }

    #[test]
    fn test_motion_kind() {
        let rapid = Instruction::new(Some(Operation::g(0)), ParamSet::new());
        assert_eq!(rapid.motion_kind(), Some(MotionKind::Rapid));
        assert!(!MotionKind::Rapid.uses_feed());

        let arc = Instruction::new(Some(Operation::g(2)), ParamSet::new());
        assert_eq!(arc.motion_kind(), None);
    }
}
