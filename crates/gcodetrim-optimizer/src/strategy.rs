//! Strategy engine
//!
//! Two independent policies decide what happens to a classified move:
//!
//! - [`CrossingStrategy`] handles moves that cross the threshold
//! - [`MultiAxisStrategy`] handles shallow moves that also move a
//!   horizontal or rotary axis
//!
//! [`StrategyEngine`] composes the two. Every strategy is a pure function of
//! the classification and the axes written on the line.

use std::str::FromStr;

use gcodetrim_core::{AxisSet, ConfigError};
use serde::{Deserialize, Serialize};

use crate::classify::MoveClassification;

/// What to do with a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Drop the move
    Remove,
    /// Emit the move unchanged
    PreserveWhole,
    /// Replace the move with the segments at or below the threshold
    Split,
}

/// A move-handling policy
pub trait Strategy {
    /// Identifier used in configuration
    fn name(&self) -> &'static str;

    /// One-line description for help output
    fn description(&self) -> &'static str;

    /// Decide the action for a classified move
    ///
    /// `axes` is the set of axis words written on the line.
    fn decide(&self, classification: MoveClassification, axes: AxisSet) -> Action;
}

/// Handling of moves that cross the threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossingStrategy {
    /// Keep crossing moves whole
    Conservative,
    /// Split crossing moves at the threshold
    #[default]
    Aggressive,
}

impl CrossingStrategy {
    pub const ALL: [CrossingStrategy; 2] = [Self::Conservative, Self::Aggressive];

    /// Accepted identifiers
    pub const VARIANTS: &'static [&'static str] = &["conservative", "aggressive"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
        }
    }
}

impl FromStr for CrossingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| ConfigError::InvalidStrategy {
                kind: "crossing",
                value: s.to_string(),
                valid: Self::VARIANTS,
            })
    }
}

impl std::fmt::Display for CrossingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Strategy for CrossingStrategy {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Conservative => "keep moves that cross the threshold whole",
            Self::Aggressive => "split moves at the threshold and drop the shallow part",
        }
    }

    fn decide(&self, classification: MoveClassification, _axes: AxisSet) -> Action {
        match classification {
            MoveClassification::Shallow => Action::Remove,
            MoveClassification::Deep | MoveClassification::NonMotion => Action::PreserveWhole,
            MoveClassification::CrossingEnter | MoveClassification::CrossingLeave => match self {
                Self::Conservative => Action::PreserveWhole,
                Self::Aggressive => Action::Split,
            },
        }
    }
}

/// Handling of shallow moves that also move a non-depth axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiAxisStrategy {
    /// Keep a shallow move if it writes any non-depth axis
    #[default]
    Safe,
    /// Filter on depth alone
    AllAxes,
    /// Decompose into single-axis moves; not supported, behaves like `Safe`
    Split,
    /// Filter on depth alone
    Aggressive,
}

impl MultiAxisStrategy {
    pub const ALL: [MultiAxisStrategy; 4] = [Self::Safe, Self::AllAxes, Self::Split, Self::Aggressive];

    /// Accepted identifiers
    pub const VARIANTS: &'static [&'static str] = &["safe", "all-axes", "split", "aggressive"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::AllAxes => "all-axes",
            Self::Split => "split",
            Self::Aggressive => "aggressive",
        }
    }

    /// Whether this strategy falls back to `Safe` behaviour
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Split)
    }
}

impl FromStr for MultiAxisStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| ConfigError::InvalidStrategy {
                kind: "multi-axis",
                value: s.to_string(),
                valid: Self::VARIANTS,
            })
    }
}

impl std::fmt::Display for MultiAxisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Strategy for MultiAxisStrategy {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Safe => "keep shallow moves that also move X, Y or a rotary axis",
            Self::AllAxes => "remove shallow moves regardless of other axes",
            Self::Split => "decompose multi-axis moves (unsupported, behaves like safe)",
            Self::Aggressive => "remove every shallow move",
        }
    }

    /// Only shallow moves are affected; crossing moves are left whole here
    /// and decided by the crossing strategy.
    fn decide(&self, classification: MoveClassification, axes: AxisSet) -> Action {
        match classification {
            MoveClassification::Shallow => match self {
                Self::Safe | Self::Split if axes.has_non_depth_axis() => Action::PreserveWhole,
                _ => Action::Remove,
            },
            _ => Action::PreserveWhole,
        }
    }
}

/// Combined policy applied by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyEngine {
    pub crossing: CrossingStrategy,
    pub multi_axis: MultiAxisStrategy,
}

impl StrategyEngine {
    pub fn new(crossing: CrossingStrategy, multi_axis: MultiAxisStrategy) -> Self {
        Self {
            crossing,
            multi_axis,
        }
    }
}

impl Strategy for StrategyEngine {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn description(&self) -> &'static str {
        "crossing strategy for crossing moves, multi-axis strategy for shallow moves"
    }

    fn decide(&self, classification: MoveClassification, axes: AxisSet) -> Action {
        match classification {
            MoveClassification::Shallow => self.multi_axis.decide(classification, axes),
            MoveClassification::CrossingEnter | MoveClassification::CrossingLeave => {
                self.crossing.decide(classification, axes)
            }
            MoveClassification::Deep | MoveClassification::NonMotion => Action::PreserveWhole,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodetrim_core::Axis;

    const ALL_CLASSES: [MoveClassification; 5] = [
        MoveClassification::Shallow,
        MoveClassification::Deep,
        MoveClassification::CrossingEnter,
        MoveClassification::CrossingLeave,
        MoveClassification::NonMotion,
    ];

    fn z_only() -> AxisSet {
        AxisSet::empty().with(Axis::Z)
    }

    fn xz() -> AxisSet {
        AxisSet::empty().with(Axis::X).with(Axis::Z)
    }

    #[test]
    fn test_crossing_strategies() {
        for strategy in CrossingStrategy::ALL {
            assert_eq!(strategy.decide(MoveClassification::Shallow, z_only()), Action::Remove);
            assert_eq!(
                strategy.decide(MoveClassification::Deep, z_only()),
                Action::PreserveWhole
            );
            assert_eq!(
                strategy.decide(MoveClassification::NonMotion, AxisSet::empty()),
                Action::PreserveWhole
            );
        }

        let conservative = CrossingStrategy::Conservative;
        let aggressive = CrossingStrategy::Aggressive;
        for crossing in [MoveClassification::CrossingEnter, MoveClassification::CrossingLeave] {
            assert_eq!(conservative.decide(crossing, z_only()), Action::PreserveWhole);
            assert_eq!(aggressive.decide(crossing, z_only()), Action::Split);
        }
    }

    #[test]
    fn test_multi_axis_strategies_on_shallow_moves() {
        let shallow = MoveClassification::Shallow;

        assert_eq!(MultiAxisStrategy::Safe.decide(shallow, xz()), Action::PreserveWhole);
        assert_eq!(MultiAxisStrategy::Split.decide(shallow, xz()), Action::PreserveWhole);
        assert_eq!(MultiAxisStrategy::AllAxes.decide(shallow, xz()), Action::Remove);
        assert_eq!(MultiAxisStrategy::Aggressive.decide(shallow, xz()), Action::Remove);

        for strategy in MultiAxisStrategy::ALL {
            assert_eq!(strategy.decide(shallow, z_only()), Action::Remove);
        }
    }

    #[test]
    fn test_rotary_axis_counts_as_other_axis() {
        let axes = AxisSet::empty().with(Axis::B).with(Axis::Z);
        assert_eq!(
            MultiAxisStrategy::Safe.decide(MoveClassification::Shallow, axes),
            Action::PreserveWhole
        );
    }

    #[test]
    fn test_engine_routes_by_classification() {
        let engine = StrategyEngine::new(CrossingStrategy::Aggressive, MultiAxisStrategy::Safe);
        assert_eq!(engine.decide(MoveClassification::Shallow, xz()), Action::PreserveWhole);
        assert_eq!(engine.decide(MoveClassification::Shallow, z_only()), Action::Remove);
        assert_eq!(engine.decide(MoveClassification::CrossingEnter, xz()), Action::Split);
        assert_eq!(engine.decide(MoveClassification::Deep, xz()), Action::PreserveWhole);

        let engine = StrategyEngine::new(CrossingStrategy::Conservative, MultiAxisStrategy::AllAxes);
        assert_eq!(engine.decide(MoveClassification::Shallow, xz()), Action::Remove);
        assert_eq!(
            engine.decide(MoveClassification::CrossingLeave, xz()),
            Action::PreserveWhole
        );
    }

    #[test]
    fn test_engine_never_removes_deep_or_non_motion() {
        for crossing in CrossingStrategy::ALL {
            for multi_axis in MultiAxisStrategy::ALL {
                let engine = StrategyEngine::new(crossing, multi_axis);
                for class in ALL_CLASSES {
                    let action = engine.decide(class, xz());
                    if matches!(class, MoveClassification::Deep | MoveClassification::NonMotion) {
                        assert_eq!(action, Action::PreserveWhole);
                    }
                    if action == Action::Split {
                        assert!(class.is_crossing());
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_strategies() {
        assert_eq!(
            " Conservative ".parse::<CrossingStrategy>().unwrap(),
            CrossingStrategy::Conservative
        );
        assert_eq!(
            "ALL-AXES".parse::<MultiAxisStrategy>().unwrap(),
            MultiAxisStrategy::AllAxes
        );

        let err = "fast".parse::<MultiAxisStrategy>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid multi-axis strategy 'fast' (valid: safe, all-axes, split, aggressive)"
        );
        let err = "".parse::<CrossingStrategy>().unwrap_err();
        assert!(err.to_string().contains("conservative, aggressive"));
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&MultiAxisStrategy::AllAxes).unwrap();
        assert_eq!(json, "\"all-axes\"");
        let parsed: CrossingStrategy = serde_json::from_str("\"conservative\"").unwrap();
        assert_eq!(parsed, CrossingStrategy::Conservative);
    }
}
