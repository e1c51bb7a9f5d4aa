//! Advisory notices for the reporting sink

use serde::{Deserialize, Serialize};

/// A non-fatal notice raised during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Advisory {
    /// Header metadata problem found while reading the program
    HeaderWarning { message: String },
    /// A removed move had no feed rate; its time estimate used the default
    DefaultFeedRateUsed { default_feed: f64 },
    /// The program never programs a feed rate
    NoFeedRateSpecified,
    /// A line the parser rejected was dropped from the output
    MalformedLine { line_number: usize, reason: String },
    /// A crossing move could not be split and was kept whole
    ///
    /// Not raised for a move that only touches the threshold at an end
    /// point. Such a move has nothing to split and is kept silently.
    GeometryFallback { line_number: Option<usize>, reason: String },
    /// The multi-axis `split` strategy fell back to `safe`
    SplitDecompositionUnsupported,
    /// Incremental positioning (G91) was seen; depths assume absolute mode
    IncrementalPositioning { line_number: Option<usize> },
}

impl Advisory {
    /// Whether at most one of this notice is reported per run
    pub fn is_one_time(&self) -> bool {
        matches!(
            self,
            Self::DefaultFeedRateUsed { .. }
                | Self::NoFeedRateSpecified
                | Self::SplitDecompositionUnsupported
                | Self::IncrementalPositioning { .. }
        )
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderWarning { message } => write!(f, "{}", message),
            Self::DefaultFeedRateUsed { default_feed } => write!(
                f,
                "No feed rate in effect for some removed moves; time saved estimated at {} mm/min",
                default_feed
            ),
            Self::NoFeedRateSpecified => write!(f, "No feed rate specified anywhere in the program"),
            Self::MalformedLine {
                line_number,
                reason,
            } => write!(f, "Skipping malformed line {}: {}", line_number, reason),
            Self::GeometryFallback {
                line_number: Some(line),
                reason,
            } => write!(f, "Could not split line {}, kept whole: {}", line, reason),
            Self::GeometryFallback {
                line_number: None,
                reason,
            } => write!(f, "Could not split move, kept whole: {}", reason),
            Self::SplitDecompositionUnsupported => write!(
                f,
                "Multi-axis strategy 'split' is not implemented; behaving like 'safe'"
            ),
            Self::IncrementalPositioning { line_number } => match line_number {
                Some(line) => write!(
                    f,
                    "Incremental positioning (G91) at line {}; depths are treated as absolute",
                    line
                ),
                None => write!(
                    f,
                    "Incremental positioning (G91) found; depths are treated as absolute"
                ),
            },
        }
    }
}

/// Ordered collection of advisories with one-time deduplication
#[derive(Debug, Clone, Default)]
pub struct AdvisoryLog {
    entries: Vec<Advisory>,
}

impl AdvisoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notice and log it
    ///
    /// One-time notices are dropped if one of the same kind was already
    /// recorded.
    pub fn push(&mut self, advisory: Advisory) {
        if advisory.is_one_time()
            && self
                .entries
                .iter()
                .any(|existing| std::mem::discriminant(existing) == std::mem::discriminant(&advisory))
        {
            return;
        }
        tracing::warn!("{}", advisory);
        self.entries.push(advisory);
    }

    pub fn entries(&self) -> &[Advisory] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Advisory> {
        self.entries
    }
}
