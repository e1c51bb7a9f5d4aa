//! Two-pass optimization engine
//!
//! Pass 1 resolves the depth threshold over the whole program with its own
//! modal tracker. Pass 2 walks the program again with a fresh tracker,
//! classifies every line, applies the strategy and hands the surviving
//! instructions to the sink in order.

use std::time::Instant;

use gcodetrim_core::{
    ConfigError, Instruction, InstructionSink, OpLetter, Operation, Param, ParamSet, Program,
    ProgramLine, Result,
};
use serde::{Deserialize, Serialize};

use crate::advisory::{Advisory, AdvisoryLog};
use crate::classify::{classify_instruction, MoveClassification};
use crate::geometry::{intersect, split};
use crate::modal::ModalState;
use crate::stats::{StatisticsAccumulator, Summary, DEFAULT_FEED_RATE};
use crate::strategy::{Action, CrossingStrategy, MultiAxisStrategy, Strategy, StrategyEngine};
use crate::threshold::{resolve, validate_allowance, DepthThreshold};

/// Default number of lines between progress callbacks
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Immutable run configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub allowance: f64,
    pub strategy: StrategyEngine,
    pub progress_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowance: 0.0,
            strategy: StrategyEngine::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl EngineConfig {
    pub fn new(allowance: f64) -> Self {
        Self {
            allowance,
            ..Self::default()
        }
    }

    pub fn with_crossing(mut self, crossing: CrossingStrategy) -> Self {
        self.strategy.crossing = crossing;
        self
    }

    pub fn with_multi_axis(mut self, multi_axis: MultiAxisStrategy) -> Self {
        self.strategy.multi_axis = multi_axis;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Progress snapshot passed to the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub lines_processed: u64,
    pub total_lines: u64,
    pub removed: u64,
}

impl ProgressUpdate {
    pub fn fraction(&self) -> f64 {
        if self.total_lines == 0 {
            1.0
        } else {
            self.lines_processed as f64 / self.total_lines as f64
        }
    }
}

/// Everything the reporting sink needs after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub threshold: DepthThreshold,
    pub crossing_strategy: CrossingStrategy,
    pub multi_axis_strategy: MultiAxisStrategy,
    pub summary: Summary,
    pub advisories: Vec<Advisory>,
}

/// Per-run mutable context for pass 2
struct RunContext<'a, S: InstructionSink + ?Sized> {
    sink: &'a mut S,
    state: ModalState,
    threshold: f64,
    stats: StatisticsAccumulator,
    advisories: AdvisoryLog,
    /// Motion mode in effect in the input
    program_motion: Option<Operation>,
    /// Last motion word written to the sink
    emitted_motion: Option<Operation>,
}

impl<'a, S: InstructionSink + ?Sized> RunContext<'a, S> {
    fn new(sink: &'a mut S, state: ModalState, threshold: f64, advisories: AdvisoryLog) -> Self {
        Self {
            sink,
            state,
            threshold,
            stats: StatisticsAccumulator::new(),
            advisories,
            program_motion: None,
            emitted_motion: None,
        }
    }

    fn emit(&mut self, instruction: &Instruction) -> Result<()> {
        if let Some(motion) = motion_word(instruction) {
            self.emitted_motion = Some(motion);
        }
        self.sink.emit(instruction)
    }

    /// Input motion mode when the output last wrote a different one
    fn stale_motion(&self) -> Option<Operation> {
        self.program_motion
            .filter(|motion| self.emitted_motion != Some(*motion))
    }
}

/// The optimization engine
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine, rejecting an invalid configuration up front
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        validate_allowance(config.allowance)?;
        if config.progress_interval == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "progress-interval".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Optimize `program`, writing retained instructions to `sink`
    ///
    /// `progress` is called every `progress_interval` lines and once at the
    /// end.
    ///
    /// # Errors
    /// `NoMotionFound` when the program has no G0/G1 move; any sink error.
    /// Malformed lines and failed splits are reported as advisories.
    pub fn run<S, P>(&self, program: &Program, sink: &mut S, mut progress: P) -> Result<OptimizationReport>
    where
        S: InstructionSink + ?Sized,
        P: FnMut(&ProgressUpdate),
    {
        let started = Instant::now();
        let strategy = self.config.strategy;

        let mut advisories = AdvisoryLog::new();
        for message in &program.warnings {
            advisories.push(Advisory::HeaderWarning {
                message: message.clone(),
            });
        }
        if strategy.multi_axis.is_fallback() {
            advisories.push(Advisory::SplitDecompositionUnsupported);
        }

        let threshold = resolve(
            program.instructions(),
            program.header.max_z,
            self.config.allowance,
        )?;
        tracing::info!(
            "Optimizing {} lines: threshold {} ({} crossing, {} multi-axis)",
            program.len(),
            threshold.value,
            strategy.crossing,
            strategy.multi_axis
        );

        let mut ctx = RunContext::new(
            sink,
            ModalState::initialize(program.header.max_z),
            threshold.value,
            advisories,
        );

        let total_lines = program.len() as u64;
        let interval = self.config.progress_interval;

        for line in &program.lines {
            match line {
                ProgramLine::Parsed(instruction) => self.process(&mut ctx, instruction)?,
                ProgramLine::Malformed {
                    line_number, error, ..
                } => {
                    ctx.stats.record_malformed();
                    ctx.advisories.push(Advisory::MalformedLine {
                        line_number: *line_number,
                        reason: error.to_string(),
                    });
                }
            }

            let processed = ctx.stats.total();
            if processed % interval == 0 && processed < total_lines {
                progress(&ProgressUpdate {
                    lines_processed: processed,
                    total_lines,
                    removed: ctx.stats.removed(),
                });
            }
        }
        progress(&ProgressUpdate {
            lines_processed: ctx.stats.total(),
            total_lines,
            removed: ctx.stats.removed(),
        });

        ctx.sink.finish()?;

        if !ctx.state.has_feed_rate() {
            ctx.advisories.push(Advisory::NoFeedRateSpecified);
        }
        if ctx.stats.default_feed_used() {
            ctx.advisories.push(Advisory::DefaultFeedRateUsed {
                default_feed: DEFAULT_FEED_RATE,
            });
        }

        let summary = ctx
            .stats
            .finalize(started.elapsed(), program.bytes, ctx.sink.bytes_written());
        tracing::info!(
            "Removed {} of {} lines, split {} moves in {:?}",
            summary.removed,
            summary.total,
            summary.split,
            summary.processing_time
        );

        Ok(OptimizationReport {
            threshold,
            crossing_strategy: strategy.crossing,
            multi_axis_strategy: strategy.multi_axis,
            summary,
            advisories: ctx.advisories.into_vec(),
        })
    }

    fn process<S>(&self, ctx: &mut RunContext<'_, S>, instruction: &Instruction) -> Result<()>
    where
        S: InstructionSink + ?Sized,
    {
        let start = ctx.state;
        ctx.state.update(instruction);
        if let Some(motion) = motion_word(instruction) {
            ctx.program_motion = Some(motion);
        }

        if is_incremental(instruction) {
            ctx.advisories.push(Advisory::IncrementalPositioning {
                line_number: instruction.line_number,
            });
        }

        let classification = classify_instruction(instruction, &start, &ctx.state, ctx.threshold);
        let action = self.config.strategy.decide(classification, instruction.axes());

        match action {
            Action::PreserveWhole => {
                // Axis words without a motion word move in the modal mode,
                // which removed lines may have left behind in the output
                if motion_word(instruction).is_none() && !instruction.axes().is_empty() {
                    if let Some(motion) = ctx.stale_motion() {
                        ctx.emit(&Instruction::new(Some(motion), ParamSet::new()))?;
                        ctx.stats.record_residual();
                    }
                }
                ctx.emit(instruction)?;
                ctx.stats.record_preserved();
            }
            Action::Remove => {
                let feed = ctx.state.has_feed_rate().then(|| ctx.state.feed_rate());
                ctx.stats.record_removed(&start, &ctx.state, feed);
                if let Some(residual) = modal_residual(instruction, ctx.stale_motion()) {
                    ctx.emit(&residual)?;
                    ctx.stats.record_residual();
                }
            }
            Action::Split => self.split_move(ctx, instruction, classification, &start)?,
        }
        Ok(())
    }

    fn split_move<S>(
        &self,
        ctx: &mut RunContext<'_, S>,
        instruction: &Instruction,
        classification: MoveClassification,
        start: &ModalState,
    ) -> Result<()>
    where
        S: InstructionSink + ?Sized,
    {
        // A move that only touches the threshold at an end point has no
        // interior crossing; it is kept whole without an advisory
        let touches_threshold = match classification {
            MoveClassification::CrossingEnter => ctx.state.depth() == ctx.threshold,
            MoveClassification::CrossingLeave => start.depth() == ctx.threshold,
            _ => false,
        };
        if touches_threshold {
            ctx.emit(instruction)?;
            ctx.stats.record_preserved();
            return Ok(());
        }

        let segments = intersect(start, &ctx.state, ctx.threshold)
            .and_then(|point| split(instruction, &point, classification, start));

        match segments {
            Ok((first, second)) => {
                ctx.emit(&first)?;
                let mut count = 1;
                if let Some(second) = second {
                    ctx.emit(&second)?;
                    count += 1;
                }
                ctx.stats.record_split(count);
            }
            Err(err) => {
                ctx.advisories.push(Advisory::GeometryFallback {
                    line_number: instruction.line_number,
                    reason: err.to_string(),
                });
                ctx.emit(instruction)?;
                ctx.stats.record_preserved();
            }
        }
        Ok(())
    }
}

fn is_incremental(instruction: &Instruction) -> bool {
    instruction
        .operation
        .iter()
        .chain(instruction.extra_codes.iter())
        .any(|op| op.letter == OpLetter::G && op.code == 91 && op.subcode.is_none())
}

fn motion_word(instruction: &Instruction) -> Option<Operation> {
    instruction.operation.filter(|op| op.is_motion())
}

/// Modal words on a removed line that later lines depend on
///
/// Extra codes (e.g. `G90`, `M3`) and non-axis words such as `F` and `S`
/// survive as a line of their own; the motion itself is dropped. `motion`
/// leads the line when the output's motion mode has drifted from the input's.
fn modal_residual(instruction: &Instruction, motion: Option<Operation>) -> Option<Instruction> {
    let mut params = ParamSet::new();
    for (param, value) in instruction.params.iter() {
        if param.axis().is_none() && param != Param::N {
            params.set(param, value);
        }
    }
    if instruction.extra_codes.is_empty() && params.is_empty() {
        return None;
    }

    let mut codes = motion.into_iter().chain(instruction.extra_codes.iter().copied());
    let operation = codes.next();

    Some(Instruction {
        operation,
        extra_codes: codes.collect(),
        params,
        comment: None,
        line_number: instruction.line_number,
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodetrim_core::{Axis, HeaderMetadata};

    fn g1(x: Option<f64>, z: f64, feed: Option<f64>) -> Instruction {
        let mut params = ParamSet::new().with(Param::Z, z);
        if let Some(x) = x {
            params.set(Param::X, x);
        }
        if let Some(feed) = feed {
            params.set(Param::F, feed);
        }
        Instruction::new(Some(Operation::g(1)), params)
    }

    fn program_of(instructions: Vec<Instruction>) -> Program {
        Program::from_instructions(HeaderMetadata::new(), instructions)
    }

    fn run(config: EngineConfig, program: &Program) -> (OptimizationReport, Vec<Instruction>) {
        let mut out: Vec<Instruction> = Vec::new();
        let report = Engine::new(config)
            .unwrap()
            .run(program, &mut out, |_| {})
            .unwrap();
        (report, out)
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Engine::new(EngineConfig::new(-1.0)).is_err());
        assert!(Engine::new(EngineConfig::new(0.0).with_progress_interval(0)).is_err());
        assert!(Engine::new(EngineConfig::new(0.5)).is_ok());
    }

    #[test]
    fn test_deep_and_non_motion_pass_through() {
        let program = program_of(vec![
            Instruction::comment("; start"),
            Instruction::new(Some(Operation::m(3)), ParamSet::new().with(Param::S, 10000.0)),
            g1(None, -10.0, Some(500.0)),
            Instruction::blank(),
        ]);
        let (report, out) = run(EngineConfig::new(0.0), &program);

        assert_eq!(out.len(), 4);
        assert_eq!(report.summary.preserved, 4);
        assert_eq!(report.summary.removed, 0);
    }

    #[test]
    fn test_removed_move_keeps_its_feed_word() {
        let program = program_of(vec![
            g1(None, -10.0, None),
            g1(None, -5.0, Some(700.0)),
            g1(None, -10.0, None),
        ]);
        // Threshold -9: every move crosses it
        let (report, out) = run(
            EngineConfig::new(1.0).with_crossing(CrossingStrategy::Conservative),
            &program,
        );
        assert_eq!(report.threshold.value, -9.0);
        assert_eq!(report.summary.removed, 0);
        assert_eq!(out.len(), 3);

        let program = program_of(vec![
            g1(None, -10.0, None),
            g1(None, -5.0, None),
            g1(None, -5.0, Some(700.0)),
        ]);
        let (report, out) = run(
            EngineConfig::new(1.0).with_crossing(CrossingStrategy::Conservative),
            &program,
        );
        assert_eq!(report.summary.removed, 1);
        assert_eq!(out.last().map(|i| i.to_string()), Some("F700".to_string()));
    }

    #[test]
    fn test_geometry_failure_falls_back_to_preserve() {
        let (first, second) = (ModalState::initialize(None), ModalState::initialize(None));
        // Direct check of the fallback path: a horizontal "crossing" cannot
        // be intersected.
        assert!(intersect(&first, &second, -1.0).is_err());

        let mut out: Vec<Instruction> = Vec::new();
        let engine = Engine::new(EngineConfig::new(0.0)).unwrap();
        let mut ctx = RunContext::new(&mut out, ModalState::initialize(None), -1.0, AdvisoryLog::new());
        let line = g1(Some(5.0), 0.0, Some(100.0));
        ctx.state.update(&line);
        engine
            .split_move(&mut ctx, &line, MoveClassification::CrossingEnter, &first)
            .unwrap();

        assert!(matches!(
            ctx.advisories.entries(),
            [Advisory::GeometryFallback { .. }]
        ));
        assert_eq!(ctx.stats.finalize(Default::default(), 0, None).preserved, 1);
        assert_eq!(out, vec![line]);
    }

    #[test]
    fn test_plunge_ending_on_threshold_is_kept_whole() {
        let program = program_of(vec![g1(Some(2.0), -10.0, Some(300.0))]);
        let (report, out) = run(EngineConfig::new(0.0), &program);

        assert_eq!(report.threshold.value, -10.0);
        assert_eq!(report.summary.split, 0);
        assert_eq!(report.summary.preserved, 1);
        assert_eq!(out, program.instructions().cloned().collect::<Vec<_>>());
        assert!(!report
            .advisories
            .iter()
            .any(|a| matches!(a, Advisory::GeometryFallback { .. })));
    }

    #[test]
    fn test_malformed_lines_are_dropped_with_advisory() {
        let mut program = program_of(vec![g1(None, -1.0, Some(100.0))]);
        program.lines.push(ProgramLine::Malformed {
            line_number: 2,
            text: "G1 W1".to_string(),
            error: gcodetrim_core::GcodeError::UnknownWord {
                line_number: 2,
                letter: 'W',
            },
        });
        let (report, out) = run(EngineConfig::new(0.0), &program);

        assert_eq!(out.len(), 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.malformed, 1);
        assert!(report
            .advisories
            .iter()
            .any(|a| matches!(a, Advisory::MalformedLine { line_number: 2, .. })));
    }

    #[test]
    fn test_progress_is_reported() {
        let program = program_of((0..10).map(|i| g1(Some(i as f64), -1.0, Some(100.0))).collect());
        let mut updates = Vec::new();
        let mut out: Vec<Instruction> = Vec::new();
        Engine::new(EngineConfig::new(0.0).with_progress_interval(4))
            .unwrap()
            .run(&program, &mut out, |update| updates.push(update.lines_processed))
            .unwrap();
        assert_eq!(updates, vec![4, 8, 10]);
    }

    #[test]
    fn test_one_time_advisories() {
        let program = program_of(vec![g1(Some(1.0), -1.0, None), g1(Some(2.0), -0.5, None)]);
        let (report, _) = run(
            EngineConfig::new(0.0).with_multi_axis(MultiAxisStrategy::Split),
            &program,
        );
        let count = |f: fn(&Advisory) -> bool| report.advisories.iter().filter(|a| f(a)).count();

        assert_eq!(count(|a| matches!(a, Advisory::SplitDecompositionUnsupported)), 1);
        assert_eq!(count(|a| matches!(a, Advisory::NoFeedRateSpecified)), 1);
    }

    #[test]
    fn test_incremental_mode_is_flagged_once() {
        let program = program_of(vec![
            Instruction::new(Some(Operation::g(91)), ParamSet::new()),
            g1(None, -1.0, Some(100.0)),
            Instruction::new(Some(Operation::g(91)), ParamSet::new()),
        ]);
        let (report, _) = run(EngineConfig::new(0.0), &program);
        let flagged: Vec<_> = report
            .advisories
            .iter()
            .filter(|a| matches!(a, Advisory::IncrementalPositioning { .. }))
            .collect();
        assert_eq!(flagged.len(), 1);
    }

    #[test]
    fn test_modal_residual() {
        let mut line = g1(Some(1.0), -1.0, Some(300.0));
        line.extra_codes.push(Operation::m(8));
        let residual = modal_residual(&line, None).unwrap();
        assert_eq!(residual.to_string(), "M8 F300");
        assert!(residual.axes().is_empty());
        assert!(!residual.axes().contains(Axis::Z));

        let residual = modal_residual(&line, Some(Operation::g(1))).unwrap();
        assert_eq!(residual.to_string(), "G1 M8 F300");

        assert!(modal_residual(&g1(Some(1.0), -1.0, None), None).is_none());
        assert!(modal_residual(&g1(Some(1.0), -1.0, None), Some(Operation::g(1))).is_none());
    }

    fn g0(x: Option<f64>, z: f64) -> Instruction {
        let mut params = ParamSet::new().with(Param::Z, z);
        if let Some(x) = x {
            params.set(Param::X, x);
        }
        Instruction::new(Some(Operation::g(0)), params)
    }

    fn implicit(x: f64, z: f64) -> Instruction {
        Instruction::new(None, ParamSet::new().with(Param::X, x).with(Param::Z, z))
    }

    #[test]
    fn test_removed_feed_move_restores_motion_mode_on_residual() {
        let program = program_of(vec![
            g0(Some(0.0), 5.0),
            g1(None, -2.0, Some(300.0)),
            implicit(5.0, -10.0),
            g1(None, -10.0, None),
        ]);
        let (report, out) = run(EngineConfig::new(1.0), &program);

        let text: Vec<String> = out.iter().map(|i| i.to_string()).collect();
        assert_eq!(text, vec!["G0 X0 Z5", "G1 F300", "X5 Z-10", "G1 Z-10"]);
        assert_eq!(report.summary.removed, 1);
        assert_eq!(report.summary.lines_written, 4);
    }

    #[test]
    fn test_implicit_move_after_removal_gets_motion_word() {
        let program = program_of(vec![
            g0(Some(0.0), 5.0),
            g1(None, -10.0, Some(300.0)),
            g0(None, 5.0),
            g1(None, -2.0, None),
            implicit(5.0, -10.0),
        ]);
        let (report, out) = run(
            EngineConfig::new(1.0).with_crossing(CrossingStrategy::Conservative),
            &program,
        );

        let text: Vec<String> = out.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            vec!["G0 X0 Z5", "G1 Z-10 F300", "G0 Z5", "G1", "X5 Z-10"]
        );
        assert_eq!(report.summary.removed, 1);
        assert_eq!(report.summary.preserved, 4);
        assert_eq!(report.summary.lines_written, 5);
    }

    #[test]
    fn test_leave_starting_on_threshold_is_kept_whole() {
        let program = program_of(vec![
            g1(None, -10.0, Some(300.0)),
            g1(Some(4.0), -5.0, None),
        ]);
        let (report, out) = run(EngineConfig::new(0.0), &program);

        assert_eq!(report.summary.split, 0);
        assert_eq!(report.summary.preserved, 2);
        assert_eq!(out, program.instructions().cloned().collect::<Vec<_>>());
        assert!(!report
            .advisories
            .iter()
            .any(|a| matches!(a, Advisory::GeometryFallback { .. })));
    }
}
