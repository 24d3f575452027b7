//! Structured trace of a resolution run.

use serde::Serialize;
use std::fmt;

/// Stages of the resolution pipeline, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStep {
    Seed,
    Entitlements,
    ExportMethod,
    Team,
    ArchiveOrigin,
    DefaultProfile,
    ProfileNarrowing,
    FinalSelection,
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seed => "seed",
            Self::Entitlements => "entitlements",
            Self::ExportMethod => "export method",
            Self::Team => "team",
            Self::ArchiveOrigin => "archive origin",
            Self::DefaultProfile => "default profile",
            Self::ProfileNarrowing => "profile narrowing",
            Self::FinalSelection => "final selection",
        };
        f.write_str(name)
    }
}

/// What a step did to the candidate set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOutcome {
    /// The step ran and its result was kept.
    Applied,
    /// The step would have removed every candidate; its result was discarded.
    Skipped,
    /// Preconditions for the step were not met (e.g. no team id supplied).
    NotApplicable,
}

/// One step's effect on the candidate groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: ResolutionStep,
    pub before: usize,
    pub after: usize,
    pub outcome: StepOutcome,
    pub reason: String,
}

/// Classification of a non-fatal finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A filter step was skipped to avoid eliminating every group.
    StepSkipped,
    /// A bundle target has no usable profile and will not be mapped.
    UncoveredTarget,
    /// Several groups qualified; the first was chosen.
    Ambiguous,
    /// The chosen group mixes managed and non-managed profiles.
    MixedManagement,
    /// No group qualified; signing is left to the export tool.
    Empty,
}

impl DiagnosticKind {
    /// Whether the finding is an error-level condition for operators.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::MixedManagement | Self::Empty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Every step record and diagnostic produced while resolving.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub steps: Vec<StepRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolutionReport {
    pub(super) fn record(
        &mut self,
        step: ResolutionStep,
        before: usize,
        after: usize,
        outcome: StepOutcome,
        reason: impl Into<String>,
    ) {
        self.steps.push(StepRecord {
            step,
            before,
            after,
            outcome,
            reason: reason.into(),
        });
    }

    pub(super) fn diagnose(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            kind,
            message: message.into(),
        });
    }

    /// The record for `step`, if it ran.
    pub fn step(&self, step: ResolutionStep) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.step == step)
    }

    /// Whether any diagnostic of `kind` was raised.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// Emits the report through the `log` facade.
    pub fn log(&self) {
        for record in &self.steps {
            log::debug!(
                "[{}] {:?}: {} -> {} group(s): {}",
                record.step,
                record.outcome,
                record.before,
                record.after,
                record.reason
            );
        }
        for diagnostic in &self.diagnostics {
            if diagnostic.kind.is_error() {
                log::error!("{}", diagnostic.message);
            } else {
                log::warn!("{}", diagnostic.message);
            }
        }
    }
}
