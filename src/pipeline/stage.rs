//! Pipeline readiness states and operation names

use serde::Serialize;
use std::fmt;

/// How far the current dataset lineage has progressed.
///
/// Ordered: every stage implies all stages before it have been reached
/// (`Preprocessed` is optional and may be skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Empty,
    Loaded,
    TargetSet,
    Preprocessed,
    Split,
    Trained,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Empty => "empty",
            Stage::Loaded => "loaded",
            Stage::TargetSet => "target_set",
            Stage::Preprocessed => "preprocessed",
            Stage::Split => "split",
            Stage::Trained => "trained",
        };
        f.write_str(name)
    }
}

/// An operation a caller can attempt, used to name the attempted step in
/// precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Preview,
    SelectTarget,
    TargetInfo,
    Preprocess,
    ProcessedPreview,
    Split,
    SplitInfo,
    Train,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Operation::Preview => "previewing data",
            Operation::SelectTarget => "selecting a target",
            Operation::TargetInfo => "reading target info",
            Operation::Preprocess => "preprocessing",
            Operation::ProcessedPreview => "previewing processed data",
            Operation::Split => "splitting",
            Operation::SplitInfo => "reading split info",
            Operation::Train => "training",
        };
        f.write_str(phrase)
    }
}
