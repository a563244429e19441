//! Wizard steps and the server-reported current step.
//!
//! The current step is never computed on the client: it is replaced wholesale with
//! whatever `current_step` the backend returned, and only interpreted here.

use std::fmt;

/// The five ordered wizard phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    CorpCenter,
    Networks,
    ScopeDetail,
    Edges,
    Done,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::CorpCenter,
        Step::Networks,
        Step::ScopeDetail,
        Step::Edges,
        Step::Done,
    ];

    /// Wire value, e.g. "scope-detail".
    pub fn as_str(self) -> &'static str {
        match self {
            Step::CorpCenter => "corp-center",
            Step::Networks => "networks",
            Step::ScopeDetail => "scope-detail",
            Step::Edges => "edges",
            Step::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Step> {
        Step::ALL.into_iter().find(|step| step.as_str() == s)
    }

    pub fn order(self) -> usize {
        self as usize
    }

    /// Short label for the step indicator.
    pub fn title(self) -> &'static str {
        match self {
            Step::CorpCenter => "법인/센터",
            Step::Networks => "네트워크",
            Step::ScopeDetail => "상세정보",
            Step::Edges => "연결관계",
            Step::Done => "완료",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-reported step, kept verbatim so unknown values (e.g. "error") survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentStep {
    raw: String,
}

impl Default for CurrentStep {
    fn default() -> Self {
        Self::known(Step::CorpCenter)
    }
}

impl CurrentStep {
    pub fn from_server(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn known(step: Step) -> Self {
        Self {
            raw: step.as_str().to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed step, or None for an unrecognized value.
    pub fn step(&self) -> Option<Step> {
        Step::parse(self.raw.trim())
    }

    pub fn is(&self, step: Step) -> bool {
        self.step() == Some(step)
    }

    /// True when the current step is known and strictly after `step`.
    pub fn is_past(&self, step: Step) -> bool {
        self.step().map(|s| s > step).unwrap_or(false)
    }
}

/// Indicator badge for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Complete,
    Current,
    Upcoming,
}

/// Status of every step relative to `current`. `done` is terminal and never shown as
/// complete; an unknown current step leaves every step upcoming.
pub fn indicator(current: &CurrentStep) -> [(Step, StepStatus); 5] {
    let current = current.step();
    Step::ALL.map(|step| {
        let status = match current {
            Some(c) if step == c => StepStatus::Current,
            Some(c) if step < c && step != Step::Done => StepStatus::Complete,
            _ => StepStatus::Upcoming,
        };
        (step, status)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(raw: &str) -> Vec<StepStatus> {
        indicator(&CurrentStep::from_server(raw))
            .iter()
            .map(|(_, s)| *s)
            .collect()
    }

    #[test]
    fn parse_round_trips_wire_values() {
        for step in Step::ALL {
            assert_eq!(Step::parse(step.as_str()), Some(step));
        }
        assert_eq!(Step::parse("error"), None);
        assert_eq!(Step::parse("Networks"), None);
    }

    #[test]
    fn order_is_total() {
        assert!(Step::CorpCenter < Step::Networks);
        assert!(Step::Edges < Step::Done);
        assert_eq!(Step::ScopeDetail.order(), 2);
    }

    #[test]
    fn indicator_marks_earlier_steps_complete() {
        use StepStatus::*;
        assert_eq!(
            statuses("scope-detail"),
            vec![Complete, Complete, Current, Upcoming, Upcoming]
        );
        assert_eq!(
            statuses("corp-center"),
            vec![Current, Upcoming, Upcoming, Upcoming, Upcoming]
        );
    }

    #[test]
    fn done_is_current_never_complete() {
        use StepStatus::*;
        assert_eq!(
            statuses("done"),
            vec![Complete, Complete, Complete, Complete, Current]
        );
    }

    #[test]
    fn unknown_step_renders_nothing_extra() {
        assert!(statuses("error").iter().all(|s| *s == StepStatus::Upcoming));
        assert!(statuses("").iter().all(|s| *s == StepStatus::Upcoming));
        let cur = CurrentStep::from_server("error");
        assert_eq!(cur.step(), None);
        assert_eq!(cur.raw(), "error");
        assert!(!cur.is_past(Step::CorpCenter));
    }

    #[test]
    fn regression_recomputes_completed_set() {
        let forward = statuses("edges");
        let back = statuses("networks");
        assert_eq!(forward[2], StepStatus::Complete);
        assert_eq!(back[2], StepStatus::Upcoming);
        assert_eq!(back[1], StepStatus::Current);
    }

    #[test]
    fn default_is_corp_center() {
        assert!(CurrentStep::default().is(Step::CorpCenter));
    }
}
