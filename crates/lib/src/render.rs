//! Progressive panel renderer: a pure function from (current step, snapshot) to a render plan.
//!
//! The plan says which of the four progress panels are visible, the badge of each, what
//! detail each panel shows, the five-step indicator, and the optional percentage bar.
//! Front ends draw the plan as-is and never re-derive any of it.

use crate::snapshot::{SnapshotFacts, UiData};
use crate::step::{indicator, CurrentStep, Step, StepStatus};

/// The four progress panels (the terminal `done` step has no panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    CorpCenter,
    Networks,
    ScopeDetail,
    Edges,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::CorpCenter,
        Panel::Networks,
        Panel::ScopeDetail,
        Panel::Edges,
    ];

    pub fn step(self) -> Step {
        match self {
            Panel::CorpCenter => Step::CorpCenter,
            Panel::Networks => Step::Networks,
            Panel::ScopeDetail => Step::ScopeDetail,
            Panel::Edges => Step::Edges,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::CorpCenter => "1단계: 법인/센터",
            Panel::Networks => "2단계: 네트워크 구성",
            Panel::ScopeDetail => "3단계: 스코프 상세",
            Panel::Edges => "4단계: 연결 관계",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Badge of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Locked,
    Active,
    Complete,
}

/// Status line for panels that have no structured detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    InProgress,
    Done,
    Waiting,
}

impl StatusLine {
    pub fn text(self) -> &'static str {
        match self {
            StatusLine::InProgress => "입력 진행 중...",
            StatusLine::Done => "✓ 완료",
            StatusLine::Waiting => "대기 중...",
        }
    }
}

/// Highlight for the center being elaborated during the networks step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCenter {
    pub name: String,
    /// One-based (position, total) when the cursor is known.
    pub position: Option<(u64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelDetail {
    /// Corporation and centers; both empty means "waiting for input".
    CorpCenter {
        corporation: Option<String>,
        centers: Vec<String>,
    },
    /// Recorded zones per center as (center, zones) and the current-center highlight.
    Networks {
        current: Option<CurrentCenter>,
        zones: Vec<(String, String)>,
    },
    Status(StatusLine),
}

/// One panel of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub panel: Panel,
    pub visible: bool,
    pub state: PanelState,
    pub detail: PanelDetail,
}

/// Everything a front end needs to draw the progress view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub panels: [PanelView; 4],
    pub indicator: [(Step, StepStatus); 5],
    /// Overall percentage (0-100) while a center cursor is present.
    pub progress: Option<u32>,
}

impl RenderPlan {
    pub fn panel(&self, panel: Panel) -> &PanelView {
        &self.panels[panel.index()]
    }

    pub fn visible_panels(&self) -> impl Iterator<Item = &PanelView> {
        self.panels.iter().filter(|p| p.visible)
    }
}

/// Build the render plan for the given step and snapshot.
pub fn plan(step: &CurrentStep, snapshot: &UiData) -> RenderPlan {
    let facts = snapshot.facts(step);
    let panels = Panel::ALL.map(|panel| PanelView {
        panel,
        visible: is_visible(panel, step, &facts),
        state: badge(panel, step, &facts),
        detail: detail(panel, step, snapshot),
    });
    RenderPlan {
        panels,
        indicator: indicator(step),
        progress: facts.cursor.map(|c| c.percent()),
    }
}

fn is_visible(panel: Panel, step: &CurrentStep, facts: &SnapshotFacts) -> bool {
    match panel {
        Panel::CorpCenter => true,
        Panel::Networks => facts.corporation_known,
        Panel::ScopeDetail => {
            facts.corporation_known
                && facts.centers_known
                && facts.networks_complete
                && step
                    .step()
                    .map(|s| s != Step::CorpCenter && s != Step::Networks)
                    .unwrap_or(false)
        }
        Panel::Edges => step.is(Step::Edges) || step.is(Step::Done),
    }
}

fn badge(panel: Panel, step: &CurrentStep, facts: &SnapshotFacts) -> PanelState {
    if step.is(panel.step()) {
        return PanelState::Active;
    }
    let complete = match panel {
        Panel::CorpCenter => facts.corporation_known && step.is_past(Step::CorpCenter),
        Panel::Networks => facts.networks_complete && step.is_past(Step::Networks),
        Panel::ScopeDetail => facts.scope_detail_complete,
        Panel::Edges => step.is(Step::Done),
    };
    if complete {
        PanelState::Complete
    } else {
        PanelState::Locked
    }
}

fn detail(panel: Panel, step: &CurrentStep, snapshot: &UiData) -> PanelDetail {
    match panel {
        Panel::CorpCenter => PanelDetail::CorpCenter {
            corporation: snapshot.corporation().map(String::from),
            centers: snapshot.centers().into_iter().map(String::from).collect(),
        },
        Panel::Networks => {
            let current = if step.is(Step::Networks) {
                snapshot.current_center().map(|name| CurrentCenter {
                    name: name.to_string(),
                    position: snapshot.cursor().map(|c| c.position()),
                })
            } else {
                None
            };
            let zones = snapshot
                .center_networks()
                .into_iter()
                .map(|n| {
                    let zones = n.zones.display();
                    (n.center, zones)
                })
                .collect();
            PanelDetail::Networks { current, zones }
        }
        Panel::ScopeDetail => PanelDetail::Status(status_line(step, Step::ScopeDetail)),
        Panel::Edges => PanelDetail::Status(status_line(step, Step::Edges)),
    }
}

fn status_line(step: &CurrentStep, own: Step) -> StatusLine {
    if step.is(own) {
        StatusLine::InProgress
    } else if step.is_past(own) {
        StatusLine::Done
    } else {
        StatusLine::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn snap(v: Value) -> UiData {
        UiData::from_value(Some(v))
    }

    fn at(step: Step) -> CurrentStep {
        CurrentStep::known(step)
    }

    #[test]
    fn out_of_range_cursor_still_renders() {
        let s = snap(json!({
            "corporation": "은행",
            "current_center": "AWS",
            "current_index": u64::MAX,
            "total_centers": 4
        }));
        let p = plan(&at(Step::Networks), &s);
        assert!(p.progress.is_some());
        assert!(p.panel(Panel::Networks).visible);
    }

    fn full_snapshot() -> UiData {
        snap(json!({
            "corporation": "은행",
            "centers": ["AWS", "의왕"],
            "center_networks": {
                "AWS": { "zones": ["VPC"] },
                "의왕": { "zones": ["내부망", "DMZ망"] }
            },
            "current_center": "의왕",
            "current_index": 1,
            "total_centers": 2
        }))
    }

    #[test]
    fn fresh_session_shows_only_first_panel() {
        let p = plan(&CurrentStep::default(), &UiData::default());
        let visible: Vec<Panel> = p.visible_panels().map(|v| v.panel).collect();
        assert_eq!(visible, vec![Panel::CorpCenter]);
        assert_eq!(p.panel(Panel::CorpCenter).state, PanelState::Active);
        assert_eq!(p.progress, None);
        assert_eq!(
            p.panel(Panel::CorpCenter).detail,
            PanelDetail::CorpCenter {
                corporation: None,
                centers: vec![]
            }
        );
    }

    #[test]
    fn corp_center_answer_unlocks_networks() {
        let s = snap(json!({ "corporation": "은행", "centers": ["AWS", "의왕"] }));
        let p = plan(&at(Step::Networks), &s);
        assert!(p.panel(Panel::Networks).visible);
        assert_eq!(p.panel(Panel::Networks).state, PanelState::Active);
        assert_eq!(p.panel(Panel::CorpCenter).state, PanelState::Complete);
        assert!(!p.panel(Panel::ScopeDetail).visible);
        assert!(!p.panel(Panel::Edges).visible);
    }

    #[test]
    fn scope_detail_requires_all_networks_and_later_step() {
        let s = full_snapshot();
        assert!(!plan(&at(Step::Networks), &s).panel(Panel::ScopeDetail).visible);
        assert!(!plan(&at(Step::CorpCenter), &s).panel(Panel::ScopeDetail).visible);
        let p = plan(&at(Step::ScopeDetail), &s);
        assert!(p.panel(Panel::ScopeDetail).visible);
        assert_eq!(p.panel(Panel::ScopeDetail).state, PanelState::Active);
        assert_eq!(p.panel(Panel::Networks).state, PanelState::Complete);
        assert_eq!(
            p.panel(Panel::ScopeDetail).detail,
            PanelDetail::Status(StatusLine::InProgress)
        );

        let mut partial = s.as_map().clone();
        partial.insert("center_networks".into(), json!({ "AWS": { "zones": "VPC" } }));
        let p = plan(&at(Step::ScopeDetail), &UiData::new(partial));
        assert!(!p.panel(Panel::ScopeDetail).visible);
        assert_eq!(p.panel(Panel::Networks).state, PanelState::Locked);
    }

    #[test]
    fn edges_visible_from_edges_on() {
        let s = full_snapshot();
        let p = plan(&at(Step::Edges), &s);
        assert!(p.panel(Panel::Edges).visible);
        assert_eq!(p.panel(Panel::Edges).state, PanelState::Active);
        assert_eq!(p.panel(Panel::ScopeDetail).state, PanelState::Complete);

        let p = plan(&at(Step::Done), &s);
        assert_eq!(p.panel(Panel::Edges).state, PanelState::Complete);
        assert_eq!(
            p.panel(Panel::Edges).detail,
            PanelDetail::Status(StatusLine::Done)
        );
        assert!(p.visible_panels().all(|v| v.state == PanelState::Complete));
        assert!(!plan(&at(Step::ScopeDetail), &s).panel(Panel::Edges).visible);
    }

    #[test]
    fn edges_panel_visible_even_without_snapshot() {
        let p = plan(&at(Step::Edges), &UiData::default());
        assert!(p.panel(Panel::Edges).visible);
        assert!(!p.panel(Panel::Networks).visible);
        assert_eq!(p.panel(Panel::ScopeDetail).state, PanelState::Complete);
    }

    #[test]
    fn progress_follows_cursor() {
        let s = snap(json!({ "current_index": 2, "total_centers": 4 }));
        assert_eq!(plan(&at(Step::Networks), &s).progress, Some(75));
        let s = snap(json!({ "current_index": 3, "total_centers": 4 }));
        assert_eq!(plan(&at(Step::Networks), &s).progress, Some(100));
    }

    #[test]
    fn current_center_highlight_only_during_networks() {
        let s = full_snapshot();
        let p = plan(&at(Step::Networks), &s);
        match &p.panel(Panel::Networks).detail {
            PanelDetail::Networks { current, zones } => {
                assert_eq!(
                    current.as_ref(),
                    Some(&CurrentCenter {
                        name: "의왕".to_string(),
                        position: Some((2, 2))
                    })
                );
                assert_eq!(
                    zones,
                    &vec![
                        ("AWS".to_string(), "VPC".to_string()),
                        ("의왕".to_string(), "내부망, DMZ망".to_string())
                    ]
                );
            }
            other => panic!("unexpected detail {:?}", other),
        }
        let p = plan(&at(Step::ScopeDetail), &s);
        match &p.panel(Panel::Networks).detail {
            PanelDetail::Networks { current, .. } => assert!(current.is_none()),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn unknown_step_renders_nothing_extra() {
        let p = plan(&CurrentStep::from_server("error"), &full_snapshot());
        assert!(p.panel(Panel::CorpCenter).visible);
        assert_eq!(p.panel(Panel::CorpCenter).state, PanelState::Locked);
        assert!(!p.panel(Panel::ScopeDetail).visible);
        assert!(!p.panel(Panel::Edges).visible);
        assert!(p
            .indicator
            .iter()
            .all(|(_, s)| *s == StepStatus::Upcoming));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z가-힣 ]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(2, 12, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_snapshot_without_corporation() -> impl Strategy<Value = UiData> {
        (
            prop::option::of(arb_json()),
            prop::option::of(arb_json()),
            prop::option::of(arb_json()),
            prop::option::of(arb_json()),
            prop::option::of(0u64..10),
            prop::option::of(0u64..10),
            prop_oneof![Just(Value::Null), Just(json!("")), any::<i64>().prop_map(|n| json!(n))],
        )
            .prop_map(|(centers, nets, current, extra, idx, total, corp)| {
                let mut m = serde_json::Map::new();
                m.insert("corporation".into(), corp);
                if let Some(v) = centers {
                    m.insert("centers".into(), v);
                }
                if let Some(v) = nets {
                    m.insert("center_networks".into(), v);
                }
                if let Some(v) = current {
                    m.insert("current_center".into(), v);
                }
                if let Some(v) = extra {
                    m.insert("extra".into(), v);
                }
                if let Some(i) = idx {
                    m.insert("current_index".into(), json!(i));
                }
                if let Some(t) = total {
                    m.insert("total_centers".into(), json!(t));
                }
                UiData::new(m)
            })
    }

    fn arb_step() -> impl Strategy<Value = CurrentStep> {
        prop_oneof![
            Just(CurrentStep::known(Step::CorpCenter)),
            Just(CurrentStep::known(Step::Networks)),
            Just(CurrentStep::known(Step::ScopeDetail)),
            Just(CurrentStep::known(Step::Edges)),
            Just(CurrentStep::known(Step::Done)),
            "[a-z-]{0,12}".prop_map(|s| CurrentStep::from_server(s)),
        ]
    }

    proptest! {
        #[test]
        fn networks_hidden_without_corporation(s in arb_snapshot_without_corporation(), step in arb_step()) {
            let p = plan(&step, &s);
            prop_assert!(!p.panel(Panel::Networks).visible);
            prop_assert!(!p.panel(Panel::ScopeDetail).visible);
        }

        #[test]
        fn plan_never_panics_on_arbitrary_snapshots(v in arb_json(), step in arb_step()) {
            let s = UiData::from_value(Some(v));
            let p = plan(&step, &s);
            prop_assert!(p.panel(Panel::CorpCenter).visible);
            prop_assert_eq!(p.progress.is_some(), s.cursor().is_some());
        }
    }
}
