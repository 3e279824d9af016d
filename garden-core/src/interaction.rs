//! Pointer handling: hit-testing, hover, and selection.

use serde::Serialize;

use crate::layout::{Layout, LayoutEntry, PointF};

/// What the user is pointing at and what they picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<String>,
    pub hovered: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
}

impl CursorHint {
    pub fn as_css(self) -> &'static str {
        match self {
            CursorHint::Default => "default",
            CursorHint::Pointer => "pointer",
        }
    }
}

/// Coarse interaction state. Selection takes precedence over hover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionPhase<'a> {
    Idle,
    Hovering(&'a str),
    Selected(&'a str),
}

/// Result of a click, as far as selection is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Select(String),
    Deselect,
    /// Click did not change the selection.
    Ignore,
}

/// First entry in layout order whose center is within `radius * multiplier`
/// of `(x, y)`.
pub fn hit_test(x: f64, y: f64, layout: &Layout, multiplier: f64) -> Option<&LayoutEntry> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let p = PointF { x, y };
    layout
        .entries()
        .iter()
        .find(|e| e.state.position().distance(&p) <= e.radius * multiplier)
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: SelectionState,
    hit_multiplier: f64,
}

impl InteractionController {
    pub fn new(hit_multiplier: f64) -> Self {
        let hit_multiplier = if hit_multiplier.is_finite() && hit_multiplier > 0.0 { hit_multiplier } else { 1.0 };
        Self { state: SelectionState::default(), hit_multiplier }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.state.hovered.as_deref()
    }

    pub fn phase(&self) -> InteractionPhase<'_> {
        match (self.selected(), self.hovered()) {
            (Some(id), _) => InteractionPhase::Selected(id),
            (None, Some(id)) => InteractionPhase::Hovering(id),
            (None, None) => InteractionPhase::Idle,
        }
    }

    pub fn cursor(&self) -> CursorHint {
        if self.state.hovered.is_some() { CursorHint::Pointer } else { CursorHint::Default }
    }

    /// Update hover from a pointer position. Returns true if hover changed.
    pub fn on_move(&mut self, x: f64, y: f64, layout: &Layout) -> bool {
        let hit = hit_test(x, y, layout, self.hit_multiplier).map(|e| e.id.clone());
        if hit == self.state.hovered {
            return false;
        }
        self.state.hovered = hit;
        true
    }

    pub fn on_leave(&mut self) -> bool {
        self.state.hovered.take().is_some()
    }

    /// Facts toggle selection, empty space clears it, hubs are inert.
    pub fn on_click(&mut self, x: f64, y: f64, layout: &Layout) -> ClickOutcome {
        match hit_test(x, y, layout, self.hit_multiplier) {
            Some(entry) if entry.is_hub() => ClickOutcome::Ignore,
            Some(entry) if self.selected() == Some(entry.id.as_str()) => {
                self.state.selected = None;
                ClickOutcome::Deselect
            }
            Some(entry) => {
                self.state.selected = Some(entry.id.clone());
                ClickOutcome::Select(entry.id.clone())
            }
            None if self.state.selected.is_some() => {
                self.state.selected = None;
                ClickOutcome::Deselect
            }
            None => ClickOutcome::Ignore,
        }
    }

    /// Set the selection directly. Returns true if it changed.
    pub fn set_selected(&mut self, id: Option<String>) -> bool {
        if self.state.selected == id {
            return false;
        }
        self.state.selected = id;
        true
    }

    /// Drop selection or hover pointing at ids no longer in `layout`.
    /// Returns true if the selection was cleared.
    pub fn retain(&mut self, layout: &Layout) -> bool {
        if self.state.hovered.as_deref().is_some_and(|id| !layout.contains(id)) {
            self.state.hovered = None;
        }
        match self.state.selected.as_deref() {
            Some(id) if !layout.contains(id) => {
                log::debug!("selected node '{}' is gone after refresh", id);
                self.state.selected = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodeState;
    use crate::model::NodeKind;

    fn layout() -> Layout {
        let mut layout = Layout::new();
        layout.insert(LayoutEntry {
            id: "cat-feeling".to_string(),
            kind: NodeKind::Category,
            radius: 28.0,
            state: NodeState::at(600.0, 350.0),
        });
        layout.insert(LayoutEntry {
            id: "m1".to_string(),
            kind: NodeKind::Fact,
            radius: 10.0,
            state: NodeState::at(720.0, 350.0),
        });
        layout.insert(LayoutEntry {
            id: "m2".to_string(),
            kind: NodeKind::Fact,
            radius: 10.0,
            state: NodeState::at(730.0, 350.0),
        });
        layout
    }

    #[test]
    fn test_hit_at_exact_center() {
        let layout = layout();
        for e in layout.entries() {
            let hit = hit_test(e.state.x, e.state.y, &layout, 2.0).unwrap();
            // m2 overlaps m1's hit area; m1 comes first in layout order.
            let expected = if e.id == "m2" { "m1" } else { e.id.as_str() };
            assert_eq!(hit.id, expected);
        }
        assert_eq!(hit_test(735.0, 350.0, &layout, 1.0).unwrap().id, "m2");
    }

    #[test]
    fn test_hit_radius_uses_multiplier() {
        let layout = layout();
        assert!(hit_test(720.0, 369.0, &layout, 2.0).is_some());
        assert!(hit_test(720.0, 369.0, &layout, 1.0).is_none());
        assert!(hit_test(100.0, 100.0, &layout, 2.0).is_none());
        assert!(hit_test(f64::NAN, 100.0, &layout, 2.0).is_none());
    }

    #[test]
    fn test_hub_click_keeps_selection() {
        let layout = layout();
        let mut ctl = InteractionController::new(2.0);

        assert_eq!(ctl.on_click(600.0, 350.0, &layout), ClickOutcome::Ignore);
        assert_eq!(ctl.selected(), None);

        assert_eq!(ctl.on_click(720.0, 350.0, &layout), ClickOutcome::Select("m1".to_string()));
        assert_eq!(ctl.on_click(600.0, 350.0, &layout), ClickOutcome::Ignore);
        assert_eq!(ctl.selected(), Some("m1"));
    }

    #[test]
    fn test_click_toggles_and_empty_deselects() {
        let layout = layout();
        let mut ctl = InteractionController::new(2.0);

        ctl.on_click(720.0, 350.0, &layout);
        assert_eq!(ctl.on_click(720.0, 350.0, &layout), ClickOutcome::Deselect);
        assert_eq!(ctl.selected(), None);

        ctl.on_click(720.0, 350.0, &layout);
        assert_eq!(ctl.on_click(50.0, 50.0, &layout), ClickOutcome::Deselect);
        assert_eq!(ctl.on_click(50.0, 50.0, &layout), ClickOutcome::Ignore);
    }

    #[test]
    fn test_hover_and_cursor() {
        let layout = layout();
        let mut ctl = InteractionController::new(2.0);
        assert_eq!(ctl.phase(), InteractionPhase::Idle);

        assert!(ctl.on_move(600.0, 350.0, &layout));
        assert!(!ctl.on_move(601.0, 351.0, &layout));
        assert_eq!(ctl.phase(), InteractionPhase::Hovering("cat-feeling"));
        assert_eq!(ctl.cursor(), CursorHint::Pointer);

        assert!(ctl.on_leave());
        assert!(!ctl.on_leave());
        assert_eq!(ctl.cursor(), CursorHint::Default);
    }

    #[test]
    fn test_selection_wins_phase() {
        let layout = layout();
        let mut ctl = InteractionController::new(2.0);
        ctl.on_click(720.0, 350.0, &layout);
        ctl.on_move(600.0, 350.0, &layout);
        assert_eq!(ctl.phase(), InteractionPhase::Selected("m1"));
    }

    #[test]
    fn test_retain_clears_removed_nodes() {
        let mut ctl = InteractionController::new(2.0);
        let full = layout();
        ctl.on_click(720.0, 350.0, &full);
        ctl.on_move(720.0, 350.0, &full);

        let mut smaller = Layout::new();
        smaller.insert(full.get("cat-feeling").unwrap().clone());
        assert!(ctl.retain(&smaller));
        assert_eq!(ctl.state(), &SelectionState::default());
        assert!(!ctl.retain(&smaller));
    }

    #[test]
    fn test_set_selected_reports_change() {
        let mut ctl = InteractionController::new(2.0);
        assert!(ctl.set_selected(Some("m1".to_string())));
        assert!(!ctl.set_selected(Some("m1".to_string())));
        assert!(ctl.set_selected(None));
    }
}
