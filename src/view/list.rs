//! Fuzzy-filtered list view (spec.md §4.H).
//!
//! Works over the unique text set of matches (the caller is expected to
//! pass a `unique_level=2`-deduplicated list). Grounded on skim's
//! `tui/item_list.rs` scrolling/clamping arithmetic
//! (`this.offset`/`this.current` in `ItemList::render`) and its use of
//! `unicode_width` for column math; re-filtering and re-ranking every frame
//! is this spec's own rule (§4.H "on each frame: run §B with the current
//! query"), not skim's background-thread pipeline, since here there is no
//! expensive item source to keep off the render path.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};

use super::{to_ratatui_style, Tui};
use crate::fuzzy::{rank, FuzzyMatch};
use crate::{ChosenMatch, Match, Style};

/// Maximum result rows shown below the prompt (spec.md §4.H `maxVisibleItems`).
pub const MAX_VISIBLE_ITEMS: usize = 10;

/// Static configuration for a list session.
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
    /// Whether `Tab` accumulates multiple selections before exiting
    pub multi: bool,
    /// Visible result rows (defaults to [`MAX_VISIBLE_ITEMS`])
    pub visible: usize,
    /// Style for the currently highlighted row
    pub select_style: Style,
}

impl Default for ListConfig {
    fn default() -> Self {
        use crate::{Color, NamedColor};
        Self {
            multi: false,
            visible: MAX_VISIBLE_ITEMS,
            select_style: Style { fg: Some(Color::NamedPalette(NamedColor::Blue)), bg: Some(Color::NamedPalette(NamedColor::Black)), ..Style::default() },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    Exit,
}

struct State {
    query: String,
    selected_index: usize,
    scroll_offset: usize,
    chosen: Vec<ChosenMatch>,
    multi: bool,
    visible: usize,
    select_style: Style,
}

impl State {
    fn new(config: ListConfig) -> Self {
        Self {
            query: String::new(),
            selected_index: 0,
            scroll_offset: 0,
            chosen: Vec::new(),
            multi: config.multi,
            visible: config.visible.max(1),
            select_style: config.select_style,
        }
    }

    /// Clamps `selected_index`/`scroll_offset` against the current filtered
    /// set (spec.md §4.H "on each frame").
    fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected_index = self.selected_index.min(total - 1);
        let (min_offset, max_offset) = offset_bounds(self.selected_index, total, self.visible);
        self.scroll_offset = self.scroll_offset.clamp(min_offset, max_offset);
    }

    fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn move_down(&mut self, total: usize) {
        if total > 0 {
            self.selected_index = (self.selected_index + 1).min(total - 1);
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, filtered: &[FuzzyMatch]) -> Outcome {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Esc => return Outcome::Exit,
            KeyCode::Char('c') if ctrl => return Outcome::Exit,
            KeyCode::Enter => {
                self.choose_highlighted(filtered);
                if !self.multi {
                    return Outcome::Exit;
                }
            }
            KeyCode::Tab if self.multi => {
                self.choose_highlighted(filtered);
            }
            KeyCode::Backspace => {
                self.query.pop();
            }
            KeyCode::Char('u') if ctrl => {
                self.query.clear();
            }
            KeyCode::Char('p') | KeyCode::Char('k') if ctrl => self.move_up(),
            KeyCode::Char('n') | KeyCode::Char('j') if ctrl => self.move_down(filtered.len()),
            KeyCode::Char(ch) if !ctrl && (ch as u32) >= 0x20 && (ch as u32) < 0x7F => {
                self.query.push(ch);
            }
            _ => {}
        }
        Outcome::Continue
    }

    fn choose_highlighted(&mut self, filtered: &[FuzzyMatch]) {
        if let Some(fm) = filtered.get(self.selected_index) {
            self.chosen.push(ChosenMatch { text: fm.text.to_string(), uppercase: false, should_open_file: false });
        }
    }

    /// Resolves the final selection on exit (spec.md §4.H "on exit").
    fn resolve(mut self, filtered: &[FuzzyMatch]) -> Vec<ChosenMatch> {
        if self.chosen.is_empty() {
            if let Some(fm) = filtered.get(self.selected_index) {
                self.chosen.push(ChosenMatch { text: fm.text.to_string(), uppercase: false, should_open_file: false });
            }
        }
        self.chosen
    }
}

fn offset_bounds(selected_index: usize, total: usize, visible: usize) -> (usize, usize) {
    let si = selected_index as i64;
    let vis = visible as i64;
    let tot = total as i64;
    let min_offset = (si - vis + 1).max(0);
    let max_offset = (tot - vis).min(si).max(0);
    (min_offset as usize, max_offset.max(min_offset) as usize)
}

fn filtered_matches<'a>(candidates: &'a [Match], query: &str) -> Vec<FuzzyMatch<'a>> {
    let texts: Vec<&str> = candidates.iter().map(|m| m.text.as_str()).collect();
    rank(query, &texts)
}

fn render(state: &State, filtered: &[FuzzyMatch], frame: &mut ratatui::Frame) {
    let visible = state.visible.min(filtered.len().max(1)) as u16;
    let layout = Layout::default().direction(Direction::Vertical).constraints([Constraint::Length(1), Constraint::Length(visible)]).split(frame.area());

    let prompt = Line::from(format!("[ {}/{} ] > {}", state.chosen.len(), filtered.len(), state.query));
    frame.render_widget(Paragraph::new(prompt), layout[0]);

    let items: Vec<ListItem> = filtered
        .iter()
        .enumerate()
        .skip(state.scroll_offset)
        .take(state.visible)
        .map(|(i, fm)| {
            let style = if i == state.selected_index { to_ratatui_style(state.select_style) } else { ratatui::style::Style::default() };
            ListItem::new(Line::from(Span::styled(fm.text.to_string(), style)))
        })
        .collect();
    frame.render_widget(List::new(items), layout[1]);
}

/// Runs the list session to completion (spec.md §4.H).
///
/// `candidates` should already be the unique text set (`unique_level=2`).
pub fn present(candidates: &[Match], config: ListConfig) -> io::Result<Vec<ChosenMatch>> {
    let mut tui = Tui::inline((config.visible.max(1) + 1) as u16)?;
    tui.enter()?;
    let result = run(&mut tui, candidates, config);
    tui.exit()?;
    result
}

fn run<B: ratatui::backend::Backend>(tui: &mut Tui<B>, candidates: &[Match], config: ListConfig) -> io::Result<Vec<ChosenMatch>> {
    let mut state = State::new(config);
    loop {
        let filtered = filtered_matches(candidates, &state.query);
        state.clamp(filtered.len());
        tui.terminal.draw(|frame| render(&state, &filtered, frame))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match state.handle_key(key.code, key.modifiers, &filtered) {
                Outcome::Continue => {}
                Outcome::Exit => return Ok(state.resolve(&filtered)),
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(text: &str) -> Match {
        Match { x: 0, y: 0, pattern: "test".into(), text: text.into(), hint: None }
    }

    #[test]
    fn offset_bounds_match_spec_formula() {
        // selected_index=5, total=20, visible=10 -> min_offset=max(5-10+1,0)=0, max_offset=max(min(10,5),0)=5
        assert_eq!(offset_bounds(5, 20, 10), (0, 5));
        // selected_index=15, total=20, visible=10 -> min_offset=max(15-10+1,0)=6, max_offset=max(min(10,15),0)=10
        assert_eq!(offset_bounds(15, 20, 10), (6, 10));
    }

    #[test]
    fn clamp_resets_on_empty_filtered_set() {
        let mut state = State::new(ListConfig::default());
        state.selected_index = 3;
        state.scroll_offset = 2;
        state.clamp(0);
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn typing_appends_to_query() {
        let mut state = State::new(ListConfig::default());
        let candidates = vec![m("alpha"), m("beta")];
        let filtered = filtered_matches(&candidates, "");
        state.handle_key(KeyCode::Char('a'), KeyModifiers::empty(), &filtered);
        assert_eq!(state.query, "a");
    }

    #[test]
    fn enter_without_multi_exits() {
        let mut state = State::new(ListConfig { multi: false, ..ListConfig::default() });
        let candidates = vec![m("alpha")];
        let filtered = filtered_matches(&candidates, "");
        let outcome = state.handle_key(KeyCode::Enter, KeyModifiers::empty(), &filtered);
        assert_eq!(outcome, Outcome::Exit);
        assert_eq!(state.chosen[0].text, "alpha");
    }

    #[test]
    fn tab_only_accumulates_in_multi_mode() {
        let mut state = State::new(ListConfig { multi: true, ..ListConfig::default() });
        let candidates = vec![m("alpha"), m("beta")];
        let filtered = filtered_matches(&candidates, "");
        let outcome = state.handle_key(KeyCode::Tab, KeyModifiers::empty(), &filtered);
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.chosen.len(), 1);
    }

    #[test]
    fn resolve_falls_back_to_highlighted_item_when_nothing_chosen() {
        let state = State::new(ListConfig::default());
        let candidates = vec![m("alpha"), m("beta")];
        let filtered = filtered_matches(&candidates, "");
        let chosen = state.resolve(&filtered);
        assert_eq!(chosen, vec![ChosenMatch { text: "alpha".into(), uppercase: false, should_open_file: false }]);
    }

    #[test]
    fn resolve_keeps_explicit_chosen_over_highlighted() {
        let mut state = State::new(ListConfig { multi: true, ..ListConfig::default() });
        let candidates = vec![m("alpha"), m("beta")];
        let filtered = filtered_matches(&candidates, "");
        state.choose_highlighted(&filtered);
        state.selected_index = 1;
        let chosen = state.resolve(&filtered);
        assert_eq!(chosen, vec![ChosenMatch { text: "alpha".into(), uppercase: false, should_open_file: false }]);
    }

    #[test]
    fn ctrl_u_clears_query() {
        let mut state = State::new(ListConfig::default());
        state.query = "abc".to_string();
        let candidates = vec![m("alpha")];
        let filtered = filtered_matches(&candidates, "");
        state.handle_key(KeyCode::Char('u'), KeyModifiers::CONTROL, &filtered);
        assert!(state.query.is_empty());
    }

    #[test]
    fn ctrl_n_moves_down_and_ctrl_p_moves_up() {
        let mut state = State::new(ListConfig::default());
        let candidates = vec![m("alpha"), m("beta"), m("gamma")];
        let filtered = filtered_matches(&candidates, "");
        state.handle_key(KeyCode::Char('n'), KeyModifiers::CONTROL, &filtered);
        assert_eq!(state.selected_index, 1);
        state.handle_key(KeyCode::Char('p'), KeyModifiers::CONTROL, &filtered);
        assert_eq!(state.selected_index, 0);
    }
}
