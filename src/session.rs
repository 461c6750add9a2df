use crate::action::{
    ActionCanceler, ActionExecutor, ActionProtocol, ActionRequest, ActionTuning, Clock,
    PostActionEffect, is_destructive, parse_action_text, post_action_effect, validate_options,
};
use crate::command::{Command, HistoryDirection, ReadOnlyMode, parse};
use crate::error::ExplorerError;
use crate::filter::{FilterSpec, apply as apply_filter_spec};
use crate::model::{Catalog, ResourceKind};
use crate::view::{ResourceView, breadcrumb, build};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub ascending: bool,
}

#[derive(Debug, Default)]
pub struct MarkSet {
    marks: HashSet<String>,
    anchor: Option<usize>,
}

impl MarkSet {
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.marks.contains(id)
    }

    pub fn toggle(&mut self, id: &str, cursor: usize) {
        if !self.marks.remove(id) {
            self.marks.insert(id.to_string());
        }
        self.anchor = Some(cursor);
    }

    // Degrades to a single toggle when the anchor never existed or no longer
    // points inside the view.
    pub fn extend_range(&mut self, view: &ResourceView, cursor: usize) {
        match self.anchor {
            Some(anchor) if anchor < view.rows.len() => {
                let (start, end) = if anchor <= cursor {
                    (anchor, cursor)
                } else {
                    (cursor, anchor)
                };
                for row in &view.rows[start..=end] {
                    self.marks.insert(row.id.clone());
                }
            }
            _ => {
                if let Some(row) = view.rows.get(cursor) {
                    let id = row.id.clone();
                    self.toggle(&id, cursor);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.anchor = None;
    }

    pub fn targets(&self, view: &ResourceView, cursor: usize) -> Vec<String> {
        if !self.marks.is_empty() {
            return view
                .rows
                .iter()
                .filter(|row| self.marks.contains(&row.id))
                .map(|row| row.id.clone())
                .collect();
        }
        view.rows
            .get(cursor)
            .map(|row| vec![row.id.clone()])
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    None,
    Quit,
    Message(String),
    Recall(String),
}

pub struct SessionOptions {
    pub context: String,
    pub kind: ResourceKind,
    pub read_only: bool,
    pub actor: String,
    pub tuning: ActionTuning,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context: "default".to_string(),
            kind: ResourceKind::Vms,
            read_only: false,
            actor: "operator".to_string(),
            tuning: ActionTuning::default(),
        }
    }
}

pub struct Session {
    catalogs: HashMap<String, Catalog>,
    context: String,
    kind: ResourceKind,
    previous_kind: Option<ResourceKind>,
    base: ResourceView,
    view: ResourceView,
    filter_text: String,
    filter_spec: Option<FilterSpec>,
    cursor_row: usize,
    cursor_col: usize,
    sort: Option<SortState>,
    marks: MarkSet,
    columns_by_kind: HashMap<ResourceKind, Vec<String>>,
    read_only: bool,
    actor: String,
    history: Vec<String>,
    history_index: Option<usize>,
    protocol: ActionProtocol,
    executor: Box<dyn ActionExecutor>,
    canceler: Option<Box<dyn ActionCanceler>>,
    clock: Box<dyn Clock>,
}

impl Session {
    pub fn new(
        catalogs: HashMap<String, Catalog>,
        options: SessionOptions,
        executor: Box<dyn ActionExecutor>,
        canceler: Option<Box<dyn ActionCanceler>>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ExplorerError> {
        if !catalogs.contains_key(&options.context) {
            return Err(ExplorerError::UnknownContext(options.context));
        }
        let mut session = Self {
            catalogs,
            context: options.context,
            kind: options.kind,
            previous_kind: None,
            base: ResourceView {
                kind: options.kind,
                columns: Vec::new(),
                rows: Vec::new(),
                sort_keys: Vec::new(),
                actions: &[],
            },
            view: ResourceView {
                kind: options.kind,
                columns: Vec::new(),
                rows: Vec::new(),
                sort_keys: Vec::new(),
                actions: &[],
            },
            filter_text: String::new(),
            filter_spec: None,
            cursor_row: 0,
            cursor_col: 0,
            sort: None,
            marks: MarkSet::default(),
            columns_by_kind: HashMap::new(),
            read_only: options.read_only,
            actor: options.actor,
            history: Vec::new(),
            history_index: None,
            protocol: ActionProtocol::new(options.tuning),
            executor,
            canceler,
            clock,
        };
        session.rebuild();
        Ok(session)
    }

    pub fn view(&self) -> &ResourceView {
        &self.view
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn cursor_col(&self) -> usize {
        self.cursor_col
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn filter(&self) -> &str {
        &self.filter_text
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn protocol(&self) -> &ActionProtocol {
        &self.protocol
    }

    fn catalog(&self) -> &Catalog {
        &self.catalogs[&self.context]
    }

    pub fn breadcrumb(&self) -> String {
        let selected = self.view.rows.get(self.cursor_row).map(|row| row.id.as_str());
        breadcrumb(self.kind, selected, self.catalog())
    }

    pub fn handle(&mut self, line: &str) -> Result<Reply, ExplorerError> {
        let command = parse(line)?;
        if !matches!(command, Command::Noop | Command::History(_)) {
            self.history.push(line.to_string());
            self.history_index = None;
        }
        match command {
            Command::Noop => Ok(Reply::None),
            Command::Quit => Ok(Reply::Quit),
            Command::Help => Ok(Reply::Message(help_text())),
            Command::ReadOnly(mode) => {
                self.read_only = match mode {
                    ReadOnlyMode::On => true,
                    ReadOnlyMode::Off => false,
                    ReadOnlyMode::Toggle => !self.read_only,
                };
                Ok(Reply::Message(format!(
                    "read-only {}",
                    if self.read_only { "on" } else { "off" }
                )))
            }
            Command::LastView => {
                self.last_view()?;
                Ok(Reply::None)
            }
            Command::Filter(raw) => {
                self.apply_filter(&raw)?;
                Ok(Reply::None)
            }
            Command::View(kind) => {
                self.show(kind);
                Ok(Reply::None)
            }
            Command::Action(text) => {
                self.dispatch_action(&text)?;
                Ok(Reply::Message(format!("{text}: ok")))
            }
            Command::History(direction) => Ok(self.recall_history(direction)),
            Command::Suggest(prefix) => Ok(Reply::Message(self.suggest(&prefix).join(" "))),
            Command::Context(name) => self.switch_context(name),
            Command::Hotkey(token) => {
                self.handle_hotkey(&token)?;
                Ok(Reply::None)
            }
        }
    }

    pub fn show(&mut self, kind: ResourceKind) {
        if kind != self.kind {
            self.previous_kind = Some(self.kind);
            self.kind = kind;
            self.reset_view_state();
        }
        self.rebuild();
    }

    pub fn table_for(&self, kind: ResourceKind) -> ResourceView {
        self.projected_base(kind)
    }

    pub fn last_view(&mut self) -> Result<(), ExplorerError> {
        let previous = self.previous_kind.ok_or(ExplorerError::NoPreviousView)?;
        self.show(previous);
        Ok(())
    }

    fn reset_view_state(&mut self) {
        self.filter_text.clear();
        self.filter_spec = None;
        self.sort = None;
        self.marks.clear();
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    fn projected_base(&self, kind: ResourceKind) -> ResourceView {
        let full = build(kind, self.catalog());
        match self.columns_by_kind.get(&kind) {
            Some(names) => project_columns(&full, names),
            None => full,
        }
    }

    // Base view -> active filter -> active sort, then clamp the cursor.
    fn rebuild(&mut self) {
        self.base = self.projected_base(self.kind);
        let mut view = match &self.filter_spec {
            Some(spec) => {
                apply_filter_spec(&self.base, spec).unwrap_or_else(|_| self.base.clone())
            }
            None => self.base.clone(),
        };
        if let Some(sort) = self.sort {
            sort_rows(&mut view, sort.column, sort.ascending);
        }
        self.view = view;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        self.cursor_row = self
            .cursor_row
            .min(self.view.rows.len().saturating_sub(1));
        self.cursor_col = self
            .cursor_col
            .min(self.view.columns.len().saturating_sub(1));
    }

    pub fn apply_filter(&mut self, raw: &str) -> Result<(), ExplorerError> {
        match FilterSpec::parse(raw)? {
            None => {
                self.filter_text.clear();
                self.filter_spec = None;
            }
            Some(spec) => {
                // Validate against the base before committing so a bad
                // pattern leaves the active view untouched.
                apply_filter_spec(&self.base, &spec)?;
                self.filter_text = raw.to_string();
                self.filter_spec = Some(spec);
            }
        }
        self.rebuild();
        Ok(())
    }

    pub fn sort_by_column(&mut self, column: usize) -> Result<(), ExplorerError> {
        if column >= self.view.columns.len() {
            return Err(ExplorerError::InvalidCommand(format!(
                "no column {column} to sort"
            )));
        }
        let ascending = match self.sort {
            Some(sort) if sort.column == column => !sort.ascending,
            _ => true,
        };
        self.sort = Some(SortState { column, ascending });
        sort_rows(&mut self.view, column, ascending);
        Ok(())
    }

    pub fn invert_sort(&mut self) -> Result<(), ExplorerError> {
        let sort = self
            .sort
            .ok_or_else(|| ExplorerError::InvalidCommand("nothing is sorted".to_string()))?;
        let flipped = SortState {
            column: sort.column,
            ascending: !sort.ascending,
        };
        self.sort = Some(flipped);
        sort_rows(&mut self.view, flipped.column, flipped.ascending);
        Ok(())
    }

    pub fn select_columns(&mut self, names: &[String]) -> Result<(), ExplorerError> {
        if names.is_empty() {
            return Err(ExplorerError::InvalidColumns(
                "no columns selected".to_string(),
            ));
        }
        let full = build(self.kind, self.catalog());
        let mut canonical = Vec::with_capacity(names.len());
        for name in names {
            match full.column_index(name) {
                Some(index) => canonical.push(full.columns[index].clone()),
                None => {
                    return Err(ExplorerError::InvalidColumns(format!(
                        "unknown column '{name}'"
                    )));
                }
            }
        }
        self.columns_by_kind.insert(self.kind, canonical);
        // Column indices changed out from under the sort state.
        self.sort = None;
        self.rebuild();
        Ok(())
    }

    fn recall_history(&mut self, direction: HistoryDirection) -> Reply {
        if self.history.is_empty() {
            return Reply::Message("history is empty".to_string());
        }
        let next = match (direction, self.history_index) {
            (HistoryDirection::Up, None) => Some(self.history.len() - 1),
            (HistoryDirection::Up, Some(0)) => Some(0),
            (HistoryDirection::Up, Some(index)) => Some(index - 1),
            (HistoryDirection::Down, None) => None,
            (HistoryDirection::Down, Some(index)) if index + 1 >= self.history.len() => None,
            (HistoryDirection::Down, Some(index)) => Some(index + 1),
        };
        self.history_index = next;
        match next {
            Some(index) => Reply::Recall(self.history[index].clone()),
            None => Reply::Recall(String::new()),
        }
    }

    fn suggest(&self, prefix: &str) -> Vec<&'static str> {
        ResourceKind::ALL
            .iter()
            .map(|kind| kind.canonical())
            .filter(|name| name.starts_with(prefix))
            .collect()
    }

    fn switch_context(&mut self, name: Option<String>) -> Result<Reply, ExplorerError> {
        match name {
            None => {
                let mut known: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
                known.sort_unstable();
                Ok(Reply::Message(format!(
                    "context: {} (known: {})",
                    self.context,
                    known.join(", ")
                )))
            }
            Some(name) => {
                if !self.catalogs.contains_key(&name) {
                    return Err(ExplorerError::UnknownContext(name));
                }
                self.context = name;
                self.reset_view_state();
                self.previous_kind = None;
                self.rebuild();
                Ok(Reply::Message(format!("switched to context {}", self.context)))
            }
        }
    }

    fn handle_hotkey(&mut self, token: &str) -> Result<(), ExplorerError> {
        match token {
            "J" | "DOWN" => {
                if self.cursor_row + 1 < self.view.rows.len() {
                    self.cursor_row += 1;
                }
            }
            "K" | "UP" => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            "GG" => self.cursor_row = 0,
            "G" => {
                self.cursor_row = self.view.rows.len().saturating_sub(1);
            }
            "LEFT" => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
            }
            "RIGHT" => {
                if self.cursor_col + 1 < self.view.columns.len() {
                    self.cursor_col += 1;
                }
            }
            "SPACE" => {
                if let Some(row) = self.view.rows.get(self.cursor_row) {
                    let id = row.id.clone();
                    self.marks.toggle(&id, self.cursor_row);
                }
            }
            "CTRL+SPACE" => {
                self.marks.extend_range(&self.view, self.cursor_row);
            }
            "CTRL+U" => self.marks.clear(),
            "O" | "SHIFT+O" => self.sort_by_column(self.cursor_col)?,
            "I" => self.invert_sort()?,
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => {
                        let column = self
                            .view
                            .sort_column_for(letter)
                            .ok_or_else(|| ExplorerError::UnsupportedHotkey(token.to_string()))?;
                        self.sort_by_column(column)?;
                    }
                    _ => return Err(ExplorerError::UnsupportedHotkey(token.to_string())),
                }
            }
        }
        Ok(())
    }

    pub fn dispatch_action(&mut self, text: &str) -> Result<(), ExplorerError> {
        if self.read_only {
            return Err(ExplorerError::ReadOnly);
        }
        let (name, options) = parse_action_text(text)?;
        if !self.view.actions.contains(&name.as_str()) {
            return Err(ExplorerError::InvalidAction(format!(
                "'{name}' is not supported for {}",
                self.kind.canonical()
            )));
        }
        validate_options(self.kind, &name, &options, self.catalog())?;
        let targets = self.marks.targets(&self.view, self.cursor_row);
        if targets.is_empty() {
            return Err(ExplorerError::InvalidAction(
                "no marked or selected targets".to_string(),
            ));
        }

        debug!(action = %name, targets = targets.len(), destructive = is_destructive(&name), "dispatching action");
        let request = ActionRequest {
            kind: self.kind,
            action: name.clone(),
            targets: targets.clone(),
        };
        self.protocol
            .dispatch(request, &self.actor, self.executor.as_mut(), self.clock.as_ref())?;

        if let Some(PostActionEffect::SetHostConnection { state }) =
            post_action_effect(self.kind, &name)
        {
            let catalog = self
                .catalogs
                .get_mut(&self.context)
                .expect("active context always has a catalog");
            for target in &targets {
                if let Some(host) = catalog.host_mut(target) {
                    host.connection_state = state.to_string();
                }
            }
            self.protocol
                .record_post_state(&name, state, self.clock.as_ref());
            self.rebuild();
        }
        Ok(())
    }

    pub fn cancel_last_action(&mut self) -> Result<(), ExplorerError> {
        // Rewrapping per arm gives the unsized coercion a construction site.
        match self.canceler.as_deref_mut() {
            Some(canceler) => self.protocol.cancel_last(Some(canceler), self.clock.as_ref()),
            None => self.protocol.cancel_last(None, self.clock.as_ref()),
        }
    }
}

fn project_columns(full: &ResourceView, names: &[String]) -> ResourceView {
    let indices: Vec<usize> = names
        .iter()
        .filter_map(|name| full.column_index(name))
        .collect();
    let rows = full
        .rows
        .iter()
        .map(|row| crate::view::RowEntry {
            id: row.id.clone(),
            cells: indices.iter().map(|&i| row.cells[i].clone()).collect(),
        })
        .collect();
    let sort_keys = full
        .sort_keys
        .iter()
        .filter_map(|(key, column)| {
            indices
                .iter()
                .position(|&i| i == *column)
                .map(|new_index| (*key, new_index))
        })
        .collect();
    ResourceView {
        kind: full.kind,
        columns: indices.iter().map(|&i| full.columns[i].clone()).collect(),
        rows,
        sort_keys,
        actions: full.actions,
    }
}

fn sort_rows(view: &mut ResourceView, column: usize, ascending: bool) {
    view.rows.sort_by(|a, b| {
        let ordering = compare_cells(&a.cells[column], &b.cells[column]);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

// Numeric when both sides parse as integers, case-insensitive text otherwise.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
    }
}

fn help_text() -> String {
    [
        ":<resource>      switch view (vm, host, cluster, ds, snap, ...)",
        ":-               back to the previous view",
        "/<expr>          filter (regex, !inverse, -t k=v, -f fuzzy)",
        "!<action> [k=v]  run an action on marked or selected rows",
        "space            mark, ctrl+space range mark, ctrl+u clear marks",
        "o                sort by selected column, i invert direction",
        ":ro [on|off]     toggle read-only, :ctx [name] switch context",
        ":q               quit",
    ]
    .join("\n")
}
