use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use arboard::Clipboard;
use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::{wrap, Options as WrapOptions};
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::editor;
use crate::highlight;
use crate::snippet::{self, Folder, Snippet};
use crate::storage;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);

const COPY_BANNER_DURATION: Duration = Duration::from_secs(1);

/// Colors threaded into the controller at construction. Nothing here
/// is global; the value is built once from the config and handed to
/// `Model::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub syntax: String,
    pub primary: Color,
    pub primary_subdued: Color,
    pub green: Color,
    pub bright_green: Color,
    pub red: Color,
    pub bright_red: Color,
    pub gray: Color,
}

impl Theme {
    pub fn from_config(ui: &config::UIConfig) -> Self {
        Self {
            syntax: ui.theme.clone(),
            primary: parse_color(&ui.primary_color, COLOR_TEXT_PRIMARY),
            primary_subdued: parse_color(&ui.primary_color_subdued, COLOR_TEXT_SECONDARY),
            green: parse_color(&ui.green_color, Color::Green),
            bright_green: parse_color(&ui.bright_green_color, Color::LightGreen),
            red: parse_color(&ui.red_color, Color::Red),
            bright_red: parse_color(&ui.bright_red_color, Color::LightRed),
            gray: parse_color(&ui.gray_color, Color::DarkGray),
        }
    }
}

/// Accepts `#RRGGBB` hex or a 0-255 terminal palette index.
fn parse_color(value: &str, fallback: Color) -> Color {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(n) = u32::from_str_radix(hex, 16) {
                return Color::Rgb((n >> 16) as u8, (n >> 8) as u8, n as u8);
            }
        }
        return fallback;
    }
    match value.parse::<u8>() {
        Ok(index) => Color::Indexed(index),
        Err(_) => fallback,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pane {
    Snippets,
    Content,
    Folders,
}

impl Pane {
    fn title(self) -> &'static str {
        match self {
            Pane::Snippets => "Snippets",
            Pane::Content => "Content",
            Pane::Folders => "Folders",
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Snippets => Pane::Content,
            Pane::Content => Pane::Folders,
            Pane::Folders => Pane::Snippets,
        }
    }

    fn previous(self) -> Self {
        match self {
            Pane::Snippets => Pane::Folders,
            Pane::Content => Pane::Snippets,
            Pane::Folders => Pane::Content,
        }
    }
}

/// The interaction mode. Exactly one is active; it gates which key
/// bindings apply and what the snippet-list title bar shows.
/// Navigating is the initial state and Quitting is terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum AppState {
    Navigating,
    Creating,
    Deleting,
    Copying,
    Pasting,
    Editing,
    Quitting,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
enum EditField {
    Folder,
    #[default]
    Name,
    Language,
}

impl EditField {
    fn next(self) -> Self {
        match self {
            EditField::Folder => EditField::Name,
            EditField::Name => EditField::Language,
            EditField::Language => EditField::Folder,
        }
    }

    fn previous(self) -> Self {
        match self {
            EditField::Folder => EditField::Language,
            EditField::Name => EditField::Folder,
            EditField::Language => EditField::Name,
        }
    }
}

/// The three-field sub-form shown while renaming or reclassifying a
/// snippet. All three buffers are visible; one holds keyboard focus.
#[derive(Default)]
struct EditForm {
    active: EditField,
    folder: String,
    name: String,
    language: String,
}

impl EditForm {
    fn seed(&mut self, snippet: &Snippet, active: EditField) {
        self.folder = snippet.folder.clone();
        self.name = if snippet.name == snippet::DEFAULT_NAME {
            String::new()
        } else {
            snippet.name.clone()
        };
        self.language = snippet.language.clone();
        self.active = active;
    }

    fn next(&mut self) {
        self.active = self.active.next();
    }

    fn previous(&mut self) {
        self.active = self.active.previous();
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.active {
            EditField::Folder => &mut self.folder,
            EditField::Name => &mut self.name,
            EditField::Language => &mut self.language,
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.active_value_mut().push(ch);
    }

    fn backspace(&mut self) {
        self.active_value_mut().pop();
    }

    fn display_value(&self, field: EditField, placeholder: &str) -> (String, bool) {
        let raw = match field {
            EditField::Folder => &self.folder,
            EditField::Name => &self.name,
            EditField::Language => &self.language,
        };
        if raw.is_empty() {
            (placeholder.to_string(), true)
        } else {
            (raw.clone(), false)
        }
    }
}

/// What the content pane currently shows.
#[derive(Clone, PartialEq, Debug)]
enum ContentView {
    Rendered {
        code: Text<'static>,
        gutter: Text<'static>,
    },
    Hint(Vec<(&'static str, &'static str)>),
    Error(String),
}

fn no_content_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("e", "edit contents"),
        ("p", "paste clipboard"),
        ("r", "rename"),
        ("R", "set folder"),
        ("L", "set language"),
    ]
}

fn empty_list_hints() -> Vec<(&'static str, &'static str)> {
    vec![("n", "create a new snippet")]
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TitleTone {
    Normal,
    Destructive,
    Success,
}

/// Derived per-frame chrome. Pane focus and application state are
/// orthogonal fields on the model; this struct is recomputed from the
/// pair in one reconciliation step after every message, so neither
/// side ever mutates the other.
#[derive(Clone, PartialEq, Debug)]
struct PaneChrome {
    snippets_border: Color,
    content_border: Color,
    folders_border: Color,
    list_title: String,
    list_tone: TitleTone,
}

struct PendingContent {
    request_id: u64,
}

enum AsyncResponse {
    Content {
        request_id: u64,
        view: ContentView,
    },
    CopyDone {
        request_id: u64,
        result: Result<String>,
    },
    CopyBannerExpired {
        request_id: u64,
    },
    PasteDone {
        request_id: u64,
        result: Result<()>,
    },
    Created {
        request_id: u64,
        snippet: Snippet,
    },
}

pub struct Options {
    pub snippets: Vec<Snippet>,
    pub theme: Theme,
    pub default_language: String,
    pub store: storage::Store,
    pub initial_folder: usize,
    pub status_message: String,
}

pub struct Model {
    store: storage::Store,
    theme: Theme,
    default_language: String,

    lists: BTreeMap<Folder, Vec<Snippet>>,
    folders: Vec<Folder>,
    selected_folder: usize,
    selections: HashMap<String, usize>,

    focused_pane: Pane,
    state: AppState,
    chrome: PaneChrome,

    edit_form: EditForm,
    filtering: bool,
    filter_query: String,
    matcher: SkimMatcherV2,

    content: ContentView,
    content_scroll: u16,
    copied_name: Option<String>,

    status_message: String,
    needs_redraw: bool,
    pending_editor: Option<std::path::PathBuf>,

    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    next_request_id: u64,
    pending_content: Option<PendingContent>,
    pending_copy: Option<u64>,
    pending_paste: Option<u64>,
    pending_create: Option<u64>,
    copy_banner: Option<u64>,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let (response_tx, response_rx) = unbounded();

        let mut lists: BTreeMap<Folder, Vec<Snippet>> = BTreeMap::new();
        for snippet in options.snippets {
            lists
                .entry(Folder(snippet.folder.clone()))
                .or_default()
                .push(snippet);
        }

        let mut model = Self {
            store: options.store,
            theme: options.theme,
            default_language: options.default_language,
            lists,
            folders: Vec::new(),
            selected_folder: 0,
            selections: HashMap::new(),
            focused_pane: Pane::Snippets,
            state: AppState::Navigating,
            chrome: PaneChrome {
                snippets_border: COLOR_TEXT_SECONDARY,
                content_border: COLOR_TEXT_SECONDARY,
                folders_border: COLOR_TEXT_SECONDARY,
                list_title: Pane::Snippets.title().to_string(),
                list_tone: TitleTone::Normal,
            },
            edit_form: EditForm::default(),
            filtering: false,
            filter_query: String::new(),
            matcher: SkimMatcherV2::default(),
            content: ContentView::Hint(empty_list_hints()),
            content_scroll: 0,
            copied_name: None,
            status_message: options.status_message,
            needs_redraw: true,
            pending_editor: None,
            response_tx,
            response_rx,
            next_request_id: 1,
            pending_content: None,
            pending_copy: None,
            pending_paste: None,
            pending_create: None,
            copy_banner: None,
        };

        model.sync_folders();
        // initial_folder comes from persisted session state and may be
        // out of range for the current store; apply it only once the
        // folder list exists, or the restored index is lost.
        model.selected_folder = options
            .initial_folder
            .min(model.folders.len().saturating_sub(1));
        model.reconcile_styles();
        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Snapshot of every snippet in folder order, for persistence.
    /// An empty store maps to the single placeholder snippet so the
    /// next launch still has something to show.
    pub fn snapshot(&self) -> Vec<Snippet> {
        let all: Vec<Snippet> = self.lists.values().flatten().cloned().collect();
        if all.is_empty() {
            storage::placeholder_snippets(&self.default_language)
        } else {
            all
        }
    }

    pub fn session_state(&self) -> storage::SessionState {
        storage::SessionState {
            current_folder: self.selected_folder,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        self.refresh_content();

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }
            self.reconcile_styles();

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            if let Some(path) = self.pending_editor.take() {
                self.run_editor(terminal, &path)?;
                continue;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {err}");
                                self.mark_dirty();
                            }
                        }
                    }
                }
            }

            if self.poll_async() {
                self.mark_dirty();
            }
            self.reconcile_styles();

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    // --- selection and partitions ---------------------------------

    fn current_folder(&self) -> Option<&Folder> {
        self.folders.get(self.selected_folder)
    }

    fn current_items(&self) -> &[Snippet] {
        self.current_folder()
            .and_then(|folder| self.lists.get(folder))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn selection(&self) -> usize {
        self.current_folder()
            .and_then(|folder| self.selections.get(folder.as_str()))
            .copied()
            .unwrap_or(0)
    }

    fn set_selection(&mut self, index: usize) {
        if let Some(folder) = self.current_folder().cloned() {
            self.selections.insert(folder.0, index);
        }
    }

    /// Indices into the current partition that survive the active
    /// filter query, in partition order.
    fn visible_indices(&self) -> Vec<usize> {
        let items = self.current_items();
        if self.filter_query.is_empty() {
            return (0..items.len()).collect();
        }
        items
            .iter()
            .enumerate()
            .filter(|(_, snippet)| {
                self.matcher
                    .fuzzy_match(&snippet.filter_key(), &self.filter_query)
                    .is_some()
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn selected_snippet(&self) -> Option<&Snippet> {
        let visible = self.visible_indices();
        if visible.is_empty() {
            return None;
        }
        let slot = self.selection().min(visible.len() - 1);
        self.current_items().get(visible[slot])
    }

    /// Keeps the per-folder snippet partitions and the folder list
    /// consistent after any structural mutation: relocates snippets
    /// whose folder field no longer matches their partition key,
    /// recomputes the folder list from the non-empty partitions (or
    /// the default placeholder folder when the store is empty),
    /// preserves the selected folder where possible, and clamps every
    /// selection index back into range.
    fn sync_folders(&mut self) {
        let mut relocated: Vec<Snippet> = Vec::new();
        for (key, items) in self.lists.iter_mut() {
            let mut index = 0;
            while index < items.len() {
                if items[index].folder != key.0 {
                    relocated.push(items.remove(index));
                } else {
                    index += 1;
                }
            }
        }
        for snippet in relocated {
            self.lists
                .entry(Folder(snippet.folder.clone()))
                .or_default()
                .push(snippet);
        }
        self.lists.retain(|_, items| !items.is_empty());

        let previous = self.current_folder().cloned();
        self.folders = self.lists.keys().cloned().collect();
        if self.folders.is_empty() {
            self.folders.push(Folder(snippet::DEFAULT_FOLDER.to_string()));
        }
        self.selected_folder = previous
            .and_then(|folder| self.folders.iter().position(|key| *key == folder))
            .unwrap_or(0);

        for folder in &self.folders {
            let len = self.lists.get(folder).map_or(0, Vec::len);
            let slot = self.selections.entry(folder.0.clone()).or_insert(0);
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    fn persist(&mut self) {
        let snapshot = self.snapshot();
        if let Err(err) = self.store.save(&snapshot) {
            self.status_message = format!("Failed to save snippets: {err}");
        }
    }

    // --- state machine --------------------------------------------

    /// Transitions to `new_state`. A transition to the state already
    /// active is a no-op, so re-entry never stacks side effects.
    fn set_state(&mut self, new_state: AppState) {
        if self.state == new_state {
            return;
        }
        self.state = new_state;
        if new_state == AppState::Navigating {
            self.copied_name = None;
        }
        self.mark_dirty();
    }

    /// Derives the pane chrome from the (focus, state) pair. This is
    /// the only place styles are computed; it runs after every
    /// processed message.
    fn reconcile_styles(&mut self) {
        let border = |pane: Pane, theme: &Theme, focused: Pane| {
            if pane == focused {
                theme.primary
            } else {
                theme.gray
            }
        };
        let (list_title, list_tone) = match self.state {
            AppState::Deleting => ("Delete snippet? (y/N)".to_string(), TitleTone::Destructive),
            AppState::Copying => {
                let name = self.copied_name.as_deref().unwrap_or(snippet::DEFAULT_NAME);
                (format!("Copied {name}!"), TitleTone::Success)
            }
            _ => (Pane::Snippets.title().to_string(), TitleTone::Normal),
        };
        let chrome = PaneChrome {
            snippets_border: border(Pane::Snippets, &self.theme, self.focused_pane),
            content_border: border(Pane::Content, &self.theme, self.focused_pane),
            folders_border: border(Pane::Folders, &self.theme, self.focused_pane),
            list_title,
            list_tone,
        };
        if chrome != self.chrome {
            self.chrome = chrome;
            self.mark_dirty();
        }
    }

    // --- key routing ----------------------------------------------

    /// Routes one key press. Interception order: deletion
    /// confirmation, then editing-mode text entry, then the active
    /// filter input; only then does the key reach pane-level routing.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.quit();
        }

        match self.state {
            AppState::Quitting => return Ok(true),
            AppState::Deleting => {
                self.handle_deleting_key(key.code);
                return Ok(false);
            }
            AppState::Editing => {
                self.handle_editing_key(key.code);
                return Ok(false);
            }
            AppState::Copying => {
                // Any key dismisses the copy banner.
                self.set_state(AppState::Navigating);
                return Ok(false);
            }
            _ => {}
        }

        if self.filtering {
            self.handle_filter_key(key.code);
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return self.quit(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.focused_pane = self.focused_pane.next();
                self.mark_dirty();
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.focused_pane = self.focused_pane.previous();
                self.mark_dirty();
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Char('J') => self.move_snippet(1),
            KeyCode::Char('K') => self.move_snippet(-1),
            KeyCode::Char('/') => {
                self.filtering = true;
                self.filter_query.clear();
                self.set_selection(0);
                self.focused_pane = Pane::Snippets;
                self.mark_dirty();
            }
            KeyCode::Enter if self.focused_pane == Pane::Folders => self.jump_to_folder(),
            KeyCode::Char('n') => self.create_new_snippet(),
            KeyCode::Char('x') => self.begin_delete(),
            KeyCode::Char('c') => self.copy_selected(),
            KeyCode::Char('p') => self.paste_into_selected(),
            KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('r') => self.begin_edit(EditField::Name),
            KeyCode::Char('R') => self.begin_edit(EditField::Folder),
            KeyCode::Char('L') => self.begin_edit(EditField::Language),
            _ => {}
        }

        Ok(false)
    }

    fn quit(&mut self) -> Result<bool> {
        self.set_state(AppState::Quitting);
        self.persist();
        Ok(true)
    }

    fn handle_deleting_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') => self.confirm_delete(),
            KeyCode::Char('N') | KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
                self.set_state(AppState::Navigating);
            }
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Enter => self.commit_edit(),
            KeyCode::Tab | KeyCode::Down => {
                self.edit_form.next();
                self.mark_dirty();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.edit_form.previous();
                self.mark_dirty();
            }
            KeyCode::Backspace => {
                self.edit_form.backspace();
                self.mark_dirty();
            }
            KeyCode::Char(ch) => {
                self.edit_form.insert_char(ch);
                self.mark_dirty();
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.filtering = false;
                self.filter_query.clear();
            }
            KeyCode::Enter => {
                self.filtering = false;
            }
            KeyCode::Backspace => {
                self.filter_query.pop();
            }
            KeyCode::Char(ch) => {
                self.filter_query.push(ch);
            }
            _ => return,
        }
        let visible = self.visible_indices();
        let clamped = self.selection().min(visible.len().saturating_sub(1));
        self.set_selection(clamped);
        self.refresh_content();
    }

    fn move_down(&mut self) {
        match self.focused_pane {
            Pane::Snippets => {
                let visible = self.visible_indices();
                if visible.is_empty() {
                    return;
                }
                let next = (self.selection() + 1).min(visible.len() - 1);
                if next != self.selection() {
                    self.set_selection(next);
                    self.refresh_content();
                }
            }
            Pane::Folders => self.select_folder(self.selected_folder.saturating_add(1)),
            Pane::Content => {
                self.content_scroll = self.content_scroll.saturating_add(1);
                self.mark_dirty();
            }
        }
    }

    fn move_up(&mut self) {
        match self.focused_pane {
            Pane::Snippets => {
                let current = self.selection();
                if current > 0 {
                    self.set_selection(current - 1);
                    self.refresh_content();
                }
            }
            Pane::Folders => {
                if self.selected_folder > 0 {
                    self.select_folder(self.selected_folder - 1);
                }
            }
            Pane::Content => {
                self.content_scroll = self.content_scroll.saturating_sub(1);
                self.mark_dirty();
            }
        }
    }

    fn select_folder(&mut self, index: usize) {
        let clamped = index.min(self.folders.len().saturating_sub(1));
        if clamped == self.selected_folder {
            return;
        }
        self.selected_folder = clamped;
        self.filter_query.clear();
        self.filtering = false;
        self.refresh_content();
    }

    /// Enter on the folder pane re-applies the selected folder as the
    /// snippet list's partition and moves focus there, instead of
    /// cycling panes.
    fn jump_to_folder(&mut self) {
        self.filter_query.clear();
        self.filtering = false;
        self.focused_pane = Pane::Snippets;
        self.refresh_content();
    }

    /// Swaps the selected snippet with its neighbor inside its
    /// partition. Disabled while a filter is active, since the visible
    /// order is not the stored order.
    fn move_snippet(&mut self, delta: i64) {
        if self.focused_pane != Pane::Snippets || !self.filter_query.is_empty() {
            return;
        }
        let Some(folder) = self.current_folder().cloned() else {
            return;
        };
        let current = self.selection();
        let target = current as i64 + delta;
        let Some(items) = self.lists.get_mut(&folder) else {
            return;
        };
        if target < 0 || target as usize >= items.len() || current >= items.len() {
            return;
        }
        items.swap(current, target as usize);
        self.selections.insert(folder.0, target as usize);
        self.persist();
        self.mark_dirty();
    }

    // --- snippet operations ---------------------------------------

    fn begin_delete(&mut self) {
        if self.visible_indices().is_empty() {
            return;
        }
        self.focused_pane = Pane::Snippets;
        self.set_state(AppState::Deleting);
    }

    fn confirm_delete(&mut self) {
        let visible = self.visible_indices();
        let Some(folder) = self.current_folder().cloned() else {
            return;
        };
        if let Some(&index) = visible.get(self.selection().min(visible.len().saturating_sub(1))) {
            if let Some(items) = self.lists.get_mut(&folder) {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
        self.sync_folders();
        self.set_state(AppState::Navigating);
        self.persist();
        self.refresh_content();
    }

    fn create_new_snippet(&mut self) {
        self.set_state(AppState::Creating);

        let folder = self
            .current_folder()
            .map(|folder| folder.0.clone())
            .unwrap_or_else(|| snippet::DEFAULT_FOLDER.to_string());
        let language = self.default_language.clone();
        let file = format!("snippet-{}.{}", Utc::now().timestamp_millis(), language);
        let dir = self.store.home().join(&folder);

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_create = Some(request_id);

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            // A failed create still yields a snippet; the missing file
            // renders as a hint until the user edits or pastes.
            let _ = fs::create_dir_all(&dir);
            let _ = fs::File::create(dir.join(&file));
            let snippet = Snippet {
                tags: Vec::new(),
                folder,
                date: Utc::now(),
                favorite: false,
                name: snippet::DEFAULT_NAME.to_string(),
                file,
                language,
            };
            let _ = tx.send(AsyncResponse::Created {
                request_id,
                snippet,
            });
        });
    }

    fn copy_selected(&mut self) {
        let Some(selected) = self.selected_snippet().cloned() else {
            return;
        };
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_copy = Some(request_id);

        let path = self.store.snippet_path(&selected);
        let name = selected.name;
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result: Result<String> = (|| {
                let content = fs::read_to_string(&path)?;
                let mut clipboard = Clipboard::new()?;
                clipboard.set_text(content)?;
                Ok(name)
            })();
            let _ = tx.send(AsyncResponse::CopyDone { request_id, result });
        });
    }

    fn paste_into_selected(&mut self) {
        let Some(selected) = self.selected_snippet().cloned() else {
            return;
        };
        self.set_state(AppState::Pasting);

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_paste = Some(request_id);

        let path = self.store.snippet_path(&selected);
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result: Result<()> = (|| {
                let mut clipboard = Clipboard::new()?;
                let content = clipboard.get_text()?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
                file.write_all(content.as_bytes())?;
                Ok(())
            })();
            let _ = tx.send(AsyncResponse::PasteDone { request_id, result });
        });
    }

    fn edit_selected(&mut self) {
        let Some(selected) = self.selected_snippet() else {
            return;
        };
        self.pending_editor = Some(self.store.snippet_path(selected));
    }

    fn begin_edit(&mut self, field: EditField) {
        let Some(selected) = self.selected_snippet().cloned() else {
            return;
        };
        self.edit_form.seed(&selected, field);
        self.focused_pane = Pane::Content;
        self.set_state(AppState::Editing);
    }

    /// Commits the edit form back onto the selected snippet: empty
    /// name and folder buffers fall back to their placeholders, the
    /// language buffer is taken verbatim (empty reverts to the
    /// configured default). The backing file is renamed to match; a
    /// failed rename is swallowed and the in-memory snippet still
    /// updates, accepting drift between model and disk.
    fn commit_edit(&mut self) {
        let visible = self.visible_indices();
        let Some(folder_key) = self.current_folder().cloned() else {
            self.set_state(AppState::Navigating);
            return;
        };
        let Some(&index) = visible.get(self.selection().min(visible.len().saturating_sub(1)))
        else {
            self.focused_pane = Pane::Snippets;
            self.set_state(AppState::Navigating);
            return;
        };

        let folder = if self.edit_form.folder.trim().is_empty() {
            snippet::DEFAULT_FOLDER.to_string()
        } else {
            self.edit_form.folder.trim().to_string()
        };
        let name = if self.edit_form.name.trim().is_empty() {
            snippet::DEFAULT_NAME.to_string()
        } else {
            self.edit_form.name.trim().to_string()
        };
        let language = if self.edit_form.language.trim().is_empty() {
            self.default_language.clone()
        } else {
            self.edit_form.language.trim().to_string()
        };

        let (old_path, new_path) = {
            let Some(items) = self.lists.get_mut(&folder_key) else {
                self.set_state(AppState::Navigating);
                return;
            };
            let Some(snippet) = items.get_mut(index) else {
                self.set_state(AppState::Navigating);
                return;
            };
            let old_path = self.store.home().join(snippet.path());
            snippet.folder = folder;
            snippet.name = name.clone();
            snippet.file = format!("{name}.{language}");
            snippet.language = language;
            let new_path = self.store.home().join(snippet.path());
            (old_path, new_path)
        };

        if old_path != new_path {
            if let Some(parent) = new_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let _ = fs::rename(&old_path, &new_path);
        }

        self.focused_pane = Pane::Snippets;
        self.set_state(AppState::Navigating);
        self.sync_folders();
        self.persist();
        self.refresh_content();
    }

    // --- content pipeline -----------------------------------------

    /// Re-renders the content pane for the current selection. The
    /// empty-list hint is produced synchronously with no file access;
    /// everything else goes through a background load task.
    fn refresh_content(&mut self) {
        self.content_scroll = 0;
        match self.selected_snippet().cloned() {
            None => {
                self.pending_content = None;
                self.content = ContentView::Hint(empty_list_hints());
            }
            Some(selected) => self.queue_content_load(&selected),
        }
        self.mark_dirty();
    }

    /// Dispatches a background read-and-highlight task. Each dispatch
    /// gets a fresh request id; completions carrying a stale id are
    /// discarded, so two rapid selection changes can never leave the
    /// first snippet's content on screen.
    fn queue_content_load(&mut self, selected: &Snippet) {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_content = Some(PendingContent { request_id });

        let path = self.store.snippet_path(selected);
        let language = selected.language.clone();
        let syntax_theme = self.theme.syntax.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let view = load_content_view(&path, &language, &syntax_theme);
            let _ = tx.send(AsyncResponse::Content { request_id, view });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Content { request_id, view } => {
                let Some(pending) = &self.pending_content else {
                    return;
                };
                if pending.request_id != request_id {
                    return;
                }
                self.pending_content = None;
                self.content = view;
                self.mark_dirty();
            }
            AsyncResponse::CopyDone { request_id, result } => {
                if self.pending_copy != Some(request_id) {
                    return;
                }
                self.pending_copy = None;
                match result {
                    Ok(name) => {
                        self.copied_name = Some(name);
                        self.set_state(AppState::Copying);
                        self.queue_copy_banner_expiry(request_id);
                    }
                    // Clipboard failure aborts the transition silently.
                    Err(_) => self.set_state(AppState::Navigating),
                }
            }
            AsyncResponse::CopyBannerExpired { request_id } => {
                if self.copy_banner != Some(request_id) {
                    return;
                }
                self.copy_banner = None;
                if self.state == AppState::Copying {
                    self.set_state(AppState::Navigating);
                }
            }
            AsyncResponse::PasteDone { request_id, result } => {
                if self.pending_paste != Some(request_id) {
                    return;
                }
                self.pending_paste = None;
                self.set_state(AppState::Navigating);
                if result.is_ok() {
                    self.refresh_content();
                }
            }
            AsyncResponse::Created {
                request_id,
                snippet,
            } => {
                if self.pending_create != Some(request_id) {
                    return;
                }
                self.pending_create = None;

                let folder = Folder(snippet.folder.clone());
                let items = self.lists.entry(folder.clone()).or_default();
                let at = self
                    .selections
                    .get(folder.as_str())
                    .copied()
                    .unwrap_or(0)
                    .min(items.len());
                items.insert(at, snippet);
                self.selections.insert(folder.0, at);

                self.sync_folders();
                self.set_state(AppState::Navigating);
                self.persist();
                self.refresh_content();
            }
        }
    }

    fn queue_copy_banner_expiry(&mut self, request_id: u64) {
        self.copy_banner = Some(request_id);
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            thread::sleep(COPY_BANNER_DURATION);
            let _ = tx.send(AsyncResponse::CopyBannerExpired { request_id });
        });
    }

    // --- external editor ------------------------------------------

    /// Full-screen handoff: rendering suspends, the terminal goes to
    /// the child process, and the loop resumes when it exits. This is
    /// a blocking scoped operation, not a background task.
    fn run_editor(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        path: &Path,
    ) -> Result<()> {
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;

        let status = editor::command(path).status();

        enable_raw_mode()?;
        terminal.backend_mut().execute(EnterAlternateScreen)?;
        terminal.clear()?;

        match status {
            Ok(status) if !status.success() => {
                self.status_message = format!("Editor exited with {status}");
            }
            Err(err) => {
                self.status_message = format!("Failed to launch editor: {err}");
            }
            _ => {}
        }
        self.refresh_content();
        Ok(())
    }

    // --- drawing --------------------------------------------------

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_line = Paragraph::new(self.status_message.clone()).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(18),
                Constraint::Percentage(32),
                Constraint::Percentage(50),
            ])
            .split(layout[1]);

        self.draw_folders(frame, main_chunks[0]);
        self.draw_snippets(frame, main_chunks[1]);
        self.draw_content(frame, main_chunks[2]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[2]);
    }

    fn pane_block(&self, pane: Pane) -> Block<'static> {
        let border = match pane {
            Pane::Snippets => self.chrome.snippets_border,
            Pane::Content => self.chrome.content_border,
            Pane::Folders => self.chrome.folders_border,
        };
        let title = if pane == Pane::Snippets {
            self.chrome.list_title.clone()
        } else {
            pane.title().to_string()
        };
        let title_style = match (pane, self.chrome.list_tone) {
            (Pane::Snippets, TitleTone::Destructive) => Style::default()
                .fg(self.theme.bright_red)
                .add_modifier(Modifier::BOLD),
            (Pane::Snippets, TitleTone::Success) => Style::default()
                .fg(self.theme.bright_green)
                .add_modifier(Modifier::BOLD),
            _ => Style::default().fg(COLOR_TEXT_PRIMARY),
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(title, title_style))
            .style(Style::default().bg(COLOR_PANEL_BG))
    }

    fn draw_folders(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block(Pane::Folders);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut items: Vec<ListItem> = Vec::with_capacity(self.folders.len());
        for (index, folder) in self.folders.iter().enumerate() {
            let selected = index == self.selected_folder;
            let (marker, style) = if selected {
                (
                    "→ ",
                    Style::default()
                        .fg(self.theme.primary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(self.theme.gray))
            };
            items.push(ListItem::new(Line::from(Span::styled(
                format!("{marker}{folder}"),
                style,
            ))));
        }
        frame.render_widget(List::new(items), inner);
    }

    fn draw_snippets(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block(Pane::Snippets);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let filter_line = if self.filtering || !self.filter_query.is_empty() {
            Line::from(vec![
                Span::styled("Find: ", Style::default().fg(self.theme.primary)),
                Span::styled(
                    self.filter_query.clone(),
                    Style::default().fg(COLOR_TEXT_PRIMARY),
                ),
            ])
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(filter_line), chunks[0]);

        let visible = self.visible_indices();
        let selection = self.selection().min(visible.len().saturating_sub(1));
        let now = Utc::now();
        let items_area = chunks[1];
        let width = items_area.width;

        let (selected_title, selected_subtitle) = match self.chrome.list_tone {
            TitleTone::Destructive => (self.theme.bright_red, self.theme.red),
            TitleTone::Success => (self.theme.bright_green, self.theme.green),
            TitleTone::Normal => (self.theme.primary, self.theme.primary_subdued),
        };

        let mut rows: Vec<ListItem> = Vec::with_capacity(visible.len());
        for (slot, &index) in visible.iter().enumerate() {
            let Some(item) = self.current_items().get(index) else {
                continue;
            };
            let selected = slot == selection;
            let (title_fg, subtitle_fg) = if selected {
                (selected_title, selected_subtitle)
            } else {
                (self.theme.gray, COLOR_PANEL_FOCUSED_BG)
            };
            let subtitle = format!(
                "{} • {}",
                item.folder,
                snippet::relative_date(item.date, now)
            );
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("  {}", item.name),
                    Style::default().fg(title_fg),
                )),
                Line::from(Span::styled(
                    format!("  {subtitle}"),
                    Style::default().fg(subtitle_fg),
                )),
                Line::default(),
            ];
            pad_lines_to_width(&mut lines, width);
            rows.push(ListItem::new(lines));
        }

        if rows.is_empty() {
            let message = if self.filter_query.is_empty() {
                "No snippets."
            } else {
                "Nothing matches."
            };
            rows.push(ListItem::new(Line::from(Span::styled(
                message,
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ))));
        }

        frame.render_widget(List::new(rows), items_area);
    }

    fn draw_content(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block(Pane::Content);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        frame.render_widget(Paragraph::new(self.content_title_line()), chunks[0]);

        match &self.content {
            ContentView::Rendered { code, gutter } => {
                let body = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(5), Constraint::Min(0)])
                    .split(chunks[1]);
                let max_scroll = (code.lines.len() as u16).saturating_sub(1);
                let scroll = self.content_scroll.min(max_scroll);
                let gutter_widget = Paragraph::new(gutter.clone())
                    .style(Style::default().fg(self.theme.gray))
                    .scroll((scroll, 0));
                frame.render_widget(gutter_widget, body[0]);
                let code_widget = Paragraph::new(code.clone()).scroll((scroll, 0));
                frame.render_widget(code_widget, body[1]);
            }
            ContentView::Hint(hints) => {
                let mut lines: Vec<Line> = Vec::new();
                for (key, help) in hints {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{key} "),
                            Style::default()
                                .fg(self.theme.primary)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("• {help}"),
                            Style::default().fg(self.theme.gray),
                        ),
                    ]));
                }
                frame.render_widget(Paragraph::new(Text::from(lines)), chunks[1]);
            }
            ContentView::Error(message) => {
                let width = chunks[1].width.max(1) as usize;
                let lines = wrap_plain(message, width, Style::default().fg(self.theme.red));
                frame.render_widget(Paragraph::new(Text::from(lines)), chunks[1]);
            }
        }
    }

    /// `folder/name.language` over the content pane; while editing,
    /// the three form buffers render in place with the active one
    /// highlighted.
    fn content_title_line(&self) -> Line<'static> {
        if self.state == AppState::Editing {
            let field = |field: EditField, placeholder: &str| -> Span<'static> {
                let (value, is_placeholder) = self.edit_form.display_value(field, placeholder);
                let mut style = if is_placeholder {
                    Style::default().fg(self.theme.gray)
                } else {
                    Style::default().fg(COLOR_TEXT_PRIMARY)
                };
                if field == self.edit_form.active {
                    style = style
                        .bg(COLOR_PANEL_FOCUSED_BG)
                        .add_modifier(Modifier::UNDERLINED);
                }
                Span::styled(value, style)
            };
            let separator = Style::default().fg(self.theme.primary_subdued);
            return Line::from(vec![
                field(EditField::Folder, snippet::DEFAULT_FOLDER),
                Span::styled("/", separator),
                field(EditField::Name, snippet::DEFAULT_NAME),
                Span::styled(".", separator),
                field(EditField::Language, &self.default_language),
            ]);
        }

        match self.selected_snippet() {
            Some(selected) => {
                let separator = Style::default().fg(self.theme.primary_subdued);
                let title = Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD);
                Line::from(vec![
                    Span::styled(selected.folder.clone(), title),
                    Span::styled("/", separator),
                    Span::styled(selected.name.clone(), title),
                    Span::styled(".", separator),
                    Span::styled(selected.language.clone(), title),
                ])
            }
            None => Line::from(Span::styled(
                "No snippet selected",
                Style::default().fg(self.theme.gray),
            )),
        }
    }

    fn footer_text(&self) -> String {
        let parts: Vec<&str> = match self.state {
            AppState::Deleting => vec!["y confirm", "N cancel"],
            AppState::Editing => vec!["tab next field", "enter apply", "esc apply"],
            _ if self.filtering => vec!["type to filter", "enter apply", "esc clear"],
            _ => vec![
                "tab panes",
                "j/k move",
                "/ find",
                "n new",
                "e edit",
                "c copy",
                "p paste",
                "x delete",
                "r rename",
                "R folder",
                "L language",
                "q quit",
            ],
        };
        parts.join(" · ")
    }
}

/// Reads and renders a snippet's backing file. Missing or empty files
/// are hints, not errors; a language without a syntax definition
/// degrades to an inline error message.
fn load_content_view(path: &Path, language: &str, syntax_theme: &str) -> ContentView {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return ContentView::Hint(no_content_hints()),
    };
    if content.is_empty() {
        return ContentView::Hint(no_content_hints());
    }
    match highlight::highlight(&content, language, syntax_theme) {
        Ok(code) => {
            let gutter = highlight::gutter(code.lines.len());
            ContentView::Rendered { code, gutter }
        }
        Err(_) => ContentView::Error("Unable to highlight file.".to_string()),
    }
}

fn wrap_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    wrap(text, WrapOptions::new(width.max(1)))
        .into_iter()
        .map(|piece| Line::from(Span::styled(piece.into_owned(), style)))
        .collect()
}

fn pad_lines_to_width(lines: &mut [Line<'static>], width: u16) {
    let target = width as usize;
    for line in lines.iter_mut() {
        let current: usize = line
            .spans
            .iter()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum();
        if current < target {
            line.spans
                .push(Span::raw(" ".repeat(target - current)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn sample(folder: &str, name: &str) -> Snippet {
        Snippet {
            tags: Vec::new(),
            folder: folder.to_string(),
            date: Utc::now(),
            favorite: false,
            name: name.to_string(),
            file: format!("{name}.rs"),
            language: "rs".to_string(),
        }
    }

    fn test_model(snippets: Vec<Snippet>) -> (Model, TempDir) {
        test_model_at(snippets, 0)
    }

    fn test_model_at(snippets: Vec<Snippet>, initial_folder: usize) -> (Model, TempDir) {
        let dir = tempdir().unwrap();
        let store = storage::Store::open(storage::Options {
            home: Some(dir.path().to_path_buf()),
            file: None,
        })
        .unwrap();
        let model = Model::new(Options {
            snippets,
            theme: Theme::from_config(&config::UIConfig::default()),
            default_language: "go".to_string(),
            store,
            initial_folder,
            status_message: String::new(),
        });
        (model, dir)
    }

    fn folder_names(model: &Model) -> Vec<String> {
        model.folders.iter().map(|f| f.0.clone()).collect()
    }

    #[test]
    fn panes_cycle_circularly() {
        let mut pane = Pane::Snippets;
        for _ in 0..3 {
            pane = pane.next();
        }
        assert_eq!(pane, Pane::Snippets);
        for _ in 0..3 {
            pane = pane.previous();
        }
        assert_eq!(pane, Pane::Snippets);
        assert_eq!(Pane::Snippets.previous(), Pane::Folders);
        assert_eq!(Pane::Folders.next(), Pane::Snippets);
    }

    #[test]
    fn folder_list_matches_distinct_folders() {
        let (model, _dir) = test_model(vec![
            sample("b", "two"),
            sample("a", "one"),
            sample("b", "three"),
        ]);
        assert_eq!(folder_names(&model), vec!["a", "b"]);
    }

    #[test]
    fn session_folder_index_survives_construction() {
        let snippets = vec![sample("a", "one"), sample("b", "two")];
        let (model, _dir) = test_model_at(snippets.clone(), 1);
        assert_eq!(model.selected_folder, 1);
        assert_eq!(model.current_folder().unwrap().as_str(), "b");

        // A stale index from a store that has since shrunk clamps
        // instead of panicking or resetting arbitrarily.
        let (model, _dir) = test_model_at(snippets, 9);
        assert_eq!(model.selected_folder, 1);

        let (model, _dir) = test_model_at(Vec::new(), 3);
        assert_eq!(model.selected_folder, 0);
    }

    #[test]
    fn empty_store_shows_default_folder() {
        let (model, _dir) = test_model(Vec::new());
        assert_eq!(folder_names(&model), vec![snippet::DEFAULT_FOLDER]);
        assert_eq!(model.content, ContentView::Hint(empty_list_hints()));
    }

    #[test]
    fn deleting_last_snippet_in_folder_drops_the_folder() {
        let (mut model, _dir) = test_model(vec![sample("a", "one"), sample("b", "only")]);
        model.selected_folder = 1; // "b"
        model.set_state(AppState::Deleting);
        model.confirm_delete();
        assert_eq!(folder_names(&model), vec!["a"]);
        assert_eq!(model.selected_folder, 0);
        assert_eq!(model.state, AppState::Navigating);
    }

    #[test]
    fn folder_rename_relocates_exactly_once() {
        let (mut model, _dir) = test_model(vec![sample("a", "one"), sample("a", "two")]);
        let key = Folder("a".to_string());
        model.lists.get_mut(&key).unwrap()[0].folder = "z".to_string();
        model.sync_folders();

        assert_eq!(folder_names(&model), vec!["a", "z"]);
        let total: usize = model.lists.values().map(Vec::len).sum();
        assert_eq!(total, 2);
        assert_eq!(model.lists.get(&Folder("z".to_string())).unwrap().len(), 1);
        assert_eq!(model.lists.get(&key).unwrap().len(), 1);

        // A second pass finds nothing misfiled.
        model.sync_folders();
        let total: usize = model.lists.values().map(Vec::len).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn selection_clamped_after_shrink() {
        let (mut model, _dir) = test_model(vec![
            sample("a", "one"),
            sample("a", "two"),
            sample("a", "three"),
        ]);
        model.set_selection(2);
        model.set_state(AppState::Deleting);
        model.confirm_delete();
        assert_eq!(model.current_items().len(), 2);
        assert!(model.selection() <= 1);
    }

    #[test]
    fn state_reentry_is_idempotent() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.set_state(AppState::Deleting);
        model.reconcile_styles();
        let chrome = model.chrome.clone();
        model.set_state(AppState::Deleting);
        model.reconcile_styles();
        assert_eq!(model.chrome, chrome);

        model.set_state(AppState::Navigating);
        model.reconcile_styles();
        let navigating = model.chrome.clone();
        assert_eq!(navigating.list_tone, TitleTone::Normal);

        // A full round trip lands on the same visible state.
        model.set_state(AppState::Deleting);
        model.set_state(AppState::Navigating);
        model.reconcile_styles();
        assert_eq!(model.chrome, navigating);
    }

    #[test]
    fn cancelling_delete_restores_title() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.set_state(AppState::Deleting);
        model.reconcile_styles();
        assert_eq!(model.chrome.list_tone, TitleTone::Destructive);
        model.handle_deleting_key(KeyCode::Esc);
        model.reconcile_styles();
        assert_eq!(model.state, AppState::Navigating);
        assert_eq!(model.chrome.list_tone, TitleTone::Normal);
        assert_eq!(model.current_items().len(), 1);
    }

    #[test]
    fn create_on_empty_store_yields_one_default_snippet() {
        let (mut model, _dir) = test_model(Vec::new());
        model.create_new_snippet();
        assert_eq!(model.state, AppState::Creating);

        let message = model
            .response_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("created message");
        model.handle_async_response(message);

        assert_eq!(model.state, AppState::Navigating);
        let total: usize = model.lists.values().map(Vec::len).sum();
        assert_eq!(total, 1);
        let created = &model.lists.get(&Folder(snippet::DEFAULT_FOLDER.into())).unwrap()[0];
        assert_eq!(created.name, snippet::DEFAULT_NAME);
        assert_eq!(created.language, "go");
        assert_eq!(folder_names(&model), vec![snippet::DEFAULT_FOLDER]);
    }

    #[test]
    fn stale_content_response_is_discarded() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.pending_content = Some(PendingContent { request_id: 2 });
        model.content = ContentView::Error("initial".to_string());

        // The slower, older load finishes after a newer one was
        // dispatched; its id no longer matches and it is dropped.
        model.handle_async_response(AsyncResponse::Content {
            request_id: 1,
            view: ContentView::Error("S1".to_string()),
        });
        assert_eq!(model.content, ContentView::Error("initial".to_string()));

        model.handle_async_response(AsyncResponse::Content {
            request_id: 2,
            view: ContentView::Error("S2".to_string()),
        });
        assert_eq!(model.content, ContentView::Error("S2".to_string()));
        assert!(model.pending_content.is_none());
    }

    #[test]
    fn copy_banner_expires_back_to_navigating() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.pending_copy = Some(7);
        model.handle_async_response(AsyncResponse::CopyDone {
            request_id: 7,
            result: Ok("one".to_string()),
        });
        assert_eq!(model.state, AppState::Copying);
        model.reconcile_styles();
        assert_eq!(model.chrome.list_tone, TitleTone::Success);
        assert!(model.chrome.list_title.contains("one"));

        model.handle_async_response(AsyncResponse::CopyBannerExpired { request_id: 7 });
        assert_eq!(model.state, AppState::Navigating);
    }

    #[test]
    fn copy_failure_aborts_silently() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.state = AppState::Copying;
        model.pending_copy = Some(3);
        model.handle_async_response(AsyncResponse::CopyDone {
            request_id: 3,
            result: Err(anyhow::anyhow!("no clipboard")),
        });
        assert_eq!(model.state, AppState::Navigating);
        assert!(model.status_message.is_empty());
    }

    #[test]
    fn commit_edit_updates_model_even_when_rename_fails() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        // No backing file exists, so the rename is doomed.
        model.begin_edit(EditField::Name);
        assert_eq!(model.state, AppState::Editing);
        assert_eq!(model.focused_pane, Pane::Content);
        for ch in "renamed".chars() {
            model.edit_form.insert_char(ch);
        }
        model.edit_form.folder = "moved".to_string();
        model.commit_edit();

        assert_eq!(model.state, AppState::Navigating);
        assert_eq!(model.focused_pane, Pane::Snippets);
        assert_eq!(folder_names(&model), vec!["moved"]);
        let moved = &model.lists.get(&Folder("moved".to_string())).unwrap()[0];
        assert_eq!(moved.name, "onerenamed");
        assert_eq!(moved.file, "onerenamed.rs");
    }

    #[test]
    fn commit_edit_empty_buffers_revert_to_placeholders() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.begin_edit(EditField::Name);
        model.edit_form.folder.clear();
        model.edit_form.name.clear();
        model.edit_form.language.clear();
        model.commit_edit();

        assert_eq!(folder_names(&model), vec![snippet::DEFAULT_FOLDER]);
        let items = model
            .lists
            .get(&Folder(snippet::DEFAULT_FOLDER.into()))
            .unwrap();
        assert_eq!(items[0].name, snippet::DEFAULT_NAME);
        assert_eq!(items[0].language, "go");
    }

    #[test]
    fn filter_narrows_visible_snippets() {
        let (mut model, _dir) = test_model(vec![
            sample("a", "alpha"),
            sample("a", "beta"),
            sample("a", "gamma"),
        ]);
        model.filter_query = "bet".to_string();
        let visible = model.visible_indices();
        assert_eq!(visible.len(), 1);
        assert_eq!(model.current_items()[visible[0]].name, "beta");
        assert_eq!(model.selected_snippet().unwrap().name, "beta");
    }

    #[test]
    fn jump_to_folder_focuses_snippet_pane_and_clears_filter() {
        let (mut model, _dir) = test_model(vec![sample("a", "one"), sample("b", "two")]);
        model.focused_pane = Pane::Folders;
        model.filter_query = "stale".to_string();
        model.jump_to_folder();
        assert_eq!(model.focused_pane, Pane::Snippets);
        assert!(model.filter_query.is_empty());
    }

    #[test]
    fn move_snippet_reorders_within_partition() {
        let (mut model, _dir) = test_model(vec![sample("a", "one"), sample("a", "two")]);
        model.focused_pane = Pane::Snippets;
        model.move_snippet(1);
        let items = model.lists.get(&Folder("a".to_string())).unwrap();
        assert_eq!(items[0].name, "two");
        assert_eq!(items[1].name, "one");
        assert_eq!(model.selection(), 1);
    }

    #[test]
    fn snapshot_of_empty_store_is_the_placeholder() {
        let (mut model, _dir) = test_model(vec![sample("a", "one")]);
        model.set_state(AppState::Deleting);
        model.confirm_delete();
        let snapshot = model.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, snippet::DEFAULT_NAME);
    }

    #[test]
    fn load_content_view_classifies_missing_empty_and_unhighlightable() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.rs");
        assert_eq!(
            load_content_view(&missing, "rs", "base16-ocean.dark"),
            ContentView::Hint(no_content_hints())
        );

        let empty = dir.path().join("empty.rs");
        fs::write(&empty, "").unwrap();
        assert_eq!(
            load_content_view(&empty, "rs", "base16-ocean.dark"),
            ContentView::Hint(no_content_hints())
        );

        let weird = dir.path().join("weird.zzz");
        fs::write(&weird, "contents").unwrap();
        assert_eq!(
            load_content_view(&weird, "zzz", "base16-ocean.dark"),
            ContentView::Error("Unable to highlight file.".to_string())
        );

        let code = dir.path().join("ok.rs");
        fs::write(&code, "fn main() {}\nfn other() {}\n").unwrap();
        match load_content_view(&code, "rs", "base16-ocean.dark") {
            ContentView::Rendered { code, gutter } => {
                assert_eq!(code.lines.len(), 2);
                assert_eq!(gutter.lines.len(), 3);
            }
            other => panic!("expected rendered content, got {other:?}"),
        }
    }

    #[test]
    fn parse_color_accepts_hex_and_indexed() {
        assert_eq!(parse_color("#ff0080", Color::Reset), Color::Rgb(255, 0, 128));
        assert_eq!(parse_color("240", Color::Reset), Color::Indexed(240));
        assert_eq!(parse_color("bogus", Color::Reset), Color::Reset);
        assert_eq!(parse_color("#bad", Color::Reset), Color::Reset);
    }

    #[test]
    fn pad_lines_extends_to_width() {
        let mut lines = vec![Line::from(vec![Span::raw("abc")])];
        pad_lines_to_width(&mut lines, 6);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[1].content.as_ref(), "   ");
    }

    #[test]
    fn pad_lines_does_not_shorten() {
        let mut lines = vec![Line::from(vec![Span::raw("abcdef")])];
        pad_lines_to_width(&mut lines, 4);
        assert_eq!(lines[0].spans.len(), 1);
    }
}
