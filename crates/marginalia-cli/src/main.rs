use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use marginalia_config::Config;
use marginalia_engine::{
    DiagnosticEvent, Diagnostics, LiveEntry, LogDiagnostics, MemoryDiagnostics, Snapshot, Span,
    Suggestion, SuggestionEngine, io,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span as TextSpan},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{collections::VecDeque, env, fs::File, io::stdout, path::PathBuf, process, sync::Arc};

/// Logs every engine event and keeps it for the status line.
#[derive(Default)]
struct StatusDiagnostics {
    memory: MemoryDiagnostics,
}

impl Diagnostics for StatusDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        LogDiagnostics.record(event.clone());
        self.memory.record(event);
    }
}

/// How a manuscript character is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Mark {
    Plain,
    Suggested,
    Conflicted,
    Selected,
}

impl Mark {
    fn style(self) -> Style {
        match self {
            Mark::Plain => Style::default(),
            Mark::Suggested => Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            Mark::Conflicted => Style::default().fg(Color::Red).add_modifier(Modifier::UNDERLINED),
            Mark::Selected => Style::default().bg(Color::Yellow).fg(Color::Black),
        }
    }
}

/// Splits one block's text into runs of equal mark. `positions` is the
/// block's tree-position span; `marks` are tree-position spans.
fn mark_block(text: &str, positions: Span, marks: &[(Span, Mark)]) -> Vec<(String, Mark)> {
    let mut runs: Vec<(String, Mark)> = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let pos = positions.start + i;
        let mark = marks
            .iter()
            .filter(|(span, _)| span.start <= pos && pos < span.end)
            .map(|(_, mark)| *mark)
            .max()
            .unwrap_or(Mark::Plain);
        if let Some((run, last)) = runs.last_mut()
            && *last == mark
        {
            run.push(ch);
            continue;
        }
        runs.push((ch.to_string(), mark));
    }
    runs
}

fn describe(suggestion: &Suggestion, in_conflict: bool) -> String {
    let mut label = format!(
        "{}{}: \"{}\" → \"{}\"",
        if in_conflict { "⚑ " } else { "" },
        suggestion.edit_type,
        suggestion.original,
        suggestion.replacement
    );
    if suggestion.is_degenerate() {
        label.push_str(" (collapsed)");
    }
    label
}

/// Undo depth; older snapshots are dropped.
const MAX_HISTORY: usize = 100;

struct App {
    manuscript_path: PathBuf,
    proposals_path: Option<PathBuf>,
    engine: SuggestionEngine,
    diagnostics: Arc<StatusDiagnostics>,
    history: VecDeque<Snapshot>,
    list_state: ListState,
    status: String,
}

impl App {
    fn new(manuscript_path: PathBuf, proposals_path: Option<PathBuf>, config: &Config) -> Result<Self> {
        let document = io::read_manuscript(&manuscript_path)?;
        let diagnostics = Arc::new(StatusDiagnostics::default());
        let engine = SuggestionEngine::with_config(document, config.engine.clone(), diagnostics.clone());

        let mut app = Self {
            manuscript_path,
            proposals_path,
            engine,
            diagnostics,
            history: VecDeque::new(),
            list_state: ListState::default(),
            status: String::new(),
        };
        app.load_proposals();
        Ok(app)
    }

    fn load_proposals(&mut self) {
        let Some(path) = self.proposals_path.clone() else {
            self.status = "No proposals file; nothing to review".to_string();
            return;
        };
        match io::read_proposals(&path) {
            Ok(proposals) => {
                let report = self.engine.set_suggestions(proposals);
                log::info!(
                    "loaded {} suggestion(s) from {}, {} skipped",
                    report.applied.len(),
                    path.display(),
                    report.skipped.len()
                );
                self.finish(format!(
                    "Loaded {} suggestion(s), skipped {}, relocated {}",
                    report.applied.len(),
                    report.skipped.len(),
                    report.relocated.len()
                ));
            }
            Err(e) => self.status = format!("Error reading proposals: {e}"),
        }
    }

    fn rows(&self) -> Vec<&Suggestion> {
        self.engine.state().suggestions().collect()
    }

    fn selected(&self) -> Option<&Suggestion> {
        let index = self.list_state.selected()?;
        self.rows().get(index).copied()
    }

    fn next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn accept_selected(&mut self) {
        let Some(id) = self.selected().map(|s| s.id.clone()) else {
            return;
        };
        let snapshot = self.engine.snapshot();
        match self.engine.accept_suggestion(&id) {
            Some(_) => {
                self.remember(snapshot);
                self.finish(format!("Accepted {id}"));
            }
            None => self.finish(format!("{id} is no longer live")),
        }
    }

    fn clear(&mut self) {
        self.remember(self.engine.snapshot());
        self.engine.clear_all();
        self.finish("Cleared all suggestions".to_string());
    }

    fn reconcile(&mut self) {
        let Some(path) = self.proposals_path.clone() else {
            self.status = "No proposals file to reconcile against".to_string();
            return;
        };
        match io::read_proposals(&path) {
            Ok(proposals) => {
                self.remember(self.engine.snapshot());
                let report = self.engine.reconcile(&proposals);
                self.finish(format!(
                    "Reconciled: {} matched, {} recreated, {} orphaned, {} failed",
                    report.matched.len(),
                    report.recreated.len(),
                    report.orphaned.len(),
                    report.errors.len()
                ));
            }
            Err(e) => self.status = format!("Error reading proposals: {e}"),
        }
    }

    fn remember(&mut self, snapshot: Snapshot) {
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }

    fn undo(&mut self) {
        match self.history.pop_back() {
            Some(snapshot) => {
                self.engine.restore(snapshot);
                self.finish("Undone".to_string());
            }
            None => self.status = "Nothing to undo".to_string(),
        }
    }

    fn write(&mut self) {
        match io::write_manuscript(&self.manuscript_path, self.engine.document()) {
            Ok(()) => {
                log::info!("wrote {}", self.manuscript_path.display());
                self.status = format!("Wrote {}", self.manuscript_path.display());
            }
            Err(e) => self.status = format!("Error writing manuscript: {e}"),
        }
    }

    /// Sets the status line, noting any warnings the engine raised, and
    /// keeps the selection inside the list.
    fn finish(&mut self, message: String) {
        let warnings = self
            .diagnostics
            .memory
            .take()
            .into_iter()
            .filter(|event| {
                matches!(
                    event,
                    DiagnosticEvent::ProposalSkipped { .. }
                        | DiagnosticEvent::StaleAccept { .. }
                        | DiagnosticEvent::RecreationFailed { .. }
                )
            })
            .count();
        self.status = if warnings > 0 {
            format!("{message} ({warnings} warning(s), see log)")
        } else {
            message
        };

        let len = self.rows().len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    fn manuscript_lines(&self) -> Vec<Line<'static>> {
        let state = self.engine.state();
        let mut marks: Vec<(Span, Mark)> = self
            .engine
            .decorations()
            .iter()
            .map(|decoration| {
                let mark = match decoration
                    .routing_id()
                    .and_then(|id| state.entry_by_routing_id(id))
                {
                    Some(LiveEntry::Conflict(_)) => Mark::Conflicted,
                    _ => Mark::Suggested,
                };
                (decoration.span(), mark)
            })
            .collect();
        if let Some(selected) = self.selected() {
            marks.push((selected.span(), Mark::Selected));
        }

        let mut lines = Vec::new();
        for block in self.engine.document().blocks() {
            let runs = mark_block(&block.text, block.positions, &marks);
            lines.push(Line::from(
                runs.into_iter()
                    .map(|(text, mark)| TextSpan::styled(text, mark.style()))
                    .collect::<Vec<_>>(),
            ));
            lines.push(Line::default());
        }
        lines
    }
}

fn log_file_path() -> PathBuf {
    Config::config_path().with_file_name("marginalia.log")
}

fn init_logging(config: &Config) -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Manuscript and proposals come from CLI args, falling back to the config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (manuscript_path, proposals_path) = match args.len() {
        1 => (config.manuscript_path.clone(), config.proposals_path.clone()),
        2 => (Some(PathBuf::from(&args[1])), config.proposals_path.clone()),
        3 => (Some(PathBuf::from(&args[1])), Some(PathBuf::from(&args[2]))),
        _ => {
            eprintln!("Usage: {} [manuscript] [proposals.json]", args[0]);
            process::exit(1);
        }
    };

    let Some(manuscript_path) = manuscript_path else {
        eprintln!("Error: No manuscript provided and none set in the config file");
        eprintln!("Usage: {} <manuscript> [proposals.json]", args[0]);
        eprintln!("Or set manuscript_path in {}", config_path.display());
        process::exit(1);
    };

    init_logging(&config)?;

    let mut app = match App::new(manuscript_path.clone(), proposals_path, &config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: Manuscript '{}' could not be opened: {e}", manuscript_path.display());
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Enter | KeyCode::Char('a') => app.accept_selected(),
                KeyCode::Char('c') => app.clear(),
                KeyCode::Char('r') => app.reconcile(),
                KeyCode::Char('u') => app.undo(),
                KeyCode::Char('w') => app.write(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(rows[0]);

    // Suggestion list panel
    let state = app.engine.state();
    let items: Vec<ListItem> = state
        .suggestions()
        .map(|s| {
            let label = describe(s, state.group_of(&s.id).is_some());
            ListItem::new(vec![Line::from(vec![TextSpan::raw(label)])])
        })
        .collect();
    let title = format!("Suggestions ({})", items.len());

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    let manuscript_lines = app.manuscript_lines();
    f.render_stateful_widget(list, chunks[0], &mut app.list_state);

    // Manuscript panel
    let manuscript = Paragraph::new(manuscript_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.manuscript_path.display().to_string()),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(manuscript, chunks[1]);

    // Status and key help
    let help = Paragraph::new(vec![
        Line::from(app.status.clone()),
        Line::from(vec![
            TextSpan::raw("q: Quit | "),
            TextSpan::raw("↑/k ↓/j: Move | "),
            TextSpan::raw("Enter/a: Accept | c: Clear | r: Reconcile | u: Undo | w: Write"),
        ]),
    ])
    .block(Block::default());

    f.render_widget(help, rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_engine::{Document, Proposal};
    use pretty_assertions::assert_eq;

    fn app_for(text: &str) -> App {
        App {
            manuscript_path: PathBuf::from("manuscript.md"),
            proposals_path: None,
            engine: SuggestionEngine::new(Document::from_text(text)),
            diagnostics: Arc::new(StatusDiagnostics::default()),
            history: VecDeque::new(),
            list_state: ListState::default(),
            status: String::new(),
        }
    }

    #[test]
    fn test_history_keeps_only_the_latest_snapshots() {
        let mut app = app_for("One two three.");
        app.engine.set_suggestions([Proposal::literal("two", "2")]);
        let first = app.engine.snapshot();

        for _ in 0..MAX_HISTORY + 5 {
            app.clear();
        }
        assert_eq!(app.history.len(), MAX_HISTORY);

        for _ in 0..MAX_HISTORY {
            app.undo();
        }
        // the pre-clear snapshot fell off the end
        assert_ne!(app.engine.snapshot(), first);
        assert!(app.engine.state().is_empty());
        app.undo();
        assert_eq!(app.status, "Nothing to undo");
    }

    #[test]
    fn test_mark_block_splits_runs() {
        // "wind" is offsets 4..8 of the first block, positions 5..9
        let runs = mark_block(
            "The wind was blowing",
            Span::new(1, 21),
            &[(Span::new(5, 9), Mark::Suggested)],
        );

        assert_eq!(
            runs,
            vec![
                ("The ".to_string(), Mark::Plain),
                ("wind".to_string(), Mark::Suggested),
                (" was blowing".to_string(), Mark::Plain),
            ]
        );
    }

    #[test]
    fn test_mark_block_selected_wins_over_conflict() {
        let runs = mark_block(
            "abcdef",
            Span::new(1, 7),
            &[
                (Span::new(1, 5), Mark::Conflicted),
                (Span::new(3, 5), Mark::Selected),
            ],
        );

        assert_eq!(
            runs,
            vec![
                ("ab".to_string(), Mark::Conflicted),
                ("cd".to_string(), Mark::Selected),
                ("ef".to_string(), Mark::Plain),
            ]
        );
    }

    #[test]
    fn test_mark_block_ignores_spans_in_other_blocks() {
        let runs = mark_block("second", Span::new(8, 14), &[(Span::new(1, 6), Mark::Suggested)]);

        assert_eq!(runs, vec![("second".to_string(), Mark::Plain)]);
    }

    #[test]
    fn test_describe_marks_conflicts_and_collapsed() {
        let mut engine = SuggestionEngine::new(Document::from_text("The wind was blowing."));
        let report = engine.set_suggestions([Proposal::at_offsets(4, 8, "wind", "gale")]);
        let suggestion = engine.state().get(&report.applied[0]).unwrap().clone();

        assert_eq!(describe(&suggestion, false), "general: \"wind\" → \"gale\"");
        assert_eq!(describe(&suggestion, true), "⚑ general: \"wind\" → \"gale\"");

        let collapsed = Suggestion {
            to: suggestion.from,
            ..suggestion
        };
        assert!(describe(&collapsed, false).ends_with(" (collapsed)"));
    }
}
