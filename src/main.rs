use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState};

use matchstats_terminal::config::PipelineConfig;
use matchstats_terminal::export::export_run;
use matchstats_terminal::logging;
use matchstats_terminal::pipeline::CancelFlag;
use matchstats_terminal::state::{AppState, Delta, RunStatus, apply_delta};
use matchstats_terminal::worker::spawn_pipeline;

struct App {
    state: AppState,
    config: PipelineConfig,
    should_quit: bool,
    tx: mpsc::Sender<Delta>,
    worker: Option<JoinHandle<()>>,
    cancel: CancelFlag,
}

impl App {
    fn new(config: PipelineConfig, tx: mpsc::Sender<Delta>) -> Self {
        Self {
            state: AppState::new(&config.metrics),
            config,
            should_quit: false,
            tx,
            worker: None,
            cancel: CancelFlag::new(),
        }
    }

    fn worker_busy(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn start_run(&mut self) {
        if self.worker_busy() {
            self.state.push_log("[INFO] A fetch is already running");
            return;
        }
        if self.config.match_ids.is_empty() {
            self.state
                .push_log("[WARN] No match ids; pass --ids=1,2,3 or set MATCH_IDS");
            return;
        }
        self.cancel = CancelFlag::new();
        self.worker = Some(spawn_pipeline(
            self.config.clone(),
            self.tx.clone(),
            self.cancel.clone(),
        ));
    }

    fn export(&mut self) {
        if self.state.records.is_empty() {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        }
        let name = format!("matchstats_{}.xlsx", Local::now().format("%Y%m%d_%H%M%S"));
        let path = PathBuf::from(name);
        match export_run(&path, &self.state.to_run(), &self.config.metrics) {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} records, {} averages to {}",
                report.records,
                report.averages,
                path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.cancel.cancel();
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('m') | KeyCode::Char('M') => self.state.cycle_metric(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.start_run(),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.worker_busy() {
                    self.cancel.cancel();
                    self.state
                        .push_log("[INFO] Cancelling after the current match");
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let mut config = PipelineConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    config.apply_args(&args);

    if let Some(path) = std::env::var("MATCHSTATS_LOG_FILE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        && let Err(err) = logging::init_file(PathBuf::from(path).as_path())
    {
        eprintln!("warning: {err:#}");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(config, tx);
    app.start_run();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(60), Constraint::Length(44)])
        .split(chunks[1]);
    render_records(frame, body[0], state);
    render_averages(frame, body[1], state);

    let console = Paragraph::new(console_text(state, chunks[2].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "j/k/↑/↓ Move | m Metric | r Refetch | c Cancel | e Export | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let status = match &state.status {
        RunStatus::Idle => "idle".to_string(),
        RunStatus::Running {
            current,
            total,
            match_id,
        } => format!("fetching {current}/{total} (match {match_id})"),
        RunStatus::Finished { cancelled: false } => "done".to_string(),
        RunStatus::Finished { cancelled: true } => "cancelled".to_string(),
        RunStatus::Aborted(_) => "aborted".to_string(),
    };
    format!(
        " MATCH STATS | {} | {} records | {} failures | {} schema warnings",
        status,
        state.records.len(),
        state.failures.len(),
        state.warnings
    )
}

fn render_records(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Records").borders(Borders::ALL);
    if state.records.is_empty() {
        let empty = Paragraph::new("No records yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Match", "Period", "Metric", "Home", "Away", "H", "A"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = state.records.iter().map(|r| {
        Row::new(vec![
            r.match_id.to_string(),
            r.period.clone().unwrap_or_default(),
            r.name().to_string(),
            r.home.clone().unwrap_or_else(|| "-".to_string()),
            r.away.clone().unwrap_or_else(|| "-".to_string()),
            format_value(r.home_value),
            format_value(r.away_value),
        ])
    });
    let widths = [
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(16),
        Constraint::Min(10),
        Constraint::Min(10),
        Constraint::Length(6),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray));

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_averages(frame: &mut Frame, area: Rect, state: &AppState) {
    let metric = state.current_metric().unwrap_or("-");
    let block = Block::default()
        .title(format!("Team averages: {metric}"))
        .borders(Borders::ALL);

    let averages = state.averages();
    if averages.is_empty() {
        let empty = Paragraph::new("No team-attributed rows for this metric")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Team", "Home", "Away", "All"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = averages.iter().map(|a| {
        Row::new(vec![
            a.team.clone(),
            format_value(a.home),
            format_value(a.away),
            format_value(a.overall()),
        ])
    });
    let widths = [
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn console_text(state: &AppState, lines: u16) -> String {
    let skip = state.logs.len().saturating_sub(lines as usize);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(56);
    let height = area.height.min(12);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    let text = [
        "j/k or ↑/↓  move through records",
        "m           switch the averaged metric",
        "r           fetch the configured matches again",
        "c           stop after the current match",
        "e           export records + averages to .xlsx",
        "?/Esc       close this help",
        "q           quit",
    ]
    .join("\n");
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL)),
        popup,
    );
}
