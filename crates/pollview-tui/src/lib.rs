// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod chart;

pub use chart::Doughnut;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use pollview_app::{
    ApiOutcome, ApiRequest, ChartSurface, ModalPhase, PollCommand, PollEvent, PollState,
    RequestId, Ticket,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

const SELECTED_MARK: &str = "▶";
const POLL_ICON: &str = "◍";
const CLOSE_LABEL: &str = "[ Close ]";
const MODAL_HEADING: &str = "Today's Poll";
const TITLE_SEPARATOR: &str = " — ";

/// Backend seam for the UI. `execute` runs a request to completion;
/// `spawn_request` may run it elsewhere and must report back through `tx`.
pub trait AppRuntime {
    fn execute(&mut self, request: ApiRequest) -> ApiOutcome;

    fn describe(&self) -> String {
        String::new()
    }

    fn spawn_request(&mut self, ticket: Ticket, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.execute(ticket.request);
        tx.send(InternalEvent::Response {
            request_id: ticket.id,
            outcome,
        })
        .map_err(|_| anyhow::anyhow!("response channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Response {
        request_id: RequestId,
        outcome: ApiOutcome,
    },
}

#[derive(Debug, Default)]
struct ViewData {
    source: String,
    screen: Rect,
    list_cursor: usize,
    option_cursor: usize,
    chart: ChartSurface,
    status_token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenLayout {
    header: Rect,
    list: Rect,
    list_rows: Rect,
    status: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModalLayout {
    frame: Rect,
    header: Rect,
    options: Rect,
    chart: Rect,
    total: Rect,
    close_button: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalHit {
    Backdrop,
    Content,
    Option(usize),
    CloseButton,
}

pub fn run_app<R: AppRuntime>(state: &mut PollState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        source: runtime.describe(),
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(source = %view_data.source, "mounted");
    apply_command(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        PollCommand::Mount,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);
        sync_chart(state, &mut view_data);

        if let Err(error) = terminal.draw(|frame| {
            view_data.screen = frame.area();
            render(frame, state, &view_data);
        }) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(100)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        let quit = match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
                false
            }
            Ok(_) => false,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if quit {
            break;
        }
    }

    teardown(state, &mut view_data);

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(PollCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Response {
                request_id,
                outcome,
            } => apply_command(
                state,
                runtime,
                view_data,
                tx,
                PollCommand::Resolve {
                    request_id,
                    outcome,
                },
            ),
        }
    }
}

/// Dispatches `command` and carries out the side effects its events ask
/// for: starting requests, cursor upkeep, status expiry.
fn apply_command<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: PollCommand,
) {
    let mut queue = VecDeque::from([command]);
    while let Some(command) = queue.pop_front() {
        for event in state.dispatch(command) {
            log_event(&event);
            match event {
                PollEvent::RequestIssued(ticket) => {
                    if let Err(error) = runtime.spawn_request(ticket, tx.clone()) {
                        queue.push_back(PollCommand::Resolve {
                            request_id: ticket.id,
                            outcome: ApiOutcome::failure(ticket.request, format!("{error:#}")),
                        });
                    }
                }
                PollEvent::ListReplaced { count } => {
                    view_data.list_cursor = view_data.list_cursor.min(count.saturating_sub(1));
                }
                PollEvent::ModalOpened(_) => {
                    view_data.option_cursor = 0;
                }
                PollEvent::DetailReplaced { .. } => {
                    let options = state.poll.as_ref().map_or(0, |poll| poll.options.len());
                    view_data.option_cursor =
                        view_data.option_cursor.min(options.saturating_sub(1));
                }
                PollEvent::StatusUpdated(_) => {
                    view_data.status_token = view_data.status_token.saturating_add(1);
                    schedule_status_clear(tx, view_data.status_token);
                }
                _ => {}
            }
        }
    }
}

fn log_event(event: &PollEvent) {
    match event {
        PollEvent::RequestIssued(ticket) => {
            debug!(request_id = %ticket.id, request = ?ticket.request, "request issued");
        }
        PollEvent::RequestCanceled(ticket) => {
            debug!(request_id = %ticket.id, request = ?ticket.request, "request canceled");
        }
        PollEvent::StaleResponseDropped { request_id, kind } => {
            debug!(%request_id, kind = kind.as_str(), "stale response dropped");
        }
        PollEvent::RequestFailed { kind, error } => {
            error!(kind = kind.as_str(), %error, "request failed");
        }
        PollEvent::ListReplaced { count } => info!(count, "poll list loaded"),
        PollEvent::DetailReplaced { poll_id, revision } => {
            debug!(%poll_id, revision, "poll detail replaced");
        }
        PollEvent::VoteRecorded { option_id } => info!(%option_id, "vote recorded"),
        PollEvent::SelectionChanged(_)
        | PollEvent::ModalOpened(_)
        | PollEvent::ModalClosed
        | PollEvent::StatusUpdated(_)
        | PollEvent::StatusCleared => {}
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn teardown(state: &PollState, view_data: &mut ViewData) {
    if let Some(instance) = view_data.chart.release() {
        debug!(instance, "chart released on teardown");
    }
    info!(pending = state.pending().count(), "unmounted");
}

/// Keeps the chart surface in step with the displayed detail: one instance
/// per detail revision while the modal is shown, none otherwise.
fn sync_chart(state: &PollState, view_data: &mut ViewData) {
    match (&state.poll, state.show_modal) {
        (Some(poll), true) => {
            if !view_data.chart.is_current(state.detail_revision) {
                let chart = view_data.chart.render(poll, state.detail_revision);
                debug!(instance = chart.instance, poll_id = %chart.poll_id, "chart rendered");
            }
        }
        _ => {
            if let Some(instance) = view_data.chart.release() {
                debug!(instance, "chart released");
            }
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return true;
    }

    if state.show_modal {
        handle_modal_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc if state.phase() == ModalPhase::LoadingDetail => {
            apply_command(
                state,
                runtime,
                view_data,
                internal_tx,
                PollCommand::CloseModal,
            );
        }
        KeyCode::Up | KeyCode::Char('k') => move_list_cursor(state, view_data, -1),
        KeyCode::Down | KeyCode::Char('j') => move_list_cursor(state, view_data, 1),
        KeyCode::Home | KeyCode::Char('g') => view_data.list_cursor = 0,
        KeyCode::End | KeyCode::Char('G') => {
            view_data.list_cursor = state.polls.len().saturating_sub(1);
        }
        KeyCode::Enter => {
            let cursor = view_data.list_cursor;
            select_row(state, runtime, view_data, internal_tx, cursor);
        }
        _ => {}
    }
    false
}

fn handle_modal_key<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let option_count = state.poll.as_ref().map_or(0, |poll| poll.options.len());
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => {
            apply_command(
                state,
                runtime,
                view_data,
                internal_tx,
                PollCommand::CloseModal,
            );
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.option_cursor = view_data.option_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.option_cursor =
                (view_data.option_cursor + 1).min(option_count.saturating_sub(1));
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let cursor = view_data.option_cursor;
            vote_for(state, runtime, view_data, internal_tx, cursor);
        }
        _ => {}
    }
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }

    if state.show_modal {
        let option_count = state.poll.as_ref().map_or(0, |poll| poll.options.len());
        let layout = modal_layout(view_data.screen);
        match classify_modal_click(&layout, option_count, mouse.column, mouse.row) {
            ModalHit::Backdrop | ModalHit::CloseButton => apply_command(
                state,
                runtime,
                view_data,
                internal_tx,
                PollCommand::CloseModal,
            ),
            ModalHit::Option(index) => {
                view_data.option_cursor = index;
                vote_for(state, runtime, view_data, internal_tx, index);
            }
            ModalHit::Content => {}
        }
        return;
    }

    let layout = screen_layout(view_data.screen);
    if let Some(index) = list_row_at(
        &layout,
        view_data.list_cursor,
        state.polls.len(),
        mouse.column,
        mouse.row,
    ) {
        view_data.list_cursor = index;
        select_row(state, runtime, view_data, internal_tx, index);
    }
}

fn select_row<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(poll_id) = state.polls.get(index).map(|poll| poll.id) else {
        return;
    };
    apply_command(
        state,
        runtime,
        view_data,
        internal_tx,
        PollCommand::SelectPoll(poll_id),
    );
}

fn vote_for<R: AppRuntime>(
    state: &mut PollState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(option_id) = state
        .poll
        .as_ref()
        .and_then(|poll| poll.options.get(index))
        .map(|option| option.id)
    else {
        return;
    };
    apply_command(
        state,
        runtime,
        view_data,
        internal_tx,
        PollCommand::SubmitVote(option_id),
    );
}

fn move_list_cursor(state: &PollState, view_data: &mut ViewData, delta: isize) {
    if state.polls.is_empty() {
        view_data.list_cursor = 0;
        return;
    }
    let last = state.polls.len() - 1;
    view_data.list_cursor = view_data.list_cursor.saturating_add_signed(delta).min(last);
}

fn screen_layout(screen: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(screen);
    let list_rows = Block::default().borders(Borders::ALL).inner(rows[1]);
    ScreenLayout {
        header: rows[0],
        list: rows[1],
        list_rows,
        status: rows[2],
    }
}

fn modal_layout(screen: Rect) -> ModalLayout {
    let frame = centered_rect(80, 80, screen);
    let inner = Block::default().borders(Borders::ALL).inner(frame);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    let footer = rows[3];
    let close_width = (CLOSE_LABEL.chars().count() as u16).min(footer.width);

    ModalLayout {
        frame,
        header: rows[0],
        options: body[0],
        chart: body[1],
        total: rows[2],
        close_button: Rect {
            width: close_width,
            ..footer
        },
    }
}

fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

fn classify_modal_click(
    layout: &ModalLayout,
    option_count: usize,
    column: u16,
    row: u16,
) -> ModalHit {
    if !rect_contains(layout.frame, column, row) {
        return ModalHit::Backdrop;
    }
    if rect_contains(layout.close_button, column, row) {
        return ModalHit::CloseButton;
    }
    if rect_contains(layout.options, column, row) {
        let index = usize::from(row - layout.options.y);
        if index < option_count {
            return ModalHit::Option(index);
        }
    }
    ModalHit::Content
}

/// First list index shown so that `cursor` stays visible.
fn list_offset(cursor: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 {
        return 0;
    }
    cursor.saturating_sub(visible_rows - 1)
}

fn list_row_at(
    layout: &ScreenLayout,
    cursor: usize,
    poll_count: usize,
    column: u16,
    row: u16,
) -> Option<usize> {
    if !rect_contains(layout.list_rows, column, row) {
        return None;
    }
    let offset = list_offset(cursor, usize::from(layout.list_rows.height));
    let index = offset + usize::from(row - layout.list_rows.y);
    (index < poll_count).then_some(index)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &PollState, view_data: &ViewData) {
    let layout = screen_layout(frame.area());

    let title = if view_data.source.is_empty() {
        "pollview".to_owned()
    } else {
        format!("pollview · {}", view_data.source)
    };
    let header = Paragraph::new(format!("{} polls", state.polls.len()))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(header, layout.header);

    let list = Paragraph::new(render_list_lines(
        state,
        view_data.list_cursor,
        usize::from(layout.list_rows.height),
    ))
    .block(Block::default().title("polls").borders(Borders::ALL));
    frame.render_widget(list, layout.list);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout.status);

    if state.show_modal
        && let Some(poll) = &state.poll
    {
        let modal = modal_layout(frame.area());
        frame.render_widget(Clear, modal.frame);
        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
            modal.frame,
        );

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                MODAL_HEADING,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(poll.title.clone()),
            Line::from(Span::styled(
                poll.date_label(),
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(header, modal.header);

        let options = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let label = format!("[ {} ]", option.label);
                if index == view_data.option_cursor {
                    Line::from(Span::styled(
                        label,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                    ))
                } else {
                    Line::from(label)
                }
            })
            .collect::<Vec<Line<'_>>>();
        frame.render_widget(Paragraph::new(options), modal.options);

        if let Some(chart) = view_data.chart.current() {
            frame.render_widget(Doughnut::new(&chart.spec), modal.chart);
        }

        frame.render_widget(
            Paragraph::new(format!(
                "Total number of votes recorded: {}",
                poll.total_votes
            )),
            modal.total,
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                CLOSE_LABEL,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            modal.close_button,
        );
    }
}

fn render_list_lines(
    state: &PollState,
    cursor: usize,
    visible_rows: usize,
) -> Vec<Line<'static>> {
    let offset = list_offset(cursor, visible_rows);
    state
        .polls
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(index, poll)| {
            let selected = state.selected_poll_id == Some(poll.id);
            let marker = if selected { SELECTED_MARK } else { " " };
            let mut style = Style::default();
            if selected {
                style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            if index == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::styled(format!("{POLL_ICON} "), Style::default().fg(Color::DarkGray)),
                Span::styled(poll.date_label(), style.add_modifier(Modifier::DIM)),
                Span::styled(format!("{TITLE_SEPARATOR}{}", poll.title), style),
            ])
        })
        .collect()
}

fn status_text(state: &PollState) -> String {
    if let Some(status) = &state.status_line {
        return status.clone();
    }
    match state.phase() {
        ModalPhase::Closed => "↑/↓ move  enter open  click select  q quit".to_owned(),
        ModalPhase::LoadingDetail => "loading poll  esc cancel".to_owned(),
        ModalPhase::Open => "↑/↓ choose  enter vote  esc close".to_owned(),
        ModalPhase::Voting => "submitting vote".to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
