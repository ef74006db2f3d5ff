use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::models::{AnalysisResult, display_date};
use crate::pages::{
    AnalyzeFocus, AnalyzePage, DashboardPage, Effect, EmptyState, HistoryPage, JobsFocus, JobsPage,
    LoginPage, Page, RegisterPage, UploadPage,
};
use crate::report::{ScoreBand, preformatted, suggestion_lines};
use crate::router::{AuthState, Route, Router};
use crate::session::SessionStore;
use crate::widgets::{
    banner, button, card, centered_rect, input, modal, notice, score_gauge, score_span, select, text_area,
};

const TICK: Duration = Duration::from_millis(100);

/// The interactive shell: owns the session, routing and the current page.
pub struct App {
    session: SessionStore,
    router: Router,
    page: Option<Page>,
    dispatcher: Dispatcher,
    export_dir: PathBuf,
    shell_error: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(session: SessionStore, dispatcher: Dispatcher, export_dir: PathBuf) -> Self {
        Self {
            session,
            router: Router::new(Route::Dashboard),
            page: None,
            dispatcher,
            export_dir,
            shell_error: None,
            quit: false,
        }
    }

    fn auth(&self) -> AuthState {
        AuthState::of(&self.session)
    }

    /// Finishes hydration and pumps responses into the current page.
    ///
    /// A storage failure during hydration is shown in the banner; dismissing
    /// it with `x` retries.
    pub fn tick(&mut self) {
        if self.session.is_loading() && self.shell_error.is_none() {
            if let Err(e) = self.session.hydrate() {
                error!(error = %e, "failed to read stored session");
                self.shell_error = Some(format!("Could not read session: {}", e));
            }
        }
        if self.page.is_none() {
            self.go(self.router.current());
        }
        let generation = self.dispatcher.generation();
        for response in self.dispatcher.drain() {
            // A response may have remounted the page; the rest belong to the old one.
            if self.dispatcher.generation() != generation {
                break;
            }
            let effects = match self.page.as_mut() {
                Some(page) => page.apply(response),
                None => Vec::new(),
            };
            self.run_effects(effects);
        }
    }

    fn go(&mut self, target: Route) {
        let Some(route) = self.router.navigate(target, self.auth()) else {
            return;
        };
        self.dispatcher.unmount();
        let (page, requests) = Page::mount(route, self.session.current(), &self.export_dir);
        info!(route = route.title(), "screen mounted");
        self.page = Some(page);
        for request in requests {
            self.dispatcher.submit(request);
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(request) => self.dispatcher.submit(request),
                Effect::Navigate(route) => self.go(route),
                Effect::SignedIn(session) => {
                    if let Err(e) = self.session.login(session) {
                        error!(error = %e, "failed to persist session");
                        self.shell_error = Some(format!("Could not save session: {}", e));
                        return;
                    }
                    let target = self.router.after_login();
                    self.go(target);
                }
            }
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            error!(error = %e, "failed to clear session");
            self.shell_error = Some(format!("Could not clear session: {}", e));
            return;
        }
        let target = self.router.after_logout();
        self.go(target);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        let Some(page) = self.page.as_mut() else {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
                KeyCode::Char('x') => self.shell_error = None,
                _ => {}
            }
            return;
        };

        if let Some(effects) = confirm_keys(page, key.code) {
            self.run_effects(effects);
            return;
        }

        let editing = is_editing(page);
        let empty = empty_state(page);
        let route = page.route();
        let on_login = matches!(page, Page::Login(_));

        if on_login && key.code == KeyCode::Esc {
            self.quit = true;
            return;
        }
        if !editing {
            match key.code {
                KeyCode::Char('q') => {
                    self.quit = true;
                    return;
                }
                KeyCode::Char('o') if self.session.is_authenticated() => {
                    self.logout();
                    return;
                }
                KeyCode::Char(c @ '1'..='5') if self.session.is_authenticated() => {
                    let index = c as usize - '1' as usize;
                    self.go(Route::NAV[index]);
                    return;
                }
                KeyCode::Char('x') => {
                    self.shell_error = None;
                    if let Some(page) = self.page.as_mut() {
                        dismiss_errors(page);
                    }
                    return;
                }
                KeyCode::Char('g') => {
                    if let Some(empty) = empty {
                        if empty.target == route {
                            if let Some(page) = self.page.as_mut() {
                                open_form(page);
                            }
                        } else {
                            self.go(empty.target);
                        }
                        return;
                    }
                }
                _ => {}
            }
        }

        let effects = match self.page.as_mut() {
            Some(page) => page_keys(page, key),
            None => Vec::new(),
        };
        self.run_effects(effects);
    }
}

pub fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    while !app.quit {
        app.tick();
        terminal.draw(|frame| draw(frame, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

// --- Key handling ---

fn is_editing(page: &Page) -> bool {
    match page {
        Page::Login(_) | Page::Register(_) => true,
        Page::Upload(p) => p.editing,
        Page::Jobs(p) => p.focus != JobsFocus::List,
        Page::History(p) => p.searching,
        Page::Dashboard(_) | Page::Analyze(_) => false,
    }
}

/// Call to action for an empty list on the screen that owns the form.
fn open_form(page: &mut Page) {
    match page {
        Page::Upload(p) => p.editing = true,
        Page::Jobs(p) => p.focus = JobsFocus::Title,
        _ => {}
    }
}

fn empty_state(page: &Page) -> Option<EmptyState> {
    match page {
        Page::Dashboard(p) => p.empty_state(),
        Page::Upload(p) => p.empty_state(),
        Page::Jobs(p) => p.empty_state(),
        Page::Analyze(p) => p.empty_state(),
        Page::History(p) => p.empty_state(),
        Page::Login(_) | Page::Register(_) => None,
    }
}

fn pending_delete(page: &Page) -> Option<(&'static str, String)> {
    match page {
        Page::Upload(p) => {
            let id = p.cvs.confirming()?;
            let name = p.cvs.items.iter().find(|cv| cv.id == id).map(|cv| cv.file_name.clone());
            Some(("Delete CV", name.unwrap_or_else(|| format!("CV #{}", id))))
        }
        Page::Jobs(p) => {
            let id = p.jobs.confirming()?;
            let name = p.jobs.items.iter().find(|j| j.id == id).map(|j| j.title.clone());
            Some(("Delete job description", name.unwrap_or_else(|| format!("Job #{}", id))))
        }
        Page::History(p) => {
            let id = p.history.confirming()?;
            Some(("Delete analysis", format!("Analysis #{}", id)))
        }
        _ => None,
    }
}

/// The confirmation modal swallows every key while it is open.
fn confirm_keys(page: &mut Page, code: KeyCode) -> Option<Vec<Effect>> {
    pending_delete(page)?;
    let confirm = matches!(code, KeyCode::Char('y') | KeyCode::Enter);
    let cancel = matches!(code, KeyCode::Char('n') | KeyCode::Esc);
    let effect = match page {
        Page::Upload(p) if confirm => p.confirm_delete(),
        Page::Jobs(p) if confirm => p.confirm_delete(),
        Page::History(p) if confirm => p.confirm_delete(),
        Page::Upload(p) if cancel => {
            p.cvs.cancel_delete();
            None
        }
        Page::Jobs(p) if cancel => {
            p.jobs.cancel_delete();
            None
        }
        Page::History(p) if cancel => {
            p.history.cancel_delete();
            None
        }
        _ => None,
    };
    Some(effect.into_iter().collect())
}

fn page_error(page: &Page) -> Option<&str> {
    match page {
        Page::Login(p) => p.error.as_deref(),
        Page::Register(p) => p.error.as_deref(),
        Page::Dashboard(p) => p.error.as_deref(),
        Page::Upload(p) => p.error.as_deref().or(p.cvs.error.as_deref()),
        Page::Jobs(p) => p.error.as_deref().or(p.jobs.error.as_deref()),
        Page::Analyze(p) => p.error.as_deref(),
        Page::History(p) => p.error.as_deref().or(p.history.error.as_deref()),
    }
}

fn page_notice(page: &Page) -> Option<&str> {
    match page {
        Page::Upload(p) => p.notice.as_deref(),
        Page::Jobs(p) => p.notice.as_deref(),
        Page::History(p) => p.notice.as_deref(),
        _ => None,
    }
}

fn dismiss_errors(page: &mut Page) {
    match page {
        Page::Login(p) => p.error = None,
        Page::Register(p) => p.error = None,
        Page::Dashboard(p) => p.error = None,
        Page::Upload(p) => {
            p.error = None;
            p.cvs.error = None;
            p.notice = None;
        }
        Page::Jobs(p) => {
            p.error = None;
            p.jobs.error = None;
            p.notice = None;
        }
        Page::Analyze(p) => p.error = None,
        Page::History(p) => {
            p.error = None;
            p.history.error = None;
            p.notice = None;
        }
    }
}

fn page_keys(page: &mut Page, key: KeyEvent) -> Vec<Effect> {
    let effect = match page {
        Page::Login(p) => login_keys(p, key),
        Page::Register(p) => register_keys(p, key),
        Page::Dashboard(p) => {
            if key.code == KeyCode::Char('r') {
                return p.mount().into_iter().map(Effect::Request).collect();
            }
            None
        }
        Page::Upload(p) => upload_keys(p, key),
        Page::Jobs(p) => jobs_keys(p, key),
        Page::Analyze(p) => analyze_keys(p, key),
        Page::History(p) => history_keys(p, key),
    };
    effect.into_iter().collect()
}

fn login_keys(page: &mut LoginPage, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Effect::Navigate(Route::Register));
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => page.next_field(),
        KeyCode::Enter if page.focus == 0 => page.next_field(),
        KeyCode::Enter => return page.submit(),
        KeyCode::Backspace => page.focused_mut().pop(),
        KeyCode::Char(c) => page.focused_mut().push(c),
        _ => {}
    }
    None
}

fn register_keys(page: &mut RegisterPage, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Esc => return Some(Effect::Navigate(Route::Login)),
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => page.next_field(),
        KeyCode::Enter if page.focus < 2 => page.next_field(),
        KeyCode::Enter => return page.submit(),
        KeyCode::Backspace => page.focused_mut().pop(),
        KeyCode::Char(c) => page.focused_mut().push(c),
        _ => {}
    }
    None
}

fn upload_keys(page: &mut UploadPage, key: KeyEvent) -> Option<Effect> {
    if page.editing {
        match key.code {
            KeyCode::Enter => return page.upload(),
            KeyCode::Esc => page.editing = false,
            KeyCode::Backspace => page.path.pop(),
            KeyCode::Char(c) => page.path.push(c),
            _ => {}
        }
        return None;
    }
    match key.code {
        KeyCode::Char('u') | KeyCode::Char('i') => page.editing = true,
        KeyCode::Down | KeyCode::Char('j') => {
            let len = page.cvs.items.len();
            page.cvs.next(len);
        }
        KeyCode::Up | KeyCode::Char('k') => page.cvs.prev(),
        KeyCode::Char('d') | KeyCode::Delete => {
            page.delete_selected();
        }
        KeyCode::Char('r') => return Some(Effect::Request(page.refresh())),
        _ => {}
    }
    None
}

fn jobs_keys(page: &mut JobsPage, key: KeyEvent) -> Option<Effect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match page.focus {
        JobsFocus::List => match key.code {
            KeyCode::Down | KeyCode::Char('j') => page.next(),
            KeyCode::Up | KeyCode::Char('k') => page.prev(),
            KeyCode::Char('/') => page.focus = JobsFocus::Search,
            KeyCode::Char('a') => page.focus = JobsFocus::Title,
            KeyCode::Char('d') | KeyCode::Delete => {
                page.delete_selected();
            }
            KeyCode::Char('r') => return Some(Effect::Request(page.refresh())),
            _ => {}
        },
        JobsFocus::Search => match key.code {
            KeyCode::Esc | KeyCode::Enter => page.focus = JobsFocus::List,
            KeyCode::Backspace => {
                page.search.pop();
                page.search_changed();
            }
            KeyCode::Char(c) => {
                page.search.push(c);
                page.search_changed();
            }
            _ => {}
        },
        JobsFocus::Title => match key.code {
            KeyCode::Char('s') if ctrl => return page.save(),
            KeyCode::Esc => page.focus = JobsFocus::List,
            KeyCode::Tab | KeyCode::Enter => page.focus = JobsFocus::Content,
            KeyCode::Backspace => page.title.pop(),
            KeyCode::Char(c) => page.title.push(c),
            _ => {}
        },
        JobsFocus::Content => match key.code {
            KeyCode::Char('s') if ctrl => return page.save(),
            KeyCode::Esc => page.focus = JobsFocus::List,
            KeyCode::Tab => page.focus = JobsFocus::Title,
            KeyCode::Enter => page.content.push('\n'),
            KeyCode::Backspace => {
                page.content.pop();
            }
            KeyCode::Char(c) => page.content.push(c),
            _ => {}
        },
    }
    None
}

fn analyze_keys(page: &mut AnalyzePage, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => page.toggle_focus(),
        KeyCode::Down | KeyCode::Char('j') => page.next(),
        KeyCode::Up | KeyCode::Char('k') => page.prev(),
        KeyCode::Char(' ') | KeyCode::Enter => page.select(),
        KeyCode::Char('s') => return page.start(),
        KeyCode::Char('J') | KeyCode::PageDown => page.scroll_down(),
        KeyCode::Char('K') | KeyCode::PageUp => page.scroll_up(),
        _ => {}
    }
    None
}

fn history_keys(page: &mut HistoryPage, key: KeyEvent) -> Option<Effect> {
    if page.searching {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => page.searching = false,
            KeyCode::Backspace => {
                page.search.pop();
                page.filters_changed();
            }
            KeyCode::Char(c) => {
                page.search.push(c);
                page.filters_changed();
            }
            _ => {}
        }
        return None;
    }
    if page.detail.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => page.close_detail(),
            KeyCode::Char('e') => return page.export(),
            KeyCode::Char('d') | KeyCode::Delete => {
                page.delete_selected();
            }
            KeyCode::Char('J') | KeyCode::PageDown | KeyCode::Down | KeyCode::Char('j') => page.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp | KeyCode::Up | KeyCode::Char('k') => page.scroll_up(),
            _ => {}
        }
        return None;
    }
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => page.next(),
        KeyCode::Up | KeyCode::Char('k') => page.prev(),
        KeyCode::Enter => return page.open_selected(),
        KeyCode::Char('/') => page.searching = true,
        KeyCode::Char('t') => page.cycle_window(),
        KeyCode::Char('e') => return page.export(),
        KeyCode::Char('d') | KeyCode::Delete => {
            page.delete_selected();
        }
        KeyCode::Char('r') => {
            return page.mount().into_iter().next().map(Effect::Request);
        }
        _ => {}
    }
    None
}

// --- Drawing ---

fn draw(frame: &mut Frame, app: &App) {
    let Some(page) = &app.page else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
            .split(frame.area());
        let area = centered_rect(40, 20, rows[0]);
        frame.render_widget(Paragraph::new("Loading session...").alignment(Alignment::Center), area);
        if let Some(message) = app.shell_error.as_deref() {
            frame.render_widget(banner(message), rows[1]);
            let help = Paragraph::new(" x:retry  q:quit").style(Style::default().fg(Color::DarkGray));
            frame.render_widget(help, rows[2]);
        }
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let content = if page.route().is_public() {
        rows[0]
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(0)])
            .split(rows[0]);
        draw_sidebar(frame, columns[0], app, page.route());
        columns[1]
    };

    match page {
        Page::Login(p) => draw_login(frame, content, p, app.router.return_to()),
        Page::Register(p) => draw_register(frame, content, p),
        Page::Dashboard(p) => draw_dashboard(frame, content, p),
        Page::Upload(p) => draw_upload(frame, content, p),
        Page::Jobs(p) => draw_jobs(frame, content, p),
        Page::Analyze(p) => draw_analyze(frame, content, p),
        Page::History(p) => draw_history(frame, content, p),
    }

    // Form errors are drawn inline on the auth screens.
    let shown_error = app
        .shell_error
        .as_deref()
        .or_else(|| if page.route().is_public() { None } else { page_error(page) });
    if let Some(message) = shown_error {
        frame.render_widget(banner(message), rows[1]);
    } else if let Some(message) = page_notice(page) {
        frame.render_widget(notice(message), rows[1]);
    }

    let mut help = vec![Span::styled(help_text(page), Style::default().fg(Color::DarkGray))];
    if app.dispatcher.is_busy() {
        help.push(Span::styled("  working...", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(help)), rows[2]);

    if let Some((title, name)) = pending_delete(page) {
        modal(frame, title, &format!("Delete \"{}\"? This cannot be undone.", name));
    }
}

fn help_text(page: &Page) -> &'static str {
    match page {
        Page::Login(_) => " Tab:next field  Enter:sign in  Ctrl+R:create account  Esc:quit",
        Page::Register(_) => " Tab:next field  Enter:create account  Esc:back to sign in",
        Page::Dashboard(_) => " 1-5:navigate  r:refresh  g:start analysis  o:log out  q:quit",
        Page::Upload(p) if p.editing => " Enter:upload  Esc:stop editing",
        Page::Upload(_) => " u:enter path  j/k:move  d:delete  r:refresh  1-5:navigate  q:quit",
        Page::Jobs(p) if p.focus == JobsFocus::List => {
            " a:add  /:search  j/k:move  d:delete  1-5:navigate  q:quit"
        }
        Page::Jobs(_) => " Tab:switch field  Ctrl+S:save  Esc:back to list",
        Page::Analyze(_) => " Tab:switch list  Space:select  s:start  J/K:scroll  1-5:navigate  q:quit",
        Page::History(p) if p.detail.is_some() => " e:export improved CV  d:delete  J/K:scroll  Esc:back",
        Page::History(_) => " Enter:open  /:search  t:time range  e:export  d:delete  1-5:navigate  q:quit",
    }
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App, current: Route) {
    let mut lines = vec![
        Line::from(Span::styled("CV Scanner", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    for (i, route) in Route::NAV.iter().enumerate() {
        let style = if *route == current {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!(" {} {}", i + 1, route.title()), style)));
    }
    lines.push(Line::from(""));
    if let Some(session) = app.session.current() {
        lines.push(Line::from(Span::styled(
            session.email.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(" o Log out"));
    frame.render_widget(Paragraph::new(lines).block(card("Menu")), area);
}

fn form_error(error: Option<&str>) -> Line<'_> {
    match error {
        Some(message) => Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        None => Line::from(""),
    }
}

fn draw_login(frame: &mut Frame, area: Rect, page: &LoginPage, return_to: Option<Route>) {
    let area = centered_rect(60, 70, area);
    let block = card("Sign In");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(inner);
    input(frame, rows[0], &page.email, page.focus == 0);
    input(frame, rows[1], &page.password, page.focus == 1);
    let ready = !page.email.is_blank() && !page.password.text().is_empty();
    frame.render_widget(Paragraph::new(Line::from(button("Sign In", ready, page.submitting))), rows[2]);
    frame.render_widget(Paragraph::new(form_error(page.error.as_deref())), rows[3]);
    let mut hints = Vec::new();
    if let Some(route) = return_to {
        hints.push(Line::from(format!("Sign in to continue to {}.", route.title())));
    }
    hints.push(Line::from("No account yet? Press Ctrl+R to create one."));
    frame.render_widget(Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)), rows[4]);
}

fn draw_register(frame: &mut Frame, area: Rect, page: &RegisterPage) {
    let area = centered_rect(60, 80, area);
    let block = card("Create Account");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    input(frame, rows[0], &page.email, page.focus == 0);
    input(frame, rows[1], &page.password, page.focus == 1);
    input(frame, rows[2], &page.confirm, page.focus == 2);
    let ready = !page.email.is_blank() && !page.password.text().is_empty();
    frame.render_widget(
        Paragraph::new(Line::from(button("Create Account", ready, page.submitting))),
        rows[3],
    );
    frame.render_widget(Paragraph::new(form_error(page.error.as_deref())), rows[4]);
}

fn empty_paragraph(empty: EmptyState) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(empty.message),
        Line::from(""),
        Line::from(Span::styled(
            format!("[g] {}", empty.action),
            Style::default().fg(Color::Cyan),
        )),
    ])
    .alignment(Alignment::Center)
}

fn loading(label: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(label, Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)))
}

fn result_row(result: &AnalysisResult) -> Line<'static> {
    Line::from(vec![
        score_span(result.score),
        Span::raw(format!(
            "  {}  vs  {}  ({})",
            result.cv_name,
            result.job_title,
            display_date(&result.created_at)
        )),
    ])
}

/// Feedback, suggestions and the improved CV with its whitespace intact.
fn result_lines(result: &AnalysisResult, width: u16) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let band = ScoreBand::of(result.score);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", band.marker()), Style::default().fg(band.color())),
            Span::styled(band.label(), Style::default().fg(band.color())),
        ]),
        Line::from(""),
        Line::from(Span::styled("Feedback", heading)),
    ];
    lines.extend(preformatted(&result.feedback).into_iter().map(|l| Line::from(l.to_string())));

    if !result.suggestions.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Suggestions", heading)));
        let options = textwrap::Options::new(usize::from(width.max(20)) - 2).subsequent_indent("   ");
        for suggestion in suggestion_lines(&result.suggestions) {
            for line in textwrap::wrap(&suggestion, &options) {
                lines.push(Line::from(line.into_owned()));
            }
        }
    }

    if !result.improved_cv.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Improved CV", heading)));
        lines.extend(
            preformatted(&result.improved_cv)
                .into_iter()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Gray)))),
        );
    }
    lines
}

fn draw_dashboard(frame: &mut Frame, area: Rect, page: &DashboardPage) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let status = match &page.backend {
        None => Span::styled("Checking backend...", Style::default().fg(Color::DarkGray)),
        Some(Ok(())) => Span::styled("Backend connected", Style::default().fg(Color::Green)),
        Some(Err(message)) => Span::styled(
            format!("Backend unreachable: {}", message),
            Style::default().fg(Color::Red),
        ),
    };
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Welcome back, {}", page.email),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(status),
        ]),
        rows[0],
    );

    let stats = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    frame.render_widget(
        Paragraph::new(page.stats.total.to_string()).block(card("Total Analyses")),
        stats[0],
    );
    let average = if page.stats.total > 0 {
        Line::from(score_span(page.stats.average_score as f64))
    } else {
        Line::from("-")
    };
    frame.render_widget(Paragraph::new(average).block(card("Average Score")), stats[1]);

    let recent = card("Recent Activity");
    let inner = recent.inner(rows[2]);
    frame.render_widget(recent, rows[2]);
    if page.loading {
        frame.render_widget(loading("Loading..."), inner);
    } else if let Some(empty) = page.empty_state() {
        frame.render_widget(empty_paragraph(empty), inner);
    } else {
        let lines: Vec<Line> = page.stats.recent.iter().map(result_row).collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn draw_upload(frame: &mut Frame, area: Rect, page: &UploadPage) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    input(frame, rows[0], &page.path, page.editing);
    frame.render_widget(
        Paragraph::new(Line::from(button("Upload", page.can_upload(), page.uploading))),
        rows[1],
    );

    if page.cvs.loading {
        frame.render_widget(loading("Loading CVs...").block(card("Your CVs")), rows[2]);
    } else if let Some(empty) = page.empty_state() {
        frame.render_widget(empty_paragraph(empty).block(card("Your CVs")), rows[2]);
    } else {
        let items: Vec<ListItem> = page
            .cvs
            .items
            .iter()
            .map(|cv| {
                let deleting = page.cvs.deleting() == Some(cv.id);
                let suffix = if deleting { "  (deleting...)" } else { "" };
                ListItem::new(format!("#{:<4} {}  {}{}", cv.id, cv.file_name, display_date(&cv.created_at), suffix))
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(page.cvs.selected));
        select(frame, rows[2], "Your CVs", items, &mut state, !page.editing);
    }
}

fn draw_jobs(frame: &mut Frame, area: Rect, page: &JobsPage) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[0]);
    input(frame, left[0], &page.search, page.focus == JobsFocus::Search);

    if page.jobs.loading {
        frame.render_widget(loading("Loading job descriptions...").block(card("Job Descriptions")), left[1]);
    } else if let Some(empty) = page.empty_state() {
        frame.render_widget(empty_paragraph(empty).block(card("Job Descriptions")), left[1]);
    } else {
        let items: Vec<ListItem> = page
            .visible()
            .into_iter()
            .map(|job| ListItem::new(format!("#{:<4} {}  {}", job.id, job.title, display_date(&job.created_at))))
            .collect();
        let mut state = ListState::default().with_selected(Some(page.jobs.selected));
        select(frame, left[1], "Job Descriptions", items, &mut state, page.focus == JobsFocus::List);
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(columns[1]);
    input(frame, right[0], &page.title, page.focus == JobsFocus::Title);
    text_area(frame, right[1], "Description", &page.content, page.focus == JobsFocus::Content);
    frame.render_widget(
        Paragraph::new(Line::from(button("Save (Ctrl+S)", page.can_save(), page.saving))),
        right[2],
    );
}

fn draw_analyze(frame: &mut Frame, area: Rect, page: &AnalyzePage) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let pickers = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let marker = |chosen: bool| if chosen { "[x]" } else { "[ ]" };

    if page.loading_cvs {
        frame.render_widget(loading("Loading CVs...").block(card("Select CV")), pickers[0]);
    } else if let Some(message) = page.cv_error.as_deref() {
        frame.render_widget(Paragraph::new(form_error(Some(message))).block(card("Select CV")), pickers[0]);
    } else if let Some(empty) = page.cv_empty_state() {
        frame.render_widget(empty_paragraph(empty).block(card("Select CV")), pickers[0]);
    } else {
        let items: Vec<ListItem> = page
            .cvs
            .iter()
            .map(|cv| ListItem::new(format!("{} {}", marker(page.cv_id == Some(cv.id)), cv.file_name)))
            .collect();
        let mut state = ListState::default().with_selected(Some(page.cv_cursor));
        select(frame, pickers[0], "Select CV", items, &mut state, page.focus == AnalyzeFocus::Cvs);
    }

    if page.loading_jobs {
        frame.render_widget(loading("Loading job descriptions...").block(card("Select Job")), pickers[1]);
    } else if let Some(message) = page.job_error.as_deref() {
        frame.render_widget(Paragraph::new(form_error(Some(message))).block(card("Select Job")), pickers[1]);
    } else if let Some(empty) = page.job_empty_state() {
        frame.render_widget(empty_paragraph(empty).block(card("Select Job")), pickers[1]);
    } else {
        let items: Vec<ListItem> = page
            .jobs
            .iter()
            .map(|job| ListItem::new(format!("{} {}", marker(page.job_id == Some(job.id)), job.title)))
            .collect();
        let mut state = ListState::default().with_selected(Some(page.job_cursor));
        select(frame, pickers[1], "Select Job", items, &mut state, page.focus == AnalyzeFocus::Jobs);
    }

    frame.render_widget(
        Paragraph::new(Line::from(button("Start Analysis (s)", page.can_start(), page.analyzing))),
        rows[1],
    );

    if page.analyzing {
        frame.render_widget(loading("Analyzing your CV against the job description..."), rows[2]);
    } else if let Some(result) = &page.result {
        draw_result(frame, rows[2], result, page.scroll);
    }
}

fn draw_result(frame: &mut Frame, area: Rect, result: &AnalysisResult, scroll: u16) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    score_gauge(frame, rows[0], result.score);
    let title = format!("{}  vs  {}", result.cv_name, result.job_title);
    let detail = Paragraph::new(result_lines(result, rows[1].width))
        .block(card(&title))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(detail, rows[1]);
}

fn draw_history(frame: &mut Frame, area: Rect, page: &HistoryPage) {
    if let Some(detail) = &page.detail {
        draw_result(frame, area, detail, page.scroll);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    input(frame, rows[0], &page.search, page.searching);
    frame.render_widget(
        Paragraph::new(format!(" Time range: {}  (t to change)", page.window.label())),
        rows[1],
    );

    if page.history.loading {
        frame.render_widget(loading("Loading history...").block(card("Analysis History")), rows[2]);
    } else if let Some(empty) = page.empty_state() {
        frame.render_widget(empty_paragraph(empty).block(card("Analysis History")), rows[2]);
    } else {
        let items: Vec<ListItem> = page.visible().into_iter().map(|r| ListItem::new(result_row(r))).collect();
        let title = if page.loading_detail { "Analysis History (opening...)" } else { "Analysis History" };
        let mut state = ListState::default().with_selected(Some(page.history.selected));
        select(frame, rows[2], title, items, &mut state, !page.searching);
    }
}
