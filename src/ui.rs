use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};

use crate::academy::{ForumPost, Video};
use crate::store::{Store, Update};

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER: Color = Color::Rgb(49, 50, 68);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const DEFAULT_TOPICS: &str = "technique,question";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Videos,
    Forum,
    Progress,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Videos, Tab::Forum, Tab::Progress];

    fn title(&self) -> &'static str {
        match self {
            Tab::Videos => "Vidéos",
            Tab::Forum => "Forum",
            Tab::Progress => "Progression",
        }
    }

    fn index(&self) -> usize {
        match self {
            Tab::Videos => 0,
            Tab::Forum => 1,
            Tab::Progress => 2,
        }
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ComposeField {
    Title,
    Content,
    Topics,
}

struct ComposeForm {
    title: String,
    content: String,
    topics: String,
    field: ComposeField,
}

impl ComposeForm {
    fn new() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            topics: DEFAULT_TOPICS.to_string(),
            field: ComposeField::Title,
        }
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.field {
            ComposeField::Title => &mut self.title,
            ComposeField::Content => &mut self.content,
            ComposeField::Topics => &mut self.topics,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            ComposeField::Title => ComposeField::Content,
            ComposeField::Content => ComposeField::Topics,
            ComposeField::Topics => ComposeField::Title,
        };
    }
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

pub struct Options {
    pub store: Store,
    pub config_path: String,
}

pub struct Model {
    store: Store,
    active_tab: Tab,
    video_list: ListState,
    post_list: ListState,
    compose: Option<ComposeForm>,
    status_message: String,
    spinner: Spinner,
    needs_redraw: bool,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let mut model = Model {
            store: opts.store,
            active_tab: Tab::Videos,
            video_list: ListState::default(),
            post_list: ListState::default(),
            compose: None,
            status_message: format!(
                "Bienvenue dans Kwoon. Tab change d'onglet, q quitte. Config: {}",
                opts.config_path
            ),
            spinner: Spinner::new(),
            needs_redraw: true,
        };
        model.store.load_library();
        model.store.load_posts();
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

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            self.poll_store();

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Erreur: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                }
            }

            self.poll_store();

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.store.is_busy() && self.spinner.advance() {
                    self.mark_dirty();
                } else if !self.store.is_busy() {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn poll_store(&mut self) {
        let updates = self.store.poll();
        if updates.is_empty() {
            return;
        }
        for update in updates {
            self.apply_update(update);
        }
        self.clamp_selections();
        self.mark_dirty();
    }

    fn apply_update(&mut self, update: Update) {
        match update {
            Update::LibraryLoaded => {
                self.status_message = format!(
                    "Bibliothèque à jour: {} vidéos, {} complétées.",
                    self.store.videos().len(),
                    self.store.completed_count()
                );
            }
            Update::LibraryFailed(err) => {
                self.status_message = format!("Échec du chargement de la bibliothèque: {}", err);
            }
            Update::PostsLoaded => {
                self.status_message = format!("Forum à jour: {} posts.", self.store.posts().len());
            }
            Update::PostsFailed(err) => {
                self.status_message = format!("Échec du chargement du forum: {}", err);
            }
            Update::Seeded(0) => {
                self.status_message = "Le catalogue contient déjà des vidéos.".to_string();
            }
            Update::Seeded(count) => {
                self.status_message = format!("{} vidéos d'exemple créées.", count);
            }
            Update::SeedFailed(err) => {
                self.status_message = format!("Échec de l'initialisation du catalogue: {}", err);
            }
            Update::Watched => {
                self.status_message = "Vidéo marquée comme regardée.".to_string();
            }
            Update::WatchFailed(err) => {
                self.status_message = format!("Échec du suivi de progression: {}", err);
            }
            Update::Posted => {
                self.compose = None;
                self.status_message = "Post publié.".to_string();
            }
            Update::PostFailed(err) => {
                self.status_message = format!("Échec de la publication: {}", err);
            }
        }
    }

    fn clamp_selections(&mut self) {
        clamp_selection(&mut self.video_list, self.store.videos().len());
        clamp_selection(&mut self.post_list, self.store.posts().len());
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.compose.is_some() {
            self.handle_compose_key(code);
            return Ok(false);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
            }
            KeyCode::BackTab => {
                self.active_tab = self.active_tab.prev();
            }
            KeyCode::Char('1') => self.active_tab = Tab::Videos,
            KeyCode::Char('2') => self.active_tab = Tab::Forum,
            KeyCode::Char('3') => self.active_tab = Tab::Progress,
            KeyCode::Char('r') => self.refresh_active_tab(),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('w') if self.active_tab == Tab::Videos => self.mark_selected_watched(),
            KeyCode::Char('s') if self.active_tab == Tab::Videos => self.seed_catalog(),
            KeyCode::Char('o') if self.active_tab == Tab::Videos => self.open_selected_video()?,
            KeyCode::Char('n') if self.active_tab == Tab::Forum => {
                self.compose = Some(ComposeForm::new());
                self.status_message =
                    "Nouveau post: Tab change de champ, Entrée sur Tags publie, Échap annule."
                        .to_string();
            }
            _ => return Ok(false),
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_compose_key(&mut self, code: KeyCode) {
        let Some(form) = self.compose.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.compose = None;
                self.status_message = "Publication annulée.".to_string();
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::Backspace => {
                form.active_value_mut().pop();
            }
            KeyCode::Enter => match form.field {
                ComposeField::Title => form.field = ComposeField::Content,
                ComposeField::Content => form.content.push('\n'),
                ComposeField::Topics => self.submit_compose(),
            },
            KeyCode::Char(c) => form.active_value_mut().push(c),
            _ => {}
        }
        self.mark_dirty();
    }

    fn submit_compose(&mut self) {
        let Some(form) = self.compose.as_ref() else {
            return;
        };
        if self.store.publishing() {
            self.status_message = "Publication déjà en cours…".to_string();
            return;
        }
        match self
            .store
            .create_post(&form.title, &form.content, &form.topics)
        {
            Ok(()) => {
                self.status_message = "Publication…".to_string();
            }
            Err(err) => {
                self.status_message = format!("Post incomplet: {}", err);
            }
        }
    }

    fn refresh_active_tab(&mut self) {
        match self.active_tab {
            Tab::Videos | Tab::Progress => {
                self.store.load_library();
                self.status_message = "Chargement de la bibliothèque…".to_string();
            }
            Tab::Forum => {
                self.store.load_posts();
                self.status_message = "Actualisation du forum…".to_string();
            }
        }
        self.spinner.reset();
    }

    fn move_selection(&mut self, delta: isize) {
        let (state, len) = match self.active_tab {
            Tab::Videos | Tab::Progress => (&mut self.video_list, self.store.videos().len()),
            Tab::Forum => (&mut self.post_list, self.store.posts().len()),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        state.select(Some(next));
    }

    fn selected_video(&self) -> Option<Video> {
        let index = self.video_list.selected()?;
        self.store.videos().get(index).cloned()
    }

    fn mark_selected_watched(&mut self) {
        if self.store.marking() {
            self.status_message = "Suivi déjà en cours…".to_string();
            return;
        }
        let Some(video) = self.selected_video() else {
            self.status_message = "Aucune vidéo sélectionnée.".to_string();
            return;
        };
        self.status_message = format!("Marquage de « {} »…", video.title);
        self.store.mark_watched(&video);
    }

    fn seed_catalog(&mut self) {
        if !self.store.videos().is_empty() {
            self.status_message = "Le catalogue contient déjà des vidéos.".to_string();
            return;
        }
        if self.store.seeding() {
            self.status_message = "Création déjà en cours…".to_string();
            return;
        }
        self.status_message = "Création des vidéos d'exemple…".to_string();
        self.store.ensure_seed();
    }

    fn open_selected_video(&mut self) -> Result<()> {
        let Some(video) = self.selected_video() else {
            self.status_message = "Aucune vidéo sélectionnée.".to_string();
            return Ok(());
        };
        if video.url.is_empty() {
            self.status_message = "Cette vidéo n'a pas d'URL.".to_string();
            return Ok(());
        }
        match webbrowser::open(&video.url) {
            Ok(_) => {
                self.status_message = format!("Ouverture de « {} »…", video.title);
            }
            Err(err) => {
                self.status_message = format!("Impossible d'ouvrir le navigateur: {}", err);
            }
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.store.is_busy() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        let titles: Vec<Line> = Tab::ALL
            .iter()
            .map(|tab| Line::from(format!(" {} ", tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.active_tab.index())
            .style(Style::default().fg(COLOR_TEXT_SECONDARY).bg(COLOR_BG))
            .highlight_style(
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, layout[1]);

        match self.active_tab {
            Tab::Videos => self.draw_videos(frame, layout[2]),
            Tab::Forum => self.draw_forum(frame, layout[2]),
            Tab::Progress => self.draw_progress(frame, layout[2]),
        }

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center);
        frame.render_widget(footer, layout[3]);
    }

    fn footer_text(&self) -> String {
        let user = self.store.user_id();
        match self.active_tab {
            Tab::Videos => format!(
                "Utilisateur: {} · j/k sélection · w regardé · o ouvrir · s exemples · r actualiser · q quitter",
                user
            ),
            Tab::Forum => format!(
                "Utilisateur: {} · j/k sélection · n nouveau post · r actualiser · q quitter",
                user
            ),
            Tab::Progress => format!(
                "Utilisateur: {} · r actualiser · q quitter",
                user
            ),
        }
    }

    fn panel_block(&self, title: &str) -> Block<'static> {
        let title_style = Style::default()
            .fg(COLOR_ACCENT)
            .add_modifier(Modifier::BOLD);
        Block::default()
            .title(Span::styled(format!(" {} ", title), title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER))
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::uniform(1))
    }

    fn draw_videos(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block("Bibliothèque vidéo");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let videos = self.store.videos();
        if videos.is_empty() {
            let message = if self.store.library_loading() {
                "Chargement…"
            } else if self.store.seeding() {
                "Création des vidéos d'exemple…"
            } else {
                "Catalogue vide. Appuie sur s pour insérer des vidéos d'exemple."
            };
            let paragraph = Paragraph::new(message)
                .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, inner);
            return;
        }

        let items: Vec<ListItem> = videos.iter().map(|video| self.video_item(video)).collect();
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(COLOR_PANEL_SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_stateful_widget(list, inner, &mut self.video_list);
    }

    fn video_item(&self, video: &Video) -> ListItem<'static> {
        let mut header = vec![
            Span::styled(
                video.title.clone(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", video.level.display_name()),
                Style::default().fg(COLOR_ACCENT),
            ),
            Span::raw(" "),
            Span::styled(
                video.requires_plan.display_name().to_string(),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
        ];
        if let Some(minutes) = video.duration_minutes() {
            header.push(Span::styled(
                format!("  {} min", minutes),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ));
        }

        let mut lines = vec![Line::from(header)];
        if !video.description.is_empty() {
            lines.push(Line::from(Span::styled(
                video.description.clone(),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
        }
        if !video.topics.is_empty() {
            lines.push(Line::from(Span::styled(
                topic_tags(&video.topics),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
        }
        if let Some(percent) = self.store.percent_for(&video.id) {
            lines.push(Line::from(Span::styled(
                format!("Complété à {}%", percent),
                Style::default().fg(COLOR_SUCCESS),
            )));
        }
        lines.push(Line::from(String::new()));
        ListItem::new(lines)
    }

    fn draw_forum(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let block = self.panel_block("Forum communautaire");
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        let posts = self.store.posts();
        if posts.is_empty() {
            let message = if self.store.posts_loading() {
                "Chargement…"
            } else {
                "Aucun post encore. Lance la conversation avec n !"
            };
            let paragraph = Paragraph::new(message)
                .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, inner);
        } else {
            let items: Vec<ListItem> = posts.iter().map(post_item).collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(COLOR_PANEL_SELECTED_BG)
                    .add_modifier(Modifier::BOLD),
            );
            frame.render_stateful_widget(list, inner, &mut self.post_list);
        }

        if self.compose.is_some() {
            self.draw_compose(frame, chunks[1]);
        } else {
            self.draw_forum_side(frame, chunks[1]);
        }
    }

    fn draw_forum_side(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block("Règles");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let text = Text::from(vec![
            Line::from("Appuie sur n pour écrire un nouveau post."),
            Line::from(String::new()),
            Line::from("· Reste courtois et constructif"),
            Line::from("· Partage des conseils actionnables"),
            Line::from("· Aucune publicité non sollicitée"),
        ]);
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(COLOR_TEXT_SECONDARY))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_compose(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let Some(form) = self.compose.as_ref() else {
            return;
        };
        let block = self.panel_block("Nouveau post");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let field_style = |field: ComposeField| {
            if form.field == field {
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .bg(COLOR_PANEL_SELECTED_BG)
            } else {
                Style::default().fg(COLOR_TEXT_SECONDARY)
            }
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("Titre: {}", form.title),
                field_style(ComposeField::Title),
            )),
            Line::from(String::new()),
            Line::from(Span::styled("Contenu:", field_style(ComposeField::Content))),
        ];
        for row in form.content.split('\n') {
            lines.push(Line::from(Span::styled(
                row.to_string(),
                field_style(ComposeField::Content),
            )));
        }
        lines.push(Line::from(String::new()));
        lines.push(Line::from(Span::styled(
            format!("Tags: {}", form.topics),
            field_style(ComposeField::Topics),
        )));
        lines.push(Line::from(String::new()));
        let hint = if self.store.publishing() {
            "Publication…"
        } else {
            "Tab champ suivant · Entrée sur Tags publie · Échap annule"
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default()
                .fg(COLOR_TEXT_SECONDARY)
                .add_modifier(Modifier::ITALIC),
        )));

        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn draw_progress(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let summary_block = self.panel_block("Résumé");
        let summary_inner = summary_block.inner(chunks[0]);
        frame.render_widget(summary_block, chunks[0]);
        let summary = Paragraph::new(Line::from(vec![
            Span::styled(
                "Vidéos complétées: ",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
            Span::styled(
                self.store.completed_count().to_string(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        frame.render_widget(summary, summary_inner);

        let details_block = self.panel_block("Détails");
        let details_inner = details_block.inner(chunks[1]);
        frame.render_widget(details_block, chunks[1]);

        let videos = self.store.videos();
        if videos.is_empty() {
            let message = if self.store.library_loading() {
                "Chargement…"
            } else {
                "Aucune vidéo dans le catalogue."
            };
            let paragraph =
                Paragraph::new(message).style(Style::default().fg(COLOR_TEXT_SECONDARY));
            frame.render_widget(paragraph, details_inner);
            return;
        }

        let lines: Vec<Line> = videos
            .iter()
            .map(|video| {
                let percent = self.store.percent_for(&video.id);
                let badge_style = if percent.unwrap_or(0) >= 100 {
                    Style::default()
                        .fg(COLOR_SUCCESS)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(COLOR_TEXT_SECONDARY)
                };
                Line::from(vec![
                    Span::styled(
                        video.title.clone(),
                        Style::default().fg(COLOR_TEXT_PRIMARY),
                    ),
                    Span::raw("  "),
                    Span::styled(percent_badge(percent), badge_style),
                ])
            })
            .collect();
        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, details_inner);
    }
}

fn post_item(post: &ForumPost) -> ListItem<'static> {
    let mut title_line = vec![Span::styled(
        post.title.clone(),
        Style::default()
            .fg(COLOR_TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD),
    )];
    if !post.topics.is_empty() {
        title_line.push(Span::raw("  "));
        title_line.push(Span::styled(
            post.topics
                .iter()
                .map(|topic| format!("[{}]", topic))
                .collect::<Vec<_>>()
                .join(" "),
            Style::default().fg(COLOR_ACCENT),
        ));
    }

    let mut lines = vec![Line::from(title_line)];
    // Line breaks in the content are preserved.
    for row in post.content.split('\n') {
        lines.push(Line::from(Span::styled(
            row.to_string(),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Auteur: {}", post.user_id),
        Style::default()
            .fg(COLOR_TEXT_SECONDARY)
            .add_modifier(Modifier::ITALIC),
    )));
    lines.push(Line::from(String::new()));
    ListItem::new(lines)
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(selected) if selected >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

/// First three topics, the rest are dropped from display.
fn topic_tags(topics: &[String]) -> String {
    topics
        .iter()
        .take(3)
        .map(|topic| format!("[{}]", topic))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Absence of a progress entry renders as an implicit 0%.
fn percent_badge(percent: Option<i64>) -> String {
    format!("{}%", percent.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_tags_truncates_to_three() {
        let topics = vec![
            "formes".to_string(),
            "structure".to_string(),
            "mobilité".to_string(),
            "applications".to_string(),
        ];
        assert_eq!(topic_tags(&topics), "[formes] [structure] [mobilité]");
    }

    #[test]
    fn topic_tags_handles_empty_list() {
        assert_eq!(topic_tags(&[]), "");
    }

    #[test]
    fn percent_badge_defaults_to_zero() {
        assert_eq!(percent_badge(None), "0%");
        assert_eq!(percent_badge(Some(75)), "75%");
    }

    #[test]
    fn percent_badge_shows_out_of_range_values_untouched() {
        assert_eq!(percent_badge(Some(120)), "120%");
    }

    #[test]
    fn tab_cycle_wraps_around() {
        assert_eq!(Tab::Videos.next().title(), "Forum");
        assert_eq!(Tab::Progress.next().title(), "Vidéos");
        assert_eq!(Tab::Videos.prev().title(), "Progression");
    }

    #[test]
    fn clamp_selection_tracks_list_length() {
        let mut state = ListState::default();
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        state.select(Some(5));
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn compose_form_starts_with_default_topics() {
        let form = ComposeForm::new();
        assert_eq!(form.topics, DEFAULT_TOPICS);
        assert!(form.title.is_empty());
    }
}
