use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use instasports_core::{
    booking::{BookingState, SubmitOutcome},
    catalog::CatalogLoader,
    driver::{BookingDriver, BookingEvent},
    models::{format_price, star_rating, Listing, ListingKind},
    storefront::Storefront,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const DATE_INPUT_LEN: usize = 10;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Browse,
    Cart,
    About,
}

#[derive(Debug, Clone)]
struct DatePromptModal {
    input: String,
    cursor: usize,
    min: NaiveDate,
}

impl DatePromptModal {
    fn new(current: Option<NaiveDate>, min: NaiveDate) -> Self {
        let input = current
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        Self {
            cursor: input.len(),
            input,
            min,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= DATE_INPUT_LEN {
            return;
        }
        if ch.is_ascii_digit() || ch == '-' {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    /// `Ok(None)` clears the date.
    fn value(&self) -> Result<Option<NaiveDate>, String> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| format!("'{trimmed}' is not a date (YYYY-MM-DD)"))?;
        if date < self.min {
            return Err(format!("Pick a date on or after {}", self.min.format("%Y-%m-%d")));
        }
        Ok(Some(date))
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal storefront.
pub struct InstasportsApp {
    loader: CatalogLoader,
    store: Storefront,
    driver: BookingDriver,
    booking_rx: Option<mpsc::Receiver<BookingEvent>>,
    currency: String,
    state: UiState,
    screen: Screen,
    date_prompt: Option<DatePromptModal>,
    show_safety: bool,
    theme: Theme,
}

impl InstasportsApp {
    pub fn new(
        loader: CatalogLoader,
        store: Storefront,
        driver: BookingDriver,
        booking_rx: mpsc::Receiver<BookingEvent>,
        currency: String,
    ) -> Self {
        Self {
            loader,
            store,
            driver,
            booking_rx: Some(booking_rx),
            currency,
            state: UiState::default(),
            screen: Screen::Browse,
            date_prompt: None,
            show_safety: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "Loaded {} listings from {}",
            self.store.catalog().len(),
            self.loader.source().describe()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut booking_rx = self.booking_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if let Some(rx) = booking_rx.as_mut() {
                let mut booking_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_booking = rx.recv() => {
                        match maybe_booking {
                            Some(event) => self.handle_booking_event(event),
                            None => booking_closed = true,
                        }
                    }
                }
                if booking_closed {
                    booking_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }
        }

        self.driver.cancel_all();
        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if let Err(err) = self.handle_key(key) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_booking_event(&mut self, event: BookingEvent) {
        self.driver.handle(&mut self.store, event);
        if let BookingEvent::Confirmed(_) = event {
            if self.store.booking().success() {
                self.state.cart_cursor = 0;
                self.state
                    .set_status("Booking confirmed! You'll receive a confirmation email shortly.".to_string());
            }
        }
    }

    fn reload_catalog(&mut self) -> Result<()> {
        let catalog = self.loader.reload()?;
        self.store.replace_catalog(catalog);
        self.state.clamp_listing_cursor(self.store.visible_listings().len());
        info!(revision = self.loader.revision(), "Catalog reloaded");
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.date_prompt.is_some() {
            return self.handle_date_prompt_key(key);
        }
        if self.show_safety {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('s')) {
                self.show_safety = false;
            }
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.handle_global_key(&key)? {
            return Ok(());
        }
        match self.screen {
            Screen::Browse => self.handle_browse_key(key),
            Screen::Cart => self.handle_cart_key(key),
            Screen::About => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('i')) {
                    self.screen = Screen::Browse;
                }
                Ok(())
            }
        }
    }

    fn handle_global_key(&mut self, key: &KeyEvent) -> Result<bool> {
        if key.modifiers == KeyModifiers::CONTROL {
            if let KeyCode::Char('r') = key.code {
                match self.reload_catalog() {
                    Ok(()) => self.state.set_status(format!(
                        "Reloaded {} listings",
                        self.store.catalog().len()
                    )),
                    Err(err) => {
                        error!(?err, "Catalog reload failed");
                        self.state.set_status(format!("Reload failed: {err}"));
                    }
                }
                return Ok(true);
            }
            return Ok(false);
        }
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('s') => self.show_safety = true,
            KeyCode::Char('t') => {
                let today = Local::now().date_naive();
                self.date_prompt = Some(DatePromptModal::new(self.store.selected_date(), today));
            }
            KeyCode::Char('b') => self.complete_booking(),
            KeyCode::Char('i') if self.screen != Screen::About => self.screen = Screen::About,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.store.visible_listings().len();
        match key.code {
            KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_listing_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_listing_cursor(-1, total),
            KeyCode::Char('g') | KeyCode::Home => self.state.listing_cursor = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.state.listing_cursor = total.saturating_sub(1)
            }
            KeyCode::Tab => {
                let tab = self.store.next_tab();
                self.on_tab_changed(tab);
            }
            KeyCode::Char(digit @ '1'..='3') => {
                let idx = digit as usize - '1' as usize;
                let tab = ListingKind::ALL[idx];
                self.store.set_tab(tab);
                self.on_tab_changed(tab);
            }
            KeyCode::Char('l') => {
                let label = self.store.cycle_location().label();
                self.state
                    .clamp_listing_cursor(self.store.visible_listings().len());
                self.state.set_status(format!("Location: {label}"));
            }
            KeyCode::Char('d') => {
                let hours = self.store.cycle_duration().to_string();
                self.state.set_status(format!("Duration: {hours} h"));
            }
            KeyCode::Char('c') => {
                self.screen = Screen::Cart;
                self.state.clamp_cart_cursor(self.store.cart().len());
            }
            KeyCode::Enter | KeyCode::Char('a') => self.add_selected(),
            _ => {}
        }
        Ok(())
    }

    fn handle_cart_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.store.cart().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => self.screen = Screen::Browse,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cart_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cart_cursor(-1, total),
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                let selected = self
                    .store
                    .cart()
                    .entries()
                    .get(self.state.cart_cursor)
                    .map(|line| (line.id().to_string(), line.listing.title.clone()));
                if let Some((id, title)) = selected {
                    self.store.remove_from_cart(&id);
                    self.state.clamp_cart_cursor(self.store.cart().len());
                    self.state.set_status(format!("Removed {title}"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_date_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.date_prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.date_prompt = None;
                self.state.set_status("Date unchanged".to_string());
            }
            KeyCode::Enter => match prompt.value() {
                Ok(date) => {
                    self.store.set_date(date);
                    self.date_prompt = None;
                    let message = match date {
                        Some(date) => format!("Booking for {}", date.format("%d %b %Y")),
                        None => "Date cleared".to_string(),
                    };
                    self.state.set_status(message);
                }
                Err(message) => self.state.set_status(message),
            },
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => prompt.insert(ch),
            _ => {}
        }
        Ok(())
    }

    fn on_tab_changed(&mut self, tab: ListingKind) {
        self.state.listing_cursor = 0;
        self.state.set_status(tab.label().to_string());
    }

    fn add_selected(&mut self) {
        let visible = self.store.visible_listings();
        let Some(listing) = visible.get(self.state.listing_cursor) else {
            self.state.set_status("Nothing to add".to_string());
            return;
        };
        match self.store.add_listing(&listing.id) {
            Ok(line) => {
                let message = format!(
                    "Added {} ({} × {})",
                    line.listing.title,
                    format_price(&self.currency, line.total_price),
                    line.quantity()
                );
                self.state.set_status(message);
            }
            Err(err) => self.state.set_status(format!("Cannot add: {err}")),
        }
    }

    fn complete_booking(&mut self) {
        let message = match self.driver.submit(&mut self.store) {
            SubmitOutcome::Rejected(rejection) => rejection.to_string(),
            SubmitOutcome::Pending(attempt) => format!("Booking {attempt} in progress…"),
            SubmitOutcome::AlreadyPending(attempt) => {
                format!("Booking {attempt} is already in progress")
            }
        };
        self.state.set_status(message);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let alert_height = alert_box_height(self.alert_lines().len());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(alert_height),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        self.render_filters(frame, chunks[1]);
        if alert_height > 0 {
            self.render_alert(frame, chunks[2]);
        }
        match self.screen {
            Screen::Browse => self.draw_browse(frame, chunks[3]),
            Screen::Cart => self.render_cart(frame, chunks[3]),
            Screen::About => self.render_about(frame, chunks[3]),
        }
        self.render_status(frame, chunks[4]);

        if self.show_safety {
            self.render_safety(frame);
        }
        if let Some(prompt) = &self.date_prompt {
            self.render_date_prompt(frame, prompt);
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let titles: Vec<Line> = ListingKind::ALL
            .iter()
            .enumerate()
            .map(|(idx, kind)| Line::from(format!("{} {}", idx + 1, kind.label())))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .select(self.store.tab().index())
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
        self.render_listing_list(frame, body[0]);
        self.render_listing_info(frame, body[1]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let cart = self.store.cart();
        let badge = if cart.is_empty() {
            format!("My Cart ({})", cart.len())
        } else {
            format!("My Cart ({}) [{}]", cart.len(), cart.item_count())
        };
        let line = Line::from(vec![
            Span::styled(
                "Instasports",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "  grounds · equipment · coaches",
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(badge.len() as u16 + 4)])
            .split(area);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
            header[0],
        );
        frame.render_widget(
            Paragraph::new(badge)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            header[1],
        );
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let date = self
            .store
            .selected_date()
            .map(|date| date.format("%d %b %Y").to_string())
            .unwrap_or_else(|| "Select a date".to_string());
        let line = Line::from(vec![
            Span::styled("Location ", Style::default().fg(self.theme.muted)),
            Span::raw(self.store.location().label()),
            Span::styled("   Duration ", Style::default().fg(self.theme.muted)),
            Span::raw(format!("{} h", self.store.duration())),
            Span::styled("   Date ", Style::default().fg(self.theme.muted)),
            Span::raw(date),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Filters"));
        frame.render_widget(paragraph, area);
    }

    fn alert_lines(&self) -> Vec<Line<'static>> {
        let booking = self.store.booking();
        let mut lines = Vec::new();
        if booking.success() {
            lines.push(Line::from(Span::styled(
                "♥ Booking confirmed! You'll receive a confirmation email shortly.",
                Style::default().fg(self.theme.success),
            )));
        }
        if let Some(message) = booking.error_message() {
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(self.theme.danger),
            )));
        }
        if let BookingState::Pending(attempt) = booking.state() {
            lines.push(Line::from(Span::styled(
                format!("Booking {attempt} in progress…"),
                Style::default().fg(self.theme.warning),
            )));
        }
        lines
    }

    fn render_alert(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(self.alert_lines())
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_listing_list(&mut self, frame: &mut Frame, area: Rect) {
        let kind = self.store.tab();
        let listings = self.store.visible_listings();
        self.state.clamp_listing_cursor(listings.len());

        let mut list_state = ListState::default();
        if !listings.is_empty() {
            list_state.select(Some(self.state.listing_cursor));
        }
        let items: Vec<ListItem> = listings
            .iter()
            .map(|listing| {
                let mut spans = vec![Span::styled(
                    listing.title.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )];
                spans.push(Span::styled(
                    format!(
                        " {}{}",
                        format_price(&self.currency, listing.price),
                        kind.price_unit()
                    ),
                    Style::default().fg(self.theme.accent),
                ));
                if kind == ListingKind::Ground && !listing.is_available() {
                    spans.push(Span::styled(
                        " Booked",
                        Style::default().fg(self.theme.danger),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = format!("{} ({})", kind.label(), listings.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_symbol("▶ ")
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_listing_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let kind = self.store.tab();
        let listings = self.store.visible_listings();
        let Some(listing) = listings.get(self.state.listing_cursor) else {
            let paragraph = Paragraph::new("No listings for this location").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let lines = listing_detail_lines(listing, kind, &self.currency, &self.theme);
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_cart(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)])
            .split(area);

        let cart = self.store.cart();
        self.state.clamp_cart_cursor(cart.len());
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Your Booking Cart");
        if cart.is_empty() {
            let paragraph = Paragraph::new(vec![
                Line::from("Your cart is empty"),
                Line::from(Span::styled(
                    "Add grounds, equipment, or coaches to your cart to book them.",
                    Style::default().fg(self.theme.muted),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(paragraph, chunks[0]);
        } else {
            let items: Vec<ListItem> = cart
                .entries()
                .iter()
                .map(|line| {
                    let rate = if line.kind.is_hourly() {
                        format!(
                            "{}/hr × {}h",
                            format_price(&self.currency, line.listing.price),
                            line.duration
                        )
                    } else {
                        format!("{}/session", format_price(&self.currency, line.listing.price))
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            line.listing.title.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!("  {rate}"), Style::default().fg(self.theme.muted)),
                        Span::raw(format!(
                            "  {} × {}",
                            format_price(&self.currency, line.total_price),
                            line.quantity()
                        )),
                    ]))
                })
                .collect();
            let mut list_state = ListState::default();
            list_state.select(Some(self.state.cart_cursor));
            let list = List::new(items)
                .block(block)
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().bg(self.theme.selection_bg));
            frame.render_stateful_widget(list, chunks[0], &mut list_state);
        }

        let date = match self.store.selected_date() {
            Some(date) => format!("Booking for {}", date.format("%d %b %Y")),
            None => "Select a date".to_string(),
        };
        let summary = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Total: {}", format_price(&self.currency, cart.total())),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(date, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("b Complete Booking"));
        frame.render_widget(summary, chunks[1]);
    }

    fn render_about(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let catalog = self.store.catalog();

        let mut founders = Vec::new();
        for founder in &catalog.founders {
            founders.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", founder.initials()),
                    Style::default().fg(self.theme.accent),
                ),
                Span::styled(
                    founder.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            founders.push(Line::from(Span::styled(
                founder.role.clone(),
                Style::default().fg(self.theme.muted),
            )));
            founders.push(Line::from(founder.bio.clone()));
            founders.push(Line::from(""));
        }
        frame.render_widget(
            Paragraph::new(founders)
                .block(Block::default().borders(Borders::ALL).title("Meet Our Founders"))
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let mut testimonials = Vec::new();
        for testimonial in &catalog.testimonials {
            testimonials.push(Line::from(vec![
                Span::styled(
                    testimonial.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" · {}", testimonial.role),
                    Style::default().fg(self.theme.muted),
                ),
            ]));
            testimonials.push(Line::from(Span::styled(
                star_rating(testimonial.rating),
                Style::default().fg(self.theme.warning),
            )));
            testimonials.push(Line::from(format!("\"{}\"", testimonial.review)));
            testimonials.push(Line::from(""));
        }
        frame.render_widget(
            Paragraph::new(testimonials)
                .block(Block::default().borders(Borders::ALL).title("What Our Users Say"))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let help = match self.screen {
            Screen::Browse => "1-3/Tab tabs  l location  d duration  Enter add  c cart  t date  b book  i about  s safety  q quit",
            Screen::Cart => "j/k move  x remove  t date  b book  Esc back  q quit",
            Screen::About => "Esc back  q quit",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(paragraph, area);
    }

    fn render_safety(&self, frame: &mut Frame) {
        let safety = &self.store.catalog().safety;
        let height = (safety.contacts.len() + safety.tips.len() + 7) as u16;
        let area = centered_rect(56, height, frame.size());
        frame.render_widget(Clear, area);

        let mut lines = vec![Line::from(safety.summary.clone()), Line::from("")];
        lines.push(Line::from(Span::styled(
            "Emergency Contacts:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for contact in &safety.contacts {
            lines.push(Line::from(vec![
                Span::raw(format!("{:<12}", contact.label)),
                Span::styled(
                    contact.number.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        lines.push(Line::from(""));
        for tip in &safety.tips {
            lines.push(Line::from(Span::styled(
                format!("• {tip}"),
                Style::default().fg(self.theme.muted),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Safety First (Enter to close)"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_date_prompt(&self, frame: &mut Frame, prompt: &DatePromptModal) {
        let area = centered_rect(44, 6, frame.size());
        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" set  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel  (empty clears)"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from("Booking date (YYYY-MM-DD)"),
            input_line,
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title("Booking Date"));
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }
}

fn listing_detail_lines(
    listing: &Listing,
    kind: ListingKind,
    currency: &str,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut title = vec![Span::styled(
        listing.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if listing.is_safety_certified() {
        title.push(Span::styled(
            "  ✔ safety certified",
            Style::default().fg(theme.success),
        ));
    }
    let mut lines = vec![
        Line::from(title),
        Line::from(Span::styled(
            listing.description_or_default().to_string(),
            Style::default().fg(theme.muted),
        )),
        Line::from(""),
        Line::from(listing.details.clone()),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}{}", format_price(currency, listing.price), kind.price_unit()),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if kind == ListingKind::Coach {
        if let Some(rating) = listing.rating {
            lines.push(Line::from(Span::styled(
                star_rating(rating),
                Style::default().fg(theme.warning),
            )));
        }
    }
    if let Some(slots) = listing.availability.as_ref().filter(|slots| !slots.is_empty()) {
        lines.push(Line::from(format!("Slots: {}", slots.join(", "))));
    }
    if kind == ListingKind::Ground {
        let (label, color) = if listing.is_available() {
            ("Available", theme.success)
        } else {
            ("Booked", theme.danger)
        };
        lines.push(Line::from(Span::styled(label, Style::default().fg(color))));
    }
    lines.push(Line::from(""));
    let action = if listing.is_bookable(kind) {
        Span::styled(
            format!("Enter · {}", kind.action_label()),
            Style::default().add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("Not bookable", Style::default().fg(theme.muted))
    };
    lines.push(Line::from(action));
    lines
}

/// Bordered box tall enough for every alert line; hidden when there are none.
fn alert_box_height(lines: usize) -> u16 {
    if lines == 0 {
        0
    } else {
        lines as u16 + 2
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    listing_cursor: usize,
    cart_cursor: usize,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            listing_cursor: 0,
            cart_cursor: 0,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_listing_cursor(&mut self, delta: isize, total: usize) {
        self.listing_cursor = step_cursor(self.listing_cursor, delta, total);
    }

    fn move_cart_cursor(&mut self, delta: isize, total: usize) {
        self.cart_cursor = step_cursor(self.cart_cursor, delta, total);
    }

    fn clamp_listing_cursor(&mut self, total: usize) {
        self.listing_cursor = self.listing_cursor.min(total.saturating_sub(1));
    }

    fn clamp_cart_cursor(&mut self, total: usize) {
        self.cart_cursor = self.cart_cursor.min(total.saturating_sub(1));
    }
}

fn step_cursor(cursor: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, total as isize - 1) as usize
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    #[test]
    fn date_prompt_accepts_iso_dates_only() {
        let mut prompt = DatePromptModal::new(None, today());
        for ch in "2026-1x1-05".chars() {
            prompt.insert(ch);
        }
        assert_eq!(prompt.input, "2026-11-05");
        assert_eq!(prompt.value(), Ok(NaiveDate::from_ymd_opt(2026, 11, 5)));

        prompt.backspace();
        prompt.insert('7');
        assert_eq!(prompt.value(), Ok(NaiveDate::from_ymd_opt(2026, 11, 7)));
    }

    #[test]
    fn date_prompt_rejects_past_and_malformed_dates() {
        let prompt = DatePromptModal::new(NaiveDate::from_ymd_opt(2026, 10, 18), today());
        assert!(prompt.value().is_err());

        let mut prompt = DatePromptModal::new(None, today());
        prompt.insert('2');
        assert!(prompt.value().is_err());
    }

    #[test]
    fn empty_date_prompt_clears_selection() {
        let mut prompt = DatePromptModal::new(NaiveDate::from_ymd_opt(2026, 12, 1), today());
        assert_eq!(prompt.cursor, 10);
        prompt.move_cursor(-20);
        assert_eq!(prompt.cursor, 0);
        for _ in 0..10 {
            prompt.delete();
        }
        assert_eq!(prompt.value(), Ok(None));
    }

    #[test]
    fn alert_box_fits_every_line() {
        assert_eq!(alert_box_height(0), 0);
        assert_eq!(alert_box_height(1), 3);
        assert_eq!(alert_box_height(3), 5);
    }

    #[test]
    fn cursor_steps_stay_in_bounds() {
        assert_eq!(step_cursor(0, -1, 3), 0);
        assert_eq!(step_cursor(2, 1, 3), 2);
        assert_eq!(step_cursor(1, 1, 3), 2);
        assert_eq!(step_cursor(5, 1, 0), 0);

        let mut state = UiState::default();
        state.listing_cursor = 4;
        state.clamp_listing_cursor(2);
        assert_eq!(state.listing_cursor, 1);
    }
}
