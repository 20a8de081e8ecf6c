use std::fmt;
use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::cursor::{
    MoveToColumn, RestorePosition, SavePosition, SetCursorStyle, Show,
};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, List, ListDirection, ListItem, ListState, Paragraph, Wrap,
};
use vtcode_core::utils::tty::TtyExt;

const CONTROLS_HINT: &str =
    "↑/↓ j/k to move  •  Home/End to jump  •  Enter/Tab confirm  •  Esc cancel";
const NUMBER_JUMP_HINT: &str = "Tip: Type number to jump";

/// Ratatui style definitions for interactive list UI
mod styles {
    use ratatui::style::{Color, Modifier, Style};

    /// Item number in bright cyan bold
    pub const ITEM_NUMBER: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    /// Description text in light gray for better contrast
    pub const DESCRIPTION: Style = Style::new().fg(Color::DarkGray);

    /// Default list text in white
    pub const DEFAULT_TEXT: Style = Style::new().fg(Color::White);

    /// Highlighted selection in green bold reversed
    pub const HIGHLIGHT: Style = Style::new()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD.union(Modifier::REVERSED));
}

#[derive(Debug, Clone)]
pub struct SelectionEntry {
    pub title: String,
    pub description: Option<String>,
}

impl SelectionEntry {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }
}

#[derive(Debug)]
pub struct SelectionInterrupted;

impl fmt::Display for SelectionInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("selection interrupted by Ctrl+C")
    }
}

impl std::error::Error for SelectionInterrupted {}

pub fn run_interactive_selection(
    title: &str,
    instructions: &str,
    entries: &[SelectionEntry],
    default_index: usize,
) -> Result<Option<usize>> {
    if entries.is_empty() {
        return Err(anyhow!("No options available for selection"));
    }

    if !io::stderr().is_tty_ext() {
        return Err(anyhow!("Terminal UI is unavailable"));
    }

    let mut stderr = io::stderr();
    let mut terminal_guard = TerminalModeGuard::new(title);
    terminal_guard.save_cursor_position(&mut stderr);
    terminal_guard.enable_raw_mode()?;
    terminal_guard.enter_alternate_screen(&mut stderr)?;

    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)
        .with_context(|| format!("Failed to initialize Ratatui terminal for {title} selector"))?;
    terminal_guard.hide_cursor(&mut terminal)?;

    let selection_result = (|| -> Result<Option<usize>> {
        let total = entries.len();
        let mut selected_index = default_index.min(total.saturating_sub(1));
        let mut number_buffer = String::new();
        let mut list_state = ListState::default();
        list_state.select(Some(selected_index));

        loop {
            list_state.select(Some(selected_index));
            terminal
                .draw(|frame| {
                    let area = frame.area();
                    let instruction_lines = instructions.lines().count().max(1) as u16;
                    let instruction_height = instruction_lines.saturating_add(2);
                    let footer_height: u16 = 4;
                    let layout = Layout::vertical([
                        Constraint::Length(
                            instruction_height.min(area.height.saturating_sub(footer_height + 5)),
                        ),
                        Constraint::Min(5),
                        Constraint::Length(footer_height),
                    ])
                    .spacing(-1)
                    .margin(1)
                    .vertical_margin(1)
                    .split(area);

                    // Ensure layout has at least 3 sections
                    if layout.len() < 3 {
                        return;
                    }

                    let instructions_widget = Paragraph::new(instructions)
                        .block(
                            Block::bordered()
                                .title("Instructions")
                                .border_type(BorderType::Rounded),
                        )
                        .wrap(Wrap { trim: true });
                    frame.render_widget(instructions_widget, layout[0]);

                    let items: Vec<ListItem> = entries
                        .iter()
                        .enumerate()
                        .map(|(idx, entry)| {
                            let mut lines = vec![Line::from(vec![
                                Span::styled(format!("{:2}. ", idx + 1), styles::ITEM_NUMBER),
                                Span::raw(entry.title.as_str()),
                            ])];
                            if let Some(description) = entry.description.as_ref()
                                && !description.is_empty()
                                && description != &entry.title
                            {
                                lines.push(Line::from(Span::styled(
                                    format!("    {}", description),
                                    styles::DESCRIPTION,
                                )));
                            }
                            ListItem::new(lines)
                        })
                        .collect();

                    let list = List::new(items)
                        .block(
                            Block::bordered()
                                .title(title)
                                .border_type(BorderType::Rounded),
                        )
                        .style(styles::DEFAULT_TEXT)
                        .highlight_style(styles::HIGHLIGHT)
                        .highlight_symbol("> ")
                        .repeat_highlight_symbol(true)
                        .direction(ListDirection::TopToBottom)
                        .scroll_padding(1);

                    frame.render_stateful_widget(list, layout[1], &mut list_state);

                    let current = match entries.get(selected_index) {
                        Some(entry) => entry,
                        None => {
                            tracing::warn!("Selected index {selected_index} out of bounds");
                            return;
                        }
                    };
                    let mut summary_lines = vec![];

                    summary_lines.push(Line::from(Span::styled(
                        current.title.as_str(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )));

                    if let Some(description) = current.description.as_ref()
                        && !description.is_empty()
                        && description != &current.title
                    {
                        summary_lines.push(Line::from(Span::styled(
                            format!("  {}", description),
                            styles::DESCRIPTION,
                        )));
                    }

                    summary_lines.push(Line::from("")); // Blank line
                    summary_lines.push(Line::from(CONTROLS_HINT));
                    summary_lines.push(Line::from(Span::styled(
                        NUMBER_JUMP_HINT,
                        styles::DESCRIPTION,
                    )));

                    let footer = Paragraph::new(summary_lines)
                        .block(
                            Block::bordered()
                                .title("Selection")
                                .border_type(BorderType::Rounded),
                        )
                        .wrap(Wrap { trim: true });
                    frame.render_widget(footer, layout[2]);
                })
                .with_context(|| format!("Failed to draw {title} selector UI"))?;

            match event::read()
                .with_context(|| format!("Failed to read terminal input for {title} selector"))?
            {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        if selected_index == 0 {
                            selected_index = total - 1;
                        } else {
                            selected_index -= 1;
                        }
                        number_buffer.clear();
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        selected_index = (selected_index + 1) % total;
                        number_buffer.clear();
                    }
                    KeyCode::Home => {
                        selected_index = 0;
                        number_buffer.clear();
                    }
                    KeyCode::End => {
                        selected_index = total - 1;
                        number_buffer.clear();
                    }
                    KeyCode::PageUp => {
                        let step = 5.min(total - 1);
                        if selected_index < step {
                            selected_index = 0;
                        } else {
                            selected_index -= step;
                        }
                        number_buffer.clear();
                    }
                    KeyCode::PageDown => {
                        let step = 5.min(total - 1);
                        selected_index = (selected_index + step).min(total - 1);
                        number_buffer.clear();
                    }
                    KeyCode::Enter | KeyCode::Tab => return Ok(Some(selected_index)),
                    KeyCode::Esc => return Ok(None),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Err(SelectionInterrupted.into());
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() => {
                        number_buffer.push(c);
                        if let Ok(index) = number_buffer.parse::<usize>()
                            && (1..=total).contains(&index)
                        {
                            selected_index = index - 1;
                        }
                        if number_buffer.len() >= total.to_string().len() {
                            number_buffer.clear();
                        }
                    }
                    KeyCode::Backspace => {
                        number_buffer.pop();
                    }
                    _ => {}
                },
                Event::Resize(_, _) => {
                    number_buffer.clear();
                }
                _ => {}
            }
        }
    })();

    let cleanup_result = terminal_guard.restore_with_terminal(&mut terminal);
    cleanup_result?;
    selection_result
}

struct TerminalModeGuard {
    label: String,
    raw_mode_enabled: bool,
    alternate_screen: bool,
    cursor_hidden: bool,
    cursor_position_saved: bool,
}

impl TerminalModeGuard {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            raw_mode_enabled: false,
            alternate_screen: false,
            cursor_hidden: false,
            cursor_position_saved: false,
        }
    }

    fn save_cursor_position(&mut self, stderr: &mut io::Stderr) {
        match execute!(stderr, SavePosition) {
            Ok(_) => {
                self.cursor_position_saved = true;
            }
            Err(error) => {
                tracing::debug!(%error, selector = %self.label, "failed to save cursor position");
            }
        }
    }

    fn enable_raw_mode(&mut self) -> Result<()> {
        enable_raw_mode()
            .with_context(|| format!("Failed to enable raw mode for {} selector", self.label))?;
        self.raw_mode_enabled = true;
        Ok(())
    }

    fn enter_alternate_screen(&mut self, stderr: &mut io::Stderr) -> Result<()> {
        execute!(stderr, EnterAlternateScreen).with_context(|| {
            format!(
                "Failed to enter alternate screen for {} selector",
                self.label
            )
        })?;
        self.alternate_screen = true;
        Ok(())
    }

    fn hide_cursor(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stderr>>) -> Result<()> {
        terminal
            .hide_cursor()
            .with_context(|| format!("Failed to hide cursor for {} selector", self.label))?;
        self.cursor_hidden = true;
        Ok(())
    }

    fn restore_with_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    ) -> Result<()> {
        // Drain any pending crossterm events BEFORE leaving alternate screen and disabling raw mode
        while let Ok(true) = event::poll(std::time::Duration::from_millis(0)) {
            let _ = event::read();
        }

        // Clear current line to remove artifacts like ^C from rapid presses
        let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));

        // Proper order: Leave alternate screen FIRST, then disable raw mode LAST
        if self.alternate_screen {
            execute!(terminal.backend_mut(), LeaveAlternateScreen).with_context(|| {
                format!(
                    "Failed to leave alternate screen after {} selector",
                    self.label
                )
            })?;
            self.alternate_screen = false;
        }

        if self.raw_mode_enabled {
            disable_raw_mode().with_context(|| {
                format!("Failed to disable raw mode after {} selector", self.label)
            })?;
            self.raw_mode_enabled = false;
        }

        if self.cursor_hidden {
            terminal
                .show_cursor()
                .with_context(|| format!("Failed to show cursor after {} selector", self.label))?;
            self.cursor_hidden = false;
        }

        let _ = execute!(terminal.backend_mut(), SetCursorStyle::DefaultUserShape);
        if self.cursor_position_saved {
            let _ = execute!(terminal.backend_mut(), RestorePosition);
            self.cursor_position_saved = false;
        }

        // Flush output to ensure all terminal commands are processed
        terminal.backend_mut().flush().ok();
        io::stderr().flush().ok();

        Ok(())
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        // Best-effort cleanup in Drop
        while let Ok(true) = event::poll(std::time::Duration::from_millis(0)) {
            let _ = event::read();
        }

        let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));

        if self.alternate_screen {
            let mut stderr = io::stderr();
            let _ = execute!(stderr, LeaveAlternateScreen);
            self.alternate_screen = false;
        }

        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
            self.raw_mode_enabled = false;
        }

        if self.cursor_hidden {
            let mut stderr = io::stderr();
            let _ = execute!(stderr, SetCursorStyle::DefaultUserShape, Show);
            let _ = stderr.flush();
            self.cursor_hidden = false;
        }

        if self.cursor_position_saved {
            let mut stderr = io::stderr();
            let _ = execute!(stderr, RestorePosition);
            let _ = stderr.flush();
            self.cursor_position_saved = false;
        }

        // Ensure stderr is flushed to prevent escape codes from appearing
        let _ = io::stderr().flush();
    }
}
