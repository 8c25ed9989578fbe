//! TUI rendering for Anvil using ratatui.

mod input;
mod shared;
mod theme;

pub use input::{InputPump, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use anvil_engine::chat::ChatSession;
use anvil_engine::form::FieldEditor;
use anvil_engine::gallery::{GalleryRow, ModelGallery};
use anvil_engine::tools::{ToolFocus, ToolGallery};
use anvil_engine::verifier::TestVerdict;
use anvil_engine::wizard::{
    ConfigField, ConfigState, EngineChoiceState, ReportPhase, SystemCheckState, WizardStep,
};
use anvil_engine::{App, AppPhase, ChatRole, EngineKind};

use self::shared::{centered_rect, field_view, hint_spans, kv_line};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    match app.phase() {
        AppPhase::Wizard(wizard) => match wizard.step() {
            WizardStep::Welcome => draw_welcome(frame, app, &palette, &glyphs),
            WizardStep::SystemCheck(state) => {
                draw_system_check(frame, app, state, &palette, &glyphs);
            }
            WizardStep::EngineChoice(state) => {
                draw_engine_choice(frame, app, state, &palette, &glyphs);
            }
            WizardStep::ModelGallery(gallery) => {
                draw_model_gallery(frame, app, gallery, &palette, &glyphs);
            }
            WizardStep::ToolGallery(gallery) => {
                draw_tool_gallery(frame, app, gallery, &palette, &glyphs);
            }
            WizardStep::Config(state) => draw_config_form(frame, app, state, &palette, &glyphs),
            WizardStep::Configured(_) => draw_configured(frame, app, &palette, &glyphs),
        },
        AppPhase::Chat(chat) => draw_chat(frame, app, chat, &palette, &glyphs),
    }
}

// ============================================================================
// Shared chrome
// ============================================================================

/// Content area, hint row, and status bar for the wizard screens.
fn wizard_layout(frame: &Frame) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Key hints
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());
    (chunks[0], chunks[1], chunks[2])
}

fn panel(title: &str, palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(Line::from(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::BOLD),
        )))
        .padding(Padding::horizontal(1))
}

fn draw_hints(frame: &mut Frame, area: Rect, pairs: &[(&str, &str)], palette: &Palette) {
    let mut spans = vec![Span::raw(" ")];
    spans.extend(hint_spans(pairs, palette));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let (status_text, status_style) = if app.is_busy() {
        let spinner = spinner_frame(app.tick_count(), app.ui_options());
        (
            format!("{spinner} Contacting the daemon..."),
            Style::default().fg(palette.primary),
        )
    } else if let Some(config) = app.active_config() {
        (
            format!(
                "{} {} │ {}",
                glyphs.status_running, config.model, config.base_url
            ),
            Style::default().fg(palette.success),
        )
    } else {
        (
            format!("{} Daemon: {}", glyphs.bullet, app.daemon_url()),
            Style::default().fg(palette.text_muted),
        )
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status_text, status_style),
    ]));
    frame.render_widget(status, area);
}

/// A bordered single-line field. The terminal cursor lands in the focused
/// one.
fn draw_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    editor: &FieldEditor,
    focused: bool,
    palette: &Palette,
) {
    let border = if focused {
        Style::default().fg(palette.primary)
    } else {
        Style::default().fg(palette.bg_border)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(Line::from(Span::styled(
            format!(" {label} "),
            Style::default().fg(palette.text_secondary),
        )));

    let content_width = area.width.saturating_sub(3).max(1) as usize;
    let view = field_view(editor, content_width);
    let field = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(view.text, Style::default().fg(palette.text_primary)),
    ]))
    .block(block);
    frame.render_widget(field, area);

    if focused {
        frame.set_cursor_position((
            area.x.saturating_add(2).saturating_add(view.cursor_col),
            area.y.saturating_add(1),
        ));
    }
}

/// One-line step status. Daemon refusals arrive prefixed with "Error:".
fn status_line<'a>(message: &'a str, palette: &Palette) -> Line<'a> {
    let style = if message.starts_with("Error:") {
        Style::default().fg(palette.error)
    } else {
        Style::default().fg(palette.text_secondary)
    };
    Line::from(Span::styled(message, style))
}

fn spinner_line(text: &str, app: &App, palette: &Palette) -> Line<'static> {
    let spinner = spinner_frame(app.tick_count(), app.ui_options());
    Line::from(vec![
        Span::raw("  "),
        Span::styled(spinner, Style::default().fg(palette.primary)),
        Span::styled(format!(" {text}"), Style::default().fg(palette.text_muted)),
    ])
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}

// ============================================================================
// Welcome
// ============================================================================

fn draw_welcome(frame: &mut Frame, app: &App, palette: &Palette, glyphs: &Glyphs) {
    let (content, hints, status_area) = wizard_layout(frame);

    let dim = Style::default().fg(palette.primary_dim);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  ╭──────────────────────────────────────╮",
            dim,
        )),
        Line::from(vec![
            Span::styled("  │", dim),
            Span::styled(
                "                 Anvil                ",
                Style::default()
                    .fg(palette.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("│", dim),
        ]),
        Line::from(vec![
            Span::styled("  │", dim),
            Span::styled(
                "       Set up your model daemon       ",
                Style::default().fg(palette.text_secondary),
            ),
            Span::styled("│", dim),
        ]),
        Line::from(Span::styled(
            "  ╰──────────────────────────────────────╯",
            dim,
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "  The setup walks through:",
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("    {} A quick look at this machine", glyphs.bullet),
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(Span::styled(
            format!(
                "    {} Picking a local model or a cloud endpoint",
                glyphs.bullet
            ),
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(Span::styled(
            format!(
                "    {} Testing the connection before it is saved",
                glyphs.bullet
            ),
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            format!("  Daemon: {}", app.daemon_url()),
            Style::default().fg(palette.text_muted),
        )),
    ];

    let welcome = Paragraph::new(lines).block(panel("Welcome", palette));
    frame.render_widget(welcome, content);

    draw_hints(frame, hints, &[("Enter", "begin"), ("Esc", "quit")], palette);
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

// ============================================================================
// System check
// ============================================================================

fn draw_system_check(
    frame: &mut Frame,
    app: &App,
    state: &SystemCheckState,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (content, hints, status_area) = wizard_layout(frame);

    let mut lines: Vec<Line> = vec![Line::from("")];
    match state.phase() {
        ReportPhase::Loading => {
            lines.push(spinner_line("Inspecting your system...", app, palette));
        }
        ReportPhase::Ready(report) => {
            let profile = &report.profile;
            let os = if profile.os_version.is_empty() {
                profile.os_name.clone()
            } else {
                format!("{} {}", profile.os_name, profile.os_version)
            };
            let cpu = if profile.cpu_brand.is_empty() {
                format!("{} cores", profile.cpu_cores)
            } else {
                format!("{} ({} cores)", profile.cpu_brand, profile.cpu_cores)
            };
            let memory = if profile.used_memory_gb == 0 {
                format!("{} GB", profile.total_memory_gb)
            } else {
                format!(
                    "{} of {} GB in use",
                    profile.used_memory_gb, profile.total_memory_gb
                )
            };
            lines.push(kv_line("OS", os, palette));
            lines.push(kv_line(
                "Architecture",
                profile.architecture.clone(),
                palette,
            ));
            lines.push(kv_line("CPU", cpu, palette));
            lines.push(kv_line("Memory", memory, palette));

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Recommendation",
                Style::default()
                    .fg(palette.text_primary)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            let recommendation = &report.recommendation;
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    glyphs.ok,
                    Style::default()
                        .fg(palette.success)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {}", recommendation.recommended_engine.display_name()),
                    Style::default()
                        .fg(palette.success)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            for reason_line in recommendation.reason.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {reason_line}"),
                    Style::default().fg(palette.text_secondary),
                )));
            }
            if let Some(model) = &recommendation.recommended_model {
                lines.push(Line::from(Span::styled(
                    format!("  Suggested model: {model}"),
                    Style::default().fg(palette.text_muted),
                )));
            }
        }
        ReportPhase::Failed(message) => {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    glyphs.err,
                    Style::default()
                        .fg(palette.error)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {message}"), Style::default().fg(palette.error)),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  The wizard needs the daemon for this step.",
                Style::default().fg(palette.text_muted),
            )));
        }
    }

    let check = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel("System Check", palette));
    frame.render_widget(check, content);

    let pairs: &[(&str, &str)] = match state.phase() {
        ReportPhase::Loading => &[("Esc", "back")],
        ReportPhase::Ready(_) => &[("Enter", "continue"), ("Esc", "back")],
        ReportPhase::Failed(_) => &[("r", "retry"), ("Esc", "back")],
    };
    draw_hints(frame, hints, pairs, palette);
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

// ============================================================================
// Engine choice
// ============================================================================

fn draw_engine_choice(
    frame: &mut Frame,
    app: &App,
    state: &EngineChoiceState,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (content, hints, status_area) = wizard_layout(frame);

    let choices = [
        (EngineKind::Local, "Run models on this machine"),
        (EngineKind::Cloud, "Connect to an OpenAI-compatible API"),
    ];

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (kind, blurb) in choices {
        let selected = state.cursor() == kind;
        let marker = if selected { glyphs.selected } else { " " };
        let name_style = if selected {
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text_primary)
        };
        let mut row = vec![
            Span::styled(format!("  {marker} "), name_style),
            Span::styled(kind.display_name(), name_style),
        ];
        if state
            .recommendation()
            .is_some_and(|rec| rec.recommended_engine == kind)
        {
            row.push(Span::styled(
                "  recommended",
                Style::default().fg(palette.success),
            ));
        }
        lines.push(Line::from(row));
        lines.push(Line::from(Span::styled(
            format!("      {blurb}"),
            Style::default().fg(palette.text_muted),
        )));
        lines.push(Line::from(""));
    }

    let choice = Paragraph::new(lines).block(panel("Choose an Engine", palette));
    frame.render_widget(choice, content);

    let arrows = format!("{}{}", glyphs.arrow_up, glyphs.arrow_down);
    draw_hints(
        frame,
        hints,
        &[
            (arrows.as_str(), "choose"),
            ("Enter", "continue"),
            ("t", "tool servers"),
            ("Esc", "back"),
        ],
        palette,
    );
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

// ============================================================================
// Model gallery
// ============================================================================

fn draw_model_gallery(
    frame: &mut Frame,
    app: &App,
    gallery: &ModelGallery,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (content, hints, status_area) = wizard_layout(frame);

    let block = panel("Model Gallery", palette);
    let content_width = block.inner(content).width.max(1) as usize;

    let rows = gallery.rows();
    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = gallery.load_error() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", glyphs.err),
                Style::default()
                    .fg(palette.error)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(error, Style::default().fg(palette.error)),
        ]));
        lines.push(Line::from(""));
    } else if gallery.is_loading() && rows.is_empty() {
        lines.push(Line::from(""));
        lines.push(spinner_line("Loading models...", app, palette));
    } else if rows.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  No models to show. The daemon's catalog is empty.",
            Style::default().fg(palette.text_muted),
        )));
    }

    let section_style = Style::default()
        .fg(palette.text_secondary)
        .add_modifier(Modifier::BOLD);
    let mut in_installed = false;
    let mut any_section = false;
    for (i, row) in rows.iter().enumerate() {
        let selected = i == gallery.cursor();
        match row {
            GalleryRow::Installed(model) => {
                if !in_installed {
                    lines.push(Line::from(Span::styled("Installed", section_style)));
                    in_installed = true;
                    any_section = true;
                }
                let pending = gallery.pending_model() == Some(model.model_id.as_str());
                let dot = if pending {
                    Span::styled(
                        spinner_frame(app.tick_count(), app.ui_options()),
                        Style::default().fg(palette.primary),
                    )
                } else if model.is_running {
                    Span::styled(glyphs.status_running, Style::default().fg(palette.success))
                } else {
                    Span::styled(
                        glyphs.status_stopped,
                        Style::default().fg(palette.text_muted),
                    )
                };
                let badge = gallery
                    .is_recommended(&model.model_id)
                    .then_some("recommended");
                lines.push(gallery_row(
                    selected,
                    dot,
                    &model.model_id,
                    badge,
                    &format!("port {}", model.port),
                    content_width,
                    palette,
                    glyphs,
                ));
            }
            GalleryRow::Available(model) => {
                if in_installed || !any_section {
                    if in_installed {
                        lines.push(Line::from(""));
                    }
                    lines.push(Line::from(Span::styled("Available", section_style)));
                    in_installed = false;
                    any_section = true;
                }
                let pending = gallery.pending_model() == Some(model.id.as_str());
                let dot = if pending {
                    Span::styled(
                        spinner_frame(app.tick_count(), app.ui_options()),
                        Style::default().fg(palette.primary),
                    )
                } else {
                    Span::styled(glyphs.bullet, Style::default().fg(palette.text_muted))
                };
                let badge = gallery.is_recommended(&model.id).then_some("recommended");
                lines.push(gallery_row(
                    selected,
                    dot,
                    &model.name,
                    badge,
                    &format!("{:.1} GB", model.size_gb),
                    content_width,
                    palette,
                    glyphs,
                ));
            }
        }
    }

    if let Some(GalleryRow::Available(model)) = gallery.selected() {
        lines.push(Line::from(""));
        if !model.description.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  {}", model.description),
                Style::default().fg(palette.text_secondary),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("  Needs {} GB RAM", model.recommended_ram_gb),
            Style::default().fg(palette.text_muted),
        )));
    }

    if let Some(message) = gallery.status() {
        lines.push(Line::from(""));
        lines.push(status_line(message, palette));
    }

    let list = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(list, content);

    let arrows = format!("{}{}", glyphs.arrow_up, glyphs.arrow_down);
    draw_hints(
        frame,
        hints,
        &[
            (arrows.as_str(), "move"),
            ("Enter", "use/install"),
            ("x", "uninstall"),
            ("r", "refresh"),
            ("Esc", "back"),
        ],
        palette,
    );
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

/// A gallery row: marker, state glyph, name, optional badge, and a muted
/// detail column. The selected row gets the highlight background across the
/// full width.
fn gallery_row<'a>(
    selected: bool,
    state_glyph: Span<'a>,
    name: &'a str,
    badge: Option<&str>,
    detail: &str,
    content_width: usize,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Line<'a> {
    let marker = if selected { glyphs.selected } else { " " };
    let name_style = if selected {
        Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text_primary)
    };

    let left = format!(" {marker} ");
    let badge = badge.map(|text| format!("  {text}"));
    let detail = format!("  {detail}");
    let badge_width = badge.as_deref().map_or(0, UnicodeWidthStr::width);
    let used = left.width() + state_glyph.width() + 1 + name.width() + badge_width + detail.width();
    let filler = content_width.saturating_sub(used);

    let mut spans = vec![
        Span::styled(left, name_style),
        state_glyph,
        Span::raw(" "),
        Span::styled(name, name_style),
    ];
    if let Some(badge) = badge {
        spans.push(Span::styled(badge, Style::default().fg(palette.success)));
    }
    spans.push(Span::styled(detail, Style::default().fg(palette.text_muted)));
    spans.push(Span::raw(" ".repeat(filler)));
    if selected {
        for span in &mut spans {
            span.style = span.style.bg(palette.bg_highlight);
        }
    }
    Line::from(spans)
}

// ============================================================================
// Tool gallery
// ============================================================================

fn draw_tool_gallery(
    frame: &mut Frame,
    app: &App,
    gallery: &ToolGallery,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (content, hints, status_area) = wizard_layout(frame);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),     // Server list and tools pane
            Constraint::Length(11), // Registration form and status
        ])
        .split(content);
    let browse = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    draw_server_list(frame, app, gallery, browse[0], palette, glyphs);
    draw_tools_pane(frame, app, gallery, browse[1], palette, glyphs);
    draw_registration_form(frame, gallery, rows[1], palette);

    let arrows = format!("{}{}", glyphs.arrow_up, glyphs.arrow_down);
    draw_hints(
        frame,
        hints,
        &[
            ("Tab", "field"),
            (arrows.as_str(), "move"),
            ("Enter", "inspect/connect"),
            ("c", "continue"),
            ("r", "refresh"),
            ("Esc", "back"),
        ],
        palette,
    );
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

fn draw_server_list(
    frame: &mut Frame,
    app: &App,
    gallery: &ToolGallery,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let focused = gallery.focus() == ToolFocus::Servers;
    let mut block = panel("Servers", palette);
    if focused {
        block = block.border_style(Style::default().fg(palette.primary));
    }

    let mut lines: Vec<Line> = Vec::new();
    if let Some(error) = gallery.servers_error() {
        lines.push(Line::from(Span::styled(
            error,
            Style::default().fg(palette.error),
        )));
    } else if gallery.servers_loading() && gallery.servers().is_empty() {
        lines.push(spinner_line("Loading servers...", app, palette));
    } else if gallery.servers().is_empty() {
        lines.push(Line::from(Span::styled(
            "No servers registered yet.",
            Style::default().fg(palette.text_muted),
        )));
    }

    for (i, server_id) in gallery.servers().iter().enumerate() {
        let selected = i == gallery.cursor();
        let marker = if selected && focused {
            glyphs.selected
        } else {
            " "
        };
        let inspected = gallery.inspected() == Some(server_id.as_str());
        let style = if inspected {
            Style::default().fg(palette.accent)
        } else if selected && focused {
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text_primary)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {marker} "), style),
            Span::styled(server_id.as_str(), style),
        ]));
    }

    let list = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(list, area);
}

fn draw_tools_pane(
    frame: &mut Frame,
    app: &App,
    gallery: &ToolGallery,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mut lines: Vec<Line> = Vec::new();
    if gallery.tools_loading() {
        lines.push(spinner_line("Loading tools...", app, palette));
    } else if let Some(error) = gallery.tools_error() {
        lines.push(Line::from(Span::styled(
            error,
            Style::default().fg(palette.error),
        )));
    } else if let Some(server_id) = gallery.inspected() {
        lines.push(Line::from(Span::styled(
            server_id.to_string(),
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        if gallery.tools().is_empty() {
            lines.push(Line::from(Span::styled(
                "The server reported no tools.",
                Style::default().fg(palette.text_muted),
            )));
        }
        for tool in gallery.tools() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", glyphs.tool),
                    Style::default().fg(palette.accent),
                ),
                Span::styled(tool.name.clone(), Style::default().fg(palette.text_primary)),
            ]));
            if let Some(description) = &tool.description {
                lines.push(Line::from(Span::styled(
                    format!("    {description}"),
                    Style::default().fg(palette.text_muted),
                )));
            }
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Select a server and press Enter to list its tools.",
            Style::default().fg(palette.text_muted),
        )));
    }

    let pane = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel("Tools", palette));
    frame.render_widget(pane, area);
}

fn draw_registration_form(frame: &mut Frame, gallery: &ToolGallery, area: Rect, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Heading
            Constraint::Length(3), // Id
            Constraint::Length(3), // Command
            Constraint::Length(3), // Arguments
            Constraint::Length(1), // Status
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Register a server",
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    let focus = gallery.focus();
    draw_field(
        frame,
        rows[1],
        "Id",
        gallery.id_field(),
        focus == ToolFocus::Id,
        palette,
    );
    draw_field(
        frame,
        rows[2],
        "Command",
        gallery.command_field(),
        focus == ToolFocus::Command,
        palette,
    );
    draw_field(
        frame,
        rows[3],
        "Arguments",
        gallery.args_field(),
        focus == ToolFocus::Args,
        palette,
    );

    if let Some(message) = gallery.status() {
        let mut spans = vec![Span::raw(" ")];
        spans.extend(status_line(message, palette).spans);
        frame.render_widget(Paragraph::new(Line::from(spans)), rows[4]);
    }
}

// ============================================================================
// Connection settings form
// ============================================================================

fn draw_config_form(
    frame: &mut Frame,
    app: &App,
    state: &ConfigState,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (content, hints, status_area) = wizard_layout(frame);

    let block = panel("Connection Settings", palette);
    let inner = block.inner(content);
    frame.render_widget(block, content);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Base URL
            Constraint::Length(3), // Model
            Constraint::Length(3), // API key
            Constraint::Length(1),
            Constraint::Length(1), // Verdict
            Constraint::Length(1), // Status
            Constraint::Min(0),
        ])
        .split(inner);

    let focus = state.focus();
    draw_field(
        frame,
        rows[0],
        "Base URL",
        state.field(ConfigField::BaseUrl),
        focus == ConfigField::BaseUrl,
        palette,
    );
    draw_field(
        frame,
        rows[1],
        "Model",
        state.field(ConfigField::Model),
        focus == ConfigField::Model,
        palette,
    );
    draw_field(
        frame,
        rows[2],
        "API key",
        state.field(ConfigField::ApiKey),
        focus == ConfigField::ApiKey,
        palette,
    );

    let verdict = match state.verdict() {
        TestVerdict::Idle => Line::from(Span::styled(
            format!(" {} Not tested yet", glyphs.bullet),
            Style::default().fg(palette.text_muted),
        )),
        TestVerdict::Testing => Line::from(vec![
            Span::raw(" "),
            Span::styled(
                spinner_frame(app.tick_count(), app.ui_options()),
                Style::default().fg(palette.primary),
            ),
            Span::styled(
                " Testing connection...",
                Style::default().fg(palette.text_muted),
            ),
        ]),
        TestVerdict::Success => Line::from(Span::styled(
            format!(" {} Connection verified", glyphs.ok),
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        )),
        TestVerdict::Error(message) => Line::from(vec![
            Span::styled(
                format!(" {} ", glyphs.err),
                Style::default()
                    .fg(palette.error)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(message.as_str(), Style::default().fg(palette.error)),
        ]),
    };
    frame.render_widget(Paragraph::new(verdict), rows[4]);

    if let Some(message) = state.status() {
        let mut spans = vec![Span::raw(" ")];
        spans.extend(status_line(message, palette).spans);
        frame.render_widget(Paragraph::new(Line::from(spans)), rows[5]);
    }

    draw_hints(
        frame,
        hints,
        &[
            ("Tab", "next field"),
            ("Enter", "test"),
            ("Ctrl+S", "save"),
            ("Esc", "back"),
        ],
        palette,
    );
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

fn draw_configured(frame: &mut Frame, app: &App, palette: &Palette, glyphs: &Glyphs) {
    let (content, _, status_area) = wizard_layout(frame);
    let target = centered_rect(40, 1, content);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("{} Configuration saved", glyphs.ok),
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        target,
    );
    draw_status_bar(frame, app, status_area, palette, glyphs);
}

// ============================================================================
// Chat
// ============================================================================

fn draw_chat(frame: &mut Frame, app: &App, chat: &ChatSession, palette: &Palette, glyphs: &Glyphs) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_transcript(frame, app, chat, chunks[0], palette, glyphs);
    draw_chat_input(frame, chat, chunks[1], palette);
    draw_status_bar(frame, app, chunks[2], palette, glyphs);
}

fn draw_transcript(
    frame: &mut Frame,
    app: &App,
    chat: &ChatSession,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let assistant_name = app
        .active_config()
        .map_or("Assistant", |config| config.model.as_str());

    let mut lines: Vec<Line> = Vec::new();
    let mut count = 0;
    for message in chat.messages() {
        if count > 0 {
            lines.push(Line::from(""));
        }
        count += 1;

        let (icon, name, name_style) = match message.role {
            ChatRole::User => (glyphs.user, "You", styles::user_name(palette)),
            ChatRole::Assistant => (
                glyphs.assistant,
                assistant_name,
                styles::assistant_name(palette),
            ),
            ChatRole::System => (
                glyphs.system,
                "System",
                Style::default()
                    .fg(palette.text_muted)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {icon} "), name_style),
            Span::styled(name, name_style),
        ]));

        let content_style = match message.role {
            ChatRole::User => Style::default().fg(palette.text_primary),
            ChatRole::Assistant => Style::default().fg(palette.text_secondary),
            ChatRole::System => Style::default().fg(palette.text_muted),
        };
        for content_line in message.content.lines() {
            lines.push(Line::from(Span::styled(
                format!("   {content_line}"),
                content_style,
            )));
        }
    }

    if chat.is_waiting() {
        if count > 0 {
            lines.push(Line::from(""));
        }
        let spinner = spinner_frame(app.tick_count(), app.ui_options());
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(spinner, Style::default().fg(palette.primary)),
            Span::styled(
                " Waiting for a reply...",
                Style::default()
                    .fg(palette.text_muted)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    } else if chat.messages().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("   Connected to {assistant_name}."),
            Style::default().fg(palette.text_secondary),
        )));
        lines.push(Line::from(Span::styled(
            "   Type a message and press Enter.",
            Style::default().fg(palette.text_muted),
        )));
    }

    let block = panel("Chat", palette);
    let inner = block.inner(area);
    // Stick to the bottom; older turns scroll off the top.
    let total = wrapped_line_count(&lines, inner.width);
    let scroll = total.saturating_sub(inner.height);

    let transcript = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(transcript, area);
}

fn draw_chat_input(frame: &mut Frame, chat: &ChatSession, area: Rect, palette: &Palette) {
    let hints = hint_spans(&[("Enter", "send"), ("Ctrl+C", "quit")], palette);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.primary))
        .title_top(Line::from(hints).alignment(Alignment::Right));

    let prefix = " > ";
    let prefix_width = prefix.width() as u16;
    let content_width = area
        .width
        .saturating_sub(2)
        .saturating_sub(prefix_width)
        .max(1) as usize;
    let view = field_view(chat.input(), content_width);

    let input = Paragraph::new(Line::from(vec![
        Span::styled(prefix, Style::default().fg(palette.primary)),
        Span::styled(view.text, Style::default().fg(palette.text_primary)),
    ]))
    .block(block);
    frame.render_widget(input, area);

    frame.set_cursor_position((
        area.x
            .saturating_add(1 + prefix_width)
            .saturating_add(view.cursor_col),
        area.y.saturating_add(1),
    ));
}
