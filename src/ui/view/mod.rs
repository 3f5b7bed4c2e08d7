//! 视图层模块
//!
//! 包含主渲染入口和各种视图组件

pub mod components;
pub mod layouts;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect, Size},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

use super::state::{App, AppMode, CommentField, CreateField, Tab};
use crate::models::{Pin, SortOrder, format_timestamp};
use components::{render_dialog_framework, render_input_widget};
use layouts::{centered_lines, centered_rect};

/// 渲染 UI
pub fn render(frame: &mut Frame, app: &App) {
    if app.mode == AppMode::RawView {
        render_raw_view(frame, app, frame.area());
        return;
    }

    let show_search = app.tab != Tab::Create;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                               // 标签页
            Constraint::Length(if show_search { 3 } else { 0 }), // 搜索
            Constraint::Min(5),                                  // 主体
            Constraint::Length(4),                               // 提示与帮助
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    if show_search {
        render_search_bar(frame, app, chunks[1]);
    }
    match app.tab {
        Tab::List | Tab::Favorites => render_cards(frame, app, chunks[2]),
        Tab::Create => render_create_form(frame, app, chunks[2]),
    }
    render_help(frame, app, chunks[3]);

    // 渲染弹窗
    if app.detail_open {
        render_detail(frame, app);
    }
    if app.mode == AppMode::UploadPrompt {
        render_upload_dialog(frame, app);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let strings = app.strings();
    let language = format!("{}: {}", strings.language, app.language.native_name());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),
            Constraint::Length(language.chars().count() as u16 + 4),
        ])
        .split(area);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("F{} {}", i + 1, tab.label(strings))))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", strings.app_name),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        );
    frame.render_widget(tabs, chunks[0]);

    let language = Paragraph::new(language)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(language, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let strings = app.strings();
    let sort = match app.sort_order {
        SortOrder::Newest => &strings.sort_newest,
        SortOrder::Oldest => &strings.sort_oldest,
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(sort.chars().count() as u16 + 8),
        ])
        .split(area);

    render_input_widget(
        frame,
        chunks[0],
        "/",
        &app.search_query,
        &strings.search,
        app.mode == AppMode::Searching,
    );

    let sort = Paragraph::new(format!("[s] {sort}"))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(sort, chunks[1]);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let strings = app.strings();
    let heading = match app.tab {
        Tab::Favorites => &strings.favorite_pins,
        _ => &strings.all_pins,
    };
    let block = Block::default().title(heading.as_str()).borders(Borders::ALL);

    if let Some(message) = app.empty_message() {
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width < 2 || inner.height == 0 {
        return;
    }

    // 左侧留一列给选中标记
    let body_width = inner.width - 1;
    let cards: Vec<Paragraph> = app
        .visible_pins()
        .into_iter()
        .map(|pin| Paragraph::new(card_text(app, pin)).wrap(Wrap { trim: false }))
        .collect();
    let heights: Vec<u16> = cards
        .iter()
        .map(|card| u16::try_from(card.line_count(body_width)).unwrap_or(u16::MAX))
        .collect();
    let first = first_visible_card(&heights, app.selected_index, inner.height);

    let bottom = inner.bottom();
    let mut y = inner.y;
    for (index, (card, height)) in cards.into_iter().zip(heights).enumerate().skip(first) {
        if y >= bottom {
            break;
        }
        let height = height.min(bottom - y);
        let body = Rect::new(inner.x + 1, y, body_width, height);

        if index == app.selected_index {
            let marker = Paragraph::new(vec![Line::from("▌"); height as usize])
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(marker, Rect::new(inner.x, y, 1, height));
            frame.render_widget(card.style(Style::default().bg(Color::DarkGray)), body);
        } else {
            frame.render_widget(card, body);
        }
        y += height;
    }
}

/// 第一张要绘制的卡片，保证选中的卡片能完整显示
fn first_visible_card(heights: &[u16], selected: usize, available: u16) -> usize {
    let mut first = selected.min(heights.len().saturating_sub(1));
    let mut used = heights.get(first).copied().unwrap_or(0);
    while first > 0 {
        let above = heights[first - 1];
        if used.saturating_add(above) > available {
            break;
        }
        used += above;
        first -= 1;
    }
    first
}

/// 单个卡片：标题、描述、元信息、内容预览
fn card_text<'a>(app: &App, pin: &'a Pin) -> Text<'a> {
    let strings = app.strings();
    let star = if app.is_favorite(pin.id) { "★ " } else { "☆ " };

    let meta = Span::styled(
        format!(
            "Pin #{} • {}   ♥ {} {}",
            pin.id,
            pin.local_created_at(),
            pin.likes_count,
            strings.likes
        ),
        Style::default().fg(Color::DarkGray),
    );
    let star = Span::styled(star, Style::default().fg(Color::Yellow));

    // 无标题时星标与元信息同一行
    let mut lines = Vec::new();
    match &pin.title {
        Some(title) => {
            lines.push(Line::from(vec![
                star,
                Span::styled(title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
            if let Some(description) = &pin.description {
                lines.push(Line::styled(
                    description.as_str(),
                    Style::default().fg(Color::Gray),
                ));
            }
            lines.push(Line::from(meta));
        }
        None => {
            if let Some(description) = &pin.description {
                lines.push(Line::styled(
                    description.as_str(),
                    Style::default().fg(Color::Gray),
                ));
            }
            lines.push(Line::from(vec![star, meta]));
        }
    }
    lines.extend(
        pin.preview()
            .lines()
            .map(|line| Line::styled(line.to_string(), Style::default().fg(Color::White))),
    );
    lines.push(Line::default());
    Text::from(lines)
}

fn render_create_form(frame: &mut Frame, app: &App, area: Rect) {
    let strings = app.strings();
    let block = Block::default()
        .title(strings.create_pin.as_str())
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    render_input_widget(
        frame,
        chunks[0],
        &strings.title,
        &app.draft.title,
        &strings.title_placeholder,
        app.create_field == CreateField::Title,
    );
    render_input_widget(
        frame,
        chunks[1],
        &strings.description,
        &app.draft.description,
        &strings.description_placeholder,
        app.create_field == CreateField::Description,
    );
    render_input_widget(
        frame,
        chunks[2],
        &strings.paste_or_upload,
        &app.draft.content,
        "",
        app.create_field == CreateField::Content,
    );

    let actions = if app.is_loading {
        Line::styled(strings.loading.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Line::from(vec![
            Span::styled(
                format!("[Ctrl+S] {}", strings.publish),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("[Ctrl+O] {}", strings.upload_file),
                Style::default().fg(Color::Gray),
            ),
        ])
    };
    frame.render_widget(Paragraph::new(actions), chunks[3]);
}

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let strings = app.strings();
    let hint = match app.mode {
        AppMode::Searching => &strings.hint_search,
        AppMode::UploadPrompt => &strings.hint_upload,
        AppMode::EditingComment => &strings.hint_comment,
        AppMode::RawView => &strings.hint_raw,
        AppMode::Normal if app.detail_open => &strings.hint_detail,
        AppMode::Normal if app.tab == Tab::Create => &strings.hint_create,
        AppMode::Normal => &strings.hint_list,
    };

    // 提示放在第一行，按键说明再长也不会把它挤出去
    let mut lines = Vec::new();
    if let Some(notice) = app.notice {
        let color = if notice.is_error() {
            Color::Red
        } else {
            Color::Green
        };
        lines.push(Line::styled(
            notice.text(strings),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::styled(hint.as_str(), Style::default().fg(Color::Gray)));

    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, area);
}

fn render_detail(frame: &mut Frame, app: &App) {
    let Some(pin) = &app.selected_pin else {
        return;
    };
    let strings = app.strings();

    let area = centered_rect(85, 85, frame.area());
    let inner = render_dialog_framework(frame, area, &pin.display_title());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // 内容与评论
            Constraint::Length(3), // 用户名
            Constraint::Length(3), // 评论内容
        ])
        .split(inner);

    let mut lines = Vec::new();
    if let Some(description) = &pin.description {
        lines.push(Line::styled(
            description.as_str(),
            Style::default().fg(Color::Gray),
        ));
    }
    let star = if app.is_favorite(pin.id) { "★" } else { "☆" };
    lines.push(Line::from(vec![
        Span::styled(
            format!(
                "Pin #{} • {}   ♥ {} {}   {}",
                pin.id,
                pin.local_created_at(),
                pin.likes_count,
                strings.likes,
                star
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("   [c] {}  [r] {}", strings.copy, strings.raw),
            Style::default().fg(Color::Gray),
        ),
    ]));
    lines.push(Line::default());
    lines.extend(
        pin.content
            .lines()
            .map(|line| Line::styled(line, Style::default().fg(Color::White))),
    );
    lines.push(Line::default());

    let comments = pin.comments.as_deref().unwrap_or_default();
    lines.push(Line::styled(
        format!("{} ({})", strings.comments, comments.len()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));
    for comment in comments {
        lines.push(Line::from(vec![
            Span::styled(
                comment.username.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", format_timestamp(&comment.created_at)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.extend(
            comment
                .content
                .lines()
                .map(|line| Line::from(format!("  {line}"))),
        );
    }

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(body, chunks[0]);

    let editing = app.mode == AppMode::EditingComment;
    render_input_widget(
        frame,
        chunks[1],
        &strings.username,
        &app.comment_draft.username,
        &strings.username_placeholder,
        editing && app.comment_field == CommentField::Username,
    );
    render_input_widget(
        frame,
        chunks[2],
        &format!("{} ([Enter] {})", strings.add_comment, strings.post_comment),
        &app.comment_draft.content,
        &strings.comment_placeholder,
        editing && app.comment_field == CommentField::Content,
    );
}

/// 全屏原文，不做任何修饰，方便选择复制
fn render_raw_view(frame: &mut Frame, app: &App, area: Rect) {
    let Some(pin) = &app.selected_pin else {
        return;
    };

    let max_scroll = raw_max_scroll(&pin.content, Size::new(area.width, area.height));
    let raw = Paragraph::new(pin.content.as_str())
        .wrap(Wrap { trim: false })
        .scroll((app.raw_scroll.min(max_scroll), 0))
        .block(
            Block::default()
                .title(format!("Pin #{} - {}", pin.id, app.strings().raw))
                .title_bottom(app.strings().hint_raw.as_str())
                .borders(Borders::ALL),
        );
    frame.render_widget(raw, area);
}

/// 原文视图在给定终端大小下最多能向下滚动的行数
pub fn raw_max_scroll(content: &str, viewport: Size) -> u16 {
    let width = viewport.width.saturating_sub(2).max(1);
    let height = viewport.height.saturating_sub(2);
    let lines = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .line_count(width);
    u16::try_from(lines).unwrap_or(u16::MAX).saturating_sub(height)
}

fn render_upload_dialog(frame: &mut Frame, app: &App) {
    let strings = app.strings();
    let area = centered_lines(70, 5, frame.area());
    let inner = render_dialog_framework(frame, area, &strings.upload_file);
    render_input_widget(frame, inner, "", &app.upload_path, "~/notes.txt", true);
}
