//! 键盘事件映射 (Input -> Action)
//!
//! 将按键事件转换为 Action

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::actions::Action;
use super::state::{App, AppMode, CreateField, Tab};

/// 根据当前模式和按键获取对应的 Action
pub fn get_action(app: &App, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match app.mode {
        AppMode::RawView => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Cancel),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
            _ => None,
        },
        AppMode::Searching | AppMode::UploadPrompt => text_input(key),
        AppMode::EditingComment => match key.code {
            KeyCode::Tab => Some(Action::NextField),
            _ => text_input(key),
        },
        AppMode::Normal if app.detail_open => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Cancel),
            KeyCode::Char('l') => Some(Action::ToggleLike),
            KeyCode::Char('f') => Some(Action::ToggleFavorite),
            KeyCode::Char('c') => Some(Action::CopyContent),
            KeyCode::Char('r') => Some(Action::OpenRaw),
            KeyCode::Char('i') => Some(Action::StartComment),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
            _ => None,
        },
        AppMode::Normal => {
            if let Some(tab) = tab_key(key.code) {
                return Some(Action::SwitchTab(tab));
            }
            match app.tab {
                Tab::Create => create_input(app, key, ctrl),
                Tab::List | Tab::Favorites => match key.code {
                    KeyCode::Char('q') => Some(Action::Quit),
                    KeyCode::Char('1') => Some(Action::SwitchTab(Tab::List)),
                    KeyCode::Char('2') => Some(Action::SwitchTab(Tab::Create)),
                    KeyCode::Char('3') => Some(Action::SwitchTab(Tab::Favorites)),
                    KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
                    KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
                    KeyCode::Enter => Some(Action::OpenSelected),
                    KeyCode::Char('l') => Some(Action::ToggleLike),
                    KeyCode::Char('f') => Some(Action::ToggleFavorite),
                    KeyCode::Char('/') => Some(Action::StartSearch),
                    KeyCode::Char('s') => Some(Action::ToggleSort),
                    KeyCode::Char('r') => Some(Action::Refresh),
                    KeyCode::Char('L') => Some(Action::CycleLanguage),
                    _ => None,
                },
            }
        }
    }
}

fn tab_key(code: KeyCode) -> Option<Tab> {
    match code {
        KeyCode::F(1) => Some(Tab::List),
        KeyCode::F(2) => Some(Tab::Create),
        KeyCode::F(3) => Some(Tab::Favorites),
        _ => None,
    }
}

fn create_input(app: &App, key: KeyEvent, ctrl: bool) -> Option<Action> {
    match key.code {
        KeyCode::Char('s') if ctrl => Some(Action::Publish),
        KeyCode::Char('o') if ctrl => Some(Action::StartUpload),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Esc => Some(Action::SwitchTab(Tab::List)),
        KeyCode::Tab => Some(Action::NextField),
        KeyCode::Enter if app.create_field == CreateField::Content => Some(Action::Newline),
        KeyCode::Enter => Some(Action::NextField),
        KeyCode::Backspace => Some(Action::DeleteChar),
        KeyCode::Char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

fn text_input(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Backspace => Some(Action::DeleteChar),
        KeyCode::Char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

/// 处理按键事件
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> io::Result<bool> {
    if let Some(action) = get_action(app, key) {
        Ok(app.dispatch(action))
    } else {
        Ok(false)
    }
}
