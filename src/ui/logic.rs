//! 业务逻辑处理 (Update/Dispatch)
//!
//! `dispatch` 处理用户操作，`apply` 处理网络请求的结果。
//! 网络操作只入队 [`Command`]，不在这里阻塞。

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use super::actions::Action;
use super::state::{App, AppMode, CommentField, CreateField, Notice, Tab};
use super::view;
use crate::models::{NewComment, NewPin, PinId};
use crate::runtime::{Command, Completion, Outcome, Request};

impl App {
    /// 核心逻辑分发，返回 true 表示退出
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::SwitchTab(tab) => self.switch_tab(tab),
            Action::MoveSelectionUp => self.move_up(),
            Action::MoveSelectionDown => self.move_down(),
            Action::CycleLanguage => self.language = self.language.next(),

            Action::OpenSelected => {
                if let Some(id) = self.selected_card().map(|pin| pin.id) {
                    self.fetch_pin_detail(id);
                }
            }
            Action::StartSearch => self.mode = AppMode::Searching,
            Action::ToggleSort => {
                self.sort_order = self.sort_order.toggled();
                self.list_pins();
            }
            Action::Refresh => self.list_pins(),

            Action::ToggleLike => {
                if let Some(id) = self.focused_pin_id() {
                    self.toggle_like(id);
                }
            }
            Action::ToggleFavorite => {
                if let Some(id) = self.focused_pin_id() {
                    self.toggle_favorite(id);
                }
            }

            Action::CopyContent => {
                if let Some(content) = self.selected_pin.as_ref().map(|pin| pin.content.clone()) {
                    self.copy_to_clipboard(content);
                }
            }
            Action::OpenRaw => self.open_raw_view(),
            Action::StartComment => {
                if self.detail_open {
                    self.mode = AppMode::EditingComment;
                    self.comment_field = CommentField::Content;
                }
            }

            Action::Publish => self.create_pin(),
            Action::StartUpload => {
                self.mode = AppMode::UploadPrompt;
                self.upload_path.clear();
            }
            Action::NextField => match self.mode {
                AppMode::EditingComment => self.comment_field = self.comment_field.next(),
                _ => self.create_field = self.create_field.next(),
            },

            Action::Cancel => self.cancel(),
            Action::Submit => self.submit(),
            Action::Newline => self.insert_char('\n'),
            Action::Input(c) => self.insert_char(c),
            Action::DeleteChar => self.delete_char(),
        }
        false
    }

    // ============ 导航相关 ============

    /// 切换主视图，任何进行中的详情请求随之作废
    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.mode = AppMode::Normal;
        self.view_generation += 1;
        self.clamp_selection();
    }

    pub fn move_up(&mut self) {
        match self.mode {
            AppMode::RawView => self.raw_scroll = self.raw_scroll.saturating_sub(1),
            _ if self.detail_open => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            _ => self.selected_index = self.selected_index.saturating_sub(1),
        }
    }

    pub fn move_down(&mut self) {
        match self.mode {
            AppMode::RawView => {
                let max_scroll = self.selected_pin.as_ref().map_or(0, |pin| {
                    view::raw_max_scroll(&pin.content, self.viewport)
                });
                self.raw_scroll = self.raw_scroll.saturating_add(1).min(max_scroll);
            }
            _ if self.detail_open => self.detail_scroll = self.detail_scroll.saturating_add(1),
            _ => {
                if self.selected_index + 1 < self.visible_pins().len() {
                    self.selected_index += 1;
                }
            }
        }
    }

    /// 详情打开时作用于详情中的 pin，否则作用于选中的卡片
    fn focused_pin_id(&self) -> Option<PinId> {
        if self.detail_open {
            self.selected_pin.as_ref().map(|pin| pin.id)
        } else {
            self.selected_card().map(|pin| pin.id)
        }
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
        self.mode = AppMode::Normal;
        self.view_generation += 1;
    }

    // ============ 网络操作 ============

    /// 按当前搜索词和排序重新拉取列表
    pub fn list_pins(&mut self) {
        self.list_generation += 1;
        self.commands.push(Command::Request {
            generation: self.list_generation,
            request: Request::ListPins {
                query: self.search_query.clone(),
                sort: self.sort_order,
            },
        });
    }

    /// 拉取单个 pin 及其评论，成功后打开详情
    pub fn fetch_pin_detail(&mut self, id: PinId) {
        self.view_generation += 1;
        self.request(Request::FetchPin(id));
    }

    /// 发布草稿；内容为空时只提示，不发请求
    pub fn create_pin(&mut self) {
        if self.is_loading {
            return;
        }
        if self.draft.content.trim().is_empty() {
            self.notice = Some(Notice::NoContent);
            return;
        }

        self.is_loading = true;
        self.request(Request::CreatePin(NewPin {
            title: self.draft.title.clone(),
            description: self.draft.description.clone(),
            content: self.draft.content.clone(),
        }));
    }

    /// 每次调用都发一次点赞请求，计数以服务端返回为准
    pub fn toggle_like(&mut self, id: PinId) {
        self.request(Request::Like(id));
    }

    /// 内容为空时提交无效；用户名为空时使用本地化的匿名名称
    pub fn post_comment(&mut self) {
        if !self.comment_draft.can_submit() {
            return;
        }
        let Some(pin_id) = self.selected_pin.as_ref().map(|pin| pin.id) else {
            return;
        };

        let username = match self.comment_draft.username.trim() {
            "" => self.strings().anonymous.clone(),
            name => name.to_string(),
        };
        self.request(Request::Comment(NewComment {
            pin_id,
            username,
            content: self.comment_draft.content.clone(),
        }));
    }

    fn request(&mut self, request: Request) {
        self.commands.push(Command::Request {
            generation: self.view_generation,
            request,
        });
    }

    // ============ 本地操作 ============

    /// 切换收藏并立即整体保存
    pub fn toggle_favorite(&mut self, id: PinId) {
        if !self.favorites.remove(&id) {
            self.favorites.insert(id);
        }
        if let Err(err) = self.favorites_repo.save(&self.favorites) {
            tracing::warn!(error = %err, pin = %id, "failed to persist favorites");
        }
        self.clamp_selection();
    }

    pub fn copy_to_clipboard(&mut self, text: String) {
        self.commands.push(Command::CopyToClipboard(text));
        self.notice = Some(Notice::Copied);
    }

    pub fn open_raw_view(&mut self) {
        if self.detail_open && self.selected_pin.is_some() {
            self.mode = AppMode::RawView;
            self.raw_scroll = 0;
        }
    }

    /// 只接受 text/plain，读入创建页的内容框
    pub fn upload_file(&mut self, path: &Path) {
        let is_plain_text = mime_guess::from_path(path)
            .first()
            .is_some_and(|mime| mime == mime_guess::mime::TEXT_PLAIN);
        if !is_plain_text {
            tracing::warn!(path = %path.display(), "rejected non-text upload");
            self.notice = Some(Notice::UnsupportedFile);
            return;
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                tracing::info!(path = %path.display(), bytes = content.len(), "loaded file into draft");
                self.draft.content = content;
                self.create_field = CreateField::Content;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read upload");
                self.notice = Some(Notice::Error);
            }
        }
    }

    // ============ 请求结果 ============

    /// 应用一个已完成的请求
    pub fn apply(&mut self, completion: Completion) {
        let Completion {
            generation,
            outcome,
        } = completion;

        match outcome {
            Outcome::PinsListed(result) => {
                if generation != self.list_generation {
                    tracing::debug!(generation, current = self.list_generation, "dropping stale list");
                    return;
                }
                match result {
                    Ok(pins) => {
                        self.pins = pins;
                        self.clamp_selection();
                    }
                    Err(err) => self.fail("list", &err),
                }
            }
            Outcome::PinFetched(result) => {
                if generation != self.view_generation {
                    tracing::debug!(generation, current = self.view_generation, "dropping stale detail");
                    return;
                }
                match result {
                    Ok(pin) => {
                        self.selected_pin = Some(pin);
                        self.detail_open = true;
                        self.detail_scroll = 0;
                        self.mode = AppMode::Normal;
                    }
                    Err(err) => self.fail("detail", &err),
                }
            }
            Outcome::PinCreated(result) => {
                self.is_loading = false;
                match result {
                    Ok(()) => {
                        self.notice = Some(Notice::Published);
                        self.draft.clear();
                        self.create_field = CreateField::Title;
                        self.switch_tab(Tab::List);
                        self.list_pins();
                    }
                    Err(err) => self.fail("create", &err),
                }
            }
            Outcome::Liked { id, result } => match result {
                Ok(like) => {
                    tracing::debug!(pin = %id, likes = like.likes_count, liked = ?like.liked, "like recorded");
                    self.pins
                        .iter_mut()
                        .filter(|pin| pin.id == id)
                        .for_each(|pin| pin.likes_count = like.likes_count);
                    if let Some(pin) = self.selected_pin.as_mut().filter(|pin| pin.id == id) {
                        pin.likes_count = like.likes_count;
                    }
                }
                Err(err) => self.fail("like", &err),
            },
            Outcome::Commented { pin_id, result } => match result {
                Ok(comment) => {
                    self.comment_draft.content.clear();
                    if generation != self.view_generation {
                        tracing::debug!(pin = %pin_id, "comment posted to a pin no longer shown");
                        return;
                    }
                    if let Some(pin) = self.selected_pin.as_mut().filter(|pin| pin.id == pin_id) {
                        pin.comments.get_or_insert_with(Vec::new).push(comment);
                    }
                }
                Err(err) => self.fail("comment", &err),
            },
        }
    }

    fn fail(&mut self, operation: &str, err: &crate::error::Error) {
        tracing::warn!(operation, error = %err, "request failed");
        self.notice = Some(Notice::Error);
    }

    // ============ 通用操作 ============

    /// Esc：退出当前输入模式，或关闭详情
    pub fn cancel(&mut self) {
        match self.mode {
            AppMode::Searching => {
                self.mode = AppMode::Normal;
                if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.list_pins();
                }
            }
            AppMode::UploadPrompt => {
                self.mode = AppMode::Normal;
                self.upload_path.clear();
            }
            AppMode::RawView | AppMode::EditingComment => self.mode = AppMode::Normal,
            AppMode::Normal if self.detail_open => self.close_detail(),
            AppMode::Normal => self.notice = None,
        }
    }

    fn submit(&mut self) {
        match self.mode {
            AppMode::Searching => self.mode = AppMode::Normal,
            AppMode::UploadPrompt => {
                let path = self.upload_path.trim().to_string();
                self.mode = AppMode::Normal;
                self.upload_path.clear();
                if !path.is_empty() {
                    self.upload_file(&expand_home(&path));
                }
            }
            AppMode::EditingComment => self.post_comment(),
            AppMode::Normal | AppMode::RawView => {}
        }
    }

    fn insert_char(&mut self, c: char) {
        match self.mode {
            AppMode::Searching => {
                self.search_query.push(c);
                self.list_pins();
            }
            AppMode::UploadPrompt => self.upload_path.push(c),
            AppMode::EditingComment => self.comment_draft.field_mut(self.comment_field).push(c),
            AppMode::Normal if self.tab == Tab::Create => {
                self.draft.field_mut(self.create_field).push(c)
            }
            _ => {}
        }
    }

    fn delete_char(&mut self) {
        match self.mode {
            AppMode::Searching => {
                if self.search_query.pop().is_some() {
                    self.list_pins();
                }
            }
            AppMode::UploadPrompt => {
                self.upload_path.pop();
            }
            AppMode::EditingComment => {
                self.comment_draft.field_mut(self.comment_field).pop();
            }
            AppMode::Normal if self.tab == Tab::Create => {
                self.draft.field_mut(self.create_field).pop();
            }
            _ => {}
        }
    }
}

/// 把开头的 `~` 展开为用户主目录，`~user` 形式保持原样
fn expand_home(raw: &str) -> PathBuf {
    let Some(rest) = raw.strip_prefix('~') else {
        return PathBuf::from(raw);
    };
    if !(rest.is_empty() || rest.starts_with(['/', MAIN_SEPARATOR])) {
        return PathBuf::from(raw);
    }
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', MAIN_SEPARATOR])),
        None => PathBuf::from(raw),
    }
}
