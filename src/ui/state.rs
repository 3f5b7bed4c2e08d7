//! App 状态定义 (Model)
//!
//! 包含应用状态结构体及相关枚举

use std::collections::BTreeSet;

use ratatui::layout::Size;

use crate::i18n::{Language, Strings, Translations};
use crate::models::{Pin, PinId, SortOrder};
use crate::runtime::Command;
use crate::storage::FavoritesRepository;

/// 应用状态
pub struct App {
    pub translations: Translations,
    pub language: Language,
    pub tab: Tab,
    pub mode: AppMode,

    pub pins: Vec<Pin>,
    pub selected_index: usize, // index into visible_pins()
    pub selected_pin: Option<Pin>,
    pub detail_open: bool,
    pub detail_scroll: u16,
    pub raw_scroll: u16,
    /// 最近一次绘制时的终端大小
    pub viewport: Size,

    pub favorites: BTreeSet<PinId>,
    pub(super) favorites_repo: Box<dyn FavoritesRepository>,

    pub draft: PinDraft,
    pub create_field: CreateField,
    pub comment_draft: CommentDraft,
    pub comment_field: CommentField,
    pub upload_path: String,

    pub search_query: String,
    pub sort_order: SortOrder,
    pub is_loading: bool,
    pub notice: Option<Notice>,

    // 过期结果判定
    pub(super) list_generation: u64,
    pub(super) view_generation: u64,
    pub(super) commands: Vec<Command>,
}

/// 三个互斥的主视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    List,
    Create,
    Favorites,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::List, Tab::Create, Tab::Favorites];

    pub fn index(&self) -> usize {
        match self {
            Tab::List => 0,
            Tab::Create => 1,
            Tab::Favorites => 2,
        }
    }

    pub fn label<'a>(&self, strings: &'a Strings) -> &'a str {
        match self {
            Tab::List => &strings.home,
            Tab::Create => &strings.create,
            Tab::Favorites => &strings.favorites,
        }
    }
}

/// 输入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Searching,
    EditingComment,
    UploadPrompt,
    RawView,
}

/// 创建页的输入框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateField {
    Title,
    Description,
    Content,
}

impl CreateField {
    pub fn next(self) -> Self {
        match self {
            CreateField::Title => CreateField::Description,
            CreateField::Description => CreateField::Content,
            CreateField::Content => CreateField::Title,
        }
    }
}

/// 评论表单的输入框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    Username,
    Content,
}

impl CommentField {
    pub fn next(self) -> Self {
        match self {
            CommentField::Username => CommentField::Content,
            CommentField::Content => CommentField::Username,
        }
    }
}

/// 新 pin 草稿
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinDraft {
    pub title: String,
    pub description: String,
    pub content: String,
}

impl PinDraft {
    pub fn field_mut(&mut self, field: CreateField) -> &mut String {
        match field {
            CreateField::Title => &mut self.title,
            CreateField::Description => &mut self.description,
            CreateField::Content => &mut self.content,
        }
    }

    pub fn clear(&mut self) {
        *self = PinDraft::default();
    }
}

/// 评论草稿，用户名在多次提交之间保留
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentDraft {
    pub username: String,
    pub content: String,
}

impl CommentDraft {
    pub fn field_mut(&mut self, field: CommentField) -> &mut String {
        match field {
            CommentField::Username => &mut self.username,
            CommentField::Content => &mut self.content,
        }
    }

    /// 内容去掉空白后非空才允许提交
    pub fn can_submit(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// 状态栏提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Copied,
    Published,
    Error,
    NoContent,
    UnsupportedFile,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::Error | Notice::NoContent | Notice::UnsupportedFile
        )
    }

    pub fn text<'a>(&self, strings: &'a Strings) -> &'a str {
        match self {
            Notice::Copied => &strings.copied,
            Notice::Published => &strings.published,
            Notice::Error => &strings.error,
            Notice::NoContent => &strings.no_content,
            Notice::UnsupportedFile => &strings.unsupported_file,
        }
    }
}

impl App {
    /// 创建新的应用实例，并发出首次列表请求
    pub fn new(
        translations: Translations,
        language: Language,
        favorites_repo: Box<dyn FavoritesRepository>,
    ) -> Self {
        let favorites = favorites_repo.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not load favorites, starting empty");
            BTreeSet::new()
        });

        let mut app = Self {
            translations,
            language,
            tab: Tab::List,
            mode: AppMode::Normal,
            pins: Vec::new(),
            selected_index: 0,
            selected_pin: None,
            detail_open: false,
            detail_scroll: 0,
            raw_scroll: 0,
            viewport: Size::new(80, 24),
            favorites,
            favorites_repo,
            draft: PinDraft::default(),
            create_field: CreateField::Title,
            comment_draft: CommentDraft::default(),
            comment_field: CommentField::Content,
            upload_path: String::new(),
            search_query: String::new(),
            sort_order: SortOrder::default(),
            is_loading: false,
            notice: None,
            list_generation: 0,
            view_generation: 0,
            commands: Vec::new(),
        };
        app.list_pins();
        app
    }

    pub fn strings(&self) -> &Strings {
        self.translations.get(self.language)
    }

    /// 当前视图显示的 pin：收藏页只显示已收藏的
    pub fn visible_pins(&self) -> Vec<&Pin> {
        match self.tab {
            Tab::Favorites => self
                .pins
                .iter()
                .filter(|pin| self.favorites.contains(&pin.id))
                .collect(),
            _ => self.pins.iter().collect(),
        }
    }

    /// 当前选中的卡片
    pub fn selected_card(&self) -> Option<&Pin> {
        self.visible_pins().get(self.selected_index).copied()
    }

    pub fn is_favorite(&self, id: PinId) -> bool {
        self.favorites.contains(&id)
    }

    /// 列表为空时显示的提示
    pub fn empty_message(&self) -> Option<&str> {
        if self.tab == Tab::Favorites && self.visible_pins().is_empty() {
            Some(&self.strings().no_favorites)
        } else {
            None
        }
    }

    /// 取走待执行的副作用
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// 确保选中索引有效
    pub(super) fn clamp_selection(&mut self) {
        let len = self.visible_pins().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }
}
