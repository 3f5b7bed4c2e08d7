//! Action 枚举定义 (Intent)
//!
//! 用户交互转化为明确的语义化 Action

use super::state::Tab;

/// 用户操作枚举
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    SwitchTab(Tab),
    MoveSelectionUp,
    MoveSelectionDown,
    CycleLanguage,

    // 列表
    OpenSelected,
    StartSearch,
    ToggleSort,
    Refresh,

    // 列表和详情共用，作用于当前 pin
    ToggleLike,
    ToggleFavorite,

    // 详情
    CopyContent,
    OpenRaw,
    StartComment,

    // 创建页
    Publish,
    StartUpload,
    NextField,

    // 表单/通用交互
    Cancel,      // Esc
    Submit,      // Enter
    Newline,     // Enter（多行内容）
    Input(char), // 输入字符
    DeleteChar,  // Backspace
}
