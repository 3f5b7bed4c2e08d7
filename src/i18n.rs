//! 界面文案
//!
//! 每种语言一份 TOML 文件（`assets/i18n/<code>.toml`），编译时嵌入，
//! 启动时反序列化为 [`Strings`]。缺字段、多字段或空值都会让 [`Translations::load`]
//! 直接失败，而不是在界面上显示空白。

use serde::Deserialize;

use crate::error::{Error, Result};

/// 支持的界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Ru,
    Ar,
    De,
    Zh,
    Ja,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Ru,
        Language::Ar,
        Language::De,
        Language::Zh,
        Language::Ja,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Ar => "ar",
            Language::De => "de",
            Language::Zh => "zh",
            Language::Ja => "ja",
        }
    }

    /// 语言自身的名称，用于设置显示
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ru => "Русский",
            Language::Ar => "العربية",
            Language::De => "Deutsch",
            Language::Zh => "中文",
            Language::Ja => "日本語",
        }
    }

    /// 接受 `de`、`de-DE`、`DE_de` 之类的写法
    pub fn from_code(code: &str) -> Option<Language> {
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Language::ALL.into_iter().find(|lang| lang.code() == primary)
    }

    fn index(&self) -> usize {
        Language::ALL.iter().position(|l| l == self).unwrap_or(0)
    }

    /// 循环切换到下一种语言
    pub fn next(self) -> Language {
        Language::ALL[(self.index() + 1) % Language::ALL.len()]
    }

    fn source(&self) -> &'static str {
        match self {
            Language::En => include_str!("../assets/i18n/en.toml"),
            Language::Ru => include_str!("../assets/i18n/ru.toml"),
            Language::Ar => include_str!("../assets/i18n/ar.toml"),
            Language::De => include_str!("../assets/i18n/de.toml"),
            Language::Zh => include_str!("../assets/i18n/zh.toml"),
            Language::Ja => include_str!("../assets/i18n/ja.toml"),
        }
    }
}

/// 一种语言的全部文案
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Strings {
    pub app_name: String,
    pub home: String,
    pub create: String,
    pub favorites: String,
    pub language: String,
    pub all_pins: String,
    pub favorite_pins: String,
    pub no_favorites: String,
    pub create_pin: String,
    pub title: String,
    pub title_placeholder: String,
    pub description: String,
    pub description_placeholder: String,
    pub paste_or_upload: String,
    pub upload_file: String,
    pub publish: String,
    pub copy: String,
    pub raw: String,
    pub copied: String,
    pub published: String,
    pub error: String,
    pub no_content: String,
    pub unsupported_file: String,
    pub likes: String,
    pub comments: String,
    pub add_comment: String,
    pub username: String,
    pub username_placeholder: String,
    pub comment_placeholder: String,
    pub post_comment: String,
    pub anonymous: String,
    pub search: String,
    pub sort_newest: String,
    pub sort_oldest: String,
    pub loading: String,
    pub hint_list: String,
    pub hint_create: String,
    pub hint_detail: String,
    pub hint_comment: String,
    pub hint_search: String,
    pub hint_upload: String,
    pub hint_raw: String,
}

impl Strings {
    fn parse(language: Language) -> Result<Strings> {
        Strings::from_source(language.code(), language.source())
    }

    /// 解析一次为 TOML 表，校验每个值都是非空字符串后再转成 `Strings`
    fn from_source(code: &str, source: &str) -> Result<Strings> {
        let invalid = |reason: String| Error::Translations {
            language: code.to_string(),
            reason,
        };

        let table: toml::Table = toml::from_str(source).map_err(|e| invalid(e.to_string()))?;
        if let Some((key, _)) = table
            .iter()
            .find(|(_, value)| value.as_str().is_none_or(|s| s.trim().is_empty()))
        {
            return Err(invalid(format!("key '{key}' must be a non-empty string")));
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| invalid(e.to_string()))
    }
}

/// 全部语言的文案表
#[derive(Debug, Clone)]
pub struct Translations {
    // 与 Language::ALL 顺序一致
    tables: Vec<Strings>,
}

impl Translations {
    /// 解析并校验所有嵌入的语言文件
    pub fn load() -> Result<Translations> {
        let tables = Language::ALL
            .into_iter()
            .map(Strings::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Translations { tables })
    }

    pub fn get(&self, language: Language) -> &Strings {
        &self.tables[language.index()]
    }
}

/// 语言选择顺序：命令行 > 配置文件 > 英语
pub fn resolve_language(cli_lang: Option<&str>, config_lang: Option<&str>) -> Language {
    cli_lang
        .and_then(Language::from_code)
        .or_else(|| config_lang.and_then(Language::from_code))
        .unwrap_or_default()
}
