use thiserror::Error;

/// PublicBin 统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 客户端错误
///
/// 界面层把所有网络错误折叠成同一条通用提示，这里保留细节用于日志。
#[derive(Error, Debug)]
pub enum Error {
    /// 网络传输失败（连接、DNS、TLS、超时）
    #[error("request failed: {0}")]
    Transport(String),

    /// 服务返回非 2xx 状态
    #[error("service returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// 响应体无法解析
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    /// 翻译表缺少字段或格式错误
    #[error("translation table '{language}' is invalid: {reason}")]
    Translations { language: String, reason: String },
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                Error::Status {
                    code,
                    message: service_error_message(&body),
                }
            }
            ureq::Error::Transport(transport) => Error::Transport(transport.to_string()),
        }
    }
}

/// 从 `{"error": "..."}` 中取出服务端错误信息
fn service_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorEnvelope {
        error: String,
    }

    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_message_envelope() {
        assert_eq!(
            service_error_message(r#"{"error": "Pin not found"}"#),
            "Pin not found"
        );
    }

    #[test]
    fn test_service_error_message_plain_body() {
        assert_eq!(service_error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_status_display() {
        let err = Error::Status {
            code: 404,
            message: "Pin not found".to_string(),
        };
        assert_eq!(err.to_string(), "service returned status 404: Pin not found");
    }
}
