//! 副作用执行
//!
//! `App` 只产生 [`Command`]，这里负责真正执行：网络请求放到独立线程，
//! 结果以 [`Completion`] 的形式经 channel 回到主循环。每个请求带着发起时的
//! generation，过期结果由 `App::apply` 丢弃。

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crossterm::clipboard::CopyToClipboard;
use crossterm::execute;

use crate::api::PinService;
use crate::error::Result;
use crate::models::{Comment, LikeOutcome, NewComment, NewPin, Pin, PinId, SortOrder};

/// App 发出的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Request { generation: u64, request: Request },
    CopyToClipboard(String),
}

/// 网络请求
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListPins { query: String, sort: SortOrder },
    FetchPin(PinId),
    CreatePin(NewPin),
    Like(PinId),
    Comment(NewComment),
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::ListPins { .. } => "list",
            Request::FetchPin(_) => "detail",
            Request::CreatePin(_) => "create",
            Request::Like(_) => "like",
            Request::Comment(_) => "comment",
        }
    }
}

/// 请求完成
#[derive(Debug)]
pub struct Completion {
    pub generation: u64,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    PinsListed(Result<Vec<Pin>>),
    PinFetched(Result<Pin>),
    PinCreated(Result<()>),
    Liked {
        id: PinId,
        result: Result<LikeOutcome>,
    },
    Commented {
        pin_id: PinId,
        result: Result<Comment>,
    },
}

/// 同步执行一个请求
pub fn perform(service: &dyn PinService, request: Request) -> Outcome {
    match request {
        Request::ListPins { query, sort } => Outcome::PinsListed(service.list_pins(&query, sort)),
        Request::FetchPin(id) => Outcome::PinFetched(service.get_pin(id)),
        Request::CreatePin(pin) => Outcome::PinCreated(service.create_pin(&pin)),
        Request::Like(id) => Outcome::Liked {
            id,
            result: service.like_pin(id),
        },
        Request::Comment(comment) => Outcome::Commented {
            pin_id: comment.pin_id,
            result: service.add_comment(&comment),
        },
    }
}

/// 通过 OSC 52 让终端写入系统剪贴板，终端是否支持无从得知
pub fn copy_to_clipboard<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    execute!(out, CopyToClipboard::to_clipboard_from(text))
}

pub struct Runtime {
    service: Arc<dyn PinService>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Runtime {
    pub fn new(service: Arc<dyn PinService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    pub fn execute(&self, command: Command) {
        match command {
            Command::Request {
                generation,
                request,
            } => self.spawn(generation, request),
            Command::CopyToClipboard(text) => {
                if let Err(err) = copy_to_clipboard(&mut io::stdout(), &text) {
                    tracing::warn!(error = %err, "clipboard write failed");
                }
            }
        }
    }

    /// 每个请求一个线程，互不排队
    pub fn spawn(&self, generation: u64, request: Request) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let name = request.name();
        tracing::debug!(request = name, generation, "request issued");

        thread::spawn(move || {
            let outcome = perform(service.as_ref(), request);
            tracing::debug!(request = name, generation, "request finished");
            // 接收端只会在退出时关闭
            let _ = tx.send(Completion {
                generation,
                outcome,
            });
        });
    }

    /// 取出所有已完成的请求，不阻塞
    pub fn drain(&self) -> Vec<Completion> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Completion> {
        self.rx.recv_timeout(timeout).ok()
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::fake::FakePinService;
    use super::*;
    use crate::models::fixtures;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_spawned_request_reports_back_with_generation() {
        let service = FakePinService::default();
        service.pins.lock().unwrap().push(fixtures::pin(1, "hello"));
        let runtime = Runtime::new(Arc::new(service));

        runtime.spawn(
            7,
            Request::ListPins {
                query: "he".to_string(),
                sort: SortOrder::Oldest,
            },
        );

        let completion = runtime.recv_timeout(WAIT).expect("completion");
        assert_eq!(completion.generation, 7);
        match completion.outcome {
            Outcome::PinsListed(Ok(pins)) => assert_eq!(pins.len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_failure_is_carried_in_outcome() {
        let service = FakePinService {
            fail: true,
            ..FakePinService::default()
        };
        let runtime = Runtime::new(Arc::new(service));
        runtime.spawn(1, Request::Like(PinId(3)));

        let completion = runtime.recv_timeout(WAIT).expect("completion");
        assert!(matches!(
            completion.outcome,
            Outcome::Liked { id: PinId(3), result: Err(_) }
        ));
    }

    #[test]
    fn test_drain_is_non_blocking() {
        let runtime = Runtime::new(Arc::new(FakePinService::default()));
        assert!(runtime.drain().is_empty());
    }

    #[test]
    fn test_perform_comment_keeps_pin_id() {
        let service = FakePinService::default();
        let outcome = perform(
            &service,
            Request::Comment(NewComment {
                pin_id: PinId(9),
                username: "ann".to_string(),
                content: "hi".to_string(),
            }),
        );
        match outcome {
            Outcome::Commented { pin_id, result } => {
                assert_eq!(pin_id, PinId(9));
                assert_eq!(result.unwrap().username, "ann");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(service.calls.lock().unwrap().as_slice(), ["comment 9 ann"]);
    }

    #[test]
    fn test_clipboard_writes_osc52() {
        let mut out = Vec::new();
        copy_to_clipboard(&mut out, "hello").unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.starts_with("\x1b]52;"));
        // "hello" 的 base64
        assert!(written.contains("aGVsbG8="));
    }
}
