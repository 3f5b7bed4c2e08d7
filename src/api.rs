//! pin 服务的 HTTP 客户端
//!
//! 所有请求都发往同一个地址，GET 通过查询参数区分列表和详情，
//! POST 通过请求体里的 `action` 区分创建、点赞和评论。

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{Comment, LikeOutcome, NewComment, NewPin, Pin, PinId, PinRequest, SortOrder};

/// 远端 pin 服务
///
/// 调用是阻塞的，由 runtime 放到工作线程里执行。
pub trait PinService: Send + Sync {
    fn list_pins(&self, query: &str, sort: SortOrder) -> Result<Vec<Pin>>;
    fn get_pin(&self, id: PinId) -> Result<Pin>;
    fn create_pin(&self, pin: &NewPin) -> Result<()>;
    fn like_pin(&self, id: PinId) -> Result<LikeOutcome>;
    fn add_comment(&self, comment: &NewComment) -> Result<Comment>;
}

/// 基于 ureq 的实现
#[derive(Clone)]
pub struct HttpPinService {
    base_url: Url,
    agent: ureq::Agent,
}

impl HttpPinService {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}?search=<q>&sort=<order>`，空查询不带 search
    pub fn list_url(&self, query: &str, sort: SortOrder) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if !query.is_empty() {
                pairs.append_pair("search", query);
            }
            pairs.append_pair("sort", sort.as_param());
        }
        url
    }

    pub fn detail_url(&self, id: PinId) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("id", &id.to_string());
        url
    }

    fn get_json<R: DeserializeOwned>(&self, url: &Url) -> Result<R> {
        let response = self
            .agent
            .get(url.as_str())
            .set("Accept", "application/json")
            .call()?;
        read_json_response(response)
    }

    fn post(&self, request: &PinRequest<'_>) -> Result<ureq::Response> {
        let payload = serde_json::to_string(request)?;
        let response = self
            .agent
            .post(self.base_url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&payload)?;
        Ok(response)
    }
}

impl PinService for HttpPinService {
    fn list_pins(&self, query: &str, sort: SortOrder) -> Result<Vec<Pin>> {
        let url = self.list_url(query, sort);
        tracing::debug!(%url, "listing pins");
        self.get_json(&url)
    }

    fn get_pin(&self, id: PinId) -> Result<Pin> {
        let url = self.detail_url(id);
        tracing::debug!(%url, "fetching pin");
        self.get_json(&url)
    }

    fn create_pin(&self, pin: &NewPin) -> Result<()> {
        let response = self.post(&PinRequest::Create {
            title: pin.title.trim(),
            description: pin.description.trim(),
            content: &pin.content,
        })?;
        tracing::debug!(status = response.status(), "pin created");
        Ok(())
    }

    fn like_pin(&self, id: PinId) -> Result<LikeOutcome> {
        let response = self.post(&PinRequest::Like { pin_id: id })?;
        read_json_response(response)
    }

    fn add_comment(&self, comment: &NewComment) -> Result<Comment> {
        let response = self.post(&PinRequest::Comment {
            pin_id: comment.pin_id,
            username: &comment.username,
            content: &comment.content,
        })?;
        read_json_response(response)
    }
}

fn read_json_response<R: DeserializeOwned>(response: ureq::Response) -> Result<R> {
    let body = response
        .into_string()
        .map_err(|err| Error::Transport(format!("failed to read response body: {err}")))?;
    serde_json::from_str(&body).map_err(|err| Error::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use serde_json::json;

    use super::*;

    fn service() -> HttpPinService {
        HttpPinService::new(
            Url::parse("https://pins.example.com/api").unwrap(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_list_url_without_query() {
        let url = service().list_url("", SortOrder::Newest);
        assert_eq!(url.as_str(), "https://pins.example.com/api?sort=newest");
    }

    #[test]
    fn test_list_url_encodes_query() {
        let url = service().list_url("hello world&more", SortOrder::Oldest);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("search".to_string(), "hello world&more".to_string()),
                ("sort".to_string(), "oldest".to_string()),
            ]
        );
    }

    #[test]
    fn test_detail_url() {
        let url = service().detail_url(PinId(42));
        assert_eq!(url.as_str(), "https://pins.example.com/api?id=42");
    }

    /// 只处理一个连接的本地服务：回复固定响应，交回收到的请求行和请求体
    fn serve_once(status: &str, body: &str) -> (HttpPinService, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/api", listener.local_addr().unwrap())).unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            (
                request_line.trim_end().to_string(),
                String::from_utf8(body).unwrap(),
            )
        });

        (HttpPinService::new(url, Duration::from_secs(5)), handle)
    }

    fn sent_json(body: &str) -> serde_json::Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_create_pin_posts_trimmed_fields() {
        let (service, server) = serve_once(
            "201 Created",
            r#"{"id": 1, "title": "Title", "description": "Desc", "content": "  body  ",
                "created_at": "2024-05-01 12:00:00.000000", "likes_count": 0}"#,
        );

        service
            .create_pin(&NewPin {
                title: "  Title ".to_string(),
                description: "Desc\n".to_string(),
                content: "  body  ".to_string(),
            })
            .unwrap();

        let (request_line, body) = server.join().unwrap();
        assert_eq!(request_line, "POST /api HTTP/1.1");
        assert_eq!(
            sent_json(&body),
            json!({"action": "create", "title": "Title", "description": "Desc", "content": "  body  "})
        );
    }

    #[test]
    fn test_like_pin_returns_service_count() {
        let (service, server) = serve_once("200 OK", r#"{"liked": true, "likes_count": 3}"#);

        let outcome = service.like_pin(PinId(5)).unwrap();

        assert_eq!(
            outcome,
            LikeOutcome {
                likes_count: 3,
                liked: Some(true)
            }
        );
        let (_, body) = server.join().unwrap();
        assert_eq!(sent_json(&body), json!({"action": "like", "pin_id": 5}));
    }

    #[test]
    fn test_add_comment_returns_created_comment() {
        let (service, server) = serve_once(
            "201 Created",
            r#"{"id": 4, "username": "ann", "content": "hi", "created_at": "2024-05-02 08:30:00"}"#,
        );

        let comment = service
            .add_comment(&NewComment {
                pin_id: PinId(9),
                username: "ann".to_string(),
                content: "hi".to_string(),
            })
            .unwrap();

        assert_eq!(comment.id, 4);
        assert_eq!(comment.username, "ann");
        let (_, body) = server.join().unwrap();
        assert_eq!(
            sent_json(&body),
            json!({"action": "comment", "pin_id": 9, "username": "ann", "content": "hi"})
        );
    }

    #[test]
    fn test_not_found_maps_error_envelope() {
        let (service, server) = serve_once("404 Not Found", r#"{"error": "Pin not found"}"#);

        let result = service.get_pin(PinId(9));

        match result {
            Err(Error::Status { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message, "Pin not found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let (request_line, _) = server.join().unwrap();
        assert_eq!(request_line, "GET /api?id=9 HTTP/1.1");
    }

    #[test]
    fn test_server_error_keeps_plain_body() {
        let (service, server) = serve_once("500 Internal Server Error", "boom\n");

        let result = service.list_pins("", SortOrder::Newest);

        assert!(matches!(
            result,
            Err(Error::Status { code: 500, ref message }) if message == "boom"
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let (service, server) = serve_once("200 OK", "not json");
        let result = service.list_pins("", SortOrder::Newest);
        assert!(matches!(result, Err(Error::Decode(_))));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        // 先占用一个端口再释放，保证没有进程在监听
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let service = HttpPinService::new(
            Url::parse(&format!("http://{addr}/")).unwrap(),
            Duration::from_millis(500),
        );
        let result = service.list_pins("", SortOrder::Newest);
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
