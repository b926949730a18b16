//! Real `ScoApi` over the platform's SCO ajax endpoint.
//!
//! Every call is a form-encoded POST keyed by an `action` discriminator,
//! carrying the resolved identifiers and a cache-busting `nocache` value.
//! Replies are JSON `{ret, comment?, mess?}` with `ret == 0` for success.

use crate::http::HttpClient;
use crate::runner::{ScoApi, SubmitReply};
use async_trait::async_trait;
use rand::Rng;

/// Default SCO endpoint on the production platform.
pub const DEFAULT_SCO_ENDPOINT: &str = "http://welearn.sflep.com/Ajax/SCO.aspx";

const CALL_TIMEOUT_MS: u64 = 10_000;

/// Ajax header set the SCO endpoint expects.
const AJAX_HEADERS: &[(&str, &str)] = &[("X-Requested-With", "XMLHttpRequest")];

/// SCO client bound to one `(course, class, account)` triple.
pub struct ScoClient {
    http: HttpClient,
    endpoint: String,
    course_id: String,
    class_id: String,
    account_id: String,
}

impl ScoClient {
    pub fn new(http: HttpClient, course_id: String, class_id: String, account_id: String) -> Self {
        Self::with_endpoint(
            http,
            DEFAULT_SCO_ENDPOINT.to_string(),
            course_id,
            class_id,
            account_id,
        )
    }

    pub fn with_endpoint(
        http: HttpClient,
        endpoint: String,
        course_id: String,
        class_id: String,
        account_id: String,
    ) -> Self {
        Self {
            http,
            endpoint,
            course_id,
            class_id,
            account_id,
        }
    }

    async fn call(&self, fields: &[(&str, &str)]) -> Option<serde_json::Value> {
        let resp = match self
            .http
            .post_form(&self.endpoint, fields, AJAX_HEADERS, CALL_TIMEOUT_MS)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("SCO call failed: {e}");
                return None;
            }
        };
        if resp.status != 200 {
            tracing::warn!("SCO endpoint returned HTTP {}", resp.status);
            return None;
        }
        serde_json::from_str(&resp.body).ok()
    }
}

fn nocache() -> String {
    // Mirrors the frontend, which appends Math.random().
    rand::thread_rng().gen::<f64>().to_string()
}

fn ret_of(value: &serde_json::Value) -> i64 {
    value.get("ret").and_then(serde_json::Value::as_i64).unwrap_or(-1)
}

#[async_trait]
impl ScoApi for ScoClient {
    async fn fetch_info(&self, scoid: &str) -> Option<String> {
        let nc = nocache();
        let reply = self
            .call(&[
                ("action", "getscoinfo_v7"),
                ("cid", &self.course_id),
                ("scoid", scoid),
                ("uid", &self.account_id),
                ("nocache", &nc),
            ])
            .await?;

        if ret_of(&reply) != 0 {
            return None;
        }
        Some(
            reply
                .get("comment")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        )
    }

    async fn activate(&self, scoid: &str) -> bool {
        let nc = nocache();
        let reply = self
            .call(&[
                ("action", "startsco160928"),
                ("cid", &self.course_id),
                ("scoid", scoid),
                ("uid", &self.account_id),
                ("classid", &self.class_id),
                ("tid", "-1"),
                ("nocache", &nc),
            ])
            .await;

        reply.map(|v| ret_of(&v) == 0).unwrap_or(false)
    }

    async fn submit(&self, scoid: &str, payload: &str) -> SubmitReply {
        let nc = nocache();
        let reply = self
            .call(&[
                ("action", "setscoinfo"),
                ("cid", &self.course_id),
                ("scoid", scoid),
                ("uid", &self.account_id),
                ("data", payload),
                ("isend", "true"),
                ("nocache", &nc),
            ])
            .await;

        match reply {
            Some(v) => SubmitReply {
                ret: ret_of(&v),
                mess: v
                    .get("mess")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
            },
            None => SubmitReply {
                ret: -1,
                mess: Some("transport failure".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ScoClient {
        ScoClient::with_endpoint(
            HttpClient::new(5000),
            format!("{}/Ajax/SCO.aspx", server.uri()),
            "1234".to_string(),
            "123456".to_string(),
            "31337".to_string(),
        )
    }

    #[tokio::test]
    async fn test_fetch_info_returns_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Ajax/SCO.aspx"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(body_string_contains("action=getscoinfo_v7"))
            .and(body_string_contains("scoid=m-3-1-1"))
            .and(body_string_contains("uid=31337"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ret": 0,
                "comment": "{\"cmi\":{\"score\":{}}}"
            })))
            .mount(&server)
            .await;

        let info = client(&server).fetch_info("m-3-1-1").await;
        assert_eq!(info.as_deref(), Some("{\"cmi\":{\"score\":{}}}"));
    }

    #[tokio::test]
    async fn test_fetch_info_nonzero_ret_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Ajax/SCO.aspx"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ret": 8 })),
            )
            .mount(&server)
            .await;

        assert!(client(&server).fetch_info("m-3-1-1").await.is_none());
    }

    #[tokio::test]
    async fn test_activate_sends_class_and_tid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Ajax/SCO.aspx"))
            .and(body_string_contains("action=startsco160928"))
            .and(body_string_contains("classid=123456"))
            .and(body_string_contains("tid=-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ret": 0 })),
            )
            .mount(&server)
            .await;

        assert!(client(&server).activate("m-3-1-1").await);
    }

    #[tokio::test]
    async fn test_submit_carries_end_flag_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Ajax/SCO.aspx"))
            .and(body_string_contains("action=setscoinfo"))
            .and(body_string_contains("isend=true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ret": 110,
                "mess": "score locked"
            })))
            .mount(&server)
            .await;

        let reply = client(&server).submit("m-3-1-1", "{}[INTERACTIONINFO]").await;
        assert_eq!(reply.ret, 110);
        assert_eq!(reply.mess.as_deref(), Some("score locked"));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_per_call() {
        // Point at a closed port: fetch → None, activate → false, submit → err reply.
        let sco = ScoClient::with_endpoint(
            HttpClient::new(300),
            "http://127.0.0.1:1/Ajax/SCO.aspx".to_string(),
            "1".to_string(),
            "2".to_string(),
            "3".to_string(),
        );
        assert!(sco.fetch_info("m-3-1-1").await.is_none());
        assert!(!sco.activate("m-3-1-1").await);
        assert_eq!(sco.submit("m-3-1-1", "x").await.ret, -1);
    }
}
