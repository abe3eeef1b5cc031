use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::contact::Contact;

pub const DEFAULT_URL: &str = "https://api.brevo.com/v3/contacts";

/// Mailing-list provider which stores contacts on our behalf.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn create_contact(&self, api_key: &str, contact: &Contact) -> Result<UpstreamResponse>;
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct Brevo {
    client: Client,
    url: Url,
}

impl Brevo {
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder().user_agent("meeveem relay").build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl Upstream for Brevo {
    #[tracing::instrument(skip_all)]
    async fn create_contact(&self, api_key: &str, contact: &Contact) -> Result<UpstreamResponse> {
        let payload = CreateContact {
            email: &contact.email,
            attributes: Attributes {
                first_name: &contact.first_name,
                last_name: &contact.last_name,
            },
            list_ids: &contact.list_ids,
            update_enabled: true,
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!("Upstream answered with status {}", status);

        Ok(UpstreamResponse {
            status,
            body: parse_body(&body),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContact<'a> {
    email: &'a str,
    attributes: Attributes<'a>,
    list_ids: &'a [i64],
    update_enabled: bool,
}

#[derive(Serialize)]
struct Attributes<'a> {
    #[serde(rename = "FIRSTNAME")]
    first_name: &'a str,
    #[serde(rename = "LASTNAME")]
    last_name: &'a str,
}

fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(body)
        .unwrap_or_else(|_err| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::{
        body::Bytes,
        extract::Extension,
        http::{HeaderMap, StatusCode as AxumStatusCode},
        routing::post,
        Router, Server,
    };
    use parking_lot::Mutex;
    use serde_json::json;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn fake_brevo(status: u16, body: &'static str) -> (SocketAddr, Captured) {
        let captured = Captured::default();

        let router = Router::new()
            .route(
                "/v3/contacts",
                post(
                    move |headers: HeaderMap,
                          Extension(captured): Extension<Captured>,
                          payload: Bytes| async move {
                        let api_key = headers
                            .get("api-key")
                            .and_then(|val| val.to_str().ok())
                            .map(ToOwned::to_owned);

                        captured
                            .lock()
                            .push((api_key, serde_json::from_slice(&payload).unwrap()));

                        (AxumStatusCode::from_u16(status).unwrap(), body)
                    },
                ),
            )
            .layer(Extension(captured.clone()));

        let server = Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(router.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);

        (addr, captured)
    }

    fn contact() -> Contact {
        Contact {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            list_ids: vec![3, 5],
        }
    }

    #[tokio::test]
    async fn sends_upsert_with_api_key() {
        let (addr, captured) = fake_brevo(201, r#"{"id":42}"#).await;

        let brevo = Brevo::new(format!("http://{addr}/v3/contacts").parse().unwrap()).unwrap();

        let response = brevo.create_contact("secret", &contact()).await.unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, json!({ "id": 42 }));

        let captured = captured.lock();
        assert_eq!(captured.len(), 1);

        let (api_key, payload) = &captured[0];
        assert_eq!(api_key.as_deref(), Some("secret"));
        assert_eq!(
            *payload,
            json!({
                "email": "ada@example.com",
                "attributes": { "FIRSTNAME": "Ada", "LASTNAME": "Lovelace" },
                "listIds": [3, 5],
                "updateEnabled": true,
            })
        );
    }

    #[tokio::test]
    async fn empty_body_becomes_null() {
        let (addr, _captured) = fake_brevo(204, "").await;

        let brevo = Brevo::new(format!("http://{addr}/v3/contacts").parse().unwrap()).unwrap();

        let response = brevo.create_contact("secret", &contact()).await.unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.body, Value::Null);
    }

    #[tokio::test]
    async fn error_status_is_not_an_error() {
        let (addr, _captured) = fake_brevo(400, r#"{"code":"invalid_parameter"}"#).await;

        let brevo = Brevo::new(format!("http://{addr}/v3/contacts").parse().unwrap()).unwrap();

        let response = brevo.create_contact("secret", &contact()).await.unwrap();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, json!({ "code": "invalid_parameter" }));
    }

    #[test]
    fn keeps_non_json_bodies_as_text() {
        assert_eq!(parse_body(b"Bad Gateway"), json!("Bad Gateway"));
        assert_eq!(parse_body(b"  \n"), Value::Null);
    }
}
