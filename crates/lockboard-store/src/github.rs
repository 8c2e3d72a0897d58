//! GitHub contents API client for the single board file.
//!
//! - `GET  /repos/{owner}/{repo}/contents/{path}` → `{content, sha}` or 404
//! - `PUT  /repos/{owner}/{repo}/contents/{path}` with `{message, content, sha?}`
//! - `GET  /repos/{owner}/{repo}` as the credential probe
//!
//! The `sha` field is the revision tag: supplying it on PUT proves the
//! writer last read the version it is about to overwrite.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lockboard_core::config::RemoteConfig;

use crate::{BlobStore, RemoteBlob, StoreError};

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("lockboard/", env!("CARGO_PKG_VERSION"));

pub struct GitHubStore {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    path: String,
    commit_message: String,
    token: String,
}

impl GitHubStore {
    /// Build a client for the fixed repository/path in `remote`.
    ///
    /// An empty token is allowed for read-only access to public
    /// repositories; writes will be rejected by the remote.
    pub fn new(remote: &RemoteConfig, token: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_base: remote.api_base.trim_end_matches('/').to_string(),
            owner: remote.owner.clone(),
            repo: remote.repo.clone(),
            path: remote.path.clone(),
            commit_message: remote.commit_message.clone(),
            token: token.into(),
        })
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, self.path
        )
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("Accept", ACCEPT);
        if self.token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("token {}", self.token))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    /// Base64 file content; the API wraps it with embedded newlines.
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Decode the contents-API base64 payload (embedded newlines stripped).
fn decode_content(raw: &str) -> Result<String, StoreError> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Decode(format!("content is not valid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::Decode(format!("content is not valid UTF-8: {e}")))
}

async fn api_error(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&message) {
        Ok(body) => body.message,
        Err(_) => message.trim().to_string(),
    };
    StoreError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl BlobStore for GitHubStore {
    async fn read(&self) -> Result<Option<RemoteBlob>, StoreError> {
        let response = self
            .request(self.client.get(self.contents_url()))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(path = %self.path, "document not found on remote");
                Ok(None)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized {
                status: response.status().as_u16(),
            }),
            status if status.is_success() => {
                let body: ContentsResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Decode(format!("contents response: {e}")))?;
                let content = decode_content(&body.content)?;
                debug!(path = %self.path, revision = %body.sha, bytes = content.len(), "read blob");
                Ok(Some(RemoteBlob {
                    content,
                    revision: body.sha,
                }))
            }
            _ => Err(api_error(response).await),
        }
    }

    async fn write(
        &self,
        content: &str,
        expected_revision: Option<&str>,
    ) -> Result<(), StoreError> {
        let body = WriteRequest {
            message: &self.commit_message,
            content: BASE64.encode(content.as_bytes()),
            sha: expected_revision,
        };

        let response = self
            .request(self.client.put(self.contents_url()))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            // 409: sha mismatch. 422: missing sha for an existing file (a
            // create racing an earlier writer) — both are the precondition
            // failing.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                warn!(path = %self.path, expected = ?expected_revision, "write rejected: revision mismatch");
                Err(StoreError::Conflict)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized {
                status: response.status().as_u16(),
            }),
            status if status.is_success() => {
                debug!(path = %self.path, bytes = content.len(), "wrote blob");
                Ok(())
            }
            _ => Err(api_error(response).await),
        }
    }

    async fn verify_credential(&self) -> Result<bool, StoreError> {
        let response = self.request(self.client.get(self.repo_url())).send().await?;
        Ok(response.status().is_success())
    }
}

impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_content_strips_embedded_newlines() {
        // The contents API hard-wraps base64 at 60 columns.
        let encoded = BASE64.encode("salt:iv:ciphertext-goes-here");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        assert_eq!(
            decode_content(&wrapped).unwrap(),
            "salt:iv:ciphertext-goes-here"
        );
    }

    #[test]
    fn decode_content_rejects_invalid_base64() {
        assert!(matches!(
            decode_content("not base64!"),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn decode_content_rejects_non_utf8() {
        let encoded = BASE64.encode([0xFF, 0xFE, 0x00, 0x41]);
        assert!(matches!(
            decode_content(&encoded),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn contents_response_parses_api_shape() {
        let json = r#"{
            "name": "board.enc",
            "path": "data/board.enc",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "content": "c2FsdDppdjpjaXBoZXJ0ZXh0\n",
            "encoding": "base64"
        }"#;
        let parsed: ContentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.sha, "3d21ec53a331a6f037a91c368710b99387d012c1");
        assert_eq!(decode_content(&parsed.content).unwrap(), "salt:iv:ciphertext");
    }

    #[test]
    fn write_request_omits_sha_on_create() {
        let body = WriteRequest {
            message: "Update board data",
            content: BASE64.encode("payload"),
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());

        let body = WriteRequest {
            message: "Update board data",
            content: BASE64.encode("payload"),
            sha: Some("abc123"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sha"], "abc123");
    }

    #[test]
    fn debug_redacts_token() {
        let store = GitHubStore::new(&RemoteConfig::default(), "ghp_secret").unwrap();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("ghp_secret"));
    }
}
