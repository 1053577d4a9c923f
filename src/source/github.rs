use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::RepositorySource;
use crate::error::{BrowseError, Result};
use crate::repository::{EntryKind, FlatEntry, RepositoryRef};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Everything but RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encode each `/`-separated segment of `path`, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone)]
pub struct GitHubSourceConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GitHubSourceConfig {
    fn default() -> Self {
        GitHubSourceConfig {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: concat!("repopick/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<GitTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitTreeItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    sha: Option<String>,
}

impl GitTreeItem {
    /// `blob` and `tree` map to files and directories; submodule `commit`
    /// entries have no readable content and are skipped.
    fn into_entry(self) -> Option<FlatEntry> {
        let kind = match self.item_type.as_str() {
            "blob" => EntryKind::File,
            "tree" => EntryKind::Directory,
            _ => return None,
        };
        Some(FlatEntry {
            path: self.path,
            kind,
            sha: self.sha,
        })
    }
}

/// A `RepositorySource` backed by the GitHub REST API.
pub struct GitHubSource {
    client: Client,
    api_url: String,
}

impl GitHubSource {
    pub fn new(config: GitHubSourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| BrowseError::Network(format!("invalid user agent: {e}")))?,
        );
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| BrowseError::Auth("token contains invalid characters".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(client, config.api_url))
    }

    /// Create a source with a custom reqwest client.
    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn tree_url(&self, repo: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_url,
            encode_path(&repo.owner),
            encode_path(&repo.name),
            encode_path(&repo.branch)
        )
    }

    fn contents_url(&self, repo: &RepositoryRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_url,
            encode_path(&repo.owner),
            encode_path(&repo.name),
            encode_path(path),
            utf8_percent_encode(&repo.branch, COMPONENT)
        )
    }
}

/// Map a non-success status onto the browse error taxonomy.
fn status_error(status: StatusCode, what: &str) -> BrowseError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BrowseError::Auth(what.to_string()),
        StatusCode::NOT_FOUND => BrowseError::NotFound(what.to_string()),
        status => BrowseError::Network(format!("unexpected status code {status} for {what}")),
    }
}

impl RepositorySource for GitHubSource {
    async fn list_repository_tree(&self, repo: &RepositoryRef) -> Result<Vec<FlatEntry>> {
        let url = self.tree_url(repo);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &repo.id()));
        }

        let listing: GitTree = response
            .json()
            .await
            .map_err(|e| BrowseError::Decode(format!("tree listing for {}: {}", repo, e)))?;
        if listing.truncated {
            log::warn!("Tree listing for {} was truncated by the server", repo);
        }
        Ok(listing
            .tree
            .into_iter()
            .filter_map(GitTreeItem::into_entry)
            .collect())
    }

    async fn read_file(&self, repo: &RepositoryRef, path: &str) -> Result<String> {
        let url = self.contents_url(repo, path);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github.raw")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.text().await?),
            status => Err(status_error(status, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme", "flows", "main")
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Answer one connection per canned `(status line, body)` pair. The
    /// handle yields the request lines that were received.
    async fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..n]);
                }
                let request = String::from_utf8_lossy(&request);
                seen.push(request.lines().next().unwrap_or_default().to_string());
                let reply = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            seen
        });
        (base, handle)
    }

    #[test]
    fn encodes_reserved_characters_in_paths_and_refs() {
        let source = GitHubSource::with_client(Client::new(), DEFAULT_API_URL);
        let repo = RepositoryRef::new("acme", "flows", "feature/x&y");
        let url = source.contents_url(&repo, "docs/notes #1?.md");
        assert_eq!(
            url,
            "https://api.github.com/repos/acme/flows/contents/docs/notes%20%231%3F.md?ref=feature%2Fx%26y"
        );

        let request = Client::new().get(&url).build().unwrap();
        assert_eq!(
            request.url().path(),
            "/repos/acme/flows/contents/docs/notes%20%231%3F.md"
        );
        assert_eq!(request.url().query(), Some("ref=feature%2Fx%26y"));
        assert_eq!(request.url().fragment(), None);
        assert_eq!(
            source.tree_url(&repo),
            "https://api.github.com/repos/acme/flows/git/trees/feature/x%26y?recursive=1"
        );
    }

    #[tokio::test]
    async fn reads_raw_content_of_oddly_named_file() {
        let (base, server) = serve(vec![("200 OK", "%dw 2.0")]).await;
        let source = GitHubSource::with_client(local_client(), base);

        let content = source.read_file(&repo(), "src/notes #1?.dwl").await.unwrap();
        assert_eq!(content, "%dw 2.0");
        assert_eq!(
            server.await.unwrap(),
            vec!["GET /repos/acme/flows/contents/src/notes%20%231%3F.dwl?ref=main HTTP/1.1"]
        );
    }

    #[tokio::test]
    async fn missing_file_response_is_not_found() {
        let (base, server) = serve(vec![("404 Not Found", r#"{"message":"Not Found"}"#)]).await;
        let source = GitHubSource::with_client(local_client(), base);

        let err = source.read_file(&repo(), "gone.json").await.unwrap_err();
        assert_eq!(err, BrowseError::NotFound("gone.json".to_string()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejected_credentials_on_listing_are_auth_errors() {
        let (base, server) = serve(vec![("401 Unauthorized", r#"{"message":"Bad credentials"}"#)]).await;
        let source = GitHubSource::with_client(local_client(), base);

        let err = source.list_repository_tree(&repo()).await.unwrap_err();
        assert!(matches!(err, BrowseError::Auth(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn truncated_listing_still_returns_entries() {
        let body = r#"{"sha":"abc","truncated":true,"tree":[
            {"path":"api","type":"tree","sha":"t1"},
            {"path":"api/orders.raml","type":"blob","sha":"b1"}
        ]}"#;
        let (base, server) = serve(vec![("200 OK", body)]).await;
        let source = GitHubSource::with_client(local_client(), base);

        let entries = source.list_repository_tree(&repo()).await.unwrap();
        assert_eq!(
            entries,
            vec![
                FlatEntry::directory("api").with_sha("t1"),
                FlatEntry::file("api/orders.raml").with_sha("b1"),
            ]
        );
        assert_eq!(
            server.await.unwrap(),
            vec!["GET /repos/acme/flows/git/trees/main?recursive=1 HTTP/1.1"]
        );
    }

    #[test]
    fn builds_api_urls() {
        let source = GitHubSource::with_client(Client::new(), "https://ghe.example.com/api/v3/");
        let repo = RepositoryRef::new("acme", "flows", "develop");
        assert_eq!(
            source.tree_url(&repo),
            "https://ghe.example.com/api/v3/repos/acme/flows/git/trees/develop?recursive=1"
        );
        assert_eq!(
            source.contents_url(&repo, "/src/main.dwl"),
            "https://ghe.example.com/api/v3/repos/acme/flows/contents/src/main.dwl?ref=develop"
        );
    }

    #[test]
    fn decodes_tree_listing_and_skips_submodules() {
        let body = r#"{
            "sha": "abc",
            "truncated": false,
            "tree": [
                {"path": "src", "mode": "040000", "type": "tree", "sha": "t1"},
                {"path": "src/a.dwl", "mode": "100644", "type": "blob", "sha": "b1", "size": 10},
                {"path": "vendor/lib", "mode": "160000", "type": "commit", "sha": "c1"}
            ]
        }"#;
        let listing: GitTree = serde_json::from_str(body).unwrap();
        let entries: Vec<FlatEntry> = listing
            .tree
            .into_iter()
            .filter_map(GitTreeItem::into_entry)
            .collect();
        assert_eq!(
            entries,
            vec![
                FlatEntry::directory("src").with_sha("t1"),
                FlatEntry::file("src/a.dwl").with_sha("b1"),
            ]
        );
    }

    #[test]
    fn maps_statuses_to_error_kinds() {
        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, "x"), BrowseError::Auth(_)));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, "x"), BrowseError::Auth(_)));
        assert!(matches!(status_error(StatusCode::NOT_FOUND, "x"), BrowseError::NotFound(_)));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "x"),
            BrowseError::Network(_)
        ));
    }

    #[test]
    fn rejects_tokens_that_are_not_header_safe() {
        let config = GitHubSourceConfig {
            token: Some("bad\ntoken".to_string()),
            ..GitHubSourceConfig::default()
        };
        assert!(matches!(GitHubSource::new(config), Err(BrowseError::Auth(_))));
    }
}
