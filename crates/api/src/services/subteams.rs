//! Organization subteam directory.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::services::RemoteError;

/// Lists the team slugs inside an organization.
#[async_trait::async_trait]
pub trait SubteamDirectory: Send + Sync {
    async fn subteam_slugs(&self, org: &str) -> Result<Vec<String>, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct SubteamsResponse {
    slugs: Vec<String>,
}

/// Reads subteams from `{webapp_url}/api/organizations/{org}/subteams`.
#[derive(Debug, Clone)]
pub struct HttpSubteamDirectory {
    client: Client,
    webapp_url: String,
}

impl HttpSubteamDirectory {
    pub fn new(client: Client, webapp_url: &str) -> Self {
        Self {
            client,
            webapp_url: webapp_url.trim_end_matches('/').to_string(),
        }
    }

    fn subteams_url(&self, org: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.webapp_url)?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::NotConfigured("Web app URL"))?
            .pop_if_empty()
            .extend(["api", "organizations", org, "subteams"]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SubteamDirectory for HttpSubteamDirectory {
    async fn subteam_slugs(&self, org: &str) -> Result<Vec<String>, RemoteError> {
        let url = self.subteams_url(org)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let body: SubteamsResponse = response.json().await?;
        Ok(body.slugs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn subteams_router() -> Router {
        Router::new().route(
            "/api/organizations/:org/subteams",
            get(|Path(org): Path<String>| async move {
                match org.as_str() {
                    "acme" => Ok(Json(json!({ "slugs": ["sales", "support"] }))),
                    "broken" => Ok(Json(json!({ "teams": [] }))),
                    _ => Err(StatusCode::NOT_FOUND),
                }
            }),
        )
    }

    #[test]
    fn test_subteams_url() {
        let directory = HttpSubteamDirectory::new(Client::new(), "https://app.cal.test/");
        assert_eq!(
            directory.subteams_url("acme").unwrap().as_str(),
            "https://app.cal.test/api/organizations/acme/subteams"
        );
    }

    #[test]
    fn test_subteams_url_escapes_org() {
        let directory = HttpSubteamDirectory::new(Client::new(), "https://app.cal.test");
        assert_eq!(
            directory.subteams_url("a/b").unwrap().as_str(),
            "https://app.cal.test/api/organizations/a%2Fb/subteams"
        );
    }

    #[tokio::test]
    async fn test_fetches_slugs() {
        let base = spawn(subteams_router()).await;
        let directory = HttpSubteamDirectory::new(Client::new(), &base);

        let slugs = directory.subteam_slugs("acme").await.unwrap();
        assert_eq!(slugs, vec!["sales".to_string(), "support".to_string()]);
    }

    #[tokio::test]
    async fn test_non_success_is_error() {
        let base = spawn(subteams_router()).await;
        let directory = HttpSubteamDirectory::new(Client::new(), &base);

        assert!(matches!(
            directory.subteam_slugs("unknown").await,
            Err(RemoteError::Status(404))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let base = spawn(subteams_router()).await;
        let directory = HttpSubteamDirectory::new(Client::new(), &base);

        assert!(matches!(
            directory.subteam_slugs("broken").await,
            Err(RemoteError::Http(_))
        ));
    }
}
