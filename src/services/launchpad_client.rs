//! Launchpad API client.
//!
//! Provides an HTTP client for the Launchpad REST API (`/1.0`) with collection
//! pagination. Obtaining credentials is left to the caller: an already issued
//! `Authorization` header value can be supplied, otherwise requests are
//! anonymous, which is enough for public projects.

use crate::error::AppError;
use crate::models::bug::BugRecord;
use crate::models::project::ProjectRecord;
use crate::services::tracker::BugTracker;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Launchpad client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadClientConfig {
    /// API root (e.g., `https://api.launchpad.net/1.0`).
    pub base_url: String,

    /// Pre-issued `Authorization` header value.
    #[serde(skip_serializing)]
    pub authorization: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LaunchpadClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.launchpad.net/1.0".to_string(),
            authorization: None,
            timeout_secs: 30,
        }
    }
}

/// Paged collection envelope used by every Launchpad list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadCollection<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,

    /// Absolute link of the next page, if any.
    pub next_collection_link: Option<String>,

    pub total_size: Option<u32>,
}

/// Launchpad project from API.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadProject {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub self_link: String,
    pub active_milestones_collection_link: String,
    pub all_milestones_collection_link: String,
}

/// Launchpad milestone from API.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadMilestone {
    pub name: String,
    pub self_link: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Launchpad bug task from API (`searchTasks` entries).
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadBugTask {
    pub bug_link: String,
    #[serde(default)]
    pub title: String,
    pub status: String,
    pub importance: String,
    pub milestone_link: Option<String>,
    pub assignee_link: Option<String>,
    pub web_link: Option<String>,
    pub date_created: Option<String>,
    pub date_fix_committed: Option<String>,
    pub date_fix_released: Option<String>,
    /// Tags live on the bug, not the task; only present when expanded.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Launchpad API client.
#[derive(Debug, Clone)]
pub struct LaunchpadClient {
    client: Client,
    config: LaunchpadClientConfig,
}

impl LaunchpadClient {
    /// Create a new Launchpad client.
    pub fn new(config: LaunchpadClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        if let Some(auth) = &config.authorization {
            let value = header::HeaderValue::from_str(auth)
                .map_err(|_| AppError::authentication("Invalid authorization header format"))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build an absolute URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::authentication(
                "Launchpad rejected the supplied credentials",
            ));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match status {
            StatusCode::FORBIDDEN => "Access denied".to_string(),
            StatusCode::NOT_FOUND => "Resource not found".to_string(),
            // Launchpad reports errors as plain text bodies
            _ if !body.trim().is_empty() => body.trim().to_string(),
            _ => format!("Request failed ({})", status.as_u16()),
        };

        Err(AppError::tracker_api_full(message, status.as_u16(), endpoint))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self.client.get(url).query(query).send().await?;
        self.handle_response(response, url).await
    }

    /// Fetch every page of a collection, starting from `url`.
    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let mut page: LaunchpadCollection<T> = self.get_json(url, query).await?;
        let mut all = std::mem::take(&mut page.entries);
        let mut current = url.to_string();

        // Continuation links already carry the original query
        while let Some(next) = next_page_link(&current, page.next_collection_link.take()) {
            page = self.get_json(&next, &[]).await?;
            all.append(&mut page.entries);
            current = next;
        }

        Ok(all)
    }

    /// Get a project by name.
    pub async fn get_project(&self, name: &str) -> Result<LaunchpadProject, AppError> {
        let url = self.api_url(&urlencoding::encode(name));
        self.get_json(&url, &[]).await
    }

    /// Get every milestone of a project.
    pub async fn get_milestones(
        &self,
        project: &LaunchpadProject,
    ) -> Result<Vec<LaunchpadMilestone>, AppError> {
        self.get_collection(&project.all_milestones_collection_link, &[])
            .await
    }

    /// Get the milestones of a project that are still active.
    pub async fn get_active_milestones(
        &self,
        project: &LaunchpadProject,
    ) -> Result<Vec<LaunchpadMilestone>, AppError> {
        self.get_collection(&project.active_milestones_collection_link, &[])
            .await
    }

    /// Search a project's bug tasks by status and milestone.
    pub async fn search_project_tasks(
        &self,
        project_link: &str,
        statuses: &[String],
        milestone_links: &[String],
    ) -> Result<Vec<LaunchpadBugTask>, AppError> {
        let params = search_tasks_params(statuses, milestone_links);
        self.get_collection(project_link, &params).await
    }
}

/// The page to fetch after `current`. A link pointing back at `current` ends
/// the walk.
fn next_page_link(current: &str, next: Option<String>) -> Option<String> {
    match next {
        Some(link) if link == current => {
            log::warn!("Collection {} links to itself, stopping pagination", current);
            None
        }
        next => next,
    }
}

/// Query parameters of a `searchTasks` call; list arguments repeat the key.
fn search_tasks_params(statuses: &[String], milestone_links: &[String]) -> Vec<(&'static str, String)> {
    let mut params = vec![("ws.op", "searchTasks".to_string())];
    params.extend(statuses.iter().map(|s| ("status", s.clone())));
    params.extend(milestone_links.iter().map(|m| ("milestone", m.clone())));
    params
}

impl BugTracker for LaunchpadClient {
    async fn fetch_project(&self, name: &str) -> Result<ProjectRecord, AppError> {
        let project = self.get_project(name).await?;
        let milestones = self.get_milestones(&project).await?;
        let active = self.get_active_milestones(&project).await?;
        Ok(ProjectRecord::from_parts(project, milestones, active))
    }

    async fn search_tasks(
        &self,
        project: &ProjectRecord,
        statuses: &[String],
        milestone_links: &[String],
    ) -> Result<Vec<BugRecord>, AppError> {
        let tasks = self
            .search_project_tasks(&project.self_link, statuses, milestone_links)
            .await?;
        tasks.into_iter().map(BugRecord::try_from).collect()
    }
}
