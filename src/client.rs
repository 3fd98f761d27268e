//! This module provides a client for the scheduling backend's REST API

use std::error::Error;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::assignment::{Assignment, AssignmentPatch};
use crate::event::{Event, EventPatch, NewEvent};
use crate::item::Interval;
use crate::task::{NewTask, Task, TaskPatch};
use crate::traits::{EditSink, EntitySource};

/// Error body the backend returns on rejected requests
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// A stateless REST client scoped to one backend and one bearer token.
///
/// The token is owned by the client (and thus by the session holding it), not
/// by any global; tearing the session down drops it.
pub struct RestClient {
    base_url: Url,
    token: String,
    http: reqwest::Client,
}

impl RestClient {
    /// Create a client. This does not start a connection.
    pub fn new<S: AsRef<str>, T: ToString>(base_url: S, token: T) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            token: token.to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Box<dyn Error>> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>, Box<dyn Error>> {
        let mut url = self.endpoint(path)?;
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }

        let response = self.http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?} for {}", response.status(), url).into());
        }
        Ok(response.json().await?)
    }

    /// Send a body-carrying request and surface the server's message on
    /// rejection, so that a failed mutation can be shown to the user.
    async fn send_json<B: Serialize, T: DeserializeOwned>(&self, method: Method, path: &str, body: &B) -> Result<T, Box<dyn Error>> {
        let url = self.endpoint(path)?;
        let response = self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let response = Self::rejection_to_error(response).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<(), Box<dyn Error>> {
        let url = self.endpoint(path)?;
        let response = self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::rejection_to_error(response).await?;
        Ok(())
    }

    async fn send_patch<B: Serialize>(&self, path: &str, body: &B) -> Result<(), Box<dyn Error>> {
        let url = self.endpoint(path)?;
        let response = self.http
            .put(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::rejection_to_error(response).await?;
        Ok(())
    }

    async fn rejection_to_error(response: reqwest::Response) -> Result<reqwest::Response, Box<dyn Error>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .map(|body| body.message)
            .unwrap_or(raw);
        if message.is_empty() {
            Err(format!("The server rejected the request ({})", status).into())
        } else {
            Err(format!("The server rejected the request ({}): {}", status, message).into())
        }
    }
}

#[async_trait]
impl EntitySource for RestClient {
    async fn team_tasks(&self, team_id: u64) -> Result<Vec<Task>, Box<dyn Error>> {
        self.get_list("/api/tasks", &[("teamId", team_id.to_string())]).await
    }

    async fn assigned_tasks(&self, assignee_id: u64) -> Result<Vec<Task>, Box<dyn Error>> {
        self.get_list("/api/tasks", &[("assigneeId", assignee_id.to_string())]).await
    }

    async fn team_events(&self, team_id: u64) -> Result<Vec<Event>, Box<dyn Error>> {
        self.get_list("/api/events", &[("teamId", team_id.to_string())]).await
    }

    async fn user_events(&self, owner_id: u64) -> Result<Vec<Event>, Box<dyn Error>> {
        self.get_list("/api/events", &[("ownerId", owner_id.to_string())]).await
    }

    async fn team_assignments(&self, team_id: u64, window: Interval) -> Result<Vec<Assignment>, Box<dyn Error>> {
        self.get_list("/api/assignments", &[
            ("teamId", team_id.to_string()),
            ("from", window.start().to_rfc3339()),
            ("to", window.end().to_rfc3339()),
        ]).await
    }
}

#[async_trait]
impl EditSink for RestClient {
    async fn patch_task(&self, id: u64, patch: TaskPatch) -> Result<(), Box<dyn Error>> {
        self.send_patch(&format!("/api/tasks/{}", id), &patch).await
    }

    async fn patch_event(&self, id: u64, patch: EventPatch) -> Result<(), Box<dyn Error>> {
        self.send_patch(&format!("/api/events/{}", id), &patch).await
    }

    async fn patch_assignment(&self, id: u64, patch: AssignmentPatch) -> Result<(), Box<dyn Error>> {
        self.send_patch(&format!("/api/assignments/{}", id), &patch).await
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, Box<dyn Error>> {
        self.send_json(Method::POST, "/api/tasks", &task).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, Box<dyn Error>> {
        self.send_json(Method::POST, "/api/events", &event).await
    }

    async fn delete_task(&self, id: u64) -> Result<(), Box<dyn Error>> {
        self.send_empty(Method::DELETE, &format!("/api/tasks/{}", id)).await
    }

    async fn delete_event(&self, id: u64) -> Result<(), Box<dyn Error>> {
        self.send_empty(Method::DELETE, &format!("/api/events/{}", id)).await
    }
}
