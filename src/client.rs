//! HTTP client for the TaskBees data API.

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::models::{
    Board, BoardSummary, ChangePassword, CreateBoard, CreateList, CreateTask, Credentials, List,
    LoginResponse, Task, UpdateBoard, UpdateList, UpdateProfile, UpdateTask, UpdateTaskPosition,
    User,
};
use crate::store::TaskStore;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a TaskBees service rooted at `base_url`, e.g.
/// `http://localhost:3000` or `https://example.org/bees`.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RestClient {
            http,
            base_url,
            token: None,
        }
    }

    /// Uses an existing session token instead of logging in.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(self.authed(builder)?.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        Self::check(self.authed(builder)?.send().await?).await?;
        Ok(())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.http.post(self.url("/register")).json(&body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Logs in and keeps the session token for later requests.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, ClientError> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.http.post(self.url("/login")).json(&body).send().await?;
        let login: LoginResponse = Self::check(response).await?.json().await?;
        debug!(user_id = login.user.id, "Logged in");
        self.token = Some(login.token);
        Ok(login.user)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.send_empty(self.http.post(self.url("/logout"))).await?;
        self.token = None;
        Ok(())
    }

    pub async fn update_profile(&self, username: &str) -> Result<User, ClientError> {
        let body = UpdateProfile {
            username: username.to_string(),
        };
        self.send_json(self.http.put(self.url("/profile")).json(&body))
            .await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ClientError> {
        let body = ChangePassword {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.send_empty(self.http.put(self.url("/password")).json(&body))
            .await
    }

    pub async fn boards(&self) -> Result<Vec<BoardSummary>, ClientError> {
        self.send_json(self.http.get(self.url("/boards"))).await
    }

    /// Boards whose name contains `query`, ignoring case.
    pub async fn search_boards(&self, query: &str) -> Result<Vec<BoardSummary>, ClientError> {
        let mut url =
            Url::parse(&self.url("/boards")).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", query);
        self.send_json(self.http.get(url)).await
    }

    pub async fn board(&self, board_id: i64) -> Result<Board, ClientError> {
        self.send_json(self.http.get(self.url(&format!("/boards/{board_id}"))))
            .await
    }

    pub async fn create_board(&self, name: &str) -> Result<Board, ClientError> {
        let body = CreateBoard {
            name: name.to_string(),
        };
        self.send_json(self.http.post(self.url("/boards")).json(&body))
            .await
    }

    pub async fn rename_board(&self, board_id: i64, name: &str) -> Result<Board, ClientError> {
        let body = UpdateBoard {
            name: name.to_string(),
        };
        self.send_json(
            self.http
                .put(self.url(&format!("/boards/{board_id}")))
                .json(&body),
        )
        .await
    }

    pub async fn delete_board(&self, board_id: i64) -> Result<(), ClientError> {
        self.send_empty(self.http.delete(self.url(&format!("/boards/{board_id}"))))
            .await
    }

    pub async fn create_list(&self, board_id: i64, title: &str, color: &str) -> Result<List, ClientError> {
        let body = CreateList {
            title: title.to_string(),
            color: color.to_string(),
        };
        self.send_json(
            self.http
                .post(self.url(&format!("/boards/{board_id}/lists")))
                .json(&body),
        )
        .await
    }

    pub async fn update_list(&self, list_id: i64, update: &UpdateList) -> Result<List, ClientError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/lists/{list_id}")))
                .json(update),
        )
        .await
    }

    pub async fn delete_list(&self, list_id: i64) -> Result<(), ClientError> {
        self.send_empty(self.http.delete(self.url(&format!("/lists/{list_id}"))))
            .await
    }

    pub async fn task(&self, task_id: i64) -> Result<Task, ClientError> {
        self.send_json(self.http.get(self.url(&format!("/tasks/{task_id}"))))
            .await
    }

    pub async fn update_task(&self, task_id: i64, update: &UpdateTask) -> Result<Task, ClientError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/tasks/{task_id}")))
                .json(update),
        )
        .await
    }
}

impl TaskStore for RestClient {
    async fn fetch_lists(&self, board_id: i64) -> Result<Vec<List>, ClientError> {
        self.send_json(self.http.get(self.url(&format!("/boards/{board_id}/lists"))))
            .await
    }

    async fn fetch_tasks(&self, list_id: i64) -> Result<Vec<Task>, ClientError> {
        self.send_json(self.http.get(self.url(&format!("/lists/{list_id}/tasks"))))
            .await
    }

    async fn update_task_position(
        &self,
        task_id: i64,
        position: i64,
        list_id: i64,
    ) -> Result<(), ClientError> {
        let body = UpdateTaskPosition { position, list_id };
        self.send_empty(
            self.http
                .put(self.url(&format!("/tasks/{task_id}/position")))
                .json(&body),
        )
        .await
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), ClientError> {
        self.send_empty(self.http.delete(self.url(&format!("/tasks/{task_id}"))))
            .await
    }

    async fn create_task(
        &self,
        list_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Task, ClientError> {
        let body = CreateTask {
            title: title.to_string(),
            description: description.to_string(),
        };
        self.send_json(
            self.http
                .post(self.url(&format!("/lists/{list_id}/tasks")))
                .json(&body),
        )
        .await
    }
}
