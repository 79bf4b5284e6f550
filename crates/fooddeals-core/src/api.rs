//! Typed surface over the FoodDeals HTTP API.
//!
//! One method per remote operation. Methods shape requests and update the
//! session where the operation implies it (sign-in, account deletion); all
//! transport concerns live in [`ApiClient`].

use std::sync::Arc;

use anyhow::Result;
use fooddeals_types::{
    AuthResponse, BatchPredictions, Comment, LikeReceipt, Post, PostWithComments,
    PredictionResult, SortMode, StatusResponse, UploadReceipt, UserProfile,
};
use serde_json::json;

use crate::config::{Config, paths};
use crate::http::{ApiClient, ApiRequest, RequestError, RequestResult, UploadFile};
use crate::session::{CookieVault, FileTokenStorage, TokenStore};

/// Client for every remote operation.
#[derive(Debug)]
pub struct FoodDealsApi {
    client: ApiClient,
    config: Config,
}

impl FoodDealsApi {
    pub fn new(client: ApiClient, config: Config) -> Self {
        Self { client, config }
    }

    /// Opens the persisted session under `$FOODDEALS_HOME` and builds a client.
    ///
    /// # Errors
    /// Returns an error if the session or cookie files are unreadable, or
    /// the configured base URL is invalid.
    pub fn open(config: Config) -> Result<Self> {
        let tokens = Arc::new(TokenStore::load(FileTokenStorage::new(
            paths::session_path(),
        ))?);
        let cookies = Arc::new(CookieVault::load(paths::cookies_path())?);
        let client = ApiClient::from_config(&config, tokens, cookies)?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.client.token_store()
    }

    /// Public URL of an uploaded file.
    pub fn static_file_url(&self, filename: &str) -> String {
        self.config.static_file_url(self.client.base_url(), filename)
    }

    // ---------------------------------------------------------------------
    // Account
    // ---------------------------------------------------------------------

    /// Creates an account and signs in with the returned token.
    ///
    /// # Errors
    /// Returns a validation error for blank credentials, else the request error.
    pub async fn register(&self, email: &str, password: &str) -> RequestResult<AuthResponse> {
        validate_credentials(email, password)?;
        let response: AuthResponse = self
            .client
            .request(
                ApiRequest::post("/register")
                    .json(json!({ "email": email.trim(), "password": password })),
            )
            .await?;
        self.adopt_token(&response);
        Ok(response)
    }

    /// Signs in and stores the returned token.
    ///
    /// # Errors
    /// Returns a validation error for blank credentials, else the request error.
    pub async fn login(&self, email: &str, password: &str) -> RequestResult<AuthResponse> {
        validate_credentials(email, password)?;
        let response: AuthResponse = self
            .client
            .request(
                ApiRequest::post("/login")
                    .json(json!({ "email": email.trim(), "password": password })),
            )
            .await?;
        self.adopt_token(&response);
        Ok(response)
    }

    /// Forgets the local session (token and refresh cookie).
    ///
    /// # Errors
    /// Returns an error if the cookie jar cannot be rewritten.
    pub fn logout(&self) -> Result<()> {
        self.tokens().clear();
        self.client.cookie_vault().clear()
    }

    /// Profile of the signed-in user.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn fetch_profile(&self) -> RequestResult<UserProfile> {
        self.client.request(ApiRequest::get("/myemail")).await
    }

    /// Profile for a caller-supplied token (no silent refresh).
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn fetch_profile_with(&self, token: &str) -> RequestResult<UserProfile> {
        self.client
            .request(ApiRequest::get("/myemail").with_token(token))
            .await
    }

    /// # Errors
    /// Returns a validation error for a blank email, else the request error.
    pub async fn request_password_reset(&self, email: &str) -> RequestResult<StatusResponse> {
        if email.trim().is_empty() {
            return Err(RequestError::validation("Email is required"));
        }
        self.client
            .request(ApiRequest::post("/password/forgot").json(json!({ "email": email.trim() })))
            .await
    }

    /// # Errors
    /// Returns a validation error for blank inputs, else the request error.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> RequestResult<StatusResponse> {
        if token.trim().is_empty() {
            return Err(RequestError::validation("Reset token is required"));
        }
        if new_password.is_empty() {
            return Err(RequestError::validation("New password is required"));
        }
        self.client
            .request(
                ApiRequest::post("/password/reset")
                    .json(json!({ "token": token.trim(), "new_password": new_password })),
            )
            .await
    }

    /// Deletes the account and signs out.
    ///
    /// # Errors
    /// Returns the request error; the session is kept in that case.
    pub async fn delete_account(&self) -> RequestResult<StatusResponse> {
        let status: StatusResponse = self.client.request(ApiRequest::delete("/delete")).await?;
        self.tokens().clear();
        if let Err(err) = self.client.cookie_vault().clear() {
            tracing::warn!(error = %format!("{err:#}"), "failed to clear cookies");
        }
        Ok(status)
    }

    // ---------------------------------------------------------------------
    // Posts and comments
    // ---------------------------------------------------------------------

    /// # Errors
    /// Returns the request error.
    pub async fn list_posts(&self, sort: SortMode) -> RequestResult<Vec<Post>> {
        self.client
            .request(ApiRequest::get(format!("/posts?sorting={}", sort.as_query())))
            .await
    }

    /// # Errors
    /// Returns a validation error for a blank body, else the request error.
    pub async fn create_post(&self, body: &str, image_url: Option<&str>) -> RequestResult<Post> {
        if body.trim().is_empty() {
            return Err(RequestError::validation("Post body cannot be empty"));
        }
        let mut payload = json!({ "body": body });
        if let Some(url) = image_url {
            payload["image_url"] = json!(url);
        }
        self.client
            .request(ApiRequest::post("/post").json(payload))
            .await
    }

    /// Uploads `image`, then creates a post pointing at it.
    ///
    /// The image URL is the receipt's `file_url` when present, otherwise
    /// the uploaded filename under the configured static path.
    ///
    /// # Errors
    /// Returns the first failing request's error.
    pub async fn create_post_with_image(
        &self,
        body: &str,
        image: UploadFile,
    ) -> RequestResult<Post> {
        if body.trim().is_empty() {
            return Err(RequestError::validation("Post body cannot be empty"));
        }
        let receipt = self.upload_file(image).await?;
        let image_url = match (receipt.file_url, receipt.filename) {
            (Some(url), _) => url,
            (None, Some(filename)) => self.static_file_url(&filename),
            (None, None) => {
                return Err(RequestError::parse("upload receipt carried no filename"));
            }
        };
        self.create_post(body, Some(&image_url)).await
    }

    /// # Errors
    /// Returns the request error.
    pub async fn like_post(&self, post_id: i64) -> RequestResult<LikeReceipt> {
        self.client
            .request(ApiRequest::post("/like").json(json!({ "post_id": post_id })))
            .await
    }

    /// # Errors
    /// Returns the request error.
    pub async fn list_comments(&self, post_id: i64) -> RequestResult<PostWithComments> {
        self.client
            .request(ApiRequest::get(format!("/post/{post_id}/comments")))
            .await
    }

    /// # Errors
    /// Returns a validation error for a blank body, else the request error.
    pub async fn add_comment(&self, post_id: i64, body: &str) -> RequestResult<Comment> {
        if body.trim().is_empty() {
            return Err(RequestError::validation("Comment cannot be empty"));
        }
        self.client
            .request(
                ApiRequest::post("/comment").json(json!({ "post_id": post_id, "body": body })),
            )
            .await
    }

    /// # Errors
    /// Returns the request error.
    pub async fn delete_post(&self, post_id: i64) -> RequestResult<StatusResponse> {
        self.client
            .request(ApiRequest::delete(format!("/post/{post_id}")))
            .await
    }

    // ---------------------------------------------------------------------
    // Food vision and uploads
    // ---------------------------------------------------------------------

    /// # Errors
    /// Returns the request error.
    pub async fn classify_image(&self, file: UploadFile) -> RequestResult<PredictionResult> {
        self.client
            .request(ApiRequest::post("/food-vision/predict").multipart(vec![("file".into(), file)]))
            .await
    }

    /// # Errors
    /// Returns a validation error when `files` is empty, else the request error.
    pub async fn classify_images_batch(
        &self,
        files: Vec<UploadFile>,
    ) -> RequestResult<BatchPredictions> {
        if files.is_empty() {
            return Err(RequestError::validation("Select at least one image"));
        }
        let parts = files.into_iter().map(|f| ("files".to_string(), f)).collect();
        self.client
            .request(ApiRequest::post("/food-vision/predict-batch").multipart(parts))
            .await
    }

    /// # Errors
    /// Returns the request error.
    pub async fn classify_images_zip(&self, archive: UploadFile) -> RequestResult<BatchPredictions> {
        self.client
            .request(
                ApiRequest::post("/food-vision/predict-zip")
                    .multipart(vec![("file".into(), archive)]),
            )
            .await
    }

    /// # Errors
    /// Returns the request error.
    pub async fn upload_file(&self, file: UploadFile) -> RequestResult<UploadReceipt> {
        self.client
            .request(ApiRequest::post("/upload").multipart(vec![("file".into(), file)]))
            .await
    }

    fn adopt_token(&self, response: &AuthResponse) {
        if let Some(token) = &response.access_token {
            self.tokens().set(Some(token.clone()));
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> RequestResult<()> {
    if email.trim().is_empty() {
        return Err(RequestError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(RequestError::validation("Password is required"));
    }
    Ok(())
}
