//! Post feed aggregation and view state.
//!
//! [`compute_visible_posts`] is the pure merge/de-duplicate/search step.
//! [`FeedView`] and [`CommentThread`] hold the client-side state around it,
//! keeping optimistic changes as explicit overrides instead of editing
//! server data in place.

use std::collections::{HashMap, HashSet};

use fooddeals_types::{Comment, Post, SortMode};

use crate::api::FoodDealsApi;
use crate::http::{RequestResult, UploadFile};

/// Merges server and locally-created posts into the displayed sequence.
///
/// - `Newest`: local posts come first, then server posts. Other modes show
///   server posts only, in server order.
/// - Each id appears once; the first occurrence wins, so a local post masks
///   its server copy.
/// - A blank `search_term` keeps everything; otherwise only posts whose body
///   contains the term (case-insensitive) remain, order preserved.
pub fn compute_visible_posts(
    server_posts: &[Post],
    local_posts: &[Post],
    sort_mode: SortMode,
    search_term: &str,
) -> Vec<Post> {
    let local: &[Post] = if sort_mode == SortMode::Newest {
        local_posts
    } else {
        &[]
    };

    let mut seen = HashSet::new();
    let unique = local
        .iter()
        .chain(server_posts)
        .filter(|post| seen.insert(post.id));

    if search_term.trim().is_empty() {
        return unique.cloned().collect();
    }

    let term = search_term.to_lowercase();
    unique
        .filter(|post| post.body.to_lowercase().contains(&term))
        .cloned()
        .collect()
}

/// State behind the post list.
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    server_posts: Vec<Post>,
    local_posts: Vec<Post>,
    sort_mode: SortMode,
    search_term: String,
    /// Likes recorded locally since the last fetch
    like_bumps: HashMap<i64, i64>,
    /// Posts deleted from this client
    hidden: HashSet<i64>,
}

impl FeedView {
    pub fn new(sort_mode: SortMode) -> Self {
        Self {
            sort_mode,
            ..Self::default()
        }
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Changes the ordering. Server posts must be refetched for it to apply.
    pub fn set_sort_mode(&mut self, sort_mode: SortMode) {
        self.sort_mode = sort_mode;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Replaces the server list; local like counts are superseded by it.
    pub fn replace_server_posts(&mut self, posts: Vec<Post>) {
        self.server_posts = posts;
        self.like_bumps.clear();
    }

    /// Surfaces a post created on this client ahead of the server list.
    pub fn add_local_post(&mut self, post: Post) {
        self.local_posts.insert(0, post);
    }

    pub fn record_like(&mut self, post_id: i64) {
        *self.like_bumps.entry(post_id).or_default() += 1;
    }

    pub fn hide_post(&mut self, post_id: i64) {
        self.hidden.insert(post_id);
    }

    /// Posts to display, with local overrides applied.
    pub fn visible(&self) -> Vec<Post> {
        compute_visible_posts(
            &self.server_posts,
            &self.local_posts,
            self.sort_mode,
            &self.search_term,
        )
        .into_iter()
        .filter(|post| !self.hidden.contains(&post.id))
        .map(|mut post| {
            if let Some(bump) = self.like_bumps.get(&post.id) {
                post.likes += bump;
            }
            post
        })
        .collect()
    }

    /// Fetches server posts for the current sort mode.
    ///
    /// # Errors
    /// Returns the request error; the previous list is kept.
    pub async fn refresh(&mut self, api: &FoodDealsApi) -> RequestResult<()> {
        let posts = api.list_posts(self.sort_mode).await?;
        self.replace_server_posts(posts);
        Ok(())
    }

    /// Creates a post and surfaces it immediately.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn publish(
        &mut self,
        api: &FoodDealsApi,
        body: &str,
        image: Option<UploadFile>,
    ) -> RequestResult<Post> {
        let post = match image {
            Some(image) => api.create_post_with_image(body, image).await?,
            None => api.create_post(body, None).await?,
        };
        self.add_local_post(post.clone());
        Ok(post)
    }

    /// Likes a post, bumping its count locally on success.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn like(&mut self, api: &FoodDealsApi, post_id: i64) -> RequestResult<()> {
        api.like_post(post_id).await?;
        self.record_like(post_id);
        Ok(())
    }

    /// Deletes a post and hides it locally on success.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn delete(&mut self, api: &FoodDealsApi, post_id: i64) -> RequestResult<()> {
        api.delete_post(post_id).await?;
        self.hide_post(post_id);
        Ok(())
    }
}

/// Comments of one post, with locally-submitted ones first.
#[derive(Debug, Clone)]
pub struct CommentThread {
    post: Post,
    fetched: Vec<Comment>,
    local: Vec<Comment>,
}

impl CommentThread {
    pub fn new(post: Post, fetched: Vec<Comment>) -> Self {
        Self {
            post,
            fetched,
            local: Vec::new(),
        }
    }

    /// Fetches the thread of `post_id`.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn load(api: &FoodDealsApi, post_id: i64) -> RequestResult<Self> {
        let thread = api.list_comments(post_id).await?;
        Ok(Self::new(thread.post, thread.comment))
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn add_local(&mut self, comment: Comment) {
        self.local.insert(0, comment);
    }

    /// Submits a comment and prepends it on success.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn submit(&mut self, api: &FoodDealsApi, body: &str) -> RequestResult<Comment> {
        let comment = api.add_comment(self.post.id, body).await?;
        self.add_local(comment.clone());
        Ok(comment)
    }

    /// Local comments (newest first) followed by fetched ones, unique by id.
    pub fn visible(&self) -> Vec<Comment> {
        let mut seen = HashSet::new();
        self.local
            .iter()
            .chain(&self.fetched)
            .filter(|comment| seen.insert(comment.id))
            .cloned()
            .collect()
    }
}
