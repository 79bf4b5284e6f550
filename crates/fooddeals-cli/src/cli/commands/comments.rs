//! Comment command handlers.

use anyhow::{Context, Result};
use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::feed::CommentThread;

pub async fn list(api: &FoodDealsApi, post_id: i64) -> Result<()> {
    let thread = CommentThread::load(api, post_id)
        .await
        .with_context(|| format!("load comments for post {post_id}"))?;
    let post = thread.post();
    println!("#{}  {} likes  {}", post.id, post.likes, post.body);

    let comments = thread.visible();
    if comments.is_empty() {
        println!("No comments yet.");
    }
    for comment in comments {
        println!("  - {}", comment.body);
    }
    Ok(())
}

pub async fn add(api: &FoodDealsApi, post_id: i64, body: &str) -> Result<()> {
    let comment = api
        .add_comment(post_id, body)
        .await
        .with_context(|| format!("comment on post {post_id}"))?;
    println!("Added comment #{} to post #{post_id}", comment.id);
    Ok(())
}
