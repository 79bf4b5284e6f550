//! Post command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::feed::compute_visible_posts;
use fooddeals_core::http::UploadFile;
use fooddeals_types::{Post, SortMode};

pub async fn list(api: &FoodDealsApi, sort: SortMode, search: &str) -> Result<()> {
    let posts = api.list_posts(sort).await.context("list posts")?;
    let visible = compute_visible_posts(&posts, &[], sort, search);
    if visible.is_empty() {
        println!("No posts found.");
        return Ok(());
    }
    for post in &visible {
        print_post(post);
    }
    Ok(())
}

pub async fn create(api: &FoodDealsApi, body: &str, image: Option<&Path>) -> Result<()> {
    let post = match image {
        Some(path) => {
            let file = UploadFile::from_path(path)?;
            api.create_post_with_image(body, file)
                .await
                .context("create post")?
        }
        None => api.create_post(body, None).await.context("create post")?,
    };
    println!("Created post #{}", post.id);
    print_post(&post);
    Ok(())
}

pub async fn like(api: &FoodDealsApi, id: i64) -> Result<()> {
    api.like_post(id)
        .await
        .with_context(|| format!("like post {id}"))?;
    println!("Liked post #{id}");
    Ok(())
}

pub async fn delete(api: &FoodDealsApi, id: i64) -> Result<()> {
    let status = api
        .delete_post(id)
        .await
        .with_context(|| format!("delete post {id}"))?;
    println!("{}", status.message());
    Ok(())
}

fn print_post(post: &Post) {
    println!("#{}  {} likes  {}", post.id, post.likes, post.body);
    if let Some(url) = post.image_url.as_deref() {
        println!("    image: {url}");
    }
}
