use anyhow::{Result, anyhow};
use cookbook_dal::{
    category::Category, comment::Comment, rating::RatingOutcome, recipe::Recipe, tag::Tag,
};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

async fn created<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    info!("Response: {:#?}", response);
    if response.status() != StatusCode::CREATED {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("Unexpected status {status}: {body}"));
    }
    Ok(response.json().await?)
}

pub async fn create_category(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
) -> Result<Category> {
    let api_url = base_url.join("api/category")?;
    let response = client
        .post(api_url)
        .json(&json!({"title": title}))
        .send()
        .await?;
    created(response).await
}

pub async fn create_tag(client: &reqwest::Client, base_url: &Url, title: &str) -> Result<Tag> {
    let api_url = base_url.join("api/tag")?;
    let response = client
        .post(api_url)
        .json(&json!({"title": title}))
        .send()
        .await?;
    created(response).await
}

pub async fn create_recipe(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    category_id: i64,
    tags: &[&str],
) -> Result<Recipe> {
    let api_url = base_url.join("api/recipe")?;
    let payload = json!({
        "title": title,
        "content": format!("How to cook {title}"),
        "category_id": category_id,
        "tags": tags,
    });
    let response = client.post(api_url).json(&payload).send().await?;
    created(response).await
}

pub async fn create_comment(
    client: &reqwest::Client,
    base_url: &Url,
    recipe_id: i64,
    content: &str,
) -> Result<Comment> {
    let api_url = base_url.join(&format!("api/recipe/{recipe_id}/comments"))?;
    let response = client
        .post(api_url)
        .json(&json!({"content": content}))
        .send()
        .await?;
    created(response).await
}

pub async fn rate_recipe(
    client: &reqwest::Client,
    base_url: &Url,
    recipe_id: i64,
    value: i64,
) -> Result<RatingOutcome> {
    let api_url = base_url.join(&format!("api/recipe/{recipe_id}/rating"))?;
    let response = client
        .put(api_url)
        .json(&json!({"value": value}))
        .send()
        .await?;
    info!("Response: {:#?}", response);
    if !response.status().is_success() {
        return Err(anyhow!("Rating failed with status {}", response.status()));
    }
    Ok(response.json().await?)
}
