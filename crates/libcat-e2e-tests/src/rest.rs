use anyhow::{Result, anyhow};
use libcat_dal::{author::Author, book::Book, genre::Genre};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

/// Posts a create payload and follows the post/redirect/get contract: the
/// handler answers 303 with the detail page in Location, which is then
/// fetched and decoded.
pub async fn create_record<T>(
    client: &reqwest::Client,
    base_url: &Url,
    path: &str,
    payload: &serde_json::Value,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let api_url = base_url.join(path)?;
    let response = client.post(api_url).json(payload).send().await?;
    info!("Create response: {:#?}", response);
    assert_eq!(303, response.status().as_u16());

    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow!("Missing Location header"))?;
    let detail_url = base_url.join(location)?;

    let response = client.get(detail_url).send().await?;
    assert!(response.status().is_success());
    Ok(response.json().await?)
}

pub async fn create_author(
    client: &reqwest::Client,
    base_url: &Url,
    last_name: &str,
    first_name: &str,
) -> Result<Author> {
    let payload = json!({"first_name": first_name, "last_name": last_name});
    create_record(client, base_url, "author/create", &payload).await
}

pub async fn create_genre(client: &reqwest::Client, base_url: &Url, name: &str) -> Result<Genre> {
    let payload = json!({"name": name});
    create_record(client, base_url, "genre/create", &payload).await
}

pub async fn create_book(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    author_id: Option<i64>,
    genres: &[i64],
) -> Result<Book> {
    let payload = json!({
        "title": title,
        "author_id": author_id,
        "summary": "A book for testing",
        "isbn": "9781234567897",
        "genres": genres,
    });
    create_record(client, base_url, "books/create", &payload).await
}
