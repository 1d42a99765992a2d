use crate::error::{Result, TmdbError};
use crate::models::{Actor, Movie};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::env;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Full URL for a TMDB image path (`size` is e.g. "w300" or "w500").
pub fn image_url(path: &str, size: &str) -> String {
    format!("{IMAGE_BASE}/{size}{path}")
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

/// One page per call, 1-based page numbers, the service's page size (20).
/// The client never deduplicates or filters; that is the caller's job.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn trending_movies(&self, page: u32) -> Result<Vec<Movie>>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>>;
    async fn search_people(&self, query: &str, page: u32) -> Result<Vec<Actor>>;
    async fn movie_details(&self, id: i32) -> Result<Movie>;
    async fn person_details(&self, id: i32) -> Result<Actor>;
    async fn person_movie_credits(&self, id: i32) -> Result<Vec<Movie>>;
}

impl TmdbClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound {
                what: what.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TmdbError::Status {
                code: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| TmdbError::Decode {
            context: format!("{what}: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PageResponse<T> {
    // `default = "Vec::new"` keeps the derive from demanding `T: Default`.
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MovieCredits {
    #[serde(default)]
    cast: Vec<Movie>,
}

#[async_trait]
impl MetadataApi for TmdbClient {
    async fn trending_movies(&self, page: u32) -> Result<Vec<Movie>> {
        let url = format!(
            "{TMDB_BASE}/trending/movie/week?page={page}&api_key={}",
            self.api_key
        );
        let data: PageResponse<Movie> = self.get_json(&url, "trending movies").await?;
        Ok(data.results)
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>> {
        let url = format!(
            "{TMDB_BASE}/search/movie?query={}&page={page}&api_key={}",
            urlencoding::encode(query),
            self.api_key
        );
        let data: PageResponse<Movie> = self.get_json(&url, "movie search").await?;
        Ok(data.results)
    }

    async fn search_people(&self, query: &str, page: u32) -> Result<Vec<Actor>> {
        let url = format!(
            "{TMDB_BASE}/search/person?query={}&page={page}&api_key={}",
            urlencoding::encode(query),
            self.api_key
        );
        let data: PageResponse<Actor> = self.get_json(&url, "person search").await?;
        Ok(data.results)
    }

    async fn movie_details(&self, id: i32) -> Result<Movie> {
        let url = format!(
            "{TMDB_BASE}/movie/{id}?append_to_response=credits&api_key={}",
            self.api_key
        );
        self.get_json(&url, &format!("movie {id}")).await
    }

    async fn person_details(&self, id: i32) -> Result<Actor> {
        let url = format!("{TMDB_BASE}/person/{id}?api_key={}", self.api_key);
        self.get_json(&url, &format!("person {id}")).await
    }

    async fn person_movie_credits(&self, id: i32) -> Result<Vec<Movie>> {
        let url = format!(
            "{TMDB_BASE}/person/{id}/movie_credits?api_key={}",
            self.api_key
        );
        let data: MovieCredits = self
            .get_json(&url, &format!("credits for person {id}"))
            .await?;
        Ok(data.cast)
    }
}
