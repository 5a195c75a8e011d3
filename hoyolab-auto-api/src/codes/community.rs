//! Community code source: HoYoLAB posts.
//!
//! Searches the community for Japanese "交換コード" posts, pulls each hit's
//! structured content and harvests every redemption link pointing at the
//! game's gift page. Post bodies are fetched concurrently under the
//! configured fan-out bound.

use std::sync::Arc;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::http;
use crate::types::{Envelope, Game};

const SEARCH_ENDPOINT: &str = "codes.community.search";
const POST_ENDPOINT: &str = "codes.community.post";

const SEARCH_KEYWORD: &str = "交換コード";
const PAGE_SIZE: u32 = 50;

#[derive(Deserialize)]
struct SearchData {
    #[serde(default)]
    list: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    post: PostId,
}

#[derive(Deserialize)]
struct PostId {
    post_id: String,
}

#[derive(Deserialize)]
struct PostData {
    post: PostOuter,
}

#[derive(Deserialize)]
struct PostOuter {
    post: PostInner,
}

#[derive(Deserialize)]
struct PostInner {
    #[serde(default)]
    structured_content: String,
}

/// One op in a post's structured content; only link attributes matter here.
#[derive(Deserialize)]
struct ContentOp {
    #[serde(default)]
    attributes: Option<ContentAttributes>,
}

#[derive(Deserialize)]
struct ContentAttributes {
    #[serde(default)]
    link: Option<String>,
}

/// Gift-page link pattern per game; the code is the single capture.
#[allow(clippy::unwrap_used)] // literal patterns, exercised by tests
fn redeem_link_regex(game: Game) -> Regex {
    match game {
        Game::Nap => Regex::new(
            r"^https?://zenless\.hoyoverse\.com/redemption(?:/m)?(?:/ja)?(?:/gift)?\?code=([^&]+)$",
        )
        .unwrap(),
        Game::Hkrpg => {
            Regex::new(r"^https?://hsr\.hoyoverse\.com(?:/m)?(?:/ja)?(?:/gift)?\?code=([^&]+)$")
                .unwrap()
        }
        _ => Regex::new(r"^https?://genshin\.hoyoverse\.com(?:/m)?(?:/ja)?(?:/gift)?\?code=([^&]+)$")
            .unwrap(),
    }
}

fn community_game_id(game: Game) -> u32 {
    match game {
        Game::Nap => 8,
        Game::Hkrpg => 6,
        _ => 2,
    }
}

/// Harvest codes from one post's structured content JSON.
fn codes_from_structured_content(content: &str, link_re: &Regex) -> Vec<String> {
    let Ok(ops) = serde_json::from_str::<Vec<ContentOp>>(content) else {
        // Posts sometimes carry non-array content; those carry no links.
        return Vec::new();
    };
    ops.into_iter()
        .filter_map(|op| op.attributes.and_then(|a| a.link))
        .filter_map(|link| {
            link_re
                .captures(&link)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

pub(super) async fn fetch(client: &Client, cfg: &ApiConfig, game: Game) -> Result<Vec<String>> {
    log::debug!("Searching codes from HoYoLAB community ...");

    let builder = client
        .get(&cfg.community_search_url)
        .header("User-Agent", &cfg.user_agent)
        .header("x-rpc-client_type", "4")
        .header("x-rpc-language", "ja-jp")
        .query(&[
            ("author_type", "0".to_string()),
            ("game_id", community_game_id(game).to_string()),
            ("is_all_game", "false".to_string()),
            ("keyword", SEARCH_KEYWORD.to_string()),
            ("order_type", "0".to_string()),
            ("page_num", "1".to_string()),
            ("page_size", PAGE_SIZE.to_string()),
            ("scene", "SCENE_GENERAL".to_string()),
        ]);

    let body = http::execute_with_retry(builder, SEARCH_ENDPOINT, cfg.retry_count).await?;
    let envelope: Envelope<SearchData> = http::parse_json(&body, SEARCH_ENDPOINT)?;
    if !(envelope.is_ok() && envelope.message == "OK") {
        return Err(ApiError::Backend {
            endpoint: SEARCH_ENDPOINT.to_string(),
            retcode: envelope.retcode,
            message: envelope.message,
        });
    }

    let post_ids: Vec<String> = envelope
        .data
        .map(|d| d.list)
        .unwrap_or_default()
        .into_iter()
        .map(|hit| hit.post.post_id)
        .collect();

    let semaphore = Arc::new(Semaphore::new(cfg.fetch_concurrency.max(1)));
    let fetches = post_ids.into_iter().map(|post_id| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.map_err(|_| ApiError::Network {
                endpoint: POST_ENDPOINT.to_string(),
                detail: "fetch pool closed".to_string(),
            })?;
            fetch_post(client, cfg, &post_id).await
        }
    });
    let contents = futures::future::try_join_all(fetches).await?;

    let link_re = redeem_link_regex(game);
    let mut codes: Vec<String> = contents
        .iter()
        .flat_map(|content| codes_from_structured_content(content, &link_re))
        .collect();
    codes.sort();
    codes.dedup();
    Ok(codes)
}

async fn fetch_post(client: &Client, cfg: &ApiConfig, post_id: &str) -> Result<String> {
    let builder = client
        .get(&cfg.community_post_url)
        .header("User-Agent", &cfg.user_agent)
        .header("x-rpc-client_type", "4")
        .header("x-rpc-language", "ja-jp")
        .query(&[("post_id", post_id)]);

    let body = http::execute_with_retry(builder, POST_ENDPOINT, cfg.retry_count).await?;
    let envelope: Envelope<PostData> = http::parse_json(&body, POST_ENDPOINT)?;
    if !(envelope.is_ok() && envelope.message == "OK") {
        return Err(ApiError::Backend {
            endpoint: POST_ENDPOINT.to_string(),
            retcode: envelope.retcode,
            message: envelope.message,
        });
    }
    Ok(envelope
        .data
        .map(|d| d.post.post.structured_content)
        .unwrap_or_default())
}
