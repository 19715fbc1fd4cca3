//! In-process stand-in for the mangadex API.
//!
//! Binds an axum server on a random local port and records every request it
//! receives, so tests can assert on the exact wire format the client sends.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use dexapi::{ClientConfigBuilder, DexClient};
use serde_json::{json, Value};

pub const USERNAME: &str = "u";
pub const PASSWORD: &str = "p";
pub const MANGA_TOTAL: usize = 5;
pub const CHAPTER_TOTAL: usize = 3;
/// Logins with this username and `manga/slow` answer after [`SLOW_DELAY`].
pub const SLOW_USERNAME: &str = "slow";
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
pub struct MockState {
    requests: Mutex<Vec<Recorded>>,
    /// `(session, refresh)` currently accepted.
    tokens: Mutex<Option<(String, String)>>,
    issued: AtomicUsize,
    pub fail_logout: AtomicBool,
    base_url: OnceLock<String>,
}

pub struct MockDex {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockDex {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(MockState::default());
        state.base_url.set(base_url.clone()).unwrap();

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    pub fn client(&self) -> DexClient {
        let config = ClientConfigBuilder::default()
            .base_url(&self.base_url)
            .build()
            .unwrap();
        DexClient::with_config(config).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Last request received on `path`.
    pub fn last(&self, path: &str) -> Recorded {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.path == path)
            .unwrap_or_else(|| panic!("no request on {path}"))
    }

    /// Forgets every issued token, as if the session expired server side.
    pub fn expire_tokens(&self) {
        *self.state.tokens.lock().unwrap() = None;
    }

    pub fn fail_logout(&self) {
        self.state.fail_logout.store(true, Ordering::SeqCst);
    }
}

fn ok(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn error(status: StatusCode, title: &str, detail: &str) -> Response {
    let body = json!({
        "result": "error",
        "errors": [{
            "id": "00000000-0000-0000-0000-000000000000",
            "status": status.as_u16(),
            "title": title,
            "detail": detail,
        }],
    });
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    error(
        StatusCode::UNAUTHORIZED,
        "unauthorized_http_exception",
        "You need to be logged in",
    )
}

fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| s.replace("%5B", "[").replace("%5D", "]");
            (decode(k), decode(v))
        })
        .collect()
}

fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn manga(id: &str, with_author: bool) -> Value {
    let author = if with_author {
        json!({"id": "author-0", "type": "author", "attributes": {"name": "Author"}})
    } else {
        json!({"id": "author-0", "type": "author"})
    };
    json!({
        "id": id,
        "type": "manga",
        "attributes": {
            "title": {"en": format!("Title of {id}")},
            "altTitles": [],
            "description": [],
            "isLocked": false,
            "links": null,
            "originalLanguage": "ja",
            "status": "ongoing",
            "year": 2020,
            "contentRating": "safe",
            "tags": [],
            "version": 1,
            "createdAt": "2021-01-01T00:00:00+00:00",
            "updatedAt": "2021-01-01T00:00:00+00:00"
        },
        "relationships": [author]
    })
}

fn chapter(n: usize) -> Value {
    json!({
        "id": format!("chapter-{n}"),
        "type": "chapter",
        "attributes": {
            "title": null,
            "volume": "1",
            "chapter": (n + 1).to_string(),
            "pages": 3,
            "translatedLanguage": "en",
            "version": 1,
            "publishAt": "2021-01-01T00:00:00+00:00"
        },
        "relationships": [{"id": "manga-0", "type": "manga"}]
    })
}

fn user(id: &str) -> Value {
    json!({
        "id": id,
        "type": "user",
        "attributes": {"username": USERNAME, "roles": ["ROLE_MEMBER"], "version": 1},
        "relationships": []
    })
}

fn group(n: usize) -> Value {
    json!({
        "id": format!("group-{n}"),
        "type": "scanlation_group",
        "attributes": {"name": format!("Group {n}"), "official": false, "inactive": false, "version": 1}
    })
}

/// Collection envelope honoring `limit` and `offset`.
fn collection(query: &[(String, String)], total: usize, item: impl Fn(usize) -> Value) -> Response {
    let limit = query_value(query, "limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10usize);
    let offset = query_value(query, "offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0usize);
    if limit > 100 {
        return error(
            StatusCode::BAD_REQUEST,
            "validation_exception",
            "Error validating /limit: Must be at most 100",
        );
    }
    let data: Vec<Value> = (offset..total).take(limit).map(item).collect();
    ok(json!({
        "result": "ok",
        "response": "collection",
        "data": data,
        "limit": limit,
        "offset": offset,
        "total": total,
    }))
}

impl MockState {
    fn issue_tokens(&self) -> Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let session = format!("session-{n}");
        let refresh = format!("refresh-{n}");
        *self.tokens.lock().unwrap() = Some((session.clone(), refresh.clone()));
        json!({"result": "ok", "token": {"session": session, "refresh": refresh}})
    }

    fn is_authenticated(&self, authorization: Option<&str>) -> bool {
        match (&*self.tokens.lock().unwrap(), authorization) {
            (Some((session, _)), Some(header)) => header == format!("Bearer {session}"),
            _ => false,
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body = String::from_utf8_lossy(&body).into_owned();
    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(ToString::to_string),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let query = query_pairs(&uri);
    let json_body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let authenticated = state.is_authenticated(authorization.as_deref());
    let path = uri.path().trim_start_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "login"]) if json_body["username"] == SLOW_USERNAME => {
            tokio::time::sleep(SLOW_DELAY).await;
            ok(state.issue_tokens())
        }
        ("POST", ["auth", "login"]) => {
            if json_body["username"] == USERNAME && json_body["password"] == PASSWORD {
                ok(state.issue_tokens())
            } else {
                error(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized_http_exception",
                    "User / Password does not match",
                )
            }
        }
        ("POST", ["auth", "refresh"]) => {
            let current = state
                .tokens
                .lock()
                .unwrap()
                .as_ref()
                .map(|(_, refresh)| refresh.clone());
            match (current, json_body["token"].as_str()) {
                (Some(current), Some(token)) if current == token => ok(state.issue_tokens()),
                _ => error(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized_http_exception",
                    "Token expired",
                ),
            }
        }
        ("POST", ["auth", "logout"]) => {
            if state.fail_logout.load(Ordering::SeqCst) {
                error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Logout is unavailable",
                )
            } else {
                *state.tokens.lock().unwrap() = None;
                ok(json!({"result": "ok"}))
            }
        }
        ("GET", ["auth", "check"]) => {
            if authenticated {
                ok(json!({
                    "result": "ok",
                    "isAuthenticated": true,
                    "roles": ["ROLE_MEMBER", "IS_JWT_AUTHENTICATED"],
                    "permissions": ["manga.view", "chapter.view", "user.list"]
                }))
            } else {
                ok(json!({
                    "result": "ok",
                    "isAuthenticated": false,
                    "roles": ["ROLE_GUEST"],
                    "permissions": ["manga.view"]
                }))
            }
        }
        ("GET", ["user", "me"]) if !authenticated => unauthorized(),
        ("GET", ["user", "me"]) => ok(json!({"result": "ok", "response": "entity", "data": user("user-me")})),
        ("GET", ["user", "follows", "manga", "feed"]) if authenticated => {
            collection(&query, CHAPTER_TOTAL, chapter)
        }
        ("GET", ["user", "follows", "manga"]) if authenticated => {
            collection(&query, MANGA_TOTAL, |n| manga(&format!("manga-{n}"), false))
        }
        ("GET", ["user", "follows", "group"]) if authenticated => collection(&query, 2, group),
        ("GET", ["user", "follows", ..]) => unauthorized(),
        ("GET", ["user", id]) => ok(json!({"result": "ok", "response": "entity", "data": user(id)})),
        ("GET", ["manga"]) => {
            let with_author = query
                .iter()
                .any(|(k, v)| k == "includes[]" && v == "author");
            collection(&query, MANGA_TOTAL, |n| {
                manga(&format!("manga-{n}"), with_author)
            })
        }
        ("POST", ["manga"]) if !authenticated => unauthorized(),
        ("POST", ["manga"]) => {
            let mut created = manga("manga-new", false);
            created["attributes"]["title"] = json_body["title"].clone();
            ok(json!({"result": "ok", "response": "entity", "data": created}))
        }
        ("GET", ["manga", "status"]) if !authenticated => unauthorized(),
        ("GET", ["manga", "status"]) => ok(json!({
            "result": "ok",
            "statuses": {"manga-0": "reading", "manga-1": "completed"}
        })),
        (_, ["manga", "missing", ..]) => error(
            StatusCode::NOT_FOUND,
            "not_found_http_exception",
            "Manga could not be found",
        ),
        ("GET", ["manga", "slow"]) => {
            tokio::time::sleep(SLOW_DELAY).await;
            ok(json!({"result": "ok", "response": "entity", "data": manga("slow", false)}))
        }
        ("GET", ["manga", id]) => ok(json!({"result": "ok", "response": "entity", "data": manga(id, false)})),
        ("PUT" | "DELETE", ["manga", _]) if !authenticated => unauthorized(),
        ("PUT", ["manga", id]) => {
            let mut updated = manga(id, false);
            updated["attributes"]["version"] = json_body["version"].clone();
            ok(json!({"result": "ok", "response": "entity", "data": updated}))
        }
        ("DELETE", ["manga", _]) => ok(json!({"result": "ok"})),
        ("POST" | "DELETE", ["manga", _, "follow"]) if !authenticated => unauthorized(),
        ("POST" | "DELETE", ["manga", _, "follow"]) => ok(json!({"result": "ok"})),
        ("POST" | "DELETE", ["manga", _, "list", _]) if !authenticated => unauthorized(),
        ("POST" | "DELETE", ["manga", _, "list", _]) => ok(json!({"result": "ok"})),
        ("GET", ["manga", _, "feed"]) => collection(&query, CHAPTER_TOTAL, chapter),
        ("GET", ["manga", _, "read"]) if !authenticated => unauthorized(),
        ("GET", ["manga", _, "read"]) => ok(json!({"result": "ok", "data": ["chapter-0", "chapter-1"]})),
        ("GET", ["manga", _, "aggregate"]) => {
            if query_value(&query, "translatedLanguage[]") == Some("xx") {
                ok(json!({"result": "ok", "volumes": []}))
            } else {
                ok(json!({
                    "result": "ok",
                    "volumes": {
                        "none": {
                            "volume": "none",
                            "count": 1,
                            "chapters": {"none": {"chapter": "none", "id": "chapter-x", "count": 1, "others": []}}
                        },
                        "1": {
                            "volume": "1",
                            "count": 2,
                            "chapters": {
                                "2": {"chapter": "2", "id": "chapter-1", "count": 1, "others": []},
                                "1": {"chapter": "1", "id": "chapter-0", "count": 1, "others": []}
                            }
                        }
                    }
                }))
            }
        }
        ("GET", ["chapter", id]) => {
            let mut data = chapter(0);
            data["id"] = json!(id);
            ok(json!({"result": "ok", "response": "entity", "data": data}))
        }
        ("DELETE", ["chapter", _]) if !authenticated => unauthorized(),
        ("DELETE", ["chapter", _]) => ok(json!({"result": "ok"})),
        ("GET", ["list", _, "feed"]) => collection(&query, CHAPTER_TOTAL, chapter),
        ("GET", ["cover"]) => {
            let (key, ids) = match (json_body["manga"].as_array(), json_body["ids"].as_array()) {
                (Some(ids), _) => ("manga", ids.clone()),
                (None, Some(ids)) => ("ids", ids.clone()),
                (None, None) => ("ids", Vec::new()),
            };
            let data: Vec<Value> = ids
                .iter()
                .enumerate()
                .map(|(n, id)| {
                    let id = id.as_str().unwrap_or_default();
                    let (cover_id, manga_id) = if key == "manga" {
                        (format!("cover-{n}"), id.to_string())
                    } else {
                        (id.to_string(), format!("manga-{n}"))
                    };
                    json!({
                        "id": cover_id,
                        "type": "cover_art",
                        "attributes": {"volume": (n + 1).to_string(), "fileName": format!("{cover_id}.jpg"), "version": 1},
                        "relationships": [{"id": manga_id, "type": "manga"}]
                    })
                })
                .collect();
            let total = data.len();
            ok(json!({
                "result": "ok",
                "response": "collection",
                "data": data,
                "limit": 10,
                "offset": 0,
                "total": total,
            }))
        }
        ("GET", ["at-home", "server", _]) => ok(json!({
            "result": "ok",
            "baseUrl": state.base_url.get().cloned().unwrap_or_default(),
            "chapter": {
                "hash": "abcdef",
                "data": ["1-a.png", "2-b.png", "3-c.png"],
                "dataSaver": ["1-a.jpg", "2-b.jpg", "3-c.jpg"]
            }
        })),
        ("GET", ["data" | "data-saver", "abcdef", page]) => {
            (StatusCode::OK, format!("image {page}")).into_response()
        }
        ("GET", ["garbage"]) => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        _ => error(
            StatusCode::NOT_FOUND,
            "not_found_http_exception",
            "No route found",
        ),
    }
}
