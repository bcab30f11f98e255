//! Demo implementations of the bundled `keybase.1` protocols.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use protobind::protocols::keybase1::apiserver::{
    DeleteArg, GetArg, GetWithSessionArg, PostArg, PostJSONArg,
};
use protobind::protocols::keybase1::home::{
    AppLinkType, HomeGetScreenArg, HomeScreen, HomeScreenAnnouncement,
    HomeScreenAnnouncementID, HomeScreenItem, HomeScreenItemData, HomeScreenTodo,
    HomeScreenTodoType,
};
use protobind::protocols::keybase1::{
    api_server_protocol, home_protocol, notify_session_protocol, APIRes, ApiServerClient,
    ApiServerInterface, HomeClient, HomeInterface, NotifySessionClient, NotifySessionInterface,
    Status, StatusCode, StringKVPair,
};
use protobind::{Context, Error, Result, Router};

/// Router serving every bundled protocol.
pub fn router() -> Result<Router> {
    Router::new()
        .with(api_server_protocol(Arc::new(EchoApi)))?
        .with(home_protocol(Arc::new(Home::default())))?
        .with(notify_session_protocol(Arc::new(SessionLogger)))
}

/// Fully qualified names of the methods `router` serves.
pub fn methods() -> Vec<&'static str> {
    ApiServerClient::METHODS
        .iter()
        .chain(HomeClient::METHODS)
        .chain(NotifySessionClient::METHODS)
        .copied()
        .collect()
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Answers API requests by echoing the request back as the body.
pub struct EchoApi;

impl EchoApi {
    fn respond(&self, method: &str, endpoint: &str, args: &[StringKVPair]) -> Result<APIRes> {
        if endpoint.is_empty() {
            return Err(Status::new(StatusCode::SCInputError, "missing endpoint").into());
        }
        let args: serde_json::Map<String, serde_json::Value> = args
            .iter()
            .map(|kv| (kv.key.clone(), serde_json::Value::String(kv.value.clone())))
            .collect();
        let body = serde_json::json!({
            "method": method,
            "endpoint": endpoint,
            "args": args,
        });
        debug!("{} {}", method, endpoint);
        Ok(APIRes {
            status: "ok".to_string(),
            body: body.to_string(),
            http_status: 200,
            app_status: "0".to_string(),
        })
    }
}

#[async_trait]
impl ApiServerInterface for EchoApi {
    async fn get(&self, _ctx: Context, arg: GetArg) -> Result<APIRes> {
        self.respond("GET", &arg.endpoint, &arg.args)
    }

    async fn get_with_session(&self, _ctx: Context, arg: GetWithSessionArg) -> Result<APIRes> {
        if arg.use_session == Some(true) {
            return Err(Status::new(StatusCode::SCLoginRequired, "no active session").into());
        }
        self.respond("GET", &arg.endpoint, &arg.args)
    }

    async fn post(&self, _ctx: Context, arg: PostArg) -> Result<APIRes> {
        self.respond("POST", &arg.endpoint, &arg.args)
    }

    async fn post_json(&self, _ctx: Context, arg: PostJSONArg) -> Result<APIRes> {
        let mut args = arg.args;
        args.extend(arg.json_payload);
        self.respond("POST", &arg.endpoint, &args)
    }

    async fn delete(&self, _ctx: Context, arg: DeleteArg) -> Result<APIRes> {
        self.respond("DELETE", &arg.endpoint, &arg.args)
    }
}

#[derive(Debug)]
struct HomeState {
    version: i32,
    visits: i32,
    last_viewed: i64,
    skipped: Vec<HomeScreenTodoType>,
    announcements: Vec<HomeScreenAnnouncement>,
}

/// In-memory home screen.
pub struct Home {
    state: Mutex<HomeState>,
}

impl Default for Home {
    fn default() -> Self {
        Self {
            state: Mutex::new(HomeState {
                version: 1,
                visits: 0,
                last_viewed: 0,
                skipped: Vec::new(),
                announcements: vec![HomeScreenAnnouncement {
                    id: 1,
                    version: 1,
                    app_link: AppLinkType::SETTINGS,
                    confirm_label: "Open settings".to_string(),
                    dismissable: true,
                    icon_url: String::new(),
                    text: "Verify your email address.".to_string(),
                    url: String::new(),
                }],
            }),
        }
    }
}

impl Home {
    fn with_state<T>(&self, f: impl FnOnce(&mut HomeState) -> T) -> Result<T> {
        let mut state = self.state.lock().map_err(|e| Error::Other(e.to_string()))?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl HomeInterface for Home {
    async fn home_get_screen(&self, _ctx: Context, arg: HomeGetScreenArg) -> Result<HomeScreen> {
        self.with_state(|state| {
            let mut items: Vec<HomeScreenItem> = state
                .announcements
                .iter()
                .map(|a| HomeScreenItem {
                    badged: true,
                    data: HomeScreenItemData::with_announcement(a.clone()),
                    ..Default::default()
                })
                .collect();
            if !state.skipped.contains(&HomeScreenTodoType::BIO) {
                items.push(HomeScreenItem {
                    badged: false,
                    data: HomeScreenItemData::with_todo(HomeScreenTodo::new_default(
                        HomeScreenTodoType::BIO,
                    )),
                    ..Default::default()
                });
            }

            let screen = HomeScreen {
                last_viewed: state.last_viewed,
                version: state.version,
                visits: state.visits,
                items,
                follow_suggestions: Vec::new(),
                announcements_version: state.announcements.len() as i32,
            };
            if arg.mark_viewed {
                state.last_viewed = now_millis();
                state.visits += 1;
            }
            screen
        })
    }

    async fn home_skip_todo_type(&self, _ctx: Context, t: HomeScreenTodoType) -> Result<()> {
        self.with_state(|state| {
            if !state.skipped.contains(&t) {
                info!("skipping todo {}", t);
                state.skipped.push(t);
                state.version += 1;
            }
        })
    }

    async fn home_dismiss_announcement(
        &self,
        _ctx: Context,
        i: HomeScreenAnnouncementID,
    ) -> Result<()> {
        let dismissed = self.with_state(|state| {
            let before = state.announcements.len();
            state.announcements.retain(|a| a.id != i || !a.dismissable);
            let dismissed = state.announcements.len() != before;
            if dismissed {
                state.version += 1;
            }
            dismissed
        })?;
        if !dismissed {
            return Err(Status::new(
                StatusCode::SCNotFound,
                format!("no dismissable announcement {}", i),
            )
            .into());
        }
        Ok(())
    }

    async fn home_action_taken(&self, _ctx: Context) -> Result<()> {
        self.with_state(|state| state.version += 1)
    }

    async fn home_mark_viewed(&self, _ctx: Context) -> Result<()> {
        self.with_state(|state| {
            state.last_viewed = now_millis();
            state.visits += 1;
        })
    }
}

/// Logs session events.
pub struct SessionLogger;

#[async_trait]
impl NotifySessionInterface for SessionLogger {
    async fn logged_out(&self, _ctx: Context) -> Result<()> {
        info!("session: logged out");
        Ok(())
    }

    async fn logged_in(&self, _ctx: Context, username: String) -> Result<()> {
        info!("session: logged in as {}", username);
        Ok(())
    }
}
