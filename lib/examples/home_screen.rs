//! Serves `keybase.1.home` over an in-memory connection and fetches the
//! home screen through the generated client.

use std::sync::{Arc, Mutex};

use protobind::net::memory;
use protobind::protocols::keybase1::home::{
    HomeGetScreenArg, HomeScreen, HomeScreenAnnouncementID, HomeScreenItem, HomeScreenItemData,
    HomeScreenTodo, HomeScreenTodoType,
};
use protobind::protocols::keybase1::{home_protocol, HomeClient, HomeInterface};
use protobind::util::Shutdown;
use protobind::{ConnectionConfig, Context, Error, Result, Router, Variant};

#[derive(Default)]
struct Todos {
    skipped: Mutex<Vec<HomeScreenTodoType>>,
}

#[async_trait::async_trait]
impl HomeInterface for Todos {
    async fn home_get_screen(&self, _ctx: Context, _arg: HomeGetScreenArg) -> Result<HomeScreen> {
        let skipped = self.skipped.lock().map_err(|e| Error::Other(e.to_string()))?;
        let items = [
            HomeScreenTodo::with_verify_all_email("max@example.com".to_string()),
            HomeScreenTodo::new_default(HomeScreenTodoType::BIO),
        ]
        .into_iter()
        .filter(|todo| !skipped.contains(&todo.tag()))
        .map(|todo| HomeScreenItem {
            badged: true,
            data: HomeScreenItemData::with_todo(todo),
            ..Default::default()
        })
        .collect();
        Ok(HomeScreen {
            version: 1,
            items,
            ..Default::default()
        })
    }

    async fn home_skip_todo_type(&self, _ctx: Context, t: HomeScreenTodoType) -> Result<()> {
        self.skipped
            .lock()
            .map_err(|e| Error::Other(e.to_string()))?
            .push(t);
        Ok(())
    }

    async fn home_dismiss_announcement(
        &self,
        _ctx: Context,
        _i: HomeScreenAnnouncementID,
    ) -> Result<()> {
        Ok(())
    }

    async fn home_action_taken(&self, _ctx: Context) -> Result<()> {
        Ok(())
    }

    async fn home_mark_viewed(&self, _ctx: Context) -> Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simplelog::SimpleLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default())?;

    let router = Router::new().with(home_protocol(Arc::new(Todos::default())))?;
    let (client, _server) = memory::pair(
        None,
        Some(Arc::new(router)),
        ConnectionConfig::default(),
        &tokio::runtime::Handle::current(),
        Shutdown::new(),
    );
    let home = HomeClient::new(Arc::new(client));
    let ctx = Context::new();

    let screen = home.home_get_screen(&ctx, HomeGetScreenArg::default()).await?;
    for item in &screen.items {
        println!("todo: {}", item.data.todo().tag());
    }

    home.home_skip_todo_type(&ctx, HomeScreenTodoType::BIO).await?;
    let screen = home.home_get_screen(&ctx, HomeGetScreenArg::default()).await?;
    println!("{} item(s) left after skipping BIO", screen.items.len());

    Ok(())
}
