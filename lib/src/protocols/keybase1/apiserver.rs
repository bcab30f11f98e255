//! `keybase.1.apiserver`, raw access to the API server through the service.

use crate::protocol;
use crate::protocols::keybase1::common::StringKVPair;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct APIRes {
    pub status: String,
    pub body: String,
    #[serde(rename = "httpStatus")]
    pub http_status: i32,
    #[serde(rename = "appStatus")]
    pub app_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArg {
    pub endpoint: String,
    pub args: Vec<StringKVPair>,
    #[serde(rename = "httpStatus")]
    pub http_status: Vec<i32>,
    #[serde(rename = "appStatusCode")]
    pub app_status_code: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetWithSessionArg {
    pub endpoint: String,
    pub args: Vec<StringKVPair>,
    #[serde(rename = "httpStatus")]
    pub http_status: Vec<i32>,
    #[serde(rename = "appStatusCode")]
    pub app_status_code: Vec<i32>,
    #[serde(
        rename = "useSession",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub use_session: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostArg {
    pub endpoint: String,
    pub args: Vec<StringKVPair>,
    #[serde(rename = "httpStatus")]
    pub http_status: Vec<i32>,
    #[serde(rename = "appStatusCode")]
    pub app_status_code: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostJSONArg {
    pub endpoint: String,
    pub args: Vec<StringKVPair>,
    #[serde(rename = "JSONPayload")]
    pub json_payload: Vec<StringKVPair>,
    #[serde(rename = "httpStatus")]
    pub http_status: Vec<i32>,
    #[serde(rename = "appStatusCode")]
    pub app_status_code: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteArg {
    pub endpoint: String,
    pub args: Vec<StringKVPair>,
    #[serde(rename = "httpStatus")]
    pub http_status: Vec<i32>,
    #[serde(rename = "appStatusCode")]
    pub app_status_code: Vec<i32>,
}

protocol! {
    pub protocol "keybase.1.apiserver" as ApiServerInterface {
        client: ApiServerClient,
        builder: api_server_protocol,
        methods {
            call get("Get", GetArg) -> APIRes;
            call get_with_session("GetWithSession", GetWithSessionArg) -> APIRes;
            call post("Post", PostArg) -> APIRes;
            call post_json("PostJSON", PostJSONArg) -> APIRes;
            call delete("Delete", DeleteArg) -> APIRes;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::runtime;

    use super::{
        api_server_protocol, APIRes, ApiServerClient, ApiServerInterface, DeleteArg, GetArg,
        GetWithSessionArg, PostArg, PostJSONArg,
    };
    use crate::config::ConnectionConfig;
    use crate::net::{encode, memory, Encoding};
    use crate::protocols::keybase1::common::{Status, StatusCode, StringKVPair};
    use crate::rpc::{MethodType, Router};
    use crate::util::Shutdown;
    use crate::{Context, Error, Result};

    /// Answers every request with a canned success, remembering what it
    /// was asked.
    #[derive(Default)]
    struct CannedApi {
        gets: AtomicUsize,
        last_endpoint: std::sync::Mutex<String>,
    }

    fn ok() -> APIRes {
        APIRes {
            status: "ok".to_string(),
            body: "{}".to_string(),
            http_status: 200,
            app_status: "0".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl ApiServerInterface for CannedApi {
        async fn get(&self, _ctx: Context, arg: GetArg) -> Result<APIRes> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            *self
                .last_endpoint
                .lock()
                .map_err(|e| Error::Other(e.to_string()))? = arg.endpoint;
            Ok(ok())
        }

        async fn get_with_session(&self, _ctx: Context, arg: GetWithSessionArg) -> Result<APIRes> {
            match arg.use_session {
                Some(false) => Err(Status::new(StatusCode::SCLoginRequired, "session required").into()),
                _ => Ok(ok()),
            }
        }

        async fn post(&self, _ctx: Context, _arg: PostArg) -> Result<APIRes> {
            Ok(ok())
        }

        async fn post_json(&self, _ctx: Context, arg: PostJSONArg) -> Result<APIRes> {
            Ok(APIRes {
                body: format!("{} fields", arg.json_payload.len()),
                ..ok()
            })
        }

        async fn delete(&self, _ctx: Context, _arg: DeleteArg) -> Result<APIRes> {
            Ok(ok())
        }
    }

    fn get_arg() -> GetArg {
        GetArg {
            endpoint: "user/lookup".to_string(),
            args: vec![StringKVPair::new("username", "max")],
            http_status: vec![200],
            app_status_code: vec![0],
        }
    }

    #[test]
    fn wire_names_are_verbatim() {
        assert_eq!(
            ApiServerClient::METHODS,
            &[
                "keybase.1.apiserver.Get",
                "keybase.1.apiserver.GetWithSession",
                "keybase.1.apiserver.Post",
                "keybase.1.apiserver.PostJSON",
                "keybase.1.apiserver.Delete",
            ]
        );
        let protocol = api_server_protocol(Arc::new(CannedApi::default()));
        let mut names = ApiServerClient::METHODS.to_vec();
        names.sort();
        assert_eq!(protocol.wire_names(), names);
    }

    #[tokio::test]
    async fn get_through_client_stub() -> Result<()> {
        let api = Arc::new(CannedApi::default());
        let router = Arc::new(Router::new().with(api_server_protocol(api.clone()))?);
        let (client, _server) = memory::pair(
            None,
            Some(router),
            ConnectionConfig::default(),
            &runtime::Handle::current(),
            Shutdown::new(),
        );
        let client = ApiServerClient::new(Arc::new(client));
        let ctx = Context::new();

        let res = client.get(&ctx, get_arg()).await?;
        assert_eq!(
            res,
            APIRes {
                status: "ok".to_string(),
                body: "{}".to_string(),
                http_status: 200,
                app_status: "0".to_string(),
            }
        );
        assert_eq!(api.gets.load(Ordering::SeqCst), 1);
        assert_eq!(
            *api.last_endpoint.lock().map_err(|e| Error::Other(e.to_string()))?,
            "user/lookup"
        );

        let res = client
            .post_json(
                &ctx,
                PostJSONArg {
                    json_payload: vec![StringKVPair::new("a", "1"), StringKVPair::new("b", "2")],
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(res.body, "2 fields");

        let refused = client
            .get_with_session(
                &ctx,
                GetWithSessionArg {
                    use_session: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(
            refused,
            Err(Error::Status {
                code: 201,
                name: "SCLoginRequired".to_string(),
                desc: "session required".to_string(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn misshaped_get_is_type_error() -> Result<()> {
        let api = Arc::new(CannedApi::default());
        let router = Router::new().with(api_server_protocol(api.clone()))?;
        let encoding = Encoding::MsgPack;

        let wrong_record = encode(&[StringKVPair::new("endpoint", "user")], encoding)?;
        let unwrapped = encode(&get_arg(), encoding)?;
        let doubled = encode(&[get_arg(), get_arg()], encoding)?;
        for payload in [wrong_record, unwrapped, doubled] {
            let result = router
                .dispatch(
                    Context::new(),
                    "keybase.1.apiserver.Get",
                    &payload,
                    encoding,
                    MethodType::Call,
                )
                .await;
            assert!(matches!(result, Err(Error::TypeError { .. })));
        }
        assert_eq!(api.gets.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn stub_timeout_is_forwarded() -> Result<()> {
        let router = Router::new().with(api_server_protocol(Arc::new(CannedApi::default())))?;
        let client = ApiServerClient::new(Arc::new(memory::Loopback::new(router, Encoding::Json)))
            .with_timeout(Duration::from_secs(2));
        assert_eq!(client.delete(&Context::new(), DeleteArg::default()).await?, ok());
        Ok(())
    }
}
