//! `keybase.1.NotifySession`, session changes pushed from the service to
//! its clients.

use crate::protocol;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedOutArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedInArg {
    pub username: String,
}

protocol! {
    pub protocol "keybase.1.NotifySession" as NotifySessionInterface {
        client: NotifySessionClient,
        builder: notify_session_protocol,
        methods {
            notify logged_out("loggedOut", LoggedOutArg {});
            call logged_in("loggedIn", LoggedInArg { username: String });
        }
    }
}
