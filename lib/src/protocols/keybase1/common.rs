//! Records shared by most `keybase.1` protocols.

use crate::{protocol_enum, variant, Error};

pub type Time = i64;
pub type UnixTime = i64;
pub type UID = String;
pub type TLFID = String;
pub type TeamID = String;
pub type PhoneNumber = String;
pub type EmailAddress = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringKVPair {
    pub key: String,
    pub value: String,
}

impl StringKVPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

protocol_enum! {
    /// Status codes carried by [`Status`].
    pub enum StatusCode {
        SCOk = 0,
        SCInputError = 100,
        SCAssertionParseError = 101,
        SCLoginRequired = 201,
        SCBadSession = 202,
        SCBadLoginUserNotFound = 203,
        SCBadLoginPassword = 204,
        SCNotFound = 205,
        SCThrottleControl = 210,
        SCDeleted = 216,
        SCGeneric = 218,
        SCExists = 230,
        SCAlreadyLoggedIn = 235,
        SCCanceled = 237,
        SCInputCanceled = 239,
        SCBadUsername = 243,
        SCOffline = 267,
        SCReloginRequired = 274,
        SCResolutionFailed = 275,
        SCProfileNotPublic = 276,
    }
}

/// Business-level status, the error record of the `keybase.1` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: i32,
    pub name: String,
    pub desc: String,
    pub fields: Vec<StringKVPair>,
}

impl Status {
    pub fn new(code: StatusCode, desc: impl Into<String>) -> Self {
        Self {
            code: code.0,
            name: code.to_string(),
            desc: desc.into(),
            fields: Vec::new(),
        }
    }

    /// Recovers the status from an error returned by a call, if the remote
    /// handler failed with one.
    pub fn from_error(error: &Error) -> Option<Status> {
        match error {
            Error::Status { code, name, desc } => Some(Status {
                code: *code,
                name: name.clone(),
                desc: desc.clone(),
                fields: Vec::new(),
            }),
            _ => None,
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Status {
            code: status.code,
            name: status.name,
            desc: status.desc,
        }
    }
}

protocol_enum! {
    pub enum TeamType {
        NONE = 0,
        LEGACY = 1,
        MODERN = 2,
    }
}

variant! {
    /// Team identifier from either generation of teams.
    pub enum CompatibilityTeamID: TeamType as "typ" {
        Legacy(TLFID) { tag: LEGACY, slot: "legacy", new: with_legacy, get: legacy },
        Modern(TeamID) { tag: MODERN, slot: "modern", new: with_modern, get: modern },
    }
}

#[cfg(test)]
mod tests {
    use super::{CompatibilityTeamID, Status, StatusCode, TeamType};
    use crate::net::{decode, encode, Encoding};
    use crate::{Error, ProtocolEnum, Result, Variant};

    #[test]
    fn status_survives_error_conversion() {
        let status = Status::new(StatusCode::SCNotFound, "no such user");
        assert_eq!(status.name, "SCNotFound");

        let error = Error::from(status.clone());
        assert_eq!(error.to_string(), "SCNotFound (205): no such user");
        assert_eq!(Status::from_error(&error), Some(status));
        assert_eq!(Status::from_error(&Error::Timeout), None);
    }

    #[test]
    fn status_codes_fall_back_to_numeral() {
        assert_eq!(StatusCode::from_name("SCGeneric"), Some(StatusCode::SCGeneric));
        assert_eq!(StatusCode(999).to_string(), "999");
    }

    #[test]
    fn team_id_uses_own_discriminant_field() -> Result<()> {
        let id = CompatibilityTeamID::with_modern("bd3c1e".to_string());
        assert_eq!(
            encode(&id, Encoding::Json)?,
            br#"{"typ":2,"modern":"bd3c1e"}"#.to_vec()
        );
        let legacy: CompatibilityTeamID =
            decode(br#"{"typ":1,"legacy":"0a1b"}"#, Encoding::Json)?;
        assert_eq!(legacy.discriminant()?, TeamType::LEGACY);
        assert_eq!(legacy.legacy(), "0a1b");
        assert!(CompatibilityTeamID::new_default(TeamType::MODERN)
            .discriminant()
            .is_err());
        assert_eq!(
            CompatibilityTeamID::new_default(TeamType::NONE).discriminant()?,
            TeamType::NONE
        );
        Ok(())
    }

    #[test]
    fn team_id_accessors_only_match_own_case() {
        let wrong_case = |access: &dyn Fn() -> String| {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(access))
                .err()
                .and_then(|payload| payload.downcast_ref::<&str>().copied())
                == Some("wrong case accessed")
        };
        let legacy = CompatibilityTeamID::with_legacy("0a1b".to_string());
        let modern = CompatibilityTeamID::with_modern("bd3c1e".to_string());
        assert!(wrong_case(&|| legacy.modern()));
        assert!(wrong_case(&|| modern.legacy()));
        assert!(!wrong_case(&|| legacy.legacy()));
        assert!(!wrong_case(&|| modern.modern()));
    }
}
