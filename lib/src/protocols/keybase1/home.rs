//! `keybase.1.home`, the home screen with its todo items, people
//! notifications and announcements.

use crate::protocol;
use crate::protocols::keybase1::common::{EmailAddress, PhoneNumber, Time, UnixTime, UID};
use crate::{protocol_enum, variant};

pub type HomeScreenItemID = String;
pub type HomeScreenAnnouncementID = i32;
pub type HomeScreenAnnouncementVersion = i32;

protocol_enum! {
    pub enum HomeScreenItemType {
        TODO = 1,
        PEOPLE = 2,
        ANNOUNCEMENT = 3,
    }
}

protocol_enum! {
    pub enum AppLinkType {
        NONE = 0,
        PEOPLE = 1,
        CHAT = 2,
        FILES = 3,
        WALLET = 4,
        GIT = 5,
        DEVICES = 6,
        SETTINGS = 7,
        TEAMS = 8,
    }
}

protocol_enum! {
    pub enum HomeScreenTodoType {
        NONE = 0,
        BIO = 1,
        PROOF = 2,
        DEVICE = 3,
        FOLLOW = 4,
        PAPERKEY = 6,
        TEAM = 7,
        FOLDER = 8,
        GIT_REPO = 9,
        TEAM_SHOWCASE = 10,
        AVATAR_TEAM = 12,
        ADD_PHONE_NUMBER = 18,
        VERIFY_ALL_PHONE_NUMBER = 19,
        VERIFY_ALL_EMAIL = 20,
        LEGACY_EMAIL_VISIBILITY = 21,
        ADD_EMAIL = 22,
        AVATAR_USER = 23,
        CHAT = 24,
        ANNONCEMENT_PLACEHOLDER = 10000,
    }
}

protocol_enum! {
    pub enum HomeScreenPeopleNotificationType {
        FOLLOWED = 1,
        FOLLOWED_MULTI = 2,
        CONTACT = 3,
        CONTACT_MULTI = 4,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeScreenAnnouncement {
    pub id: HomeScreenAnnouncementID,
    pub version: HomeScreenAnnouncementVersion,
    #[serde(rename = "appLink")]
    pub app_link: AppLinkType,
    #[serde(rename = "confirmLabel")]
    pub confirm_label: String,
    pub dismissable: bool,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
    pub text: String,
    pub url: String,
}

variant! {
    pub enum HomeScreenTodo: HomeScreenTodoType {
        VerifyAllPhoneNumber(PhoneNumber) {
            tag: VERIFY_ALL_PHONE_NUMBER,
            slot: "verifyAllPhoneNumber",
            new: with_verify_all_phone_number,
            get: verify_all_phone_number,
        },
        VerifyAllEmail(EmailAddress) {
            tag: VERIFY_ALL_EMAIL,
            slot: "verifyAllEmail",
            new: with_verify_all_email,
            get: verify_all_email,
        },
        LegacyEmailVisibility(EmailAddress) {
            tag: LEGACY_EMAIL_VISIBILITY,
            slot: "legacyEmailVisibility",
            new: with_legacy_email_visibility,
            get: legacy_email_visibility,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAllEmailTodoExt {
    #[serde(rename = "lastVerifyEmailDate")]
    pub last_verify_email_date: UnixTime,
}

variant! {
    /// Client-only extras attached to a todo item.
    pub enum HomeScreenTodoExt: HomeScreenTodoType {
        VerifyAllEmail(VerifyAllEmailTodoExt) {
            tag: VERIFY_ALL_EMAIL,
            slot: "verifyAllEmail",
            new: with_verify_all_email,
            get: verify_all_email,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub uid: UID,
    pub username: String,
    pub thumbnail: String,
    #[serde(rename = "idVersion")]
    pub id_version: i32,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub bio: String,
    #[serde(rename = "sigIDDisplay")]
    pub sig_id_display: String,
    #[serde(rename = "trackTime")]
    pub track_time: Time,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeScreenPeopleNotificationFollowed {
    #[serde(rename = "followTime")]
    pub follow_time: Time,
    #[serde(rename = "followedBack")]
    pub followed_back: bool,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeScreenPeopleNotificationFollowedMulti {
    pub followers: Vec<HomeScreenPeopleNotificationFollowed>,
    #[serde(rename = "numOthers")]
    pub num_others: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeScreenPeopleNotificationContact {
    #[serde(rename = "resolveTime")]
    pub resolve_time: Time,
    pub username: String,
    pub description: String,
    #[serde(rename = "resolvedContactBlob")]
    pub resolved_contact_blob: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeScreenPeopleNotificationContactMulti {
    pub contacts: Vec<HomeScreenPeopleNotificationContact>,
    #[serde(rename = "numOthers")]
    pub num_others: i32,
}

variant! {
    pub enum HomeScreenPeopleNotification: HomeScreenPeopleNotificationType {
        Followed(HomeScreenPeopleNotificationFollowed) {
            tag: FOLLOWED,
            slot: "followed",
            new: with_followed,
            get: followed,
        },
        FollowedMulti(HomeScreenPeopleNotificationFollowedMulti) {
            tag: FOLLOWED_MULTI,
            slot: "followedMulti",
            new: with_followed_multi,
            get: followed_multi,
        },
        Contact(HomeScreenPeopleNotificationContact) {
            tag: CONTACT,
            slot: "contact",
            new: with_contact,
            get: contact,
        },
        ContactMulti(HomeScreenPeopleNotificationContactMulti) {
            tag: CONTACT_MULTI,
            slot: "contactMulti",
            new: with_contact_multi,
            get: contact_multi,
        },
    }
}

variant! {
    pub enum HomeScreenItemData: HomeScreenItemType {
        Todo(HomeScreenTodo) { tag: TODO, slot: "todo", new: with_todo, get: todo },
        People(HomeScreenPeopleNotification) {
            tag: PEOPLE,
            slot: "people",
            new: with_people,
            get: people,
        },
        Announcement(HomeScreenAnnouncement) {
            tag: ANNOUNCEMENT,
            slot: "announcement",
            new: with_announcement,
            get: announcement,
        },
    }
}

variant! {
    pub enum HomeScreenItemDataExt: HomeScreenItemType {
        Todo(HomeScreenTodoExt) { tag: TODO, slot: "todo", new: with_todo, get: todo },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeScreenItem {
    pub badged: bool,
    pub data: HomeScreenItemData,
    #[serde(rename = "dataExt")]
    pub data_ext: HomeScreenItemDataExt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pics {
    #[serde(rename = "square40")]
    pub square_40: String,
    #[serde(rename = "square200")]
    pub square_200: String,
    #[serde(rename = "square360")]
    pub square_360: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeUserSummary {
    pub uid: UID,
    pub username: String,
    pub bio: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pics: Option<Pics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeScreen {
    #[serde(rename = "lastViewed")]
    pub last_viewed: Time,
    pub version: i32,
    pub visits: i32,
    pub items: Vec<HomeScreenItem>,
    #[serde(rename = "followSuggestions")]
    pub follow_suggestions: Vec<HomeUserSummary>,
    #[serde(rename = "announcementsVersion")]
    pub announcements_version: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeGetScreenArg {
    #[serde(rename = "markViewed")]
    pub mark_viewed: bool,
    /// `0` asks for no suggestions, `-1` for the server default.
    #[serde(rename = "numFollowSuggestionsWanted")]
    pub num_follow_suggestions_wanted: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeSkipTodoTypeArg {
    pub t: HomeScreenTodoType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeDismissAnnouncementArg {
    pub i: HomeScreenAnnouncementID,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeActionTakenArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeMarkViewedArg {}

protocol! {
    pub protocol "keybase.1.home" as HomeInterface {
        client: HomeClient,
        builder: home_protocol,
        methods {
            /// Returns the home screen for the current user, optionally
            /// marking this version of it viewed.
            call home_get_screen("homeGetScreen", HomeGetScreenArg) -> HomeScreen;
            call home_skip_todo_type("homeSkipTodoType", HomeSkipTodoTypeArg { t: HomeScreenTodoType });
            call home_dismiss_announcement(
                "homeDismissAnnouncement",
                HomeDismissAnnouncementArg { i: HomeScreenAnnouncementID }
            );
            call home_action_taken("homeActionTaken", HomeActionTakenArg {});
            call home_mark_viewed("homeMarkViewed", HomeMarkViewedArg {});
        }
    }
}
