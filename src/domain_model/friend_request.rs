use crate::domain_model::{User, UserId, UserPair};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct FriendRequestId(pub i64);

impl fmt::Display for FriendRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FriendRequestId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(FriendRequestId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Accepted,
    Discarded,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestState::Pending => "pending",
            RequestState::Accepted => "accepted",
            RequestState::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// A directed friend request as stored, with bare user ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequestRecord {
    pub id: FriendRequestId,
    pub from_user: UserId,
    pub to_user: UserId,
    pub accepted: bool,
    pub discarded: bool,
}

impl FriendRequestRecord {
    /// Discard wins over accept, so a record carrying both flags reads as discarded.
    pub fn state(&self) -> RequestState {
        if self.discarded {
            RequestState::Discarded
        } else if self.accepted {
            RequestState::Accepted
        } else {
            RequestState::Pending
        }
    }

    pub fn is_friendship(&self) -> bool {
        self.state() == RequestState::Accepted
    }

    pub fn is_pending(&self) -> bool {
        self.state() == RequestState::Pending
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.from_user == user || self.to_user == user
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.from_user, self.to_user)
    }

    /// Status of the relationship as seen from `user_1`.
    pub fn status_for(&self, user_1: UserId) -> RelationshipStatus {
        match self.state() {
            RequestState::Discarded => RelationshipStatus::Discarded,
            RequestState::Accepted => RelationshipStatus::Friends,
            RequestState::Pending if self.from_user == user_1 => {
                RelationshipStatus::RequestSentByUser1
            }
            RequestState::Pending => RelationshipStatus::RequestSentByUser2,
        }
    }
}

/// A friend request with both endpoints hydrated into full users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: FriendRequestId,
    pub from_user: User,
    pub to_user: User,
    pub accepted: bool,
    pub discarded: bool,
}

impl FriendRequest {
    /// `a` and `b` may be given in either order; they are matched against the record's ids.
    pub fn hydrate(record: FriendRequestRecord, a: User, b: User) -> Self {
        let (from_user, to_user) = if a.id == record.from_user {
            (a, b)
        } else {
            (b, a)
        };
        FriendRequest {
            id: record.id,
            from_user,
            to_user,
            accepted: record.accepted,
            discarded: record.discarded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipStatus {
    #[serde(rename = "no_relationship")]
    NoRelationship,
    #[serde(rename = "discarded")]
    Discarded,
    #[serde(rename = "friends")]
    Friends,
    #[serde(rename = "request_sent_by_user_1")]
    RequestSentByUser1,
    #[serde(rename = "request_sent_by_user_2")]
    RequestSentByUser2,
}

/// Flags supplied by the caller of `manipulate_request`. `None` and `Some(false)` both leave
/// the corresponding flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RequestDecision {
    pub accepted: Option<bool>,
    pub discarded: Option<bool>,
}

impl RequestDecision {
    pub fn accept() -> Self {
        Self {
            accepted: Some(true),
            discarded: None,
        }
    }

    pub fn discard() -> Self {
        Self {
            accepted: None,
            discarded: Some(true),
        }
    }

    pub fn wants_accept(&self) -> bool {
        self.accepted.unwrap_or(false)
    }

    pub fn wants_discard(&self) -> bool {
        self.discarded.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(accepted: bool, discarded: bool) -> FriendRequestRecord {
        FriendRequestRecord {
            id: FriendRequestId(1),
            from_user: UserId(10),
            to_user: UserId(20),
            accepted,
            discarded,
        }
    }

    #[test]
    fn discard_wins_over_accept() {
        assert_eq!(record(false, false).state(), RequestState::Pending);
        assert_eq!(record(true, false).state(), RequestState::Accepted);
        assert_eq!(record(false, true).state(), RequestState::Discarded);
        assert_eq!(record(true, true).state(), RequestState::Discarded);
        assert!(!record(true, true).is_friendship());
    }

    #[test]
    fn status_depends_on_viewpoint_only_while_pending() {
        let pending = record(false, false);
        assert_eq!(
            pending.status_for(UserId(10)),
            RelationshipStatus::RequestSentByUser1
        );
        assert_eq!(
            pending.status_for(UserId(20)),
            RelationshipStatus::RequestSentByUser2
        );

        let accepted = record(true, false);
        assert_eq!(accepted.status_for(UserId(10)), RelationshipStatus::Friends);
        assert_eq!(accepted.status_for(UserId(20)), RelationshipStatus::Friends);
    }

    #[test]
    fn hydrate_matches_users_by_id() {
        let alice = User {
            id: UserId(10),
            username: "alice".into(),
        };
        let bob = User {
            id: UserId(20),
            username: "bob".into(),
        };

        let hydrated = FriendRequest::hydrate(record(false, false), bob, alice);
        assert_eq!(hydrated.from_user.username, "alice");
        assert_eq!(hydrated.to_user.username, "bob");
    }

    #[test]
    fn status_serializes_to_snake_case_names() {
        let json = serde_json::to_string(&RelationshipStatus::RequestSentByUser1).unwrap();
        assert_eq!(json, "\"request_sent_by_user_1\"");
        let json = serde_json::to_string(&RelationshipStatus::NoRelationship).unwrap();
        assert_eq!(json, "\"no_relationship\"");
    }

    #[test]
    fn hydrated_request_nests_users() {
        let request = FriendRequest::hydrate(
            record(false, false),
            User {
                id: UserId(10),
                username: "alice".into(),
            },
            User {
                id: UserId(20),
                username: "bob".into(),
            },
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "from_user": {"id": 10, "username": "alice"},
                "to_user": {"id": 20, "username": "bob"},
                "accepted": false,
                "discarded": false,
            })
        );
    }
}
