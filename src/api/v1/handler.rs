use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

// region users

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    // absent and null both mean "no username"
    #[serde(default)]
    pub username: Option<String>,
}

impl UserRequest {
    fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

pub async fn create_user(
    body: UserRequest,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .create_user(body.username())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::CREATED,
    ))
}

pub async fn list_users(
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let users = user_service
        .list_users()
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&users))
}

pub async fn get_user(
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_user(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&user))
}

pub async fn update_user(
    user_id: UserId,
    body: UserRequest,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .update_user(user_id, body.username())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&user))
}

pub async fn delete_user(
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    user_service
        .delete_user(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

// endregion

// region friend requests

#[derive(Debug, Default, Deserialize)]
pub struct CreateFriendRequestBody {
    pub from_user: Option<UserId>,
    pub to_user: Option<UserId>,
}

pub async fn create_friend_request(
    body: CreateFriendRequestBody,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = CreateRequestInput {
        from_user: body.from_user,
        to_user: body.to_user,
    };
    let outcome = relationship_service
        .create_request(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let status = match outcome {
        RequestOutcome::Created(_) => StatusCode::CREATED,
        RequestOutcome::Collapsed(_) => StatusCode::OK,
    };
    Ok(warp::reply::with_status(
        warp::reply::json(outcome.request()),
        status,
    ))
}

pub async fn list_friend_requests(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = relationship_service
        .list_pending(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&requests))
}

pub async fn manipulate_friend_request(
    request_id: FriendRequestId,
    body: RequestDecision,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .manipulate_request(request_id, body)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&request),
        StatusCode::PARTIAL_CONTENT,
    ))
}

// endregion

// region friendships

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendListResponse {
    pub friend_ids: Vec<UserId>,
}

pub async fn friend_list(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friend_ids = relationship_service
        .list_friend_ids(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&FriendListResponse {
        friend_ids: friend_ids.into_iter().collect(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: RelationshipStatus,
}

pub async fn check_if_friends(
    user_1: UserId,
    user_2: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = relationship_service
        .check_relationship_status(user_1, user_2)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&StatusResponse { status }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteFriendResponse {
    pub success: String,
}

pub async fn delete_friend(
    user_1: UserId,
    user_2: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    relationship_service
        .delete_friendship(user_1, user_2)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&DeleteFriendResponse {
        success: "friend deleted".to_string(),
    }))
}

// endregion
