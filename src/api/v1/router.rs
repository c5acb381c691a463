use super::handler;
use crate::domain_model::{FriendRequestId, UserId};
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

// Paths come before methods so an unknown path is a 404 rather than a 405.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let create_user = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with(server.user_service.clone()))
        .and_then(handler::create_user);

    let list_users = warp::path!("users")
        .and(warp::get())
        .and(with(server.user_service.clone()))
        .and_then(handler::list_users);

    let get_user = warp::path!("users" / UserId)
        .and(warp::get())
        .and(with(server.user_service.clone()))
        .and_then(handler::get_user);

    let update_user = warp::path!("users" / UserId)
        .and(warp::put().or(warp::patch()).unify())
        .and(json_body())
        .and(with(server.user_service.clone()))
        .and_then(handler::update_user);

    let delete_user = warp::path!("users" / UserId)
        .and(warp::delete())
        .and(with(server.user_service.clone()))
        .and_then(handler::delete_user);

    let create_friend_request = warp::path!("create_friend_request")
        .and(warp::post())
        .and(json_body())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::create_friend_request);

    let friend_requests_list = warp::path!("friend_requests_list" / UserId)
        .and(warp::get())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_friend_requests);

    let manipulate_friend_request = warp::path!("manipulate_friend_request" / FriendRequestId)
        .and(warp::patch())
        .and(json_body())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::manipulate_friend_request);

    let friend_list = warp::path!("friend_list" / UserId)
        .and(warp::get())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::friend_list);

    let check_if_friends = warp::path!("check_if_friends" / UserId / UserId)
        .and(warp::get())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::check_if_friends);

    let delete_friend = warp::path!("delete_friend" / UserId / UserId)
        .and(warp::delete())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::delete_friend);

    let users = create_user
        .or(list_users)
        .or(get_user)
        .or(update_user)
        .or(delete_user);

    let relationships = create_friend_request
        .or(friend_requests_list)
        .or(manipulate_friend_request)
        .or(friend_list)
        .or(check_if_friends)
        .or(delete_friend);

    users.or(relationships)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}
