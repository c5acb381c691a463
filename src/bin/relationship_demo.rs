/// Walks three users through the friend-request lifecycle against the in-memory store and
/// prints each step.
///
/// $ cargo run --bin relationship_demo
use concord::application_port::*;
use concord::domain_model::*;
use concord::logger::*;
use concord::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "relationship_demo=info,concord=debug".to_string(),
    })?;

    let server = Server::in_memory();
    let users = server.user_service.clone();
    let relations = server.relationship_service.clone();

    let u1 = users.create_user("User1").await?;
    let u2 = users.create_user("User2").await?;
    let u3 = users.create_user("User3").await?;
    println!("users: {:?}", users.list_users().await?);

    let send = |from: &User, to: &User| CreateRequestInput {
        from_user: Some(from.id),
        to_user: Some(to.id),
    };

    let r1 = relations.create_request(send(&u1, &u2)).await?.into_request();
    let r2 = relations.create_request(send(&u3, &u1)).await?.into_request();
    println!("sent: #{} {} -> {}", r1.id, r1.from_user.username, r1.to_user.username);
    println!("sent: #{} {} -> {}", r2.id, r2.from_user.username, r2.to_user.username);

    match relations.create_request(send(&u1, &u2)).await {
        Err(e) => println!("resend rejected: {e}"),
        Ok(outcome) => println!("unexpected resend outcome: {outcome:?}"),
    }

    let accepted = relations
        .manipulate_request(r1.id, RequestDecision::accept())
        .await?;
    println!("accepted #{}: accepted={}", accepted.id, accepted.accepted);

    let pending: Vec<_> = relations
        .list_pending(u1.id)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    println!("pending for {}: {:?}", u1.username, pending);

    for other in [&u2, &u3] {
        let status = relations.check_relationship_status(u1.id, other.id).await?;
        println!("{} / {}: {:?}", u1.username, other.username, status);
    }

    // User1 asking User3 back completes User3's request
    let collapsed = relations.create_request(send(&u1, &u3)).await?;
    println!("mutual request: {:?}", collapsed);

    println!("friends of {}: {:?}", u1.username, relations.list_friend_ids(u1.id).await?);

    relations.delete_friendship(u1.id, u2.id).await?;
    if let Err(e) = relations.delete_friendship(u1.id, u2.id).await {
        println!("second delete rejected: {e}");
    }
    println!("friends of {}: {:?}", u1.username, relations.list_friend_ids(u1.id).await?);

    server.shutdown().await;
    info!("demo finished");
    Ok(())
}
