use std::sync::{Arc, Mutex};

use carmarket_messaging::conversation::model::NewConversation;
use carmarket_messaging::conversation::{self, Kind, Role};
use carmarket_messaging::integration::identity::StaticIdentity;
use carmarket_messaging::message::model::{Content, Message, Page};
use carmarket_messaging::message;
use carmarket_messaging::settings::Config;
use carmarket_messaging::state::{AppContext, Error};
use carmarket_messaging::subscription::service::Callbacks;
use carmarket_messaging::user;

fn context() -> (AppContext, Arc<StaticIdentity>) {
    let (ctx, identity, _) = AppContext::in_process(&Config::default());
    (ctx, identity)
}

fn text(s: &str) -> Content {
    Content::Text { text: s.into() }
}

async fn direct(
    ctx: &AppContext,
    identity: &StaticIdentity,
    creator: &user::Id,
    others: &[&user::Id],
) -> conversation::Id {
    identity.login(creator.clone());
    let mut new = NewConversation::new(Kind::Direct);
    new.members = others.iter().map(|u| ((*u).clone(), Role::Member)).collect();
    let conversation = ctx.create_conversation(new).await.unwrap();
    conversation.id().clone()
}

#[tokio::test]
async fn history_is_strictly_increasing_by_created_at() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    for i in 0..5 {
        ctx.send_message(&conversation, text(&format!("message {i}")))
            .await
            .unwrap();
    }

    let history = ctx.get_messages(&conversation, &Page::default()).await.unwrap();
    assert_eq!(history.len(), 5);
    assert!(
        history.windows(2).all(|w| w[0].created_at() < w[1].created_at()),
        "created_at must strictly increase"
    );
    assert_eq!(history[0].content().display_text(), "message 0");
    assert_eq!(history[4].content().display_text(), "message 4");
}

#[tokio::test]
async fn pagination_returns_contiguous_ascending_pages() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    for i in 0..5 {
        ctx.send_message(&conversation, text(&format!("message {i}")))
            .await
            .unwrap();
    }

    let newest = ctx
        .get_messages(&conversation, &Page { before: None, limit: 2 })
        .await
        .unwrap();
    assert_eq!(
        newest.iter().map(|m| m.content().display_text()).collect::<Vec<_>>(),
        ["message 3", "message 4"]
    );

    let older = ctx
        .get_messages(
            &conversation,
            &Page { before: Some(newest[0].created_at()), limit: 2 },
        )
        .await
        .unwrap();
    assert_eq!(
        older.iter().map(|m| m.content().display_text()).collect::<Vec<_>>(),
        ["message 1", "message 2"]
    );
}

#[tokio::test]
async fn outsider_send_is_rejected_without_side_effects() {
    let (ctx, identity) = context();
    let (a, b, outsider) = (user::Id::random(), user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    identity.login(outsider.clone());
    let result = ctx.send_message(&conversation, text("let me in")).await;
    assert!(matches!(
        result,
        Err(Error::_Message(message::Error::NotParticipant(_)))
    ));

    // no message appeared
    identity.login(a.clone());
    let history = ctx.get_messages(&conversation, &Page::default()).await.unwrap();
    assert!(history.is_empty());

    // and nobody was notified
    identity.login(b);
    assert_eq!(ctx.unread_notification_count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    let result = ctx.send_message(&conversation, text("   ")).await;
    assert!(matches!(
        result,
        Err(Error::_Message(message::Error::EmptyText))
    ));
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let (ctx, identity) = context();
    identity.login(user::Id::random());

    let result = ctx.send_message(&conversation::Id::random(), text("hello")).await;
    assert!(matches!(
        result,
        Err(Error::_Message(message::Error::_Conversation(
            conversation::Error::NotFound(_)
        )))
    ));
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    let message = ctx.send_message(&conversation, text("hello")).await.unwrap();
    assert_eq!(message.read_by().len(), 1);
    assert!(message.read_by().contains(&a));

    identity.login(b.clone());
    let first = ctx.mark_message_read(message.id()).await.unwrap();
    let second = ctx.mark_message_read(message.id()).await.unwrap();

    for read in [&first, &second] {
        assert_eq!(read.read_by().len(), 2);
        assert!(read.read_by().contains(&a));
        assert!(read.read_by().contains(&b));
    }
}

#[tokio::test]
async fn fanout_skips_sender_and_muted_participants() {
    let (ctx, identity) = context();
    let (a, b, c) = (user::Id::random(), user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b, &c]).await;

    identity.login(c.clone());
    ctx.set_notifications_enabled(&conversation, false).await.unwrap();

    identity.login(a.clone());
    ctx.send_message(&conversation, text("big news")).await.unwrap();

    identity.login(b.clone());
    assert_eq!(ctx.unread_notification_count().await.unwrap(), 1);
    identity.login(c);
    assert_eq!(ctx.unread_notification_count().await.unwrap(), 0);
    identity.login(a);
    assert_eq!(ctx.unread_notification_count().await.unwrap(), 0);

    // the one notification carries a bounded preview and can be cleared
    let notifications = ctx.notifications.find_all(&b).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].preview(), "big news");
    assert_eq!(notifications[0].conversation_id(), &conversation);

    identity.login(b);
    assert!(ctx.mark_notification_read(notifications[0].id()).await.unwrap());
    assert_eq!(ctx.unread_notification_count().await.unwrap(), 0);
}

#[tokio::test]
async fn recipient_sees_exactly_one_new_message_event() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    let received: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    identity.login(b.clone());
    ctx.subscribe(
        &conversation,
        Callbacks::new().on_message(move |m| sink.lock().unwrap().push(m.clone())),
    )
    .await
    .unwrap();

    identity.login(a.clone());
    ctx.send_message(&conversation, text("hello")).await.unwrap();

    let events = received.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].content().display_text(), "hello");
    assert_eq!(events[0].read_by().len(), 1);
    assert!(events[0].read_by().contains(&a));

    identity.login(b.clone());
    let read = ctx.mark_message_read(events[0].id()).await.unwrap();
    assert!(read.read_by().contains(&a));
    assert!(read.read_by().contains(&b));
}

#[tokio::test]
async fn roles_upgrade_but_never_downgrade() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[]).await;

    ctx.add_participant(&conversation, &b, Role::Dealer).await.unwrap();
    ctx.add_participant(&conversation, &b, Role::Member).await.unwrap();

    let role_of = |participants: Vec<carmarket_messaging::conversation::model::Participant>| {
        participants
            .into_iter()
            .find(|p| p.user_id() == &b)
            .map(|p| *p.role())
    };
    let participants = ctx.conversations.participants(&conversation).await.unwrap();
    assert_eq!(role_of(participants), Some(Role::Dealer));

    ctx.add_participant(&conversation, &b, Role::Admin).await.unwrap();
    let participants = ctx.conversations.participants(&conversation).await.unwrap();
    assert_eq!(role_of(participants), Some(Role::Admin));
}

#[tokio::test]
async fn remove_participant_reports_membership() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    assert!(ctx.remove_participant(&conversation, &b).await);
    assert!(!ctx.remove_participant(&conversation, &b).await);

    // removal also revokes the right to send
    identity.login(b);
    let result = ctx.send_message(&conversation, text("still here?")).await;
    assert!(matches!(
        result,
        Err(Error::_Message(message::Error::NotParticipant(_)))
    ));
}

#[tokio::test]
async fn activity_clock_covers_every_message() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let conversation = direct(&ctx, &identity, &a, &[&b]).await;

    let before = ctx.get_conversation(&conversation).await.unwrap().last_activity_at();
    let message = ctx.send_message(&conversation, text("ping")).await.unwrap();
    let after = ctx.get_conversation(&conversation).await.unwrap().last_activity_at();

    assert!(after >= before);
    assert!(after >= message.created_at());
}

#[tokio::test]
async fn conversations_list_is_most_recent_first() {
    let (ctx, identity) = context();
    let (a, b) = (user::Id::random(), user::Id::random());
    let first = direct(&ctx, &identity, &a, &[&b]).await;
    let second = direct(&ctx, &identity, &a, &[&b]).await;

    // step past the creation millisecond so the bump wins the sort
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ctx.send_message(&first, text("bump")).await.unwrap();

    let conversations = ctx.get_conversations(None).await.unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].id(), &first);
    assert_eq!(conversations[1].id(), &second);

    assert!(ctx.get_conversations(Some(Kind::Support)).await.unwrap().is_empty());
}

#[tokio::test]
async fn operations_require_an_identity() {
    let (ctx, identity) = context();
    identity.logout();

    let result = ctx.create_conversation(NewConversation::new(Kind::Direct)).await;
    assert!(matches!(result, Err(Error::Unauthenticated)));

    let result = ctx.send_message(&conversation::Id::random(), text("hi")).await;
    assert!(matches!(result, Err(Error::Unauthenticated)));
}
