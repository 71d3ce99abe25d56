use std::sync::{Arc, Mutex};
use std::time::Duration;

use carmarket_messaging::conversation::model::NewConversation;
use carmarket_messaging::conversation::{self, Kind, Role};
use carmarket_messaging::integration::identity::StaticIdentity;
use carmarket_messaging::message::model::Content;
use carmarket_messaging::settings::Config;
use carmarket_messaging::state::AppContext;
use carmarket_messaging::subscription::service::Callbacks;
use carmarket_messaging::user;

type TypingEvents = Arc<Mutex<Vec<(user::Id, bool)>>>;

async fn wired_conversation(
    a: &user::Id,
    b: &user::Id,
) -> (AppContext, Arc<StaticIdentity>, conversation::Id, TypingEvents) {
    let (ctx, identity, _) = AppContext::in_process(&Config::default());

    identity.login(a.clone());
    let mut new = NewConversation::new(Kind::Direct);
    new.members = vec![(b.clone(), Role::Member)];
    let conversation = ctx.create_conversation(new).await.unwrap();
    let id = conversation.id().clone();

    let events: TypingEvents = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    identity.login(b.clone());
    ctx.subscribe(
        &id,
        Callbacks::new().on_typing(move |user, is_typing| {
            sink.lock().unwrap().push((user.clone(), is_typing));
        }),
    )
    .await
    .unwrap();

    (ctx, identity, id, events)
}

#[tokio::test(start_paused = true)]
async fn rapid_starts_collapse_into_one_broadcast_pair() {
    let (a, b) = (user::Id::random(), user::Id::random());
    let (ctx, identity, conversation, events) = wired_conversation(&a, &b).await;

    identity.login(a.clone());
    for _ in 0..5 {
        ctx.start_typing(&conversation).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // 2.9s after the last keystroke the indicator is still alive
    tokio::time::sleep(Duration::from_millis(2_800)).await;
    assert_eq!(events.lock().unwrap().clone(), vec![(a.clone(), true)]);

    // and it expires once, roughly 3s after the last call
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        events.lock().unwrap().clone(),
        vec![(a.clone(), true), (a.clone(), false)]
    );

    // long silence afterwards adds nothing
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(events.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn explicit_stop_disarms_the_timer() {
    let (a, b) = (user::Id::random(), user::Id::random());
    let (ctx, identity, conversation, events) = wired_conversation(&a, &b).await;

    identity.login(a.clone());
    ctx.start_typing(&conversation).await.unwrap();
    ctx.stop_typing(&conversation).await.unwrap();

    assert_eq!(
        events.lock().unwrap().clone(),
        vec![(a.clone(), true), (a.clone(), false)]
    );

    // a stop while idle is silent, and no timer is left to fire
    ctx.stop_typing(&conversation).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(events.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn sending_a_message_implies_stop_typing() {
    let (a, b) = (user::Id::random(), user::Id::random());
    let (ctx, identity, conversation, events) = wired_conversation(&a, &b).await;

    identity.login(a.clone());
    ctx.start_typing(&conversation).await.unwrap();
    ctx.send_message(&conversation, Content::Text { text: "done typing".into() })
        .await
        .unwrap();

    assert_eq!(
        events.lock().unwrap().clone(),
        vec![(a.clone(), true), (a.clone(), false)]
    );

    // the expiry timer died with the send
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(events.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn indicators_are_tracked_per_user() {
    let (a, b) = (user::Id::random(), user::Id::random());
    let (ctx, identity, conversation, events) = wired_conversation(&a, &b).await;

    identity.login(a.clone());
    ctx.start_typing(&conversation).await.unwrap();
    identity.login(b.clone());
    ctx.start_typing(&conversation).await.unwrap();

    // one start each; b's keystroke does not refresh a's timer
    tokio::time::sleep(Duration::from_secs(4)).await;

    let recorded = events.lock().unwrap().clone();
    assert_eq!(recorded.iter().filter(|(u, t)| u == &a && *t).count(), 1);
    assert_eq!(recorded.iter().filter(|(u, t)| u == &b && *t).count(), 1);
    assert_eq!(recorded.iter().filter(|(u, t)| u == &a && !*t).count(), 1);
    assert_eq!(recorded.iter().filter(|(u, t)| u == &b && !*t).count(), 1);
}
