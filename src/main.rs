use std::time::Duration;

use log::info;
use serde_json::json;

use carmarket_messaging::inquiry::model::InquiryRequest;
use carmarket_messaging::message::model::{Content, Page};
use carmarket_messaging::settings;
use carmarket_messaging::state::AppContext;
use carmarket_messaging::subscription::service::Callbacks;
use carmarket_messaging::user;

#[tokio::main]
async fn main() {
    let config = settings::Config::env();
    settings::init_logging();

    let (ctx, identity, catalog) = AppContext::in_process(&config);
    catalog.put(
        "car-4821",
        json!({"make": "Volvo", "model": "XC60", "year": 2021, "mileage_km": 48_200}),
    );

    let buyer = user::Id::random();
    let dealer = user::Id::random();

    // buyer opens an inquiry about the car
    identity.login(buyer.clone());
    let inquiry = ctx
        .create_dealer_inquiry(InquiryRequest {
            dealer: dealer.clone(),
            car_id: "car-4821".into(),
            message: "Is this one still available?".into(),
            offer: None,
        })
        .await
        .expect("inquiry workflow failed");
    let conversation_id = inquiry.conversation().id().clone();
    info!(
        "opened {} conversation {conversation_id}",
        inquiry.conversation().kind().as_str()
    );

    let callbacks = Callbacks::new()
        .on_message(|message| info!("<< {}", message.content().display_text()))
        .on_typing(|user, is_typing| info!("-- {user} typing: {is_typing}"))
        .on_presence(|user, online| info!("-- {user} online: {online}"));
    ctx.subscribe(&conversation_id, callbacks)
        .await
        .expect("subscription failed");

    // dealer replies
    identity.login(dealer.clone());
    ctx.start_typing(&conversation_id)
        .await
        .expect("typing signal failed");
    tokio::time::sleep(Duration::from_millis(400)).await;
    ctx.send_message(
        &conversation_id,
        Content::Text {
            text: "Yes, still on the lot. Want to book a viewing?".into(),
        },
    )
    .await
    .expect("reply failed");

    // back on the buyer's side
    identity.login(buyer);
    let history = ctx
        .get_messages(&conversation_id, &Page::default())
        .await
        .expect("history read failed");
    let unread = ctx
        .unread_notification_count()
        .await
        .expect("unread count failed");
    info!("{} message(s) in thread, {unread} unread notification(s)", history.len());

    ctx.shutdown().await;
}
