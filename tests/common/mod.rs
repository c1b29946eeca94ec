use wishledger::application::engine::{Engine, RegisterUser};
use wishledger::application::wishes::CreateWish;
use wishledger::domain::currency::Currency;
use wishledger::domain::ids::{UserId, WishId};

pub async fn register(engine: &Engine, handle: &str) -> UserId {
    engine
        .register_user(RegisterUser {
            name: handle.to_string(),
            handle: handle.to_string(),
        })
        .await
        .unwrap()
        .id
}

pub async fn befriend(engine: &Engine, a: UserId, b: UserId) {
    let request = engine.request_friend(a, b).await.unwrap();
    engine.accept_friend(request.id, b).await.unwrap();
}

pub async fn create_wish(
    engine: &Engine,
    creator_id: UserId,
    title: &str,
    currency: Currency,
) -> WishId {
    engine
        .create_wish(CreateWish {
            creator_id,
            title: title.to_string(),
            description: String::new(),
            currency,
            deadline: None,
        })
        .await
        .unwrap()
        .id
}
