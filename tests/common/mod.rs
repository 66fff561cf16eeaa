use resto_chat::application::dialogue::DialogueEngine;
use resto_chat::application::payment::PaymentService;
use resto_chat::domain::menu::sample_menu;
use resto_chat::domain::ports::MenuStore;
use resto_chat::infrastructure::gateway::SimulatedGateway;
use resto_chat::infrastructure::in_memory::{
    InMemoryMenuStore, InMemoryOrderStore, InMemoryUserStore,
};
use resto_chat::interfaces::api::ChatApi;
use std::sync::Arc;

pub struct TestApp {
    pub api: ChatApi,
    pub gateway: Arc<SimulatedGateway>,
    pub payments: Arc<PaymentService>,
}

/// Wires the full stack against in-memory backends and the simulated
/// gateway, with the sample menu seeded.
pub async fn spawn_app() -> TestApp {
    let menu = Arc::new(InMemoryMenuStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    menu.seed(sample_menu()).await.unwrap();

    let gateway = Arc::new(SimulatedGateway::new("http://localhost:3000"));
    let payments = Arc::new(PaymentService::new(
        orders.clone(),
        users.clone(),
        None,
        gateway.clone(),
        "http://localhost:3000",
    ));
    let engine = DialogueEngine::new(menu, users.clone(), orders.clone(), payments.clone());
    let api = ChatApi::new(engine, payments.clone(), users, orders);

    TestApp {
        api,
        gateway,
        payments,
    }
}
