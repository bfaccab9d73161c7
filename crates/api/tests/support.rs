use std::sync::Arc;

use userdesk_core::testing::{MemoryKeyValueStore, MockIdentityProvider};
use userdesk_core::{DelegatedOAuthStrategy, LocalCredentialStrategy};
use userdesk_domain::{ApiConfig, AppConfig};
use userdesk_lib::AppContext;
use wiremock::MockServer;

/// Config pointing the users client at `server`.
pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api: ApiConfig { base_url: format!("{}/api", server.uri()), ..ApiConfig::default() },
        ..AppConfig::default()
    }
}

/// Context over the local strategy with `admin`/`admin` and an in-memory store.
pub fn local_context(server: &MockServer) -> (AppContext, Arc<MemoryKeyValueStore>) {
    let store = Arc::new(MemoryKeyValueStore::new());
    let strategy = Arc::new(LocalCredentialStrategy::new(store.clone(), "admin", "admin"));
    let ctx = AppContext::with_strategy(config_for(server), store.clone(), strategy)
        .expect("failed to build local context");
    (ctx, store)
}

/// Context over the delegated strategy with a scripted provider.
pub fn delegated_context(server: &MockServer) -> (AppContext, Arc<MockIdentityProvider>) {
    let provider = Arc::new(MockIdentityProvider::new());
    let strategy =
        Arc::new(DelegatedOAuthStrategy::new(provider.clone(), vec!["User.Read".to_string()]));
    let ctx = AppContext::with_strategy(
        config_for(server),
        Arc::new(MemoryKeyValueStore::new()),
        strategy,
    )
    .expect("failed to build delegated context");
    (ctx, provider)
}
