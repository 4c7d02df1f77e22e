/**
 * ClubHub Client Entry Point
 *
 * Loads the configuration, refreshes the club registry through the
 * reconciler and prints the clubs with the current user's role in each.
 */

use clubhub::app::clubs::{queries, ClubRegistry, HttpClubBackend, RequestLifecycle};
use clubhub::app::local_db::LocalDatabase;
use clubhub::app::offline::Reconciler;
use clubhub::app::sync::{MembershipMirror, SyncBus};
use clubhub::app::Config;
use clubhub::shared::UserId;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "clubhub=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let mut config = match std::env::var("CLUBHUB_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::new(),
    };
    config.set_token(std::env::var("CLUBHUB_TOKEN").ok());
    let me = UserId::new(std::env::var("CLUBHUB_USER_ID").unwrap_or_else(|_| "seed-ben".to_string()));
    tracing::info!("[STARTUP] using backend {}", config.server_url());

    let bus = SyncBus::new();
    let registry = Arc::new(ClubRegistry::new(bus.clone()));
    let mirror = MembershipMirror::new();
    let _subscriptions = mirror.attach(&bus);

    let mut reconciler = Reconciler::new(
        HttpClubBackend::new(config.clone()),
        registry.clone(),
        config.request_timeout(),
    )
    .with_seed_fallback(config.seed_fallback());
    match LocalDatabase::open(config.cache_path()).await {
        Ok(cache) => reconciler = reconciler.with_cache(cache),
        Err(e) => tracing::warn!("[CACHE] snapshot cache unavailable: {}", e),
    }
    let lifecycle = RequestLifecycle::new(reconciler);

    let (source, memberships) = futures_util::future::join(
        lifecycle.reconciler().refresh_registry(&me),
        lifecycle.reconciler().fetch_memberships(&me),
    )
    .await;
    let source = source?;
    println!("Clubs ({:?}):", source);

    for club in lifecycle.registry().list_clubs() {
        println!(
            "  {:<24} {:<10} {:>3} members  {:>2} pending  you: {}",
            club.name,
            club.category.as_str(),
            queries::reconcile_count(Some(&club)),
            queries::pending_count_of(Some(&club)),
            queries::role_of(Some(&club), &me),
        );
        debug_assert_eq!(mirror.member_count(&club.id), club.member_count);
    }

    match memberships {
        Ok(fetched) => {
            println!("Memberships of {} ({:?}):", me, fetched.source);
            for membership in fetched.data {
                println!("  {} as {}", membership.club_name, membership.role);
            }
        }
        Err(e) => println!("Memberships of {} unavailable: {}", me, e),
    }

    Ok(())
}
