use homefix_client::HomefixClient;
use homefix_core::status::present;
use homefix_core::CancelHandle;
use homefix_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homefix_client=debug,homefix_booking=debug,homefix_chat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting homefix client against {}", config.api.base_url);

    let client = HomefixClient::new(&config)?;
    let Some(session) = client.session().current() else {
        tracing::warn!("No saved session at {}; log in from the app first", config.session.path.display());
        return Ok(());
    };
    if !session.is_technician() {
        tracing::info!(user_id = %session.user_id, "customer session restored; nothing to watch");
        return Ok(());
    }

    client.connect_realtime();
    let mut dashboard = client.dashboard().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    for booking in dashboard.requests() {
        let badge = present(booking.status);
        tracing::info!(booking_id = %booking.id, status = badge.label, color = badge.color, "request");
    }

    let cancel = CancelHandle::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    while let Some(notice) = dashboard.next_notification(&cancel).await {
        tracing::info!(
            booking_id = notice.booking_id.as_deref().unwrap_or("-"),
            requests = dashboard.requests().len(),
            "{}",
            notice.message
        );
    }

    dashboard.close();
    client.socket().close();
    tracing::info!("Shutting down");
    Ok(())
}
