use aerobook_client::BookingClient;
use aerobook_core::{Identity, Role};
use anyhow::Context;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn identity_from_env() -> Option<Identity> {
    let user_id = env::var("AEROBOOK_USER_ID").ok()?;
    let token = env::var("AEROBOOK_TOKEN").ok()?;
    let role = match env::var("AEROBOOK_ROLE").as_deref() {
        Ok("admin") => Role::Admin,
        _ => Role::Passenger,
    };
    Some(Identity::new(user_id, token, role))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aerobook_client=debug,aerobook_store=debug,aerobook_order=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = aerobook_store::Config::load().context("Failed to load config")?;
    tracing::info!("Using booking gateway at {}", config.gateway.base_url);

    let mut client = BookingClient::from_config(&config).context("Failed to build gateway client")?;

    let flights = client.load_catalog().await.context("Failed to load flights")?;
    tracing::info!("{} flights in catalog", flights.len());

    let Some(identity) = identity_from_env() else {
        tracing::warn!("AEROBOOK_USER_ID / AEROBOOK_TOKEN not set; nothing else to do");
        return Ok(());
    };
    let is_admin = identity.is_admin();
    client.sign_in(identity).await;

    if is_admin {
        let report = client.order_report().await.context("Failed to load order report")?;
        for row in &report.rows {
            println!("{}\t{}\t{}", row.user_id, row.order_count, row.total_price);
        }
        println!("total\t{}\t{}", report.total_orders, report.total_price);
        return Ok(());
    }

    client.refresh_tickets().await.context("Failed to load tickets")?;
    for ticket in client.tickets().await {
        tracing::info!("{} {} {} {}", ticket.ticket_id, ticket.flight_id, ticket.price, ticket.state);
    }

    client.start_polling().await?;
    let mut events = client.subscribe();

    // Follow settlements until interrupted
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(transition) => tracing::info!("{:?}", transition),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Missed {} ticket updates", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("Shutting down");
    client.sign_out().await;
    Ok(())
}
