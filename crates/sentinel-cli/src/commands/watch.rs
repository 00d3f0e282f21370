//! Watch command - stream session events while refreshing on an interval

use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use sentinel_types::WalletError;
use sentinel_wallet::WalletSession;

use super::dollars;
use crate::display;

/// Refresh every `interval_secs` and print events until Ctrl+C
pub async fn run(session: &WalletSession, interval_secs: u64) -> anyhow::Result<()> {
    let address = session.address().ok_or(WalletError::NoActiveSession)?;
    let mut events = session.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut dashboard = session.dashboard_balance()?;

    display::section("Watching Wallet");
    display::labeled("Address", address.as_str());
    display::labeled("Interval", &format!("{}s", interval_secs.max(1)));
    display::note("Press Ctrl+C to stop");
    println!();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.refresh_balance(&address).await;

                // Other processes write the same session file
                let current = session.dashboard_balance()?;
                if current != dashboard {
                    display::info(&format!(
                        "Dashboard balance changed: {} → {}",
                        dollars(dashboard),
                        dollars(current)
                    ));
                    dashboard = current;
                }
            }
            received = events.recv() => match received {
                Ok(event) => display::event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    display::warning(&format!("Skipped {} events", skipped));
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                println!();
                display::info("Stopped watching");
                break;
            }
        }
    }

    Ok(())
}
