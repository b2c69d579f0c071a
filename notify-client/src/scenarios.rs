use anyhow::Result;
use bridge::alert::AlertHistory;
use bridge::feed::sse::SseFeed;
use bridge::{BridgeState, NotificationBridge, Session};
use colored::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::TestResult;
use crate::terminal::TerminalSurface;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_secs(1);

fn recording_bridge(api_client: &ApiClient) -> (NotificationBridge, Arc<AlertHistory>) {
    let history = Arc::new(AlertHistory::new());
    let bridge = NotificationBridge::new(
        Arc::new(SseFeed::new(api_client.base_url())),
        Arc::new(TerminalSurface::recording(history.clone())),
    );
    (bridge, history)
}

/// Mount without a session and confirm nothing is subscribed.
pub async fn test_no_session(api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: No Session ===".bright_cyan().bold());

    let (bridge, _history) = recording_bridge(api_client);
    let mut handle = bridge.mount(None::<Session>);

    let state = handle.settled().await;
    handle.unmount().await?;

    if state == BridgeState::Inactive {
        println!("{} No subscription opened", "✓".green());
        Ok(TestResult::pass("no_session", start.elapsed()))
    } else {
        println!("{} Bridge subscribed without a session!", "✗".red());
        Ok(TestResult::fail(
            "no_session",
            format!("Expected Inactive, got {:?}", state),
            start.elapsed(),
        ))
    }
}

/// Two inserts arrive as two alerts in insert order, and nothing arrives
/// after unmount.
pub async fn test_delivery_order(api_client: &ApiClient, user_id: &str) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Delivery Order ===".bright_cyan().bold());

    let (bridge, history) = recording_bridge(api_client);
    let mut handle = bridge.mount(Session::new(user_id));

    println!("{} Mounting bridge for {}...", "→".blue(), user_id);
    let state = handle.settled().await;
    if state != BridgeState::Subscribed {
        let message = match handle.unmount().await {
            Err(e) => format!("Subscription failed: {}", e),
            Ok(()) => format!("Expected Subscribed, got {:?}", state),
        };
        println!("{} {}", "✗".red(), message);
        return Ok(TestResult::fail("delivery_order", message, start.elapsed()));
    }
    println!("{} Subscribed", "✓".green());

    println!("{} Inserting T1 and T2...", "→".blue());
    api_client.create_notification(user_id, "T1", "B1").await?;
    api_client.create_notification(user_id, "T2", "B2").await?;

    if !history.wait_for(2, DELIVERY_TIMEOUT).await {
        let received = history.len();
        handle.unmount().await?;
        println!("{} Timeout waiting for alerts", "✗".red());
        return Ok(TestResult::fail(
            "delivery_order",
            format!("Timeout: received {} of 2 alerts", received),
            start.elapsed(),
        ));
    }

    let titles: Vec<String> = history.alerts().into_iter().map(|a| a.title).collect();
    if titles != ["T1", "T2"] {
        handle.unmount().await?;
        println!("{} Alerts out of order!", "✗".red());
        return Ok(TestResult::fail(
            "delivery_order",
            format!("Expected [T1, T2], got {:?}", titles),
            start.elapsed(),
        ));
    }
    println!("{} Alerts received in order", "✓".green());

    println!("{} Unmounting and inserting T3...", "→".blue());
    handle.unmount().await?;
    api_client.create_notification(user_id, "T3", "B3").await?;
    tokio::time::sleep(QUIET_PERIOD).await;

    if history.len() == 2 {
        println!("{} No alert after unmount", "✓".green());
        Ok(TestResult::pass("delivery_order", start.elapsed()))
    } else {
        println!("{} Alert shown after unmount!", "✗".red());
        Ok(TestResult::fail(
            "delivery_order",
            format!("Expected 2 alerts after unmount, got {}", history.len()),
            start.elapsed(),
        ))
    }
}
