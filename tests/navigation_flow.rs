//! 导航流程验收测试
//!
//! End-to-end navigation flows driven through the public session API.

mod common;

use common::{bridge_message, setup_session, visit_event, visitable};
use navstack::config::Config;
use navstack::renderer::{RendererCommand, VisitAction, VisitEvent};
use navstack::session::{
    event_channel, DelegateCall, SessionEvent, ViewEvent, VisitKind, VisitState, VisitableCall,
};
use navstack::VisitFailure;

#[tokio::test]
async fn test_push_and_back_with_restoration() {
    let mut t = setup_session(Config::default()).await.unwrap();
    let (home, home_dyn) = visitable("https://example.com/");
    let (orders, orders_dyn) = visitable("https://example.com/orders");

    // Cold boot home
    t.session.visit(&home_dyn).await;
    t.session
        .handle_script_message(r#"{"name":"pageLoaded","data":{"restorationIdentifier":"home-1"}}"#)
        .await
        .unwrap();
    t.session.visitable_did_appear(&home_dyn).await;
    assert!(t.session.is_initialized());
    assert!(home.has_renderer());

    // Push orders
    t.session.visit(&orders_dyn).await;
    t.session.visitable_will_disappear(&home_dyn);
    t.session.visitable_will_appear(&orders_dyn, false).await;
    t.session.visitable_did_appear(&orders_dyn).await;
    let push = t.session.last_issued_visit().unwrap();
    assert_eq!(push.kind(), VisitKind::Fast);
    for name in ["visitStarted", "visitRequestStarted", "visitRequestCompleted", "visitRequestFinished", "visitCompleted"] {
        t.session
            .handle_script_message(&bridge_message(name, &push))
            .await
            .unwrap();
    }
    assert_eq!(push.state(), VisitState::Completed);
    assert!(orders.has_renderer());
    assert!(!home.has_renderer());

    // Back to home
    t.session.visitable_will_disappear(&orders_dyn);
    t.session.visitable_will_appear(&home_dyn, false).await;
    let back = t.session.last_issued_visit().unwrap();
    t.session.visitable_did_appear(&home_dyn).await;

    assert_eq!(back.action(), VisitAction::Restore);
    assert_eq!(back.restoration_identifier(), Some("home-1"));
    assert!(t.renderer.commands().contains(&RendererCommand::PerformInPageTransition {
        visit_id: back.id(),
        location: home_dyn.location().unwrap(),
        action: VisitAction::Restore,
        restoration_identifier: Some("home-1".to_string()),
    }));
    assert!(t
        .renderer
        .commands()
        .contains(&RendererCommand::CompleteTransition(back.id())));

    t.session
        .handle_script_message(&bridge_message("visitSnapshotRestored", &back))
        .await
        .unwrap();
    assert!(!home.is_snapshot_shown());
    assert!(home.has_renderer());
    assert!(!orders.has_renderer());
}

#[tokio::test]
async fn test_event_loop_serializes_view_and_bridge_events() {
    let t = setup_session(Config::default()).await.unwrap();
    let (sender, rx) = event_channel(t.session.config());
    let (home, home_dyn) = visitable("https://example.com/");

    let handle = tokio::spawn(t.session.run(rx));

    sender.view(ViewEvent::Visit(home_dyn.clone())).await.unwrap();
    sender
        .script_message(r#"{"name":"pageLoaded"}"#)
        .await
        .unwrap();
    sender.view(ViewEvent::DidAppear(home_dyn.clone())).await.unwrap();
    sender
        .script_message(r#"{"name":"visitProposed","data":{"location":"https://example.com/help"}}"#)
        .await
        .unwrap();
    drop(sender);

    let session = handle.await.unwrap();
    assert!(session.is_initialized());
    assert_eq!(session.topmost_visit().unwrap().state(), VisitState::Completed);
    assert!(!home.is_snapshot_shown());
    assert!(t.delegate.calls().contains(&DelegateCall::ProposedNavigation(
        url::Url::parse("https://example.com/help").unwrap(),
        VisitAction::Advance,
    )));
}

#[tokio::test]
async fn test_invalidated_page_reboots_through_bridge() {
    let mut t = setup_session(Config::default()).await.unwrap();
    let (home, home_dyn) = visitable("https://example.com/");

    t.session.visit(&home_dyn).await;
    t.session
        .handle_script_message(r#"{"name":"pageLoaded"}"#)
        .await
        .unwrap();
    t.session.visitable_did_appear(&home_dyn).await;

    t.session
        .handle_script_message(r#"{"name":"pageInvalidated"}"#)
        .await
        .unwrap();

    let reboot = t.session.last_issued_visit().unwrap();
    assert_eq!(reboot.kind(), VisitKind::ColdBoot);
    assert!(!t.session.is_initialized());
    assert_eq!(t.renderer.full_loads().len(), 2);
    assert!(home.is_activity_indicator_shown());

    t.session
        .handle_script_message(r#"{"name":"pageLoaded"}"#)
        .await
        .unwrap();
    assert!(t.session.is_initialized());
    assert!(!home.is_activity_indicator_shown());
}

#[tokio::test]
async fn test_http_error_reaches_delegate() {
    let mut t = setup_session(Config::default()).await.unwrap();
    let (_, home_dyn) = visitable("https://example.com/");
    let (missing, missing_dyn) = visitable("https://example.com/missing");

    t.session.visit(&home_dyn).await;
    t.session
        .handle_renderer_event(visit_event(
            &t.session.last_issued_visit().unwrap(),
            VisitEvent::RendererInitialized,
        ))
        .await;

    t.session.visit(&missing_dyn).await;
    let visit = t.session.last_issued_visit().unwrap();
    let body = serde_json::json!({
        "name": "visitRequestFailed",
        "data": { "identifier": visit.id().to_string(), "statusCode": 404 }
    })
    .to_string();
    t.session.handle_script_message(&body).await.unwrap();

    assert_eq!(t.delegate.failures(), vec![VisitFailure::Status(404)]);
    assert!(!missing.has_renderer());
    assert_eq!(missing.count(&VisitableCall::HideSnapshot), 1);
}

#[tokio::test]
async fn test_stale_bridge_messages_are_ignored() {
    let mut t = setup_session(Config::default()).await.unwrap();
    let (_, home_dyn) = visitable("https://example.com/");
    let (_, a_dyn) = visitable("https://example.com/a");
    let (b, b_dyn) = visitable("https://example.com/b");

    t.session.visit(&home_dyn).await;
    t.session
        .handle_script_message(r#"{"name":"pageLoaded"}"#)
        .await
        .unwrap();

    t.session.visit(&a_dyn).await;
    let stale = t.session.last_issued_visit().unwrap();
    t.session.visit(&b_dyn).await;
    t.delegate.clear_calls();

    for name in ["visitRequestStarted", "visitCompleted"] {
        t.session
            .dispatch(SessionEvent::ScriptMessage(bridge_message(name, &stale)))
            .await
            .unwrap();
    }

    assert_eq!(stale.state(), VisitState::Canceled);
    assert!(t.delegate.calls().is_empty());
    assert!(b.has_renderer());
}
