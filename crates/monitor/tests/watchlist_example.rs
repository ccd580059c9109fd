//! Integration test: the shipped example watchlist parses against the
//! schema and drives the evaluate → compose pipeline end to end.

use vipwatch_monitor::composer::Composer;
use vipwatch_monitor::evaluator::evaluate;
use vipwatch_monitor::snapshot::from_user_record;
use vipwatch_monitor::watchlist::WatchlistDoc;

/// Resolve the example config relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn example_watchlist() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../config/watchlist.yaml")
}

#[test]
fn example_watchlist_parses() {
    let doc = WatchlistDoc::from_path(&example_watchlist())
        .unwrap_or_else(|e| panic!("failed to load example watchlist: {e}"));

    assert_eq!(doc.users, vec!["jdoe", "asmith"]);
    assert_eq!(doc.devices, vec!["00:1a:2b:3c:4d:5e"]);
    assert_eq!(doc.thresholds.min_health_score, 5);
    assert_eq!(doc.thresholds.min_snr, 12.5);
    assert!(doc.templates.is_none());

    let policy = doc.policy();
    assert_eq!(policy.max_alerts_per_run, 5);
    assert_eq!(policy.inter_alert_delay.as_secs(), 30);
}

#[test]
fn example_policy_drives_the_pipeline() {
    let doc = WatchlistDoc::from_path(&example_watchlist()).unwrap();
    let policy = doc.policy();

    let record = serde_json::json!({
        "userDetails": {
            "hostMac": "aa:bb:cc:dd:ee:ff",
            "userId": "jdoe",
            "healthScore": [{"healthType": "OVERALL", "score": 4}],
            "snr": 30.0,
            "rssi": -52.0,
            "issueCount": 0,
            "txLinkError": 0,
            "rxLinkError": 0,
            "connectionStatus": "CONNECTED",
            "location": "HQ/Floor2",
            "clientConnection": "AP-Floor2-03",
            "txRate": 54000000.0,
            "rxRate": 54000000.0
        }
    });

    let snapshot = from_user_record(&record).unwrap();
    let result = evaluate(&snapshot, &policy);

    // Score 4 is below the example floor of 5; everything else is healthy.
    assert!(result.alert);
    assert_eq!(result.reasons.len(), 1);
    assert!(result.reasons[0].contains("overall health score is 4"));

    let composer = Composer::new(doc.templates.as_ref()).unwrap();
    let notification = composer.compose(&snapshot, &result.reasons, "").unwrap();
    assert_eq!(notification.subject, "VIP client alert for user jdoe");
    assert!(notification.body.contains("overall health score is 4"));
}
