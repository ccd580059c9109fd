//! Peer health context for alert bodies.
//!
//! Aggregates the overall health scores of every sibling client in
//! the same enrichment group. Context is best-effort: a sibling
//! without an OVERALL score is skipped, and an empty group renders
//! as an empty block.

use serde::Serialize;
use serde_json::Value;

use crate::snapshot::overall_score;

/// One sibling's health summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerHealth {
    pub hostname: String,
    pub entity_id: String,
    pub score: i64,
}

/// Collect peer health entries from an enrichment group, in the
/// group's own order.
pub fn collect(records: &[Value]) -> Vec<PeerHealth> {
    let mut peers = Vec::new();

    for record in records {
        let detail = match record.get("userDetails") {
            Some(d) => d,
            None => continue,
        };
        let score = match overall_score(detail) {
            Ok(s) => s,
            Err(_) => continue,
        };
        peers.push(PeerHealth {
            hostname: string_or_unknown(detail.get("hostName")),
            entity_id: string_or_unknown(detail.get("id")),
            score,
        });
    }

    peers
}

/// Render the peer entries as the text block embedded in alert bodies.
pub fn render(peers: &[PeerHealth]) -> String {
    let mut block = String::new();
    for peer in peers {
        block.push_str(&format!("- {}\n", peer.hostname));
        block.push_str(&format!("    * id: {}\n", peer.entity_id));
        block.push_str(&format!("    * score: {}\n", peer.score));
    }
    block
}

fn string_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}
