//! Network agent: listening TCP sockets and bound UDP sockets.
//!
//! Opened and closed listeners found in one poll are batched into a single
//! `network_ports_change` event.

use serde_json::json;

use hostledger_contracts::{
    domain::Domain,
    event::{Event, Severity},
    snapshot::{PortListener, PortSnapshot},
};

use super::{details_from, BaselineDiffAgent, DiffPolicy};
use crate::diff::diff_maps;

pub const NETWORK_PORTS_BASELINE: &str = "network_ports_baseline";
pub const NETWORK_PORTS_CHANGE: &str = "network_ports_change";

pub struct NetworkPorts;

pub type NetworkAgent = BaselineDiffAgent<NetworkPorts>;

fn listeners<'a>(snapshot: &'a PortSnapshot, keys: &[String]) -> Vec<&'a PortListener> {
    keys.iter().filter_map(|key| snapshot.get(key)).collect()
}

impl DiffPolicy for NetworkPorts {
    type Snapshot = PortSnapshot;

    const DOMAIN: Domain = Domain::Network;
    const SOURCE: &'static str = "network-agent";
    const CHECK_ERROR: &'static str = "network_ports_check_error";

    fn has_baseline(baseline: &PortSnapshot) -> bool {
        !baseline.is_empty()
    }

    fn baseline_event(current: &PortSnapshot) -> Event {
        let all: Vec<&PortListener> = current.values().collect();
        Event::new(
            NETWORK_PORTS_BASELINE,
            Self::SOURCE,
            Severity::Info,
            format!("Network baseline recorded: {} listening ports", all.len()),
            details_from(json!({ "listeners": all })),
        )
    }

    fn diff_events(baseline: &PortSnapshot, current: &PortSnapshot) -> Vec<Event> {
        // A changed pid on an existing key is not an open/close; the baseline
        // simply picks it up.
        let diff = diff_maps(baseline, current);
        if diff.added.is_empty() && diff.removed.is_empty() {
            return Vec::new();
        }

        let opened = listeners(current, &diff.added);
        let closed = listeners(baseline, &diff.removed);

        vec![Event::new(
            NETWORK_PORTS_CHANGE,
            Self::SOURCE,
            Severity::Medium,
            format!(
                "Listening ports changed: {} opened, {} closed",
                opened.len(),
                closed.len()
            ),
            details_from(json!({ "opened": opened, "closed": closed })),
        )]
    }
}
