//! Account agent: local users and administrators-group membership.
//!
//! Both sets come from the same snapshot and are replaced together, so a
//! poll never leaves one updated and the other stale. Any change to either
//! set produces one combined `user_accounts_change` event.

use serde_json::json;

use hostledger_contracts::{
    domain::Domain,
    event::{Event, Severity},
    snapshot::AccountSnapshot,
};

use super::{details_from, BaselineDiffAgent, DiffPolicy};
use crate::diff::diff_sets;

pub const USER_ACCOUNTS_BASELINE: &str = "user_accounts_baseline";
pub const USER_ACCOUNTS_CHANGE: &str = "user_accounts_change";

pub struct AccountMembership;

pub type AccountAgent = BaselineDiffAgent<AccountMembership>;

impl DiffPolicy for AccountMembership {
    type Snapshot = AccountSnapshot;

    const DOMAIN: Domain = Domain::Accounts;
    const SOURCE: &'static str = "account-agent";
    const CHECK_ERROR: &'static str = "user_accounts_check_error";

    fn has_baseline(baseline: &AccountSnapshot) -> bool {
        !baseline.is_empty()
    }

    fn baseline_event(current: &AccountSnapshot) -> Event {
        Event::new(
            USER_ACCOUNTS_BASELINE,
            Self::SOURCE,
            Severity::Info,
            format!(
                "Account baseline recorded: {} users, {} administrators",
                current.users.len(),
                current.admins.len()
            ),
            details_from(json!({ "users": current.users, "admins": current.admins })),
        )
    }

    fn diff_events(baseline: &AccountSnapshot, current: &AccountSnapshot) -> Vec<Event> {
        let users = diff_sets(&baseline.users, &current.users);
        let admins = diff_sets(&baseline.admins, &current.admins);
        if users.is_empty() && admins.is_empty() {
            return Vec::new();
        }

        vec![Event::new(
            USER_ACCOUNTS_CHANGE,
            Self::SOURCE,
            Severity::High,
            format!(
                "Local accounts changed: users +{}/-{}, administrators +{}/-{}",
                users.added.len(),
                users.removed.len(),
                admins.added.len(),
                admins.removed.len()
            ),
            details_from(json!({
                "usersAdded": users.added,
                "usersRemoved": users.removed,
                "adminsAdded": admins.added,
                "adminsRemoved": admins.removed,
            })),
        )]
    }
}
