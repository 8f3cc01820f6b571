//! Sync-unit naming, scopes, and bundles.
//!
//! Unit name space: `favorites/{favoriteType}`, `keyboards/{uid}/settings`,
//! `keyboards/{uid}/snapshots`. Units are the unit of conflict, failure, and
//! progress reporting.

use crate::sync::local::LocalStore;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Build the unit name for a favorite type.
pub fn favorites_unit(favorite_type: &str) -> String {
    format!("favorites/{}", favorite_type)
}

/// Build the settings unit name for a keyboard.
pub fn keyboard_settings_unit(uid: &str) -> String {
    format!("keyboards/{}/settings", uid)
}

/// Build the snapshots unit name for a keyboard.
pub fn keyboard_snapshots_unit(uid: &str) -> String {
    format!("keyboards/{}/snapshots", uid)
}

/// The set of sync units a given sync operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every known unit (full operations such as change-password or the
    /// undecryptable listing).
    All,
    /// All favorite-type units.
    Favorites,
    /// Units for one keyboard.
    Keyboard(String),
    /// All favorites plus one keyboard's units.
    FavoritesAndKeyboard(String),
}

impl Scope {
    /// Resolve this scope to concrete unit names from the local indices.
    ///
    /// Resolution is local-index driven; the orchestrator unions in the
    /// remote listing for `All`-scope downloads so a full restore reaches
    /// units with no local counterpart.
    pub async fn resolve(&self, local: &dyn LocalStore) -> Result<Vec<String>> {
        let mut units = Vec::new();

        match self {
            Scope::All => {
                units.extend(SyncBundle::favorites(&local.favorite_types().await?).units);
                for uid in local.keyboard_uids().await? {
                    units.extend(SyncBundle::keyboard(&uid).units);
                }
            }
            Scope::Favorites => {
                units.extend(SyncBundle::favorites(&local.favorite_types().await?).units);
            }
            Scope::Keyboard(uid) => {
                units.extend(SyncBundle::keyboard(uid).units);
            }
            Scope::FavoritesAndKeyboard(uid) => {
                units.extend(SyncBundle::favorites(&local.favorite_types().await?).units);
                units.extend(SyncBundle::keyboard(uid).units);
            }
        }

        units.dedup();
        Ok(units)
    }
}

/// A named collection of sync units plus the index describing them, used
/// when a logical save/load spans multiple files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBundle {
    pub name: String,
    pub units: Vec<String>,
}

impl SyncBundle {
    /// Bundle of all favorite-type units from the favorite-type index.
    pub fn favorites(favorite_types: &[String]) -> Self {
        Self {
            name: "favorites".to_string(),
            units: favorite_types.iter().map(|t| favorites_unit(t)).collect(),
        }
    }

    /// Bundle of one keyboard's settings and snapshots units.
    pub fn keyboard(uid: &str) -> Self {
        Self {
            name: format!("keyboards/{}", uid),
            units: vec![keyboard_settings_unit(uid), keyboard_snapshots_unit(uid)],
        }
    }
}
