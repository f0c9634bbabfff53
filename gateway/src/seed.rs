//! Demo seed registry.
//!
//! Monitored coastal sites and the stakeholder roster for the reference
//! deployment. Locations cover the bays the dashboard ships with; recipients
//! cover every role so the template table is exercised end to end.

use crate::store::Store;
use coastal_domain::{MonitoredLocation, Recipient, StakeholderRole};
use tracing::info;
use uuid::Uuid;

/// (name, latitude, longitude)
pub const MONITORED_COASTS: [(&str, f64, f64); 6] = [
    ("Bacoor Bay, Cavite", 14.4443, 120.9333),
    ("Banate Bay, Iloilo", 11.0236, 122.8094),
    ("Davao Gulf, Davao", 7.0731, 125.6128),
    ("Manila Bay, Roxas Boulevard", 14.5547, 120.9575),
    ("Mactan Channel, Cebu", 10.3157, 123.8854),
    ("San Miguel Bay, Camarines Sur", 13.8333, 123.1667),
];

/// (name, role, email, phone, webhook)
type RecipientSeed = (
    &'static str,
    StakeholderRole,
    Option<&'static str>,
    Option<&'static str>,
    Option<&'static str>,
);

pub const STAKEHOLDER_ROSTER: [RecipientSeed; 7] = [
    (
        "NDRRMC Operations Center",
        StakeholderRole::EmergencyManagement,
        Some("ops@ndrrmc.example.ph"),
        Some("+63-2-8911-1406"),
        Some("https://hooks.example.ph/ndrrmc"),
    ),
    (
        "Manila City DRRM Office",
        StakeholderRole::CityGovernment,
        Some("drrmo@manila.example.ph"),
        Some("+63-2-8527-0972"),
        None,
    ),
    (
        "Blue Carbon Alliance PH",
        StakeholderRole::EnvironmentalNgo,
        Some("alerts@bluecarbon.example.org"),
        None,
        None,
    ),
    (
        "Bacoor Fisherfolk Cooperative",
        StakeholderRole::Fisherfolk,
        None,
        Some("+63-917-555-0161"),
        None,
    ),
    (
        "Coast Guard District NCR",
        StakeholderRole::CivilDefence,
        Some("district-ncr@coastguard.example.ph"),
        Some("+63-2-8527-8481"),
        Some("https://hooks.example.ph/pcg-ncr"),
    ),
    (
        "Barangay Baseco Residents",
        StakeholderRole::CoastalResident,
        None,
        Some("+63-918-555-0142"),
        None,
    ),
    (
        "UP Marine Science Institute",
        StakeholderRole::Researcher,
        Some("obs@msi.example.edu.ph"),
        None,
        None,
    ),
];

/// Load the demo registry into an empty store.
pub async fn seed_demo_data(store: &Store) {
    for (name, lat, lon) in MONITORED_COASTS {
        store
            .insert_location(MonitoredLocation::new(name, lat, lon))
            .await;
    }

    for (name, role, email, phone, webhook) in STAKEHOLDER_ROSTER {
        store
            .insert_recipient(Recipient {
                id: Uuid::new_v4(),
                name: name.to_string(),
                role,
                active: true,
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                webhook_url: webhook.map(str::to_string),
            })
            .await;
    }

    info!(
        locations = MONITORED_COASTS.len(),
        recipients = STAKEHOLDER_ROSTER.len(),
        "seed registry loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_loads_everything_active() {
        let store = Store::new();
        seed_demo_data(&store).await;

        assert_eq!(store.active_locations().await.len(), MONITORED_COASTS.len());
        assert_eq!(
            store.active_recipients().await.len(),
            STAKEHOLDER_ROSTER.len()
        );
    }

    #[test]
    fn test_roster_covers_every_role() {
        use StakeholderRole::*;
        for role in [
            EmergencyManagement,
            CityGovernment,
            EnvironmentalNgo,
            Fisherfolk,
            CivilDefence,
            CoastalResident,
            Researcher,
        ] {
            assert!(
                STAKEHOLDER_ROSTER.iter().any(|(_, r, ..)| *r == role),
                "roster missing {:?}",
                role
            );
        }
    }
}
