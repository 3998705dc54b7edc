//! Demo rows for local development (`ornotes seed`).

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use super::repositories::user::hash_password;
use crate::config::SecurityConfig;
use crate::entities::{events, operations, prelude::*, users};

const USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Jan", "Kowalski", "Doctor", "jan.kowalski@example.com", "password123"),
    ("Anna", "Nowak", "Nurse", "anna.nowak@example.com", "securepass"),
    ("Piotr", "Wiśniewski", "Surgeon", "piotr.wisniewski@example.com", "strongpassword"),
];

/// (room, surgeon email, first name, last name, patient id, procedure)
const OPERATIONS: &[(i32, &str, &str, &str, &str, &str)] = &[
    (1, "jan.kowalski@example.com", "Tomasz", "Lis", "90010112345", "Appendectomy"),
    (2, "piotr.wisniewski@example.com", "Marek", "Zieliński", "85050567890", "Heart Bypass"),
    (3, "jan.kowalski@example.com", "Katarzyna", "Dąbrowska", "92031245678", "Knee Replacement"),
];

/// (patient id, event type, event value)
const EVENTS: &[(&str, &str, &str)] = &[
    ("90010112345", "anesthesia", "Patient admitted"),
    ("90010112345", "medicine", "Anesthesia applied"),
    ("90010112345", "medicine", "Surgery started"),
    ("90010112345", "medicine", "Surgery completed"),
    ("85050567890", "medicine", "Patient admitted"),
    ("85050567890", "medicine", "Initial diagnostics performed"),
    ("85050567890", "medicine", "Surgery in progress"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub operations: usize,
    pub events: usize,
}

pub(super) async fn seed(conn: &DatabaseConnection, security: &SecurityConfig) -> Result<SeedSummary> {
    let mut hashes = Vec::with_capacity(USERS.len());
    for (_, _, _, _, password) in USERS {
        let password = (*password).to_string();
        let config = security.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;
        hashes.push(hash);
    }

    let txn = conn.begin().await?;
    let mut summary = SeedSummary::default();

    for ((first, last, role, email, _), hash) in USERS.iter().zip(hashes) {
        let exists = Users::find()
            .filter(users::Column::Email.eq(*email))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }

        Users::insert(users::ActiveModel {
            first_name: Set((*first).to_string()),
            last_name: Set((*last).to_string()),
            role: Set((*role).to_string()),
            email: Set((*email).to_string()),
            password_hash: Set(hash),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        summary.users += 1;
    }

    for (room_id, email, first, last, patient_id, procedure) in OPERATIONS {
        let exists = Operations::find()
            .filter(operations::Column::PatientId.eq(*patient_id))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let user = Users::find()
            .filter(users::Column::Email.eq(*email))
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fixture user {email} missing"))?;

        let inserted = Operations::insert(operations::ActiveModel {
            room_id: Set(*room_id),
            user_id: Set(user.id),
            patient_first_name: Set((*first).to_string()),
            patient_last_name: Set((*last).to_string()),
            patient_id: Set((*patient_id).to_string()),
            operation_type: Set((*procedure).to_string()),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        summary.operations += 1;

        for (_, event_type, event_value) in EVENTS.iter().filter(|(p, _, _)| p == patient_id) {
            Events::insert(events::ActiveModel {
                operation_id: Set(inserted.last_insert_id),
                event_type: Set((*event_type).to_string()),
                event_value: Set((*event_value).to_string()),
                ..Default::default()
            })
            .exec(&txn)
            .await?;
            summary.events += 1;
        }
    }

    txn.commit().await?;

    info!(
        users = summary.users,
        operations = summary.operations,
        events = summary.events,
        "Sample data seeded"
    );
    Ok(summary)
}
