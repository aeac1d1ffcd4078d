//! Document store seeder for HackPortal development and testing.
//!
//! Seeds sample applicant documents into a collection (default `testing`).
//! Applicants whose email is already present are skipped, so the seeder can
//! be rerun safely.
//!
//! Usage: cargo run --bin seeder -- [collection]

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hackportal_db::bson::{Document, doc};
use hackportal_db::{Collection, DocumentRepository};
use hackportal_shared::AppConfig;

/// Environment variable selecting the target collection.
const SEED_COLLECTION_VAR: &str = "SEED_COLLECTION";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackportal=debug,seeder=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let collection = target_collection()?;
    let config = AppConfig::load().context("failed to load configuration")?;

    let store = hackportal_db::connect(&config.database).await?;
    info!(database = %config.database.name, %collection, "Connected to document store");

    let repo = DocumentRepository::new(store);
    let mut inserted = 0_usize;
    for applicant in sample_applicants() {
        let email = applicant.get_str("email").context("sample applicant has no email")?;

        if repo
            .retrieve_one(collection, doc! { "email": email }, Some(&["email"]))
            .await?
            .is_some()
        {
            info!(email, "Applicant already exists, skipping");
            continue;
        }

        let id = repo.insert(collection, applicant.clone()).await?;
        info!(email, %id, "Seeded applicant");
        inserted += 1;
    }

    info!(inserted, "Seeding complete");
    Ok(())
}

fn target_collection() -> anyhow::Result<Collection> {
    let name = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(SEED_COLLECTION_VAR).ok());

    match name {
        Some(name) => Ok(name.parse()?),
        None => Ok(Collection::Testing),
    }
}

fn sample_applicants() -> Vec<Document> {
    vec![
        doc! {
            "first_name": "Peter",
            "last_name": "Anteater",
            "email": "peter.anteater@uci.edu",
            "gender": "Male",
            "pronouns": ["he", "him"],
            "ethnicity": "Prefer not to answer",
            "is_18_older": true,
            "curr_education": "Undergraduate",
            "school_name": "University of California, Irvine",
            "major": "Computer Science",
            "is_first_hackathon": false,
        },
        doc! {
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada.lovelace@example.edu",
            "gender": "Female",
            "pronouns": ["she", "her"],
            "ethnicity": "White",
            "is_18_older": true,
            "curr_education": "Graduate",
            "school_name": "University of London",
            "major": "Mathematics",
            "is_first_hackathon": true,
        },
        doc! {
            "first_name": "Sam",
            "last_name": "Rivera",
            "email": "sam.rivera@example.edu",
            "gender": "Non-binary",
            "pronouns": ["they", "them"],
            "ethnicity": "Hispanic or Latino",
            "is_18_older": false,
            "curr_education": "High School",
            "school_name": "Irvine High School",
            "major": "Undeclared",
            "is_first_hackathon": true,
        },
    ]
}
