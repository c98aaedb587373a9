//! Charge un jeu de données de démonstration. Rejouable : chaque insertion
//! est gardée par un ON CONFLICT ou un NOT EXISTS.

use anyhow::Result;
use chrono::NaiveDate;
use dotenv::dotenv;
use log::info;
use sqlx::PgPool;

use dialyse_api::config::Config;
use dialyse_api::db;
use dialyse_api::utils::password;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    seed_users(&pool).await?;
    let patient_ids = seed_patients(&pool).await?;
    seed_records(&pool, &patient_ids).await?;
    assign_patients(&pool, &patient_ids).await?;

    pool.close().await;
    info!("Données de démonstration en place");
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<()> {
    let accounts = [
        ("admin", "admin123", "admin"),
        ("medecin1", "medecin123", "user"),
        ("infirmier1", "infirmier123", "user"),
    ];
    for (username, plain, role) in accounts {
        sqlx::query(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(password::hash(plain))
        .bind(role)
        .execute(pool)
        .await?;
    }
    info!("Comptes de démonstration prêts");
    Ok(())
}

struct DemoPatient {
    nom: &'static str,
    cin: i64,
    ass_cnss: &'static str,
    naissance: NaiveDate,
    sexe: &'static str,
    groupe: &'static str,
    debut: NaiveDate,
    type_patient: &'static str,
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("date de démonstration valide")
}

async fn seed_patients(pool: &PgPool) -> Result<Vec<i64>> {
    let demo = [
        DemoPatient {
            nom: "Salah Ben Youssef",
            cin: 11_223_344,
            ass_cnss: "CNSS-4491",
            naissance: date(1958, 11, 23),
            sexe: "Homme",
            groupe: "O+",
            debut: date(2021, 3, 15),
            type_patient: "Permanent",
        },
        DemoPatient {
            nom: "Amina Karray",
            cin: 22_334_455,
            ass_cnss: "CNSS-1001",
            naissance: date(1965, 7, 2),
            sexe: "Femme",
            groupe: "A-",
            debut: date(2022, 5, 1),
            type_patient: "Permanent",
        },
        DemoPatient {
            nom: "Karim Gharbi",
            cin: 33_445_566,
            ass_cnss: "CNSS-2876",
            naissance: date(1973, 1, 18),
            sexe: "Homme",
            groupe: "AB+",
            debut: date(2024, 6, 20),
            type_patient: "Vacancier",
        },
    ];

    let mut cins = Vec::new();
    for p in &demo {
        sqlx::query(
            "INSERT INTO patients \
             (nom_complet, cin, ass_cnss, date_naissance, sexe, groupe_sanguin, date_debut, type_patient) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (cin) DO NOTHING",
        )
        .bind(p.nom)
        .bind(p.cin)
        .bind(p.ass_cnss)
        .bind(p.naissance)
        .bind(p.sexe)
        .bind(p.groupe)
        .bind(p.debut)
        .bind(p.type_patient)
        .execute(pool)
        .await?;
        cins.push(p.cin);
    }

    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM patients WHERE cin = ANY($1) ORDER BY cin")
            .bind(&cins)
            .fetch_all(pool)
            .await?;
    info!("{} patient(s) de démonstration prêt(s)", ids.len());
    Ok(ids)
}

async fn seed_records(pool: &PgPool, patient_ids: &[i64]) -> Result<()> {
    let Some(&first) = patient_ids.first() else {
        return Ok(());
    };
    sqlx::query(
        "INSERT INTO medical_records (patient_id, category, sub_category, date, details, created_by) \
         SELECT $1, $2, $3, $4, $5, u.id FROM users u WHERE u.username = 'admin' \
         AND NOT EXISTS (SELECT 1 FROM medical_records WHERE patient_id = $1 AND category = $2 AND date = $4)",
    )
    .bind(first)
    .bind("Consultation")
    .bind("Hémodialyse")
    .bind(date(2025, 2, 10))
    .bind("Séance initiale, paramètres stables")
    .execute(pool)
    .await?;
    Ok(())
}

/// Assigne les premiers patients au compte `medecin1`, sans doublon.
async fn assign_patients(pool: &PgPool, patient_ids: &[i64]) -> Result<()> {
    for &patient_id in patient_ids.iter().take(2) {
        sqlx::query(
            "UPDATE users SET assigned_patients = array_append(assigned_patients, $1) \
             WHERE username = $2 AND NOT ($1 = ANY(assigned_patients))",
        )
        .bind(patient_id)
        .bind("medecin1")
        .execute(pool)
        .await?;
    }
    Ok(())
}
