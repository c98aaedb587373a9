//! Dépôt générique : construction de requêtes dynamiques et opérations
//! partagées par toutes les tables.
//!
//! Les requêtes INSERT et UPDATE sont construites colonne par colonne à
//! partir d'une liste de champs. Un champ absent (`None`) est ignoré ; un
//! champ présent mais vide (`Some(SqlValue::Text(None))`) devient un NULL
//! typé. Les paramètres positionnels `$1..$N` suivent exactement l'ordre
//! du vecteur de valeurs.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use thiserror::Error;

use crate::models::Id;
use crate::schema::RowError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error("Aucun champ à mettre à jour")]
    EmptyUpdate,
}

/// Valeur liée à un paramètre positionnel. Chaque variante embarque son
/// `Option` pour qu'un NULL reste typé côté PostgreSQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    BigInt(Option<i64>),
    Int(Option<i32>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
    BigIntArray(Option<Vec<i64>>),
}

impl SqlValue {
    pub fn big_int(value: i64) -> Self {
        SqlValue::BigInt(Some(value))
    }

    pub fn int(value: i32) -> Self {
        SqlValue::Int(Some(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(Some(value.into()))
    }

    pub fn date(value: NaiveDate) -> Self {
        SqlValue::Date(Some(value))
    }

    pub fn big_int_array(values: Vec<i64>) -> Self {
        SqlValue::BigIntArray(Some(values))
    }
}

/// Un champ nommé d'une requête dynamique. `None` : champ absent, la
/// colonne n'apparaît pas dans la requête.
pub type Field = (&'static str, Option<SqlValue>);

/// Construit un INSERT sur les champs présents.
///
/// Une liste entièrement absente n'est pas un cas particulier : la requête
/// `INSERT INTO t () VALUES ()` échouera côté base, signe d'une erreur
/// d'appel.
pub fn build_insert_query(table: &str, fields: Vec<Field>) -> (String, Vec<SqlValue>) {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            columns.push(column);
            values.push(value);
        }
    }

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${}", i)).collect();
    let text = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    (text, values)
}

/// Construit un UPDATE sur les champs présents. L'identifiant est toujours
/// poussé en dernier, donc lié à `$N+1`.
pub fn build_update_query(
    table: &str,
    fields: Vec<Field>,
    id: Id,
) -> Result<(String, Vec<SqlValue>), RepoError> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            values.push(value);
            clauses.push(format!("{} = ${}", column, values.len()));
        }
    }

    if values.is_empty() {
        return Err(RepoError::EmptyUpdate);
    }

    values.push(SqlValue::big_int(id));
    let text = format!(
        "UPDATE {} SET {} WHERE id = ${} RETURNING *",
        table,
        clauses.join(", "),
        values.len()
    );
    Ok((text, values))
}

type PgQueryAs<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

fn bind_value_as<'q, R>(query: PgQueryAs<'q, R>, value: &SqlValue) -> PgQueryAs<'q, R> {
    match value {
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::BigIntArray(v) => query.bind(v.clone()),
    }
}

/// Prépare une requête typée avec ses valeurs liées dans l'ordre.
pub(crate) fn query_as_with<'q, R>(sql: &'q str, values: &[SqlValue]) -> PgQueryAs<'q, R>
where
    R: for<'r> FromRow<'r, PgRow>,
{
    values.iter().fold(sqlx::query_as(sql), bind_value_as)
}

/// Accès générique à une table : un nom, un type de ligne et une fonction
/// de conversion, composés par les dépôts concrets.
pub struct BaseRepository<R, E> {
    pool: PgPool,
    table: &'static str,
    mapper: fn(R) -> Result<E, RowError>,
}

impl<R, E> Clone for BaseRepository<R, E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            table: self.table,
            mapper: self.mapper,
        }
    }
}

impl<R, E> BaseRepository<R, E>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool, table: &'static str, mapper: fn(R) -> Result<E, RowError>) -> Self {
        Self { pool, table, mapper }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_all(&self) -> Result<Vec<E>, RepoError> {
        let sql = format!("SELECT * FROM {}", self.table);
        let rows: Vec<R> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        self.map_rows(rows)
    }

    pub async fn find_by_id(&self, id: Id) -> Result<Option<E>, RepoError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table);
        let row: Option<R> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(self.mapper).transpose().map_err(RepoError::from)
    }

    pub async fn insert(&self, fields: Vec<Field>) -> Result<E, RepoError> {
        let (sql, values) = build_insert_query(self.table, fields);
        let row: R = query_as_with(&sql, &values).fetch_one(&self.pool).await?;
        (self.mapper)(row).map_err(RepoError::from)
    }

    pub async fn update(&self, fields: Vec<Field>, id: Id) -> Result<Option<E>, RepoError> {
        let (sql, values) = build_update_query(self.table, fields, id)?;
        let row: Option<R> = query_as_with(&sql, &values).fetch_optional(&self.pool).await?;
        row.map(self.mapper).transpose().map_err(RepoError::from)
    }

    pub async fn delete(&self, id: Id) -> Result<bool, RepoError> {
        self.delete_with(&self.pool, id).await
    }

    /// Suppression sur un exécuteur arbitraire, typiquement une transaction.
    pub async fn delete_with<'e, X>(&self, executor: X, id: Id) -> Result<bool, RepoError>
    where
        X: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql).bind(id).execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Exécute une requête propre au dépôt et convertit chaque ligne.
    pub async fn fetch_with(&self, sql: &str, values: &[SqlValue]) -> Result<Vec<E>, RepoError> {
        let rows: Vec<R> = query_as_with(sql, values).fetch_all(&self.pool).await?;
        self.map_rows(rows)
    }

    /// Comme [`fetch_with`] pour les requêtes à au plus une ligne.
    pub async fn fetch_optional_with(
        &self,
        sql: &str,
        values: &[SqlValue],
    ) -> Result<Option<E>, RepoError> {
        let row: Option<R> = query_as_with(sql, values).fetch_optional(&self.pool).await?;
        row.map(self.mapper).transpose().map_err(RepoError::from)
    }

    fn map_rows(&self, rows: Vec<R>) -> Result<Vec<E>, RepoError> {
        rows.into_iter()
            .map(|row| (self.mapper)(row).map_err(RepoError::from))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::PgPool;

    /// Pool pour les tests d'intégration (marqués `#[ignore]`), qui
    /// attendent une base accessible via DATABASE_URL.
    pub async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
        let pool = PgPool::connect(&url)
            .await
            .expect("failed to connect to the test database");
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("failed to run migrations");
        pool
    }

    /// Suffixe unique pour isoler les données de chaque exécution.
    pub fn unique(prefix: &str) -> String {
        format!("{}{}", prefix, nanos())
    }

    /// CIN pseudo-unique dans la plage valide à huit chiffres.
    pub fn unique_cin() -> i64 {
        (nanos() % 98_999_999) as i64 + 1_000_000
    }

    fn nanos() -> u128 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before unix epoch")
            .as_nanos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Option<SqlValue> {
        Some(SqlValue::text(value))
    }

    #[test]
    fn insert_skips_absent_fields_but_keeps_nulls() {
        let (sql, values) = build_insert_query(
            "patients",
            vec![
                ("nom_complet", text("Leila Haddad")),
                ("profession", Some(SqlValue::Text(None))),
                ("adresse", None),
            ],
        );
        assert_eq!(
            sql,
            "INSERT INTO patients (nom_complet, profession) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(
            values,
            vec![SqlValue::text("Leila Haddad"), SqlValue::Text(None)],
            "explicit NULL must stay in the value list"
        );
    }

    #[test]
    fn insert_placeholders_follow_field_order() {
        let (sql, values) = build_insert_query(
            "users",
            vec![
                ("username", text("medecin1")),
                ("role", text("user")),
                ("assigned_patients", Some(SqlValue::big_int_array(vec![1, 2]))),
            ],
        );
        assert_eq!(
            sql,
            "INSERT INTO users (username, role, assigned_patients) VALUES ($1, $2, $3) RETURNING *"
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn update_places_id_last() {
        let (sql, values) = build_update_query(
            "patients",
            vec![
                ("nom_complet", text("Karim Gharbi")),
                ("date_fin", Some(SqlValue::Date(None))),
                ("cause_fin", None),
            ],
            42,
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE patients SET nom_complet = $1, date_fin = $2 WHERE id = $3 RETURNING *"
        );
        assert_eq!(
            values,
            vec![
                SqlValue::text("Karim Gharbi"),
                SqlValue::Date(None),
                SqlValue::big_int(42),
            ],
            "the id must be the last bound value"
        );
    }

    #[test]
    fn update_with_no_effective_field_is_an_error() {
        let result = build_update_query("patients", vec![("nom_complet", None)], 7);
        assert!(
            matches!(result, Err(RepoError::EmptyUpdate)),
            "zero effective fields must be rejected"
        );
    }

    #[test]
    fn update_counts_only_present_fields() {
        let (sql, _) = build_update_query(
            "users",
            vec![
                ("username", None),
                ("password_hash", text("$argon2id$x")),
                ("role", None),
                ("token_version", Some(SqlValue::int(3))),
            ],
            9,
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET password_hash = $1, token_version = $2 WHERE id = $3 RETURNING *"
        );
    }
}
