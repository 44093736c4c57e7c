// database/postgres.rs - sqlx adapter for the store port
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool, Postgres, Transaction};
use tracing::info;

use super::models::{
    ActivationRecord, CodePurpose, ErrorLog, Feedback, Mail, RecentVisit, User, VerificationCode, Word, WordSet,
};
use super::store::{ShowcaseOrder, Store, StoreError, StoreResult, StoreTx};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        role TEXT NOT NULL DEFAULT 'user',
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        mails TEXT[] NOT NULL DEFAULT '{}',
        password TEXT,
        img TEXT NOT NULL DEFAULT '',
        is_google BOOLEAN NOT NULL DEFAULT FALSE,
        created_word_sets TEXT[] NOT NULL DEFAULT '{}',
        liked_word_sets TEXT[] NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        liked_cnt BIGINT NOT NULL DEFAULT 0,
        forked_cnt BIGINT NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS word_sets (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        author_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at BIGINT NOT NULL,
        words JSONB NOT NULL DEFAULT '[]',
        should_swap BOOLEAN NOT NULL DEFAULT FALSE,
        liked_users TEXT[] NOT NULL DEFAULT '{}',
        likes BIGINT NOT NULL DEFAULT 0,
        word_cnt BIGINT NOT NULL DEFAULT 0,
        allow_copy BOOLEAN NOT NULL DEFAULT TRUE,
        is_public BOOLEAN NOT NULL DEFAULT TRUE
    )"#,
    "CREATE INDEX IF NOT EXISTS word_sets_updated_at_idx ON word_sets (updated_at DESC)",
    r#"CREATE TABLE IF NOT EXISTS mails (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        date BIGINT NOT NULL,
        receiver_id TEXT NOT NULL,
        read BOOLEAN NOT NULL DEFAULT FALSE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recent_visits (
        id TEXT PRIMARY KEY,
        record TEXT[] NOT NULL DEFAULT '{}'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feedbacks (
        id TEXT PRIMARY KEY,
        author_id TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        formatted_created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS error_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        error_id TEXT NOT NULL,
        error TEXT NOT NULL,
        error_info TEXT NOT NULL,
        time TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS activation_emails (
        email TEXT PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        expire BIGINT NOT NULL,
        activated BOOLEAN NOT NULL DEFAULT FALSE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS verification_codes (
        purpose TEXT NOT NULL,
        email TEXT NOT NULL,
        code_hash TEXT NOT NULL,
        expire BIGINT NOT NULL,
        PRIMARY KEY (purpose, email)
    )"#,
];

const USER_COLUMNS: &str = "id, role, name, email, mails, password, img, is_google, created_word_sets, \
     liked_word_sets, created_at, liked_cnt, forked_cnt";

const WORD_SET_COLUMNS: &str = "id, title, description, author_id, created_at, updated_at, words, should_swap, \
     liked_users, likes, word_cnt, allow_copy, is_public";

#[derive(FromRow)]
struct WordSetRow {
    id: String,
    title: String,
    description: String,
    author_id: String,
    created_at: String,
    updated_at: i64,
    words: Json<Vec<Word>>,
    should_swap: bool,
    liked_users: Vec<String>,
    likes: i64,
    word_cnt: i64,
    allow_copy: bool,
    is_public: bool,
}

impl WordSetRow {
    fn into_domain(self) -> WordSet {
        WordSet {
            id: self.id,
            title: self.title,
            description: self.description,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            words: self.words.0,
            should_swap: self.should_swap,
            liked_users: self.liked_users,
            likes: self.likes,
            word_cnt: self.word_cnt,
            allow_copy: self.allow_copy,
            is_public: self.is_public,
        }
    }
}

#[derive(FromRow)]
struct VerificationCodeRow {
    purpose: String,
    email: String,
    code_hash: String,
    expire: i64,
}

impl VerificationCodeRow {
    fn into_domain(self) -> StoreResult<VerificationCode> {
        let purpose = CodePurpose::parse(&self.purpose)
            .ok_or_else(|| StoreError::Backend(format!("unknown code purpose {}", self.purpose)))?;
        Ok(VerificationCode {
            purpose,
            email: self.email,
            code_hash: self.code_hash,
            expire: self.expire,
        })
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(db.message().to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn affected(rows: u64, what: &str) -> StoreResult<()> {
    if rows == 0 {
        return Err(StoreError::NotFound(what.to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_sqlx)?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Creates missing tables. Safe to run on every start.
    pub async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&mut *tx).await.map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        info!(tables = SCHEMA.len(), "schema ensured");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(map_sqlx)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_word_set(&self, id: &str) -> StoreResult<Option<WordSet>> {
        let row = sqlx::query_as::<_, WordSetRow>(&format!("SELECT {} FROM word_sets WHERE id = $1", WORD_SET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(WordSetRow::into_domain))
    }

    async fn find_word_sets(&self, ids: &[String]) -> StoreResult<Vec<WordSet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, WordSetRow>(&format!(
            "SELECT {} FROM word_sets WHERE id = ANY($1) ORDER BY array_position($1, id)",
            WORD_SET_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(WordSetRow::into_domain).collect())
    }

    async fn search_word_sets(&self, prefix: &str, skip: i64, limit: i64) -> StoreResult<Vec<WordSet>> {
        let rows = sqlx::query_as::<_, WordSetRow>(&format!(
            "SELECT {} FROM word_sets WHERE left(title, char_length($1)) = $1 \
             ORDER BY updated_at DESC, id OFFSET $2 LIMIT $3",
            WORD_SET_COLUMNS
        ))
        .bind(prefix)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(WordSetRow::into_domain).collect())
    }

    async fn list_public_word_sets(&self, order: ShowcaseOrder, limit: i64) -> StoreResult<Vec<WordSet>> {
        let order_by = match order {
            ShowcaseOrder::Newest => "created_at DESC, updated_at DESC",
            ShowcaseOrder::Popular => "likes DESC, updated_at DESC",
        };
        let rows = sqlx::query_as::<_, WordSetRow>(&format!(
            "SELECT {} FROM word_sets WHERE is_public ORDER BY {} LIMIT $1",
            WORD_SET_COLUMNS, order_by
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(WordSetRow::into_domain).collect())
    }

    async fn find_mails(&self, ids: &[String]) -> StoreResult<Vec<Mail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Mail>(
            "SELECT id, title, content, date, receiver_id, read FROM mails \
             WHERE id = ANY($1) ORDER BY array_position($1, id)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_recent_visit(&self, user_id: &str) -> StoreResult<Option<RecentVisit>> {
        sqlx::query_as::<_, RecentVisit>("SELECT id, record FROM recent_visits WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_feedbacks(&self, skip: i64, limit: i64) -> StoreResult<Vec<Feedback>> {
        sqlx::query_as::<_, Feedback>(
            "SELECT id, author_id, title, content, created_at, formatted_created_at FROM feedbacks \
             ORDER BY created_at DESC, id OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(map_sqlx)?;
        Ok(())
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn user(&mut self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx)
    }

    async fn users(&mut self, ids: &[String]) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1 FOR UPDATE", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx)
    }

    async fn word_set(&mut self, id: &str) -> StoreResult<Option<WordSet>> {
        let row = sqlx::query_as::<_, WordSetRow>(&format!(
            "SELECT {} FROM word_sets WHERE id = $1 FOR UPDATE",
            WORD_SET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(WordSetRow::into_domain))
    }

    async fn recent_visit(&mut self, user_id: &str) -> StoreResult<Option<RecentVisit>> {
        sqlx::query_as::<_, RecentVisit>("SELECT id, record FROM recent_visits WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx)
    }

    async fn mail(&mut self, id: &str) -> StoreResult<Option<Mail>> {
        sqlx::query_as::<_, Mail>(
            "SELECT id, title, content, date, receiver_id, read FROM mails WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn activation(&mut self, email: &str) -> StoreResult<Option<ActivationRecord>> {
        sqlx::query_as::<_, ActivationRecord>(
            "SELECT email, token, expire, activated FROM activation_emails WHERE email = $1 FOR UPDATE",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn activation_by_token(&mut self, token: &str) -> StoreResult<Option<ActivationRecord>> {
        sqlx::query_as::<_, ActivationRecord>(
            "SELECT email, token, expire, activated FROM activation_emails WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<Option<VerificationCode>> {
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            "SELECT purpose, email, code_hash, expire FROM verification_codes \
             WHERE purpose = $1 AND email = $2 FOR UPDATE",
        )
        .bind(purpose.as_str())
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        row.map(VerificationCodeRow::into_domain).transpose()
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.role)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.mails)
        .bind(&user.password)
        .bind(&user.img)
        .bind(user.is_google)
        .bind(&user.created_word_sets)
        .bind(&user.liked_word_sets)
        .bind(&user.created_at)
        .bind(user.liked_cnt)
        .bind(user.forked_cnt)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, name = $3, email = $4, mails = $5, password = $6, img = $7, \
             is_google = $8, created_word_sets = $9, liked_word_sets = $10, liked_cnt = $11, forked_cnt = $12 \
             WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.role)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.mails)
        .bind(&user.password)
        .bind(&user.img)
        .bind(user.is_google)
        .bind(&user.created_word_sets)
        .bind(&user.liked_word_sets)
        .bind(user.liked_cnt)
        .bind(user.forked_cnt)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        affected(result.rows_affected(), "user")
    }

    async fn insert_word_set(&mut self, ws: &WordSet) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO word_sets ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            WORD_SET_COLUMNS
        ))
        .bind(&ws.id)
        .bind(&ws.title)
        .bind(&ws.description)
        .bind(&ws.author_id)
        .bind(&ws.created_at)
        .bind(ws.updated_at)
        .bind(Json(&ws.words))
        .bind(ws.should_swap)
        .bind(&ws.liked_users)
        .bind(ws.likes)
        .bind(ws.word_cnt)
        .bind(ws.allow_copy)
        .bind(ws.is_public)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_word_set(&mut self, ws: &WordSet) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE word_sets SET title = $2, description = $3, updated_at = $4, words = $5, should_swap = $6, \
             liked_users = $7, likes = $8, word_cnt = $9, allow_copy = $10, is_public = $11 WHERE id = $1",
        )
        .bind(&ws.id)
        .bind(&ws.title)
        .bind(&ws.description)
        .bind(ws.updated_at)
        .bind(Json(&ws.words))
        .bind(ws.should_swap)
        .bind(&ws.liked_users)
        .bind(ws.likes)
        .bind(ws.word_cnt)
        .bind(ws.allow_copy)
        .bind(ws.is_public)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        affected(result.rows_affected(), "word set")
    }

    async fn delete_word_set(&mut self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM word_sets WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        affected(result.rows_affected(), "word set")
    }

    async fn insert_mail(&mut self, mail: &Mail) -> StoreResult<()> {
        sqlx::query("INSERT INTO mails (id, title, content, date, receiver_id, read) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(&mail.id)
            .bind(&mail.title)
            .bind(&mail.content)
            .bind(mail.date)
            .bind(&mail.receiver_id)
            .bind(mail.read)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_mail(&mut self, mail: &Mail) -> StoreResult<()> {
        let result = sqlx::query("UPDATE mails SET title = $2, content = $3, read = $4 WHERE id = $1")
            .bind(&mail.id)
            .bind(&mail.title)
            .bind(&mail.content)
            .bind(mail.read)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        affected(result.rows_affected(), "mail")
    }

    async fn insert_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()> {
        sqlx::query("INSERT INTO recent_visits (id, record) VALUES ($1, $2)")
            .bind(&recent.id)
            .bind(&recent.record)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO recent_visits (id, record) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record",
        )
        .bind(&recent.id)
        .bind(&recent.record)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_feedback(&mut self, feedback: &Feedback) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO feedbacks (id, author_id, title, content, created_at, formatted_created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&feedback.id)
        .bind(&feedback.author_id)
        .bind(&feedback.title)
        .bind(&feedback.content)
        .bind(feedback.created_at)
        .bind(&feedback.formatted_created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_error_log(&mut self, entry: &ErrorLog) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO error_logs (id, user_id, error_id, error, error_info, time) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.error_id)
        .bind(&entry.error)
        .bind(&entry.error_info)
        .bind(&entry.time)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_activation(&mut self, record: &ActivationRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO activation_emails (email, token, expire, activated) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO UPDATE SET token = EXCLUDED.token, expire = EXCLUDED.expire, \
             activated = EXCLUDED.activated",
        )
        .bind(&record.email)
        .bind(&record.token)
        .bind(record.expire)
        .bind(record.activated)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_activation(&mut self, email: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM activation_emails WHERE email = $1")
            .bind(email)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn save_verification_code(&mut self, code: &VerificationCode) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO verification_codes (purpose, email, code_hash, expire) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (purpose, email) DO UPDATE SET code_hash = EXCLUDED.code_hash, expire = EXCLUDED.expire",
        )
        .bind(code.purpose.as_str())
        .bind(&code.email)
        .bind(&code.code_hash)
        .bind(code.expire)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM verification_codes WHERE purpose = $1 AND email = $2")
            .bind(purpose.as_str())
            .bind(email)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent_ddl() {
        for ddl in SCHEMA {
            assert!(ddl.contains("IF NOT EXISTS"), "{}", ddl);
        }
    }

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        assert!(matches!(map_sqlx(sqlx::Error::PoolTimedOut), StoreError::Unavailable(_)));
        assert!(matches!(map_sqlx(sqlx::Error::RowNotFound), StoreError::NotFound(_)));
    }

    #[test]
    fn test_code_row_rejects_unknown_purpose() {
        let row = VerificationCodeRow {
            purpose: "other".into(),
            email: "a@b.com".into(),
            code_hash: "h".into(),
            expire: 0,
        };
        assert!(row.into_domain().is_err());
    }
}
