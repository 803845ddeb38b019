//! Loans repository for database operations

use chrono::{Duration, Local, NaiveDateTime};
use sqlx::{sqlite::SqliteRow, FromRow, Pool, Row, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::loan::{LoanStatus, LoanView, NewLoan},
};

/// Days between loan date and due date when the caller gives none
pub const DEFAULT_LOAN_DAYS: i64 = 3;

// Columns of every LoanView query. `LoanView::from_row` reads them by
// these names, so aliases here and there must change together.
const LOAN_VIEW_COLUMNS: &str = r#"
    e.id, e.usuario_id, e.livro_id, e.exemplar_id, e.numero_de_renovacoes, e.estado,
    e.data_emprestimo, e.data_para_devolucao, e.data_devolucao,
    u.nome AS usuario_nome, l.titulo AS livro_titulo,
    l.renovacoes_permitidas AS livro_renovacoes_permitidas,
    ed.nome AS editora_nome
"#;

const LOAN_VIEW_FROM: &str = r#"
    FROM emprestimos AS e
    INNER JOIN usuarios AS u ON (u.id = e.usuario_id)
    INNER JOIN livros AS l ON (l.id = e.livro_id)
    INNER JOIN editoras AS ed ON (ed.id = l.editora_id)
"#;

// Text timestamps compare lexicographically against a date-only string,
// so anything due today (at any hour) is not yet overdue.
const OVERDUE_FILTER: &str =
    "WHERE e.estado = ? AND e.data_para_devolucao < date('now', 'localtime')";

impl<'r> FromRow<'r, SqliteRow> for LoanView {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        // Empty text counts as "not returned"
        let raw_return: Option<String> = row.try_get("data_devolucao")?;
        let return_date = match raw_return.as_deref() {
            None | Some("") => None,
            Some(_) => row.try_get::<Option<NaiveDateTime>, _>("data_devolucao")?,
        };

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("usuario_id")?,
            book_id: row.try_get("livro_id")?,
            copy_id: row.try_get("exemplar_id")?,
            renewal_count: row.try_get("numero_de_renovacoes")?,
            status: row.try_get("estado")?,
            loan_date: row.try_get("data_emprestimo")?,
            due_date: row.try_get("data_para_devolucao")?,
            return_date,
            user_name: row.try_get("usuario_nome")?,
            book_title: row.try_get("livro_titulo")?,
            book_max_renewals: row.try_get("livro_renovacoes_permitidas")?,
            publisher_name: row.try_get("editora_nome")?,
        })
    }
}

/// Map a row of the loan view query into a [`LoanView`].
///
/// An absent row maps to `None` rather than an error.
pub fn row_to_record(row: Option<&SqliteRow>) -> AppResult<Option<LoanView>> {
    Ok(row.map(LoanView::from_row).transpose()?)
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
    loan_period: Duration,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            loan_period: Duration::days(DEFAULT_LOAN_DAYS),
        }
    }

    /// Override the default due-date offset used by [`Self::insert`]
    pub fn with_loan_period(mut self, loan_period: Duration) -> Self {
        self.loan_period = loan_period;
        self
    }

    pub fn loan_period(&self) -> Duration {
        self.loan_period
    }

    /// Drop the loans table if it exists. All loan data is lost.
    pub async fn drop_table(&self) -> AppResult<()> {
        sqlx::query("DROP TABLE IF EXISTS emprestimos")
            .execute(&self.pool)
            .await?;

        tracing::info!(table = "emprestimos", "Dropped table");
        Ok(())
    }

    /// Create the loans table if it does not exist yet
    pub async fn create_table(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS emprestimos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                usuario_id INTEGER NOT NULL,
                livro_id INTEGER NOT NULL,
                exemplar_id INTEGER NOT NULL,
                numero_de_renovacoes INTEGER NOT NULL,
                estado TEXT NOT NULL,
                data_emprestimo TEXT NOT NULL,
                data_para_devolucao TEXT NOT NULL,
                data_devolucao TEXT,
                FOREIGN KEY (usuario_id) REFERENCES usuarios(id),
                FOREIGN KEY (livro_id) REFERENCES livros(id),
                FOREIGN KEY (exemplar_id) REFERENCES exemplares(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!(table = "emprestimos", "Ensured table exists");
        Ok(())
    }

    /// Create a new loan and return its id
    pub async fn insert(&self, loan: &NewLoan) -> AppResult<i64> {
        let loan_date = loan
            .loan_date
            .unwrap_or_else(|| Local::now().naive_local());
        let due_date = match loan.due_date {
            Some(due_date) => due_date,
            None => loan_date
                .checked_add_signed(self.loan_period)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Due date out of range: {} plus {} days",
                        loan_date,
                        self.loan_period.num_days()
                    ))
                })?,
        };
        let status = loan
            .status
            .as_deref()
            .unwrap_or(LoanStatus::Borrowed.as_str());

        let loan_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO emprestimos (
                usuario_id, livro_id, exemplar_id, numero_de_renovacoes, estado,
                data_emprestimo, data_para_devolucao, data_devolucao
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.copy_id)
        .bind(loan.renewal_count.unwrap_or(0))
        .bind(status)
        .bind(loan_date)
        .bind(due_date)
        .bind(loan.return_date)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            loan_id,
            user_id = loan.user_id,
            book_id = loan.book_id,
            copy_id = loan.copy_id,
            %due_date,
            "Created loan"
        );
        Ok(loan_id)
    }

    /// Get borrowed loans whose due date is before today
    pub async fn get_overdue(&self) -> AppResult<Vec<LoanView>> {
        let query = format!(
            "SELECT {} {} {} ORDER BY e.id",
            LOAN_VIEW_COLUMNS, LOAN_VIEW_FROM, OVERDUE_FILTER
        );

        let loans = sqlx::query_as::<_, LoanView>(&query)
            .bind(LoanStatus::Borrowed.as_str())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = loans.len(), "Fetched overdue loans");
        Ok(loans)
    }

    /// Get loan by ID, `None` if missing or if a joined row is missing
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<LoanView>> {
        let query = format!(
            "SELECT {} {} WHERE e.id = ?",
            LOAN_VIEW_COLUMNS, LOAN_VIEW_FROM
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(loan_id = id, found = row.is_some(), "Fetched loan");
        row_to_record(row.as_ref())
    }

    /// Get every loan
    pub async fn get_all(&self) -> AppResult<Vec<LoanView>> {
        let query = format!(
            "SELECT {} {} ORDER BY e.id",
            LOAN_VIEW_COLUMNS, LOAN_VIEW_FROM
        );

        let loans = sqlx::query_as::<_, LoanView>(&query)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = loans.len(), "Fetched all loans");
        Ok(loans)
    }

    /// Get loans a user still has out, soonest due first
    pub async fn get_by_user(&self, user_id: i64) -> AppResult<Vec<LoanView>> {
        let query = format!(
            "SELECT {} {} WHERE e.usuario_id = ? AND e.estado = ? \
             ORDER BY e.data_para_devolucao, e.id",
            LOAN_VIEW_COLUMNS, LOAN_VIEW_FROM
        );

        let loans = sqlx::query_as::<_, LoanView>(&query)
            .bind(user_id)
            .bind(LoanStatus::Borrowed.as_str())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(user_id, count = loans.len(), "Fetched open loans for user");
        Ok(loans)
    }

    /// Record a renewal. Renewal limits are not checked here.
    pub async fn renew(
        &self,
        id: i64,
        renewal_count: i64,
        due_date: NaiveDateTime,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE emprestimos SET numero_de_renovacoes = ?, data_para_devolucao = ? WHERE id = ?",
        )
        .bind(renewal_count)
        .bind(due_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(loan_id = id, "Renewal matched no loan");
        } else {
            tracing::debug!(loan_id = id, renewal_count, %due_date, "Renewed loan");
        }
        Ok(())
    }

    /// Record a return. `None` stamps the current local time.
    pub async fn mark_returned(
        &self,
        id: i64,
        status: &str,
        return_date: Option<NaiveDateTime>,
    ) -> AppResult<()> {
        let return_date = return_date.unwrap_or_else(|| Local::now().naive_local());

        let result = sqlx::query(
            "UPDATE emprestimos SET estado = ?, data_devolucao = ? WHERE id = ?",
        )
        .bind(status)
        .bind(return_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(loan_id = id, "Return matched no loan");
        } else {
            tracing::debug!(loan_id = id, status, %return_date, "Marked loan returned");
        }
        Ok(())
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emprestimos WHERE estado = ?")
            .bind(LoanStatus::Borrowed.as_str())
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(count, "Counted active loans");
        Ok(count)
    }

    /// Count overdue loans, with the same joins as [`Self::get_overdue`]
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let query = format!("SELECT COUNT(*) {} {}", LOAN_VIEW_FROM, OVERDUE_FILTER);

        let count: i64 = sqlx::query_scalar(&query)
            .bind(LoanStatus::Borrowed.as_str())
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(count, "Counted overdue loans");
        Ok(count)
    }
}
