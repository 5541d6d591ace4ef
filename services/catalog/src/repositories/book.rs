//! Book repository for database operations
//!
//! Every write runs inside one transaction: the books table is provisioned
//! when missing, the title is pre-checked, the row is written and the
//! transaction committed. The `UNIQUE` constraint on `title` remains the
//! authority; a violation raised by the write is reported as
//! [`RepositoryError::DuplicateTitle`] just like a failed pre-check.
//!
//! Write transactions open with `BEGIN IMMEDIATE`. A deferred transaction
//! that reads first cannot upgrade to a write lock while another reader
//! holds one, and SQLite fails that upgrade without waiting. Taking the
//! lock at `BEGIN` makes concurrent writers queue on the busy timeout.
//! Reads check for the table and select from it inside one transaction so
//! a concurrent reset cannot land between the two.

use common::error::DatabaseError;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::info;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Book, NewBook};
use crate::schema::{self, BOOKS_TABLE};

/// Book repository
#[derive(Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Create a new book repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new book
    pub async fn create(&self, new_book: &NewBook) -> RepositoryResult<Book> {
        info!("Creating book: {}", new_book.title);

        let mut tx = self.begin_write().await?;
        schema::ensure_books_table(&mut tx).await?;

        if title_taken(&mut tx, &new_book.title, None).await? {
            return Err(RepositoryError::DuplicateTitle(new_book.title.clone()));
        }

        let id = sqlx::query("INSERT INTO books (author, title, description) VALUES (?, ?, ?)")
            .bind(&new_book.author)
            .bind(&new_book.title)
            .bind(&new_book.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &new_book.title))?
            .last_insert_rowid();

        tx.commit().await?;

        Ok(Book {
            id,
            author: new_book.author.clone(),
            title: new_book.title.clone(),
            description: new_book.description.clone(),
        })
    }

    /// Find a book by ID
    pub async fn find_by_id(&self, id: i64) -> RepositoryResult<Book> {
        let mut tx = self.pool.begin().await?;
        if !schema::table_exists(&mut tx, BOOKS_TABLE).await? {
            return Err(RepositoryError::NotFound(id));
        }

        let book = sqlx::query_as::<_, Book>(
            "SELECT id, author, title, description FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        book.ok_or(RepositoryError::NotFound(id))
    }

    /// List every book, newest id first.
    ///
    /// A books table that has not been provisioned yet lists as empty.
    pub async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let mut tx = self.pool.begin().await?;
        if !schema::table_exists(&mut tx, BOOKS_TABLE).await? {
            return Ok(Vec::new());
        }

        let books = sqlx::query_as::<_, Book>(
            "SELECT id, author, title, description FROM books ORDER BY id DESC",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(books)
    }

    /// Update a book in place.
    ///
    /// Keeping the book's own title is not a conflict.
    pub async fn update(&self, id: i64, changes: &NewBook) -> RepositoryResult<Book> {
        info!("Updating book {}: {}", id, changes.title);

        let mut tx = self.begin_write().await?;
        if !schema::table_exists(&mut tx, BOOKS_TABLE).await? {
            return Err(RepositoryError::NotFound(id));
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(RepositoryError::NotFound(id));
        }

        if title_taken(&mut tx, &changes.title, Some(id)).await? {
            return Err(RepositoryError::DuplicateTitle(changes.title.clone()));
        }

        sqlx::query("UPDATE books SET author = ?, title = ?, description = ? WHERE id = ?")
            .bind(&changes.author)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &changes.title))?;

        tx.commit().await?;

        Ok(Book {
            id,
            author: changes.author.clone(),
            title: changes.title.clone(),
            description: changes.description.clone(),
        })
    }

    /// Delete a single book
    pub async fn delete(&self, id: i64) -> RepositoryResult<()> {
        info!("Deleting book {}", id);

        let mut tx = self.begin_write().await?;
        if !schema::table_exists(&mut tx, BOOKS_TABLE).await? {
            return Err(RepositoryError::NotFound(id));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Drop the whole books table. The next write provisions it again.
    pub async fn delete_all(&self) -> RepositoryResult<()> {
        info!("Dropping books table");

        sqlx::query("DROP TABLE IF EXISTS books")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert each book whose title is not already present.
    ///
    /// Returns the number of rows inserted; reseeding is a no-op for titles
    /// already in the catalog and never overwrites edited records.
    pub async fn seed(&self, books: &[NewBook]) -> RepositoryResult<u64> {
        let mut tx = self.begin_write().await?;
        schema::ensure_books_table(&mut tx).await?;

        let mut inserted = 0;
        for book in books {
            inserted += sqlx::query(
                "INSERT INTO books (author, title, description) VALUES (?, ?, ?) \
                 ON CONFLICT (title) DO NOTHING",
            )
            .bind(&book.author)
            .bind(&book.title)
            .bind(&book.description)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        info!("Seeded {} of {} books", inserted, books.len());
        Ok(inserted)
    }

    async fn begin_write(&self) -> RepositoryResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}

/// Whether a book other than `exclude` already holds `title`
async fn title_taken(
    conn: &mut SqliteConnection,
    title: &str,
    exclude: Option<i64>,
) -> RepositoryResult<bool> {
    let holder: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE title = ?")
        .bind(title)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(matches!(holder, Some(id) if Some(id) != exclude))
}

fn write_error(err: sqlx::Error, title: &str) -> RepositoryError {
    let err = DatabaseError::Query(err);
    if err.is_unique_violation() {
        RepositoryError::DuplicateTitle(title.to_string())
    } else {
        RepositoryError::Database(err)
    }
}
