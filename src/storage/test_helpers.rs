//! Shared test helpers for storage and export module tests.
//!
//! This module provides common utilities for database setup and test data creation.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Creates an in-memory test database pool.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool")
}

/// Creates `users (id, name)` and inserts `count` rows named `user-<id>`.
pub async fn seed_users(pool: &SqlitePool, count: usize) {
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .execute(pool)
        .await
        .expect("Failed to create users table");

    for id in 1..=count {
        sqlx::query("INSERT INTO users (id, name) VALUES (?, ?)")
            .bind(id as i64)
            .bind(format!("user-{id}"))
            .execute(pool)
            .await
            .expect("Failed to insert user");
    }
}
