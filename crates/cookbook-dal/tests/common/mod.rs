use futures::TryStreamExt as _;
use sqlx::Executor;

pub const TEST_DATA: &str = r#"
INSERT INTO users (id, email, password, roles, created)
VALUES (1, 'admin@example.com', 'nohash', 'admin', datetime());
INSERT INTO users (id, email, password, roles, created)
VALUES (2, 'cook@example.com', 'nohash', NULL, datetime());
INSERT INTO users (id, email, password, roles, created)
VALUES (3, 'taster@example.com', 'nohash', 'user', datetime());

INSERT INTO category (id, title, slug, created, modified)
VALUES (1, 'Soups', 'soups', datetime(), datetime());
INSERT INTO category (id, title, slug, created, modified)
VALUES (2, 'Desserts', 'desserts', datetime(), datetime());
INSERT INTO category (id, title, slug, created, modified)
VALUES (3, 'Drinks', 'drinks', datetime(), datetime());

INSERT INTO tag (id, title, slug, created, modified)
VALUES (1, 'vegan', 'vegan', datetime(), datetime());
INSERT INTO tag (id, title, slug, created, modified)
VALUES (2, 'quick', 'quick', datetime(), datetime());
INSERT INTO tag (id, title, slug, created, modified)
VALUES (3, 'unused', 'unused', datetime(), datetime());

INSERT INTO recipe (id, title, content, slug, average_rating, category_id, author_id, created, modified)
VALUES (1, 'Tomato soup', 'Cook tomatoes', 'tomato-soup', 0, 1, 2, '2024-01-01 10:00:00', '2024-01-01 10:00:00');
INSERT INTO recipe (id, title, content, slug, average_rating, category_id, author_id, created, modified)
VALUES (2, 'Apple pie', 'Bake apples', 'apple-pie', 0, 2, 2, '2024-01-02 10:00:00', '2024-01-02 10:00:00');
INSERT INTO recipe (id, title, content, slug, average_rating, category_id, author_id, created, modified)
VALUES (3, 'Lentil soup', 'Cook lentils', 'lentil-soup', 0, 1, 3, '2024-01-03 10:00:00', '2024-01-03 10:00:00');

INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (1, 1);
INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (1, 2);
INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (3, 1);

INSERT INTO comment (id, content, recipe_id, author_id, created)
VALUES (1, 'Very good', 1, 3, '2024-01-05 10:00:00');
INSERT INTO comment (id, content, recipe_id, author_id, created)
VALUES (2, 'Needs salt', 1, 1, '2024-01-06 10:00:00');
"#;

pub async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    cookbook_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}
