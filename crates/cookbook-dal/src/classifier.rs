/// Generates entity, payload and repository for simple classifiers of recipes (category, tag).
///
/// Classifier has title and slug derived from it. It cannot be deleted while
/// `usage` query (with classifier id as the only parameter) returns non zero count.
macro_rules! classifier_repository {
    (
        entity = $entity:ident,
        create = $create:ident,
        repository = $repo:ident,
        repository_impl = $repo_impl:ident,
        table = $table:literal,
        min_title = $min_title:literal,
        usage = $usage:literal $(,)?
    ) => {
        #[derive(Debug, serde::Serialize, serde::Deserialize, Clone, sqlx::FromRow)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $entity {
            pub id: i64,
            pub title: String,
            pub slug: String,
            pub created: time::PrimitiveDateTime,
            pub modified: time::PrimitiveDateTime,
        }

        #[derive(Debug, serde::Serialize, serde::Deserialize, Clone, garde::Validate)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $create {
            #[garde(length(min = $min_title, max = 64))]
            pub title: String,
        }

        pub const VALID_ORDER_FIELDS: &[&str] = &["id", "title", "slug", "created", "modified"];

        pub type $repo = $repo_impl<sqlx::Pool<crate::ChosenDB>>;

        pub struct $repo_impl<E> {
            executor: E,
        }

        impl<'c, E> $repo_impl<E>
        where
            for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>
                + sqlx::Acquire<'c, Database = crate::ChosenDB>,
        {
            pub fn new(executor: E) -> Self {
                Self { executor }
            }

            pub async fn create(&self, payload: $create) -> crate::error::Result<$entity> {
                use sqlx::Acquire as _;
                let title = clean_title(&payload.title)?;
                let mut conn = self.executor.acquire().await?;
                let mut transaction = conn.begin().await?;
                let slug =
                    crate::slug::unique_slug(&mut transaction, $table, title, None).await?;
                let now = crate::now();
                let result = sqlx::query(concat!(
                    "INSERT INTO ",
                    $table,
                    " (title, slug, created, modified) VALUES (?, ?, ?, ?)"
                ))
                .bind(title)
                .bind(&slug)
                .bind(now)
                .bind(now)
                .execute(&mut *transaction)
                .await
                .map_err(crate::Error::unique_violation(stringify!($entity)))?;

                let record = get(result.last_insert_rowid(), &mut *transaction).await?;
                transaction.commit().await?;
                tracing::debug!("Created {} {}", stringify!($entity), record.id);
                Ok(record)
            }

            pub async fn update(&self, id: i64, payload: $create) -> crate::error::Result<$entity> {
                use sqlx::Acquire as _;
                let title = clean_title(&payload.title)?;
                let mut conn = self.executor.acquire().await?;
                let mut transaction = conn.begin().await?;
                let existing = get(id, &mut *transaction).await?;
                let slug = if existing.title != title {
                    crate::slug::unique_slug(&mut transaction, $table, title, Some(id))
                        .await?
                } else {
                    existing.slug
                };
                sqlx::query(concat!(
                    "UPDATE ",
                    $table,
                    " SET title = ?, slug = ?, modified = ? WHERE id = ?"
                ))
                .bind(title)
                .bind(&slug)
                .bind(crate::now())
                .bind(id)
                .execute(&mut *transaction)
                .await
                .map_err(crate::Error::unique_violation(stringify!($entity)))?;

                let record = get(id, &mut *transaction).await?;
                transaction.commit().await?;
                Ok(record)
            }

            pub async fn count(&self) -> crate::error::Result<u64> {
                let count: i64 = sqlx::query_scalar(concat!("SELECT count(*) FROM ", $table))
                    .fetch_one(&self.executor)
                    .await?;
                Ok(count as u64)
            }

            pub async fn list_all(&self) -> crate::error::Result<Vec<$entity>> {
                self.list(crate::ListingParams::default())
                    .await
                    .map(|batch| batch.rows)
            }

            pub async fn list(
                &self,
                params: crate::ListingParams,
            ) -> crate::error::Result<crate::Batch<$entity>> {
                let order = params.order_clause(VALID_ORDER_FIELDS, "title")?;
                let sql = format!(
                    concat!(
                        "SELECT id, title, slug, created, modified FROM ",
                        $table,
                        " {} LIMIT ? OFFSET ?"
                    ),
                    order
                );
                let limit = params.limit.min(crate::MAX_LIMIT as i64);
                let rows = sqlx::query_as::<_, $entity>(&sql)
                    .bind(limit)
                    .bind(params.offset)
                    .fetch_all(&self.executor)
                    .await?;
                let total = self.count().await?;
                Ok(crate::Batch {
                    offset: params.offset,
                    limit,
                    total,
                    rows,
                })
            }

            pub async fn get(&self, id: i64) -> crate::error::Result<$entity> {
                get(id, &self.executor).await
            }

            pub async fn find_by_slug(&self, slug: &str) -> crate::error::Result<$entity> {
                sqlx::query_as::<_, $entity>(concat!(
                    "SELECT id, title, slug, created, modified FROM ",
                    $table,
                    " WHERE slug = ?"
                ))
                .bind(slug)
                .fetch_one(&self.executor)
                .await
                .map_err(crate::Error::not_found(stringify!($entity)))
            }

            /// Number of recipes using this record
            pub async fn usage_count(&self, id: i64) -> crate::error::Result<u64> {
                let count: i64 = sqlx::query_scalar($usage)
                    .bind(id)
                    .fetch_one(&self.executor)
                    .await?;
                Ok(count as u64)
            }

            pub async fn delete(&self, id: i64) -> crate::error::Result<()> {
                use sqlx::Acquire as _;
                let mut conn = self.executor.acquire().await?;
                let mut transaction = conn.begin().await?;
                get(id, &mut *transaction).await?;
                let used: i64 = sqlx::query_scalar($usage)
                    .bind(id)
                    .fetch_one(&mut *transaction)
                    .await?;
                if used > 0 {
                    tracing::debug!(
                        "Refusing to delete {} {id} used by {used} recipes",
                        stringify!($entity)
                    );
                    return Err(crate::Error::ReferencedRecord(
                        stringify!($entity).to_string(),
                    ));
                }
                sqlx::query(concat!("DELETE FROM ", $table, " WHERE id = ?"))
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;
                transaction.commit().await?;
                Ok(())
            }
        }

        /// Titles are stored trimmed and must not be blank
        fn clean_title(title: &str) -> crate::error::Result<&str> {
            let title = title.trim();
            if title.is_empty() {
                return Err(crate::Error::InvalidValue(
                    concat!(stringify!($entity), " title is empty").to_string(),
                ));
            }
            Ok(title)
        }

        async fn get<'c, E>(id: i64, executor: E) -> crate::error::Result<$entity>
        where
            E: sqlx::Executor<'c, Database = crate::ChosenDB>,
        {
            sqlx::query_as::<_, $entity>(concat!(
                "SELECT id, title, slug, created, modified FROM ",
                $table,
                " WHERE id = ?"
            ))
            .bind(id)
            .fetch_one(executor)
            .await
            .map_err(crate::Error::not_found(stringify!($entity)))
        }
    };
}
