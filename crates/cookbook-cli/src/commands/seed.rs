use clap::Args;
use cookbook_dal::{
    category::{Category, CategoryRepository, CreateCategory},
    comment::{CommentRepository, CreateComment},
    rating::{CreateRating, RatingRepository},
    recipe::{CreateRecipe, RecipeRepository},
    user::{CreateUser, UserRepository},
    Error as DalError,
};
use cookbook_types::{config::BackendConfig, general::ValidEmail};
use fake::{
    faker::{
        internet::en::SafeEmail,
        lorem::en::{Paragraph, Sentence},
    },
    Fake as _,
};
use rand::{seq::IndexedRandom as _, Rng};
use tracing::{debug, info, warn};

use crate::commands::{open_pool, Executor};

const CATEGORIES: &[&str] = &[
    "Breakfast",
    "Soups",
    "Main dishes",
    "Salads",
    "Desserts",
    "Drinks",
];

const TAGS: &[&str] = &[
    "vegan",
    "vegetarian",
    "quick",
    "spicy",
    "gluten free",
    "budget",
    "festive",
];

/// Fills database with random demo data
#[derive(Args, Debug)]
pub struct SeedCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(long, default_value_t = 5, help = "Number of users to create")]
    pub users: usize,
    #[arg(long, default_value_t = 20, help = "Number of recipes to create")]
    pub recipes: usize,
    #[arg(
        long,
        default_value = "cookbook123",
        help = "Password of created users, at least 8 characters"
    )]
    pub password: String,
}

struct RecipePlan {
    author_id: i64,
    payload: CreateRecipe,
    comments: Vec<(i64, CreateComment)>,
    ratings: Vec<(i64, CreateRating)>,
}

fn title(rng: &mut impl Rng) -> String {
    let sentence: String = Sentence(2..6).fake_with_rng(rng);
    sentence.trim_end_matches('.').to_string()
}

fn plan_recipe(rng: &mut impl Rng, user_ids: &[i64], categories: &[Category]) -> Option<RecipePlan> {
    let author_id = *user_ids.choose(rng)?;
    let category_id = categories.choose(rng)?.id;
    let tags_count = rng.random_range(0..=3);
    let tags = TAGS
        .choose_multiple(rng, tags_count)
        .map(|t| t.to_string())
        .collect();
    let payload = CreateRecipe {
        title: title(rng),
        content: Paragraph(3..8).fake_with_rng(rng),
        category_id,
        tags,
    };

    let comments = (0..rng.random_range(0..=3))
        .filter_map(|_| {
            let content: String = Sentence(3..12).fake_with_rng(rng);
            user_ids.choose(rng).map(|id| (*id, CreateComment { content }))
        })
        .collect();

    let raters = rng.random_range(0..=user_ids.len());
    let ratings = user_ids
        .choose_multiple(rng, raters)
        .copied()
        .collect::<Vec<_>>()
        .into_iter()
        .map(|user_id| {
            let value = rng.random_range(1..=5);
            (user_id, CreateRating { value })
        })
        .collect();

    Some(RecipePlan {
        author_id,
        payload,
        comments,
        ratings,
    })
}

impl SeedCmd {
    async fn ensure_categories(&self, repository: &CategoryRepository) -> anyhow::Result<Vec<Category>> {
        let mut categories = repository.list_all().await?;
        for name in CATEGORIES {
            if categories.iter().any(|c| c.title == *name) {
                continue;
            }
            let category = repository
                .create(CreateCategory {
                    title: name.to_string(),
                })
                .await?;
            debug!("Created category {}", category.title);
            categories.push(category);
        }
        Ok(categories)
    }

    async fn create_users(&self, repository: &UserRepository) -> anyhow::Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(self.users);
        while ids.len() < self.users {
            let email: String = SafeEmail().fake();
            let new_user = CreateUser {
                email: email.parse::<ValidEmail>()?,
                password: self.password.clone(),
                roles: None,
            };
            match repository.create(new_user).await {
                Ok(user) => {
                    debug!("Created user {}", user.email);
                    ids.push(user.id);
                }
                Err(DalError::DuplicateRecord(_)) => {
                    warn!("Generated email {email} already exists, trying another one");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ids)
    }
}

impl Executor for SeedCmd {
    async fn run(self) -> anyhow::Result<()> {
        if self.password.chars().count() < 8 {
            anyhow::bail!("Password must have at least 8 characters");
        }
        if self.users == 0 && self.recipes > 0 {
            anyhow::bail!("At least one user is needed to author recipes");
        }
        let pool = open_pool(&self.backend).await?;
        let categories = self
            .ensure_categories(&CategoryRepository::new(pool.clone()))
            .await?;
        let user_ids = self
            .create_users(&UserRepository::new(pool.clone()))
            .await?;

        let plans: Vec<RecipePlan> = {
            let mut rng = rand::rng();
            (0..self.recipes)
                .filter_map(|_| plan_recipe(&mut rng, &user_ids, &categories))
                .collect()
        };

        let recipe_repository = RecipeRepository::new(pool.clone());
        let comment_repository = CommentRepository::new(pool.clone());
        let rating_repository = RatingRepository::new(pool);
        let mut comments = 0;
        let mut ratings = 0;
        for plan in plans.iter() {
            let recipe = recipe_repository
                .create(plan.payload.clone(), plan.author_id)
                .await?;
            for (author_id, comment) in plan.comments.iter() {
                comment_repository
                    .create(recipe.id, *author_id, comment.clone())
                    .await?;
                comments += 1;
            }
            for (user_id, rating) in plan.ratings.iter() {
                rating_repository
                    .rate(recipe.id, *user_id, rating.clone())
                    .await?;
                ratings += 1;
            }
        }

        info!(
            "Seeded {} users, {} recipes, {comments} comments and {ratings} ratings",
            user_ids.len(),
            plans.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate as _;

    fn category(id: i64) -> Category {
        let now = cookbook_dal::now();
        Category {
            id,
            title: format!("Category {id}"),
            slug: format!("category-{id}"),
            created: now,
            modified: now,
        }
    }

    #[test]
    fn test_plan_recipe() {
        let mut rng = rand::rng();
        let users = [1, 2, 3];
        let categories = [category(1), category(2)];
        for _ in 0..20 {
            let plan = plan_recipe(&mut rng, &users, &categories).unwrap();
            assert!(users.contains(&plan.author_id));
            assert!(plan.payload.validate().is_ok());
            assert!(plan.ratings.len() <= users.len());
            let mut raters: Vec<_> = plan.ratings.iter().map(|(id, _)| *id).collect();
            raters.sort();
            raters.dedup();
            assert_eq!(raters.len(), plan.ratings.len());
            for (_, comment) in plan.comments.iter() {
                assert!(comment.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_plan_without_users() {
        let mut rng = rand::rng();
        assert!(plan_recipe(&mut rng, &[], &[category(1)]).is_none());
    }
}
