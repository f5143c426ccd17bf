use crate::classifier_api;
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use cookbook_dal::category::{Category, CategoryRepository, CreateCategory, UpdateCategory};

classifier_api!(Category, category_id);
