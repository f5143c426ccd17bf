use crate::classifier_api;
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use cookbook_dal::tag::{CreateTag, Tag, TagRepository, UpdateTag};

classifier_api!(Tag, tag_id);
