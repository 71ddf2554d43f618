use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, DomainError, DomainResult, Entity};

/// Product category. Slugs are unique and derived from the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name is required"));
        }
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(DomainError::validation(
                "category name must contain letters or digits",
            ));
        }
        Ok(Self {
            id,
            name,
            slug,
            description: description.into(),
            created_at: now,
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lowercase, ASCII-alphanumeric slug with single-dash separators.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_separators_and_case() {
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  Books  "), "books");
        assert_eq!(slugify("Second-Hand Tools"), "second-hand-tools");
    }

    #[test]
    fn category_without_alphanumerics_is_rejected() {
        let err = Category::new(CategoryId::new(), "!!!", "", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn category_gets_slug_from_name() {
        let c = Category::new(CategoryId::new(), "Kitchen Ware", "", Utc::now()).unwrap();
        assert_eq!(c.slug, "kitchen-ware");
    }
}
