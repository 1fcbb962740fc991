use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::slug::slugify;
use crate::CatalogError;

/// Trekking difficulty, shared by mountains and routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Mudah",
            Difficulty::Medium => "Menengah",
            Difficulty::Hard => "Sulit",
            Difficulty::Extreme => "Ekstrim",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "extreme" => Ok(Difficulty::Extreme),
            other => Err(CatalogError::Invalid(format!("unknown difficulty '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mountain {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Metres above sea level.
    pub height: i32,
    pub location: String,
    pub province: String,
    pub difficulty_level: Difficulty,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mountain {
    /// New active mountain; the slug is derived from the name.
    pub fn new(
        name: &str,
        description: &str,
        height: i32,
        location: &str,
        province: &str,
        difficulty_level: Difficulty,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            description: description.to_string(),
            height,
            location: location.to_string(),
            province: province.to_string(),
            difficulty_level,
            image: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Invalid("mountain name is required".into()));
        }
        if self.slug.is_empty() {
            return Err(CatalogError::Invalid("mountain slug is empty".into()));
        }
        if self.height < 0 {
            return Err(CatalogError::Invalid("height must be >= 0".into()));
        }
        Ok(())
    }

    pub fn display_name(&self) -> String {
        format!("{} ({} mdpl)", self.name, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mountain_derives_slug() {
        let m = Mountain::new(
            "Gunung Rinjani",
            "Gunung berapi di Lombok",
            3726,
            "Lombok Utara",
            "Nusa Tenggara Barat",
            Difficulty::Hard,
        );
        assert_eq!(m.slug, "gunung-rinjani");
        assert_eq!(m.display_name(), "Gunung Rinjani (3726 mdpl)");
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_difficulty_round_trip_and_label() {
        assert_eq!("extreme".parse::<Difficulty>().unwrap(), Difficulty::Extreme);
        assert_eq!(Difficulty::Hard.label(), "Sulit");
        assert!("brutal".parse::<Difficulty>().is_err());
    }
}
