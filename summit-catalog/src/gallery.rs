use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Photo attached to a mountain, optionally scoped to one of its routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: Uuid,
    pub mountain_id: Uuid,
    pub route_id: Option<Uuid>,
    pub title: String,
    pub image: String,
    pub description: String,
    pub photographer: String,
    pub taken_date: Option<NaiveDate>,
    pub is_featured: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// Gallery ordering: `order` ascending, newest first within the same slot.
pub fn sort_gallery(images: &mut [GalleryImage]) {
    images.sort_by(|a, b| a.order.cmp(&b.order).then(b.created_at.cmp(&a.created_at)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn image(order: i32, age_minutes: i64) -> GalleryImage {
        GalleryImage {
            id: Uuid::new_v4(),
            mountain_id: Uuid::nil(),
            route_id: None,
            title: format!("foto-{}-{}", order, age_minutes),
            image: "mountains/gallery/x.jpg".into(),
            description: String::new(),
            photographer: String::new(),
            taken_date: None,
            is_featured: false,
            order,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_sort_by_order_then_newest() {
        let mut images = vec![image(2, 0), image(1, 30), image(1, 5)];
        sort_gallery(&mut images);
        let titles: Vec<_> = images.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["foto-1-5", "foto-1-30", "foto-2-0"]);
    }
}
