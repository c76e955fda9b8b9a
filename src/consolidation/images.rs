use std::collections::HashSet;

use crate::models::submissions::ImageRef;

/// 保持首次出现顺序的去重图片集合
#[derive(Debug, Default, Clone)]
pub struct ImageSet {
    items: Vec<ImageRef>,
    keys: HashSet<String>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_images<'a>(images: impl IntoIterator<Item = &'a ImageRef>) -> Self {
        let mut set = Self::new();
        set.extend(images);
        set
    }

    /// 新图片返回 `true`，重复的忽略
    pub fn push(&mut self, image: &ImageRef) -> bool {
        if self.keys.insert(image.dedup_key()) {
            self.items.push(image.clone());
            true
        } else {
            false
        }
    }

    pub fn extend<'a>(&mut self, images: impl IntoIterator<Item = &'a ImageRef>) {
        for image in images {
            self.push(image);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(ImageRef::dedup_key).collect()
    }

    pub fn into_vec(self) -> Vec<ImageRef> {
        self.items
    }
}

/// 图片去重键集合
pub fn key_set<'a>(images: impl IntoIterator<Item = &'a ImageRef>) -> HashSet<String> {
    images.into_iter().map(ImageRef::dedup_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let images: Vec<ImageRef> = vec!["c.jpg".into(), "a.jpg".into(), "c.jpg".into(), "b.jpg".into()];
        let set = ImageSet::from_images(&images);
        assert_eq!(set.keys(), vec!["c.jpg", "a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_string_and_object_share_key() {
        let object: ImageRef = serde_json::from_value(json!({"filename": "a.jpg"})).unwrap();
        let mut set = ImageSet::from_images([&ImageRef::from("a.jpg")]);
        assert!(!set.push(&object));
        assert_eq!(set.len(), 1);
    }
}
