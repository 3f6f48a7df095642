//! Scene configuration surface.
//!
//! An optional, externally-supplied override object for the two pieces of
//! user content the scene carries: the heart-cluster image paths and the
//! orbiting ring texts. Absent overrides fall back to the built-in
//! defaults (24 numbered image paths; a title, two names and a date).
//!
//! # Example
//!
//! ```
//! use stardrift::config::SceneConfig;
//!
//! let config = SceneConfig::default()
//!     .prepend_heart_images(["photos/us.jpg"])
//!     .append_ring_texts(["Forever"]);
//! assert_eq!(config.heart_images[0], "photos/us.jpg");
//! assert_eq!(config.ring_texts.last().unwrap(), "Forever");
//! ```

/// Number of built-in numbered heart images.
pub const DEFAULT_HEART_IMAGE_COUNT: usize = 24;

/// Content configuration for a scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Image paths, one heart cluster each. Overrides come first so the
    /// densest clusters show caller content.
    pub heart_images: Vec<String>,
    /// Ring texts, innermost first. Overrides are appended after the
    /// built-in strings.
    pub ring_texts: Vec<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            heart_images: (1..=DEFAULT_HEART_IMAGE_COUNT)
                .map(|i| format!("images/img{i}.jpg"))
                .collect(),
            ring_texts: vec![
                "Happy Wedding".to_string(),
                "Minh Anh".to_string(),
                "Thu Trang".to_string(),
                "02/07/2025".to_string(),
            ],
        }
    }
}

impl SceneConfig {
    /// Insert caller-supplied image paths ahead of the defaults.
    pub fn prepend_heart_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Vec<String> = images.into_iter().map(Into::into).collect();
        merged.append(&mut self.heart_images);
        self.heart_images = merged;
        self
    }

    /// Append caller-supplied ring texts after the defaults.
    pub fn append_ring_texts<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ring_texts.extend(texts.into_iter().map(Into::into));
        self
    }

    /// Replace the image list entirely.
    pub fn with_heart_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.heart_images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ring texts entirely.
    pub fn with_ring_texts<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ring_texts = texts.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.heart_images.len(), 24);
        assert_eq!(config.heart_images[0], "images/img1.jpg");
        assert_eq!(config.heart_images[23], "images/img24.jpg");
        assert_eq!(config.ring_texts.len(), 4);
    }

    #[test]
    fn test_overrides_merge_order() {
        let config = SceneConfig::default()
            .prepend_heart_images(["a.jpg", "b.jpg"])
            .append_ring_texts(["extra"]);
        assert_eq!(config.heart_images.len(), 26);
        assert_eq!(config.heart_images[0], "a.jpg");
        assert_eq!(config.heart_images[2], "images/img1.jpg");
        assert_eq!(config.ring_texts.len(), 5);
        assert_eq!(config.ring_texts[0], "Happy Wedding");
        assert_eq!(config.ring_texts[4], "extra");
    }
}
