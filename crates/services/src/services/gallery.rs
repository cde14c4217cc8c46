//! Category filtering and the lightbox viewer.

use db::models::{
    category::Category,
    image::{CategoryMembership, Image},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Selector value meaning "no filter"
pub const ALL: &str = "all";

/// Anything that can answer whether it is filed under a category slug
pub trait Categorized {
    fn in_category(&self, slug: &str) -> bool;
}

impl Categorized for Image {
    fn in_category(&self, slug: &str) -> bool {
        self.category_slugs.iter().any(|s| s == slug)
    }
}

impl Categorized for CategoryMembership {
    fn in_category(&self, slug: &str) -> bool {
        self.contains_slug(slug)
    }
}

impl<T: Categorized> Categorized for &T {
    fn in_category(&self, slug: &str) -> bool {
        (**self).in_category(slug)
    }
}

/// Normalize a selector: blank and `"all"` select everything
pub fn selected_slug(selected: Option<&str>) -> Option<&str> {
    selected
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ALL)
}

/// Keep the items filed under `selected`, preserving order
pub fn filter_by_category<T: Categorized>(items: Vec<T>, selected: Option<&str>) -> Vec<T> {
    match selected_slug(selected) {
        None => items,
        Some(slug) => items
            .into_iter()
            .filter(|item| item.in_category(slug))
            .collect(),
    }
}

/// Response of the gallery endpoint
#[derive(Debug, Clone, Serialize, TS)]
pub struct GalleryView {
    pub categories: Vec<Category>,
    pub images: Vec<Image>,
    /// The applied slug, or `"all"`
    pub selected: String,
}

impl GalleryView {
    pub fn new(categories: Vec<Category>, images: Vec<Image>, selected: Option<&str>) -> Self {
        let slug = selected_slug(selected);
        Self {
            images: filter_by_category(images, slug),
            selected: slug.unwrap_or(ALL).to_string(),
            categories,
        }
    }
}

/// Modal image viewer over the currently visible list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Lightbox {
    #[default]
    Closed,
    Open {
        index: usize,
    },
}

impl Lightbox {
    /// Open at `index`; stays closed when the index is outside the list
    pub fn open(index: usize, len: usize) -> Self {
        if index < len {
            Lightbox::Open { index }
        } else {
            Lightbox::Closed
        }
    }

    pub fn close(self) -> Self {
        Lightbox::Closed
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Lightbox::Open { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Lightbox::Open { index } => Some(*index),
            Lightbox::Closed => None,
        }
    }

    /// Advance, wrapping from the last image to the first
    pub fn next(self, len: usize) -> Self {
        match self {
            Lightbox::Open { index } if len > 0 => Lightbox::Open {
                index: (index % len + 1) % len,
            },
            other => other,
        }
    }

    /// Step back, wrapping from the first image to the last
    pub fn previous(self, len: usize) -> Self {
        match self {
            Lightbox::Open { index } if len > 0 => Lightbox::Open {
                index: (index % len + len - 1) % len,
            },
            other => other,
        }
    }

    /// Re-anchor after the visible list changed to `len` items: the viewer
    /// closes on an empty list and clamps to the last item otherwise
    pub fn resize(self, len: usize) -> Self {
        match self {
            Lightbox::Open { .. } if len == 0 => Lightbox::Closed,
            Lightbox::Open { index } => Lightbox::Open {
                index: index.min(len - 1),
            },
            Lightbox::Closed => Lightbox::Closed,
        }
    }
}
