//! Flavor variants: the fixed, ordered set of labels a product can wear.

use serde::{Deserialize, Serialize};
use showcase_animation::Color;
use thiserror::Error;

/// Number of flavor variants the page ships with.
pub const VARIANT_COUNT: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum VariantError {
    #[error("expected {expected} variants, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("duplicate variant id '{0}'")]
    DuplicateId(String),
    #[error("variant '{0}' has no label texture")]
    MissingTexture(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    pub display_name: String,
    pub label_texture: String,
    /// Primary and secondary accent, applied in order to the decorative rings.
    pub accents: [Color; 2],
    pub background: Color,
}

/// Validated, ordered variant set.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantTable {
    variants: Vec<ProductVariant>,
}

impl VariantTable {
    pub fn new(variants: Vec<ProductVariant>) -> Result<Self, VariantError> {
        if variants.len() != VARIANT_COUNT {
            return Err(VariantError::WrongCount {
                expected: VARIANT_COUNT,
                found: variants.len(),
            });
        }
        for (i, v) in variants.iter().enumerate() {
            if variants[..i].iter().any(|other| other.id == v.id) {
                return Err(VariantError::DuplicateId(v.id.clone()));
            }
            if v.label_texture.trim().is_empty() {
                return Err(VariantError::MissingTexture(v.id.clone()));
            }
        }
        Ok(Self { variants })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProductVariant> {
        self.variants.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductVariant> + '_ {
        self.variants.iter()
    }
}
