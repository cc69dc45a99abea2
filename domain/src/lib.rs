//! Domain library for the portfolio testimonials service.
//!
//! Holds the testimonial types, the storage ports (traits), the pure merge and
//! sampling functions, and the `TestimonialStore` service that ties them
//! together. Keep adapters and IO concerns out of this crate.

use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

/// Where a testimonial was loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// Written by a visitor through the remote document collection.
    Remote,
    /// Shipped with the static portfolio configuration.
    Static,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Remote => "remote",
            Source::Static => "static",
        }
    }
}

/// Star rating between 1 and 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::new(
                "rating",
                format!("must be between {} and {}, got {}", Self::MIN, Self::MAX, value),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

/// A testimonial as shown on the site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Testimonial {
    /// Unique within its source only; the two sources mint ids independently.
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub company: Option<String>,
    pub content: String,
    pub rating: Rating,
    pub created_at: SystemTime,
    pub source: Source,
}

impl Testimonial {
    /// The `(name, content)` pair two testimonials are considered equal by.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.name.as_str(), self.content.as_str())
    }
}

/// A visitor's submission before it has been stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTestimonial {
    pub name: String,
    pub content: String,
    pub role: Option<String>,
    pub company: Option<String>,
    pub rating: Rating,
}

impl NewTestimonial {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, content: C) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_company<S: Into<String>>(mut self, company: S) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }
}

/// Ordering requested from the remote collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOrder {
    CreatedAtDesc,
    CreatedAtAsc,
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Repository port for the remote testimonial collection.
pub trait TestimonialRepository: Send + Sync {
    /// Every stored testimonial, in the requested order.
    fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError>;
    /// Store a submission; the repository assigns `id` and `created_at`.
    fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError>;
}

impl<T: TestimonialRepository + ?Sized> TestimonialRepository for Arc<T> {
    fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError> {
        (**self).list(order)
    }

    fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError> {
        (**self).insert(candidate)
    }
}

/// Read-only source of the testimonials shipped with the site configuration.
pub trait StaticTestimonials: Send + Sync {
    fn testimonials(&self) -> &[Testimonial];
}

impl StaticTestimonials for Vec<Testimonial> {
    fn testimonials(&self) -> &[Testimonial] {
        self
    }
}

impl<T: StaticTestimonials + ?Sized> StaticTestimonials for Arc<T> {
    fn testimonials(&self) -> &[Testimonial] {
        (**self).testimonials()
    }
}

/// A single rejected input field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("repository error: {0}")]
    Repository(String),
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}: testimonial store", pkg, ver)
}

pub mod adapters;
pub mod contact;
pub mod merge;
pub mod portfolio;
pub mod sample;
pub mod service;
pub mod validate;
