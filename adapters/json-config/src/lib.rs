//! json-config: loads the static portfolio configuration from a JSON file.
//!
//! Purpose
//! - Read `portfolio-config.json` once at startup into a typed
//!   `domain::portfolio::PortfolioConfig`.
//! - Check every static testimonial (non-empty name/content, rating 1-5,
//!   parseable `createdAt`, no repeated name and content) so a malformed
//!   file fails startup instead of showing up as a broken card later.
//!
//! Notes
//! - `createdAt` may be a plain `YYYY-MM-DD` date or an RFC3339 timestamp.
//! - Empty `role`/`company` strings are treated as absent.

use std::fs;
use std::path::{Path, PathBuf};

use domain::portfolio::{
    ContactInfo, NavigationItem, PersonalInfo, PortfolioConfig, Project, SeoInfo, SkillCategories,
};
use domain::validate::require_non_empty;
use domain::{Rating, Source, Testimonial, ValidationError};
use serde::Deserialize;
use thiserror::Error;

/// Why the configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed portfolio config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("testimonial {id:?}: {reason}")]
    InvalidTestimonial { id: String, reason: String },
    #[error("duplicate testimonial id {0:?}")]
    DuplicateId(String),
    #[error("testimonial {id:?} repeats the name and content of {first:?}")]
    DuplicateEntry { id: String, first: String },
}

#[derive(Deserialize)]
struct RawPortfolio {
    personal: PersonalInfo,
    #[serde(default)]
    skills: SkillCategories,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    testimonials: Vec<RawTestimonial>,
    contact: ContactInfo,
    seo: SeoInfo,
    #[serde(default)]
    navigation: Vec<NavigationItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTestimonial {
    id: String,
    name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    company: Option<String>,
    content: String,
    #[serde(default = "default_rating")]
    rating: u8,
    created_at: String,
}

fn default_rating() -> u8 {
    Rating::MAX
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl RawTestimonial {
    fn into_domain(self) -> Result<Testimonial, ConfigLoadError> {
        let invalid = |id: &str, e: ValidationError| ConfigLoadError::InvalidTestimonial {
            id: id.to_string(),
            reason: e.to_string(),
        };
        require_non_empty("name", &self.name).map_err(|e| invalid(&self.id, e))?;
        require_non_empty("content", &self.content).map_err(|e| invalid(&self.id, e))?;
        let rating = Rating::new(self.rating).map_err(|e| invalid(&self.id, e))?;
        let created_at = http_common::parse_date_or_rfc3339(&self.created_at).map_err(|e| {
            ConfigLoadError::InvalidTestimonial {
                id: self.id.clone(),
                reason: format!("createdAt {:?}: {}", self.created_at, e),
            }
        })?;
        Ok(Testimonial {
            id: self.id,
            name: self.name,
            role: non_empty(self.role),
            company: non_empty(self.company),
            content: self.content,
            rating,
            created_at,
            source: Source::Static,
        })
    }
}

/// Parse a configuration document.
pub fn parse_portfolio_config(json: &str) -> Result<PortfolioConfig, ConfigLoadError> {
    let raw: RawPortfolio = serde_json::from_str(json)?;

    let mut testimonials = Vec::with_capacity(raw.testimonials.len());
    for t in raw.testimonials {
        if testimonials.iter().any(|s: &Testimonial| s.id == t.id) {
            return Err(ConfigLoadError::DuplicateId(t.id));
        }
        let t = t.into_domain()?;
        if let Some(first) = testimonials
            .iter()
            .find(|s: &&Testimonial| s.dedup_key() == t.dedup_key())
        {
            return Err(ConfigLoadError::DuplicateEntry {
                id: t.id,
                first: first.id.clone(),
            });
        }
        testimonials.push(t);
    }

    Ok(PortfolioConfig {
        personal: raw.personal,
        skills: raw.skills,
        projects: raw.projects,
        testimonials,
        contact: raw.contact,
        seo: raw.seo,
        navigation: raw.navigation,
    })
}

/// Read and parse the configuration file at `path`.
pub fn load_portfolio_config<P: AsRef<Path>>(path: P) -> Result<PortfolioConfig, ConfigLoadError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = parse_portfolio_config(&json)?;
    tracing::info!(
        path = %path.display(),
        projects = cfg.projects.len(),
        testimonials = cfg.testimonials.len(),
        "portfolio config loaded"
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::StaticTestimonials;

    const SAMPLE: &str = include_str!("../../../data/portfolio-config.json");

    fn doc_with_testimonials(testimonials: &str) -> String {
        let mut v: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        v["testimonials"] = serde_json::from_str(testimonials).unwrap();
        v.to_string()
    }

    #[test]
    fn bundled_sample_parses() {
        let cfg = parse_portfolio_config(SAMPLE).expect("sample config");
        assert!(!cfg.projects.is_empty());
        assert!(!cfg.testimonials.is_empty());
        assert!(cfg
            .testimonials()
            .iter()
            .all(|t| t.source == Source::Static));
        assert_eq!(cfg.projects_by_category("All").len(), cfg.projects.len());
    }

    #[test]
    fn date_only_and_rfc3339_created_at() {
        let doc = doc_with_testimonials(
            r#"[
                {"id":"1","name":"A","role":"CTO","company":"","content":"x","rating":5,"createdAt":"2024-01-15"},
                {"id":"2","name":"B","content":"y","rating":4,"createdAt":"2024-02-01T09:00:00Z"}
            ]"#,
        );
        let cfg = parse_portfolio_config(&doc).unwrap();
        assert_eq!(
            http_common::system_time_to_rfc3339(cfg.testimonials[0].created_at),
            "2024-01-15T00:00:00Z"
        );
        assert_eq!(cfg.testimonials[0].company, None);
        assert_eq!(cfg.testimonials[0].role.as_deref(), Some("CTO"));
        assert_eq!(cfg.testimonials[1].rating.get(), 4);
    }

    #[test]
    fn missing_rating_defaults_to_five() {
        let doc = doc_with_testimonials(
            r#"[{"id":"1","name":"A","content":"x","createdAt":"2024-01-15"}]"#,
        );
        let cfg = parse_portfolio_config(&doc).unwrap();
        assert_eq!(cfg.testimonials[0].rating.get(), 5);
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let doc = doc_with_testimonials(
            r#"[{"id":"t9","name":"A","content":"x","rating":9,"createdAt":"2024-01-15"}]"#,
        );
        let err = parse_portfolio_config(&doc).unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidTestimonial { ref id, .. } if id == "t9"));
    }

    #[test]
    fn bad_date_is_rejected() {
        let doc = doc_with_testimonials(
            r#"[{"id":"1","name":"A","content":"x","rating":5,"createdAt":"last tuesday"}]"#,
        );
        assert!(matches!(
            parse_portfolio_config(&doc),
            Err(ConfigLoadError::InvalidTestimonial { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let doc = doc_with_testimonials(
            r#"[
                {"id":"1","name":"A","content":"x","createdAt":"2024-01-15"},
                {"id":"1","name":"B","content":"y","createdAt":"2024-01-16"}
            ]"#,
        );
        assert!(matches!(
            parse_portfolio_config(&doc),
            Err(ConfigLoadError::DuplicateId(ref id)) if id == "1"
        ));
    }

    #[test]
    fn repeated_name_and_content_is_rejected() {
        let doc = doc_with_testimonials(
            r#"[
                {"id":"1","name":"A","content":"x","createdAt":"2024-01-15"},
                {"id":"2","name":"B","content":"x","createdAt":"2024-01-16"},
                {"id":"3","name":"A","content":"x","rating":4,"createdAt":"2024-01-17"}
            ]"#,
        );
        assert!(matches!(
            parse_portfolio_config(&doc),
            Err(ConfigLoadError::DuplicateEntry { ref id, ref first }) if id == "3" && first == "1"
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_portfolio_config(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio-config.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_portfolio_config(&path).unwrap();
        assert_eq!(cfg, parse_portfolio_config(SAMPLE).unwrap());
    }
}
