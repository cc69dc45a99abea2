//! Typed portfolio configuration and the read-only accessors over it.
//!
//! The configuration is built once at startup (see the `json-config` adapter)
//! and shared behind an `Arc`; nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::{StaticTestimonials, Testimonial};

/// Number of projects shown in the featured strip.
pub const FEATURED_PROJECT_COUNT: usize = 3;

/// Category name that matches every project.
pub const ALL_CATEGORIES: &str = "All";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub profile_image: String,
    pub cv: String,
    pub bio: Vec<String>,
    pub social_links: SocialLinks,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub email: String,
    pub twitter: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Self-assessed proficiency, 0-100.
    pub level: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategories {
    pub frontend: Vec<Skill>,
    pub backend: Vec<Skill>,
    pub tools: Vec<Skill>,
    pub database: Vec<Skill>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub category: String,
    pub image: String,
    pub tags: Vec<String>,
    pub links: ProjectLinks,
    pub features: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLinks {
    pub demo: String,
    pub github: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub title: String,
    pub description: String,
    pub office_hours: OfficeHours,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeHours {
    pub weekdays: String,
    pub weekdays_time: String,
    pub saturday: String,
    pub saturday_time: String,
    pub sunday: String,
    pub sunday_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInfo {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub site_url: String,
    pub twitter_handle: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub label: String,
    pub href: String,
}

/// The whole site configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortfolioConfig {
    pub personal: PersonalInfo,
    pub skills: SkillCategories,
    pub projects: Vec<Project>,
    pub testimonials: Vec<Testimonial>,
    pub contact: ContactInfo,
    pub seo: SeoInfo,
    pub navigation: Vec<NavigationItem>,
}

impl PortfolioConfig {
    /// Projects in `category` (case-insensitive); `"All"` returns every project.
    pub fn projects_by_category(&self, category: &str) -> Vec<&Project> {
        if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return self.projects.iter().collect();
        }
        let wanted = category.to_lowercase();
        self.projects
            .iter()
            .filter(|p| p.category.to_lowercase() == wanted)
            .collect()
    }

    /// The first few projects, in configuration order.
    pub fn featured_projects(&self) -> &[Project] {
        let n = self.projects.len().min(FEATURED_PROJECT_COUNT);
        &self.projects[..n]
    }

    /// Distinct project categories in first-seen order, prefixed with `"All"`.
    pub fn project_categories(&self) -> Vec<&str> {
        let mut out = vec![ALL_CATEGORIES];
        for p in &self.projects {
            if !out.contains(&p.category.as_str()) {
                out.push(p.category.as_str());
            }
        }
        out
    }

    /// Skill names flattened: frontend, backend, tools, database.
    pub fn all_technologies(&self) -> Vec<&str> {
        let s = &self.skills;
        s.frontend
            .iter()
            .chain(&s.backend)
            .chain(&s.tools)
            .chain(&s.database)
            .map(|skill| skill.name.as_str())
            .collect()
    }
}

impl StaticTestimonials for PortfolioConfig {
    fn testimonials(&self) -> &[Testimonial] {
        &self.testimonials
    }
}
