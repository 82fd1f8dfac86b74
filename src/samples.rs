//! Boilerplate certificates for eyeballing template layouts.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};

use crate::certificate::{CertificateData, CertificateRenderer};
use crate::storage::sanitize_component;

const NAMES: &[&str] = &[
    "Alice Johnson",
    "Bob Smith",
    "Carol Davis",
    "David Wilson",
    "Eva Brown",
    "Frank Miller",
    "Grace Taylor",
    "Henry Anderson",
];

const COURSES: &[&str] = &[
    "Web Development Fundamentals",
    "Advanced JavaScript",
    "React Mastery",
    "Node.js Backend Development",
    "Database Design",
    "UI/UX Design Principles",
    "DevOps Essentials",
    "Mobile App Development",
];

const INSTRUCTORS: &[&str] = &[
    "Dr. Sarah Chen",
    "Prof. Michael Rodriguez",
    "Ms. Jennifer Lee",
    "Dr. Robert Thompson",
    "Prof. Lisa Garcia",
    "Mr. Kevin Martinez",
    "Dr. Amanda White",
    "Prof. James Johnson",
];

/// Field overrides for sample data; anything left `None` uses a default.
#[derive(Debug, Clone, Default)]
pub struct SampleOverrides {
    pub name: Option<String>,
    pub course: Option<String>,
    pub instructor: Option<String>,
    pub date: Option<String>,
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

pub fn default_data(template: &str, overrides: SampleOverrides) -> CertificateData {
    CertificateData {
        name: overrides.name.unwrap_or_else(|| "Test User".to_string()),
        course: overrides.course.unwrap_or_else(|| "Sample Course".to_string()),
        instructor: overrides
            .instructor
            .unwrap_or_else(|| "Test Instructor".to_string()),
        date: overrides.date.unwrap_or_else(today),
        template: Some(template.to_string()),
    }
}

/// Sample `index` of a batch: cycles the fixture lists and spreads dates
/// over the past year.
pub fn batch_data(template: &str, index: usize) -> CertificateData {
    let days_ago = (index as i64 * 53) % 365;
    CertificateData {
        name: NAMES[index % NAMES.len()].to_string(),
        course: COURSES[index % COURSES.len()].to_string(),
        instructor: INSTRUCTORS[index % INSTRUCTORS.len()].to_string(),
        date: (Utc::now() - Duration::days(days_ago))
            .format("%Y-%m-%d")
            .to_string(),
        template: Some(template.to_string()),
    }
}

/// Renders one certificate into `out_dir`, creating it if needed.
pub fn write_sample(
    renderer: &CertificateRenderer,
    out_dir: &Path,
    template: &str,
    data: &CertificateData,
) -> Result<PathBuf> {
    let png = renderer.render(template, data)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let filename = format!(
        "test_certificate_{}_{}.png",
        sanitize_component(&data.name),
        Utc::now().timestamp_millis()
    );
    let path = out_dir.join(filename);
    std::fs::write(&path, &png)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        "Sample certificate saved to {} ({:.1} KB)",
        path.display(),
        png.len() as f64 / 1024.0
    );
    tracing::debug!(?data, "sample data");
    Ok(path)
}

/// Renders `count` samples. Failures are logged and skipped.
pub fn write_samples(
    renderer: &CertificateRenderer,
    out_dir: &Path,
    template: &str,
    count: usize,
) -> Vec<PathBuf> {
    tracing::info!("Generating {} sample certificates from {}", count, template);
    let written: Vec<PathBuf> = (0..count)
        .filter_map(|index| {
            let data = batch_data(template, index);
            match write_sample(renderer, out_dir, template, &data) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::error!("Failed to generate sample {}: {:#}", index + 1, e);
                    None
                }
            }
        })
        .collect();
    tracing::info!("Generated {} of {} sample certificates", written.len(), count);
    written
}
