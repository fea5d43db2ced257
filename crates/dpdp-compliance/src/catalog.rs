//! Data category and processing purpose catalog.
//!
//! Every new compliance record starts from a copy of the configured catalog.

use crate::model::{DataCategory, ProcessingPurpose, Sensitivity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Catalog problems found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate data category: {0}")]
    DuplicateCategory(String),
    #[error("duplicate processing purpose: {0}")]
    DuplicatePurpose(String),
    #[error("purpose '{purpose}' references unknown data category '{category}'")]
    UnknownCategory { purpose: String, category: String },
}

/// Ordered catalog of categories and purposes seeded into each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub data_categories: Vec<DataCategory>,
    pub processing_purposes: Vec<ProcessingPurpose>,
}

impl Catalog {
    /// The platform's standard catalog.
    pub fn standard() -> Self {
        Self {
            data_categories: standard_categories(),
            processing_purposes: standard_purposes(),
        }
    }

    /// Find a category by name.
    pub fn category(&self, name: &str) -> Option<&DataCategory> {
        self.data_categories.iter().find(|c| c.category == name)
    }

    /// Find a purpose by name.
    pub fn purpose(&self, name: &str) -> Option<&ProcessingPurpose> {
        self.processing_purposes.iter().find(|p| p.purpose == name)
    }

    /// Check name uniqueness and purpose-to-category references.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut categories = HashSet::new();
        for category in &self.data_categories {
            if !categories.insert(category.category.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.category.clone()));
            }
        }

        let mut purposes = HashSet::new();
        for purpose in &self.processing_purposes {
            if !purposes.insert(purpose.purpose.as_str()) {
                return Err(CatalogError::DuplicatePurpose(purpose.purpose.clone()));
            }
            if let Some(unknown) = purpose
                .data_categories
                .iter()
                .find(|name| !categories.contains(name.as_str()))
            {
                return Err(CatalogError::UnknownCategory {
                    purpose: purpose.purpose.clone(),
                    category: unknown.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn category(
    name: &str,
    description: &str,
    sensitivity: Sensitivity,
    elements: &[&str],
    collection_method: &str,
    storage_location: &str,
    encrypted: bool,
) -> DataCategory {
    DataCategory {
        category: name.to_string(),
        description: description.to_string(),
        sensitivity: Some(sensitivity),
        data_elements: elements.iter().map(|e| e.to_string()).collect(),
        collection_method: collection_method.to_string(),
        storage_location: storage_location.to_string(),
        encryption_status: encrypted,
    }
}

fn standard_categories() -> Vec<DataCategory> {
    vec![
        category(
            "Personal Identifiers",
            "Basic personal identification information",
            Sensitivity::Medium,
            &["Name", "Email", "Phone", "Address", "Date of Birth"],
            "Registration Form",
            "Primary Database",
            true,
        ),
        category(
            "Health Information",
            "Mental health and therapy-related data",
            Sensitivity::Critical,
            &["Session Notes", "Diagnoses", "Treatment Plans", "Progress Reports"],
            "Therapy Sessions",
            "Secure Health Database",
            true,
        ),
        category(
            "Communication Records",
            "Communication history and preferences",
            Sensitivity::Medium,
            &["Email History", "SMS Records", "Call Logs", "Chat Messages"],
            "System Generated",
            "Communication Database",
            true,
        ),
        category(
            "Technical Data",
            "System and usage data",
            Sensitivity::Low,
            &["IP Address", "Browser Info", "Session Data", "Usage Analytics"],
            "Automatic Collection",
            "Analytics Database",
            false,
        ),
        category(
            "Financial Information",
            "Payment and billing information",
            Sensitivity::High,
            &["Payment Methods", "Transaction History", "Billing Address"],
            "Payment Processing",
            "Payment Gateway",
            true,
        ),
    ]
}

fn standard_purposes() -> Vec<ProcessingPurpose> {
    let purpose = |name: &str, basis: &str, description: &str, categories: &[&str], retention: &str, partners: &[&str]| {
        ProcessingPurpose {
            purpose: name.to_string(),
            legal_basis: basis.to_string(),
            description: description.to_string(),
            data_categories: categories.iter().map(|c| c.to_string()).collect(),
            retention_period: retention.to_string(),
            sharing_partners: partners.iter().map(|p| p.to_string()).collect(),
        }
    };

    vec![
        purpose(
            "Mental Health Treatment",
            "Consent (Section 7, DPDP Act 2023)",
            "Processing personal data for providing mental health therapy services",
            &["Personal Identifiers", "Health Information", "Communication Records"],
            "7 years from last session",
            &["Assigned Therapist", "Healthcare Providers"],
        ),
        purpose(
            "Service Delivery",
            "Legitimate Interest (Section 8, DPDP Act 2023)",
            "Processing data for appointment scheduling and service delivery",
            &["Personal Identifiers", "Communication Records", "Technical Data"],
            "3 years from account closure",
            &["Platform Administrators"],
        ),
        purpose(
            "Legal Compliance",
            "Legal Obligation (Section 9, DPDP Act 2023)",
            "Processing data to comply with healthcare regulations",
            &["Health Information", "Personal Identifiers"],
            "As required by law",
            &["Regulatory Authorities"],
        ),
    ]
}
