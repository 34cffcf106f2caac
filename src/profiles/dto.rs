use serde::Deserialize;
use time::Date;

/// Partial update bodies: every field optional, absent means unchanged.
/// Owner, role, timestamps and verification flags are not accepted at all.

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdminProfile {
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub permissions: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployerProfile {
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_logo: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub founded_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicantProfile {
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub experience_years: Option<i32>,
    pub education_level: Option<String>,
    pub skills: Option<serde_json::Value>,
    pub preferred_job_types: Option<serde_json::Value>,
    pub preferred_locations: Option<serde_json::Value>,
    pub salary_expectation: Option<f64>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub is_available_for_work: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_deserialize_as_none() {
        let body: UpdateApplicantProfile =
            serde_json::from_str(r#"{"headline": "Rust engineer"}"#).unwrap();
        assert_eq!(body.headline.as_deref(), Some("Rust engineer"));
        assert!(body.skills.is_none());
        assert!(body.experience_years.is_none());
        assert!(body.is_available_for_work.is_none());
    }

    #[test]
    fn unknown_role_fields_are_ignored_not_applied() {
        // Verification flags are simply not part of the update surface.
        let body: UpdateEmployerProfile =
            serde_json::from_str(r#"{"company_name": "Acme", "is_verified_employer": true}"#)
                .unwrap();
        assert_eq!(body.company_name.as_deref(), Some("Acme"));
    }
}
