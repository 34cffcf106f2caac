use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo::{Role, User};
use crate::profiles::dto::{UpdateAdminProfile, UpdateApplicantProfile, UpdateEmployerProfile};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminProfile {
    pub user_id: Uuid,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub permissions: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployerProfile {
    pub user_id: Uuid,
    pub company_name: String,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_logo: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub founded_year: Option<i32>,
    pub is_verified_employer: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantProfile {
    pub user_id: Uuid,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub experience_years: i32,
    pub education_level: Option<String>,
    pub skills: serde_json::Value,
    pub preferred_job_types: serde_json::Value,
    pub preferred_locations: serde_json::Value,
    pub salary_expectation: Option<f64>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub is_available_for_work: bool,
    pub is_verified_applicant: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Closed union over the three profile variants. The variant always matches
/// the owning identity's role; registration guarantees it.
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Admin(AdminProfile),
    Employer(EmployerProfile),
    Applicant(ApplicantProfile),
}

const ADMIN_COLUMNS: &str =
    "user_id, department, employee_id, permissions, created_at, updated_at";
const EMPLOYER_COLUMNS: &str = "user_id, company_name, company_description, company_website, \
     company_logo, industry, company_size, founded_year, is_verified_employer, \
     created_at, updated_at";
const APPLICANT_COLUMNS: &str = "user_id, date_of_birth, gender, headline, summary, \
     experience_years, education_level, skills, preferred_job_types, preferred_locations, \
     salary_expectation, linkedin_url, github_url, portfolio_url, is_available_for_work, \
     is_verified_applicant, created_at, updated_at";

impl Profile {
    /// Create the profile row matching the new identity's role, inside the
    /// registration transaction. Employer profiles default the company name
    /// to the username.
    pub async fn create_for(
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
    ) -> Result<Profile, sqlx::Error> {
        match user.role {
            Role::Admin => {
                let p = sqlx::query_as::<_, AdminProfile>(&format!(
                    "INSERT INTO admin_profiles (user_id) VALUES ($1) RETURNING {ADMIN_COLUMNS}"
                ))
                .bind(user.id)
                .fetch_one(&mut **tx)
                .await?;
                Ok(Profile::Admin(p))
            }
            Role::Employer => {
                let p = sqlx::query_as::<_, EmployerProfile>(&format!(
                    "INSERT INTO employer_profiles (user_id, company_name) VALUES ($1, $2) \
                     RETURNING {EMPLOYER_COLUMNS}"
                ))
                .bind(user.id)
                .bind(&user.username)
                .fetch_one(&mut **tx)
                .await?;
                Ok(Profile::Employer(p))
            }
            Role::Applicant => {
                let p = sqlx::query_as::<_, ApplicantProfile>(&format!(
                    "INSERT INTO applicant_profiles (user_id) VALUES ($1) \
                     RETURNING {APPLICANT_COLUMNS}"
                ))
                .bind(user.id)
                .fetch_one(&mut **tx)
                .await?;
                Ok(Profile::Applicant(p))
            }
        }
    }
}

impl AdminProfile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<AdminProfile>> {
        let p = sqlx::query_as::<_, AdminProfile>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(p)
    }

    /// Partial merge; absent fields keep their stored value. The unique
    /// index on employee_id can reject this.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        changes: &UpdateAdminProfile,
    ) -> Result<Option<AdminProfile>, sqlx::Error> {
        sqlx::query_as::<_, AdminProfile>(&format!(
            r#"
            UPDATE admin_profiles SET
                department = COALESCE($2, department),
                employee_id = COALESCE($3, employee_id),
                permissions = COALESCE($4, permissions),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.department.as_deref())
        .bind(changes.employee_id.as_deref())
        .bind(changes.permissions.as_ref())
        .fetch_optional(db)
        .await
    }
}

impl EmployerProfile {
    pub async fn find_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<EmployerProfile>> {
        let p = sqlx::query_as::<_, EmployerProfile>(&format!(
            "SELECT {EMPLOYER_COLUMNS} FROM employer_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(p)
    }

    /// Partial merge. `is_verified_employer` is not reachable from here.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        changes: &UpdateEmployerProfile,
    ) -> Result<Option<EmployerProfile>, sqlx::Error> {
        sqlx::query_as::<_, EmployerProfile>(&format!(
            r#"
            UPDATE employer_profiles SET
                company_name = COALESCE($2, company_name),
                company_description = COALESCE($3, company_description),
                company_website = COALESCE($4, company_website),
                company_logo = COALESCE($5, company_logo),
                industry = COALESCE($6, industry),
                company_size = COALESCE($7, company_size),
                founded_year = COALESCE($8, founded_year),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {EMPLOYER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.company_name.as_deref())
        .bind(changes.company_description.as_deref())
        .bind(changes.company_website.as_deref())
        .bind(changes.company_logo.as_deref())
        .bind(changes.industry.as_deref())
        .bind(changes.company_size.as_deref())
        .bind(changes.founded_year)
        .fetch_optional(db)
        .await
    }
}

impl ApplicantProfile {
    pub async fn find_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<ApplicantProfile>> {
        let p = sqlx::query_as::<_, ApplicantProfile>(&format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicant_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(p)
    }

    /// Partial merge. `is_verified_applicant` is not reachable from here.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        changes: &UpdateApplicantProfile,
    ) -> Result<Option<ApplicantProfile>, sqlx::Error> {
        sqlx::query_as::<_, ApplicantProfile>(&format!(
            r#"
            UPDATE applicant_profiles SET
                date_of_birth = COALESCE($2, date_of_birth),
                gender = COALESCE($3, gender),
                headline = COALESCE($4, headline),
                summary = COALESCE($5, summary),
                experience_years = COALESCE($6, experience_years),
                education_level = COALESCE($7, education_level),
                skills = COALESCE($8, skills),
                preferred_job_types = COALESCE($9, preferred_job_types),
                preferred_locations = COALESCE($10, preferred_locations),
                salary_expectation = COALESCE($11, salary_expectation),
                linkedin_url = COALESCE($12, linkedin_url),
                github_url = COALESCE($13, github_url),
                portfolio_url = COALESCE($14, portfolio_url),
                is_available_for_work = COALESCE($15, is_available_for_work),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {APPLICANT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.date_of_birth)
        .bind(changes.gender.as_deref())
        .bind(changes.headline.as_deref())
        .bind(changes.summary.as_deref())
        .bind(changes.experience_years)
        .bind(changes.education_level.as_deref())
        .bind(changes.skills.as_ref())
        .bind(changes.preferred_job_types.as_ref())
        .bind(changes.preferred_locations.as_ref())
        .bind(changes.salary_expectation)
        .bind(changes.linkedin_url.as_deref())
        .bind(changes.github_url.as_deref())
        .bind(changes.portfolio_url.as_deref())
        .bind(changes.is_available_for_work)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_union_serializes_with_role_tag() {
        let now = OffsetDateTime::now_utc();
        let profile = Profile::Employer(EmployerProfile {
            user_id: Uuid::new_v4(),
            company_name: "a1".into(),
            company_description: None,
            company_website: None,
            company_logo: None,
            industry: None,
            company_size: None,
            founded_year: None,
            is_verified_employer: false,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "employer");
        assert_eq!(json["company_name"], "a1");
    }

    #[test]
    fn admin_variant_tags_as_admin() {
        let now = OffsetDateTime::now_utc();
        let profile = Profile::Admin(AdminProfile {
            user_id: Uuid::new_v4(),
            department: Some("ops".into()),
            employee_id: None,
            permissions: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["department"], "ops");
    }
}
