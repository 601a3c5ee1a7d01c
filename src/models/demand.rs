use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use super::{Actor, Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};
use crate::policy::{self, CATEGORY_FIELD, Owned, PAYMENT_METHOD_FIELD, STATUS_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DemandKind {
    Rental,
    Purchase,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandStatus {
    #[default]
    PendingReview,
    Reviewing,
    Approved,
    InProgress,
    Completed,
    Closed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandCategory {
    #[default]
    Potential,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentalDetails {
    #[serde(default)]
    pub gpu_model_id: Option<String>,
    #[serde(default)]
    pub server_count: Option<i64>,
    #[serde(default)]
    pub include_networking: bool,
    #[serde(default)]
    pub storage_requirement: Option<String>,
    #[serde(default)]
    pub computing_requirement: Option<String>,
    #[serde(default)]
    pub networking_requirement: Option<String>,
    #[serde(default)]
    pub platform_requirement: Option<String>,
    #[serde(default)]
    pub rental_period: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetails {
    #[serde(default)]
    pub gpu_model_id: Option<String>,
    #[serde(default)]
    pub server_count: Option<i64>,
    #[serde(default)]
    pub purchase_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_scope: Option<String>,
    #[serde(default)]
    pub technical_requirement: Option<String>,
    #[serde(default)]
    pub project_duration: Option<String>,
    #[serde(default)]
    pub service_price: Option<String>,
    #[serde(default)]
    pub server_count: Option<i64>,
}

/// Kind-specific part of a demand. Stored as JSON next to a `kind` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandDetails {
    Rental(RentalDetails),
    Purchase(PurchaseDetails),
    Project(ProjectDetails),
}

impl DemandDetails {
    pub fn kind(&self) -> DemandKind {
        match self {
            DemandDetails::Rental(_) => DemandKind::Rental,
            DemandDetails::Purchase(_) => DemandKind::Purchase,
            DemandDetails::Project(_) => DemandKind::Project,
        }
    }

    pub fn gpu_model_id(&self) -> Option<&str> {
        match self {
            DemandDetails::Rental(d) => d.gpu_model_id.as_deref(),
            DemandDetails::Purchase(d) => d.gpu_model_id.as_deref(),
            DemandDetails::Project(_) => None,
        }
    }
}

/// A rental, purchase or project demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    pub id: String,
    pub title: String,
    pub customer_id: Option<String>,
    pub category: DemandCategory,
    pub status: DemandStatus,
    pub priority: Priority,
    pub description: Option<String>,
    pub source: Option<String>,
    pub budget: Option<String>,
    pub cost: Option<String>,
    pub creator_id: String,
    pub team_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
    pub details: DemandDetails,
}

impl Owned for Demand {
    fn creator_id(&self) -> &str {
        &self.creator_id
    }

    fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Demand {
    pub fn kind(&self) -> DemandKind {
        self.details.kind()
    }

    /// Search by title or by the resolved customer name.
    pub fn matches(&self, needle: &str, customer_name: Option<&str>) -> bool {
        self.title.to_lowercase().contains(needle)
            || customer_name.is_some_and(|name| name.to_lowercase().contains(needle))
    }
}

/// A demand as returned to one actor: restricted fields removed and
/// references resolved to display names.
#[derive(Debug, Clone, Serialize)]
pub struct DemandView {
    pub id: String,
    pub title: String,
    pub customer_id: Option<String>,
    /// None when the referenced customer is missing or deleted
    pub customer_name: Option<String>,
    pub gpu_model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DemandCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DemandStatus>,
    pub priority: Priority,
    pub description: Option<String>,
    pub source: Option<String>,
    pub budget: Option<String>,
    pub cost: Option<String>,
    pub creator_id: String,
    pub team_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(flatten)]
    pub details: DemandDetails,
}

impl DemandView {
    pub fn for_actor(
        actor: &Actor,
        demand: Demand,
        customer_name: Option<String>,
        gpu_model_name: Option<String>,
    ) -> Self {
        let show_category = policy::can_see_field(actor, "demand_categories", CATEGORY_FIELD);
        let show_status = policy::can_see_field(actor, "demand_status", STATUS_FIELD);
        let show_payment = policy::can_see_field(actor, "payment_methods", PAYMENT_METHOD_FIELD);

        let mut details = demand.details;
        if !show_payment && let DemandDetails::Rental(ref mut rental) = details {
            rental.payment_method = None;
        }

        Self {
            id: demand.id,
            title: demand.title,
            customer_id: demand.customer_id,
            customer_name,
            gpu_model_name,
            category: show_category.then_some(demand.category),
            status: show_status.then_some(demand.status),
            priority: demand.priority,
            description: demand.description,
            source: demand.source,
            budget: demand.budget,
            cost: demand.cost,
            creator_id: demand.creator_id,
            team_id: demand.team_id,
            created_at: demand.created_at,
            updated_at: demand.updated_at,
            details,
        }
    }
}

/// Create body. The `kind` tag comes from the request path.
#[derive(Debug, Deserialize)]
pub struct CreateDemand {
    pub title: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub category: Option<DemandCategory>,
    #[serde(default)]
    pub status: Option<DemandStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(flatten)]
    pub details: DemandDetails,
}

impl CreateDemand {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.title).is_none() {
            return Err(AppError::BadRequest(msg::TITLE_EMPTY.into()));
        }
        validate_server_count(server_count(&self.details))
    }

    /// Reject explicitly supplied values the actor may not set. Omitted
    /// values fall back to defaults and need no permission.
    pub fn check_editable(&self, actor: &Actor) -> Result<()> {
        check_restricted(actor, self.category.is_some(), self.status.is_some())
    }
}

/// Patch body shared by all three kinds. Kind-specific fields that do not
/// belong to the stored demand's kind are rejected.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDemand {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub customer_id: Option<Option<String>>,
    pub category: Option<DemandCategory>,
    pub status: Option<DemandStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub source: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub budget: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub cost: Option<Option<String>>,
    #[serde(flatten)]
    pub details: DetailsPatch,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsPatch {
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub gpu_model_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub server_count: Option<Option<i64>>,
    pub include_networking: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub storage_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub computing_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub networking_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub platform_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub rental_period: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub delivery_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub payment_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub purchase_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub project_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub project_scope: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub technical_requirement: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub project_duration: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub service_price: Option<Option<String>>,
}

fn patch<T>(target: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn foreign_field(kind: DemandKind, field: &str) -> AppError {
    AppError::BadRequest(format!("field '{}' does not apply to {} demands", field, kind.as_ref()))
}

impl DetailsPatch {
    fn is_empty(&self) -> bool {
        self.gpu_model_id.is_none()
            && self.server_count.is_none()
            && self.include_networking.is_none()
            && self.storage_requirement.is_none()
            && self.computing_requirement.is_none()
            && self.networking_requirement.is_none()
            && self.platform_requirement.is_none()
            && self.rental_period.is_none()
            && self.delivery_date.is_none()
            && self.payment_method.is_none()
            && self.purchase_date.is_none()
            && self.project_name.is_none()
            && self.project_scope.is_none()
            && self.technical_requirement.is_none()
            && self.project_duration.is_none()
            && self.service_price.is_none()
    }

    /// First supplied field that only exists on other kinds.
    fn foreign_fields(&self, kind: DemandKind) -> Option<&'static str> {
        let rental_only = [
            ("include_networking", self.include_networking.is_some()),
            ("storage_requirement", self.storage_requirement.is_some()),
            ("computing_requirement", self.computing_requirement.is_some()),
            ("networking_requirement", self.networking_requirement.is_some()),
            ("platform_requirement", self.platform_requirement.is_some()),
            ("rental_period", self.rental_period.is_some()),
            ("delivery_date", self.delivery_date.is_some()),
            ("payment_method", self.payment_method.is_some()),
        ];
        let purchase_only = [("purchase_date", self.purchase_date.is_some())];
        let project_only = [
            ("project_name", self.project_name.is_some()),
            ("project_scope", self.project_scope.is_some()),
            ("technical_requirement", self.technical_requirement.is_some()),
            ("project_duration", self.project_duration.is_some()),
            ("service_price", self.service_price.is_some()),
        ];
        let gpu = [("gpu_model_id", self.gpu_model_id.is_some())];

        let foreign: Vec<(&'static str, bool)> = match kind {
            DemandKind::Rental => purchase_only.into_iter().chain(project_only).collect(),
            DemandKind::Purchase => rental_only.into_iter().chain(project_only).collect(),
            DemandKind::Project => rental_only.into_iter().chain(purchase_only).chain(gpu).collect(),
        };
        foreign.into_iter().find(|(_, set)| *set).map(|(name, _)| name)
    }

    /// Apply onto stored details of the same kind.
    pub fn apply(&self, details: &mut DemandDetails) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if let Some(field) = self.foreign_fields(details.kind()) {
            return Err(foreign_field(details.kind(), field));
        }
        validate_server_count(self.server_count.flatten())?;

        match details {
            DemandDetails::Rental(d) => {
                patch(&mut d.gpu_model_id, self.gpu_model_id.clone());
                patch(&mut d.server_count, self.server_count.clone());
                if let Some(include) = self.include_networking {
                    d.include_networking = include;
                }
                patch(&mut d.storage_requirement, self.storage_requirement.clone());
                patch(&mut d.computing_requirement, self.computing_requirement.clone());
                patch(&mut d.networking_requirement, self.networking_requirement.clone());
                patch(&mut d.platform_requirement, self.platform_requirement.clone());
                patch(&mut d.rental_period, self.rental_period.clone());
                patch(&mut d.delivery_date, self.delivery_date.clone());
                patch(&mut d.payment_method, self.payment_method.clone());
            }
            DemandDetails::Purchase(d) => {
                patch(&mut d.gpu_model_id, self.gpu_model_id.clone());
                patch(&mut d.server_count, self.server_count.clone());
                patch(&mut d.purchase_date, self.purchase_date.clone());
            }
            DemandDetails::Project(d) => {
                patch(&mut d.project_name, self.project_name.clone());
                patch(&mut d.project_scope, self.project_scope.clone());
                patch(&mut d.technical_requirement, self.technical_requirement.clone());
                patch(&mut d.project_duration, self.project_duration.clone());
                patch(&mut d.service_price, self.service_price.clone());
                patch(&mut d.server_count, self.server_count.clone());
            }
        }
        Ok(())
    }
}

impl UpdateDemand {
    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|t| non_blank(t).is_none()) {
            return Err(AppError::BadRequest(msg::TITLE_EMPTY.into()));
        }
        Ok(())
    }

    pub fn check_editable(&self, actor: &Actor) -> Result<()> {
        check_restricted(actor, self.category.is_some(), self.status.is_some())
    }
}

fn check_restricted(actor: &Actor, sets_category: bool, sets_status: bool) -> Result<()> {
    if sets_category && !policy::can_edit_field(actor, CATEGORY_FIELD) {
        return Err(AppError::Forbidden(msg::CATEGORY_EDIT_FORBIDDEN.into()));
    }
    if sets_status && !policy::can_edit_field(actor, STATUS_FIELD) {
        return Err(AppError::Forbidden(msg::STATUS_EDIT_FORBIDDEN.into()));
    }
    Ok(())
}

fn server_count(details: &DemandDetails) -> Option<i64> {
    match details {
        DemandDetails::Rental(d) => d.server_count,
        DemandDetails::Purchase(d) => d.server_count,
        DemandDetails::Project(d) => d.server_count,
    }
}

fn validate_server_count(count: Option<i64>) -> Result<()> {
    if count.is_some_and(|c| c < 0) {
        return Err(AppError::BadRequest("server_count must not be negative".into()));
    }
    Ok(())
}
