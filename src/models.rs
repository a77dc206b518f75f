use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::excel::layout::ParameterColor;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub name: String,
    pub location: String,
    pub opening_date: Option<String>,
    pub legal_entity: String,
    pub concept: String,
    pub space_gross: f64,
    pub space_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub name: String,
    pub sessions_per_month: f64,
    pub price: f64,
    pub price_per_session: f64,
    pub customer_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub plans: Vec<PricingPlan>,
    pub average_price: f64,
    pub personal_training_rate: f64,
    pub clinic_treatment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expenses {
    pub rent: f64,
    pub management: f64,
    pub property_tax: f64,
    pub group_trainers: f64,
    pub personal_trainers: f64,
    pub management_system: f64,
    pub insurance: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u8,
    pub revenue: f64,
    pub expenses: f64,
    pub operating_profit: f64,
    pub customers_start: f64,
    pub customers_end: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    pub month: u8,
    pub customers: f64,
    pub revenue_subscription: f64,
    pub revenue_personal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investments {
    pub equipment: f64,
    pub renovation: f64,
    pub additional: f64,
    pub contingency: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_investment: f64,
    pub break_even_customers: f64,
    pub break_even_months: f64,
    pub roi_years: f64,
    pub year1_profit: f64,
    pub year2_profit: f64,
    pub year3_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantParameter {
    pub name: String,
    pub value: f64,
    pub note: String,
    pub color: ParameterColor,
}

/// Extraction result. A section is `None` when its sheet was not in the
/// workbook; it is then left out of the serialized mapping entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBusinessPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_info: Option<BusinessInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Expenses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year1: Option<YearSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_data: Option<Vec<MonthlyEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year2: Option<YearSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investments: Option<Investments>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Kpis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant_parameters: Option<Vec<SignificantParameter>>,
}

impl ParsedBusinessPlan {
    /// Present sections as `(section name, payload)` pairs, in template order.
    pub fn sections(&self) -> Result<Vec<(&'static str, Value)>, serde_json::Error> {
        let mut sections = Vec::new();
        push_section(&mut sections, "businessInfo", &self.business_info)?;
        push_section(&mut sections, "pricing", &self.pricing)?;
        push_section(&mut sections, "expenses", &self.expenses)?;
        push_section(&mut sections, "year1", &self.year1)?;
        push_section(&mut sections, "monthlyData", &self.monthly_data)?;
        push_section(&mut sections, "year2", &self.year2)?;
        push_section(&mut sections, "investments", &self.investments)?;
        push_section(&mut sections, "kpis", &self.kpis)?;
        push_section(&mut sections, "significantParameters", &self.significant_parameters)?;
        Ok(sections)
    }

    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections()
            .map(|sections| sections.into_iter().map(|(name, _)| name).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn push_section<T: Serialize>(
    sections: &mut Vec<(&'static str, Value)>,
    name: &'static str,
    payload: &Option<T>,
) -> Result<(), serde_json::Error> {
    if let Some(payload) = payload {
        sections.push((name, serde_json::to_value(payload)?));
    }
    Ok(())
}

/// Processing state of an uploaded project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Processing,
    Ready,
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Processing => "processing",
            ProjectStatus::Ready => "ready",
            ProjectStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(ProjectStatus::Processing),
            "ready" => Some(ProjectStatus::Ready),
            "error" => Some(ProjectStatus::Error),
            _ => None,
        }
    }
}
