use super::layout::{
    self, NumberField, ParameterNote, ParameterValue, Precision, TextDefault, TextField,
};
use super::types::{Sheet, Workbook};
use super::utils::{get_cell, round_to, to_decimal, to_integer, to_text};
use crate::models::{
    BusinessInfo, Expenses, Investments, Kpis, MonthlyEntry, ParsedBusinessPlan, Pricing,
    PricingPlan, SignificantParameter, YearSummary,
};

/// How `pricePerSession` is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PricePerSessionRounding {
    #[default]
    Integer,
    OneDecimal,
}

impl PricePerSessionRounding {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "integer" => Some(Self::Integer),
            "one-decimal" => Some(Self::OneDecimal),
            _ => None,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Integer => value.round(),
            Self::OneDecimal => round_to(value, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub price_per_session: PricePerSessionRounding,
}

/// Reads a business plan out of the fixed cells of the template workbook.
///
/// Extraction never fails: a missing sheet drops its sections, a missing or
/// unparseable cell falls back to the field default.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookExtractor {
    options: ExtractorOptions,
}

impl WorkbookExtractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    pub fn extract(&self, workbook: &Workbook) -> ParsedBusinessPlan {
        let mut plan = ParsedBusinessPlan::default();

        if let Some(sheet) = lookup(workbook, layout::MODEL_SHEET) {
            plan.business_info = Some(extract_business_info(sheet));
            plan.pricing = Some(self.extract_pricing(sheet));
            plan.expenses = Some(extract_expenses(sheet));
        }

        if let Some(sheet) = lookup(workbook, layout::YEAR1_SHEET) {
            plan.year1 = Some(extract_year(sheet, 1));
            plan.monthly_data = Some(extract_monthly_data(sheet));
        }

        if let Some(sheet) = lookup(workbook, layout::YEAR2_SHEET) {
            plan.year2 = Some(extract_year(sheet, 2));
        }

        if let Some(sheet) = lookup(workbook, layout::INVESTMENTS_SHEET) {
            plan.investments = Some(extract_investments(sheet));
        }

        if let Some(sheet) = lookup(workbook, layout::KPI_SHEET) {
            plan.kpis = Some(extract_kpis(sheet));
            plan.significant_parameters = Some(extract_significant_parameters(sheet));
        }

        if plan.is_empty() {
            tracing::warn!("No template sheets found in workbook");
        } else {
            tracing::info!("Extracted sections: {:?}", plan.section_names());
        }
        plan
    }

    fn extract_pricing(&self, sheet: &Sheet) -> Pricing {
        let p = &layout::PRICING;
        let mut plans = Vec::new();

        for &row in p.plan_rows.iter() {
            let name = to_text(get_cell(sheet, row, p.name_col));
            let price = to_integer(get_cell(sheet, row, p.price_col)).filter(|price| *price != 0.0);

            let (Some(name), Some(price)) = (name, price) else {
                tracing::debug!("Skipping pricing row {}: missing name or price", row);
                continue;
            };

            let sessions = to_integer(get_cell(sheet, row, p.sessions_col)).unwrap_or(0.0);
            let percentage =
                to_decimal(get_cell(sheet, row, p.percentage_col), p.percentage_decimals).unwrap_or(0.0);

            plans.push(PricingPlan {
                name,
                sessions_per_month: sessions,
                price,
                price_per_session: self.price_per_session(price, sessions),
                customer_percentage: percentage,
            });
        }

        Pricing {
            plans,
            average_price: number(sheet, &p.average_price),
            personal_training_rate: number(sheet, &p.personal_training_rate),
            clinic_treatment_rate: number(sheet, &p.clinic_treatment_rate),
        }
    }

    pub fn price_per_session(&self, price: f64, sessions: f64) -> f64 {
        if sessions > 0.0 {
            self.options.price_per_session.apply(price / sessions)
        } else {
            0.0
        }
    }
}

fn lookup<'a>(workbook: &'a Workbook, name: &str) -> Option<&'a Sheet> {
    let sheet = workbook.sheet(name);
    if sheet.is_none() {
        tracing::debug!("Sheet {} not present, skipping its sections", name);
    }
    sheet
}

fn number(sheet: &Sheet, field: &NumberField) -> f64 {
    let cell = get_cell(sheet, field.cell.row, field.cell.col);
    let value = match field.precision {
        Precision::Integer => to_integer(cell),
        Precision::Decimals(decimals) => to_decimal(cell, decimals),
    };
    value.unwrap_or(field.default)
}

fn text(sheet: &Sheet, field: &TextField) -> Option<String> {
    let value = to_text(get_cell(sheet, field.cell.row, field.cell.col));
    match field.default {
        TextDefault::Empty => Some(value.unwrap_or_default()),
        TextDefault::Null => value,
    }
}

fn required_text(sheet: &Sheet, field: &TextField) -> String {
    text(sheet, field).unwrap_or_default()
}

fn extract_business_info(sheet: &Sheet) -> BusinessInfo {
    let b = &layout::BUSINESS_INFO;
    BusinessInfo {
        name: required_text(sheet, &b.name),
        location: required_text(sheet, &b.location),
        opening_date: text(sheet, &b.opening_date),
        legal_entity: required_text(sheet, &b.legal_entity),
        concept: required_text(sheet, &b.concept),
        space_gross: number(sheet, &b.space_gross),
        space_net: number(sheet, &b.space_net),
    }
}

fn extract_expenses(sheet: &Sheet) -> Expenses {
    let e = &layout::EXPENSES;
    let components = [
        number(sheet, &e.rent),
        number(sheet, &e.management),
        number(sheet, &e.property_tax),
        number(sheet, &e.group_trainers),
        number(sheet, &e.personal_trainers),
        number(sheet, &e.management_system),
        number(sheet, &e.insurance),
    ];
    let [rent, management, property_tax, group_trainers, personal_trainers, management_system, insurance] =
        components;

    Expenses {
        rent,
        management,
        property_tax,
        group_trainers,
        personal_trainers,
        management_system,
        insurance,
        total: components.iter().sum(),
    }
}

fn extract_year(sheet: &Sheet, year: u8) -> YearSummary {
    let y = &layout::YEAR;
    YearSummary {
        year,
        revenue: number(sheet, &y.revenue),
        expenses: number(sheet, &y.expenses),
        operating_profit: number(sheet, &y.operating_profit),
        customers_start: number(sheet, &y.customers_start),
        customers_end: number(sheet, &y.customers_end),
        closing_balance: number(sheet, &y.closing_balance),
    }
}

fn extract_monthly_data(sheet: &Sheet) -> Vec<MonthlyEntry> {
    let m = &layout::MONTHLY;
    let read = |row: usize, col: usize| to_integer(get_cell(sheet, row, col)).unwrap_or(0.0);

    (0..m.months)
        .map(|index| {
            let col = m.column(index);
            MonthlyEntry {
                month: (index + 1) as u8,
                customers: read(m.customers_row, col),
                revenue_subscription: read(m.revenue_subscription_row, col),
                revenue_personal: read(m.revenue_personal_row, col),
            }
        })
        .collect()
}

fn extract_investments(sheet: &Sheet) -> Investments {
    let i = &layout::INVESTMENTS;
    let equipment = number(sheet, &i.equipment);
    let renovation = number(sheet, &i.renovation);
    let additional = number(sheet, &i.additional);
    let contingency = number(sheet, &i.contingency);

    Investments {
        equipment,
        renovation,
        additional,
        contingency,
        total: equipment + renovation + additional + contingency,
    }
}

fn extract_kpis(sheet: &Sheet) -> Kpis {
    let k = &layout::KPIS;
    Kpis {
        total_investment: number(sheet, &k.total_investment),
        break_even_customers: number(sheet, &k.break_even_customers),
        break_even_months: number(sheet, &k.break_even_months),
        roi_years: number(sheet, &k.roi_years),
        year1_profit: number(sheet, &k.year1_profit),
        year2_profit: number(sheet, &k.year2_profit),
        year3_profit: number(sheet, &k.year3_profit),
    }
}

pub fn year3_monthly_profit(year3_profit: f64) -> f64 {
    if year3_profit > 0.0 {
        (year3_profit / 12.0).round()
    } else {
        0.0
    }
}

fn extract_significant_parameters(sheet: &Sheet) -> Vec<SignificantParameter> {
    let monthly_profit = year3_monthly_profit(number(sheet, &layout::KPIS.year3_profit));

    layout::SIGNIFICANT_PARAMETERS
        .iter()
        .map(|spec| {
            let value = match spec.value {
                ParameterValue::Cell(field) => number(sheet, &field),
                ParameterValue::Year3MonthlyProfit => monthly_profit,
            };
            let note = match spec.note {
                ParameterNote::Cell(cell) => to_text(get_cell(sheet, cell.row, cell.col)).unwrap_or_default(),
                ParameterNote::Fixed(note) => note.to_string(),
            };
            SignificantParameter {
                name: spec.name.to_string(),
                value,
                note,
                color: spec.color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::layout::{
        INVESTMENTS_SHEET, KPI_SHEET, MODEL_SHEET, YEAR1_SHEET, YEAR2_SHEET,
    };
    use crate::services::excel::types::RawCell;

    fn model_sheet() -> Sheet {
        Sheet::default()
            .with(6, 4, "Studio Balance")
            .with(7, 4, "Tel Aviv")
            .with(8, 4, RawCell::DateText("2025-01-01".into()))
            .with(10, 4, "Ltd")
            .with(12, 3, "Boutique pilates")
            .with(6, 18, "120 מ\"ר")
            .with(7, 18, 95.4)
            // pricing rows
            .with(22, 1, "Monthly 2x")
            .with(22, 4, 9.0)
            .with(22, 5, "₪624")
            .with(22, 7, 0.456)
            .with(23, 1, "No price")
            .with(23, 5, 0.0)
            .with(24, 5, 624.0)
            .with(25, 1, "Unlimited")
            .with(25, 5, 900.0)
            .with(26, 5, 712.34)
            .with(42, 5, 250.0)
            .with(49, 5, "300")
            // expenses, management system left blank
            .with(55, 6, 12000.0)
            .with(56, 6, 1500.0)
            .with(57, 6, 800.0)
            .with(58, 6, 6000.0)
            .with(59, 6, 4000.0)
            .with(62, 6, "abc")
    }

    fn kpi_sheet() -> Sheet {
        Sheet::default()
            .with(1, 2, 450000.0)
            .with(1, 7, 40.0)
            .with(1, 8, "לקוחות")
            .with(2, 7, "7.25%")
            .with(3, 2, 85.0)
            .with(5, 2, 14.0)
            .with(6, 2, -20000.0)
            .with(7, 2, 90000.0)
            .with(8, 2, 250000.0)
            .with(9, 2, 3.456)
            .with(13, 2, 500000.0)
    }

    fn extractor() -> WorkbookExtractor {
        WorkbookExtractor::default()
    }

    #[test]
    fn test_empty_workbook_yields_no_sections() {
        let workbook = Workbook::new().with_sheet("Sheet1", Sheet::default().with(0, 0, 1.0));
        let plan = extractor().extract(&workbook);

        assert!(plan.is_empty());
        assert!(plan.section_names().is_empty());
        assert_eq!(serde_json::to_value(&plan).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_kpi_sheet_only_yields_kpis_and_parameters() {
        let workbook = Workbook::new().with_sheet(KPI_SHEET, kpi_sheet());
        let plan = extractor().extract(&workbook);

        assert_eq!(plan.section_names(), vec!["kpis", "significantParameters"]);
        let json = serde_json::to_value(&plan).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_business_info_and_defaults() {
        let workbook = Workbook::new().with_sheet(MODEL_SHEET, model_sheet());
        let info = extractor().extract(&workbook).business_info.unwrap();

        assert_eq!(info.name, "Studio Balance");
        assert_eq!(info.opening_date.as_deref(), Some("2025-01-01"));
        assert_eq!(info.concept, "Boutique pilates");
        assert_eq!(info.space_gross, 120.0);
        assert_eq!(info.space_net, 95.0);

        let blank = Workbook::new().with_sheet(MODEL_SHEET, Sheet::default());
        let info = extractor().extract(&blank).business_info.unwrap();
        assert_eq!(info.name, "");
        assert_eq!(info.opening_date, None);
        assert_eq!(info.space_gross, 0.0);
    }

    #[test]
    fn test_pricing_filters_rows_without_name_or_price() {
        let workbook = Workbook::new().with_sheet(MODEL_SHEET, model_sheet());
        let pricing = extractor().extract(&workbook).pricing.unwrap();

        let names: Vec<&str> = pricing.plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Monthly 2x", "Unlimited"]);

        let first = &pricing.plans[0];
        assert_eq!(first.price, 624.0);
        assert_eq!(first.sessions_per_month, 9.0);
        assert_eq!(first.price_per_session, 69.0);
        assert_eq!(first.customer_percentage, 0.5);

        let unlimited = &pricing.plans[1];
        assert_eq!(unlimited.sessions_per_month, 0.0);
        assert_eq!(unlimited.price_per_session, 0.0);

        assert_eq!(pricing.average_price, 712.3);
        assert_eq!(pricing.personal_training_rate, 250.0);
        assert_eq!(pricing.clinic_treatment_rate, 300.0);
    }

    #[test]
    fn test_pricing_excludes_named_rows_with_absent_price() {
        let sheet = Sheet::default()
            .with(22, 1, "Trial")
            .with(23, 1, "Drop-in")
            .with(23, 4, 1.0)
            .with(24, 1, "Package")
            .with(24, 5, "n/a")
            .with(25, 1, "Annual")
            .with(25, 5, 5400.0);
        let workbook = Workbook::new().with_sheet(MODEL_SHEET, sheet);
        let pricing = extractor().extract(&workbook).pricing.unwrap();

        let names: Vec<&str> = pricing.plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Annual"]);
    }

    #[test]
    fn test_price_per_session_rounding_modes() {
        assert_eq!(extractor().price_per_session(624.0, 9.0), 69.0);

        let one_decimal = WorkbookExtractor::new(ExtractorOptions {
            price_per_session: PricePerSessionRounding::OneDecimal,
        });
        assert_eq!(one_decimal.price_per_session(624.0, 9.0), 69.3);
        assert_eq!(one_decimal.price_per_session(624.0, 0.0), 0.0);
        assert_eq!(PricePerSessionRounding::parse("One-Decimal"), Some(PricePerSessionRounding::OneDecimal));
        assert_eq!(PricePerSessionRounding::parse("halves"), None);
    }

    #[test]
    fn test_expense_total_sums_defaulted_fields() {
        let workbook = Workbook::new().with_sheet(MODEL_SHEET, model_sheet());
        let expenses = extractor().extract(&workbook).expenses.unwrap();

        assert_eq!(expenses.management_system, 0.0);
        assert_eq!(expenses.insurance, 0.0);
        let sum = expenses.rent
            + expenses.management
            + expenses.property_tax
            + expenses.group_trainers
            + expenses.personal_trainers
            + expenses.management_system
            + expenses.insurance;
        assert_eq!(expenses.total, sum);
        assert_eq!(expenses.total, 24300.0);
    }

    #[test]
    fn test_monthly_data_always_has_twelve_months() {
        let sheet = Sheet::default()
            .with(5, 4, 20.0)
            .with(10, 4, 9000.0)
            .with(9, 4, 1200.0)
            .with(5, 6, 31.0);
        let workbook = Workbook::new().with_sheet(YEAR1_SHEET, sheet);
        let plan = extractor().extract(&workbook);

        let months = plan.monthly_data.unwrap();
        assert_eq!(months.len(), 12);
        assert_eq!(months.iter().map(|m| m.month).collect::<Vec<_>>(), (1..=12).collect::<Vec<u8>>());
        assert_eq!(months[0].customers, 20.0);
        assert_eq!(months[0].revenue_subscription, 9000.0);
        assert_eq!(months[0].revenue_personal, 1200.0);
        assert_eq!(months[1].customers, 31.0);
        for month in &months[2..] {
            assert_eq!((month.customers, month.revenue_subscription, month.revenue_personal), (0.0, 0.0, 0.0));
        }

        let year1 = plan.year1.unwrap();
        assert_eq!(year1.year, 1);
        assert_eq!(year1.customers_start, 20.0);
        assert!(plan.year2.is_none());
    }

    #[test]
    fn test_year_two_and_investments() {
        let year2 = Sheet::default().with(12, 29, "₪1,250,000").with(39, 29, -3000.4);
        let invest = Sheet::default()
            .with(18, 17, 150000.0)
            .with(13, 17, 220000.0)
            .with(42, 17, "10,000");
        let workbook = Workbook::new()
            .with_sheet(YEAR2_SHEET, year2)
            .with_sheet(INVESTMENTS_SHEET, invest);
        let plan = extractor().extract(&workbook);
        assert_eq!(plan.section_names(), vec!["year2", "investments"]);

        let year2 = plan.year2.as_ref().unwrap();
        assert_eq!(year2.year, 2);
        assert_eq!(year2.revenue, 1250000.0);
        assert_eq!(year2.operating_profit, -3000.0);
        assert_eq!(year2.closing_balance, 0.0);

        let investments = plan.investments.as_ref().unwrap();
        assert_eq!(investments.additional, 0.0);
        assert_eq!(investments.total, 380000.0);
    }

    #[test]
    fn test_kpis_and_significant_parameters() {
        let workbook = Workbook::new().with_sheet(KPI_SHEET, kpi_sheet());
        let plan = extractor().extract(&workbook);

        let kpis = plan.kpis.unwrap();
        assert_eq!(kpis.total_investment, 450000.0);
        assert_eq!(kpis.year1_profit, -20000.0);
        assert_eq!(kpis.roi_years, 3.46);

        let params = plan.significant_parameters.unwrap();
        assert_eq!(params.len(), 8);
        assert_eq!(params[0].value, 40.0);
        assert_eq!(params[0].note, "לקוחות");
        assert_eq!(params[1].value, 7.3);
        assert_eq!(params[1].note, "");
        assert_eq!(params[4].value, 500000.0);
        assert_eq!(params[6].value, 20833.0);
        assert_eq!(params[7].value, 3.46);
        assert_eq!(params[7].note, "שנים");

        let json = serde_json::to_value(&params[0]).unwrap();
        assert_eq!(json["color"], "gray");
    }

    #[test]
    fn test_year3_monthly_profit_is_zero_for_losses() {
        assert_eq!(year3_monthly_profit(250000.0), 20833.0);
        assert_eq!(year3_monthly_profit(0.0), 0.0);
        assert_eq!(year3_monthly_profit(-12000.0), 0.0);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let workbook = Workbook::new()
            .with_sheet(MODEL_SHEET, model_sheet())
            .with_sheet(KPI_SHEET, kpi_sheet());
        let extractor = extractor();

        let first = extractor.extract(&workbook);
        let second = extractor.extract(&workbook);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_serialized_sections_follow_template_order() {
        let workbook = Workbook::new()
            .with_sheet(YEAR2_SHEET, Sheet::default())
            .with_sheet(YEAR1_SHEET, Sheet::default())
            .with_sheet(KPI_SHEET, kpi_sheet());
        let json = serde_json::to_string(&extractor().extract(&workbook)).unwrap();

        let position = |key: &str| json.find(&format!("\"{}\":", key)).unwrap();
        assert!(position("year1") < position("monthlyData"));
        assert!(position("monthlyData") < position("year2"));
        assert!(position("year2") < position("kpis"));
    }

    #[test]
    fn test_serialized_field_names() {
        let workbook = Workbook::new().with_sheet(MODEL_SHEET, model_sheet());
        let json = serde_json::to_value(extractor().extract(&workbook)).unwrap();

        assert_eq!(json["businessInfo"]["openingDate"], "2025-01-01");
        assert_eq!(json["pricing"]["plans"][0]["pricePerSession"], 69.0);
        assert_eq!(json["pricing"]["personalTrainingRate"], 250.0);
        assert_eq!(json["expenses"]["propertyTax"], 800.0);
    }
}
