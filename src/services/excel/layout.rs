//! Cell coordinates of the business-plan template.
//!
//! Every field the extractor reads is declared here and nowhere else. The
//! sheet names and coordinates are the de facto file format of the template
//! workbooks and must not drift.

use serde::Serialize;

use super::types::CellRef;

pub const MODEL_SHEET: &str = "ניתוח מודל עסקי ופוטנציאל";
pub const YEAR1_SHEET: &str = "תכנון שנה ראשונה";
pub const YEAR2_SHEET: &str = "צפי שנה שניה";
pub const INVESTMENTS_SHEET: &str = "השקעות";
pub const KPI_SHEET: &str = "מדדי ביצועים";

/// Output section names, in template order.
pub const SECTION_NAMES: [&str; 9] = [
    "businessInfo",
    "pricing",
    "expenses",
    "year1",
    "monthlyData",
    "year2",
    "investments",
    "kpis",
    "significantParameters",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Integer,
    Decimals(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberField {
    pub cell: CellRef,
    pub precision: Precision,
    pub default: f64,
}

const fn int(row: usize, col: usize) -> NumberField {
    NumberField {
        cell: CellRef::new(row, col),
        precision: Precision::Integer,
        default: 0.0,
    }
}

const fn dec(row: usize, col: usize, decimals: u32) -> NumberField {
    NumberField {
        cell: CellRef::new(row, col),
        precision: Precision::Decimals(decimals),
        default: 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDefault {
    Empty,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextField {
    pub cell: CellRef,
    pub default: TextDefault,
}

const fn text(row: usize, col: usize) -> TextField {
    TextField {
        cell: CellRef::new(row, col),
        default: TextDefault::Empty,
    }
}

pub struct BusinessInfoLayout {
    pub name: TextField,
    pub location: TextField,
    pub opening_date: TextField,
    pub legal_entity: TextField,
    pub concept: TextField,
    pub space_gross: NumberField,
    pub space_net: NumberField,
}

pub const BUSINESS_INFO: BusinessInfoLayout = BusinessInfoLayout {
    name: text(6, 4),
    location: text(7, 4),
    opening_date: TextField {
        cell: CellRef::new(8, 4),
        default: TextDefault::Null,
    },
    legal_entity: text(10, 4),
    concept: text(12, 3),
    space_gross: int(6, 18),
    space_net: int(7, 18),
};

pub struct PricingLayout {
    /// Candidate plan rows, in output order.
    pub plan_rows: [usize; 4],
    pub name_col: usize,
    pub sessions_col: usize,
    pub price_col: usize,
    pub percentage_col: usize,
    pub percentage_decimals: u32,
    pub average_price: NumberField,
    pub personal_training_rate: NumberField,
    pub clinic_treatment_rate: NumberField,
}

pub const PRICING: PricingLayout = PricingLayout {
    plan_rows: [22, 23, 24, 25],
    name_col: 1,
    sessions_col: 4,
    price_col: 5,
    percentage_col: 7,
    percentage_decimals: 1,
    average_price: dec(26, 5, 1),
    personal_training_rate: int(42, 5),
    clinic_treatment_rate: int(49, 5),
};

pub struct ExpensesLayout {
    pub rent: NumberField,
    pub management: NumberField,
    pub property_tax: NumberField,
    pub group_trainers: NumberField,
    pub personal_trainers: NumberField,
    pub management_system: NumberField,
    pub insurance: NumberField,
}

pub const EXPENSES: ExpensesLayout = ExpensesLayout {
    rent: int(55, 6),
    management: int(56, 6),
    property_tax: int(57, 6),
    group_trainers: int(58, 6),
    personal_trainers: int(59, 6),
    management_system: int(61, 6),
    insurance: int(62, 6),
};

/// Shared by the first-year and second-year sheets.
pub struct YearLayout {
    pub revenue: NumberField,
    pub expenses: NumberField,
    pub operating_profit: NumberField,
    pub customers_start: NumberField,
    pub customers_end: NumberField,
    pub closing_balance: NumberField,
}

pub const YEAR: YearLayout = YearLayout {
    revenue: int(12, 29),
    expenses: int(38, 29),
    operating_profit: int(39, 29),
    customers_start: int(5, 4),
    customers_end: int(5, 26),
    closing_balance: int(62, 26),
};

pub struct MonthlyLayout {
    pub months: usize,
    pub first_col: usize,
    /// Months sit on every other column.
    pub col_stride: usize,
    pub customers_row: usize,
    pub revenue_subscription_row: usize,
    pub revenue_personal_row: usize,
}

pub const MONTHLY: MonthlyLayout = MonthlyLayout {
    months: 12,
    first_col: 4,
    col_stride: 2,
    customers_row: 5,
    revenue_subscription_row: 10,
    revenue_personal_row: 9,
};

impl MonthlyLayout {
    pub fn column(&self, month_index: usize) -> usize {
        self.first_col + month_index * self.col_stride
    }
}

pub struct InvestmentsLayout {
    pub equipment: NumberField,
    pub renovation: NumberField,
    pub additional: NumberField,
    pub contingency: NumberField,
}

pub const INVESTMENTS: InvestmentsLayout = InvestmentsLayout {
    equipment: int(18, 17),
    renovation: int(13, 17),
    additional: int(30, 17),
    contingency: int(42, 17),
};

pub struct KpiLayout {
    pub total_investment: NumberField,
    pub break_even_customers: NumberField,
    pub break_even_months: NumberField,
    pub roi_years: NumberField,
    pub year1_profit: NumberField,
    pub year2_profit: NumberField,
    pub year3_profit: NumberField,
}

pub const KPIS: KpiLayout = KpiLayout {
    total_investment: int(1, 2),
    break_even_customers: int(3, 2),
    break_even_months: int(5, 2),
    roi_years: dec(9, 2, 2),
    year1_profit: int(6, 2),
    year2_profit: int(7, 2),
    year3_profit: int(8, 2),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterColor {
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Cell(NumberField),
    /// `year3Profit / 12`, rounded, or 0 for a non-positive profit.
    Year3MonthlyProfit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterNote {
    Cell(CellRef),
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub value: ParameterValue,
    pub note: ParameterNote,
    pub color: ParameterColor,
}

const fn param(name: &'static str, value: NumberField, note_row: usize) -> ParameterSpec {
    ParameterSpec {
        name,
        value: ParameterValue::Cell(value),
        note: ParameterNote::Cell(CellRef::new(note_row, 8)),
        color: ParameterColor::Gray,
    }
}

pub const SIGNIFICANT_PARAMETERS: [ParameterSpec; 8] = [
    param("גיוס לקוחות פריסייל", int(1, 7), 1),
    param("קצב צמיחה MoM שנה ראשונה", dec(2, 7, 1), 2),
    param("ממוצע חודשי שעות אימון בעלים", int(4, 7), 4),
    param("שכירות למ\"ר (כולל ניהול)", int(5, 7), 5),
    ParameterSpec {
        name: "תקציב לפרויקט",
        value: ParameterValue::Cell(int(13, 2)),
        note: ParameterNote::Fixed(""),
        color: ParameterColor::Gray,
    },
    param("רווח חודשי ממוצע (2 שנים)", int(7, 7), 7),
    ParameterSpec {
        name: "צפי רווח חודשי - שנה שלישית",
        value: ParameterValue::Year3MonthlyProfit,
        note: ParameterNote::Fixed(""),
        color: ParameterColor::Gray,
    },
    ParameterSpec {
        name: "צפי ל-ROI מלא",
        value: ParameterValue::Cell(dec(9, 2, 2)),
        note: ParameterNote::Fixed("שנים"),
        color: ParameterColor::Gray,
    },
];

/// One row of the auditable coordinate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub sheet: &'static str,
    pub section: &'static str,
    pub field: String,
    pub cell: CellRef,
}

fn entry(sheet: &'static str, section: &'static str, field: impl Into<String>, cell: CellRef) -> LayoutEntry {
    LayoutEntry {
        sheet,
        section,
        field: field.into(),
        cell,
    }
}

/// Flattens the whole template layout into `(sheet, section, field, cell)`
/// rows. The year section is listed once per year sheet.
pub fn coordinate_table() -> Vec<LayoutEntry> {
    let mut table = Vec::new();

    let b = &BUSINESS_INFO;
    for (field, cell) in [
        ("name", b.name.cell),
        ("location", b.location.cell),
        ("openingDate", b.opening_date.cell),
        ("legalEntity", b.legal_entity.cell),
        ("concept", b.concept.cell),
        ("spaceGross", b.space_gross.cell),
        ("spaceNet", b.space_net.cell),
    ] {
        table.push(entry(MODEL_SHEET, "businessInfo", field, cell));
    }

    let p = &PRICING;
    for (index, row) in p.plan_rows.iter().enumerate() {
        for (field, col) in [
            ("name", p.name_col),
            ("sessionsPerMonth", p.sessions_col),
            ("price", p.price_col),
            ("customerPercentage", p.percentage_col),
        ] {
            let name = format!("plans[{}].{}", index, field);
            table.push(entry(MODEL_SHEET, "pricing", name, CellRef::new(*row, col)));
        }
    }
    for (field, cell) in [
        ("averagePrice", p.average_price.cell),
        ("personalTrainingRate", p.personal_training_rate.cell),
        ("clinicTreatmentRate", p.clinic_treatment_rate.cell),
    ] {
        table.push(entry(MODEL_SHEET, "pricing", field, cell));
    }

    let e = &EXPENSES;
    for (field, cell) in [
        ("rent", e.rent.cell),
        ("management", e.management.cell),
        ("propertyTax", e.property_tax.cell),
        ("groupTrainers", e.group_trainers.cell),
        ("personalTrainers", e.personal_trainers.cell),
        ("managementSystem", e.management_system.cell),
        ("insurance", e.insurance.cell),
    ] {
        table.push(entry(MODEL_SHEET, "expenses", field, cell));
    }

    let y = &YEAR;
    for (sheet, section) in [(YEAR1_SHEET, "year1"), (YEAR2_SHEET, "year2")] {
        for (field, cell) in [
            ("revenue", y.revenue.cell),
            ("expenses", y.expenses.cell),
            ("operatingProfit", y.operating_profit.cell),
            ("customersStart", y.customers_start.cell),
            ("customersEnd", y.customers_end.cell),
            ("closingBalance", y.closing_balance.cell),
        ] {
            table.push(entry(sheet, section, field, cell));
        }
    }

    let m = &MONTHLY;
    for index in 0..m.months {
        let col = m.column(index);
        for (field, row) in [
            ("customers", m.customers_row),
            ("revenueSubscription", m.revenue_subscription_row),
            ("revenuePersonal", m.revenue_personal_row),
        ] {
            let name = format!("months[{}].{}", index, field);
            table.push(entry(YEAR1_SHEET, "monthlyData", name, CellRef::new(row, col)));
        }
    }

    let i = &INVESTMENTS;
    for (field, cell) in [
        ("equipment", i.equipment.cell),
        ("renovation", i.renovation.cell),
        ("additional", i.additional.cell),
        ("contingency", i.contingency.cell),
    ] {
        table.push(entry(INVESTMENTS_SHEET, "investments", field, cell));
    }

    let k = &KPIS;
    for (field, cell) in [
        ("totalInvestment", k.total_investment.cell),
        ("breakEvenCustomers", k.break_even_customers.cell),
        ("breakEvenMonths", k.break_even_months.cell),
        ("roiYears", k.roi_years.cell),
        ("year1Profit", k.year1_profit.cell),
        ("year2Profit", k.year2_profit.cell),
        ("year3Profit", k.year3_profit.cell),
    ] {
        table.push(entry(KPI_SHEET, "kpis", field, cell));
    }

    for spec in SIGNIFICANT_PARAMETERS.iter() {
        if let ParameterValue::Cell(field) = spec.value {
            table.push(entry(KPI_SHEET, "significantParameters", format!("{}.value", spec.name), field.cell));
        }
        if let ParameterNote::Cell(cell) = spec.note {
            table.push(entry(KPI_SHEET, "significantParameters", format!("{}.note", spec.name), cell));
        }
    }

    table
}
