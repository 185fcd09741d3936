//! Summary figures computed from fetched rows.
//!
//! Everything here is a pure function over an in-memory snapshot. Sums do
//! not depend on input order; group order is first-seen order, and only the
//! "most recent" selection looks at dates.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Months, NaiveDate};

use crate::models::{Area, CoprasRecord, FishpondCropping, NetSplit, PaymentStatus, RentalRecord};

// ---------------------------------------------------------------------------
// Copra totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub sales: f64,
    pub expenses: f64,
    pub net: f64,
}

pub fn copras_totals(records: &[CoprasRecord], split: NetSplit) -> Totals {
    let sales: f64 = records.iter().map(|r| r.sales).sum();
    let expenses: f64 = records.iter().map(|r| r.expenses).sum();
    Totals {
        sales,
        expenses,
        net: split.apply(sales - expenses),
    }
}

// ---------------------------------------------------------------------------
// Per-area grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub area_id: i64,
    pub name: String,
    pub sales: f64,
    pub net: f64,
    pub records: usize,
}

/// Fold records into one summary per area, in first-seen order.
/// Records without an area are left out.
pub fn area_summaries(records: &[CoprasRecord], split: NetSplit) -> Vec<AreaSummary> {
    let (groups, _) = records.iter().fold(
        (Vec::<AreaSummary>::new(), HashMap::<i64, usize>::new()),
        |(mut groups, mut index), r| {
            let Some(area_id) = r.area_id else {
                return (groups, index);
            };
            let slot = *index.entry(area_id).or_insert_with(|| {
                groups.push(AreaSummary {
                    area_id,
                    name: r.area_name.clone().unwrap_or_default(),
                    sales: 0.0,
                    net: 0.0,
                    records: 0,
                });
                groups.len() - 1
            });
            let g = &mut groups[slot];
            g.sales += r.sales;
            g.net += r.net_income(split);
            g.records += 1;
            (groups, index)
        },
    );
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sales,
    Net,
}

impl Metric {
    fn value(self, s: &AreaSummary) -> f64 {
        match self {
            Metric::Sales => s.sales,
            Metric::Net => s.net,
        }
    }
}

/// Highest-scoring area by `metric`. Ties go to the area seen first.
pub fn best_area(summaries: &[AreaSummary], metric: Metric) -> Option<&AreaSummary> {
    let mut ranked: Vec<&AreaSummary> = summaries.iter().collect();
    // sort_by is stable, so equal metrics keep encounter order
    ranked.sort_by(|a, b| {
        metric
            .value(b)
            .partial_cmp(&metric.value(a))
            .unwrap_or(Ordering::Equal)
    });
    ranked.into_iter().next()
}

// ---------------------------------------------------------------------------
// Harvest cycle projection
// ---------------------------------------------------------------------------

/// `last` plus `months` calendar months. Month-end dates clamp to the last
/// day of the target month (Jan 31 + 1 month = Feb 28/29).
pub fn project_next(last: NaiveDate, months: u32) -> Option<NaiveDate> {
    last.checked_add_months(Months::new(months))
}

/// Whole days from `start` to `today`, never negative.
pub fn days_since(start: NaiveDate, today: NaiveDate) -> i64 {
    (today - start).num_days().max(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestProjection {
    pub area_id: i64,
    pub name: String,
    pub last: Option<NaiveDate>,
    pub next: Option<NaiveDate>,
    /// Days until `next`; negative when the harvest is overdue.
    pub days_until: Option<i64>,
}

/// Most recent record date per area, plus `offset_months`.
///
/// Areas with no records fall back to the area's own stored harvest dates.
pub fn harvest_schedule(
    areas: &[Area],
    records: &[CoprasRecord],
    offset_months: u32,
    today: NaiveDate,
) -> Vec<HarvestProjection> {
    let latest: HashMap<i64, NaiveDate> =
        records
            .iter()
            .filter_map(|r| r.area_id.map(|a| (a, r.date)))
            .fold(HashMap::new(), |mut acc, (area_id, date)| {
                acc.entry(area_id)
                    .and_modify(|d: &mut NaiveDate| {
                        if date > *d {
                            *d = date;
                        }
                    })
                    .or_insert(date);
                acc
            });

    areas
        .iter()
        .map(|area| {
            let recorded = latest.get(&area.id).copied();
            let (last, next) = match (recorded, area.last_harvest_date) {
                (r, Some(stored)) if r.map_or(true, |r| r <= stored) => (
                    Some(stored),
                    area.next_harvest_date
                        .or_else(|| project_next(stored, area.cycle_months)),
                ),
                (Some(r), _) => (Some(r), project_next(r, offset_months)),
                (None, _) => (None, area.next_harvest_date),
            };
            HarvestProjection {
                area_id: area.id,
                name: area.name.clone(),
                last,
                next,
                days_until: next.map(|n| (n - today).num_days()),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fishpond
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CroppingTotals {
    pub expenses: f64,
    pub sales: f64,
    pub net: f64,
}

pub fn cropping_totals(cropping: &FishpondCropping) -> CroppingTotals {
    let expenses: f64 = cropping.expenses.iter().map(|e| e.amount).sum();
    let sales: f64 = cropping.sales.iter().map(|s| s.total).sum();
    CroppingTotals {
        expenses,
        sales,
        net: sales - expenses,
    }
}

/// Days a cropping has been running; completed croppings stop at completion.
pub fn cropping_age(cropping: &FishpondCropping, today: NaiveDate) -> i64 {
    let end = cropping.completed_at.unwrap_or(today);
    days_since(cropping.start_date, end)
}

// ---------------------------------------------------------------------------
// Rental transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionGroup {
    pub transaction_id: String,
    pub month: u32,
    pub year: i32,
    pub rows: Vec<RentalRecord>,
    /// Sum of rows marked paid.
    pub collected: f64,
    /// Sum of rows that are not exempted.
    pub expected: f64,
}

impl TransactionGroup {
    pub fn outstanding(&self) -> f64 {
        self.expected - self.collected
    }

    pub fn is_open(&self) -> bool {
        self.rows.iter().any(|r| r.status == PaymentStatus::Unpaid)
    }
}

/// Group flat rental rows by transaction id in first-seen order.
pub fn group_transactions(rows: &[RentalRecord]) -> Vec<TransactionGroup> {
    let (groups, _) = rows.iter().fold(
        (Vec::<TransactionGroup>::new(), HashMap::<&str, usize>::new()),
        |(mut groups, mut index), row| {
            let slot = *index.entry(row.transaction_id.as_str()).or_insert_with(|| {
                groups.push(TransactionGroup {
                    transaction_id: row.transaction_id.clone(),
                    month: row.month,
                    year: row.year,
                    rows: Vec::new(),
                    collected: 0.0,
                    expected: 0.0,
                });
                groups.len() - 1
            });
            let g = &mut groups[slot];
            match row.status {
                PaymentStatus::Paid => {
                    g.collected += row.tax_amount;
                    g.expected += row.tax_amount;
                }
                PaymentStatus::Unpaid => g.expected += row.tax_amount,
                PaymentStatus::Exempted => {}
            }
            g.rows.push(row.clone());
            (groups, index)
        },
    );
    groups
}

// ---------------------------------------------------------------------------
// Dashboard badges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardSummary {
    pub areas: usize,
    pub copras_records: usize,
    pub copras_net: f64,
    pub ongoing_croppings: usize,
    pub completed_croppings: usize,
    pub tenants: usize,
    pub open_transactions: usize,
    pub outstanding_rent: f64,
    pub activity_logs: usize,
}

pub fn dashboard_summary(
    areas: &[Area],
    records: &[CoprasRecord],
    croppings: &[FishpondCropping],
    tenants: usize,
    rentals: &[RentalRecord],
    activity_logs: usize,
    split: NetSplit,
) -> DashboardSummary {
    let groups = group_transactions(rentals);
    let ongoing = croppings.iter().filter(|c| !c.completed).count();
    DashboardSummary {
        areas: areas.len(),
        copras_records: records.len(),
        copras_net: copras_totals(records, split).net,
        ongoing_croppings: ongoing,
        completed_croppings: croppings.len() - ongoing,
        tenants,
        open_transactions: groups.iter().filter(|g| g.is_open()).count(),
        outstanding_rent: groups.iter().map(|g| g.outstanding()).sum(),
        activity_logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, Sale};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(id: i64, area: Option<(i64, &str)>, sales: f64, expenses: f64, d: &str) -> CoprasRecord {
        CoprasRecord {
            id,
            date: date(d),
            area_id: area.map(|a| a.0),
            area_name: area.map(|a| a.1.to_string()),
            farmer: "Ramon".into(),
            sales,
            expenses,
            weight: 0.0,
        }
    }

    fn area(id: i64, name: &str) -> Area {
        Area {
            id,
            name: name.into(),
            last_harvest_date: None,
            next_harvest_date: None,
            cycle_months: 4,
        }
    }

    fn rental(txn: &str, tax: f64, status: PaymentStatus) -> RentalRecord {
        RentalRecord {
            id: 0,
            tenant_name: "T".into(),
            tax_amount: tax,
            month: 1,
            year: 2025,
            status,
            transaction_id: txn.into(),
        }
    }

    fn sample() -> Vec<CoprasRecord> {
        vec![
            rec(1, Some((1, "North")), 5000.0, 1000.0, "2025-01-10"),
            rec(2, Some((2, "South")), 3000.0, 500.0, "2025-01-12"),
            rec(3, Some((1, "North")), 2000.0, 1500.0, "2025-03-02"),
            rec(4, None, 700.0, 100.0, "2025-03-05"),
        ]
    }

    #[test]
    fn test_totals_net_is_sales_minus_expenses() {
        let records = sample();
        let t = copras_totals(&records, NetSplit::Full);
        assert_eq!(t.sales, 10700.0);
        assert_eq!(t.expenses, 3100.0);
        assert_eq!(t.net, t.sales - t.expenses);
        let per_record: f64 = records.iter().map(|r| r.net_income(NetSplit::Full)).sum();
        assert_eq!(per_record, t.net);
    }

    #[test]
    fn test_totals_halved_split() {
        let records = sample();
        let t = copras_totals(&records, NetSplit::Halved);
        assert_eq!(t.net, (10700.0 - 3100.0) / 2.0);
        let per_record: f64 = records.iter().map(|r| r.net_income(NetSplit::Halved)).sum();
        assert_eq!(per_record, t.net);
    }

    #[test]
    fn test_totals_of_empty_set() {
        assert_eq!(copras_totals(&[], NetSplit::Full), Totals::default());
    }

    #[test]
    fn test_area_summaries_group_in_first_seen_order() {
        let groups = area_summaries(&sample(), NetSplit::Full);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "North");
        assert_eq!(groups[0].sales, 7000.0);
        assert_eq!(groups[0].net, 4500.0);
        assert_eq!(groups[0].records, 2);
        assert_eq!(groups[1].name, "South");
    }

    #[test]
    fn test_group_sales_sum_matches_records_with_area() {
        let records = sample();
        let groups = area_summaries(&records, NetSplit::Full);
        let grouped: f64 = groups.iter().map(|g| g.sales).sum();
        let with_area: f64 = records.iter().filter(|r| r.area_id.is_some()).map(|r| r.sales).sum();
        assert_eq!(grouped, with_area);
    }

    #[test]
    fn test_group_sums_are_order_independent() {
        let mut records = sample();
        let forward = area_summaries(&records, NetSplit::Full);
        records.reverse();
        let backward = area_summaries(&records, NetSplit::Full);
        for g in &forward {
            let other = backward.iter().find(|b| b.area_id == g.area_id).unwrap();
            assert_eq!(other.sales, g.sales);
            assert_eq!(other.net, g.net);
        }
    }

    #[test]
    fn test_best_area_ties_go_to_first_seen() {
        let records = vec![
            rec(1, Some((1, "A")), 10.0, 0.0, "2025-01-01"),
            rec(2, Some((2, "B")), 50.0, 0.0, "2025-01-01"),
            rec(3, Some((3, "C")), 50.0, 0.0, "2025-01-01"),
        ];
        let groups = area_summaries(&records, NetSplit::Full);
        let best = best_area(&groups, Metric::Sales).unwrap();
        assert_eq!(best.name, "B");
        assert_eq!(best.sales, 50.0);
    }

    #[test]
    fn test_best_area_by_net_differs_from_sales() {
        let groups = area_summaries(&sample(), NetSplit::Full);
        assert_eq!(best_area(&groups, Metric::Sales).unwrap().name, "North");
        // North 4500 vs South 2500
        assert_eq!(best_area(&groups, Metric::Net).unwrap().name, "North");

        let records = vec![
            rec(1, Some((1, "A")), 9000.0, 8000.0, "2025-01-01"),
            rec(2, Some((2, "B")), 5000.0, 1000.0, "2025-01-01"),
        ];
        let groups = area_summaries(&records, NetSplit::Full);
        assert_eq!(best_area(&groups, Metric::Sales).unwrap().name, "A");
        assert_eq!(best_area(&groups, Metric::Net).unwrap().name, "B");
    }

    #[test]
    fn test_best_area_of_empty_set_is_none() {
        assert!(best_area(&[], Metric::Sales).is_none());
        assert!(best_area(&[], Metric::Net).is_none());
    }

    #[test]
    fn test_project_next_four_months() {
        assert_eq!(project_next(date("2025-01-15"), 4), Some(date("2025-05-15")));
    }

    #[test]
    fn test_project_next_clamps_month_end() {
        assert_eq!(project_next(date("2025-01-31"), 1), Some(date("2025-02-28")));
        assert_eq!(project_next(date("2024-01-31"), 1), Some(date("2024-02-29")));
        assert_eq!(project_next(date("2025-10-31"), 4), Some(date("2026-02-28")));
    }

    #[test]
    fn test_days_since_clamps_future_start() {
        let today = date("2025-03-01");
        assert_eq!(days_since(date("2025-02-01"), today), 28);
        assert_eq!(days_since(today, today), 0);
        assert_eq!(days_since(date("2025-04-01"), today), 0);
    }

    #[test]
    fn test_schedule_uses_latest_date_not_string_order() {
        let areas = vec![area(1, "North"), area(2, "Empty")];
        let records = vec![
            rec(1, Some((1, "North")), 1.0, 0.0, "2025-09-30"),
            rec(2, Some((1, "North")), 1.0, 0.0, "2025-10-02"),
            rec(3, Some((1, "North")), 1.0, 0.0, "2025-02-14"),
        ];
        let schedule = harvest_schedule(&areas, &records, 4, date("2025-10-10"));
        assert_eq!(schedule[0].last, Some(date("2025-10-02")));
        assert_eq!(schedule[0].next, Some(date("2026-02-02")));
        assert_eq!(schedule[0].days_until, Some(115));
        assert_eq!(schedule[1].last, None);
        assert_eq!(schedule[1].next, None);
    }

    #[test]
    fn test_schedule_prefers_recorded_harvest_when_newer() {
        let mut north = area(1, "North");
        north.cycle_months = 3;
        north.last_harvest_date = Some(date("2025-06-01"));
        north.next_harvest_date = Some(date("2025-09-01"));
        let records = vec![rec(1, Some((1, "North")), 1.0, 0.0, "2025-05-01")];
        let schedule = harvest_schedule(&[north], &records, 4, date("2025-09-10"));
        assert_eq!(schedule[0].last, Some(date("2025-06-01")));
        assert_eq!(schedule[0].next, Some(date("2025-09-01")));
        assert_eq!(schedule[0].days_until, Some(-9));
    }

    #[test]
    fn test_sale_total_is_kilos_times_price() {
        let sale = Sale::new("Bangus", 12.5, 40.0, date("2025-05-01"));
        assert_eq!(sale.total, 500.0);
    }

    #[test]
    fn test_cropping_totals_and_age() {
        let cropping = FishpondCropping {
            id: 1,
            start_date: date("2025-01-01"),
            expenses: vec![
                Expense { name: "Feeds".into(), amount: 800.0, date: date("2025-01-05") },
                Expense { name: "Labor".into(), amount: 200.0, date: date("2025-01-06") },
            ],
            sales: vec![Sale::new("Bangus", 12.5, 40.0, date("2025-04-01"))],
            completed: false,
            completed_at: None,
        };
        let t = cropping_totals(&cropping);
        assert_eq!(t.expenses, 1000.0);
        assert_eq!(t.sales, 500.0);
        assert_eq!(t.net, -500.0);
        assert_eq!(cropping_age(&cropping, date("2025-01-31")), 30);

        let done = FishpondCropping {
            completed: true,
            completed_at: Some(date("2025-01-11")),
            ..cropping
        };
        assert_eq!(cropping_age(&done, date("2025-12-31")), 10);
    }

    #[test]
    fn test_group_transactions_collected_total() {
        let rows = vec![
            rental("T1", 100.0, PaymentStatus::Paid),
            rental("T1", 150.0, PaymentStatus::Paid),
            rental("T1", 200.0, PaymentStatus::Unpaid),
        ];
        let groups = group_transactions(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].collected, 250.0);
        assert_eq!(groups[0].expected, 450.0);
        assert_eq!(groups[0].outstanding(), 200.0);
        assert!(groups[0].is_open());
    }

    #[test]
    fn test_group_transactions_preserves_first_seen_order() {
        let rows = vec![
            rental("T2", 1.0, PaymentStatus::Paid),
            rental("T1", 1.0, PaymentStatus::Paid),
            rental("T2", 1.0, PaymentStatus::Exempted),
            rental("T3", 1.0, PaymentStatus::Unpaid),
        ];
        let groups = group_transactions(&rows);
        let ids: Vec<&str> = groups.iter().map(|g| g.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1", "T3"]);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].expected, 1.0);
        assert!(!groups[0].is_open());
    }

    #[test]
    fn test_dashboard_summary_counts() {
        let croppings = vec![
            FishpondCropping {
                id: 1,
                start_date: date("2025-01-01"),
                expenses: vec![],
                sales: vec![],
                completed: false,
                completed_at: None,
            },
            FishpondCropping {
                id: 2,
                start_date: date("2024-06-01"),
                expenses: vec![],
                sales: vec![],
                completed: true,
                completed_at: Some(date("2024-10-01")),
            },
        ];
        let rentals = vec![
            rental("T1", 100.0, PaymentStatus::Paid),
            rental("T2", 300.0, PaymentStatus::Unpaid),
        ];
        let s = dashboard_summary(
            &[area(1, "North")],
            &sample(),
            &croppings,
            2,
            &rentals,
            5,
            NetSplit::Full,
        );
        assert_eq!(s.areas, 1);
        assert_eq!(s.copras_records, 4);
        assert_eq!(s.ongoing_croppings, 1);
        assert_eq!(s.completed_croppings, 1);
        assert_eq!(s.open_transactions, 1);
        assert_eq!(s.outstanding_rent, 300.0);
        assert_eq!(s.activity_logs, 5);
    }
}
