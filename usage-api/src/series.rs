use std::collections::HashMap;

use serde::Serialize;
use time::Date;
use usage_db::db::{DailyTotal, HourlyTotal};

use crate::dates::format_date;

/// One hour bucket of the "today" series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourPoint {
    pub hour: u8,
    pub usage: f64,
}

/// One day bucket of a historical series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPoint {
    pub date: String,
    pub usage: f64,
}

/// Combined dashboard payload; the three arrays share index order, one slot
/// per label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSeries {
    pub labels: Vec<String>,
    pub electricity: Vec<f64>,
    pub water: Vec<f64>,
}

/// Densify sparse per-hour totals into exactly 24 entries, hours 0-23.
pub fn fill_hours(rows: &[HourlyTotal]) -> Vec<HourPoint> {
    let mut series: Vec<HourPoint> = (0u8..24).map(|hour| HourPoint { hour, usage: 0.0 }).collect();
    for row in rows {
        if let Ok(h) = usize::try_from(row.hour) {
            if h < series.len() {
                series[h].usage = row.total;
            }
        }
    }
    series
}

/// Densify sparse per-day totals into one ascending entry per day of
/// `start..=end`.
pub fn fill_days(start: Date, end: Date, rows: &[DailyTotal]) -> Vec<DayPoint> {
    let mut by_day: HashMap<Date, f64> = rows.iter().map(|r| (r.day, r.total)).collect();

    let mut series = Vec::new();
    let mut day = start;
    while day <= end {
        let usage = by_day.remove(&day).unwrap_or(0.0);
        series.push(DayPoint {
            date: format_date(day),
            usage,
        });
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    series
}

/// Merge electricity and water day series into the combined dashboard shape,
/// aligned on identical zero-filled labels.
pub fn overview_series(
    start: Date,
    end: Date,
    electricity: &[DailyTotal],
    water: &[DailyTotal],
) -> OverviewSeries {
    let electricity = fill_days(start, end, electricity);
    let water = fill_days(start, end, water);

    OverviewSeries {
        labels: electricity.iter().map(|p| p.date.clone()).collect(),
        electricity: electricity.into_iter().map(|p| p.usage).collect(),
        water: water.into_iter().map(|p| p.usage).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn fill_hours_is_always_24_entries() {
        let series = fill_hours(&[]);
        assert_eq!(series.len(), 24);
        assert!(series.iter().all(|p| p.usage == 0.0));
        assert_eq!(series[0].hour, 0);
        assert_eq!(series[23].hour, 23);
    }

    #[test]
    fn fill_hours_places_totals_at_their_hour() {
        let rows = vec![
            HourlyTotal { hour: 9, total: 2.5 },
            HourlyTotal { hour: 23, total: 0.7 },
        ];
        let series = fill_hours(&rows);
        assert_eq!(series.len(), 24);
        assert_eq!(series[9], HourPoint { hour: 9, usage: 2.5 });
        assert_eq!(series[23], HourPoint { hour: 23, usage: 0.7 });
        assert_eq!(series[10].usage, 0.0);
    }

    #[test]
    fn fill_hours_ignores_out_of_range_rows() {
        let rows = vec![HourlyTotal { hour: 24, total: 1.0 }, HourlyTotal { hour: -1, total: 1.0 }];
        let series = fill_hours(&rows);
        assert!(series.iter().all(|p| p.usage == 0.0));
    }

    #[test]
    fn fill_days_yields_one_entry_per_day_ascending() {
        let series = fill_days(date!(2025 - 03 - 08), date!(2025 - 03 - 14), &[]);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, "2025-03-08");
        assert_eq!(series[6].date, "2025-03-14");
        assert!(series.iter().all(|p| p.usage == 0.0));
    }

    #[test]
    fn fill_days_zero_fills_sparse_data() {
        let rows = vec![
            DailyTotal { day: date!(2025 - 03 - 09), total: 11.5 },
            DailyTotal { day: date!(2025 - 03 - 10), total: 12.8 },
        ];
        let series = fill_days(date!(2025 - 03 - 08), date!(2025 - 03 - 11), &rows);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].usage, 0.0);
        assert_eq!(series[1], DayPoint { date: "2025-03-09".to_string(), usage: 11.5 });
        assert_eq!(series[2], DayPoint { date: "2025-03-10".to_string(), usage: 12.8 });
        assert_eq!(series[3].usage, 0.0);
    }

    #[test]
    fn fill_days_single_day_range() {
        let series = fill_days(date!(2025 - 03 - 08), date!(2025 - 03 - 08), &[]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn fill_days_empty_when_start_after_end() {
        let series = fill_days(date!(2025 - 03 - 09), date!(2025 - 03 - 08), &[]);
        assert!(series.is_empty());
    }

    #[test]
    fn overview_arrays_stay_aligned() {
        let electricity = vec![DailyTotal { day: date!(2025 - 03 - 09), total: 4.0 }];
        let water = vec![DailyTotal { day: date!(2025 - 03 - 11), total: 120.0 }];
        let overview = overview_series(
            date!(2025 - 03 - 08),
            date!(2025 - 03 - 14),
            &electricity,
            &water,
        );

        assert_eq!(overview.labels.len(), 7);
        assert_eq!(overview.electricity.len(), 7);
        assert_eq!(overview.water.len(), 7);
        assert_eq!(overview.labels[1], "2025-03-09");
        assert_eq!(overview.electricity[1], 4.0);
        assert_eq!(overview.water[1], 0.0);
        assert_eq!(overview.water[3], 120.0);
    }
}
